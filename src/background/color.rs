use image::Rgba;

use super::BackgroundError;

/// 解析颜色名或十六进制值（`black`、`#336699`、`#fff` 等）。
pub fn parse_color(value: &str) -> Result<Rgba<u8>, BackgroundError> {
    let parsed = csscolorparser::parse(value.trim())
        .map_err(|e| BackgroundError::ColorParse(format!("{}: {}", value, e)))?;

    Ok(Rgba(parsed.to_rgba8()))
}
