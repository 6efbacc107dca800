//! 纯色底图
//!
//! 底图尺寸与屏幕一致、带 alpha 通道，每次调用重新创建。
//! 颜色解析失败只记录警告并回落为黑色。

use image::Rgba;

use super::{parse_color, Canvas};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 生成 `width x height` 的纯色底图。
pub fn build_base(width: u32, height: u32, color: &str) -> Canvas {
    log::debug!("🎨 生成背景底图 {}x{}，颜色 {}", width, height, color);

    let fill = parse_color(color).unwrap_or_else(|err| {
        log::warn!("⚠️ {}，使用黑色", err);
        BLACK
    });

    Canvas::from_pixel(width, height, fill)
}
