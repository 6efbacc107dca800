//! # 配置模块
//!
//! ## 设计思路
//!
//! 所有可调参数集中在 `GehConfig`，作为显式参数传入各流水线入口，
//! 不存在进程级可变单例。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的默认值（黑色背景、居中模式、双线性缩放）。
//! - 可选地从 JSON 文件加载，缺失字段回落到默认值（`#[serde(default)]`）。
//! - 命令行参数在加载之后覆盖对应字段。

use std::fs;
use std::path::Path;

use fast_image_resize as fr;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 默认背景色。
pub const DEFAULT_COLOR: &str = "#000000";

/// 顶层配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GehConfig {
    pub background: BackgroundConfig,
    pub fetch: FetchConfig,
}

impl GehConfig {
    /// 加载配置：未指定路径时使用默认值。
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("读取配置文件 '{}' 失败: {}", path.display(), e))
        })?;
        let config = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;

        log::debug!("⚙️ 已加载配置文件：{}", path.display());
        Ok(config)
    }
}

/// 背景合成配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// 底色（颜色名或 `#rrggbb`），解析失败时回落为黑色。
    pub color: String,
    /// 合成模式名，使用时才解析，未知名称按无操作处理。
    pub mode: String,
    /// 缩放模式使用的滤镜。
    pub scale_filter: ScaleFilter,
    /// 源图片文件体积上限（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            mode: "center".to_string(),
            scale_filter: ScaleFilter::Bilinear,
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

/// 抓取配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// 下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 下载体积上限（字节）。
    pub max_file_size: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            download_timeout: 30,
            connect_timeout: 8,
            max_file_size: 50 * 1024 * 1024,
            user_agent: concat!("geh/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// 缩放滤镜。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ScaleFilter {
    pub(crate) fn to_fast_filter(self) -> fr::FilterType {
        match self {
            Self::Nearest => fr::FilterType::Box,
            Self::Bilinear => fr::FilterType::Bilinear,
            Self::CatmullRom => fr::FilterType::CatmullRom,
            Self::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    pub(crate) fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Bilinear => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = GehConfig::load(None).unwrap();

        assert_eq!(config.background.color, "#000000");
        assert_eq!(config.background.mode, "center");
        assert_eq!(config.background.scale_filter, ScaleFilter::Bilinear);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{ "background": { "mode": "tile", "scale_filter": "catmull_rom" } }"#,
        )
        .unwrap();

        let config = GehConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.background.mode, "tile");
        assert_eq!(config.background.scale_filter, ScaleFilter::CatmullRom);
        assert_eq!(config.background.color, "#000000");
        assert_eq!(config.fetch.download_timeout, 30);
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let result = GehConfig::load(Some(Path::new("/nonexistent/geh.json")));

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
