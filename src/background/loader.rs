//! # 图片加载模块
//!
//! ## 设计思路
//!
//! 尽早失败：先查文件体积，再用文件签名确认是图片，再读取头部尺寸做像素与内存
//! 上限检查，最后才完整解码，降低恶意或超大输入带来的内存峰值。

use std::io::Cursor;
use std::path::Path;

use image::{GenericImageView, RgbaImage};

use super::BackgroundError;
use crate::config::BackgroundConfig;

/// 读取并解码本地图片为 RGBA8。
pub fn load_image(path: &Path, config: &BackgroundConfig) -> Result<RgbaImage, BackgroundError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

    let metadata = std::fs::metadata(path).map_err(|e| {
        BackgroundError::IoUnavailable(format!("无法读取文件信息 {}：{}", path.display(), e))
    })?;

    if metadata.len() > config.max_file_size {
        return Err(BackgroundError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        BackgroundError::IoUnavailable(format!("无法读取图片文件 {}：{}", path.display(), e))
    })?;
    validate_image_signature(&bytes)?;

    let (header_width, header_height) = inspect_dimensions(&bytes)?;
    validate_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| BackgroundError::Decode(format!("图片解码失败：{}", e)))?;
    let (width, height) = decoded.dimensions();
    validate_limits(config, width, height)?;

    log::info!("✅ 图片解码成功 - 尺寸: {}x{}", width, height);
    Ok(decoded.to_rgba8())
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), BackgroundError> {
    if bytes.is_empty() {
        return Err(BackgroundError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| BackgroundError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(BackgroundError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 仅读取图片头信息中的宽高。
fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), BackgroundError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| BackgroundError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| BackgroundError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_limits(config: &BackgroundConfig, width: u32, height: u32) -> Result<(), BackgroundError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > config.max_decoded_pixels {
        return Err(BackgroundError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    let estimated = pixels.saturating_mul(4);
    if estimated > config.max_decoded_bytes {
        return Err(BackgroundError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}
