//! # 合成模块
//!
//! ## 设计思路
//!
//! 每种 `CompositingMode` 对应一个算法，穷尽匹配；尚未实现的模式返回
//! `BackgroundError::UnsupportedMode`，底图保持纯色不变。
//!
//! | 模式 | 行为 |
//! |------|------|
//! | `Center` | 不缩放；大于屏幕时对称裁剪，小于屏幕时居中 |
//! | `Scale` / `Fill` | 拉伸铺满，X/Y 独立缩放系数（不保持比例） |
//! | `Tile` | 不缩放，从原点开始重复铺满 |
//! | `Crop` | 未实现 |
//!
//! ## 实现思路
//!
//! 拉伸优先使用 `fast_image_resize`，失败时回退 `image::imageops::resize`。
//! 复制区域一律使用替换语义（不做 alpha 混合）。

use std::str::FromStr;

use fast_image_resize as fr;
use image::{imageops, RgbaImage};

use super::{BackgroundError, Canvas};
use crate::config::ScaleFilter;

/// 背景合成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositingMode {
    Center,
    Scale,
    Crop,
    Fill,
    Tile,
}

impl CompositingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Scale => "scale",
            Self::Crop => "crop",
            Self::Fill => "fill",
            Self::Tile => "tile",
        }
    }
}

impl FromStr for CompositingMode {
    type Err = BackgroundError;

    /// 忽略大小写解析模式名。
    ///
    /// # 示例
    /// ```
    /// use geh::background::CompositingMode;
    ///
    /// let mode: CompositingMode = "Tile".parse()?;
    /// assert_eq!(mode.as_str(), "tile");
    /// # Ok::<(), geh::background::BackgroundError>(())
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "scale" => Ok(Self::Scale),
            "crop" => Ok(Self::Crop),
            "fill" => Ok(Self::Fill),
            "tile" => Ok(Self::Tile),
            other => Err(BackgroundError::UnknownMode(format!(
                "{}（可选：center / scale / crop / fill / tile）",
                other
            ))),
        }
    }
}

/// 按模式把图片合成到底图上。
#[derive(Debug, Clone, Copy)]
pub struct ModeCompositor {
    filter: ScaleFilter,
}

impl ModeCompositor {
    pub fn new(filter: ScaleFilter) -> Self {
        Self { filter }
    }

    /// 原地修改 `canvas`；`image` 只读。
    pub fn composite(
        &self,
        canvas: &mut Canvas,
        image: &RgbaImage,
        mode: CompositingMode,
    ) -> Result<(), BackgroundError> {
        match mode {
            CompositingMode::Center => {
                Self::center(canvas, image);
                Ok(())
            }
            CompositingMode::Scale | CompositingMode::Fill => {
                self.stretch(canvas, image);
                Ok(())
            }
            CompositingMode::Tile => {
                Self::tile(canvas, image);
                Ok(())
            }
            CompositingMode::Crop => {
                log::warn!("⚠️ 背景模式 crop 尚未支持，保持纯色底图");
                Err(BackgroundError::UnsupportedMode(mode.as_str().to_string()))
            }
        }
    }

    fn center(canvas: &mut Canvas, image: &RgbaImage) {
        let (dest_width, dest_height) = canvas.dimensions();
        let (src_width, src_height) = image.dimensions();

        let (src_x, dest_x) = center_axis(src_width, dest_width);
        let (src_y, dest_y) = center_axis(src_height, dest_height);
        let width = dest_width.min(src_width);
        let height = dest_height.min(src_height);

        log::debug!(
            "复制 {}x{}+{}+{} 居中到 {}x{}+{}+{}",
            src_width,
            src_height,
            src_x,
            src_y,
            dest_width,
            dest_height,
            dest_x,
            dest_y
        );

        if width == 0 || height == 0 {
            return;
        }

        let patch = imageops::crop_imm(image, src_x, src_y, width, height).to_image();
        imageops::replace(canvas, &patch, i64::from(dest_x), i64::from(dest_y));
    }

    fn stretch(&self, canvas: &mut Canvas, image: &RgbaImage) {
        let (dest_width, dest_height) = canvas.dimensions();
        let (src_width, src_height) = image.dimensions();
        if src_width == 0 || src_height == 0 || dest_width == 0 || dest_height == 0 {
            return;
        }

        log::debug!(
            "拉伸 {}x{} -> {}x{}（系数 {:.3} / {:.3}，filter={:?}）",
            src_width,
            src_height,
            dest_width,
            dest_height,
            f64::from(dest_width) / f64::from(src_width),
            f64::from(dest_height) / f64::from(src_height),
            self.filter
        );

        let scaled = match self.resize_with_fast_image_resize(image, dest_width, dest_height) {
            Ok(scaled) => scaled,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize：{}", err);
                imageops::resize(image, dest_width, dest_height, self.filter.to_image_filter())
            }
        };

        imageops::replace(canvas, &scaled, 0, 0);
    }

    fn tile(canvas: &mut Canvas, image: &RgbaImage) {
        let (dest_width, dest_height) = canvas.dimensions();
        let (src_width, src_height) = image.dimensions();
        if src_width == 0 || src_height == 0 {
            return;
        }

        for y in (0..dest_height).step_by(src_height as usize) {
            for x in (0..dest_width).step_by(src_width as usize) {
                imageops::replace(canvas, image, i64::from(x), i64::from(y));
            }
        }
    }

    fn resize_with_fast_image_resize(
        &self,
        image: &RgbaImage,
        target_width: u32,
        target_height: u32,
    ) -> Result<RgbaImage, BackgroundError> {
        let (src_width, src_height) = image.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            image.as_raw().clone(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| BackgroundError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(self.filter.to_fast_filter()));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| BackgroundError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| BackgroundError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
    }
}

/// 单轴居中：返回 `(源偏移, 目标偏移)`，两者至多一个非零。
fn center_axis(src: u32, dest: u32) -> (u32, u32) {
    if src > dest {
        ((src - dest) / 2, 0)
    } else {
        (0, (dest - src) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// 每个像素编码自身坐标，方便断言来源位置。
    fn coord_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 7, 255]))
    }

    fn compositor() -> ModeCompositor {
        ModeCompositor::new(ScaleFilter::Bilinear)
    }

    #[test]
    fn parses_mode_names_case_insensitively() {
        assert_eq!("CENTER".parse::<CompositingMode>().unwrap(), CompositingMode::Center);
        assert_eq!(" fill ".parse::<CompositingMode>().unwrap(), CompositingMode::Fill);
        assert!(matches!(
            "zoom".parse::<CompositingMode>(),
            Err(BackgroundError::UnknownMode(_))
        ));
    }

    #[test]
    fn center_crops_larger_image_symmetrically() {
        let mut canvas = Canvas::from_pixel(4, 4, BLACK);
        let image = coord_image(8, 6);

        compositor()
            .composite(&mut canvas, &image, CompositingMode::Center)
            .unwrap();

        assert_eq!(canvas.dimensions(), (4, 4));
        assert_eq!(*canvas.get_pixel(0, 0), *image.get_pixel(2, 1));
        assert_eq!(*canvas.get_pixel(3, 3), *image.get_pixel(5, 4));
    }

    #[test]
    fn center_places_smaller_image_in_middle() {
        let mut canvas = Canvas::from_pixel(6, 6, BLACK);
        let image = RgbaImage::from_pixel(2, 2, RED);

        compositor()
            .composite(&mut canvas, &image, CompositingMode::Center)
            .unwrap();

        for (x, y, pixel) in canvas.enumerate_pixels() {
            let inside = (2..4).contains(&x) && (2..4).contains(&y);
            assert_eq!(*pixel, if inside { RED } else { BLACK }, "pixel {},{}", x, y);
        }
    }

    #[test]
    fn center_mixed_axes_crops_one_and_pads_other() {
        let mut canvas = Canvas::from_pixel(4, 6, BLACK);
        let image = coord_image(6, 2);

        compositor()
            .composite(&mut canvas, &image, CompositingMode::Center)
            .unwrap();

        assert_eq!(*canvas.get_pixel(0, 2), *image.get_pixel(1, 0));
        assert_eq!(*canvas.get_pixel(0, 1), BLACK);
        assert_eq!(*canvas.get_pixel(3, 3), *image.get_pixel(4, 1));
    }

    #[test]
    fn scale_and_fill_stretch_to_canvas() {
        for mode in [CompositingMode::Scale, CompositingMode::Fill] {
            let mut canvas = Canvas::from_pixel(8, 3, BLACK);
            let image = RgbaImage::from_pixel(2, 2, RED);

            compositor().composite(&mut canvas, &image, mode).unwrap();

            assert!(
                canvas
                    .pixels()
                    .all(|p| p.0.iter().zip(RED.0).all(|(a, b)| a.abs_diff(b) <= 1)),
                "mode {:?}",
                mode
            );
        }
    }

    #[test]
    fn tile_repeats_from_origin() {
        let mut canvas = Canvas::from_pixel(5, 3, BLACK);
        let image = coord_image(2, 2);

        compositor()
            .composite(&mut canvas, &image, CompositingMode::Tile)
            .unwrap();

        for (x, y, pixel) in canvas.enumerate_pixels() {
            assert_eq!(*pixel, *image.get_pixel(x % 2, y % 2), "pixel {},{}", x, y);
        }
    }

    #[test]
    fn crop_reports_unsupported_and_keeps_solid_canvas() {
        let mut canvas = Canvas::from_pixel(4, 4, BLACK);
        let image = RgbaImage::from_pixel(2, 2, RED);

        let result = compositor().composite(&mut canvas, &image, CompositingMode::Crop);

        assert!(matches!(result, Err(BackgroundError::UnsupportedMode(_))));
        assert!(canvas.pixels().all(|p| *p == BLACK));
    }
}
