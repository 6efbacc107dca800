//! 背景设置流水线：加载 → 底图 → 合成 → 安装。

use std::path::Path;
use std::time::Instant;

use super::installer::{DisplayServer, PersistentSurfaceInstaller};
use super::{build_base, load_image, BackgroundError, CompositingMode, ModeCompositor};
use crate::config::BackgroundConfig;

/// 一次成功安装的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundOutcome {
    /// 图片已按模式合成
    Composited(CompositingMode),
    /// 模式未知或未实现，只安装了纯色底图
    SolidFill(BackgroundError),
}

/// 将本地图片设为根窗口背景。
///
/// 图片加载失败时不修改桌面，直接返回错误；模式问题只降级为纯色底图。
pub fn set_background<S: DisplayServer>(
    path: &Path,
    config: &BackgroundConfig,
    server: &S,
) -> Result<BackgroundOutcome, BackgroundError> {
    let total_start = Instant::now();

    let load_start = Instant::now();
    let image = load_image(path, config)?;
    let load_ms = load_start.elapsed().as_millis();

    let compose_start = Instant::now();
    let (width, height) = server.screen_size();
    let mut canvas = build_base(width, height, &config.color);

    let outcome = match config.mode.parse::<CompositingMode>() {
        Ok(mode) => {
            match ModeCompositor::new(config.scale_filter).composite(&mut canvas, &image, mode) {
                Ok(()) => BackgroundOutcome::Composited(mode),
                Err(err) => BackgroundOutcome::SolidFill(err),
            }
        }
        Err(err) => {
            log::warn!("⚠️ {}，仅使用纯色底图", err);
            BackgroundOutcome::SolidFill(err)
        }
    };
    let compose_ms = compose_start.elapsed().as_millis();

    let install_start = Instant::now();
    PersistentSurfaceInstaller::new(server).install(&canvas)?;
    let install_ms = install_start.elapsed().as_millis();

    log::info!(
        "⏱️ 背景设置耗时 - 加载: {}ms, 合成: {}ms, 安装: {}ms, 总计: {}ms",
        load_ms,
        compose_ms,
        install_ms,
        total_start.elapsed().as_millis()
    );

    Ok(outcome)
}
