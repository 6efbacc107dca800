//! # 桌面背景模块（background）
//!
//! ## 设计思路
//!
//! 将“加载图片 → 生成纯色底图 → 按模式合成 → 安装为根窗口背景”按职责拆分：
//!
//! - `loader`：读取与解码源图片（体积/像素/内存上限）
//! - `color` + `canvas`：解析颜色并生成与屏幕同尺寸的底图
//! - `compositor`：按 `CompositingMode` 把图片画到底图上
//! - `installer`：根窗口 pixmap 的交接协议（释放旧资源 → 发布新资源）
//! - `xlib`：基于 Xlib 的显示服务器实现（仅 Linux）
//! - `service`：串起整条流水线
//!
//! ## 调用链
//!
//! ```text
//! service::set_background
//!    ├─ loader::load_image
//!    ├─ canvas::build_base（屏幕尺寸来自 DisplayServer）
//!    ├─ ModeCompositor::composite
//!    └─ PersistentSurfaceInstaller::install
//!         ├─ 会话连接：读取 _XROOTPMAP_ID，释放旧 pixmap
//!         └─ 独立连接：创建 pixmap → 发布属性 → 设为背景 → RetainPermanent → 关闭
//! ```
//!
//! ## 并发约束
//!
//! 根窗口属性是进程外的单槽共享状态，没有锁保护。同一显示上同时只能有一个
//! `install` 在执行，由调用方保证串行。

mod canvas;
mod color;
mod compositor;
mod installer;
mod loader;
mod service;
#[cfg(test)]
mod testing;
#[cfg(target_os = "linux")]
pub mod xlib;

pub use canvas::build_base;
pub use color::parse_color;
pub use compositor::{CompositingMode, ModeCompositor};
pub use installer::{
    DisplayServer, InstallSession, PersistentSurfaceInstaller, PixmapId, RootPixmapProperty,
    ROOT_PIXMAP_ATOM,
};
pub use loader::load_image;
pub use service::{set_background, BackgroundOutcome};

/// 合成画布：RGBA8，尺寸与屏幕一致。
pub type Canvas = image::RgbaImage;

/// 背景流水线统一错误类型。
///
/// 所有分支携带可读字符串，便于嵌入 `BackgroundOutcome` 与日志。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackgroundError {
    #[error("文件错误：{0}")]
    IoUnavailable(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("颜色解析失败：{0}")]
    ColorParse(String),

    #[error("尚未实现的背景模式：{0}")]
    UnsupportedMode(String),

    #[error("未知背景模式：{0}")]
    UnknownMode(String),

    #[error("根窗口属性类型不匹配：{0}")]
    ResourceTypeMismatch(String),

    #[error("无法连接显示服务器：{0}")]
    DisplayConnection(String),

    #[error("不支持的视觉类型：{0}")]
    UnsupportedVisual(String),

    #[error("显示服务器错误：{0}")]
    Display(String),
}
