//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各模块维护自己的错误枚举（`LinkError` / `DocumentError` / `BackgroundError`），
//! 应用入口通过 `AppError` 汇总，避免分散的 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为各模块错误提供 `From` 转换，调用侧直接使用 `?`。

use crate::background::BackgroundError;
use crate::document::DocumentError;
use crate::links::LinkError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 链接提取失败
    #[error("{0}")]
    Link(#[from] LinkError),

    /// 文档抓取失败
    #[error("{0}")]
    Document(#[from] DocumentError),

    /// 背景合成或安装失败
    #[error("{0}")]
    Background(#[from] BackgroundError),

    /// 配置无效或无法读取
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}
