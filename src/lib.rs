//! # geh — 图片链接提取与桌面背景设置 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌────────────────────────── main.rs (clap CLI) ─────────────────────────┐
//! │   --links FILE                          --background FILE             │
//! └───────┬───────────────────────────────────────────┬───────────────────┘
//!         ↓                                           ↓
//! ┌─ document ─────────────────────────────────────────────────────────────┐
//! │  Document：本地 / stdin / HTTP 来源 → 临时文件（tempfile）               │
//! └───────┬───────────────────────────────────────────┬───────────────────┘
//!         ↓                                           ↓
//! ┌─ links ──────────────────────┐   ┌─ background ──────────────────────────┐
//! │  scanner   扫描 <img 标签    │   │  loader      解码 + 上限检查           │
//! │  img_tag   提取 src 值       │   │  canvas      纯色底图                  │
//! │  url_resolver 相对→绝对 URL  │   │  compositor  center/scale/fill/tile    │
//! │  Fetchable 下游抓取队列      │   │  installer   _XROOTPMAP_ID 交接协议    │
//! └──────────────────────────────┘   │  xlib        X11 实现（Linux）         │
//!                                    └───────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 应用级错误类型 `AppError`，汇总各模块错误 |
//! | [`config`] | `GehConfig`：背景与抓取参数，可从 JSON 加载 |
//! | [`document`] | 文档来源识别、URI 计算、远程内容落地到临时文件 |
//! | [`links`] | 从 HTML 中提取 `<img>` 链接并解析为绝对 URL |
//! | [`background`] | 背景合成与根窗口 pixmap 安装 |

pub mod background;
pub mod config;
pub mod document;
pub mod error;
pub mod links;
