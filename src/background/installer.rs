//! # 根窗口背景安装
//!
//! ## 设计思路
//!
//! 背景 pixmap 的生命周期必须超过设置它的进程，因此它的“所有权”通过根窗口
//! 上的 `_XROOTPMAP_ID` 属性在进程之间交接：
//!
//! 1. 读取属性；类型为 pixmap 时让服务器释放其所属客户端的资源，类型不符只告警
//! 2. 打开一条**独立**连接，保证 RetainPermanent 只作用于新 pixmap
//! 3. 在新连接上创建 pixmap 并写入画布像素
//! 4. 重新发布属性，供下一次调用找到它
//! 5. 设为根窗口背景并重绘
//! 6. 标记 RetainPermanent、同步并关闭连接
//!
//! ## 实现思路
//!
//! 显示服务器抽象为两个 trait：`DisplayServer` 代表常驻的会话连接，
//! `InstallSession` 代表第 2~6 步使用的独立连接。会话在中途出错时直接丢弃，
//! 未标记保留的资源随连接关闭被服务器回收，不会泄漏。

use super::{BackgroundError, Canvas};

/// 记录根窗口背景 pixmap 的属性名。
pub const ROOT_PIXMAP_ATOM: &str = "_XROOTPMAP_ID";

/// 服务器端 pixmap 标识。
pub type PixmapId = u64;

/// `_XROOTPMAP_ID` 属性的读取结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootPixmapProperty {
    /// 属性不存在
    Absent,
    /// 属性存在且类型为 pixmap
    Pixmap(PixmapId),
    /// 属性存在但类型不符，携带实际类型名
    Mismatch(String),
}

/// 常驻的显示服务器会话连接。
pub trait DisplayServer {
    type Session: InstallSession;

    /// 默认屏幕的当前分辨率。
    fn screen_size(&self) -> (u32, u32);

    /// 读取 `_XROOTPMAP_ID` 并比对类型。
    fn root_pixmap(&self) -> Result<RootPixmapProperty, BackgroundError>;

    /// 释放 `resource` 所属客户端遗留的全部资源。
    fn release_client_resources(&self, resource: PixmapId) -> Result<(), BackgroundError>;

    /// 打开一条与会话连接无关的新连接。
    fn open_session(&self) -> Result<Self::Session, BackgroundError>;
}

/// 仅用于安装背景的独立连接。
pub trait InstallSession {
    /// 创建与画布同尺寸的 pixmap 并写入像素。
    fn upload_pixmap(&mut self, canvas: &Canvas) -> Result<PixmapId, BackgroundError>;

    /// 将 `_XROOTPMAP_ID` 指向 `pixmap`。
    fn publish_root_pixmap(&mut self, pixmap: PixmapId) -> Result<(), BackgroundError>;

    /// 设为根窗口背景并触发重绘。
    fn set_root_background(&mut self, pixmap: PixmapId) -> Result<(), BackgroundError>;

    /// 标记连接上的资源在断开后保留，同步后关闭连接。
    fn retain_and_close(self) -> Result<(), BackgroundError>;
}

/// 根窗口背景安装器。
///
/// 每次 `install` 都会先回收上一次安装的 pixmap，再发布新的。
/// 同一显示上同时只能有一个 `install` 在执行。
pub struct PersistentSurfaceInstaller<'a, S: DisplayServer> {
    server: &'a S,
}

impl<'a, S: DisplayServer> PersistentSurfaceInstaller<'a, S> {
    pub fn new(server: &'a S) -> Self {
        Self { server }
    }

    /// 安装画布为根窗口背景，返回新 pixmap 的标识。
    pub fn install(&self, canvas: &Canvas) -> Result<PixmapId, BackgroundError> {
        self.free_previous()?;

        let (width, height) = canvas.dimensions();
        log::debug!("🖼️ 设置 {}x{} 背景", width, height);

        let mut session = self.server.open_session()?;
        let pixmap = session.upload_pixmap(canvas)?;
        session.publish_root_pixmap(pixmap)?;
        session.set_root_background(pixmap)?;
        session.retain_and_close()?;

        log::info!("✅ 根窗口背景已更新 - pixmap 0x{:x}", pixmap);
        Ok(pixmap)
    }

    fn free_previous(&self) -> Result<(), BackgroundError> {
        match self.server.root_pixmap()? {
            RootPixmapProperty::Absent => {
                log::debug!("{} 未设置，无需回收", ROOT_PIXMAP_ATOM);
            }
            RootPixmapProperty::Pixmap(previous) => {
                log::debug!("♻️ 回收上一次的背景 pixmap 0x{:x}", previous);
                self.server.release_client_resources(previous)?;
            }
            RootPixmapProperty::Mismatch(actual) => {
                let err = BackgroundError::ResourceTypeMismatch(format!(
                    "{} 的类型为 {}，跳过回收",
                    ROOT_PIXMAP_ATOM, actual
                ));
                log::warn!("⚠️ {}", err);
            }
        }
        Ok(())
    }
}
