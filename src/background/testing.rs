//! 内存中的显示服务器，模拟 X 服务器的资源归属与 close-down 语义：
//! 连接关闭时未标记保留的资源被回收；按资源杀客户端会回收该客户端的全部资源。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::installer::{DisplayServer, InstallSession, PixmapId, RootPixmapProperty};
use super::{BackgroundError, Canvas};

#[derive(Debug, Default)]
struct ServerState {
    next_client: u32,
    next_resource: PixmapId,
    /// pixmap -> 所属客户端
    pixmaps: BTreeMap<PixmapId, u32>,
    open_connections: usize,
    property: Option<RootPixmapProperty>,
    root_background: Option<PixmapId>,
    killed: Vec<PixmapId>,
    fail_next_session: bool,
    fail_next_publish: bool,
}

pub(crate) struct FakeServer {
    width: u32,
    height: u32,
    state: Rc<RefCell<ServerState>>,
}

impl FakeServer {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let state = ServerState {
            next_resource: 0x0040_0001,
            ..ServerState::default()
        };
        Self {
            width,
            height,
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub(crate) fn property(&self) -> RootPixmapProperty {
        self.state
            .borrow()
            .property
            .clone()
            .unwrap_or(RootPixmapProperty::Absent)
    }

    pub(crate) fn set_property(&self, property: RootPixmapProperty) {
        self.state.borrow_mut().property = Some(property);
    }

    pub(crate) fn root_background(&self) -> Option<PixmapId> {
        self.state.borrow().root_background
    }

    pub(crate) fn live_pixmaps(&self) -> Vec<PixmapId> {
        self.state.borrow().pixmaps.keys().copied().collect()
    }

    pub(crate) fn open_connections(&self) -> usize {
        self.state.borrow().open_connections
    }

    pub(crate) fn killed_resources(&self) -> Vec<PixmapId> {
        self.state.borrow().killed.clone()
    }

    pub(crate) fn fail_next_session(&self) {
        self.state.borrow_mut().fail_next_session = true;
    }

    pub(crate) fn fail_next_publish(&self) {
        self.state.borrow_mut().fail_next_publish = true;
    }
}

impl DisplayServer for FakeServer {
    type Session = FakeSession;

    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn root_pixmap(&self) -> Result<RootPixmapProperty, BackgroundError> {
        Ok(self.property())
    }

    fn release_client_resources(&self, resource: PixmapId) -> Result<(), BackgroundError> {
        let mut state = self.state.borrow_mut();
        state.killed.push(resource);
        if let Some(owner) = state.pixmaps.get(&resource).copied() {
            state.pixmaps.retain(|_, client| *client != owner);
        }
        Ok(())
    }

    fn open_session(&self) -> Result<FakeSession, BackgroundError> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next_session) {
            return Err(BackgroundError::DisplayConnection("refused".to_string()));
        }
        state.next_client += 1;
        state.open_connections += 1;
        Ok(FakeSession {
            client: state.next_client,
            retain: false,
            state: Rc::clone(&self.state),
        })
    }
}

pub(crate) struct FakeSession {
    client: u32,
    retain: bool,
    state: Rc<RefCell<ServerState>>,
}

impl InstallSession for FakeSession {
    fn upload_pixmap(&mut self, _canvas: &Canvas) -> Result<PixmapId, BackgroundError> {
        let mut state = self.state.borrow_mut();
        let id = state.next_resource;
        state.next_resource += 0x0020_0000;
        state.pixmaps.insert(id, self.client);
        Ok(id)
    }

    fn publish_root_pixmap(&mut self, pixmap: PixmapId) -> Result<(), BackgroundError> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next_publish) {
            return Err(BackgroundError::Display("BadAlloc".to_string()));
        }
        state.property = Some(RootPixmapProperty::Pixmap(pixmap));
        Ok(())
    }

    fn set_root_background(&mut self, pixmap: PixmapId) -> Result<(), BackgroundError> {
        self.state.borrow_mut().root_background = Some(pixmap);
        Ok(())
    }

    fn retain_and_close(mut self) -> Result<(), BackgroundError> {
        self.retain = true;
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open_connections -= 1;
        if !self.retain {
            let client = self.client;
            state.pixmaps.retain(|_, owner| *owner != client);
        }
    }
}
