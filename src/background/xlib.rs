//! # Xlib 显示服务器
//!
//! ## 实现思路
//!
//! - `DisplayHandle`：`XOpenDisplay` 的 RAII 包装，Drop 时 `XCloseDisplay`
//! - `XlibDisplay`：会话连接，读取 `_XROOTPMAP_ID` 并用 `XKillClient` 回收旧 pixmap
//! - `XlibSession`：独立连接，上传像素后 `RetainPermanent` + `XSync` 再关闭
//!
//! 只支持 24/32 位 TrueColor 视觉；alpha 通道在上传时丢弃。
//!
//! Xlib 默认的错误处理会直接退出进程（例如属性里残留了已失效的 pixmap，
//! `XKillClient` 返回 BadValue），因此首次连接时安装只记录日志的错误处理函数。

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong, c_void};
use std::ptr;
use std::sync::Once;

use x11::xlib;

use super::installer::{DisplayServer, InstallSession, PixmapId, RootPixmapProperty, ROOT_PIXMAP_ATOM};
use super::{BackgroundError, Canvas};

static ERROR_HANDLER: Once = Once::new();

unsafe extern "C" fn log_x_error(display: *mut xlib::Display, event: *mut xlib::XErrorEvent) -> c_int {
    if event.is_null() {
        return 0;
    }
    // SAFETY: Xlib 保证回调期间 display 与 event 有效
    let (code, request, resource) = unsafe { ((*event).error_code, (*event).request_code, (*event).resourceid) };

    let mut text = [0 as c_char; 256];
    // SAFETY: 缓冲区长度与传入长度一致，XGetErrorText 保证以 NUL 结尾
    let message = unsafe {
        xlib::XGetErrorText(display, c_int::from(code), text.as_mut_ptr(), text.len() as c_int);
        CStr::from_ptr(text.as_ptr()).to_string_lossy().into_owned()
    };

    log::warn!(
        "⚠️ X 错误：{}（request={}，resource=0x{:x}）",
        message,
        request,
        resource
    );
    0
}

/// `Display*` 的所有权包装。
struct DisplayHandle {
    display: *mut xlib::Display,
}

impl DisplayHandle {
    fn open() -> Result<Self, BackgroundError> {
        ERROR_HANDLER.call_once(|| {
            // SAFETY: 只替换进程级回调，不访问任何连接
            unsafe {
                xlib::XSetErrorHandler(Some(log_x_error));
            }
        });

        // SAFETY: 传空指针表示使用 DISPLAY 环境变量
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(BackgroundError::DisplayConnection(
                "XOpenDisplay 失败，请检查 DISPLAY 环境变量".to_string(),
            ));
        }

        log::debug!("🔌 已连接 X 显示服务器");
        Ok(Self { display })
    }

    fn raw(&self) -> *mut xlib::Display {
        self.display
    }

    fn screen(&self) -> c_int {
        // SAFETY: display 在 self 存活期间有效
        unsafe { xlib::XDefaultScreen(self.display) }
    }

    fn root(&self) -> xlib::Window {
        // SAFETY: 同上
        unsafe { xlib::XDefaultRootWindow(self.display) }
    }

    fn intern_atom(&self, name: &str, only_if_exists: bool) -> Result<xlib::Atom, BackgroundError> {
        let c_name = CString::new(name)
            .map_err(|e| BackgroundError::Display(format!("非法的 atom 名称 {}：{}", name, e)))?;
        let flag = if only_if_exists { xlib::True } else { xlib::False };
        // SAFETY: c_name 在调用期间存活
        Ok(unsafe { xlib::XInternAtom(self.display, c_name.as_ptr(), flag) })
    }

    fn atom_name(&self, atom: xlib::Atom) -> String {
        // SAFETY: XGetAtomName 返回的字符串需用 XFree 释放
        unsafe {
            let name = xlib::XGetAtomName(self.display, atom);
            if name.is_null() {
                return format!("atom#{}", atom);
            }
            let owned = CStr::from_ptr(name).to_string_lossy().into_owned();
            xlib::XFree(name as *mut c_void);
            owned
        }
    }

    fn sync(&self) {
        // SAFETY: display 有效
        unsafe {
            xlib::XSync(self.display, xlib::False);
        }
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        // SAFETY: display 由 XOpenDisplay 创建且只关闭一次
        unsafe {
            xlib::XCloseDisplay(self.display);
        }
    }
}

/// 常驻会话连接。
pub struct XlibDisplay {
    handle: DisplayHandle,
}

impl XlibDisplay {
    /// 连接 `DISPLAY` 指定的显示服务器。
    pub fn open() -> Result<Self, BackgroundError> {
        Ok(Self {
            handle: DisplayHandle::open()?,
        })
    }
}

impl DisplayServer for XlibDisplay {
    type Session = XlibSession;

    fn screen_size(&self) -> (u32, u32) {
        let display = self.handle.raw();
        let screen = self.handle.screen();
        // SAFETY: display 有效，screen 来自同一连接
        let (width, height) = unsafe {
            (
                xlib::XDisplayWidth(display, screen),
                xlib::XDisplayHeight(display, screen),
            )
        };
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }

    fn root_pixmap(&self) -> Result<RootPixmapProperty, BackgroundError> {
        let atom = self.handle.intern_atom(ROOT_PIXMAP_ATOM, true)?;
        if atom == 0 {
            return Ok(RootPixmapProperty::Absent);
        }

        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut nitems: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut data: *mut c_uchar = ptr::null_mut();

        // SAFETY: 所有输出参数指向本地变量；data 非空时由下方 XFree 释放
        let status = unsafe {
            xlib::XGetWindowProperty(
                self.handle.raw(),
                self.handle.root(),
                atom,
                0,
                1,
                xlib::False,
                xlib::XA_PIXMAP,
                &mut actual_type,
                &mut actual_format,
                &mut nitems,
                &mut bytes_after,
                &mut data,
            )
        };

        if status != xlib::Success as c_int {
            return Err(BackgroundError::Display(format!(
                "读取 {} 失败（status={}）",
                ROOT_PIXMAP_ATOM, status
            )));
        }

        let property = if actual_type == 0 {
            RootPixmapProperty::Absent
        } else if actual_type == xlib::XA_PIXMAP && actual_format == 32 && nitems >= 1 && !data.is_null() {
            // SAFETY: format 32 的属性值在客户端以 long 数组返回
            let id = unsafe { *(data as *const c_ulong) };
            RootPixmapProperty::Pixmap(id as PixmapId)
        } else {
            RootPixmapProperty::Mismatch(self.handle.atom_name(actual_type))
        };

        if !data.is_null() {
            // SAFETY: data 由 XGetWindowProperty 分配
            unsafe {
                xlib::XFree(data as *mut c_void);
            }
        }

        Ok(property)
    }

    fn release_client_resources(&self, resource: PixmapId) -> Result<(), BackgroundError> {
        // SAFETY: display 有效；非法 XID 只会触发已安装的错误回调
        unsafe {
            xlib::XKillClient(self.handle.raw(), resource as xlib::XID);
        }
        self.handle.sync();
        Ok(())
    }

    fn open_session(&self) -> Result<XlibSession, BackgroundError> {
        Ok(XlibSession {
            handle: DisplayHandle::open()?,
        })
    }
}

/// 只用于一次安装的独立连接。
pub struct XlibSession {
    handle: DisplayHandle,
}

impl InstallSession for XlibSession {
    fn upload_pixmap(&mut self, canvas: &Canvas) -> Result<PixmapId, BackgroundError> {
        let display = self.handle.raw();
        let screen = self.handle.screen();
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 {
            return Err(BackgroundError::Display(format!("画布尺寸无效：{}x{}", width, height)));
        }

        // SAFETY: display 有效，screen 来自同一连接
        let (depth, visual, gc) = unsafe {
            (
                xlib::XDefaultDepth(display, screen),
                xlib::XDefaultVisual(display, screen),
                xlib::XDefaultGC(display, screen),
            )
        };
        if visual.is_null() {
            return Err(BackgroundError::UnsupportedVisual("默认视觉为空".to_string()));
        }

        // SAFETY: visual 非空且归 display 所有
        let (class, masks) = unsafe {
            (
                (*visual).class,
                ChannelMasks {
                    red: (*visual).red_mask as u32,
                    green: (*visual).green_mask as u32,
                    blue: (*visual).blue_mask as u32,
                },
            )
        };
        if class != xlib::TrueColor || (depth != 24 && depth != 32) {
            return Err(BackgroundError::UnsupportedVisual(format!(
                "需要 24/32 位 TrueColor，实际 class={} depth={}",
                class, depth
            )));
        }

        let mut pixels = pack_pixels(canvas, masks);

        // SAFETY: root 与 display 属于同一连接
        let pixmap = unsafe { xlib::XCreatePixmap(display, self.handle.root(), width, height, depth as c_uint) };

        // SAFETY: pixels 的长度为 width*height 个 32 位像素，存活到 XPutImage 返回之后
        let image = unsafe {
            xlib::XCreateImage(
                display,
                visual,
                depth as c_uint,
                xlib::ZPixmap,
                0,
                pixels.as_mut_ptr() as *mut c_char,
                width,
                height,
                32,
                0,
            )
        };
        if image.is_null() {
            // SAFETY: pixmap 刚由本连接创建
            unsafe {
                xlib::XFreePixmap(display, pixmap);
            }
            return Err(BackgroundError::Display("XCreateImage 失败".to_string()));
        }

        // SAFETY: image 非空；像素缓冲归 pixels 所有，因此只释放 XImage 结构体
        unsafe {
            if (*image).bits_per_pixel != 32 {
                let bpp = (*image).bits_per_pixel;
                xlib::XFree(image as *mut c_void);
                xlib::XFreePixmap(display, pixmap);
                return Err(BackgroundError::UnsupportedVisual(format!(
                    "ZPixmap 每像素 {} 位，仅支持 32 位",
                    bpp
                )));
            }

            (*image).byte_order = if cfg!(target_endian = "little") {
                xlib::LSBFirst
            } else {
                xlib::MSBFirst
            };

            xlib::XPutImage(display, pixmap, gc, image, 0, 0, 0, 0, width, height);
            xlib::XFree(image as *mut c_void);
        }

        log::debug!("📤 已上传 {}x{} 像素到 pixmap 0x{:x}", width, height, pixmap);
        Ok(pixmap as PixmapId)
    }

    fn publish_root_pixmap(&mut self, pixmap: PixmapId) -> Result<(), BackgroundError> {
        let atom = self.handle.intern_atom(ROOT_PIXMAP_ATOM, false)?;
        if atom == 0 {
            return Err(BackgroundError::Display(format!("无法创建 atom {}", ROOT_PIXMAP_ATOM)));
        }

        let value = pixmap as c_ulong;
        // SAFETY: value 在调用期间存活，format 32 对应一个 long
        unsafe {
            xlib::XChangeProperty(
                self.handle.raw(),
                self.handle.root(),
                atom,
                xlib::XA_PIXMAP,
                32,
                xlib::PropModeReplace,
                &value as *const c_ulong as *const c_uchar,
                1,
            );
        }
        Ok(())
    }

    fn set_root_background(&mut self, pixmap: PixmapId) -> Result<(), BackgroundError> {
        let root = self.handle.root();
        // SAFETY: root 与 pixmap 属于同一连接
        unsafe {
            xlib::XSetWindowBackgroundPixmap(self.handle.raw(), root, pixmap as xlib::Pixmap);
            xlib::XClearWindow(self.handle.raw(), root);
        }
        Ok(())
    }

    fn retain_and_close(self) -> Result<(), BackgroundError> {
        // SAFETY: display 有效；Drop 时关闭连接
        unsafe {
            xlib::XSetCloseDownMode(self.handle.raw(), xlib::RetainPermanent);
        }
        self.handle.sync();
        Ok(())
    }
}

/// TrueColor 视觉的通道掩码。
#[derive(Debug, Clone, Copy)]
struct ChannelMasks {
    red: u32,
    green: u32,
    blue: u32,
}

/// 按视觉掩码把 RGBA8 打包为 32 位像素（丢弃 alpha）。
fn pack_pixels(canvas: &Canvas, masks: ChannelMasks) -> Vec<u32> {
    canvas
        .pixels()
        .map(|p| {
            place_channel(p[0], masks.red) | place_channel(p[1], masks.green) | place_channel(p[2], masks.blue)
        })
        .collect()
}

fn place_channel(value: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let max = u64::from(mask >> shift);
    let scaled = (u64::from(value) * max + 127) / 255;
    ((scaled as u32) << shift) & mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RGB888: ChannelMasks = ChannelMasks {
        red: 0x00ff_0000,
        green: 0x0000_ff00,
        blue: 0x0000_00ff,
    };

    #[test]
    fn packs_rgb888_and_drops_alpha() {
        let canvas = Canvas::from_raw(2, 1, vec![0x12, 0x34, 0x56, 0x00, 0xff, 0x00, 0x80, 0xff]).unwrap();

        assert_eq!(pack_pixels(&canvas, RGB888), vec![0x0012_3456, 0x00ff_0080]);
    }

    #[test]
    fn packs_bgr_layout() {
        let masks = ChannelMasks {
            red: 0x0000_00ff,
            green: 0x0000_ff00,
            blue: 0x00ff_0000,
        };
        let canvas = Canvas::from_pixel(1, 1, Rgba([0x11, 0x22, 0x33, 255]));

        assert_eq!(pack_pixels(&canvas, masks), vec![0x0033_2211]);
    }

    #[test]
    fn scales_channels_to_narrow_masks() {
        assert_eq!(place_channel(255, 0x3ff0_0000), 0x3ff0_0000);
        assert_eq!(place_channel(0, 0x3ff0_0000), 0);
        assert_eq!(place_channel(200, 0), 0);
    }
}
