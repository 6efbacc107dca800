//! 图片链接提取模块
//!
//! # 设计思路
//!
//! 抓取流水线拿到 HTML 文档后，需要把其中引用的图片地址送回抓取队列。
//! 本模块按依赖顺序拆分为三层：
//!
//! ```text
//! scanner（驱动字节流） → img_tag（解析 src=） → url_resolver（拼接完整 URL）
//! ```
//!
//! # 实现思路
//!
//! - 链接提取只做容错扫描，畸形标记一律优雅降级，不产生错误。
//! - 文档无法打开属于警告级别：`extract_links` 返回空序列，流水线继续处理其他文档。
//! - 抓取队列通过 `Fetchable` 接收结果，本模块不依赖队列的具体实现。

pub mod img_tag;
pub mod scanner;
pub mod url_resolver;

pub use scanner::{extract_from_reader, extract_image_urls, extract_links};
pub use url_resolver::UrlAnchors;

use crate::document::Document;

/// 链接提取错误
#[derive(Debug, Clone, thiserror::Error)]
pub enum LinkError {
    /// 文档无法打开或读取
    #[error("文档不可读：{0}")]
    IoUnavailable(String),

    /// 来源 URI 过短，无法推导主机部分
    #[error("URI 无效：{0}")]
    UriTooShort(String),
}

/// 抓取队列回调约定：接收新发现的 URL。
pub trait Fetchable {
    fn enqueue(&mut self, url: String);
}

impl Fetchable for Vec<String> {
    fn enqueue(&mut self, url: String) {
        self.push(url);
    }
}

/// 提取文档中的图片链接并按出现顺序送入队列，返回送入数量。
pub fn feed_links<F: Fetchable + ?Sized>(doc: &Document, sink: &mut F) -> usize {
    let urls = extract_links(doc);
    let count = urls.len();
    for url in urls {
        sink.enqueue(url);
    }
    count
}
