//! # HTML 扫描模块
//!
//! ## 设计思路
//!
//! 只识别 `<img ...>`，不做 DOM 解析。对字节流做一次前向扫描：
//!
//! 1. 忽略大小写匹配 `<`、`I`、`M`、`G` 四个字节
//! 2. 命中后以 `<img` 作为缓冲区开头，逐字节追加，直到追加了 `>` 或流结束
//! 3. 缓冲区交给 `img_tag::extract_src`，结果交给 `UrlAnchors::resolve`
//!
//! 累积阶段不处理嵌套尖括号或属性引号，解释工作全部留给 `img_tag`。
//!
//! ## 实现思路
//!
//! - 每次调用独占自己的缓冲区与结果序列，可被外部线程池并发调用。
//! - 输出保持文档出现顺序，不去重（去重由下游抓取队列负责）。

use std::fs::File;
use std::io::{BufReader, Read};

use super::img_tag::extract_src;
use super::url_resolver::UrlAnchors;
use super::LinkError;
use crate::document::Document;

const TAG_PREFIX: &[u8; 4] = b"<IMG";
const TAG_SEED: &str = "<img";

/// 从文档中提取所有图片 URL。
///
/// 文档无法打开时返回 `LinkError::IoUnavailable`。
pub fn extract_image_urls(doc: &Document) -> Result<Vec<String>, LinkError> {
    let path = doc.path();
    let file = File::open(path).map_err(|e| {
        LinkError::IoUnavailable(format!("无法打开 {} 进行读取：{}", path.display(), e))
    })?;

    extract_from_reader(BufReader::new(file), doc.uri())
}

/// 面向抓取流水线的入口：失败时记录警告并返回空序列。
pub fn extract_links(doc: &Document) -> Vec<String> {
    match extract_image_urls(doc) {
        Ok(urls) => {
            log::debug!("🔗 {} 中提取到 {} 个图片链接", doc.uri(), urls.len());
            urls
        }
        Err(err) => {
            log::warn!("⚠️ 提取图片链接失败，跳过该文档：{}", err);
            Vec::new()
        }
    }
}

/// 从任意字节流提取图片 URL，`uri` 为文档来源地址。
pub fn extract_from_reader<R: Read>(reader: R, uri: &str) -> Result<Vec<String>, LinkError> {
    let anchors = UrlAnchors::from_uri(uri)?;

    let urls = scan_img_tags(reader)?
        .iter()
        .filter_map(|tag| extract_src(tag))
        .map(|src| anchors.resolve(&src))
        .collect();

    Ok(urls)
}

/// 扫描字节流，返回每个 `<img` 标签的原始文本。
pub fn scan_img_tags<R: Read>(reader: R) -> Result<Vec<String>, LinkError> {
    let mut bytes = reader.bytes();
    let mut tags = Vec::new();
    let mut matched = 0usize;

    while let Some(byte) = bytes.next() {
        let byte = byte.map_err(read_error)?;

        if byte.to_ascii_uppercase() == TAG_PREFIX[matched] {
            matched += 1;
        } else {
            matched = usize::from(byte == b'<');
        }

        if matched < TAG_PREFIX.len() {
            continue;
        }
        matched = 0;

        let mut buf = TAG_SEED.as_bytes().to_vec();
        for byte in bytes.by_ref() {
            let byte = byte.map_err(read_error)?;
            buf.push(byte);
            if byte == b'>' {
                break;
            }
        }

        tags.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(tags)
}

fn read_error(err: std::io::Error) -> LinkError {
    LinkError::IoUnavailable(format!("读取文档失败：{}", err))
}
