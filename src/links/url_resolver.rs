//! # URL 解析模块
//!
//! ## 设计思路
//!
//! 纯字符串拼接，不做网络或文件系统访问。每个文档只推导一次锚点
//! （`base` = 协议 + 主机，`relative` = 文档所在“目录”），随后对每个
//! `src` 值按三种形态之一拼接出完整 URL：
//!
//! | `src` 形态 | 结果 |
//! |------------|------|
//! | 以 `/` 开头 | `base + src` |
//! | `http://` / `https://`（忽略大小写） | 原样返回 |
//! | 其他 | `relative + "/" + src` |

use super::LinkError;

/// 推导 `base` 时跳过的协议前缀长度。
const SCHEME_PREFIX_LEN: usize = 8;

/// 单个文档的 URL 锚点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAnchors {
    /// 协议 + 主机部分，用于拼接站内绝对路径。
    pub base: String,
    /// 文档所在目录，用于拼接相对路径。
    pub relative: String,
}

impl UrlAnchors {
    /// 从文档来源 URI 推导锚点。
    ///
    /// URI 长度不足协议前缀时返回 `LinkError::UriTooShort`。
    pub fn from_uri(uri: &str) -> Result<Self, LinkError> {
        Ok(Self {
            base: derive_base(uri)?,
            relative: derive_relative(uri),
        })
    }

    /// 按当前锚点解析单个 `src` 值。
    pub fn resolve(&self, src: &str) -> String {
        resolve(&self.base, &self.relative, src)
    }
}

/// 将 `src` 解析为完整 URL。
///
/// # 示例
/// ```
/// use geh::links::url_resolver::resolve;
///
/// assert_eq!(resolve("http://h", "http://h/d", "/a.png"), "http://h/a.png");
/// assert_eq!(resolve("http://h", "http://h/d", "a.png"), "http://h/d/a.png");
/// assert_eq!(resolve("http://h", "http://h/d", "HTTPS://x/a.png"), "HTTPS://x/a.png");
/// ```
pub fn resolve(base: &str, relative: &str, src: &str) -> String {
    if src.starts_with('/') {
        format!("{}{}", base, src)
    } else if starts_with_ignore_ascii_case(src, "http://")
        || starts_with_ignore_ascii_case(src, "https://")
    {
        src.to_string()
    } else {
        format!("{}/{}", relative, src)
    }
}

/// 推导 `base`：跳过前 8 个字节后找第一个 `/`，截取其之前的部分；
/// 找不到时返回完整 URI。
///
/// 按字节查找 `/`，第 8 个字节落在多字节字符内部时同样可用。
pub fn derive_base(uri: &str) -> Result<String, LinkError> {
    let tail = uri.as_bytes().get(SCHEME_PREFIX_LEN..).ok_or_else(|| {
        LinkError::UriTooShort(format!(
            "URI 长度不足 {} 个字符，无法推导主机：{}",
            SCHEME_PREFIX_LEN, uri
        ))
    })?;

    // `/` 是单字节字符，切片位置必然落在字符边界上
    Ok(match tail.iter().position(|&b| b == b'/') {
        Some(pos) => uri[..SCHEME_PREFIX_LEN + pos].to_string(),
        None => uri.to_string(),
    })
}

/// 推导 `relative`：截取最后一个 `/` 之前的部分；没有 `/` 时返回完整 URI。
pub fn derive_relative(uri: &str) -> String {
    match uri.rfind('/') {
        Some(pos) => uri[..pos].to_string(),
        None => uri.to_string(),
    }
}

fn starts_with_ignore_ascii_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_base_cuts_at_first_slash_after_scheme() {
        assert_eq!(derive_base("http://example.com/a/b.html").unwrap(), "http://example.com");
        assert_eq!(derive_base("https://example.com/a").unwrap(), "https://example.com");
    }

    #[test]
    fn derive_base_without_path_returns_whole_uri() {
        assert_eq!(derive_base("http://example.com").unwrap(), "http://example.com");
    }

    #[test]
    fn derive_base_rejects_short_uri() {
        assert!(matches!(derive_base("http://"), Err(LinkError::UriTooShort(_))));
        assert!(matches!(derive_base(""), Err(LinkError::UriTooShort(_))));
    }

    #[test]
    fn derive_base_accepts_multibyte_host() {
        assert_eq!(derive_base("http://ébc.test/a/b.html").unwrap(), "http://ébc.test");
        assert_eq!(derive_base("https://例子.test/p").unwrap(), "https://例子.test");
        assert_eq!(derive_base("http://ébc").unwrap(), "http://ébc");
    }

    #[test]
    fn derive_relative_cuts_at_last_slash() {
        assert_eq!(derive_relative("http://example.com/a/b.html"), "http://example.com/a");
        assert_eq!(derive_relative("http://example.com"), "http://example.com");
        assert_eq!(derive_relative("page.html"), "page.html");
    }

    #[test]
    fn empty_src_falls_into_relative_branch() {
        assert_eq!(resolve("http://h", "http://h/dir", ""), "http://h/dir/");
    }

    #[test]
    fn scheme_check_is_case_insensitive() {
        assert_eq!(resolve("b", "r", "HTTP://X"), "HTTP://X");
        assert_eq!(resolve("b", "r", "hTtPs://x/y"), "hTtPs://x/y");
        assert_eq!(resolve("b", "r", "httpfoo"), "r/httpfoo");
    }

    #[test]
    fn anchors_resolve_through_both_shapes() {
        let anchors = UrlAnchors::from_uri("http://h.test/dir/page.html").unwrap();

        assert_eq!(anchors.base, "http://h.test");
        assert_eq!(anchors.relative, "http://h.test/dir");
        assert_eq!(anchors.resolve("a.gif"), "http://h.test/dir/a.gif");
        assert_eq!(anchors.resolve("/b.gif"), "http://h.test/b.gif");
    }
}
