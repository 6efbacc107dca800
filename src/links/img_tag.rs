//! # `<img>` 标签解析
//!
//! 只关心 `src=` 属性。值的结束符由紧跟在 `src=` 后的字符决定：
//! 单/双引号以同一引号结束，否则以空格结束。找不到结束符时（标签被截断
//! 或直接以 `>` 收尾）取到缓冲区末尾，并去掉收尾的 `>`。

const SRC_ATTR: &str = "src=";

/// 从累积的标签文本中提取 `src` 值。
///
/// 没有 `src=` 时返回 `None`。
///
/// # 示例
/// ```
/// use geh::links::img_tag::extract_src;
///
/// assert_eq!(extract_src("<img src='pic.png'>").as_deref(), Some("pic.png"));
/// assert_eq!(extract_src("<img alt=x>"), None);
/// ```
pub fn extract_src(tag: &str) -> Option<String> {
    // ASCII 小写不改变字节偏移，可直接用于切片原文本
    let start = tag.to_ascii_lowercase().find(SRC_ATTR)? + SRC_ATTR.len();
    let rest = &tag[start..];

    let (value, terminator) = match rest.chars().next() {
        Some(quote @ ('\'' | '"')) => (&rest[1..], quote),
        _ => (rest, ' '),
    };

    let value = match value.find(terminator) {
        Some(end) => &value[..end],
        None => value.strip_suffix('>').unwrap_or(value),
    };

    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_quoted_value() {
        assert_eq!(extract_src("<img src='pic.png'>").as_deref(), Some("pic.png"));
    }

    #[test]
    fn double_quoted_value_with_spaces() {
        assert_eq!(
            extract_src(r#"<img alt="x" src="my pic.png" width=3>"#).as_deref(),
            Some("my pic.png")
        );
    }

    #[test]
    fn unquoted_value_ends_at_space() {
        assert_eq!(extract_src("<img src=pic.png alt=x>").as_deref(), Some("pic.png"));
    }

    #[test]
    fn unquoted_value_ends_at_closing_bracket() {
        assert_eq!(extract_src("<img src=pic.png>").as_deref(), Some("pic.png"));
    }

    #[test]
    fn attribute_name_is_case_insensitive() {
        assert_eq!(extract_src(r#"<IMG SRC="A.GIF">"#).as_deref(), Some("A.GIF"));
    }

    #[test]
    fn truncated_tag_returns_remainder() {
        assert_eq!(extract_src(r#"<img src="broken"#).as_deref(), Some("broken"));
    }

    #[test]
    fn src_at_very_end_yields_empty_value() {
        assert_eq!(extract_src("<img src=").as_deref(), Some(""));
        assert_eq!(extract_src("<img src='").as_deref(), Some(""));
    }

    #[test]
    fn missing_src_is_skipped() {
        assert_eq!(extract_src("<img alt='nothing here'>"), None);
    }

    #[test]
    fn non_ascii_text_does_not_shift_offsets() {
        assert_eq!(
            extract_src("<img alt='图片' src='图/片.png'>").as_deref(),
            Some("图/片.png")
        );
    }
}
