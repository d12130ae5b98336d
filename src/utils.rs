/// Object key utility functions / 对象键工具函数

/// Hierarchy delimiter inside keys / 路径分隔符
pub const DELIMITER: char = '/';

/// Fallback content type / 默认内容类型
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Check if key is a folder placeholder (ends with /) / 判断是否是目录占位键
pub fn is_placeholder(key: &str) -> bool {
    key.ends_with(DELIMITER)
}

/// Split key into non-empty segments / 按分隔符拆分键（忽略空段）
/// "docs//images/a.png" -> ["docs", "images", "a.png"]
pub fn key_segments(key: &str) -> Vec<&str> {
    key.split(DELIMITER).filter(|s| !s.is_empty()).collect()
}

/// Guess content type from key extension / 根据扩展名推断内容类型
pub fn guess_content_type(key: &str) -> String {
    mime_guess::from_path(key)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Parse HTTP date from S3 headers / 解析 Last-Modified
/// Accepts RFC 2822 ("Wed, 21 Oct 2015 07:28:00 GMT") and RFC 3339
pub fn parse_http_date(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc2822(value)
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
