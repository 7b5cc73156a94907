use once_cell::sync::Lazy;
use regex::Regex;

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("Invalid id regex"));

static FILE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/]+\S*$").expect("Invalid file url regex"));

/// ID 校验：1-64 位字母、数字、下划线或连字符
pub fn validate_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("ID must not be empty");
    }
    if !ID_RE.is_match(id) {
        return Err("ID must be 1-64 letters, numbers, underscores or hyphens");
    }
    Ok(())
}

/// 文件地址必须是绝对的 http(s) URL
pub fn validate_file_url(url: &str) -> Result<(), &'static str> {
    if url.len() > 2048 {
        return Err("File URL is too long");
    }
    if !FILE_URL_RE.is_match(url) {
        return Err("File URL must be an absolute http(s) URL");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("a1").is_ok());
        assert!(validate_id("k3j9x0qz7w2m5n8b1c4d").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("a|b").is_err());
        assert!(validate_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_file_url() {
        assert!(validate_file_url("https://cdn.example.com/report.pdf").is_ok());
        assert!(validate_file_url("http://host/a").is_ok());
        assert!(validate_file_url("ftp://example.com/x").is_err());
        assert!(validate_file_url("https:// spaced").is_err());
        assert!(validate_file_url("/relative/path").is_err());
    }
}
