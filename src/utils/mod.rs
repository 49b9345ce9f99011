//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `None` when the href cannot be made absolute.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://dean.xjtu.edu.cn/jxxx/jxtz2.htm").unwrap();
        assert_eq!(
            resolve_url(&base, "../info/1033/12345.htm").as_deref(),
            Some("https://dean.xjtu.edu.cn/info/1033/12345.htm")
        );
        assert_eq!(
            resolve_url(&base, "jxtz2/2.htm").as_deref(),
            Some("https://dean.xjtu.edu.cn/jxxx/jxtz2/2.htm")
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x").as_deref(),
            Some("https://other.com/x")
        );
    }

    #[test]
    fn test_unresolvable_href() {
        let base = Url::parse("https://dean.xjtu.edu.cn/jxxx/jxtz2.htm").unwrap();
        assert_eq!(resolve_url(&base, "http://"), None);
        assert_eq!(resolve_url(&base, "http://[::1/x.htm"), None);
    }
}
