//! URL extraction from free-form chat text

use reqwest::Url;

const TRIM_CHARS: &[char] = &[',', ';', '.', ')', '(', ']', '[', '>', '<', '"', '\''];

/// Every `http(s)://` token in `text`, in order of appearance
///
/// Tokens are split on whitespace, stripped of surrounding punctuation and
/// must parse as a URL with a host.
pub fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| raw.trim_matches(TRIM_CHARS))
        .filter(|token| token.starts_with("http://") || token.starts_with("https://"))
        .filter_map(|token| Url::parse(token).ok())
        .filter(|url| url.host_str().is_some())
        .map(|url| url.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_separated_links() {
        let urls = extract_urls("https://a.com/1.mp4 https://b.com/2.mkv https://c.com/file.zip");
        assert_eq!(
            urls,
            vec!["https://a.com/1.mp4", "https://b.com/2.mkv", "https://c.com/file.zip"]
        );
    }

    #[test]
    fn test_ignores_non_links() {
        let urls = extract_urls("grab (https://a.com/x.mp4), ftp://b.com/y and httpfoo");
        assert_eq!(urls, vec!["https://a.com/x.mp4"]);
    }

    #[test]
    fn test_rejects_hostless() {
        assert!(extract_urls("http:// https://").is_empty());
    }

    #[test]
    fn test_keeps_duplicates() {
        let urls = extract_urls("https://a.com/x https://a.com/x");
        assert_eq!(urls.len(), 2);
    }
}
