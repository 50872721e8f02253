//! Page identity, content fingerprints and marker ids.

use rand::Rng;
use url::Url;

use crate::store::types::PageKey;

/// Prefix shared by every key this crate writes.
pub const KEY_NAMESPACE: &str = "lrf:";

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Key for the page at `url`, ignoring query string and fragment.
///
/// Returns `None` when `url` does not parse.
pub fn page_key(url: &str) -> Option<PageKey> {
    let parsed = Url::parse(url).ok()?;
    Some(format!(
        "{}{}{}",
        KEY_NAMESPACE,
        parsed.origin().ascii_serialization(),
        parsed.path()
    ))
}

/// djb2-style hash over UTF-16 code units, rendered in base 36.
///
/// Uses the `(h * 33) ^ c` variant with 32-bit wrapping, which reproduces
/// hashes already stored by the browser extension.
pub fn content_fingerprint(text: &str) -> String {
    let mut hash: i32 = 5381;
    for unit in text.encode_utf16() {
        hash = hash.wrapping_mul(33) ^ i32::from(unit);
    }
    to_base36(u64::from(hash as u32))
}

/// `<millis in base 36>-<6 random base-36 chars>`.
pub fn marker_id(created_at: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| BASE36_DIGITS[rng.gen_range(0..36)] as char)
        .collect();
    format!("{}-{}", to_base36(created_at.max(0) as u64), suffix)
}

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key_ignores_query_and_fragment() {
        assert_eq!(
            page_key("https://a.com/doc?x=1").as_deref(),
            Some("lrf:https://a.com/doc")
        );
        assert_eq!(
            page_key("https://a.com/doc#s2").as_deref(),
            Some("lrf:https://a.com/doc")
        );
        assert_eq!(
            page_key("https://a.com/doc?page=2&sort=asc#comments"),
            page_key("https://a.com/doc")
        );
    }

    #[test]
    fn test_page_key_keeps_port_and_path() {
        assert_eq!(
            page_key("http://localhost:8080/a/b/?q").as_deref(),
            Some("lrf:http://localhost:8080/a/b/")
        );
        assert_ne!(page_key("https://a.com/doc"), page_key("https://a.com/doc2"));
    }

    #[test]
    fn test_page_key_rejects_garbage() {
        assert_eq!(page_key("not a url"), None);
    }

    #[test]
    fn test_fingerprint_matches_extension_hashes() {
        assert_eq!(content_fingerprint(""), "45h");
        assert_eq!(content_fingerprint("a"), "3t1g");
        assert_eq!(content_fingerprint("hello world"), "1x0xvt1");
        assert_eq!(
            content_fingerprint("The quick brown fox jumps over the lazy dog"),
            "1emp2q2"
        );
        assert_eq!(content_fingerprint("é€😀"), "ylwcfx");
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_marker_id_shape() {
        let id = marker_id(1_700_000_000_000);
        let (time, random) = id.split_once('-').unwrap();
        assert_eq!(time, "loyw3v28");
        assert_eq!(random.len(), 6);
        assert!(random.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(marker_id(1), marker_id(1));
    }
}
