// src/util.rs — Shared string helpers

/// Excerpt for prompts and progress lines: the first `max_chars`
/// characters, with `...` appended when anything was cut.
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short post", 200), "short post");
        assert_eq!(ellipsize("abcdef", 3), "abc...");
        assert_eq!(ellipsize("naïve copy", 3), "naï...");
        assert_eq!(ellipsize("", 0), "");
    }
}
