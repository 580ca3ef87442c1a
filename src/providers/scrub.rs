use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 300;

/// Token prefixes whose trailing value must never reach logs or the
/// queue's `error_message` column. Covers the backend key formats plus
/// the platform's long-lived page/user tokens.
const PREFIX_PATTERNS: [&str; 6] = ["sk-", "sk-proj-", "Bearer ", "EAAB", "EAAG", "IGQV"];

const MARKER_PATTERNS: [&str; 8] = [
    "access_token=",
    "api_key=",
    "refresh_token=",
    "client_secret=",
    "\"access_token\":\"",
    "\"api_key\":\"",
    "\"client_secret\":\"",
    "\"token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) -> bool {
    let mut modified = false;
    let mut search_from = 0;
    loop {
        let Some(rel) = scrubbed[search_from..].find(marker) else {
            break;
        };

        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Skip bare markers without a token value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        modified = true;
        search_from = start + "[REDACTED]".len();
    }

    modified
}

/// Scrub known secret-like token patterns from error strings before they
/// are persisted or logged.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrub = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrub {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for pattern in PREFIX_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern);
    }
    for marker in MARKER_PATTERNS {
        scrub_after_marker(&mut scrubbed, marker);
    }

    Cow::Owned(scrubbed)
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized error from a failed HTTP response.
pub(crate) async fn api_error(service: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{service} API error ({status}): {sanitized}")
}

#[cfg(test)]
mod tests {
    use super::{sanitize_api_error, scrub_secret_patterns};

    #[test]
    fn scrubs_backend_key_prefix() {
        let scrubbed = scrub_secret_patterns("bad key sk-abc123DEF was rejected");
        assert!(!scrubbed.contains("sk-abc123DEF"));
        assert!(scrubbed.contains("[REDACTED]"));
    }

    #[test]
    fn scrubs_platform_graph_tokens() {
        let scrubbed = scrub_secret_patterns("token IGQVabcdef123 expired");
        assert!(!scrubbed.contains("IGQVabcdef123"));
    }

    #[test]
    fn scrubs_query_and_json_markers() {
        let input = r#"GET /me?access_token=abc123 failed: {"client_secret":"shh456"}"#;
        let scrubbed = scrub_secret_patterns(input);
        assert!(!scrubbed.contains("abc123"));
        assert!(!scrubbed.contains("shh456"));
        assert_eq!(scrubbed.matches("[REDACTED]").count(), 2);
    }

    #[test]
    fn clean_input_is_borrowed_unchanged() {
        let input = "duplicate reply not allowed";
        assert_eq!(scrub_secret_patterns(input), input);
    }

    #[test]
    fn long_errors_are_truncated_on_char_boundary() {
        let input = "ä".repeat(500);
        let out = sanitize_api_error(&input);
        assert!(out.ends_with("..."));
        assert!(out.chars().count() <= 304);
    }
}
