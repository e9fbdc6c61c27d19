use regex::Regex;

use crate::error::RuleError;

/// Compile a rule pattern literal into a regex.
///
/// Rule files write patterns in the Perl style: `/body/flags` or
/// `m{body}flags`. The `i`, `s`, `m` and `x` flags are carried over as an
/// inline flag group; anything else is rejected. Bare text without
/// delimiters is compiled as-is. Matching is unanchored search, so rules
/// anchor explicitly with `^` and `$` where they mean it.
pub fn compile(pattern_text: &str) -> Result<Regex, RuleError> {
    let text = pattern_text.trim();
    let (body, flags) = split_pattern(text)
        .ok_or_else(|| RuleError::InvalidPattern {
            pattern: pattern_text.to_string(),
            reason: "unterminated pattern delimiter".to_string(),
        })?;

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 's' | 'm' | 'x' => inline.push(flag),
            other => {
                return Err(RuleError::InvalidPattern {
                    pattern: pattern_text.to_string(),
                    reason: format!("unsupported pattern flag '{other}'"),
                })
            }
        }
    }

    let translated = if inline.is_empty() {
        body.to_string()
    } else {
        format!("(?{inline}){body}")
    };

    Regex::new(&translated).map_err(|e| RuleError::InvalidPattern {
        pattern: pattern_text.to_string(),
        reason: e.to_string(),
    })
}

/// Split a pattern literal into body and trailing flags.
///
/// Returns None when a delimiter is opened but never closed.
fn split_pattern(text: &str) -> Option<(&str, &str)> {
    if let Some(rest) = text.strip_prefix('/') {
        let end = rest.rfind('/')?;
        Some((&rest[..end], &rest[end + 1..]))
    } else if let Some(rest) = text.strip_prefix("m{") {
        let end = rest.rfind('}')?;
        Some((&rest[..end], &rest[end + 1..]))
    } else {
        // No delimiters: the whole text is the body
        Some((text, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_delimited() {
        let re = compile("/^Buy now/").unwrap();
        assert!(re.is_match("Buy now and save"));
        assert!(!re.is_match("Don't Buy now"));
    }

    #[test]
    fn test_case_insensitive_flag() {
        let re = compile("/viagra/i").unwrap();
        assert!(re.is_match("VIAGRA"));
        assert!(re.is_match("Viagra"));
    }

    #[test]
    fn test_brace_delimited() {
        let re = compile("m{foo/bar}i").unwrap();
        assert!(re.is_match("FOO/BAR"));
    }

    #[test]
    fn test_bare_pattern() {
        let re = compile(r"example\.com$").unwrap();
        assert!(re.is_match("user@example.com"));
        assert!(!re.is_match("example.com zone"));
    }

    #[test]
    fn test_unsupported_flag_rejected() {
        match compile("/foo/g") {
            Err(RuleError::InvalidPattern { .. }) => {}
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_body_rejected() {
        match compile("/foo(/") {
            Err(RuleError::InvalidPattern { .. }) => {}
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_delimiter_rejected() {
        match compile("/foo") {
            Err(RuleError::InvalidPattern { reason, .. }) => {
                assert!(reason.contains("unterminated"));
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }
}
