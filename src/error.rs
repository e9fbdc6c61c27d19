use thiserror::Error;

/// Errors produced while turning a rule definition into a matcher.
///
/// The distinction matters to callers: an `InvalidRuleSelector` means the
/// rule line itself is malformed, while an `InvalidPattern` means the
/// selector was fine but the pattern literal did not compile.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unrecognized rule selector '{0}'")]
    InvalidRuleSelector(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
