use regex::Regex;

use crate::error::RuleError;
use crate::message::ParsedMessage;
use crate::pattern;

/// Headers searched by the `ToCc` selector.
const TO_CC_HEADERS: &[&str] = &["To", "Cc"];

/// Headers searched by the `MESSAGEID` selector.
const MESSAGE_ID_HEADERS: &[&str] = &["Message-Id", "Resent-Message-Id", "X-Message-Id"];

/// One header-matching strategy, fixed at rule-load time.
///
/// Every variant answers the same question against a different slice of
/// the header surface: does at least one qualifying value satisfy the
/// pattern? An absent header is an ordinary non-match, never an error.
#[derive(Debug)]
pub enum HeaderMatcher {
    /// `exists:Name` - the header is present at all, value ignored.
    Exists { header: String },
    /// `Name =~ /pat/` - decoded value(s) of one header.
    Pattern { header: String, pattern: Regex },
    /// `Name:raw =~ /pat/` - undecoded value(s) of one header.
    RawPattern { header: String, pattern: Regex },
    /// `Name:addr =~ /pat/` - first address per occurrence.
    AddrPattern { header: String, pattern: Regex },
    /// `Name:name =~ /pat/` - first display name per occurrence.
    NamePattern { header: String, pattern: Regex },
    /// `ToCc` / `MESSAGEID` - decoded values across a fixed header set.
    MultiPattern {
        headers: &'static [&'static str],
        pattern: Regex,
    },
    /// `ALL` - every header as one decoded `"Name: value"` unit. This is
    /// the only variant where the header name is part of the searched text.
    AllPattern { pattern: Regex },
}

impl HeaderMatcher {
    /// Evaluate against a message. Short-circuits on the first value that
    /// satisfies the pattern.
    pub fn matches(&self, msg: &ParsedMessage) -> bool {
        match self {
            HeaderMatcher::Exists { header } => msg.has_raw_header(header),
            HeaderMatcher::Pattern { header, pattern } => msg
                .get_decoded_header(header)
                .iter()
                .any(|value| pattern.is_match(value)),
            HeaderMatcher::RawPattern { header, pattern } => msg
                .get_raw_header(header)
                .iter()
                .any(|value| pattern.is_match(value)),
            HeaderMatcher::AddrPattern { header, pattern } => msg
                .get_addr_header(header)
                .iter()
                .any(|value| pattern.is_match(value)),
            HeaderMatcher::NamePattern { header, pattern } => msg
                .get_name_header(header)
                .iter()
                .any(|value| pattern.is_match(value)),
            HeaderMatcher::MultiPattern { headers, pattern } => headers.iter().any(|name| {
                msg.get_decoded_header(name)
                    .iter()
                    .any(|value| pattern.is_match(value))
            }),
            HeaderMatcher::AllPattern { pattern } => {
                msg.iter_decoded_headers().any(|unit| pattern.is_match(&unit))
            }
        }
    }
}

/// A named header rule: matcher plus the identity it scores under.
#[derive(Debug)]
pub struct HeaderRule {
    pub name: String,
    pub score: f64,
    pub describe: Option<String>,
    matcher: HeaderMatcher,
}

impl HeaderRule {
    /// Build a rule from a selector/value line.
    ///
    /// Two forms are recognized: `selector =~ /pattern/flags` and
    /// `exists:Header-Name`. Anything else, including an unrecognized
    /// selector modifier, is an `InvalidRuleSelector`.
    pub fn parse(
        name: &str,
        value: &str,
        score: Option<f64>,
        describe: Option<String>,
    ) -> Result<Self, RuleError> {
        let matcher = parse_selector(value)?;
        Ok(HeaderRule {
            name: name.to_string(),
            score: score.unwrap_or(1.0),
            describe,
            matcher,
        })
    }

    pub fn matches(&self, msg: &ParsedMessage) -> bool {
        self.matcher.matches(msg)
    }

    pub fn matcher(&self) -> &HeaderMatcher {
        &self.matcher
    }
}

/// Dispatch a selector/value line to the right matcher variant.
///
/// The reserved tokens win over modifier splitting, so a literal header
/// named `ALL` cannot be addressed.
fn parse_selector(value: &str) -> Result<HeaderMatcher, RuleError> {
    if let Some((selector, pattern_text)) = value.split_once("=~") {
        let selector = selector.trim();
        let pattern = pattern::compile(pattern_text.trim())?;

        if selector == "ALL" {
            return Ok(HeaderMatcher::AllPattern { pattern });
        }
        if selector == "ToCc" {
            return Ok(HeaderMatcher::MultiPattern {
                headers: TO_CC_HEADERS,
                pattern,
            });
        }
        if selector == "MESSAGEID" {
            return Ok(HeaderMatcher::MultiPattern {
                headers: MESSAGE_ID_HEADERS,
                pattern,
            });
        }

        if let Some((header, modifier)) = selector.rsplit_once(':') {
            let header = header.trim().to_string();
            return match modifier {
                "raw" => Ok(HeaderMatcher::RawPattern { header, pattern }),
                "addr" => Ok(HeaderMatcher::AddrPattern { header, pattern }),
                "name" => Ok(HeaderMatcher::NamePattern { header, pattern }),
                _ => Err(RuleError::InvalidRuleSelector(value.to_string())),
            };
        }

        return Ok(HeaderMatcher::Pattern {
            header: selector.to_string(),
            pattern,
        });
    }

    if let Some(rest) = value.strip_prefix("exists:") {
        return Ok(HeaderMatcher::Exists {
            header: rest.trim().to_string(),
        });
    }

    Err(RuleError::InvalidRuleSelector(value.to_string()))
}
