use crate::config::Config;
use crate::message::ParsedMessage;
use crate::rules::header::HeaderRule;

/// Compiled rule set, built once at load time and evaluated per message.
///
/// Rules and their patterns are immutable after construction, so one
/// engine can be shared read-only across any number of concurrent scans.
pub struct FilterEngine {
    rules: Vec<HeaderRule>,
    required_score: f64,
}

/// Outcome of scanning one message.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub score: f64,
    pub matched: Vec<String>,
    pub is_spam: bool,
}

impl FilterEngine {
    /// Compile every rule definition in the config.
    ///
    /// A rule that fails to parse is logged and skipped; a bad rule
    /// disables itself, not the whole rule set.
    pub fn new(config: Config) -> Self {
        let mut rules = Vec::with_capacity(config.rules.len());
        for def in &config.rules {
            match HeaderRule::parse(&def.name, &def.header, def.score, def.describe.clone()) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    log::warn!("Skipping rule '{}': {e}", def.name);
                }
            }
        }
        log::info!(
            "Compiled {} of {} rules",
            rules.len(),
            config.rules.len()
        );

        FilterEngine {
            rules,
            required_score: config.required_score,
        }
    }

    /// Evaluate every rule against a message and total up the score.
    pub fn scan(&self, msg: &ParsedMessage) -> ScanReport {
        let mut score = 0.0;
        let mut matched = Vec::new();

        for rule in &self.rules {
            if rule.matches(msg) {
                log::debug!("Rule '{}' matched (score {})", rule.name, rule.score);
                score += rule.score;
                matched.push(rule.name.clone());
            }
        }

        ScanReport {
            score,
            is_spam: score >= self.required_score,
            matched,
        }
    }

    /// Rules that survived compilation.
    pub fn rules(&self) -> &[HeaderRule] {
        &self.rules
    }
}
