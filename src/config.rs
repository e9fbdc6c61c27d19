use serde::{Deserialize, Serialize};

/// A rule set loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Total score at or above which a message is flagged as spam.
    #[serde(default = "default_required_score")]
    pub required_score: f64,
    pub rules: Vec<RuleDef>,
}

/// One rule definition as written in the config file.
///
/// `header` is the selector/value text handed verbatim to the rule
/// parser, e.g. `From:addr =~ /@example\.com$/i` or `exists:X-Spam-Flag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: String,
    pub header: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub describe: Option<String>,
}

fn default_required_score() -> f64 {
    5.0
}

impl Default for Config {
    fn default() -> Self {
        Config {
            required_score: default_required_score(),
            rules: vec![
                RuleDef {
                    name: "SUBJ_BUY_NOW".to_string(),
                    header: r"Subject =~ /buy now/i".to_string(),
                    score: Some(2.5),
                    describe: Some("Subject pushes an immediate purchase".to_string()),
                },
                RuleDef {
                    name: "FROM_SUPPORT_DISPLAY".to_string(),
                    header: r"From:name =~ /support|billing/i".to_string(),
                    score: Some(1.5),
                    describe: Some("Display name impersonates a support desk".to_string()),
                },
                RuleDef {
                    name: "HAS_SPAM_FLAG".to_string(),
                    header: "exists:X-Spam-Flag".to_string(),
                    score: Some(4.0),
                    describe: Some("Upstream filter already flagged this message".to_string()),
                },
                RuleDef {
                    name: "MSGID_SUSPECT_TLD".to_string(),
                    header: r"MESSAGEID =~ /@[^>]*\.(top|loan|click)/".to_string(),
                    score: Some(3.0),
                    describe: Some("Message-Id domain uses a throwaway TLD".to_string()),
                },
            ],
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.rules.len(), config.rules.len());
        assert_eq!(back.required_score, config.required_score);
    }

    #[test]
    fn test_required_score_defaults() {
        let yaml = "rules:\n  - name: R1\n    header: \"exists:X-Test\"\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.required_score, 5.0);
        assert_eq!(config.rules[0].score, None);
        assert_eq!(config.rules[0].describe, None);
    }
}
