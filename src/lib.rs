pub mod config;
pub mod error;
pub mod filter;
pub mod message;
pub mod pattern;
pub mod rules;

pub use config::{Config, RuleDef};
pub use error::RuleError;
pub use filter::{FilterEngine, ScanReport};
pub use message::ParsedMessage;
pub use rules::{HeaderMatcher, HeaderRule};
