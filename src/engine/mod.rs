pub mod classifier;
mod fetcher;
mod manager;
mod provider;
pub mod ruleset;
pub mod state;
mod traits;

pub use classifier::{classify, Classification};
pub use fetcher::HttpSource;
pub use manager::{
    decode_rule_list, parse_rule_bytes, parse_rule_list, parse_rule_text, RuleListManager,
};
pub use provider::{RuleProvider, DEFAULT_INTERVAL};
pub use ruleset::{dedup_preserving_order, RuleCounts, RuleSet};
pub use state::{ProviderState, Snapshot};
pub use traits::{RuleSource, RuleStream};
