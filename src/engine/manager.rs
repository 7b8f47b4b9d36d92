use super::classifier::classify;
use super::ruleset::RuleSet;
use super::traits::RuleSource;
use crate::error::RefreshError;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Downloads the rule list and turns it into a [`RuleSet`].
pub struct RuleListManager {
    source: Arc<dyn RuleSource>,
}

impl RuleListManager {
    pub fn new(source: Arc<dyn RuleSource>) -> Self {
        Self { source }
    }

    pub async fn build(&self) -> Result<RuleSet, RefreshError> {
        info!("Fetching rule list from {}", self.source.describe());

        // The stream is dropped on every return path below, which releases
        // the connection.
        let mut stream = self.source.download().await?;
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        drop(stream);

        debug!("Downloaded {} encoded bytes", raw.len());
        parse_rule_list(&raw)
    }
}

/// Decodes a base64 rule list. Line breaks inside the encoded text are
/// ignored.
pub fn decode_rule_list(raw: &[u8]) -> Result<Vec<u8>, RefreshError> {
    let encoded: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(BASE64_STANDARD.decode(encoded)?)
}

pub fn parse_rule_list(raw: &[u8]) -> Result<RuleSet, RefreshError> {
    let decoded = decode_rule_list(raw)?;
    Ok(parse_rule_bytes(&decoded))
}

/// Classifies every line of a decoded list. A line that is not valid UTF-8
/// is dropped on its own.
pub fn parse_rule_bytes(decoded: &[u8]) -> RuleSet {
    parse_lines(decoded.split(|&b| b == b'\n').filter_map(|line| {
        match std::str::from_utf8(line) {
            Ok(line) => Some(line),
            Err(e) => {
                debug!("skip line with invalid UTF-8, {}", e);
                None
            }
        }
    }))
}

pub fn parse_rule_text(text: &str) -> RuleSet {
    parse_lines(text.lines())
}

fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> RuleSet {
    let mut total_lines = 0usize;
    let set = RuleSet::build(
        lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .inspect(|_| total_lines += 1)
            .map(classify),
    );

    let counts = set.counts();
    info!(
        "Parsed {} lines: {} domains, {} ips, {} keywords",
        total_lines, counts.domains, counts.ips, counts.domain_keywords
    );
    set
}
