use super::classifier::Classification;
use crate::error::RefreshError;
use bytes::Bytes;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Classified values of one full parse pass.
///
/// `domains` and `ips` are deduplicated in first-occurrence order.
/// `domain_keywords` keeps every occurrence, repeats included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub domains: Vec<String>,
    pub ips: Vec<String>,
    pub domain_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleCounts {
    pub domains: usize,
    pub ips: usize,
    pub domain_keywords: usize,
}

#[derive(Serialize)]
struct ProviderDocument<'a> {
    payload: &'a [String],
}

impl RuleSet {
    pub fn build<I>(classifications: I) -> Self
    where
        I: IntoIterator<Item = Classification>,
    {
        let mut set = RuleSet::default();
        for classification in classifications {
            match classification {
                Classification::Ip(v) => set.ips.push(v),
                Classification::Domain(v) => set.domains.push(v),
                Classification::DomainKeyword(v) => set.domain_keywords.push(v),
                Classification::Unknown => {}
            }
        }
        set.domains = dedup_preserving_order(set.domains);
        set.ips = dedup_preserving_order(set.ips);
        set
    }

    pub fn counts(&self) -> RuleCounts {
        RuleCounts {
            domains: self.domains.len(),
            ips: self.ips.len(),
            domain_keywords: self.domain_keywords.len(),
        }
    }

    /// Rule lines in provider order: keywords, then IPs, then domains.
    pub fn render(&self) -> Vec<String> {
        let mut rules =
            Vec::with_capacity(self.domains.len() + self.ips.len() + self.domain_keywords.len());

        for keyword in &self.domain_keywords {
            rules.push(format!("DOMAIN-KEYWORD,{}", keyword));
        }
        for ip in &self.ips {
            rules.push(format!("SRC-IP-CIDR,{}/32", ip));
        }
        for domain in &self.domains {
            rules.push(format!("DOMAIN-SUFFIX,{}", domain));
        }

        rules
    }

    /// Serializes the rendered rules as a `payload:` YAML document.
    pub fn to_document(&self) -> Result<Bytes, RefreshError> {
        let rules = self.render();
        let yaml = serde_yaml::to_string(&ProviderDocument { payload: &rules })?;
        Ok(Bytes::from(yaml))
    }
}

/// Drops empty strings and repeats, keeping the first occurrence of each value.
pub fn dedup_preserving_order(list: Vec<String>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    list.into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}
