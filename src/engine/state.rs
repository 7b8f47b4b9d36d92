use super::ruleset::RuleCounts;
use arc_swap::ArcSwap;
use bytes::Bytes;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// One published rendering. Never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub document: Bytes,
    pub counts: RuleCounts,
    // Unix seconds; None until the first successful refresh.
    pub built_at: Option<u64>,
}

impl Snapshot {
    pub fn new(document: Bytes, counts: RuleCounts) -> Self {
        Self {
            document,
            counts,
            built_at: Some(unix_now()),
        }
    }
}

/// The currently served snapshot, swapped whole on every successful refresh.
#[derive(Debug, Clone)]
pub struct ProviderState {
    current: Arc<ArcSwap<Snapshot>>,
}

impl ProviderState {
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::default())),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn document(&self) -> Bytes {
        self.current.load().document.clone()
    }

    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for ProviderState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let state = ProviderState::new();
        assert!(state.document().is_empty());
        assert!(state.load().built_at.is_none());
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let state = ProviderState::new();
        let before = state.load();

        let counts = RuleCounts {
            domains: 1,
            ips: 0,
            domain_keywords: 0,
        };
        state.publish(Snapshot::new(
            Bytes::from_static(b"payload:\n- DOMAIN-SUFFIX,a.com\n"),
            counts,
        ));

        // Readers holding the old snapshot keep seeing it unchanged.
        assert!(before.document.is_empty());
        assert_eq!(state.load().counts, counts);
        assert_eq!(
            state.document(),
            Bytes::from_static(b"payload:\n- DOMAIN-SUFFIX,a.com\n")
        );
        assert!(state.load().built_at.is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let state = ProviderState::new();
        let reader = state.clone();
        state.publish(Snapshot::new(Bytes::from_static(b"x"), RuleCounts::default()));
        assert_eq!(reader.document(), Bytes::from_static(b"x"));
    }
}
