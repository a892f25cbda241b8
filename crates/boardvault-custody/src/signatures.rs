//! Signature tracker for the current release cycle

use std::collections::HashSet;

use boardvault_common::Identity;

/// Set of members that signed the current release request
///
/// Identities are not validated here; the workflow checks board membership
/// before recording.
#[derive(Debug, Clone, Default)]
pub struct SignatureTracker {
    signers: HashSet<Identity>,
}

impl SignatureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every signature of the current cycle
    pub fn reset(&mut self) {
        self.signers.clear();
    }

    /// Record a signature. Returns `false` if `member` already signed this cycle.
    pub fn record_signature(&mut self, member: &Identity) -> bool {
        self.signers.insert(member.clone())
    }

    #[inline]
    pub fn has_signed(&self, member: &Identity) -> bool {
        self.signers.contains(member)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.signers.len()
    }

    /// Signers of the current cycle, sorted for stable output
    pub fn signers(&self) -> Vec<Identity> {
        let mut signers: Vec<_> = self.signers.iter().cloned().collect();
        signers.sort();
        signers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let mut tracker = SignatureTracker::new();
        let carol = Identity::new("carol").unwrap();

        assert!(tracker.record_signature(&carol));
        assert!(!tracker.record_signature(&carol));
        assert_eq!(tracker.count(), 1);
        assert!(tracker.has_signed(&carol));
    }

    #[test]
    fn test_reset_clears_cycle() {
        let mut tracker = SignatureTracker::new();
        let carol = Identity::new("carol").unwrap();
        let dave = Identity::new("dave").unwrap();
        tracker.record_signature(&dave);
        tracker.record_signature(&carol);
        assert_eq!(tracker.signers(), vec![carol.clone(), dave]);

        tracker.reset();
        assert_eq!(tracker.count(), 0);
        assert!(!tracker.has_signed(&carol));
        assert!(tracker.record_signature(&carol));
    }
}
