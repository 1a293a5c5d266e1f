//! Extraction engine - turns pasted, usually malformed text into a clean,
//! ordered set of credential pairs.
//!
//! Two tiers run in order and the first non-empty result wins:
//!
//! 1. [`structured`] repairs near-JSON and reads records by key aliases.
//! 2. [`blocks`] splits on `},{` boundaries and regex-scans each block.
//!
//! Neither tier can fail loudly; a parse error is just "no match".

mod blocks;
mod structured;

use std::collections::HashSet;

use crate::types::CredentialPair;

/// Extract unique `(uid, password)` pairs from `text`, in first-seen order.
///
/// Returns an empty vector when neither tier finds anything.
pub fn extract(text: &str) -> Vec<CredentialPair> {
    structured::parse(text)
        .or_else(|| blocks::parse(text))
        .unwrap_or_default()
}

/// Insertion-ordered set of pairs.
#[derive(Default)]
pub(crate) struct PairSet {
    seen: HashSet<CredentialPair>,
    pairs: Vec<CredentialPair>,
}

impl PairSet {
    pub(crate) fn insert(&mut self, pair: CredentialPair) {
        if self.seen.insert(pair.clone()) {
            self.pairs.push(pair);
        }
    }

    pub(crate) fn into_non_empty(self) -> Option<Vec<CredentialPair>> {
        if self.pairs.is_empty() {
            None
        } else {
            Some(self.pairs)
        }
    }
}
