//! Deterministic snapshot construction
//!
//! Rows are ordered by (canonical wallet, item id as a 256-bit integer), deduplicated
//! keeping the first occurrence, and encoded into the ledger identifier space. The
//! same pool contents always produce the same entries in the same order, whatever
//! order the pool returned them in.

use std::collections::HashSet;
use types::{EligibilityRow, ItemKey, SnapshotEntry, ValidationError, U256};

/// Ordered, deduplicated, encoded snapshot of the eligibility pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
    duplicates_removed: usize,
    rejected: Vec<(EligibilityRow, ValidationError)>,
}

impl Snapshot {
    /// Build a snapshot from raw pool rows
    pub fn build(rows: Vec<EligibilityRow>, item_id_offset: U256) -> Self {
        let input_len = rows.len();

        let mut keyed: Vec<(String, ItemKey, EligibilityRow)> = rows
            .into_iter()
            .map(|row| (row.canonical_wallet(), row.item_key(), row))
            .collect();

        // Stable sort: among equal keys the pool's original order decides "first"
        keyed.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        keyed.dedup_by(|later, earlier| later.0 == earlier.0 && later.1 == earlier.1);
        let mut duplicates_removed = input_len - keyed.len();

        let mut entries = Vec::with_capacity(keyed.len());
        let mut rejected = Vec::new();
        // Raw and pre-encoded forms of one item collapse to the same ledger id
        let mut seen: HashSet<(String, U256)> = HashSet::with_capacity(keyed.len());

        for (wallet, key, row) in keyed {
            let encoded = match key.encode(item_id_offset) {
                Ok(encoded) => encoded,
                Err(e) => {
                    rejected.push((row, e));
                    continue;
                }
            };

            if !seen.insert((wallet.clone(), encoded)) {
                duplicates_removed += 1;
                continue;
            }

            match SnapshotEntry::new(wallet, encoded) {
                Ok(entry) => entries.push(entry),
                Err(e) => rejected.push((row, e)),
            }
        }

        Self {
            entries,
            duplicates_removed,
            rejected,
        }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    /// Rows that could not be represented on the ledger, with the reason
    pub fn rejected(&self) -> &[(EligibilityRow, ValidationError)] {
        &self.rejected
    }

    /// Split into the parallel `(item_ids, owners)` columns the ledger expects
    pub fn into_columns(self) -> (Vec<U256>, Vec<String>) {
        self.entries
            .into_iter()
            .map(|entry| (entry.item_id, entry.owner))
            .unzip()
    }

    /// Canonical byte encoding, identical for identical snapshots
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.entries.len() * 76);
        for entry in &self.entries {
            bytes.extend_from_slice(entry.owner.as_bytes());
            bytes.push(b':');
            let mut word = [0u8; 32];
            entry.item_id.to_big_endian(&mut word);
            bytes.extend_from_slice(&word);
            bytes.push(b'\n');
        }
        bytes
    }
}
