//! Anchor-based duplicate grouping.
//!
//! # Overview
//!
//! Partitions a collection of fingerprints into duplicate groups using the
//! symmetric truncate-to-shorter comparison from
//! [`matcher::symmetric_ber`]. Grouping is single-link against the group's
//! first (anchor) member only: each unprocessed fingerprint is compared to
//! the anchor, never to members added later. Two files both similar to the
//! anchor land in the same group even if they are dissimilar to each other.
//! That anchor-only policy is part of the observable contract and is kept
//! as-is; see DESIGN.md for the transitive-closure question.

use super::matcher;
use super::BitVector;

/// A non-empty ordered cluster of files believed to share audio content.
///
/// The first member is the anchor and the kept representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup<K> {
    members: Vec<K>,
}

impl<K> DuplicateGroup<K> {
    fn new(anchor: K) -> Self {
        Self {
            members: vec![anchor],
        }
    }

    /// All members in discovery order, anchor first.
    #[must_use]
    pub fn members(&self) -> &[K] {
        &self.members
    }

    /// The anchor member, designated "keep".
    #[must_use]
    pub fn representative(&self) -> &K {
        &self.members[0]
    }

    /// Number of members; always at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Groups are never empty; provided for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the group holds more than one file.
    #[must_use]
    pub fn is_cluster(&self) -> bool {
        self.members.len() > 1
    }

    /// Members other than the representative.
    #[must_use]
    pub fn duplicates(&self) -> &[K] {
        &self.members[1..]
    }
}

/// Partition `entries` into duplicate groups.
///
/// Entries are visited in input order. Each not-yet-processed entry opens a
/// new group and becomes its anchor; every later unprocessed entry whose
/// symmetric BER against the anchor is strictly below `threshold` joins the
/// group. Every input id ends up in exactly one group; singleton groups
/// mean the file is unique at this threshold.
///
/// Empty bit vectors never compare similar to anything (no bits to
/// compare), so they always come out as singletons.
#[must_use]
pub fn group_duplicates<K: Clone>(
    entries: &[(K, BitVector)],
    threshold: f64,
) -> Vec<DuplicateGroup<K>> {
    let mut processed = vec![false; entries.len()];
    let mut groups = Vec::new();

    for i in 0..entries.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let (anchor_id, anchor_bits) = &entries[i];
        let mut group = DuplicateGroup::new(anchor_id.clone());

        for j in (i + 1)..entries.len() {
            if processed[j] {
                continue;
            }
            let (id, bits) = &entries[j];
            match matcher::symmetric_ber(anchor_bits, bits) {
                Some(ber) if ber < threshold => {
                    log::debug!("duplicate pair (ber {ber:.4}), joining anchor group {i}");
                    processed[j] = true;
                    group.members.push(id.clone());
                }
                _ => {}
            }
        }

        groups.push(group);
    }

    let clusters = groups.iter().filter(|g| g.is_cluster()).count();
    log::info!(
        "grouped {} fingerprints into {} groups ({} duplicate clusters)",
        entries.len(),
        groups.len(),
        clusters
    );

    groups
}
