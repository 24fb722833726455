//! Sibling bookkeeping for multi-valued connectors.
//!
//! Rows describing one composite entity (a solvent's name, its volume ratio,
//! its supplier, ...) arrive as independent schema rows. The only hint that
//! ties them together is the free-text metadata label, so the registry keeps
//! the tokens seen on every sibling and matches each new row against them.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use crate::node::Scalar;

/// Slot name used when a row writes the sibling's own value rather than a
/// key below it.
pub const SELF_SLOT: &str = "";

pub type Tokens = BTreeSet<String>;

/// Lowercase alphanumeric tokens of `text`.
pub fn tokenize(text: &str) -> Tokens {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokens a row contributes: its metadata label, plus its value when the
/// value is text.
pub fn row_tokens(label: &str, value: &Scalar) -> Tokens {
    let mut tokens = tokenize(label);
    if let Some(text) = value.as_str() {
        tokens.extend(tokenize(text));
    }
    tokens
}

#[derive(Debug, Clone, Default)]
struct SiblingRecord {
    /// Creation order across the whole session.
    seq: usize,
    /// Tokens of the row that created the sibling.
    original: Tokens,
    /// Tokens of every later row that landed on it.
    accumulated: Tokens,
    /// Slots already written through this sibling.
    filled: BTreeSet<String>,
}

impl SiblingRecord {
    fn knows(&self, token: &str) -> bool {
        self.original.contains(token) || self.accumulated.contains(token)
    }

    fn all_tokens(&self) -> Tokens {
        self.original.union(&self.accumulated).cloned().collect()
    }
}

/// Score tuple; compared lexicographically, highest wins.
type Score = (usize, usize, bool, usize, Reverse<usize>);

/// Per-session registry of siblings under multi-valued connectors.
///
/// Groups are keyed by position: the traversed path down to and including
/// the connector key, with sibling indices, so nested connectors under
/// different siblings never share records.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    groups: HashMap<String, Vec<SiblingRecord>>,
    fallback_counters: HashMap<String, usize>,
    next_seq: usize,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn recorded(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, Vec::len)
    }

    /// Align the records with the number of nodes actually present. Nodes
    /// added by other branches (e.g. quantities) get blank records.
    pub fn sync(&mut self, group: &str, count: usize) {
        let records = self.groups.entry(group.to_string()).or_default();
        if records.len() > count {
            log::debug!(
                "Registry for {group} tracks {} siblings but only {count} exist",
                records.len()
            );
            records.truncate(count);
        }
        while records.len() < count {
            records.push(SiblingRecord {
                seq: self.next_seq,
                ..Default::default()
            });
            self.next_seq += 1;
        }
    }

    /// Record a newly created sibling and return its index.
    pub fn register(&mut self, group: &str, tokens: &Tokens) -> usize {
        let records = self.groups.entry(group.to_string()).or_default();
        records.push(SiblingRecord {
            seq: self.next_seq,
            original: tokens.clone(),
            ..Default::default()
        });
        self.next_seq += 1;
        records.len() - 1
    }

    #[cfg(test)]
    fn is_filled(&self, group: &str, index: usize, slot: &str) -> bool {
        self.groups
            .get(group)
            .and_then(|records| records.get(index))
            .is_some_and(|record| record.filled.contains(slot))
    }

    /// Note that a row landed on sibling `index` and wrote `slot`.
    pub fn record_visit(&mut self, group: &str, index: usize, tokens: &Tokens, slot: &str) {
        let Some(record) = self
            .groups
            .get_mut(group)
            .and_then(|records| records.get_mut(index))
        else {
            return;
        };
        record.accumulated.extend(tokens.iter().cloned());
        record.filled.insert(slot.to_string());
    }

    /// Choose the existing sibling of `group` that a row with `tokens`
    /// writing `slot` belongs to.
    ///
    /// Candidates are tried in score order and the first one whose `slot` is
    /// still empty wins. Returns `None` when the group has no siblings or
    /// every sibling already holds `slot`; the caller then creates one.
    pub fn select(&mut self, group: &str, tokens: &Tokens, slot: &str) -> Option<usize> {
        let records = self.groups.get(group)?;
        let is_open = |index: &usize| !records[*index].filled.contains(slot);

        if let Some(ranked) = rank(records, tokens) {
            return ranked.into_iter().find(is_open);
        }

        // No textual hint at all: keep row order aligned with sibling order.
        let counter = self
            .fallback_counters
            .entry(format!("{group}#{slot}"))
            .or_insert(0);
        let nth = *counter;
        *counter += 1;

        let chosen = Some(nth)
            .filter(|index| *index < records.len() && is_open(index))
            .or_else(|| (0..records.len()).find(is_open));
        match chosen {
            Some(index) => {
                log::debug!("No token overlap under {group}; falling back to sibling {index}")
            }
            None => log::debug!("Every sibling under {group} already holds '{slot}'"),
        }
        chosen
    }
}

/// Candidate indices ordered best first, or `None` when no candidate shares
/// a single token with the row.
fn rank(records: &[SiblingRecord], tokens: &Tokens) -> Option<Vec<usize>> {
    let owners = |token: &str, in_original_only: bool| {
        records
            .iter()
            .filter(|r| {
                if in_original_only {
                    r.original.contains(token)
                } else {
                    r.knows(token)
                }
            })
            .count()
    };

    let mut scored: Vec<(usize, Score)> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let unique_original = tokens
                .iter()
                .filter(|t| record.original.contains(t.as_str()) && owners(t.as_str(), true) == 1)
                .count();
            let unique_any = tokens
                .iter()
                .filter(|t| record.knows(t.as_str()) && owners(t.as_str(), false) == 1)
                .count();
            let all = record.all_tokens();
            let covered = !all.is_empty() && all.is_subset(tokens);
            let overlap = all.intersection(tokens).count();
            (
                index,
                (
                    unique_original,
                    unique_any,
                    covered,
                    overlap,
                    Reverse(record.seq),
                ),
            )
        })
        .collect();

    if scored.iter().all(|(_, score)| score.3 == 0) {
        return None;
    }
    scored.sort_by(|(_, a), (_, b)| b.cmp(a));
    Some(scored.into_iter().map(|(index, _)| index).collect())
}
