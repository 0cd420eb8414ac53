//! The deduplicated subdomain set of one domain.

use std::collections::BTreeSet;

use tracing::debug;

/// Accumulates hostnames reported by every source of one domain.
///
/// The set only grows: merging is a union and nothing is ever removed.
#[derive(Debug, Default)]
pub struct Aggregator {
    subdomains: BTreeSet<String>,
    contributions: Vec<(String, usize)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `parsed` to the set and returns how many hostnames were not yet present.
    pub fn merge<I>(&mut self, parsed: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.subdomains.len();
        self.subdomains.extend(parsed);
        self.subdomains.len() - before
    }

    /// Like [`Aggregator::merge`], crediting the new entries to `source`.
    pub fn merge_from<I>(&mut self, source: &str, parsed: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let added = self.merge(parsed);
        match self.contributions.iter_mut().find(|(name, _)| name.as_str() == source) {
            Some((_, count)) => *count += added,
            None => self.contributions.push((source.to_string(), added)),
        }
        debug!(source, added, total = self.len(), "merged source results");
        added
    }

    /// Net-new entries credited to each source, in merge order.
    pub fn contributions(&self) -> &[(String, usize)] {
        &self.contributions
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.subdomains.contains(hostname)
    }

    pub fn len(&self) -> usize {
        self.subdomains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subdomains.is_empty()
    }

    /// The collected hostnames in lexicographic order.
    pub fn finalize(&self) -> Vec<String> {
        self.subdomains.iter().cloned().collect()
    }
}
