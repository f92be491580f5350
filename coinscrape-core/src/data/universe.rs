//! Universe selection: which listed entities a run fetches history for.
//!
//! The universe is derived once from the listing and is read-only after
//! that. An optional symbol filter narrows it; filter symbols that match
//! nothing are dropped without error.

use crate::listing::{Listing, ListingEntry};
use std::collections::HashSet;
use tracing::debug;

/// The entities of one run, in listing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    entries: Vec<ListingEntry>,
}

impl Universe {
    /// Select from `listing`, keeping listing order.
    ///
    /// With `symbols = None` (or an empty filter) the full listing is used.
    pub fn select(listing: &Listing, symbols: Option<&[String]>) -> Self {
        let entries = match symbols.filter(|s| !s.is_empty()) {
            None => listing.entries.clone(),
            Some(filter) => {
                let wanted: HashSet<&str> = filter.iter().map(|s| s.as_str()).collect();
                let selected: Vec<ListingEntry> = listing
                    .entries
                    .iter()
                    .filter(|e| wanted.contains(e.symbol.as_str()))
                    .cloned()
                    .collect();

                let matched: HashSet<&str> = selected.iter().map(|e| e.symbol.as_str()).collect();
                for sym in wanted.difference(&matched) {
                    debug!(symbol = %sym, "filter symbol not in listing");
                }
                selected
            }
        };
        Self { entries }
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.slug.as_str()).collect()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
