use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::FeedItem;

/// Where a live item lands once its author is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedOrdering {
    /// After every item created at or before it, so the sequence stays sorted
    /// by creation time whatever order lookups complete in.
    #[default]
    Chronological,
    /// At the end, in the order lookups complete.
    Append,
}

/// Ordered, de-duplicated chat sequence.
#[derive(Debug, Default)]
pub struct FeedMerger {
    items: Vec<FeedItem>,
    known: HashSet<String>,
    ordering: FeedOrdering,
}

impl FeedMerger {
    pub fn new(ordering: FeedOrdering) -> Self {
        Self {
            items: Vec::new(),
            known: HashSet::new(),
            ordering,
        }
    }

    pub fn ordering(&self) -> FeedOrdering {
        self.ordering
    }

    /// Replace the sequence with a bulk read, kept verbatim.
    pub fn load(&mut self, items: Vec<FeedItem>) {
        self.known = items.iter().map(|item| item.id.clone()).collect();
        self.items = items;
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    /// Add a resolved live item. Returns its index, or `None` for a known id.
    pub fn insert(&mut self, item: FeedItem) -> Option<usize> {
        if !self.known.insert(item.id.clone()) {
            return None;
        }
        let index = match self.ordering {
            FeedOrdering::Append => self.items.len(),
            FeedOrdering::Chronological => self
                .items
                .partition_point(|existing| existing.created_at <= item.created_at),
        };
        self.items.insert(index, item);
        Some(index)
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
