//! Marker table and the "current entry" context threaded through a document scan.
//!
//! A marker is a literal text fragment. When a paragraph contains it
//! (case-insensitively), the catalog entry in scope switches to the marker's
//! entry id and stays there until another marker is seen. There is no end
//! marker: scope runs to the next match or to the end of the document.

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Marker {
    pub text: String,
    pub id: u32,
}

/// Order in which markers are tried against a paragraph. The first hit wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchOrder {
    /// As listed in configuration.
    #[default]
    Declaration,
    /// Longest marker text first; ties keep declaration order.
    LongestFirst,
}

#[derive(Clone, Debug, Default)]
pub struct MarkerTable {
    markers: Vec<Marker>,
    /// `markers` indices in match order, with lowercased needles.
    order: Vec<(usize, String)>,
    match_order: MatchOrder,
}

impl MarkerTable {
    pub fn new(markers: Vec<Marker>, match_order: MatchOrder) -> Self {
        let mut order: Vec<(usize, String)> = markers
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                if m.text.trim().is_empty() {
                    log::warn!("Ignoring empty marker for entry {}", m.id);
                    false
                } else {
                    true
                }
            })
            .map(|(i, m)| (i, m.text.to_lowercase()))
            .collect();
        if match_order == MatchOrder::LongestFirst {
            // stable sort keeps declaration order among equal lengths
            order.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));
        }
        MarkerTable {
            markers,
            order,
            match_order,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn match_order(&self) -> MatchOrder {
        self.match_order
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// First marker contained in `text`, in this table's match order.
    pub fn find(&self, text: &str) -> Option<&Marker> {
        if text.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.order
            .iter()
            .find(|(_, needle)| haystack.contains(needle.as_str()))
            .map(|(i, _)| &self.markers[*i])
    }
}

/// Pure transition: the entry in scope after seeing a paragraph with `text`.
pub fn observe(context: Option<u32>, text: &str, table: &MarkerTable) -> Option<u32> {
    match table.find(text) {
        Some(marker) => Some(marker.id),
        None => context,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextTracker {
    current: Option<u32>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    /// Update the context from one paragraph and return the id its images belong to.
    pub fn observe(&mut self, text: &str, table: &MarkerTable) -> Option<u32> {
        let next = observe(self.current, text, table);
        if next != self.current
            && let Some(id) = next
        {
            log::debug!("Context switched to entry {id} by {text:?}");
        }
        self.current = next;
        next
    }
}
