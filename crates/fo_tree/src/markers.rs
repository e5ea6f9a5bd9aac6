//! Document-level marker bookkeeping for retrieve-marker resolution.

use crate::FoNodeId;
use log::trace;
use std::collections::HashMap;

/// Which registered marker a retrieve-marker placeholder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievePosition {
    #[default]
    FirstStartingWithinPage,
    FirstIncludingCarryover,
    LastStartingWithinPage,
    LastEndingWithinPage,
}

/// How the area carrying a marker sits on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaSpan {
    /// The area's first fragment is on this page.
    pub starts: bool,
    /// Nothing of the area follows on later pages.
    pub ends: bool,
}

impl AreaSpan {
    /// An area that begins and ends on the page.
    pub const WHOLE: Self = Self {
        starts: true,
        ends: true,
    };
}

/// Markers whose areas were placed on the current page, plus the marker
/// carried over from the pages before it.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    page: usize,
    first_starting: HashMap<String, FoNodeId>,
    last_starting: HashMap<String, FoNodeId>,
    /// First area on the page, whether it starts here or continues.
    first_present: HashMap<String, FoNodeId>,
    last_ending: HashMap<String, FoNodeId>,
    last_present: HashMap<String, FoNodeId>,
    /// What a page without a qualifying marker of its own falls back to.
    carryover: HashMap<String, FoNodeId>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start collecting markers for page `page`.
    ///
    /// The finished page hands over the last marker whose area ended on it,
    /// or failing that the last marker placed on it.
    pub fn begin_page(&mut self, page: usize) {
        for (class_name, marker) in self.last_present.drain() {
            let marker = self.last_ending.get(&class_name).copied().unwrap_or(marker);
            self.carryover.insert(class_name, marker);
        }
        self.first_starting.clear();
        self.last_starting.clear();
        self.first_present.clear();
        self.last_ending.clear();
        self.page = page;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Record that an area carrying `marker` was placed on the current page.
    pub fn register(&mut self, class_name: &str, marker: FoNodeId, span: AreaSpan) {
        trace!(target: "fo_tree", "page {}: marker '{class_name}' -> {marker:?} {span:?}", self.page);
        if span.starts {
            self.first_starting.entry(class_name.to_owned()).or_insert(marker);
            self.last_starting.insert(class_name.to_owned(), marker);
        }
        if span.ends {
            self.last_ending.insert(class_name.to_owned(), marker);
        }
        self.first_present.entry(class_name.to_owned()).or_insert(marker);
        self.last_present.insert(class_name.to_owned(), marker);
    }

    /// The marker retrieved at `position`, falling back to the carry-over of
    /// earlier pages when the current page has no qualifying marker.
    pub fn resolve(&self, class_name: &str, position: RetrievePosition) -> Option<FoNodeId> {
        let on_page = match position {
            RetrievePosition::FirstStartingWithinPage => &self.first_starting,
            RetrievePosition::FirstIncludingCarryover => &self.first_present,
            RetrievePosition::LastStartingWithinPage => &self.last_starting,
            RetrievePosition::LastEndingWithinPage => &self.last_ending,
        };
        on_page
            .get(class_name)
            .or_else(|| self.carryover.get(class_name))
            .copied()
    }
}
