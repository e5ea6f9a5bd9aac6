//! Engine configuration, built once and shared by reference.

use fo_knuth::Millipoints;
use fo_tree::PropertyMapping;

/// Page geometry of one page master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMaster {
    /// Inline-progression dimension of the body region.
    pub ipd: Millipoints,
    /// Block-progression dimension of the body region.
    pub bpd: Millipoints,
    /// Extent of the region-before, where static content goes. Static
    /// content that does not fit is dropped.
    pub before_extent: Millipoints,
}

impl PageMaster {
    pub const fn new(ipd: Millipoints, bpd: Millipoints) -> Self {
        Self {
            ipd,
            bpd,
            before_extent: 0,
        }
    }

    #[must_use]
    pub const fn with_before_extent(mut self, before_extent: Millipoints) -> Self {
        self.before_extent = before_extent;
        self
    }
}

/// Fixed-advance text metrics. Real font metrics are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    pub char_width: Millipoints,
    pub space_width: Millipoints,
    pub space_stretch: Millipoints,
    pub space_shrink: Millipoints,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 6_000,
            space_width: 3_000,
            space_stretch: 1_500,
            space_shrink: 1_000,
        }
    }
}

impl TextMetrics {
    pub fn word_width(&self, word: &str, letter_space: Millipoints) -> Millipoints {
        let chars = word.chars().count() as Millipoints;
        chars * self.char_width + (chars - 1).max(0) * letter_space
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub properties: PropertyMapping,
    pub metrics: TextMetrics,
    /// Used when `line-height` resolves to nothing usable.
    pub line_height: Millipoints,
    /// Used when `letter-spacing` resolves to nothing usable.
    pub letter_space: Millipoints,
    /// Page `n` uses master `n`, the last master repeats.
    pub page_masters: Vec<PageMaster>,
    /// How many child managers are materialised per cursor pull.
    pub child_batch: usize,
    /// Upper bound on generated pages.
    pub max_pages: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            properties: PropertyMapping::standard(),
            metrics: TextMetrics::default(),
            line_height: 14_400,
            letter_space: 0,
            // A4 minus 2cm margins
            page_masters: vec![PageMaster {
                ipd: 538_583,
                bpd: 785_197,
                before_extent: 28_346,
            }],
            child_batch: 4,
            max_pages: 10_000,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn with_page_masters(mut self, masters: Vec<PageMaster>) -> Self {
        self.page_masters = masters;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_child_batch(mut self, child_batch: usize) -> Self {
        self.child_batch = child_batch.max(1);
        self
    }

    /// Master for the zero-based page `index`.
    pub fn page_master(&self, index: usize) -> Option<PageMaster> {
        self.page_masters
            .get(index)
            .or_else(|| self.page_masters.last())
            .copied()
    }
}
