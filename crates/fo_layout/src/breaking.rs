//! Break optimizer interface and the first-fit reference implementation.

use core::error::Error;
use core::fmt;

use fo_knuth::{Element, ElementSource, Millipoints};
use log::trace;

use crate::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRequest {
    /// Line width when breaking lines, page height when breaking pages.
    pub extent: Millipoints,
    pub alignment: Alignment,
    /// Break after the first legal break past an overfull stretch instead of
    /// giving up.
    pub allow_overflow: bool,
    /// Stop after this many breaks.
    pub max_breaks: Option<usize>,
}

impl BreakRequest {
    pub fn lines(extent: Millipoints, alignment: Alignment) -> Self {
        Self {
            extent,
            alignment,
            allow_overflow: true,
            max_breaks: None,
        }
    }

    /// The next page break only.
    pub fn page(extent: Millipoints) -> Self {
        Self {
            extent,
            alignment: Alignment::Start,
            allow_overflow: false,
            max_breaks: Some(1),
        }
    }

    #[must_use]
    pub fn with_overflow(mut self) -> Self {
        self.allow_overflow = true;
        self
    }
}

/// A chosen break: content ends right before `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPoint {
    pub index: usize,
    /// Natural extent of the content before the break.
    pub natural: Millipoints,
}

/// No legal break keeps the content within the requested extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoFeasibleBreaks {
    /// Index where the unbreakable stretch starts.
    pub start: usize,
    pub extent: Millipoints,
}

impl fmt::Display for NoFeasibleBreaks {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "no feasible break for content starting at element {} within {}mpt",
            self.start, self.extent
        )
    }
}

impl Error for NoFeasibleBreaks {}

/// Chooses break points over an element source.
pub trait BreakOptimizer {
    /// # Errors
    /// Returns [`NoFeasibleBreaks`] when the request forbids overflow and
    /// some content cannot be made to fit.
    fn find_breaks(
        &mut self,
        source: &mut dyn ElementSource,
        request: &BreakRequest,
    ) -> Result<Vec<BreakPoint>, NoFeasibleBreaks>;
}

/// Greedy breaker: every line or page takes as much content as fits.
///
/// Discardable elements at the start of a line are skipped. Content after
/// the last break that fits is left to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFitBreaker;

impl FirstFitBreaker {
    fn skip_discardable(source: &mut dyn ElementSource, from: usize) -> usize {
        let mut index = from;
        while source.resolve(index).is_some_and(Element::is_discardable) {
            index += 1;
        }
        index
    }
}

impl BreakOptimizer for FirstFitBreaker {
    fn find_breaks(
        &mut self,
        source: &mut dyn ElementSource,
        request: &BreakRequest,
    ) -> Result<Vec<BreakPoint>, NoFeasibleBreaks> {
        let mut breaks = Vec::new();
        let mut start = Self::skip_discardable(source, 0);

        'lines: while request.max_breaks.is_none_or(|max| breaks.len() < max) {
            let mut width = 0;
            let mut candidate: Option<BreakPoint> = None;
            let mut overflowing = false;
            let mut previous: Option<Element> = None;
            let mut index = start;

            while let Some(element) = source.resolve(index).cloned() {
                if element.is_forced_break() {
                    breaks.push(BreakPoint {
                        index,
                        natural: width,
                    });
                    start = Self::skip_discardable(source, index + 1);
                    continue 'lines;
                }
                if index > start && element.is_legal_break(previous.as_ref()) {
                    let natural = width + if element.is_penalty() { element.width() } else { 0 };
                    let chosen = BreakPoint { index, natural };
                    if overflowing {
                        breaks.push(chosen);
                        start = Self::skip_discardable(source, index + 1);
                        continue 'lines;
                    }
                    if natural <= request.extent {
                        candidate = Some(chosen);
                    }
                }
                if !element.is_penalty() {
                    width += element.width();
                }
                if element.is_box() && width > request.extent && !overflowing {
                    if let Some(chosen) = candidate {
                        breaks.push(chosen);
                        start = Self::skip_discardable(source, chosen.index + 1);
                        continue 'lines;
                    }
                    if !request.allow_overflow {
                        trace!(target: "fo_layout", "no feasible break from {start}");
                        return Err(NoFeasibleBreaks {
                            start,
                            extent: request.extent,
                        });
                    }
                    overflowing = true;
                }
                previous = Some(element);
                index += 1;
            }
            break;
        }
        Ok(breaks)
    }
}
