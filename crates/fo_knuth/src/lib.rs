//! Breakable element sequences.
//!
//! Content that can be broken into lines or pages is expressed as an ordered
//! run of typographic atoms:
//! - [`Element::Box`]: fixed-size content that never breaks,
//! - [`Element::Glue`]: stretchable/shrinkable space, a break candidate after a box,
//! - [`Element::Penalty`]: an explicit break candidate with a cost.
//!
//! Runs are collected into [`KnuthSequence`]s, merged by parents through
//! [`SequenceList`], and handed to a break optimizer as an [`ElementSource`].

extern crate alloc;

mod element;
mod list;
mod sequence;
mod source;

pub use element::{Element, KnuthBox, KnuthGlue, KnuthPenalty};
pub use list::SequenceList;
pub use sequence::{AppendMode, KnuthSequence, LetterSpacing, NoLetterSpacing, SequenceKind};
pub use source::{ChunkSource, DeferredSequence, ElementSource};

/// Lengths are expressed in millipoints (1/1000 pt).
pub type Millipoints = i32;

/// Penalty cost sentinel: `INFINITE` forbids a break, `-INFINITE` forces one.
pub const INFINITE: i32 = 1000;

/// Handle of the layout manager that produced an element.
///
/// Only a handle: holding one never keeps the manager alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u32);

impl ManagerId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A unit of content produced by one manager: a word, a line, a graphic.
///
/// Positions travel on elements to the break optimizer and back to
/// `add_areas`, and are used to resume production after a chosen break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub manager: ManagerId,
    pub index: usize,
}

impl Position {
    pub const fn new(manager: ManagerId, index: usize) -> Self {
        Self { manager, index }
    }
}
