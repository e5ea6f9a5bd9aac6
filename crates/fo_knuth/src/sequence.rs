use log::debug;
use smallvec::SmallVec;

use crate::{Element, INFINITE, ManagerId};

/// Which breaking direction a sequence feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Content of a paragraph, broken into lines.
    Inline,
    /// Stacked content, broken into pages.
    Block,
}

/// How the junction between two merged sequences is treated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppendMode {
    /// Plain concatenation, with letter-space insertion between inline runs.
    #[default]
    Plain,
    /// No break may fall at the junction. Lets a block sequence absorb an
    /// inline one.
    KeepTogether,
    /// Insert this penalty at the junction.
    BreakWith(Element),
}

/// The inline manager that owns a box rewrites it to carry one more letter space.
pub trait LetterSpacing {
    /// `removed` holds the elements taken off the end of the receiver, in
    /// sequence order. The returned elements replace them.
    fn add_letter_space_to(
        &mut self,
        owner: ManagerId,
        removed: SmallVec<Element, 4>,
    ) -> Vec<Element>;
}

/// Hands the removed elements back untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLetterSpacing;

impl LetterSpacing for NoLetterSpacing {
    fn add_letter_space_to(
        &mut self,
        _owner: ManagerId,
        removed: SmallVec<Element, 4>,
    ) -> Vec<Element> {
        removed.into_vec()
    }
}

/// An ordered run of elements forming one breakable unit.
///
/// `ignore_at_start`/`ignore_at_end` count elements at either edge that the
/// break optimizer must skip (the closing penalty, leading glues). Once
/// closed, a sequence rejects every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnuthSequence {
    elements: Vec<Element>,
    kind: SequenceKind,
    ignore_at_start: usize,
    ignore_at_end: usize,
    closed: bool,
}

impl KnuthSequence {
    pub fn new(kind: SequenceKind) -> Self {
        Self {
            elements: Vec::new(),
            kind,
            ignore_at_start: 0,
            ignore_at_end: 0,
            closed: false,
        }
    }

    pub fn inline() -> Self {
        Self::new(SequenceKind::Inline)
    }

    pub fn block() -> Self {
        Self::new(SequenceKind::Block)
    }

    pub fn from_elements(kind: SequenceKind, elements: Vec<Element>) -> Self {
        Self {
            elements,
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn is_inline(&self) -> bool {
        self.kind == SequenceKind::Inline
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn last(&self) -> Option<&Element> {
        self.elements.last()
    }

    /// Returns `false` on a closed sequence.
    pub fn push(&mut self, element: Element) -> bool {
        if self.closed {
            debug!(target: "fo_knuth", "refusing push onto closed sequence");
            return false;
        }
        self.elements.push(element);
        true
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) -> bool {
        if self.closed {
            debug!(target: "fo_knuth", "refusing extend of closed sequence");
            return false;
        }
        self.elements.extend(elements);
        true
    }

    pub fn can_append(&self, other: &Self) -> bool {
        self.can_append_with(other, &AppendMode::Plain)
    }

    /// An inline sequence accepts only inline sequences. A block sequence
    /// accepts block sequences, and inline ones only under `KeepTogether`.
    pub fn can_append_with(&self, other: &Self, mode: &AppendMode) -> bool {
        if self.closed {
            return false;
        }
        match (self.kind, other.kind) {
            (SequenceKind::Inline, SequenceKind::Inline)
            | (SequenceKind::Block, SequenceKind::Block) => true,
            (SequenceKind::Block, SequenceKind::Inline) => {
                matches!(mode, AppendMode::KeepTogether)
            }
            (SequenceKind::Inline, SequenceKind::Block) => false,
        }
    }

    pub fn append(&mut self, other: &mut Self, spacer: &mut dyn LetterSpacing) -> bool {
        self.append_with(other, AppendMode::Plain, spacer)
    }

    /// Move every element of `other` onto the end of `self`.
    ///
    /// On success `other` is left empty. On failure neither sequence is
    /// touched. The merged sequence takes over the trailing ignore margin of
    /// `other`, and its leading one as well when `self` was empty.
    pub fn append_with(
        &mut self,
        other: &mut Self,
        mode: AppendMode,
        spacer: &mut dyn LetterSpacing,
    ) -> bool {
        if !self.can_append_with(other, &mode) {
            debug!(
                target: "fo_knuth",
                "append rejected: {:?} (closed={}) <- {:?}",
                self.kind, self.closed, other.kind
            );
            return false;
        }
        if other.elements.is_empty() {
            return true;
        }

        if self.elements.is_empty() {
            self.ignore_at_start = other.ignore_at_start;
        } else {
            match mode {
                AppendMode::KeepTogether => {
                    self.elements
                        .push(Element::auxiliary_penalty(INFINITE, false));
                }
                AppendMode::BreakWith(penalty) => self.elements.push(penalty),
                AppendMode::Plain => {
                    if self.is_inline() && Self::starts_with_content_box(other) {
                        self.insert_letter_space(spacer);
                    }
                }
            }
        }

        self.ignore_at_end = other.ignore_at_end;
        self.elements.append(&mut other.elements);
        other.ignore_at_start = 0;
        other.ignore_at_end = 0;
        true
    }

    fn starts_with_content_box(other: &Self) -> bool {
        other
            .elements
            .first()
            .is_some_and(|first| first.is_box() && !first.is_auxiliary())
    }

    /// `[Box, Penalty, Glue, Box(aux)]`: a word followed by the auxiliary
    /// tail an inline manager emits after its last word.
    fn ends_with_auxiliary_pattern(&self) -> bool {
        let start = self.elements.len().saturating_sub(4);
        matches!(
            self.elements.get(start..),
            Some([word, penalty, glue, tail])
                if word.is_box()
                    && penalty.is_penalty()
                    && glue.is_glue()
                    && tail.is_box()
                    && tail.is_auxiliary()
        )
    }

    /// Rewrite the trailing word so it carries one more letter space.
    ///
    /// Returns whether the elements were handed to the owner. Any mismatch
    /// leaves the sequence as it was, so the caller falls back to plain
    /// concatenation.
    fn insert_letter_space(&mut self, spacer: &mut dyn LetterSpacing) -> bool {
        if self.ignore_at_end > 0 {
            return false;
        }
        let Some(prev) = self.elements.last() else {
            return false;
        };
        if !prev.is_box() {
            return false;
        }
        let take = if prev.is_auxiliary() {
            if !self.ends_with_auxiliary_pattern() {
                debug!(target: "fo_knuth", "letter space skipped: unexpected auxiliary tail");
                return false;
            }
            4
        } else {
            1
        };
        let split = self.elements.len() - take;
        let Some(word) = self.elements.get(split) else {
            return false;
        };
        if word.is_auxiliary() || word.width() == 0 {
            return false;
        }
        let Some(owner) = prev.owner().or_else(|| word.owner()) else {
            debug!(target: "fo_knuth", "letter space skipped: box has no owner");
            return false;
        };

        let removed: SmallVec<Element, 4> = self.elements.drain(split..).collect();
        let anchor = removed.iter().rev().find_map(Element::anchor);
        let mut replacement = spacer.add_letter_space_to(owner, removed);
        if let Some(anchor) = anchor
            && let Some(last_box) = replacement.iter_mut().rev().find(|element| element.is_box())
        {
            *last_box = last_box.clone().with_anchor(anchor);
        }
        self.elements.extend(replacement);
        true
    }

    /// Terminate the sequence with a forced break. A second call is a no-op.
    pub fn close(&mut self) -> &mut Self {
        if self.closed {
            return self;
        }
        self.elements.push(Element::forced_break());
        self.ignore_at_end += 1;
        self.closed = true;
        self
    }

    /// Put an element (typically a border/padding box) at the very start.
    pub fn insert_leading(&mut self, element: Element) -> bool {
        if self.closed {
            debug!(target: "fo_knuth", "refusing leading insert into closed sequence");
            return false;
        }
        self.elements.insert(0, element);
        true
    }

    /// Put an element just before the ignored trailing margin.
    pub fn insert_trailing_before_ignore(&mut self, element: Element) -> bool {
        if self.closed {
            debug!(target: "fo_knuth", "refusing trailing insert into closed sequence");
            return false;
        }
        let at = self.elements.len().saturating_sub(self.ignore_at_end);
        self.elements.insert(at, element);
        true
    }

    pub fn ignore_at_start(&self) -> usize {
        self.ignore_at_start
    }

    pub fn ignore_at_end(&self) -> usize {
        self.ignore_at_end
    }

    pub fn set_ignore_at_end(&mut self, count: usize) {
        self.ignore_at_end = count.min(self.elements.len());
    }

    /// Count the glues right after the ignored start into the ignored start.
    pub fn ignore_leading_glues(&mut self) {
        let glues = self
            .elements
            .iter()
            .skip(self.ignore_at_start)
            .take_while(|element| element.is_glue())
            .count();
        self.ignore_at_start += glues;
    }

    /// The elements the optimizer may break, without the ignored margins.
    pub fn breakable_elements(&self) -> &[Element] {
        let end = self.elements.len().saturating_sub(self.ignore_at_end);
        self.elements
            .get(self.ignore_at_start.min(end)..end)
            .unwrap_or_default()
    }

    /// Once the margins are trimmed, the sequence neither starts nor ends with glue.
    pub fn is_well_formed(&self) -> bool {
        let breakable = self.breakable_elements();
        !breakable.first().is_some_and(Element::is_glue)
            && !breakable.last().is_some_and(Element::is_glue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Millipoints, Position};

    fn word(width: Millipoints) -> Element {
        Element::new_box(width, 10_000).with_owner(ManagerId::new(1))
    }

    #[test]
    fn closing_twice_matches_closing_once() {
        let mut once = KnuthSequence::from_elements(SequenceKind::Inline, vec![word(5)]);
        once.close();
        let mut twice = once.clone();
        twice.close();
        assert_eq!(once, twice);
        assert_eq!(twice.ignore_at_end(), 1);
        assert!(twice.last().is_some_and(Element::is_forced_break));
    }

    #[test]
    fn closed_sequence_refuses_edits() {
        let mut seq = KnuthSequence::inline();
        seq.push(word(5));
        seq.close();
        let before = seq.clone();
        assert!(!seq.insert_leading(Element::auxiliary_box(1, 0)));
        assert!(!seq.insert_trailing_before_ignore(Element::auxiliary_box(1, 0)));
        assert!(!seq.push(word(1)));
        assert_eq!(seq, before);
    }

    #[test]
    fn trailing_insert_lands_before_ignored_margin() {
        let mut seq = KnuthSequence::from_elements(
            SequenceKind::Inline,
            vec![word(5), Element::forced_break()],
        );
        seq.set_ignore_at_end(1);
        assert!(seq.insert_trailing_before_ignore(Element::auxiliary_box(2, 0)));
        assert_eq!(seq.len(), 3);
        assert!(seq.get(1).is_some_and(Element::is_auxiliary));
        assert!(seq.last().is_some_and(Element::is_forced_break));
    }

    #[test]
    fn block_accepts_inline_only_when_kept_together() {
        let block = KnuthSequence::block();
        let inline = KnuthSequence::inline();
        assert!(!block.can_append(&inline));
        assert!(block.can_append_with(&inline, &AppendMode::KeepTogether));
        assert!(!inline.can_append_with(&block, &AppendMode::KeepTogether));
    }

    #[test]
    fn keep_together_junction_is_unbreakable() {
        let mut first = KnuthSequence::from_elements(SequenceKind::Block, vec![word(1)]);
        let mut second = KnuthSequence::from_elements(SequenceKind::Inline, vec![word(2)]);
        assert!(first.append_with(&mut second, AppendMode::KeepTogether, &mut NoLetterSpacing));
        assert_eq!(first.len(), 3);
        assert!(first.get(1).is_some_and(Element::is_forbidden_break));
        assert!(second.is_empty());
    }

    #[test]
    fn anchor_moves_onto_replacement() {
        struct Split;
        impl LetterSpacing for Split {
            fn add_letter_space_to(
                &mut self,
                owner: ManagerId,
                removed: SmallVec<Element, 4>,
            ) -> Vec<Element> {
                let width: Millipoints = removed.iter().map(Element::width).sum();
                vec![
                    Element::new_box(width, 0).with_owner(owner),
                    Element::new_box(100, 0).with_owner(owner),
                ]
            }
        }

        let cited = word(5)
            .with_anchor(ManagerId::new(9))
            .with_position(Position::new(ManagerId::new(1), 0));
        let mut first = KnuthSequence::from_elements(SequenceKind::Inline, vec![cited]);
        let mut second = KnuthSequence::from_elements(SequenceKind::Inline, vec![word(4)]);
        assert!(first.append(&mut second, &mut Split));
        assert_eq!(first.len(), 3);
        assert_eq!(first.get(0).and_then(Element::anchor), None);
        assert_eq!(first.get(1).and_then(Element::anchor), Some(ManagerId::new(9)));
    }

    #[test]
    fn leading_glues_join_the_ignored_start() {
        let mut seq = KnuthSequence::from_elements(
            SequenceKind::Inline,
            vec![Element::glue(1, 0, 0), Element::glue(1, 0, 0), word(3)],
        );
        assert!(!seq.is_well_formed());
        seq.ignore_leading_glues();
        assert_eq!(seq.ignore_at_start(), 2);
        assert_eq!(seq.breakable_elements().len(), 1);
        assert!(seq.is_well_formed());
    }
}
