use alloc::vec;

use crate::{AppendMode, KnuthSequence, LetterSpacing};

/// Sequences a parent manager collects from its children, merged where the
/// kinds allow it. A stacking manager gathers inline runs into paragraphs
/// and block content into stacks this way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceList {
    sequences: Vec<KnuthSequence>,
}

impl SequenceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn push_or_merge(&mut self, sequence: KnuthSequence, spacer: &mut dyn LetterSpacing) {
        self.push_or_merge_with(sequence, AppendMode::Plain, spacer);
    }

    /// Append into the last sequence when it accepts `sequence`, otherwise
    /// start a new entry. Returns whether a merge happened.
    pub fn push_or_merge_with(
        &mut self,
        mut sequence: KnuthSequence,
        mode: AppendMode,
        spacer: &mut dyn LetterSpacing,
    ) -> bool {
        if let Some(last) = self.sequences.last_mut()
            && last.append_with(&mut sequence, mode, spacer)
        {
            return true;
        }
        self.sequences.push(sequence);
        false
    }
}

impl IntoIterator for SequenceList {
    type Item = KnuthSequence;
    type IntoIter = vec::IntoIter<KnuthSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, NoLetterSpacing, SequenceKind};

    #[test]
    fn merges_runs_of_the_same_kind() {
        let mut list = SequenceList::new();
        let mut spacer = NoLetterSpacing;
        let run = |width| {
            KnuthSequence::from_elements(SequenceKind::Inline, vec![Element::new_box(width, 0)])
        };
        list.push_or_merge(run(1), &mut spacer);
        list.push_or_merge(run(2), &mut spacer);
        assert_eq!(list.len(), 1);

        let block = KnuthSequence::from_elements(SequenceKind::Block, vec![Element::new_box(3, 0)]);
        list.push_or_merge(block, &mut spacer);
        list.push_or_merge(run(4), &mut spacer);
        assert_eq!(list.len(), 3);
        assert_eq!(list.into_iter().flat_map(KnuthSequence::into_elements).count(), 4);
    }
}
