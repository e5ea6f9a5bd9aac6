//! Text leaves: one box per word, glue between words.

use anyhow::{Result, bail};
use fo_knuth::{Element, LetterSpacing, ManagerId, Millipoints, Position};
use log::debug;
use smallvec::SmallVec;

use crate::{Area, AreaContext, AreaKind, LayoutTree, ManagerKind, Progress};

impl LayoutTree<'_> {
    /// Emit the words from the resume offset on. Text is produced in one
    /// chunk, so the manager finishes right away.
    pub(super) fn produce_text(&mut self, id: ManagerId) -> Result<Vec<Element>> {
        let manager = self.manager(id)?;
        let offset = match manager.progress {
            Progress::NotStarted => 0,
            Progress::At(offset) => offset,
            Progress::BreakAfter => return Ok(Vec::new()),
        };
        let ManagerKind::Text(state) = &manager.kind else {
            bail!("{id:?} is not a text manager");
        };
        let node = manager.node;
        let metrics = self.config.metrics;
        let letter_space = self.letter_space(node);
        let height = self.line_height(node);
        let space = || Element::glue(metrics.space_width, metrics.space_stretch, metrics.space_shrink);

        let mut elements = Vec::new();
        if offset == 0 && state.leading_space {
            elements.push(space());
        }
        for (index, word) in state.words.iter().enumerate().skip(offset) {
            if index > offset {
                elements.push(space());
            }
            elements.push(
                Element::new_box(metrics.word_width(word, letter_space), height)
                    .with_owner(id)
                    .with_position(Position::new(id, index)),
            );
        }
        if state.trailing_space && offset < state.words.len() {
            // keeps the space breakable and lets the next word find it
            elements.extend([
                Element::penalty(0, false),
                space(),
                Element::auxiliary_box(0, 0).with_owner(id),
            ]);
        }

        let manager = self.manager_mut(id)?;
        if let ManagerKind::Text(state) = &mut manager.kind {
            state.adjustments.retain(|&word, _| word < offset);
        }
        manager.progress = Progress::BreakAfter;
        Ok(elements)
    }

    pub(super) fn add_text_area(
        &self,
        id: ManagerId,
        positions: &[Position],
        areas: &mut AreaContext,
    ) -> Result<()> {
        let manager = self.manager(id)?;
        let ManagerKind::Text(state) = &manager.kind else {
            bail!("{id:?} is not a text manager");
        };
        let node = manager.node;
        let metrics = self.config.metrics;
        let letter_space = self.letter_space(node);

        let mut words = Vec::with_capacity(positions.len());
        let mut ipd: Millipoints = 0;
        for position in positions {
            let Some(word) = state.words.get(position.index) else {
                bail!("{id:?} has no word {}", position.index);
            };
            if !words.is_empty() {
                ipd += metrics.space_width;
            }
            ipd += metrics.word_width(word, letter_space)
                + state.adjustments.get(&position.index).copied().unwrap_or(0);
            words.push(word.clone());
        }
        let area = Area::new(AreaKind::Text { words }, ipd, self.line_height(node)).generated_by(node, id);
        areas.add(area);
        Ok(())
    }
}

impl LetterSpacing for LayoutTree<'_> {
    /// A lone word gets one letter space wider. After the trailing-space
    /// pattern the space itself widens instead. Managers other than text
    /// hand the elements back unchanged.
    fn add_letter_space_to(
        &mut self,
        owner: ManagerId,
        removed: SmallVec<Element, 4>,
    ) -> Vec<Element> {
        let Ok(manager) = self.manager(owner) else {
            return removed.into_vec();
        };
        if !matches!(manager.kind, ManagerKind::Text(_)) {
            debug!(target: "fo_layout", "{owner:?} does not space letters");
            return removed.into_vec();
        }
        let space = self.letter_space(manager.node);
        if space == 0 {
            return removed.into_vec();
        }

        let word = removed.first().and_then(Element::position);
        let replacement = match removed.as_slice() {
            [word_box] => Some(vec![widen(word_box, space)]),
            [word_box, penalty, glue, tail] => Some(vec![
                word_box.clone(),
                penalty.clone(),
                widen(glue, space),
                tail.clone(),
            ]),
            _ => None,
        };
        let Some(replacement) = replacement else {
            return removed.into_vec();
        };
        if let Some(position) = word
            && let Ok(manager) = self.manager_mut(owner)
            && let ManagerKind::Text(state) = &mut manager.kind
        {
            state.adjustments.insert(position.index, space);
        }
        replacement
    }
}

/// The same box or glue, `extra` wider.
fn widen(element: &Element, extra: Millipoints) -> Element {
    let mut widened = if element.is_glue() {
        Element::glue(element.width() + extra, element.stretch(), element.shrink())
    } else {
        Element::new_box(element.width() + extra, element.height())
    };
    if let Some(owner) = element.owner() {
        widened = widened.with_owner(owner);
    }
    if let Some(position) = element.position() {
        widened = widened.with_position(position);
    }
    widened
}
