//! Inline and inline-level wrapper managers.

use anyhow::Result;
use fo_knuth::{Element, KnuthSequence, ManagerId, Position, SequenceKind};
use log::warn;

use crate::{Alignment, Area, AreaContext, AreaKind, LayoutContext, LayoutTree, Progress};

impl LayoutTree<'_> {
    /// Merge every child's run into one, inserting letter space where two
    /// words meet, and frame it with the start and end edges.
    pub(super) fn produce_inline(
        &mut self,
        id: ManagerId,
        ctx: &mut LayoutContext<'_>,
        alignment: Alignment,
        decorated: bool,
    ) -> Result<Vec<Element>> {
        let manager = self.manager(id)?;
        if manager.is_finished() {
            return Ok(Vec::new());
        }
        let starting = manager.progress == Progress::NotStarted;
        let node = manager.node;

        let mut run = KnuthSequence::inline();
        while let Some(child) = self.get_active_child(id)? {
            if !self.manager(child)?.kind.is_inline_level() {
                warn!(target: "fo_layout", "block-level {child:?} inside inline {id:?} is set inline");
            }
            let Some(elements) = self.produce_elements(child, ctx, alignment)? else {
                continue;
            };
            let mut child_run = KnuthSequence::from_elements(SequenceKind::Inline, elements);
            run.append(&mut child_run, self);
        }

        if decorated {
            let start = self.edge(node, "start");
            let end = self.edge(node, "end");
            if starting && start > 0 {
                run.insert_leading(Element::auxiliary_box(start, 0).with_owner(id));
            }
            if end > 0 {
                run.insert_trailing_before_ignore(Element::auxiliary_box(end, 0).with_owner(id));
            }
        }
        Ok(run.into_elements())
    }

    pub(super) fn add_inline_areas(
        &mut self,
        id: ManagerId,
        positions: &[Position],
        areas: &mut AreaContext,
        decorated: bool,
    ) -> Result<()> {
        if !decorated {
            return self.route_to_children(id, positions, areas);
        }
        let node = self.manager(id)?.node;
        areas.open(Area::new(AreaKind::Inline, 0, 0).generated_by(node, id));
        self.route_to_children(id, positions, areas)?;
        areas.close()
    }
}
