//! Per-kind behaviour behind [`LayoutTree::produce_elements`] and
//! [`LayoutTree::add_areas`].

use anyhow::Result;
use fo_knuth::{Element, ManagerId, Position};
use fo_tree::AreaSpan;
use log::{error, trace};

use crate::{Alignment, AreaContext, LayoutContext, LayoutTree, ManagerKind, Progress, WrapperState};

mod block;
mod graphic;
mod inline;
mod text;

/// What a manager kind does, copied out of the arena so the tree can be
/// borrowed mutably while dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    /// Stacks block-level content; inline children are gathered into
    /// paragraphs and broken into lines.
    Stack {
        decorated: bool,
        /// Return after every block-level child instead of running to a
        /// forced break.
        one_chunk: bool,
    },
    Inline {
        decorated: bool,
    },
    Text,
    Graphic,
    Unspecialized,
}

impl Behaviour {
    fn of(kind: &ManagerKind) -> Self {
        match kind {
            ManagerKind::Flow(_) | ManagerKind::StaticContent(_) => Self::Stack {
                decorated: false,
                one_chunk: true,
            },
            ManagerKind::Block(_) => Self::Stack {
                decorated: true,
                one_chunk: false,
            },
            ManagerKind::Wrapper(WrapperState::Block(_)) => Self::Stack {
                decorated: false,
                one_chunk: false,
            },
            ManagerKind::Inline => Self::Inline { decorated: true },
            ManagerKind::Wrapper(WrapperState::Inline) => Self::Inline { decorated: false },
            ManagerKind::Text(_) => Self::Text,
            ManagerKind::Graphic { .. } => Self::Graphic,
            ManagerKind::Unspecialized => Self::Unspecialized,
        }
    }
}

/// Who a run of positions belongs to, seen from one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Own,
    Child(ManagerId),
}

impl LayoutTree<'_> {
    /// Ask `id` for its next chunk of breakable content.
    ///
    /// Block-level managers return block-direction elements, inline-level
    /// ones inline-direction elements. A finished manager returns an empty
    /// chunk. `alignment` is the alignment of the enclosing paragraph;
    /// blocks resolve their own `text-align`.
    ///
    /// `Ok(None)` is only returned by a manager with no specialised
    /// behaviour. It is logged as an error and the manager is marked
    /// finished; callers must not pull from it again.
    ///
    /// # Errors
    /// Returns an error for an unknown handle, or when a line break request
    /// fails.
    pub fn produce_elements(
        &mut self,
        id: ManagerId,
        ctx: &mut LayoutContext<'_>,
        alignment: Alignment,
    ) -> Result<Option<Vec<Element>>> {
        let produced = match Behaviour::of(&self.manager(id)?.kind) {
            Behaviour::Stack {
                decorated,
                one_chunk,
            } => self.produce_stack(id, ctx, alignment, decorated, one_chunk)?,
            Behaviour::Inline { decorated } => self.produce_inline(id, ctx, alignment, decorated)?,
            Behaviour::Text => self.produce_text(id)?,
            Behaviour::Graphic => self.produce_graphic(id)?,
            Behaviour::Unspecialized => {
                let manager = self.manager_mut(id)?;
                error!(
                    target: "fo_layout",
                    "produce_elements reached on {id:?} ({:?}), which has no specialised layout",
                    manager.node
                );
                manager.progress = Progress::BreakAfter;
                return Ok(None);
            }
        };
        trace!(target: "fo_layout", "{id:?} produced {} elements", produced.len());
        Ok(Some(produced))
    }

    /// Materialise the areas for `positions`, previously produced by `id`
    /// or its descendants and chosen by a break optimizer.
    ///
    /// Markers declared on the manager's node are registered with the
    /// current page, noting whether its area starts or ends there.
    ///
    /// # Errors
    /// Returns an error when a position does not belong to `id`'s subtree,
    /// names a line that was never produced, or leaves areas unbalanced.
    pub fn add_areas(
        &mut self,
        id: ManagerId,
        positions: &[Position],
        areas: &mut AreaContext,
    ) -> Result<()> {
        self.register_markers(id)?;
        match Behaviour::of(&self.manager(id)?.kind) {
            Behaviour::Stack { decorated, .. } => self.add_stack_areas(id, positions, areas, decorated),
            Behaviour::Inline { decorated } => self.add_inline_areas(id, positions, areas, decorated),
            Behaviour::Text => self.add_text_area(id, positions, areas),
            Behaviour::Graphic => self.add_graphic_area(id, areas),
            Behaviour::Unspecialized => Ok(()),
        }
    }

    fn register_markers(&mut self, id: ManagerId) -> Result<()> {
        let continuing = self.continuing.contains(&id);
        let manager = self
            .managers
            .get_mut(id.index())
            .ok_or_else(|| crate::unknown_manager(id))?;
        let span = AreaSpan {
            starts: !manager.placed,
            ends: manager.is_finished() && !continuing,
        };
        manager.placed = true;
        for (class_name, &marker) in &manager.markers {
            self.registry.register(class_name, marker, span);
        }
        Ok(())
    }

    /// Split `positions` into consecutive runs that belong to `id` itself or
    /// to one of its children.
    fn position_runs(&self, id: ManagerId, positions: &[Position]) -> Result<Vec<(Owner, Vec<Position>)>> {
        let mut runs: Vec<(Owner, Vec<Position>)> = Vec::new();
        for &position in positions {
            let owner = if position.manager == id {
                Owner::Own
            } else {
                let index = self.child_containing(id, position.manager)?;
                let child = self
                    .manager(id)?
                    .children
                    .get(index)
                    .copied()
                    .ok_or_else(|| crate::unknown_manager(position.manager))?;
                Owner::Child(child)
            };
            match runs.last_mut() {
                Some((last, run)) if *last == owner => run.push(position),
                _ => runs.push((owner, vec![position])),
            }
        }
        Ok(runs)
    }

    /// Hand every child run of `positions` down to the child that owns it.
    fn route_to_children(&mut self, id: ManagerId, positions: &[Position], areas: &mut AreaContext) -> Result<()> {
        for (owner, run) in self.position_runs(id, positions)? {
            match owner {
                Owner::Child(child) => self.add_areas(child, &run, areas)?,
                Owner::Own => {
                    trace!(target: "fo_layout", "{id:?} has no area for its own positions {run:?}");
                }
            }
        }
        Ok(())
    }
}
