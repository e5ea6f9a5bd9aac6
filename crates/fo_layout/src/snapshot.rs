//! Capture and rollback of manager progress.
//!
//! A [`Snapshot`] is plain data: the progress markers along the active path
//! of a subtree, outermost first. It holds no reference into the tree, so it
//! can be stored, compared or serialised and replayed later.

use anyhow::{Result, bail};
use fo_knuth::{ManagerId, Position};
use log::{error, trace};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{BlockState, LayoutTree, LineRecord, ManagerKind, Progress};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot(Vec<Progress>);

impl Snapshot {
    pub fn markers(&self) -> &[Progress] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Progress>> for Snapshot {
    fn from(markers: Vec<Progress>) -> Self {
        Self(markers)
    }
}

impl LayoutTree<'_> {
    /// Record the progress of `id` and, depth first, of every active
    /// descendant.
    ///
    /// # Errors
    /// Returns an error for an unknown handle.
    pub fn capture_snapshot(&self, id: ManagerId) -> Result<Snapshot> {
        let mut markers = Vec::new();
        let mut current = id;
        loop {
            let manager = self.manager(current)?;
            markers.push(manager.progress);
            match manager.progress {
                Progress::At(index) => match manager.children.get(index) {
                    Some(&child) => current = child,
                    None => break,
                },
                Progress::NotStarted | Progress::BreakAfter => break,
            }
        }
        trace!(target: "fo_layout", "snapshot of {id:?}: {markers:?}");
        Ok(Snapshot(markers))
    }

    /// Restore the progress recorded in `snapshot`.
    ///
    /// `NotStarted` rewinds the whole subtree. `BreakAfter` marks the manager
    /// finished and leaves its children alone. `At(i)` resets every child
    /// after `i` and continues into child `i`; a leaf keeps `i` as its
    /// resume offset.
    ///
    /// # Errors
    /// A snapshot that does not fit the tree (an index past the children,
    /// missing or leftover entries) is rejected before anything changes.
    pub fn rollback(&mut self, id: ManagerId, snapshot: &Snapshot) -> Result<()> {
        self.check_snapshot(id, snapshot.markers())?;
        let mut current = id;
        for &marker in snapshot.markers() {
            match marker {
                Progress::NotStarted => {
                    self.full_reset(current)?;
                    break;
                }
                Progress::BreakAfter => {
                    self.manager_mut(current)?.progress = Progress::BreakAfter;
                    break;
                }
                Progress::At(index) => {
                    let manager = self.manager_mut(current)?;
                    manager.progress = Progress::At(index);
                    if manager.kind.is_leaf() {
                        break;
                    }
                    let child = manager.children.get(index).copied();
                    let later: SmallVec<ManagerId, 4> =
                        manager.children.iter().skip(index + 1).copied().collect();
                    for later_child in later {
                        self.full_reset(later_child)?;
                    }
                    match child {
                        Some(child) => current = child,
                        None => break,
                    }
                }
            }
        }
        Ok(())
    }

    fn check_snapshot(&self, id: ManagerId, markers: &[Progress]) -> Result<()> {
        let mut current = id;
        let mut rest = markers;
        loop {
            let Some((&marker, tail)) = rest.split_first() else {
                return snapshot_mismatch(current, "snapshot ends before reaching it");
            };
            let manager = self.manager(current)?;
            let next = match (marker, &manager.kind) {
                (Progress::NotStarted | Progress::BreakAfter, _) => None,
                (Progress::At(index), ManagerKind::Text(state)) => {
                    if index > state.words.len() {
                        return snapshot_mismatch(current, "resume offset past the end of the text");
                    }
                    None
                }
                (Progress::At(_), kind) if kind.is_leaf() => None,
                // past the last child: only the trailing edge is left
                (Progress::At(index), _) if index == manager.children.len() => None,
                (Progress::At(index), _) => match manager.children.get(index) {
                    Some(&child) => Some(child),
                    None => return snapshot_mismatch(current, "no child at the recorded index"),
                },
            };
            match next {
                Some(child) => {
                    current = child;
                    rest = tail;
                }
                None if tail.is_empty() => return Ok(()),
                None => return snapshot_mismatch(current, "snapshot has entries below it"),
            }
        }
    }

    /// Rewind `id` and every materialised descendant to `NotStarted`.
    ///
    /// Children stay materialised and the FO cursor is not rewound.
    ///
    /// # Errors
    /// Returns an error for an unknown handle.
    pub fn full_reset(&mut self, id: ManagerId) -> Result<()> {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let manager = self.manager_mut(current)?;
            manager.progress = Progress::NotStarted;
            pending.extend(manager.children.iter().copied());
        }
        Ok(())
    }

    /// Rewind `id` so production resumes at `position`, or from the very
    /// beginning when `position` is `None`.
    ///
    /// Children visited after the one holding `position` are fully reset,
    /// and the reset carries on into that child. A block resumes at the
    /// first content of the recorded line, or with only its trailing edge
    /// when `position` is that edge.
    ///
    /// # Errors
    /// Returns an error when `position` is not produced by `id` or one of its
    /// descendants.
    pub fn reset(&mut self, id: ManagerId, position: Option<Position>) -> Result<()> {
        let Some(position) = position else {
            return self.full_reset(id);
        };
        trace!(target: "fo_layout", "reset {id:?} to {position:?}");
        if position.manager != id {
            let index = self.child_containing(id, position.manager)?;
            let manager = self.manager_mut(id)?;
            manager.progress = Progress::At(index);
            let child = manager.children.get(index).copied();
            let later: SmallVec<ManagerId, 4> =
                manager.children.iter().skip(index + 1).copied().collect();
            for later_child in later {
                self.full_reset(later_child)?;
            }
            return match child {
                Some(child) => self.reset(child, Some(position)),
                None => Ok(()),
            };
        }

        let manager = self.manager(id)?;
        match &manager.kind {
            ManagerKind::Text(state) => {
                if position.index > state.words.len() {
                    error!(target: "fo_layout", "{id:?} has no word {}", position.index);
                    bail!("reset past the end of {id:?}");
                }
                self.manager_mut(id)?.progress = Progress::At(position.index);
                Ok(())
            }
            kind if kind.block_state().is_some() && position.index == BlockState::END_EDGE => {
                // every child is done, only the trailing edge is produced again
                let block = self.manager_mut(id)?;
                block.progress = Progress::At(block.children.len());
                Ok(())
            }
            kind => {
                let resume = kind
                    .block_state()
                    .and_then(|state| state.line(position.index))
                    .and_then(LineRecord::first)
                    .filter(|first| first.manager != id);
                match resume {
                    Some(first) => self.reset(id, Some(first)),
                    None => self.full_reset(id),
                }
            }
        }
    }
}

fn snapshot_mismatch(id: ManagerId, reason: &str) -> Result<()> {
    error!(target: "fo_layout", "snapshot does not match the subtree at {id:?}: {reason}");
    bail!("snapshot does not match the layout tree at {id:?}: {reason}")
}
