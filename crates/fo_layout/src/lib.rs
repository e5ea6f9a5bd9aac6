//! Incremental layout managers over a formatting-object tree.
//!
//! A [`LayoutTree`] is an arena of [`LayoutManager`]s created lazily while
//! the FO tree is walked. A parent asks its active child for element lists
//! ([`LayoutTree::produce_elements`]), merges them, hands them to a
//! [`BreakOptimizer`], and later materialises areas for the chosen break
//! positions with [`LayoutTree::add_areas`]. Progress can be captured as a
//! plain-data [`Snapshot`] and rolled back when an enclosing decision is
//! revised.

use anyhow::{Result, anyhow, bail};
use fo_knuth::{ManagerId, Millipoints, Position};
use fo_tree::{FoKind, FoNodeId, FoTree, Level, MarkerRegistry};
use log::{debug, error, trace, warn};
use smallvec::SmallVec;
use std::collections::HashSet;

mod area;
mod breaking;
mod config;
mod manager;
mod managers;
mod page;
mod snapshot;
mod style;

pub use area::{Area, AreaContext, AreaKind};
pub use breaking::{BreakOptimizer, BreakPoint, BreakRequest, FirstFitBreaker, NoFeasibleBreaks};
pub use config::{LayoutConfig, PageMaster, TextMetrics};
pub use manager::{
    BlockState, LayoutManager, LineRecord, ManagerKind, Phase, Progress, TextState, WrapperState,
};
pub use page::{Page, PageBreaker};
pub use snapshot::Snapshot;

/// Alignment token handed down with production requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    Justify,
}

impl Alignment {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "start" | "left" => Some(Self::Start),
            "center" => Some(Self::Center),
            "end" | "right" => Some(Self::End),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }

    /// Inline offset of content leaving `slack` unused on its line.
    pub fn offset(self, slack: Millipoints) -> Millipoints {
        match self {
            Self::Start | Self::Justify => 0,
            Self::Center => slack.max(0) / 2,
            Self::End => slack.max(0),
        }
    }
}

/// Per-request layout context.
pub struct LayoutContext<'ctx> {
    /// Available inline-progression dimension.
    pub ipd: Millipoints,
    /// Line breaker used by managers that build paragraphs.
    pub optimizer: &'ctx mut dyn BreakOptimizer,
    /// Keeps turn into ordinary break opportunities.
    pub relaxed: bool,
}

impl<'ctx> LayoutContext<'ctx> {
    pub fn new(ipd: Millipoints, optimizer: &'ctx mut dyn BreakOptimizer) -> Self {
        Self {
            ipd,
            optimizer,
            relaxed: false,
        }
    }

    #[must_use]
    pub fn with_relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    /// A context for children laid out in a narrower box.
    pub fn nested(&mut self, ipd: Millipoints) -> LayoutContext<'_> {
        LayoutContext {
            ipd,
            optimizer: &mut *self.optimizer,
            relaxed: self.relaxed,
        }
    }
}

/// Arena of layout managers for one FO tree.
pub struct LayoutTree<'fo> {
    fo: &'fo FoTree,
    config: &'fo LayoutConfig,
    managers: Vec<LayoutManager>,
    registry: MarkerRegistry,
    /// Managers with content still waiting for a later page.
    continuing: HashSet<ManagerId>,
}

impl<'fo> LayoutTree<'fo> {
    pub fn new(fo: &'fo FoTree, config: &'fo LayoutConfig) -> Self {
        Self {
            fo,
            config,
            managers: Vec::new(),
            registry: MarkerRegistry::new(),
            continuing: HashSet::new(),
        }
    }

    pub fn fo(&self) -> &'fo FoTree {
        self.fo
    }

    pub fn config(&self) -> &'fo LayoutConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn marker_registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Start registering markers for page `page`. `unplaced` is the content
    /// already produced for later pages; areas of its managers and their
    /// ancestors do not end on this page.
    ///
    /// # Errors
    /// Returns an error for a position of an unknown manager.
    pub fn begin_page(&mut self, page: usize, unplaced: &[Position]) -> Result<()> {
        self.registry.begin_page(page);
        self.continuing.clear();
        for position in unplaced {
            let mut current = Some(position.manager);
            while let Some(id) = current {
                if !self.continuing.insert(id) {
                    break;
                }
                current = self.manager(id)?.parent;
            }
        }
        Ok(())
    }

    /// Drop every manager created after the first `len`. Only managers
    /// nothing else refers to may be dropped this way.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.managers.truncate(len);
    }

    /// Look up a manager.
    ///
    /// # Errors
    /// Returns an error for a handle this tree never issued.
    pub fn manager(&self, id: ManagerId) -> Result<&LayoutManager> {
        self.managers
            .get(id.index())
            .ok_or_else(|| unknown_manager(id))
    }

    pub(crate) fn manager_mut(&mut self, id: ManagerId) -> Result<&mut LayoutManager> {
        self.managers
            .get_mut(id.index())
            .ok_or_else(|| unknown_manager(id))
    }

    /// # Errors
    /// Returns an error for an unknown handle.
    pub fn is_finished(&self, id: ManagerId) -> Result<bool> {
        Ok(self.manager(id)?.is_finished())
    }

    /// Create a parentless manager for `node`, e.g. a flow or static content.
    ///
    /// # Errors
    /// Fails when `node` makes no manager (an unresolved retrieve-marker) or
    /// is not part of the tree.
    pub fn create_root(&mut self, node: FoNodeId) -> Result<ManagerId> {
        self.make_manager(node, None)?
            .ok_or_else(|| anyhow!("{node:?} does not produce a layout manager"))
    }

    fn make_manager(&mut self, node: FoNodeId, parent: Option<ManagerId>) -> Result<Option<ManagerId>> {
        let fo = self.fo;
        let Some(node) = fo.resolve_marker_placeholder(node, &self.registry) else {
            trace!(target: "fo_layout", "retrieve-marker {node:?} resolved to nothing");
            return Ok(None);
        };
        let fo_node = fo
            .node(node)
            .ok_or_else(|| anyhow!("unknown formatting object {node:?}"))?;
        let kind = match fo_node.kind() {
            FoKind::Flow => ManagerKind::Flow(BlockState::transparent()),
            FoKind::StaticContent => ManagerKind::StaticContent(BlockState::transparent()),
            FoKind::Block => ManagerKind::Block(BlockState::decorated()),
            FoKind::Inline => ManagerKind::Inline,
            FoKind::Wrapper | FoKind::Marker { .. } => {
                if fo.effective_level(node) == Level::Block {
                    ManagerKind::Wrapper(WrapperState::Block(BlockState::transparent()))
                } else {
                    ManagerKind::Wrapper(WrapperState::Inline)
                }
            }
            FoKind::Text(text) if text.is_empty() => return Ok(None),
            FoKind::Text(text) => ManagerKind::Text(TextState::new(text)),
            FoKind::ExternalGraphic { width, height } => ManagerKind::Graphic {
                width: self.optional_length(node, "content-width").unwrap_or(*width),
                height: self.optional_length(node, "content-height").unwrap_or(*height),
            },
            // foreign content is opaque here: it is sized by its content
            // properties and placed like a graphic
            FoKind::InstreamForeignObject { namespace } => {
                let width = self.optional_length(node, "content-width");
                let height = self.optional_length(node, "content-height");
                if width.is_none() || height.is_none() {
                    debug!(target: "fo_layout", "{namespace} object {node:?} has no content size");
                }
                ManagerKind::Graphic {
                    width: width.unwrap_or(0),
                    height: height.unwrap_or(0),
                }
            }
            FoKind::Root | FoKind::PageSequence | FoKind::RetrieveMarker { .. } => {
                warn!(
                    target: "fo_layout",
                    "{} is not laid out by a content manager",
                    fo_node.kind().name()
                );
                ManagerKind::Unspecialized
            }
        };

        let id = ManagerId::new(u32::try_from(self.managers.len())?);
        trace!(target: "fo_layout", "new {} manager {id:?} for {node:?}", kind.name());
        self.managers.push(LayoutManager {
            node,
            parent,
            kind,
            children: SmallVec::new(),
            cursor: fo.children(node),
            progress: Progress::NotStarted,
            placed: false,
            markers: fo_node.markers().clone(),
        });
        Ok(Some(id))
    }

    /// Materialise up to `count` further children of `id` from its node's
    /// single-pass cursor.
    ///
    /// Retrieve-marker placeholders are resolved against the marker registry
    /// first. Nodes that make no manager are skipped, so fewer than `count`
    /// may come back even before the cursor is exhausted.
    ///
    /// # Errors
    /// Returns an error for an unknown handle or a broken FO tree.
    pub fn create_child_managers(&mut self, id: ManagerId, count: usize) -> Result<Vec<ManagerId>> {
        let fo = self.fo;
        let mut made = Vec::new();
        if self.manager(id)?.kind.is_leaf() {
            return Ok(made);
        }
        let mut pulled = 0;
        while pulled < count {
            let Some(node) = self.manager_mut(id)?.cursor.advance(fo) else {
                break;
            };
            pulled += 1;
            if let Some(child) = self.make_manager(node, Some(id))? {
                self.manager_mut(id)?.children.push(child);
                made.push(child);
            }
        }
        Ok(made)
    }

    /// The child `id` is currently pulling from.
    ///
    /// Stays on the current child until it finishes, then moves on in
    /// document order, materialising children as needed. Returns `None` and
    /// marks `id` finished once every child is done.
    ///
    /// # Errors
    /// Returns an error for an unknown handle.
    pub fn get_active_child(&mut self, id: ManagerId) -> Result<Option<ManagerId>> {
        let manager = self.manager(id)?;
        if manager.kind.is_leaf() {
            return Ok(None);
        }
        let next = match manager.progress {
            Progress::BreakAfter => return Ok(None),
            Progress::NotStarted => 0,
            Progress::At(index) => match manager.children.get(index) {
                Some(&child) if !self.manager(child)?.is_finished() => return Ok(Some(child)),
                _ => index + 1,
            },
        };
        let batch = self.config.child_batch.max(1);
        while self.manager(id)?.children.len() <= next {
            if self.manager(id)?.cursor.is_exhausted() {
                self.manager_mut(id)?.progress = Progress::BreakAfter;
                return Ok(None);
            }
            self.create_child_managers(id, batch)?;
        }
        let manager = self.manager_mut(id)?;
        manager.progress = Progress::At(next);
        Ok(manager.children.get(next).copied())
    }

    /// Index, among the children of `id`, of the child that is `descendant`
    /// or one of its ancestors.
    ///
    /// # Errors
    /// Returns an error when `descendant` is not below `id`.
    pub fn child_containing(&self, id: ManagerId, descendant: ManagerId) -> Result<usize> {
        let mut current = descendant;
        loop {
            match self.manager(current)?.parent {
                Some(parent) if parent == id => {
                    return self
                        .manager(id)?
                        .children
                        .iter()
                        .position(|&child| child == current)
                        .ok_or_else(|| anyhow!("{current:?} missing from the children of {id:?}"));
                }
                Some(parent) => current = parent,
                None => {
                    error!(target: "fo_layout", "{descendant:?} is not a descendant of {id:?}");
                    bail!("{descendant:?} is not a descendant of {id:?}");
                }
            }
        }
    }
}

fn unknown_manager(id: ManagerId) -> anyhow::Error {
    error!(target: "fo_layout", "unknown layout manager {id:?}");
    anyhow!("unknown layout manager {id:?}")
}
