use fo_knuth::{ManagerId, Millipoints, Position};
use fo_tree::{ChildCursor, FoNodeId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Where a manager is in its content.
///
/// Containers use `At(i)` for the index of their active child, leaves for the
/// offset of the next unit of content they will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Progress {
    #[default]
    NotStarted,
    At(usize),
    /// Every child was consumed; the break falls after all of them.
    BreakAfter,
}

/// Lifecycle derived from [`Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Producing,
    Finished,
}

impl Progress {
    pub fn phase(self) -> Phase {
        match self {
            Self::NotStarted => Phase::Unstarted,
            Self::At(_) => Phase::Producing,
            Self::BreakAfter => Phase::Finished,
        }
    }
}

/// One line produced by a block, kept so areas can be built and production
/// can resume at its first word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRecord {
    /// Positions of the positioned inline content on the line, in order.
    pub items: Vec<Position>,
    /// Natural width of the line content.
    pub width: Millipoints,
    pub height: Millipoints,
    /// Inline offset from alignment.
    pub offset: Millipoints,
}

impl LineRecord {
    pub fn first(&self) -> Option<Position> {
        self.items.first().copied()
    }
}

/// State of a manager stacking block-level content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockState {
    /// Append-only; line `k` is produced with position index `k + 1`. The
    /// leading edge is index 0, the trailing edge [`Self::END_EDGE`].
    pub lines: Vec<LineRecord>,
    /// Transparent containers have no spaces, borders or break properties.
    pub decorated: bool,
}

impl BlockState {
    /// Position index of a decorated block's trailing space and edge.
    pub const END_EDGE: usize = usize::MAX;

    pub fn decorated() -> Self {
        Self {
            lines: Vec::new(),
            decorated: true,
        }
    }

    pub fn transparent() -> Self {
        Self::default()
    }

    pub fn line(&self, index: usize) -> Option<&LineRecord> {
        index.checked_sub(1).and_then(|line| self.lines.get(line))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextState {
    pub words: Vec<String>,
    pub leading_space: bool,
    pub trailing_space: bool,
    /// Extra width added to a word by letter-space insertion.
    pub adjustments: HashMap<usize, Millipoints>,
}

impl TextState {
    pub fn new(text: &str) -> Self {
        Self {
            words: text.split_whitespace().map(str::to_owned).collect(),
            leading_space: text.starts_with(char::is_whitespace),
            trailing_space: text.ends_with(char::is_whitespace),
            adjustments: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperState {
    Inline,
    Block(BlockState),
}

/// The closed set of manager behaviours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerKind {
    Flow(BlockState),
    StaticContent(BlockState),
    Block(BlockState),
    Inline,
    Wrapper(WrapperState),
    Text(TextState),
    Graphic {
        width: Millipoints,
        height: Millipoints,
    },
    /// Content with no specialised manager, e.g. foreign objects.
    Unspecialized,
}

impl ManagerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flow(_) => "flow",
            Self::StaticContent(_) => "static-content",
            Self::Block(_) => "block",
            Self::Inline => "inline",
            Self::Wrapper(WrapperState::Inline) => "inline-wrapper",
            Self::Wrapper(WrapperState::Block(_)) => "block-wrapper",
            Self::Text(_) => "text",
            Self::Graphic { .. } => "graphic",
            Self::Unspecialized => "unspecialized",
        }
    }

    /// Content feeds a paragraph rather than a stack of blocks.
    pub fn is_inline_level(&self) -> bool {
        matches!(
            self,
            Self::Inline
                | Self::Wrapper(WrapperState::Inline)
                | Self::Text(_)
                | Self::Graphic { .. }
                | Self::Unspecialized
        )
    }

    /// Leaves have no child managers.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Text(_) | Self::Graphic { .. } | Self::Unspecialized
        )
    }

    pub fn block_state(&self) -> Option<&BlockState> {
        match self {
            Self::Flow(state)
            | Self::StaticContent(state)
            | Self::Block(state)
            | Self::Wrapper(WrapperState::Block(state)) => Some(state),
            _ => None,
        }
    }

    pub fn block_state_mut(&mut self) -> Option<&mut BlockState> {
        match self {
            Self::Flow(state)
            | Self::StaticContent(state)
            | Self::Block(state)
            | Self::Wrapper(WrapperState::Block(state)) => Some(state),
            _ => None,
        }
    }
}

/// Arena slot for one layout manager.
#[derive(Debug, Clone)]
pub struct LayoutManager {
    pub(crate) node: FoNodeId,
    pub(crate) parent: Option<ManagerId>,
    pub(crate) kind: ManagerKind,
    pub(crate) children: SmallVec<ManagerId, 4>,
    /// Read once over the manager's lifetime, resets included.
    pub(crate) cursor: ChildCursor,
    pub(crate) progress: Progress,
    /// Some area of this manager is on an earlier or the current page.
    pub(crate) placed: bool,
    pub(crate) markers: HashMap<String, FoNodeId>,
}

impl LayoutManager {
    pub fn node(&self) -> FoNodeId {
        self.node
    }

    pub fn parent(&self) -> Option<ManagerId> {
        self.parent
    }

    pub fn kind(&self) -> &ManagerKind {
        &self.kind
    }

    pub fn children(&self) -> &[ManagerId] {
        &self.children
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.progress.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.progress == Progress::BreakAfter
    }

    /// Marker class name -> marker node, for the node this manager lays out.
    pub fn markers(&self) -> &HashMap<String, FoNodeId> {
        &self.markers
    }
}
