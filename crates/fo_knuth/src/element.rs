use crate::{INFINITE, ManagerId, Millipoints, Position};

/// Non-breakable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnuthBox {
    width: Millipoints,
    height: Millipoints,
    auxiliary: bool,
    owner: Option<ManagerId>,
    /// Footnote body anchored at this box, if it is a citation.
    anchor: Option<ManagerId>,
    position: Option<Position>,
}

/// Stretchable and shrinkable space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnuthGlue {
    width: Millipoints,
    stretch: Millipoints,
    shrink: Millipoints,
    auxiliary: bool,
    position: Option<Position>,
}

/// A candidate break with a cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnuthPenalty {
    width: Millipoints,
    cost: i32,
    flagged: bool,
    auxiliary: bool,
    position: Option<Position>,
}

/// One typographic atom.
///
/// `width` is the extent in the breaking direction: the inline width while
/// breaking lines, the block height while breaking pages. Elements are never
/// mutated after construction; the `with_*` builders return new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Box(KnuthBox),
    Glue(KnuthGlue),
    Penalty(KnuthPenalty),
}

impl Element {
    pub fn new_box(width: Millipoints, height: Millipoints) -> Self {
        Self::Box(KnuthBox {
            width,
            height,
            auxiliary: false,
            owner: None,
            anchor: None,
            position: None,
        })
    }

    /// A bookkeeping box (border/padding, space resolution) rather than content.
    pub fn auxiliary_box(width: Millipoints, height: Millipoints) -> Self {
        Self::Box(KnuthBox {
            width,
            height,
            auxiliary: true,
            owner: None,
            anchor: None,
            position: None,
        })
    }

    pub fn glue(width: Millipoints, stretch: Millipoints, shrink: Millipoints) -> Self {
        Self::Glue(KnuthGlue {
            width,
            stretch,
            shrink,
            auxiliary: false,
            position: None,
        })
    }

    pub fn auxiliary_glue(width: Millipoints, stretch: Millipoints, shrink: Millipoints) -> Self {
        Self::Glue(KnuthGlue {
            width,
            stretch,
            shrink,
            auxiliary: true,
            position: None,
        })
    }

    pub fn penalty(cost: i32, flagged: bool) -> Self {
        Self::Penalty(KnuthPenalty {
            width: 0,
            cost,
            flagged,
            auxiliary: false,
            position: None,
        })
    }

    pub fn auxiliary_penalty(cost: i32, flagged: bool) -> Self {
        Self::Penalty(KnuthPenalty {
            width: 0,
            cost,
            flagged,
            auxiliary: true,
            position: None,
        })
    }

    /// A mandatory break.
    pub fn forced_break() -> Self {
        Self::penalty(-INFINITE, false)
    }

    /// Attach the producing manager. Only boxes carry an owner.
    #[must_use]
    pub fn with_owner(self, owner: ManagerId) -> Self {
        match self {
            Self::Box(knuth_box) => Self::Box(KnuthBox {
                owner: Some(owner),
                ..knuth_box
            }),
            other => other,
        }
    }

    /// Attach footnote/citation metadata. Only boxes carry an anchor.
    #[must_use]
    pub fn with_anchor(self, anchor: ManagerId) -> Self {
        match self {
            Self::Box(knuth_box) => Self::Box(KnuthBox {
                anchor: Some(anchor),
                ..knuth_box
            }),
            other => other,
        }
    }

    #[must_use]
    pub fn with_position(self, position: Position) -> Self {
        match self {
            Self::Box(knuth_box) => Self::Box(KnuthBox {
                position: Some(position),
                ..knuth_box
            }),
            Self::Glue(glue) => Self::Glue(KnuthGlue {
                position: Some(position),
                ..glue
            }),
            Self::Penalty(penalty) => Self::Penalty(KnuthPenalty {
                position: Some(position),
                ..penalty
            }),
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self, Self::Box(_))
    }

    pub fn is_glue(&self) -> bool {
        matches!(self, Self::Glue(_))
    }

    pub fn is_penalty(&self) -> bool {
        matches!(self, Self::Penalty(_))
    }

    pub fn is_auxiliary(&self) -> bool {
        match self {
            Self::Box(knuth_box) => knuth_box.auxiliary,
            Self::Glue(glue) => glue.auxiliary,
            Self::Penalty(penalty) => penalty.auxiliary,
        }
    }

    pub fn is_forced_break(&self) -> bool {
        matches!(self, Self::Penalty(penalty) if penalty.cost <= -INFINITE)
    }

    /// A penalty whose cost forbids breaking there.
    pub fn is_forbidden_break(&self) -> bool {
        matches!(self, Self::Penalty(penalty) if penalty.cost >= INFINITE)
    }

    /// Whether a line/page may end at this element, given the element before it.
    ///
    /// Penalties are legal unless infinite; glue only when it follows a box.
    pub fn is_legal_break(&self, previous: Option<&Self>) -> bool {
        match self {
            Self::Penalty(penalty) => penalty.cost < INFINITE,
            Self::Glue(_) => previous.is_some_and(Self::is_box),
            Self::Box(_) => false,
        }
    }

    /// Glue and penalties vanish at the start of a line or page.
    pub fn is_discardable(&self) -> bool {
        !self.is_box()
    }

    pub fn width(&self) -> Millipoints {
        match self {
            Self::Box(knuth_box) => knuth_box.width,
            Self::Glue(glue) => glue.width,
            Self::Penalty(penalty) => penalty.width,
        }
    }

    /// Cross-direction extent; only boxes have one.
    pub fn height(&self) -> Millipoints {
        match self {
            Self::Box(knuth_box) => knuth_box.height,
            _ => 0,
        }
    }

    pub fn stretch(&self) -> Millipoints {
        match self {
            Self::Glue(glue) => glue.stretch,
            _ => 0,
        }
    }

    pub fn shrink(&self) -> Millipoints {
        match self {
            Self::Glue(glue) => glue.shrink,
            _ => 0,
        }
    }

    pub fn cost(&self) -> Option<i32> {
        match self {
            Self::Penalty(penalty) => Some(penalty.cost),
            _ => None,
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, Self::Penalty(penalty) if penalty.flagged)
    }

    pub fn owner(&self) -> Option<ManagerId> {
        match self {
            Self::Box(knuth_box) => knuth_box.owner,
            _ => None,
        }
    }

    pub fn anchor(&self) -> Option<ManagerId> {
        match self {
            Self::Box(knuth_box) => knuth_box.anchor,
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Box(knuth_box) => knuth_box.position,
            Self::Glue(glue) => glue.position,
            Self::Penalty(penalty) => penalty.position,
        }
    }
}
