//! Formatting-object tree consumed by the layout managers.
//!
//! The tree is an `indextree` arena of [`FoNode`]s. Layout never mutates it:
//! each layout manager walks its node's children exactly once through a
//! [`ChildCursor`] and reads resolved properties through a
//! [`properties::PropertyResolver`].
//!
//! Markers are stored as ordinary arena children so they keep their ancestry
//! for property inheritance, but cursors skip them; they are reachable only
//! through [`FoTree::markers`] and the [`MarkerRegistry`].

use anyhow::{Result, anyhow, bail};
use indextree::{Arena, Node, NodeId};
use log::{error, trace};
use std::collections::HashMap;

pub mod markers;
pub mod properties;

pub use markers::{AreaSpan, MarkerRegistry, RetrievePosition};
pub use properties::{
    PropertyInfo, PropertyMapping, PropertyResolver, PropertyValue, ResolveProperty, WritingMode,
};

/// Lengths are expressed in millipoints (1/1000 pt).
pub type Millipoints = i32;

/// Handle of a node in the [`FoTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FoNodeId(NodeId);

/// The formatting-object categories the layout core knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoKind {
    Root,
    PageSequence,
    /// The main flow of a page sequence.
    Flow,
    /// Content repeated on every page (headers, footers).
    StaticContent,
    Block,
    Inline,
    /// Transparent grouping; takes the level of its content.
    Wrapper,
    Text(String),
    Marker { class_name: String },
    RetrieveMarker {
        class_name: String,
        position: RetrievePosition,
    },
    ExternalGraphic {
        width: Millipoints,
        height: Millipoints,
    },
    /// Embedded foreign markup such as SVG; `namespace` identifies the vocabulary.
    InstreamForeignObject { namespace: String },
}

/// Whether a node produces block-level or inline-level content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Block,
    Inline,
    /// Takes the level of its children (wrappers, markers, placeholders).
    Neutral,
}

impl FoKind {
    pub fn level(&self) -> Level {
        match self {
            Self::Root
            | Self::PageSequence
            | Self::Flow
            | Self::StaticContent
            | Self::Block => Level::Block,
            Self::Inline
            | Self::Text(_)
            | Self::ExternalGraphic { .. }
            | Self::InstreamForeignObject { .. } => Level::Inline,
            Self::Wrapper | Self::Marker { .. } | Self::RetrieveMarker { .. } => Level::Neutral,
        }
    }

    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::PageSequence => "page-sequence",
            Self::Flow => "flow",
            Self::StaticContent => "static-content",
            Self::Block => "block",
            Self::Inline => "inline",
            Self::Wrapper => "wrapper",
            Self::Text(_) => "#text",
            Self::Marker { .. } => "marker",
            Self::RetrieveMarker { .. } => "retrieve-marker",
            Self::ExternalGraphic { .. } => "external-graphic",
            Self::InstreamForeignObject { .. } => "instream-foreign-object",
        }
    }
}

/// A single formatting object with its explicitly specified properties.
#[derive(Debug, Clone)]
pub struct FoNode {
    kind: FoKind,
    properties: HashMap<String, PropertyValue>,
    /// Marker class name -> marker node; at most one per class.
    markers: HashMap<String, FoNodeId>,
    /// Set once a non-marker child has been appended.
    has_content: bool,
}

impl FoNode {
    fn new(kind: FoKind) -> Self {
        Self {
            kind,
            properties: HashMap::new(),
            markers: HashMap::new(),
            has_content: false,
        }
    }

    pub fn kind(&self) -> &FoKind {
        &self.kind
    }

    /// The explicitly specified value, without inheritance or shorthands.
    pub fn explicit(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn markers(&self) -> &HashMap<String, FoNodeId> {
        &self.markers
    }
}

/// Arena holding the whole formatting-object tree.
#[derive(Debug)]
pub struct FoTree {
    arena: Arena<FoNode>,
    root: FoNodeId,
}

impl Default for FoTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FoTree {
    /// Create a tree containing only the root object.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = FoNodeId(arena.new_node(FoNode::new(FoKind::Root)));
        Self { arena, root }
    }

    pub fn root(&self) -> FoNodeId {
        self.root
    }

    pub fn node(&self, id: FoNodeId) -> Option<&FoNode> {
        self.arena.get(id.0).map(|node| node.get())
    }

    pub fn kind(&self, id: FoNodeId) -> Option<&FoKind> {
        self.node(id).map(FoNode::kind)
    }

    pub fn parent(&self, id: FoNodeId) -> Option<FoNodeId> {
        self.arena.get(id.0)?.parent().map(FoNodeId)
    }

    /// Append a content child to `parent`.
    ///
    /// # Errors
    /// Fails for markers (use [`FoTree::add_marker`]), for text parents and
    /// for unknown handles.
    pub fn append(&mut self, parent: FoNodeId, kind: FoKind) -> Result<FoNodeId> {
        if matches!(kind, FoKind::Marker { .. }) {
            bail!("markers must be added with add_marker");
        }
        let parent_kind = self
            .kind(parent)
            .ok_or_else(|| anyhow!("unknown parent node {parent:?}"))?;
        if matches!(parent_kind, FoKind::Text(_)) {
            bail!("text nodes cannot have children");
        }
        trace!(target: "fo_tree", "append {} under {}", kind.name(), parent_kind.name());
        let child = self.arena.new_node(FoNode::new(kind));
        parent.0.checked_append(child, &mut self.arena)?;
        if let Some(node) = self.arena.get_mut(parent.0) {
            node.get_mut().has_content = true;
        }
        Ok(FoNodeId(child))
    }

    /// Convenience for appending a text child.
    ///
    /// # Errors
    /// See [`FoTree::append`].
    pub fn append_text(&mut self, parent: FoNodeId, text: &str) -> Result<FoNodeId> {
        self.append(parent, FoKind::Text(text.to_owned()))
    }

    /// Declare a marker of `class_name` on `parent`.
    ///
    /// A marker must precede every content child of its parent and its class
    /// name must be unique among the parent's markers.
    ///
    /// # Errors
    /// Returns an error when either rule is violated.
    pub fn add_marker(&mut self, parent: FoNodeId, class_name: &str) -> Result<FoNodeId> {
        let parent_node = self
            .node(parent)
            .ok_or_else(|| anyhow!("unknown parent node {parent:?}"))?;
        if parent_node.has_content || parent_node.markers.contains_key(class_name) {
            error!(
                target: "fo_tree",
                "fo:marker must be an initial child, and 'marker-class-name' must be unique for same parent"
            );
            bail!("misplaced or duplicate marker '{class_name}'");
        }
        let marker = self.arena.new_node(FoNode::new(FoKind::Marker {
            class_name: class_name.to_owned(),
        }));
        parent.0.checked_append(marker, &mut self.arena)?;
        if let Some(node) = self.arena.get_mut(parent.0) {
            node.get_mut()
                .markers
                .insert(class_name.to_owned(), FoNodeId(marker));
        }
        Ok(FoNodeId(marker))
    }

    /// Set an explicit property value on `node`.
    ///
    /// # Errors
    /// Returns an error for an unknown handle.
    pub fn set_property(&mut self, node: FoNodeId, name: &str, value: PropertyValue) -> Result<()> {
        let slot = self
            .arena
            .get_mut(node.0)
            .ok_or_else(|| anyhow!("unknown node {node:?}"))?;
        slot.get_mut().properties.insert(name.to_owned(), value);
        Ok(())
    }

    /// Markers declared on `node`, keyed by class name.
    pub fn markers(&self, node: FoNodeId) -> Option<&HashMap<String, FoNodeId>> {
        self.node(node).map(FoNode::markers)
    }

    /// A fresh single-pass cursor over the content children of `node`.
    pub fn children(&self, node: FoNodeId) -> ChildCursor {
        ChildCursor {
            next: self.arena.get(node.0).and_then(Node::first_child),
        }
    }

    /// Collect the content children of `node` (markers excluded).
    pub fn child_nodes(&self, node: FoNodeId) -> Vec<FoNodeId> {
        let mut cursor = self.children(node);
        let mut out = Vec::new();
        while let Some(child) = cursor.advance(self) {
            out.push(child);
        }
        out
    }

    /// The level of `node`, looking through wrappers and marker content.
    pub fn effective_level(&self, node: FoNodeId) -> Level {
        match self.kind(node).map(FoKind::level) {
            Some(Level::Neutral) => {
                let any_block = self
                    .child_nodes(node)
                    .into_iter()
                    .any(|child| self.effective_level(child) == Level::Block);
                if any_block { Level::Block } else { Level::Inline }
            }
            Some(level) => level,
            None => Level::Inline,
        }
    }

    /// Replace a retrieve-marker placeholder by the marker it retrieves.
    ///
    /// Other nodes are returned unchanged. `None` means nothing is retrieved
    /// and the placeholder produces no content.
    pub fn resolve_marker_placeholder(
        &self,
        node: FoNodeId,
        registry: &MarkerRegistry,
    ) -> Option<FoNodeId> {
        match self.kind(node)? {
            FoKind::RetrieveMarker {
                class_name,
                position,
            } => registry.resolve(class_name, *position),
            _ => Some(node),
        }
    }
}

/// Single-pass cursor over the content children of one node.
///
/// The cursor only moves forward; whoever owns it consumes it at most once.
#[derive(Debug, Clone)]
pub struct ChildCursor {
    next: Option<NodeId>,
}

impl ChildCursor {
    /// Return the next content child, skipping markers.
    pub fn advance(&mut self, tree: &FoTree) -> Option<FoNodeId> {
        while let Some(current) = self.next {
            let node = tree.arena.get(current)?;
            self.next = node.next_sibling();
            if !matches!(node.get().kind, FoKind::Marker { .. }) {
                return Some(FoNodeId(current));
            }
        }
        None
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}
