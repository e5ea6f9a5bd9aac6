//! Abstract area tree produced by `add_areas`.

use anyhow::{Result, bail};
use fo_knuth::{ManagerId, Millipoints};
use fo_tree::FoNodeId;
use log::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaKind {
    /// Region of a page.
    Viewport,
    Block,
    Line,
    Inline,
    Text { words: Vec<String> },
    Graphic,
}

impl AreaKind {
    /// Children are placed along the inline axis.
    fn stacks_inline(&self) -> bool {
        matches!(self, Self::Line | Self::Inline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub kind: AreaKind,
    pub node: Option<FoNodeId>,
    pub manager: Option<ManagerId>,
    pub ipd: Millipoints,
    pub bpd: Millipoints,
    /// Offset from the inline start of the parent, from alignment.
    pub offset: Millipoints,
    pub children: Vec<Area>,
}

impl Area {
    pub fn new(kind: AreaKind, ipd: Millipoints, bpd: Millipoints) -> Self {
        Self {
            kind,
            node: None,
            manager: None,
            ipd,
            bpd,
            offset: 0,
            children: Vec::new(),
        }
    }

    pub fn viewport(ipd: Millipoints) -> Self {
        Self::new(AreaKind::Viewport, ipd, 0)
    }

    #[must_use]
    pub fn generated_by(mut self, node: FoNodeId, manager: ManagerId) -> Self {
        self.node = Some(node);
        self.manager = Some(manager);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Millipoints) -> Self {
        self.offset = offset;
        self
    }

    /// Attach a child, growing this area along its stacking axis.
    pub fn push(&mut self, child: Self) {
        if self.kind.stacks_inline() {
            self.ipd += child.ipd;
            self.bpd = self.bpd.max(child.bpd);
        } else {
            self.bpd += child.bpd;
        }
        self.children.push(child);
    }

    /// This area and all its descendants, breadth first.
    pub fn descendants(&self) -> Vec<&Self> {
        let mut out = vec![self];
        let mut index = 0;
        while let Some(area) = out.get(index).copied() {
            out.extend(area.children.iter());
            index += 1;
        }
        out
    }

    /// Every word placed in text areas below this one, in order.
    pub fn words(&self) -> Vec<&str> {
        let mut words = Vec::new();
        self.collect_words(&mut words);
        words
    }

    fn collect_words<'area>(&'area self, words: &mut Vec<&'area str>) {
        if let AreaKind::Text { words: own } = &self.kind {
            words.extend(own.iter().map(String::as_str));
        }
        for child in &self.children {
            child.collect_words(words);
        }
    }
}

/// Stack of areas under construction.
#[derive(Debug)]
pub struct AreaContext {
    stack: Vec<Area>,
}

impl AreaContext {
    pub fn new(root: Area) -> Self {
        Self { stack: vec![root] }
    }

    /// Inline-progression dimension of the innermost open area.
    pub fn current_ipd(&self) -> Millipoints {
        self.stack.last().map_or(0, |area| area.ipd)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn open(&mut self, area: Area) {
        self.stack.push(area);
    }

    /// Close the innermost area and attach it to its parent.
    ///
    /// # Errors
    /// Fails when only the root is open.
    pub fn close(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            error!(target: "fo_layout", "area stack underflow");
            bail!("no open area to close");
        }
        if let Some(area) = self.stack.pop()
            && let Some(parent) = self.stack.last_mut()
        {
            parent.push(area);
        }
        Ok(())
    }

    /// Extend the innermost open area along the block axis, for spaces and
    /// edges that produce no area of their own.
    pub fn grow(&mut self, bpd: Millipoints) {
        if let Some(area) = self.stack.last_mut() {
            area.bpd += bpd;
        }
    }

    /// Attach a finished area to the innermost open one.
    pub fn add(&mut self, area: Area) {
        if let Some(parent) = self.stack.last_mut() {
            parent.push(area);
        }
    }

    /// # Errors
    /// Fails when areas are still open.
    pub fn finish(mut self) -> Result<Area> {
        if self.stack.len() != 1 {
            error!(target: "fo_layout", "{} areas left open", self.stack.len() - 1);
            bail!("unbalanced area construction");
        }
        match self.stack.pop() {
            Some(root) => Ok(root),
            None => bail!("area stack is empty"),
        }
    }
}
