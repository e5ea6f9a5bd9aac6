//! Page breaking over the element stream of a flow.
//!
//! The flow is pulled chunk by chunk through a [`DeferredSequence`], so only
//! the content needed to fill the next page is ever produced. That keeps
//! rewinding cheap: when the next page has a different width, or when no
//! feasible break exists and keeps must be relaxed, only the unplaced tail is
//! regenerated.

use anyhow::{Result, anyhow, bail};
use fo_knuth::{ChunkSource, DeferredSequence, Element, ElementSource as _, ManagerId, Millipoints, Position};
use fo_tree::{FoKind, FoNodeId};
use log::{debug, error, warn};
use tracing::info_span;

use crate::{
    Alignment, Area, AreaContext, BreakOptimizer, BreakRequest, FirstFitBreaker, LayoutContext,
    LayoutTree, PageMaster,
};

/// One laid-out page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// One-based page number.
    pub number: usize,
    pub master: PageMaster,
    pub body: Area,
    /// One viewport per static-content object, laid out after the body so
    /// retrieved markers come from this page.
    pub static_content: Vec<Area>,
}

/// Drives a page sequence: line breaking inside paragraphs and page
/// breaking of the flow, through two independent optimizers.
pub struct PageBreaker {
    lines: Box<dyn BreakOptimizer>,
    pages: Box<dyn BreakOptimizer>,
}

impl Default for PageBreaker {
    fn default() -> Self {
        Self::new(Box::new(FirstFitBreaker), Box::new(FirstFitBreaker))
    }
}

impl PageBreaker {
    pub fn new(lines: Box<dyn BreakOptimizer>, pages: Box<dyn BreakOptimizer>) -> Self {
        Self { lines, pages }
    }

    /// Lay out the flow of `page_sequence` into pages.
    ///
    /// # Errors
    /// Fails when the page sequence has no flow, when no page master is
    /// configured, when a manager breaks the production contract, or when
    /// the configured page limit is exceeded.
    pub fn layout(&mut self, tree: &mut LayoutTree<'_>, page_sequence: FoNodeId) -> Result<Vec<Page>> {
        let _span = info_span!("page_breaker.layout").entered();
        let fo = tree.fo();
        let config = tree.config();

        let mut flow_node = None;
        let mut static_nodes = Vec::new();
        for node in fo.child_nodes(page_sequence) {
            match fo.kind(node) {
                Some(FoKind::Flow) if flow_node.is_none() => flow_node = Some(node),
                Some(FoKind::StaticContent) => static_nodes.push(node),
                _ => {}
            }
        }
        let Some(flow_node) = flow_node else {
            error!(target: "fo_layout", "page sequence {page_sequence:?} has no flow");
            bail!("page sequence {page_sequence:?} has no flow");
        };
        let flow = tree.create_root(flow_node)?;
        let first = config
            .page_master(0)
            .ok_or_else(|| anyhow!("no page master configured"))?;

        let Self { lines, pages } = self;
        let mut content = DeferredSequence::new(FlowChunks {
            tree,
            lines: &mut **lines,
            flow,
            ipd: first.ipd,
            relaxed: false,
        });

        let mut laid_out = Vec::new();
        loop {
            let index = laid_out.len();
            let master = config
                .page_master(index)
                .ok_or_else(|| anyhow!("no page master for page {}", index + 1))?;
            if master.ipd != content.source().ipd {
                reflow(&mut content, master.ipd)?;
            }

            while content.resolve(0).is_some_and(Element::is_discardable) {
                content.take_front(1);
            }
            if content.resolve(0).is_none() {
                if let Some(error) = content.take_error() {
                    return Err(error);
                }
                break;
            }
            if index >= config.max_pages {
                error!(target: "fo_layout", "page limit of {} reached", config.max_pages);
                bail!("layout exceeds {} pages", config.max_pages);
            }

            let placed = fill_page(&mut **pages, &mut content, master.bpd)?;
            let page = place_page(&mut **pages, &mut content, &static_nodes, index + 1, master, &placed)?;
            laid_out.push(page);
        }
        debug!(target: "fo_layout", "laid out {} pages", laid_out.len());
        Ok(laid_out)
    }
}

/// Pulls block-direction chunks from the flow.
struct FlowChunks<'run, 'fo> {
    tree: &'run mut LayoutTree<'fo>,
    lines: &'run mut dyn BreakOptimizer,
    flow: ManagerId,
    /// Width the resolved content was produced for.
    ipd: Millipoints,
    relaxed: bool,
}

impl ChunkSource for FlowChunks<'_, '_> {
    type Error = anyhow::Error;

    fn next_chunk(&mut self) -> Result<Option<Vec<Element>>> {
        if self.tree.is_finished(self.flow)? {
            return Ok(None);
        }
        let mut ctx = LayoutContext::new(self.ipd, &mut *self.lines).with_relaxed(self.relaxed);
        match self.tree.produce_elements(self.flow, &mut ctx, Alignment::Start)? {
            Some(chunk) => Ok(Some(chunk)),
            None => {
                error!(target: "fo_layout", "flow {:?} returned no element list", self.flow);
                bail!("flow {:?} returned no element list", self.flow)
            }
        }
    }
}

type FlowContent<'run, 'fo> = DeferredSequence<FlowChunks<'run, 'fo>>;

/// Take the content of the next page off the front of `content`.
///
/// When the optimizer finds no feasible break, the unplaced content is
/// regenerated with keeps relaxed and the page may overflow. Content carried
/// over from earlier pages is rewound to its first position; without one the
/// flow is rolled back to the snapshot taken when this page started.
fn fill_page(
    pages: &mut dyn BreakOptimizer,
    content: &mut FlowContent<'_, '_>,
    extent: Millipoints,
) -> Result<Vec<Element>> {
    let flow = content.source().flow;
    let snapshot = content.source().tree.capture_snapshot(flow)?;
    let carried = content.available();

    let breaks = match pages.find_breaks(content, &BreakRequest::page(extent)) {
        Ok(breaks) => breaks,
        Err(infeasible) => {
            warn!(target: "fo_layout", "{infeasible}; retrying with relaxed keeps");
            if let Some(error) = content.take_error() {
                return Err(error);
            }
            if !rewind_unplaced(content)? {
                content.source_mut().tree.rollback(flow, &snapshot)?;
                content.truncate(carried);
            }
            content.source_mut().relaxed = true;
            let retried = pages.find_breaks(content, &BreakRequest::page(extent).with_overflow());
            content.source_mut().relaxed = false;
            retried?
        }
    };
    if let Some(error) = content.take_error() {
        return Err(error);
    }
    let count = breaks
        .first()
        .map_or_else(|| content.available(), |point| point.index);
    Ok(content.take_front(count))
}

/// Regenerate the unplaced content for a new width.
fn reflow(content: &mut FlowContent<'_, '_>, ipd: Millipoints) -> Result<()> {
    let source = content.source_mut();
    debug!(target: "fo_layout", "width changes from {} to {ipd}", source.ipd);
    source.ipd = ipd;
    rewind_unplaced(content)?;
    Ok(())
}

/// Reset the flow to the first positioned element still waiting and drop
/// everything from there on, so it is produced again. Returns whether there
/// was such an element.
fn rewind_unplaced(content: &mut FlowContent<'_, '_>) -> Result<bool> {
    let first = content
        .resolved()
        .iter()
        .enumerate()
        .find_map(|(index, element)| element.position().map(|position| (index, position)));
    let Some((index, position)) = first else {
        return Ok(false);
    };
    let source = content.source_mut();
    source.tree.reset(source.flow, Some(position))?;
    content.truncate(index);
    Ok(true)
}

fn place_page(
    pages: &mut dyn BreakOptimizer,
    content: &mut FlowContent<'_, '_>,
    static_nodes: &[FoNodeId],
    number: usize,
    master: PageMaster,
    placed: &[Element],
) -> Result<Page> {
    let _span = info_span!("page.place", number).entered();
    let unplaced: Vec<Position> = content.resolved().iter().filter_map(Element::position).collect();
    let source = content.source_mut();
    let tree = &mut *source.tree;
    tree.begin_page(number, &unplaced)?;

    let positions: Vec<Position> = placed.iter().filter_map(Element::position).collect();
    let mut areas = AreaContext::new(Area::viewport(master.ipd));
    tree.add_areas(source.flow, &positions, &mut areas)?;
    let body = areas.finish()?;

    let mut static_content = Vec::with_capacity(static_nodes.len());
    for &node in static_nodes {
        static_content.push(layout_static(tree, &mut *source.lines, pages, node, master)?);
    }
    Ok(Page {
        number,
        master,
        body,
        static_content,
    })
}

/// Lay out a static-content object into the region-before of the current
/// page. Content past the region's extent is dropped.
///
/// The managers are created afresh and discarded afterwards, so
/// retrieve-markers resolve against the markers of the page just placed.
fn layout_static(
    tree: &mut LayoutTree<'_>,
    lines: &mut dyn BreakOptimizer,
    pages: &mut dyn BreakOptimizer,
    node: FoNodeId,
    master: PageMaster,
) -> Result<Area> {
    let _span = info_span!("page.static_content").entered();
    let mark = tree.len();
    let root = tree.create_root(node)?;
    let mut ctx = LayoutContext::new(master.ipd, lines);
    let mut elements = Vec::new();
    while !tree.is_finished(root)? {
        let Some(chunk) = tree.produce_elements(root, &mut ctx, Alignment::Start)? else {
            tree.truncate(mark);
            bail!("static content {root:?} returned no element list");
        };
        elements.extend(chunk);
    }

    let fitting = match pages.find_breaks(&mut elements, &BreakRequest::page(master.before_extent)) {
        Ok(breaks) => breaks.first().map_or(elements.len(), |point| point.index),
        Err(infeasible) => {
            warn!(target: "fo_layout", "static content {root:?} left empty: {infeasible}");
            0
        }
    };
    if fitting < elements.len() {
        debug!(target: "fo_layout", "static content {root:?} clipped at element {fitting}");
    }
    let positions: Vec<Position> = elements
        .get(..fitting)
        .unwrap_or_default()
        .iter()
        .filter_map(Element::position)
        .collect();
    let mut areas = AreaContext::new(Area::viewport(master.ipd));
    let added = tree.add_areas(root, &positions, &mut areas);
    tree.truncate(mark);
    added?;
    areas.finish()
}
