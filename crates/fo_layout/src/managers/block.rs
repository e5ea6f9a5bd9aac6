//! Stacking managers: flow, static content, block and block-level wrapper.

use anyhow::{Result, anyhow, bail};
use fo_knuth::{
    AppendMode, Element, INFINITE, KnuthSequence, ManagerId, Millipoints, NoLetterSpacing, Position,
    SequenceKind, SequenceList,
};
use fo_tree::FoNodeId;
use log::{debug, error};

use super::Owner;
use crate::{
    Alignment, Area, AreaContext, AreaKind, BlockState, BreakRequest, LayoutContext, LayoutTree,
    LineRecord, Progress,
};

/// Resolved properties of a stacking manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockProps {
    /// `space-before` plus the before border and padding.
    before: Millipoints,
    after: Millipoints,
    /// Margin, border and padding on the start side.
    start_indent: Millipoints,
    end_indent: Millipoints,
    break_before: bool,
    break_after: bool,
    keep_together: bool,
    orphans: usize,
    widows: usize,
    line_height: Millipoints,
    alignment: Alignment,
}

impl BlockProps {
    fn decorated(tree: &LayoutTree<'_>, node: FoNodeId) -> Self {
        Self {
            before: tree.length(node, "space-before", 0) + tree.edge(node, "before"),
            after: tree.length(node, "space-after", 0) + tree.edge(node, "after"),
            start_indent: tree.length(node, "margin-start", 0) + tree.edge(node, "start"),
            end_indent: tree.length(node, "margin-end", 0) + tree.edge(node, "end"),
            break_before: tree.keyword(node, "break-before", "auto") == "page",
            break_after: tree.keyword(node, "break-after", "auto") == "page",
            alignment: tree.text_alignment(node),
            ..Self::transparent(tree, node, Alignment::Start)
        }
    }

    /// No spaces, edges or breaks of its own.
    fn transparent(tree: &LayoutTree<'_>, node: FoNodeId, alignment: Alignment) -> Self {
        Self {
            before: 0,
            after: 0,
            start_indent: 0,
            end_indent: 0,
            break_before: false,
            break_after: false,
            keep_together: tree.keyword(node, "keep-together", "auto") == "always",
            orphans: usize::try_from(tree.integer(node, "orphans", 2)).unwrap_or(1),
            widows: usize::try_from(tree.integer(node, "widows", 2)).unwrap_or(1),
            line_height: tree.line_height(node),
            alignment,
        }
    }

    /// How a stacked child joins the content before it. The first child
    /// follows the leading edge directly.
    fn junction_after(&self, stacked: bool, relaxed: bool) -> AppendMode {
        match (stacked, self.keep_together && !relaxed) {
            (false, _) => AppendMode::Plain,
            (true, true) => AppendMode::KeepTogether,
            (true, false) => AppendMode::BreakWith(Element::penalty(0, false)),
        }
    }

    /// Penalty between two lines of a paragraph with `before` lines above
    /// and `after` lines below.
    fn line_penalty(&self, before: usize, after: usize, relaxed: bool) -> Element {
        let kept = !relaxed && (self.keep_together || before < self.orphans || after < self.widows);
        Element::penalty(if kept { INFINITE } else { 0 }, false)
    }
}

impl LayoutTree<'_> {
    pub(super) fn produce_stack(
        &mut self,
        id: ManagerId,
        ctx: &mut LayoutContext<'_>,
        alignment: Alignment,
        decorated: bool,
        one_chunk: bool,
    ) -> Result<Vec<Element>> {
        let manager = self.manager(id)?;
        if manager.is_finished() {
            return Ok(Vec::new());
        }
        let starting = manager.progress == Progress::NotStarted;
        let node = manager.node;
        let props = if decorated {
            BlockProps::decorated(self, node)
        } else {
            BlockProps::transparent(self, node, alignment)
        };
        let inner_ipd = ctx.ipd - props.start_indent - props.end_indent;

        let mut out = KnuthSequence::block();
        if starting && props.break_before {
            out.push(Element::forced_break());
        }
        if starting && props.before > 0 {
            out.push(
                Element::auxiliary_box(props.before, 0)
                    .with_owner(id)
                    .with_position(Position::new(id, 0)),
            );
        }

        // inline runs merge into paragraphs, block children into stacks
        let junction = props.junction_after(true, ctx.relaxed);
        let mut pending = SequenceList::new();
        while let Some(child) = self.get_active_child(id)? {
            let inline = self.manager(child)?.kind.is_inline_level();
            let Some(elements) =
                self.produce_elements(child, &mut ctx.nested(inner_ipd), props.alignment)?
            else {
                continue;
            };
            if inline {
                pending.push_or_merge(KnuthSequence::from_elements(SequenceKind::Inline, elements), self);
                continue;
            }
            let forced_end = elements.last().is_some_and(Element::is_forced_break);
            let block = KnuthSequence::from_elements(SequenceKind::Block, elements);
            pending.push_or_merge_with(block, junction.clone(), &mut NoLetterSpacing);
            if forced_end || one_chunk {
                break;
            }
        }

        // the junction only goes between stacked children, never after the
        // leading edge
        let mut stacked = false;
        for sequence in pending {
            let mut block = if sequence.is_inline() {
                let lines = self.break_paragraph(id, sequence, &mut ctx.nested(inner_ipd), &props)?;
                KnuthSequence::from_elements(SequenceKind::Block, lines)
            } else {
                sequence
            };
            out.append_with(&mut block, props.junction_after(stacked, ctx.relaxed), &mut NoLetterSpacing);
            stacked = true;
        }

        if self.manager(id)?.is_finished() {
            if props.after > 0 {
                out.push(
                    Element::auxiliary_box(props.after, 0)
                        .with_owner(id)
                        .with_position(Position::new(id, BlockState::END_EDGE)),
                );
            }
            if props.break_after {
                out.push(Element::forced_break());
            }
        }
        // chunks are concatenated as they are, so a resumed chunk brings
        // its own break opportunity
        if one_chunk && !starting && out.elements().first().is_some_and(Element::is_box) {
            out.insert_leading(Element::penalty(0, false));
        }
        Ok(out.into_elements())
    }

    /// Close `paragraph`, break it into lines and turn every line into one
    /// block-direction box positioned at `(id, line + 1)`.
    fn break_paragraph(
        &mut self,
        id: ManagerId,
        mut paragraph: KnuthSequence,
        ctx: &mut LayoutContext<'_>,
        props: &BlockProps,
    ) -> Result<Vec<Element>> {
        paragraph.close();
        paragraph.ignore_leading_glues();
        let request = BreakRequest::lines(ctx.ipd, props.alignment);
        let breaks = ctx.optimizer.find_breaks(&mut paragraph, &request)?;

        let mut records = Vec::with_capacity(breaks.len());
        let mut start = 0;
        for point in &breaks {
            let segment = paragraph.elements().get(start..point.index).unwrap_or_default();
            start = point.index + 1;
            if let Some(record) = line_record(segment, ctx.ipd, props) {
                records.push(record);
            }
        }
        debug!(
            target: "fo_layout",
            "{id:?}: paragraph of {} elements set in {} lines at {}mpt",
            paragraph.len(),
            records.len(),
            ctx.ipd
        );

        let state = self
            .manager_mut(id)?
            .kind
            .block_state_mut()
            .ok_or_else(|| anyhow!("{id:?} cannot hold lines"))?;
        let count = records.len();
        let mut lines = Vec::with_capacity(count * 2);
        for (number, record) in records.into_iter().enumerate() {
            if number > 0 {
                lines.push(props.line_penalty(number, count - number, ctx.relaxed));
            }
            // block direction: the line height is the breaking width
            lines.push(
                Element::new_box(record.height, record.width)
                    .with_owner(id)
                    .with_position(Position::new(id, state.lines.len() + 1)),
            );
            state.lines.push(record);
        }
        Ok(lines)
    }

    pub(super) fn add_stack_areas(
        &mut self,
        id: ManagerId,
        positions: &[Position],
        areas: &mut AreaContext,
        decorated: bool,
    ) -> Result<()> {
        let node = self.manager(id)?.node;
        let props = decorated.then(|| BlockProps::decorated(self, node));
        if let Some(props) = &props {
            let ipd = areas.current_ipd() - props.start_indent - props.end_indent;
            areas.open(
                Area::new(AreaKind::Block, ipd, 0)
                    .generated_by(node, id)
                    .with_offset(props.start_indent),
            );
        }

        for (owner, run) in self.position_runs(id, positions)? {
            match owner {
                Owner::Child(child) => self.add_areas(child, &run, areas)?,
                Owner::Own => {
                    for position in run {
                        self.add_own_position(id, node, position, props.as_ref(), areas)?;
                    }
                }
            }
        }

        if props.is_some() {
            areas.close()?;
        }
        Ok(())
    }

    fn add_own_position(
        &mut self,
        id: ManagerId,
        node: FoNodeId,
        position: Position,
        props: Option<&BlockProps>,
        areas: &mut AreaContext,
    ) -> Result<()> {
        match position.index {
            0 => {
                areas.grow(props.map_or(0, |props| props.before));
                return Ok(());
            }
            BlockState::END_EDGE => {
                areas.grow(props.map_or(0, |props| props.after));
                return Ok(());
            }
            _ => {}
        }
        let line = self
            .manager(id)?
            .kind
            .block_state()
            .and_then(|state| state.line(position.index))
            .cloned();
        let Some(line) = line else {
            error!(target: "fo_layout", "{id:?} never produced line {}", position.index);
            bail!("no line {} in {id:?}", position.index);
        };
        areas.open(
            Area::new(AreaKind::Line, 0, line.height)
                .generated_by(node, id)
                .with_offset(line.offset),
        );
        self.route_to_children(id, &line.items, areas)?;
        areas.close()
    }
}

/// Measure one line, without the discardable elements at either end.
/// Lines holding no box are dropped.
fn line_record(segment: &[Element], ipd: Millipoints, props: &BlockProps) -> Option<LineRecord> {
    let first = segment.iter().position(|element| !element.is_discardable())?;
    let last = segment.iter().rposition(|element| !element.is_discardable())?;
    let content = segment.get(first..=last)?;
    let width: Millipoints = content
        .iter()
        .filter(|element| !element.is_penalty())
        .map(Element::width)
        .sum();
    let height = content
        .iter()
        .filter(|element| element.is_box())
        .map(Element::height)
        .fold(props.line_height, Millipoints::max);
    let items: Vec<Position> = content.iter().filter_map(Element::position).collect();
    Some(LineRecord {
        items,
        width,
        height,
        offset: props.alignment.offset(ipd - width),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> BlockProps {
        BlockProps {
            before: 0,
            after: 0,
            start_indent: 0,
            end_indent: 0,
            break_before: false,
            break_after: false,
            keep_together: false,
            orphans: 2,
            widows: 2,
            line_height: 10,
            alignment: Alignment::Center,
        }
    }

    #[test]
    fn line_record_trims_and_centres() {
        let owner = ManagerId::new(3);
        let segment = [
            Element::glue(2, 1, 0),
            Element::new_box(4, 12).with_position(Position::new(owner, 0)),
            Element::glue(2, 1, 0),
            Element::new_box(4, 8).with_position(Position::new(owner, 1)),
            Element::penalty(0, false),
        ];
        let record = line_record(&segment, 20, &props());
        assert_eq!(
            record,
            Some(LineRecord {
                items: vec![Position::new(owner, 0), Position::new(owner, 1)],
                width: 10,
                height: 12,
                offset: 5,
            })
        );
        assert_eq!(line_record(&[Element::glue(1, 0, 0)], 20, &props()), None);
    }

    #[test]
    fn orphans_and_widows_forbid_edge_breaks() {
        let props = props();
        assert_eq!(props.line_penalty(1, 3, false).cost(), Some(INFINITE));
        assert_eq!(props.line_penalty(2, 2, false).cost(), Some(0));
        assert_eq!(props.line_penalty(3, 1, false).cost(), Some(INFINITE));
        assert_eq!(props.line_penalty(1, 3, true).cost(), Some(0));
    }
}
