#![allow(dead_code, reason = "each test binary uses its own subset of the fixtures")]

use fo_knuth::{Element, ManagerId, Millipoints};
use fo_layout::{Area, AreaKind, LayoutTree, Progress};
use fo_tree::{FoKind, FoNodeId, FoTree, PropertyValue};

/// A root with one page sequence and its flow.
pub struct Document {
    pub fo: FoTree,
    pub page_sequence: FoNodeId,
    pub flow: FoNodeId,
}

pub fn document() -> Document {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut fo = FoTree::new();
    let page_sequence = fo.append(fo.root(), FoKind::PageSequence).unwrap();
    let flow = fo.append(page_sequence, FoKind::Flow).unwrap();
    Document {
        fo,
        page_sequence,
        flow,
    }
}

impl Document {
    /// A block in the flow holding `text`.
    pub fn paragraph(&mut self, text: &str) -> FoNodeId {
        let block = self.fo.append(self.flow, FoKind::Block).unwrap();
        self.fo.append_text(block, text).unwrap();
        block
    }

    pub fn set(&mut self, node: FoNodeId, name: &str, value: PropertyValue) {
        self.fo.set_property(node, name, value).unwrap();
    }

    pub fn set_keyword(&mut self, node: FoNodeId, name: &str, keyword: &str) {
        self.set(node, name, PropertyValue::keyword(keyword));
    }
}

/// Progress of every manager, in handle order.
pub fn progress_of_all(tree: &LayoutTree<'_>) -> Vec<Progress> {
    (0..tree.len())
        .map(|index| {
            let id = ManagerId::new(u32::try_from(index).unwrap());
            tree.manager(id).unwrap().progress()
        })
        .collect()
}

pub fn widths(elements: &[Element]) -> Vec<Millipoints> {
    elements.iter().map(Element::width).collect()
}

pub fn areas_of<'area>(area: &'area Area, kind: &AreaKind) -> Vec<&'area Area> {
    area.descendants()
        .into_iter()
        .filter(|descendant| descendant.kind == *kind)
        .collect()
}

pub fn child(tree: &LayoutTree<'_>, parent: ManagerId, index: usize) -> ManagerId {
    tree.manager(parent).unwrap().children()[index]
}
