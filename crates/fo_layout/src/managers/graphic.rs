use anyhow::{Result, bail};
use fo_knuth::{Element, ManagerId, Position};

use crate::{Area, AreaContext, AreaKind, LayoutTree, ManagerKind, Progress};

impl LayoutTree<'_> {
    pub(super) fn produce_graphic(&mut self, id: ManagerId) -> Result<Vec<Element>> {
        let manager = self.manager_mut(id)?;
        if manager.is_finished() {
            return Ok(Vec::new());
        }
        let ManagerKind::Graphic { width, height } = manager.kind else {
            bail!("{id:?} is not a graphic manager");
        };
        manager.progress = Progress::BreakAfter;
        Ok(vec![
            Element::new_box(width, height)
                .with_owner(id)
                .with_position(Position::new(id, 0)),
        ])
    }

    pub(super) fn add_graphic_area(&self, id: ManagerId, areas: &mut AreaContext) -> Result<()> {
        let manager = self.manager(id)?;
        let ManagerKind::Graphic { width, height } = manager.kind else {
            bail!("{id:?} is not a graphic manager");
        };
        areas.add(Area::new(AreaKind::Graphic, width, height).generated_by(manager.node, id));
        Ok(())
    }
}
