//! Property values and the reference property resolver.
//!
//! The layout core treats resolved values as opaque lengths, integers and
//! keywords. Resolution follows the usual formatting-object order:
//!
//! 1. the value specified on the node itself;
//! 2. the corresponding absolute/relative property under the node's writing
//!    mode (`padding-start` <-> `padding-left` in `lr-tb`);
//! 3. a shorthand covering the property (`padding` for `padding-left`);
//! 4. for inherited properties, the parent's resolved value.
//!
//! Initial values are *not* substituted here; callers decide how to recover
//! when nothing resolves.

use crate::{FoNodeId, FoTree, Millipoints};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Length(Millipoints),
    Integer(i32),
    Keyword(String),
    /// Named components, e.g. `minimum`/`optimum`/`maximum` of a space.
    Compound(Vec<(String, PropertyValue)>),
    /// The `inherit` keyword: take the parent's computed value.
    Inherit,
}

impl PropertyValue {
    pub fn keyword(keyword: &str) -> Self {
        Self::Keyword(keyword.to_owned())
    }

    /// Numeric length; a compound value answers with its `optimum` component.
    pub fn as_length(&self) -> Option<Millipoints> {
        match self {
            Self::Length(length) => Some(*length),
            Self::Compound(_) => self.component("optimum").and_then(Self::as_length),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(keyword) => Some(keyword),
            _ => None,
        }
    }

    pub fn component(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Compound(parts) => parts
                .iter()
                .find(|(part, _)| part == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Static facts about one property.
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    pub inherited: bool,
    pub initial: Option<PropertyValue>,
}

impl PropertyInfo {
    pub fn inherited(initial: PropertyValue) -> Self {
        Self {
            inherited: true,
            initial: Some(initial),
        }
    }

    pub fn local(initial: PropertyValue) -> Self {
        Self {
            inherited: false,
            initial: Some(initial),
        }
    }
}

/// Immutable property table, built once and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct PropertyMapping {
    properties: HashMap<String, PropertyInfo>,
    /// Longhand name -> shorthand that sets it.
    shorthands: HashMap<String, String>,
}

const ABSOLUTE_DIRECTIONS: [&str; 4] = ["left", "right", "top", "bottom"];
const RELATIVE_DIRECTIONS: [&str; 4] = ["start", "end", "before", "after"];
const BOX_PROPERTIES: [&str; 3] = ["margin", "padding", "border"];

impl PropertyMapping {
    /// The table used by the layout managers.
    pub fn standard() -> Self {
        let zero = || PropertyValue::Length(0);
        let mut mapping = Self::default()
            .with_property("writing-mode", PropertyInfo::inherited(PropertyValue::keyword("lr-tb")))
            .with_property("letter-spacing", PropertyInfo::inherited(zero()))
            .with_property("line-height", PropertyInfo::inherited(PropertyValue::Length(14_400)))
            .with_property("font-size", PropertyInfo::inherited(PropertyValue::Length(12_000)))
            .with_property("text-align", PropertyInfo::inherited(PropertyValue::keyword("start")))
            .with_property("orphans", PropertyInfo::inherited(PropertyValue::Integer(2)))
            .with_property("widows", PropertyInfo::inherited(PropertyValue::Integer(2)))
            .with_property("keep-together", PropertyInfo::inherited(PropertyValue::keyword("auto")))
            .with_property("break-before", PropertyInfo::local(PropertyValue::keyword("auto")))
            .with_property("break-after", PropertyInfo::local(PropertyValue::keyword("auto")))
            .with_property("space-before", PropertyInfo::local(zero()))
            .with_property("space-after", PropertyInfo::local(zero()))
            .with_property("content-width", PropertyInfo::local(PropertyValue::keyword("auto")))
            .with_property("content-height", PropertyInfo::local(PropertyValue::keyword("auto")));
        for prefix in BOX_PROPERTIES {
            for direction in ABSOLUTE_DIRECTIONS.iter().chain(RELATIVE_DIRECTIONS.iter()) {
                let name = box_property_name(prefix, direction);
                mapping = mapping.with_property(&name, PropertyInfo::local(zero()));
            }
        }
        mapping
            .with_shorthand("margin", &box_longhands("margin"))
            .with_shorthand("padding", &box_longhands("padding"))
            .with_shorthand("border-width", &box_longhands("border"))
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, info: PropertyInfo) -> Self {
        self.properties.insert(name.to_owned(), info);
        self
    }

    #[must_use]
    pub fn with_shorthand<S: AsRef<str>>(mut self, shorthand: &str, longhands: &[S]) -> Self {
        for longhand in longhands {
            self.shorthands
                .insert(longhand.as_ref().to_owned(), shorthand.to_owned());
        }
        self
    }

    pub fn info(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.get(name)
    }

    pub fn is_inherited(&self, name: &str) -> bool {
        self.info(name).is_some_and(|info| info.inherited)
    }

    pub fn initial_value(&self, name: &str) -> Option<&PropertyValue> {
        self.info(name)?.initial.as_ref()
    }

    pub fn shorthand_of(&self, name: &str) -> Option<&str> {
        self.shorthands.get(name).map(String::as_str)
    }
}

fn box_property_name(prefix: &str, direction: &str) -> String {
    if prefix == "border" {
        format!("border-{direction}-width")
    } else {
        format!("{prefix}-{direction}")
    }
}

fn box_longhands(prefix: &str) -> Vec<String> {
    ABSOLUTE_DIRECTIONS
        .iter()
        .map(|direction| box_property_name(prefix, direction))
        .collect()
}

/// Writing modes with distinct direction mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
    #[default]
    LrTb,
    RlTb,
    TbRl,
}

impl WritingMode {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "lr-tb" | "lr" => Some(Self::LrTb),
            "rl-tb" | "rl" => Some(Self::RlTb),
            "tb-rl" | "tb" => Some(Self::TbRl),
            _ => None,
        }
    }

    /// For each absolute direction (left, right, top, bottom), the index of
    /// the relative direction (start, end, before, after) it maps to.
    fn table(self) -> [usize; 4] {
        match self {
            Self::LrTb => [0, 1, 2, 3],
            Self::RlTb => [1, 0, 2, 3],
            Self::TbRl => [3, 2, 0, 1],
        }
    }

    /// The corresponding property of `name`, flipping between absolute and
    /// relative directions. Only box properties have correspondents.
    pub fn corresponding(self, name: &str) -> Option<String> {
        let mut parts: Vec<&str> = name.split('-').collect();
        if !BOX_PROPERTIES.contains(parts.first()?) || parts.len() < 2 {
            return None;
        }
        let table = self.table();
        let direction = parts[1];
        if let Some(absolute) = ABSOLUTE_DIRECTIONS.iter().position(|dir| *dir == direction) {
            parts[1] = RELATIVE_DIRECTIONS[table[absolute]];
        } else if let Some(relative) = RELATIVE_DIRECTIONS.iter().position(|dir| *dir == direction) {
            let absolute = table.iter().position(|&mapped| mapped == relative)?;
            parts[1] = ABSOLUTE_DIRECTIONS[absolute];
        } else {
            return None;
        }
        Some(parts.join("-"))
    }
}

/// Answers "what is the value of property `name` on `node`".
pub trait ResolveProperty {
    fn resolved(&self, node: FoNodeId, name: &str) -> Option<PropertyValue>;
}

/// Reference resolver over an [`FoTree`] and a [`PropertyMapping`].
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'tree> {
    tree: &'tree FoTree,
    mapping: &'tree PropertyMapping,
}

impl<'tree> PropertyResolver<'tree> {
    pub fn new(tree: &'tree FoTree, mapping: &'tree PropertyMapping) -> Self {
        Self { tree, mapping }
    }

    pub fn mapping(&self) -> &'tree PropertyMapping {
        self.mapping
    }

    pub fn writing_mode(&self, node: FoNodeId) -> WritingMode {
        self.find(node, "writing-mode")
            .as_ref()
            .and_then(PropertyValue::as_keyword)
            .and_then(WritingMode::from_keyword)
            .unwrap_or_default()
    }

    fn find(&self, node: FoNodeId, name: &str) -> Option<PropertyValue> {
        if let Some(value) = self.find_on_node(node, name) {
            if value == PropertyValue::Inherit {
                return self.find(self.tree.parent(node)?, name);
            }
            return Some(value);
        }
        if self.mapping.is_inherited(name) {
            return self.find(self.tree.parent(node)?, name);
        }
        None
    }

    fn find_on_node(&self, node: FoNodeId, name: &str) -> Option<PropertyValue> {
        let fo_node = self.tree.node(node)?;
        if let Some(value) = fo_node.explicit(name) {
            return Some(value.clone());
        }
        let corresponding = self.writing_mode_for_box_property(node, name)?;
        fo_node
            .explicit(&corresponding)
            .or_else(|| {
                self.mapping
                    .shorthand_of(name)
                    .and_then(|shorthand| fo_node.explicit(shorthand))
            })
            .or_else(|| {
                self.mapping
                    .shorthand_of(&corresponding)
                    .and_then(|shorthand| fo_node.explicit(shorthand))
            })
            .cloned()
    }

    /// Only box properties have correspondents and shorthands, so the writing
    /// mode is looked up for those alone.
    fn writing_mode_for_box_property(&self, node: FoNodeId, name: &str) -> Option<String> {
        if !BOX_PROPERTIES.iter().any(|prefix| name.starts_with(prefix)) {
            return None;
        }
        self.writing_mode(node).corresponding(name)
    }
}

impl ResolveProperty for PropertyResolver<'_> {
    fn resolved(&self, node: FoNodeId, name: &str) -> Option<PropertyValue> {
        let (base, component) = match name.split_once('.') {
            Some((base, component)) => (base, Some(component)),
            None => (name, None),
        };
        let value = self.find(node, base)?;
        match component {
            Some(component) => value.component(component).cloned(),
            None => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corresponding_names_follow_writing_mode() {
        assert_eq!(
            WritingMode::LrTb.corresponding("padding-start").as_deref(),
            Some("padding-left")
        );
        assert_eq!(
            WritingMode::RlTb.corresponding("padding-start").as_deref(),
            Some("padding-right")
        );
        assert_eq!(
            WritingMode::TbRl.corresponding("border-before-width").as_deref(),
            Some("border-right-width")
        );
        assert_eq!(
            WritingMode::TbRl.corresponding("margin-top").as_deref(),
            Some("margin-start")
        );
        assert_eq!(WritingMode::LrTb.corresponding("letter-spacing"), None);
    }

    #[test]
    fn compound_length_uses_optimum() {
        let space = PropertyValue::Compound(vec![
            ("minimum".to_owned(), PropertyValue::Length(1_000)),
            ("optimum".to_owned(), PropertyValue::Length(2_000)),
        ]);
        assert_eq!(space.as_length(), Some(2_000));
        assert_eq!(
            space.component("minimum"),
            Some(&PropertyValue::Length(1_000))
        );
    }
}
