//! Typed property lookups with the engine's recovery rules.
//!
//! A property that resolves to nothing takes the mapping's initial value.
//! When that is missing too, or the value has the wrong type, the engine
//! default passed by the caller is used and a warning is logged.

use fo_knuth::Millipoints;
use fo_tree::{FoNodeId, PropertyResolver, PropertyValue, ResolveProperty as _};
use log::warn;

use crate::{Alignment, LayoutTree};

impl LayoutTree<'_> {
    fn resolver(&self) -> PropertyResolver<'_> {
        PropertyResolver::new(self.fo, &self.config.properties)
    }

    fn resolve_or_initial(&self, node: FoNodeId, name: &str) -> Option<PropertyValue> {
        self.resolver().resolved(node, name).or_else(|| {
            let initial = self.config.properties.initial_value(name).cloned();
            if initial.is_none() {
                warn!(target: "fo_layout", "no value and no initial value for '{name}' on {node:?}");
            }
            initial
        })
    }

    pub(crate) fn length(&self, node: FoNodeId, name: &str, default: Millipoints) -> Millipoints {
        match self.resolve_or_initial(node, name) {
            Some(value) => value.as_length().unwrap_or_else(|| {
                // `normal`/`auto` are the keyword spellings of the default
                if !matches!(value.as_keyword(), Some("normal" | "auto")) {
                    warn!(target: "fo_layout", "'{name}' on {node:?} is not a length: {value:?}");
                }
                default
            }),
            None => default,
        }
    }

    /// A length only when one is given; keywords such as `auto` give `None`.
    pub(crate) fn optional_length(&self, node: FoNodeId, name: &str) -> Option<Millipoints> {
        self.resolver()
            .resolved(node, name)
            .as_ref()
            .and_then(PropertyValue::as_length)
    }

    pub(crate) fn integer(&self, node: FoNodeId, name: &str, default: i32) -> i32 {
        match self.resolve_or_initial(node, name) {
            Some(value) => value.as_integer().unwrap_or_else(|| {
                warn!(target: "fo_layout", "'{name}' on {node:?} is not an integer: {value:?}");
                default
            }),
            None => default,
        }
    }

    pub(crate) fn keyword(&self, node: FoNodeId, name: &str, default: &str) -> String {
        match self.resolve_or_initial(node, name) {
            Some(PropertyValue::Keyword(keyword)) => keyword,
            Some(value) => {
                warn!(target: "fo_layout", "'{name}' on {node:?} is not a keyword: {value:?}");
                default.to_owned()
            }
            None => default.to_owned(),
        }
    }

    pub(crate) fn line_height(&self, node: FoNodeId) -> Millipoints {
        self.length(node, "line-height", self.config.line_height)
    }

    pub(crate) fn letter_space(&self, node: FoNodeId) -> Millipoints {
        self.length(node, "letter-spacing", self.config.letter_space)
    }

    pub(crate) fn text_alignment(&self, node: FoNodeId) -> Alignment {
        let keyword = self.keyword(node, "text-align", "start");
        Alignment::from_keyword(&keyword).unwrap_or_else(|| {
            warn!(target: "fo_layout", "unknown text-align '{keyword}' on {node:?}");
            Alignment::Start
        })
    }

    /// Border width plus padding on one relative side.
    pub(crate) fn edge(&self, node: FoNodeId, side: &str) -> Millipoints {
        self.length(node, &format!("border-{side}-width"), 0)
            + self.length(node, &format!("padding-{side}"), 0)
    }
}
