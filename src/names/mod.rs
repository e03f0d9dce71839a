//! Symbolic names for module entities.
//!
//! The disassembler never formats an index itself; it asks a
//! [`NameResolver`]. Each method takes an `is_ref` flag: definitions may
//! show more than references (`$main (;3;)` versus `$main`).
mod devtools;
mod section;

pub use devtools::{DevToolsNameGenerator, DevToolsNameResolver, ExportMetadata};
pub use section::{NameSectionNameResolver, NameSectionReader};

use crate::reader::DecodeError;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NameError {
    #[error("failed to scan module for names")]
    Decode(#[from] DecodeError),

    #[error("the module has already been scanned")]
    AlreadyDone,

    #[error("no valid names were found")]
    NoValidNames,
}

/// Maps entity indices to display text. Every method has a synthetic
/// default, so an implementation only overrides what it knows.
pub trait NameResolver {
    fn type_name(&self, index: u32, _is_ref: bool) -> String {
        format!("$type{index}")
    }

    fn table_name(&self, index: u32, _is_ref: bool) -> String {
        format!("$table{index}")
    }

    fn memory_name(&self, index: u32, _is_ref: bool) -> String {
        format!("$memory{index}")
    }

    fn global_name(&self, index: u32, _is_ref: bool) -> String {
        format!("$global{index}")
    }

    fn element_name(&self, index: u32, _is_ref: bool) -> String {
        format!("$elem{index}")
    }

    fn event_name(&self, index: u32, _is_ref: bool) -> String {
        format!("$event{index}")
    }

    fn function_name(&self, index: u32, is_import: bool, _is_ref: bool) -> String {
        if is_import {
            format!("$import{index}")
        } else {
            format!("$func{index}")
        }
    }

    fn variable_name(&self, _func_index: u32, index: u32, _is_ref: bool) -> String {
        format!("$var{index}")
    }

    fn field_name(&self, _type_index: u32, index: u32, _is_ref: bool) -> String {
        format!("$field{index}")
    }

    /// The name of the `index`th label materialized in the module.
    fn label(&self, index: u32) -> String {
        format!("$label{index}")
    }
}

/// Index-based names only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNameResolver;

impl NameResolver for DefaultNameResolver {}

/// Characters allowed in a text-format identifier after the `$`.
pub fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-./:<=>?@\\^_`|~".contains(c)
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_valid_name_char)
}

/// Replaces every character that cannot appear in an identifier with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_valid_name_char(c) { c } else { '_' })
        .collect()
}

type NameMap = HashMap<u32, String>;

/// Names collected from the `name` section, keyed by entity kind.
#[derive(Debug, Clone, Default)]
pub(crate) struct NameTables {
    pub(crate) functions: NameMap,
    pub(crate) locals: HashMap<u32, NameMap>,
    pub(crate) types: NameMap,
    pub(crate) tables: NameMap,
    pub(crate) memories: NameMap,
    pub(crate) globals: NameMap,
    pub(crate) elements: NameMap,
    pub(crate) events: NameMap,
    pub(crate) fields: HashMap<u32, NameMap>,
}

impl NameTables {
    fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.locals.values().all(HashMap::is_empty)
            && self.types.is_empty()
            && self.tables.is_empty()
            && self.memories.is_empty()
            && self.globals.is_empty()
            && self.elements.is_empty()
            && self.events.is_empty()
            && self.fields.values().all(HashMap::is_empty)
    }

    fn len(&self) -> usize {
        [
            &self.functions,
            &self.types,
            &self.tables,
            &self.memories,
            &self.globals,
            &self.elements,
            &self.events,
        ]
        .iter()
        .map(|names| names.len())
        .chain(self.locals.values().map(HashMap::len))
        .chain(self.fields.values().map(HashMap::len))
        .sum()
    }
}

/// Drops invalid names from `names`, and every copy of a name that is used
/// more than once.
pub(crate) fn retain_unique_valid(names: &mut NameMap, also_reject: impl Fn(&str) -> bool) {
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut rejected = Vec::new();
    let mut indices: Vec<u32> = names.keys().copied().collect();
    indices.sort_unstable();

    for index in indices {
        let name = &names[&index];
        if !is_valid_name(name) || also_reject(name) {
            rejected.push(index);
            continue;
        }
        match seen.get(name) {
            Some(&first) => rejected.extend([first, index]),
            None => {
                seen.insert(name.clone(), index);
            }
        }
    }

    for index in rejected {
        names.remove(&index);
    }
}

/// `$name (;3;)` for definitions, `$name` for references.
pub(crate) fn format_named(name: &str, index: u32, is_ref: bool) -> String {
    if is_ref {
        format!("${name}")
    } else {
        format!("${name} (;{index};)")
    }
}

pub(crate) fn lookup_named(names: &NameMap, index: u32, is_ref: bool) -> Option<String> {
    names
        .get(&index)
        .map(|name| format_named(name, index, is_ref))
}

pub(crate) fn lookup_nested(
    names: &HashMap<u32, NameMap>,
    outer: u32,
    index: u32,
    is_ref: bool,
) -> Option<String> {
    names
        .get(&outer)
        .and_then(|inner| lookup_named(inner, index, is_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_are_index_based() {
        let names = DefaultNameResolver;
        assert_eq!(names.function_name(2, false, true), "$func2");
        assert_eq!(names.function_name(0, true, false), "$import0");
        assert_eq!(names.variable_name(4, 1, false), "$var1");
        assert_eq!(names.field_name(0, 3, true), "$field3");
        assert_eq!(names.element_name(1, true), "$elem1");
        assert_eq!(names.label(7), "$label7");
    }

    #[test]
    fn name_validity() {
        assert!(is_valid_name("foo.bar_baz!"));
        assert!(is_valid_name("a\\b"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("quote\""));
        assert!(!is_valid_name("ünï"));
    }

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_name("env.memcpy"), "env.memcpy");
        assert_eq!(sanitize_name("a b(c)"), "a_b_c_");
    }

    #[test]
    fn duplicates_lose_every_copy() {
        let mut names: NameMap = [
            (0, "a".to_string()),
            (1, "b".to_string()),
            (2, "a".to_string()),
            (3, "bad name".to_string()),
            (4, "unknown1".to_string()),
        ]
        .into_iter()
        .collect();
        retain_unique_valid(&mut names, |name| name.starts_with("unknown"));

        let mut kept: Vec<_> = names.into_iter().collect();
        kept.sort();
        assert_eq!(kept, vec![(1, "b".to_string())]);
    }
}
