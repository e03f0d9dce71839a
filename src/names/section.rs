use super::{
    DefaultNameResolver, NameError, NameMap, NameResolver, NameTables, lookup_named,
    lookup_nested, retain_unique_valid,
};
use crate::reader::{
    BinaryReader, BinaryReaderState, ImportDesc, Naming, NameEntry, ReaderResult,
    SectionInformation,
};
use crate::types::{NameType, SectionCode};
use log::debug;

/// Prefix of the names given to functions the name section leaves unnamed.
/// Name section entries starting with it are ignored so they cannot clash.
const UNKNOWN_FUNCTION_PREFIX: &str = "unknown";

/// Scans a module for its `name` custom section.
///
/// Only the import, function and `name` sections are decoded; everything
/// else is skipped. Function names are kept only if they are valid
/// identifiers, unique, and belong to an existing function.
#[derive(Debug, Default)]
pub struct NameSectionReader {
    done: bool,
    function_imports: u32,
    functions: u32,
    names: NameTables,
    has_valid_names: bool,
}

impl NameSectionReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the reader's events through the scanner. Returns `Ok(false)`
    /// when the reader needs more bytes, `Ok(true)` once the module has been
    /// scanned completely.
    pub fn read<B: AsRef<[u8]>>(&mut self, reader: &mut BinaryReader<B>) -> Result<bool, NameError> {
        if self.done {
            return Err(NameError::AlreadyDone);
        }

        while reader.read()? {
            if matches!(reader.result(), ReaderResult::Section(info) if !is_scanned_section(info)) {
                reader.skip_section();
                continue;
            }
            match reader.result() {
                ReaderResult::Import(entry) => {
                    if matches!(entry.desc, ImportDesc::Function { .. }) {
                        self.function_imports += 1;
                    }
                }
                ReaderResult::Function(_) => self.functions += 1,
                ReaderResult::Name(entry) => collect_name_entry(&mut self.names, entry.clone()),
                _ => {}
            }

            if reader.state() == BinaryReaderState::EndWasm && !reader.has_more_bytes() {
                self.finish();
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn finish(&mut self) {
        let function_count = self.function_imports + self.functions;
        let names = &mut self.names;
        names.functions.retain(|&index, _| index < function_count);
        retain_unique_valid(&mut names.functions, |name| {
            name.starts_with(UNKNOWN_FUNCTION_PREFIX)
        });
        validate_all(names);

        self.done = true;
        self.has_valid_names = !names.is_empty();
        debug!("name section provided {} valid names", names.len());
    }

    pub fn has_valid_names(&self) -> bool {
        self.has_valid_names
    }

    pub fn get_name_resolver(&self) -> Result<NameSectionNameResolver, NameError> {
        if !self.has_valid_names {
            return Err(NameError::NoValidNames);
        }
        Ok(NameSectionNameResolver {
            names: self.names.clone(),
        })
    }
}

fn is_scanned_section(info: &SectionInformation) -> bool {
    match info.id {
        SectionCode::Import | SectionCode::Function => true,
        SectionCode::Custom => info.name.as_deref() == Some(b"name"),
        _ => false,
    }
}

/// Validity and uniqueness filtering for everything except function names.
pub(crate) fn validate_all(names: &mut NameTables) {
    let no_extra = |_: &str| false;
    for map in [
        &mut names.types,
        &mut names.tables,
        &mut names.memories,
        &mut names.globals,
        &mut names.elements,
        &mut names.events,
    ] {
        retain_unique_valid(map, no_extra);
    }
    for map in names.locals.values_mut().chain(names.fields.values_mut()) {
        retain_unique_valid(map, no_extra);
    }
}

fn to_name_map(names: Vec<Naming>) -> NameMap {
    names
        .into_iter()
        .filter_map(|naming| Some((naming.index, String::from_utf8(naming.name).ok()?)))
        .collect()
}

pub(crate) fn collect_name_entry(names: &mut NameTables, entry: NameEntry) {
    match entry {
        NameEntry::Module(_) => {}
        NameEntry::Map { kind, names: map } => {
            let target = match kind {
                NameType::Function => &mut names.functions,
                NameType::Type => &mut names.types,
                NameType::Table => &mut names.tables,
                NameType::Memory => &mut names.memories,
                NameType::Global => &mut names.globals,
                NameType::Element => &mut names.elements,
                NameType::Event => &mut names.events,
                _ => return,
            };
            target.extend(to_name_map(map));
        }
        NameEntry::IndirectMap { kind, groups } => {
            let target = match kind {
                NameType::Local => &mut names.locals,
                NameType::Field => &mut names.fields,
                _ => return,
            };
            for group in groups {
                target
                    .entry(group.index)
                    .or_default()
                    .extend(to_name_map(group.names));
            }
        }
    }
}

/// Resolves names from a module's `name` section. Functions the section
/// does not name print as `$unknownN`; other entities fall back to the
/// index-based defaults.
#[derive(Debug, Clone)]
pub struct NameSectionNameResolver {
    names: NameTables,
}

impl NameResolver for NameSectionNameResolver {
    fn type_name(&self, index: u32, is_ref: bool) -> String {
        lookup_named(&self.names.types, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.type_name(index, is_ref))
    }

    fn table_name(&self, index: u32, is_ref: bool) -> String {
        lookup_named(&self.names.tables, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.table_name(index, is_ref))
    }

    fn memory_name(&self, index: u32, is_ref: bool) -> String {
        lookup_named(&self.names.memories, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.memory_name(index, is_ref))
    }

    fn global_name(&self, index: u32, is_ref: bool) -> String {
        lookup_named(&self.names.globals, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.global_name(index, is_ref))
    }

    fn element_name(&self, index: u32, is_ref: bool) -> String {
        lookup_named(&self.names.elements, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.element_name(index, is_ref))
    }

    fn event_name(&self, index: u32, is_ref: bool) -> String {
        lookup_named(&self.names.events, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.event_name(index, is_ref))
    }

    fn function_name(&self, index: u32, _is_import: bool, is_ref: bool) -> String {
        lookup_named(&self.names.functions, index, is_ref)
            .unwrap_or_else(|| format!("${UNKNOWN_FUNCTION_PREFIX}{index}"))
    }

    fn variable_name(&self, func_index: u32, index: u32, is_ref: bool) -> String {
        lookup_nested(&self.names.locals, func_index, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.variable_name(func_index, index, is_ref))
    }

    fn field_name(&self, type_index: u32, index: u32, is_ref: bool) -> String {
        lookup_nested(&self.names.fields, type_index, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.field_name(type_index, index, is_ref))
    }
}
