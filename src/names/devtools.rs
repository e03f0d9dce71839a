use super::section::{collect_name_entry, validate_all};
use super::{
    DefaultNameResolver, NameError, NameMap, NameResolver, NameTables, lookup_named,
    lookup_nested, retain_unique_valid, sanitize_name,
};
use crate::reader::{BinaryReader, BinaryReaderState, ReaderResult, SectionInformation};
use crate::types::{ExternalKind, SectionCode};
use log::debug;
use std::collections::HashMap;

/// Export names per entity, in export section order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportMetadata {
    names: HashMap<(ExternalKind, u32), Vec<String>>,
}

impl ExportMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_export(&mut self, kind: ExternalKind, index: u32, name: impl Into<String>) {
        self.names.entry((kind, index)).or_default().push(name.into());
    }

    pub fn export_names(&self, kind: ExternalKind, index: u32) -> &[String] {
        self.names
            .get(&(kind, index))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn function_export_names(&self, index: u32) -> &[String] {
        self.export_names(ExternalKind::Function, index)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Derives names the way browser developer tools display them.
///
/// A valid `name` section name always wins. Otherwise the entity takes the
/// first import (`module.field`) or export name seen in section order, so an
/// imported entity keeps its import name even when it is re-exported. Import
/// and export names have characters that are not valid in identifiers
/// replaced with `_`.
#[derive(Debug, Default)]
pub struct DevToolsNameGenerator {
    done: bool,
    import_counts: HashMap<ExternalKind, u32>,
    name_section: NameTables,
    entity_names: HashMap<ExternalKind, NameMap>,
    export_metadata: ExportMetadata,
    names: NameTables,
}

impl DevToolsNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the reader's events through the generator. Returns `Ok(false)`
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
                    let kind = entry.kind();
                    let counter = self.import_counts.entry(kind).or_default();
                    let index = *counter;
                    *counter += 1;
                    let name = format!(
                        "{}.{}",
                        String::from_utf8_lossy(&entry.module),
                        String::from_utf8_lossy(&entry.field)
                    );
                    self.entity_names
                        .entry(kind)
                        .or_default()
                        .entry(index)
                        .or_insert_with(|| sanitize_name(&name));
                }
                ReaderResult::Export(entry) => {
                    let name = String::from_utf8_lossy(&entry.field).into_owned();
                    self.entity_names
                        .entry(entry.kind)
                        .or_default()
                        .entry(entry.index)
                        .or_insert_with(|| sanitize_name(&name));
                    self.export_metadata.add_export(entry.kind, entry.index, name);
                }
                ReaderResult::Name(entry) => {
                    collect_name_entry(&mut self.name_section, entry.clone());
                }
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
        let mut names = std::mem::take(&mut self.name_section);
        retain_unique_valid(&mut names.functions, |_| false);
        validate_all(&mut names);

        for (kind, target) in [
            (ExternalKind::Function, &mut names.functions),
            (ExternalKind::Table, &mut names.tables),
            (ExternalKind::Memory, &mut names.memories),
            (ExternalKind::Global, &mut names.globals),
            (ExternalKind::Event, &mut names.events),
        ] {
            if let Some(fallbacks) = self.entity_names.remove(&kind) {
                for (index, name) in fallbacks {
                    target.entry(index).or_insert(name);
                }
            }
        }

        debug!("derived {} names", names.len());
        self.names = names;
        self.done = true;
    }

    pub fn get_name_resolver(&self) -> DevToolsNameResolver {
        DevToolsNameResolver {
            names: self.names.clone(),
        }
    }

    pub fn get_export_metadata(&self) -> ExportMetadata {
        self.export_metadata.clone()
    }
}

fn is_scanned_section(info: &SectionInformation) -> bool {
    match info.id {
        SectionCode::Import | SectionCode::Export => true,
        SectionCode::Custom => info.name.as_deref() == Some(b"name"),
        _ => false,
    }
}

/// Resolver produced by [`DevToolsNameGenerator`]. Unnamed functions keep
/// their index-based `$funcN`/`$importN` names.
#[derive(Debug, Clone)]
pub struct DevToolsNameResolver {
    names: NameTables,
}

impl NameResolver for DevToolsNameResolver {
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

    fn function_name(&self, index: u32, is_import: bool, is_ref: bool) -> String {
        lookup_named(&self.names.functions, index, is_ref)
            .unwrap_or_else(|| DefaultNameResolver.function_name(index, is_import, is_ref))
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
