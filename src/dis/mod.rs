//! Streaming translation of [`BinaryReader`] events into the text format.
//!
//! [`WasmDisassembler::disassemble_chunk`] consumes whatever events the
//! reader can produce from the bytes it has, and
//! [`WasmDisassembler::get_result`] hands out the lines that are final.
//! A line that opens a block is held back while a branch further down might
//! still patch a label into it.
pub mod format;

use crate::names::{DefaultNameResolver, ExportMetadata, NameResolver};
use crate::opcode::OperatorCode;
use crate::reader::{
    BinaryReader, BinaryReaderState, DecodeError, ElementMode, Immediates, ImportDesc, Locals,
    MemoryAddress, OperatorInformation, ReaderResult,
};
use crate::types::{
    BlockType, ExternalKind, FieldType, FuncType, GlobalType, HeapType, Limits, SectionCode,
    Type, TypeEntry,
};
use format::{format_f32, format_f64, format_string, format_v128};
use log::debug;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DisassembleError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("cannot change `{0}` once disassembly has started")]
    OptionLocked(&'static str),

    #[error("disassembly has already finished")]
    AlreadyDone,

    #[error("module ended unexpectedly")]
    UnexpectedEnd,

    #[error("type {0} is not a defined function type")]
    UnknownFunctionType(u32),

    #[error("function {0} has no declared type")]
    UnknownFunction(u32),

    #[error("alignment exponent {0} is too large")]
    BadAlignment(u32),

    #[error("no text form for reader state {0:?}")]
    UnexpectedState(BinaryReaderState),
}

/// When block labels are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Branches print numeric depths; blocks are never labelled.
    Depth,
    /// Only blocks that some branch refers to get a label.
    #[default]
    WhenUsed,
    /// Every block gets a label.
    Always,
}

/// Byte range of a function body's instructions within the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionBodyOffset {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisassemblerResult {
    pub lines: Vec<String>,
    /// Module offset each line was produced at; present when offsets are
    /// enabled.
    pub offsets: Option<Vec<usize>>,
    pub done: bool,
    pub function_body_offsets: Option<Vec<FunctionBodyOffset>>,
}

/// A block opener whose label may still be spliced in.
#[derive(Debug, Clone)]
struct BackrefLabel {
    line: usize,
    position: usize,
    label: Option<String>,
}

pub struct WasmDisassembler {
    lines: Vec<String>,
    offsets: Vec<usize>,
    buffer: String,
    indent: String,
    indent_level: usize,

    add_offsets: bool,
    skip_types: bool,
    label_mode: LabelMode,
    name_resolver: Box<dyn NameResolver>,
    export_metadata: Option<ExportMetadata>,
    started: bool,
    done: bool,

    current_position: usize,
    /// The last `read()` stopped short of an event; its start position is
    /// kept for the event it eventually produces.
    resuming: bool,
    function_body_offsets: Vec<FunctionBodyOffset>,
    function_body_start: Option<usize>,
    current_section: Option<SectionCode>,

    types: Vec<TypeEntry>,
    func_types: Vec<u32>,
    func_index: u32,
    import_count: u32,
    global_count: u32,
    memory_count: u32,
    table_count: u32,
    event_count: u32,
    element_count: u32,

    expression: Vec<OperatorInformation>,
    backref_labels: Option<Vec<BackrefLabel>>,
    label_index: u32,
}

impl Default for WasmDisassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl WasmDisassembler {
    pub fn new() -> Self {
        WasmDisassembler {
            lines: Vec::new(),
            offsets: Vec::new(),
            buffer: String::new(),
            indent: String::new(),
            indent_level: 0,
            add_offsets: false,
            skip_types: true,
            label_mode: LabelMode::default(),
            name_resolver: Box::new(DefaultNameResolver),
            export_metadata: None,
            started: false,
            done: false,
            current_position: 0,
            resuming: false,
            function_body_offsets: Vec::new(),
            function_body_start: None,
            current_section: None,
            types: Vec::new(),
            func_types: Vec::new(),
            func_index: 0,
            import_count: 0,
            global_count: 0,
            memory_count: 0,
            table_count: 0,
            event_count: 0,
            element_count: 0,
            expression: Vec::new(),
            backref_labels: None,
            label_index: 0,
        }
    }

    fn check_unlocked(&self, option: &'static str) -> Result<(), DisassembleError> {
        if self.started {
            return Err(DisassembleError::OptionLocked(option));
        }
        Ok(())
    }

    pub fn add_offsets(&self) -> bool {
        self.add_offsets
    }

    pub fn set_add_offsets(&mut self, value: bool) -> Result<(), DisassembleError> {
        self.check_unlocked("add_offsets")?;
        self.add_offsets = value;
        Ok(())
    }

    pub fn skip_types(&self) -> bool {
        self.skip_types
    }

    pub fn set_skip_types(&mut self, value: bool) -> Result<(), DisassembleError> {
        self.check_unlocked("skip_types")?;
        self.skip_types = value;
        Ok(())
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label_mode
    }

    pub fn set_label_mode(&mut self, value: LabelMode) -> Result<(), DisassembleError> {
        self.check_unlocked("label_mode")?;
        self.label_mode = value;
        Ok(())
    }

    pub fn set_name_resolver(
        &mut self,
        resolver: impl NameResolver + 'static,
    ) -> Result<(), DisassembleError> {
        self.check_unlocked("name_resolver")?;
        self.name_resolver = Box::new(resolver);
        Ok(())
    }

    /// Prints exports inline on the entities they export, instead of as
    /// separate `(export ...)` fields.
    pub fn set_export_metadata(&mut self, metadata: ExportMetadata) -> Result<(), DisassembleError> {
        self.check_unlocked("export_metadata")?;
        self.export_metadata = Some(metadata);
        Ok(())
    }

    fn append(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    fn new_line(&mut self) {
        if self.add_offsets {
            self.offsets.push(self.current_position);
        }
        self.lines.push(std::mem::take(&mut self.buffer));
    }

    fn increase_indent(&mut self) {
        self.indent.push_str("  ");
        self.indent_level += 1;
    }

    fn decrease_indent(&mut self) {
        self.indent.truncate(self.indent.len().saturating_sub(2));
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn reset_module(&mut self) {
        self.types.clear();
        self.func_types.clear();
        self.func_index = 0;
        self.import_count = 0;
        self.global_count = 0;
        self.memory_count = 0;
        self.table_count = 0;
        self.event_count = 0;
        self.element_count = 0;
        self.expression.clear();
        self.backref_labels = None;
        self.label_index = 0;
        self.current_section = None;
    }

    /// Drives `reader` until it runs out of bytes (`Ok(false)`) or the last
    /// module is complete (`Ok(true)`). `offset_in_module` is added to the
    /// reader's position when recording offsets, for callers that drop
    /// consumed bytes from the front of their buffer.
    pub fn disassemble_chunk<B: AsRef<[u8]>>(
        &mut self,
        reader: &mut BinaryReader<B>,
        offset_in_module: usize,
    ) -> Result<bool, DisassembleError> {
        if self.done {
            return Err(DisassembleError::AlreadyDone);
        }
        self.started = true;

        loop {
            if !self.resuming {
                self.current_position = reader.position() + offset_in_module;
            }
            if !reader.read()? {
                self.resuming = true;
                return Ok(false);
            }
            self.resuming = false;
            if self.handle_event(reader)? {
                return Ok(true);
            }
        }
    }

    fn begin_section<B: AsRef<[u8]>>(&mut self, reader: &mut BinaryReader<B>, id: SectionCode) {
        match id {
            SectionCode::Type
            | SectionCode::Import
            | SectionCode::Export
            | SectionCode::Global
            | SectionCode::Function
            | SectionCode::Start
            | SectionCode::Code
            | SectionCode::Memory
            | SectionCode::Data
            | SectionCode::Table
            | SectionCode::Element
            | SectionCode::Event => self.current_section = Some(id),
            id => {
                debug!("skipping {id:?} section");
                reader.skip_section();
            }
        }
    }

    /// Returns `Ok(true)` once the final module has been closed.
    fn handle_event<B: AsRef<[u8]>>(&mut self, reader: &mut BinaryReader<B>) -> Result<bool, DisassembleError> {
        use BinaryReaderState as S;
        let state = reader.state();
        let section = match reader.result() {
            ReaderResult::Section(info) if state == S::BeginSection => Some(info.id),
            _ => None,
        };
        if let Some(id) = section {
            self.begin_section(reader, id);
            return Ok(false);
        }

        match (state, reader.result()) {
            (S::BeginWasm, _) => {
                self.append("(module");
                self.new_line();
            }
            (S::EndWasm, _) => {
                self.append(")");
                self.new_line();
                self.reset_module();
                if !reader.has_more_bytes() {
                    debug!("disassembly complete, {} lines pending", self.lines.len());
                    self.done = true;
                    return Ok(true);
                }
            }
            (S::EndSection, _) => self.current_section = None,

            (S::TypeSectionEntry, ReaderResult::Type(entry)) => self.print_type_entry(entry)?,
            (S::ImportSectionEntry, ReaderResult::Import(entry)) => {
                self.print_import(&entry.module, &entry.field, entry.desc)?;
            }
            (S::FunctionSectionEntry, ReaderResult::Function(entry)) => {
                self.func_types.push(entry.type_index);
            }
            (S::TableSectionEntry, ReaderResult::Table(table)) => {
                let index = self.table_count;
                self.table_count += 1;
                let name = self.name_resolver.table_name(index, false);
                self.append(&format!("  (table {name}"));
                self.print_inline_exports(ExternalKind::Table, index);
                let element_type = self.type_to_string(table.element_type);
                self.append(&format!(" {} {element_type})", limits_to_string(table.limits, false)));
                self.new_line();
            }
            (S::MemorySectionEntry, ReaderResult::Memory(memory)) => {
                let index = self.memory_count;
                self.memory_count += 1;
                let name = self.name_resolver.memory_name(index, false);
                self.append(&format!("  (memory {name}"));
                self.print_inline_exports(ExternalKind::Memory, index);
                self.append(&format!(" {}", limits_to_string(memory.limits, memory.memory64)));
                if memory.shared {
                    self.append(" shared");
                }
                self.append(")");
                self.new_line();
            }
            (S::EventSectionEntry, ReaderResult::Event(event)) => {
                let type_index = event.type_index;
                let index = self.event_count;
                self.event_count += 1;
                let name = self.name_resolver.event_name(index, false);
                self.append(&format!("  (event {name}"));
                self.print_inline_exports(ExternalKind::Event, index);
                self.print_func_type(type_index)?;
                self.append(")");
                self.new_line();
            }
            (S::ExportSectionEntry, ReaderResult::Export(entry)) => {
                if self.export_metadata.is_none() {
                    let target = match entry.kind {
                        ExternalKind::Function => format!(
                            "func {}",
                            self.function_ref(entry.index)
                        ),
                        ExternalKind::Table => {
                            format!("table {}", self.name_resolver.table_name(entry.index, true))
                        }
                        ExternalKind::Memory => {
                            format!("memory {}", self.name_resolver.memory_name(entry.index, true))
                        }
                        ExternalKind::Global => {
                            format!("global {}", self.name_resolver.global_name(entry.index, true))
                        }
                        ExternalKind::Event => {
                            format!("event {}", self.name_resolver.event_name(entry.index, true))
                        }
                    };
                    self.append(&format!("  (export {} ({target}))", format_string(&entry.field)));
                    self.new_line();
                }
            }
            (S::StartSectionEntry, ReaderResult::Start(entry)) => {
                let name = self.function_ref(entry.index);
                self.append(&format!("  (start {name})"));
                self.new_line();
            }

            (S::BeginGlobalSectionEntry, ReaderResult::Global(global)) => {
                let global_type = global.global_type;
                let index = self.global_count;
                self.global_count += 1;
                let name = self.name_resolver.global_name(index, false);
                self.append(&format!("  (global {name}"));
                self.print_inline_exports(ExternalKind::Global, index);
                let ty = self.global_type_to_string(global_type);
                self.append(&format!(" {ty}"));
            }
            (S::EndGlobalSectionEntry, _) => {
                self.append(")");
                self.new_line();
            }

            (S::BeginElementSectionEntry, ReaderResult::ElementSegment(segment)) => {
                let index = self.element_count;
                self.element_count += 1;
                let name = self.name_resolver.element_name(index, false);
                self.append(&format!("  (elem {name}"));
                match segment.mode {
                    ElementMode::Active => {
                        if let Some(table) = segment.table_index.filter(|&t| t != 0) {
                            let table = self.name_resolver.table_name(table, true);
                            self.append(&format!(" (table {table})"));
                        }
                    }
                    ElementMode::Passive => {}
                    ElementMode::Declarative => self.append(" declare"),
                }
            }
            (S::ElementSectionEntryBody, ReaderResult::ElementSegmentBody(body)) => {
                let ty = self.type_to_string(body.element_type);
                self.append(&format!(" {ty}"));
            }
            (S::EndElementSectionEntry, _) => {
                self.append(")");
                self.new_line();
            }

            (S::BeginDataSectionEntry, ReaderResult::DataSegment(segment)) => {
                self.append("  (data");
                if let Some(memory) = segment.memory_index.filter(|&m| m != 0) {
                    let memory = self.name_resolver.memory_name(memory, true);
                    self.append(&format!(" (memory {memory})"));
                }
            }
            (S::DataSectionEntryBody, ReaderResult::DataSegmentBody(body)) => {
                let data = format_string(&body.data);
                self.append(&format!(" {data}"));
            }
            (S::EndDataSectionEntry, _) => {
                self.append(")");
                self.new_line();
            }

            (S::BeginInitExpressionBody | S::BeginOffsetExpressionBody, _) => {
                self.expression.clear();
            }
            (
                S::InitExpressionOperator | S::OffsetExpressionOperator,
                ReaderResult::Operator(operator),
            ) => {
                if operator.code != OperatorCode::END {
                    self.expression.push(operator.clone());
                }
            }
            (S::EndOffsetExpressionBody, _) => {
                let expression = std::mem::take(&mut self.expression);
                if expression.len() > 1 {
                    self.append(" (offset ");
                    self.print_expression(&expression)?;
                    self.append(")");
                } else {
                    self.append(" ");
                    self.print_expression(&expression)?;
                }
            }
            (S::EndInitExpressionBody, _) => {
                let expression = std::mem::take(&mut self.expression);
                if expression.len() > 1 && self.current_section == Some(SectionCode::Element) {
                    self.append(" (item ");
                    self.print_expression(&expression)?;
                    self.append(")");
                } else {
                    self.append(" ");
                    self.print_expression(&expression)?;
                }
            }

            (S::BeginFunctionBody, ReaderResult::FunctionInformation(info)) => {
                self.print_function_header(&info.locals)?;
            }
            (S::CodeOperator, ReaderResult::Operator(operator)) => {
                self.print_code_operator(operator)?;
            }
            (S::EndFunctionBody, _) => {
                if let Some(start) = self.function_body_start.take() {
                    self.function_body_offsets.push(FunctionBodyOffset {
                        start,
                        end: self.current_position,
                    });
                }
                self.func_index += 1;
                self.backref_labels = None;
            }

            (state, _) => return Err(DisassembleError::UnexpectedState(state)),
        }
        Ok(false)
    }

    /// Disassembles everything the reader holds. Returns `None` if the
    /// module is incomplete.
    pub fn disassemble<B: AsRef<[u8]>>(
        &mut self,
        reader: &mut BinaryReader<B>,
    ) -> Result<Option<String>, DisassembleError> {
        if !self.disassemble_chunk(reader, 0)? {
            return Ok(None);
        }

        let mut lines = std::mem::take(&mut self.lines);
        let offsets = std::mem::take(&mut self.offsets);
        self.function_body_offsets.clear();
        if self.add_offsets {
            for (line, offset) in lines.iter_mut().zip(offsets) {
                line.push_str(&format!(" ;; @{offset:04x}"));
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        Ok(Some(text))
    }

    /// Drains the lines that can no longer change.
    pub fn get_result(&mut self) -> DisassemblerResult {
        let mut ready = self.lines.len();
        if self.label_mode == LabelMode::WhenUsed {
            if let Some(pending) = self
                .backref_labels
                .iter()
                .flatten()
                .find(|backref| backref.label.is_none())
            {
                ready = pending.line.min(ready);
            }
        }

        let lines: Vec<String> = self.lines.drain(..ready).collect();
        let offsets = self
            .add_offsets
            .then(|| self.offsets.drain(..ready.min(self.offsets.len())).collect());
        let function_body_offsets = self
            .add_offsets
            .then(|| std::mem::take(&mut self.function_body_offsets));

        if let Some(backrefs) = &mut self.backref_labels {
            for backref in backrefs {
                backref.line = backref.line.saturating_sub(ready);
            }
        }

        DisassemblerResult {
            lines,
            offsets,
            done: self.done && self.lines.is_empty(),
            function_body_offsets,
        }
    }

    fn function_ref(&self, index: u32) -> String {
        self.name_resolver
            .function_name(index, index < self.import_count, true)
    }

    fn print_inline_exports(&mut self, kind: ExternalKind, index: u32) {
        let Some(metadata) = &self.export_metadata else {
            return;
        };
        let clauses: String = metadata
            .export_names(kind, index)
            .iter()
            .map(|name| format!(" (export {})", format_string(name.as_bytes())))
            .collect();
        self.append(&clauses);
    }

    fn print_import(&mut self, module: &[u8], field: &[u8], desc: ImportDesc) -> Result<(), DisassembleError> {
        let import = format!(" (import {} {})", format_string(module), format_string(field));
        match desc {
            ImportDesc::Function { type_index } => {
                let index = self.func_index;
                self.func_index += 1;
                self.import_count += 1;
                self.func_types.push(type_index);
                let name = self.name_resolver.function_name(index, true, false);
                self.append(&format!("  (func {name}"));
                self.print_inline_exports(ExternalKind::Function, index);
                self.append(&import);
                self.print_func_type(type_index)?;
                self.append(")");
            }
            ImportDesc::Global(global_type) => {
                let index = self.global_count;
                self.global_count += 1;
                let name = self.name_resolver.global_name(index, false);
                self.append(&format!("  (global {name}"));
                self.print_inline_exports(ExternalKind::Global, index);
                let ty = self.global_type_to_string(global_type);
                self.append(&format!("{import} {ty})"));
            }
            ImportDesc::Memory(memory) => {
                let index = self.memory_count;
                self.memory_count += 1;
                let name = self.name_resolver.memory_name(index, false);
                self.append(&format!("  (memory {name}"));
                self.print_inline_exports(ExternalKind::Memory, index);
                let limits = limits_to_string(memory.limits, memory.memory64);
                self.append(&format!("{import} {limits}"));
                if memory.shared {
                    self.append(" shared");
                }
                self.append(")");
            }
            ImportDesc::Table(table) => {
                let index = self.table_count;
                self.table_count += 1;
                let name = self.name_resolver.table_name(index, false);
                self.append(&format!("  (table {name}"));
                self.print_inline_exports(ExternalKind::Table, index);
                let limits = limits_to_string(table.limits, false);
                let element_type = self.type_to_string(table.element_type);
                self.append(&format!("{import} {limits} {element_type})"));
            }
            ImportDesc::Event(event) => {
                let index = self.event_count;
                self.event_count += 1;
                let name = self.name_resolver.event_name(index, false);
                self.append(&format!("  (event {name}"));
                self.print_inline_exports(ExternalKind::Event, index);
                self.append(&import);
                self.print_func_type(event.type_index)?;
                self.append(")");
            }
        }
        self.new_line();
        Ok(())
    }

    fn print_type_entry(&mut self, entry: &TypeEntry) -> Result<(), DisassembleError> {
        let type_index = self.types.len() as u32;
        self.types.push(entry.clone());
        if self.skip_types {
            return Ok(());
        }

        let name = self.name_resolver.type_name(type_index, false);
        match entry {
            TypeEntry::Func(_) => {
                self.append(&format!("  (type {name} (func"));
                self.print_func_type(type_index)?;
                self.append("))");
            }
            TypeEntry::Struct(ty) => {
                self.append(&format!("  (type {name} (struct"));
                for (field_index, field) in ty.fields.iter().enumerate() {
                    let field_name =
                        self.name_resolver
                            .field_name(type_index, field_index as u32, false);
                    let field_type = self.field_type_to_string(*field);
                    self.append(&format!(" (field {field_name} {field_type})"));
                }
                self.append("))");
            }
            TypeEntry::Array(ty) => {
                let field_type = self.field_type_to_string(ty.element);
                self.append(&format!("  (type {name} (array (field {field_type})))"));
            }
        }
        self.new_line();
        Ok(())
    }

    fn func_type(&self, type_index: u32) -> Result<&FuncType, DisassembleError> {
        match self.types.get(type_index as usize) {
            Some(TypeEntry::Func(func_type)) => Ok(func_type),
            _ => Err(DisassembleError::UnknownFunctionType(type_index)),
        }
    }

    /// Appends ` (param ..) (result ..)` for a function type.
    fn print_func_type(&mut self, type_index: u32) -> Result<(), DisassembleError> {
        let func_type = self.func_type(type_index)?;
        let mut text = String::new();
        for (keyword, types) in [("param", &func_type.params), ("result", &func_type.results)] {
            if types.is_empty() {
                continue;
            }
            text.push_str(&format!(" ({keyword}"));
            for &ty in types {
                text.push(' ');
                text.push_str(&self.type_to_string(ty));
            }
            text.push(')');
        }
        self.append(&text);
        Ok(())
    }

    fn print_function_header(&mut self, locals: &[Locals]) -> Result<(), DisassembleError> {
        let func_index = self.func_index;
        let type_index = *self
            .func_types
            .get(func_index as usize)
            .ok_or(DisassembleError::UnknownFunction(func_index))?;
        let func_type = self.func_type(type_index)?.clone();

        let name = self.name_resolver.function_name(func_index, false, false);
        self.append(&format!("  (func {name}"));
        self.print_inline_exports(ExternalKind::Function, func_index);
        for (i, &param) in func_type.params.iter().enumerate() {
            let param_name = self.name_resolver.variable_name(func_index, i as u32, false);
            let ty = self.type_to_string(param);
            self.append(&format!(" (param {param_name} {ty})"));
        }
        for &result in &func_type.results {
            let ty = self.type_to_string(result);
            self.append(&format!(" (result {ty})"));
        }
        self.new_line();

        if !locals.is_empty() {
            let mut local_index = func_type.params.len() as u32;
            self.append("   ");
            for group in locals {
                let ty = self.type_to_string(group.ty);
                for _ in 0..group.count {
                    let local_name = self
                        .name_resolver
                        .variable_name(func_index, local_index, false);
                    local_index += 1;
                    self.append(&format!(" (local {local_name} {ty})"));
                }
            }
            self.new_line();
        }

        self.indent = "    ".to_string();
        self.indent_level = 0;
        self.label_index = 0;
        self.backref_labels = (self.label_mode != LabelMode::Depth).then(Vec::new);
        self.function_body_start = None;
        Ok(())
    }

    fn print_code_operator(&mut self, operator: &OperatorInformation) -> Result<(), DisassembleError> {
        if self.add_offsets && self.function_body_start.is_none() {
            self.function_body_start = Some(self.current_position);
        }

        let code = operator.code;
        if code == OperatorCode::END && self.indent_level == 0 {
            self.append("  )");
            self.new_line();
            return Ok(());
        }

        if matches!(
            code,
            OperatorCode::END
                | OperatorCode::ELSE
                | OperatorCode::CATCH
                | OperatorCode::CATCH_ALL
                | OperatorCode::UNWIND
                | OperatorCode::DELEGATE
        ) {
            self.decrease_indent();
        }
        let indent = self.indent.clone();
        self.append(&indent);
        self.print_operator(operator)?;
        self.new_line();
        if matches!(
            code,
            OperatorCode::BLOCK
                | OperatorCode::LOOP
                | OperatorCode::IF
                | OperatorCode::ELSE
                | OperatorCode::TRY
                | OperatorCode::CATCH
                | OperatorCode::CATCH_ALL
                | OperatorCode::UNWIND
        ) {
            self.increase_indent();
        }
        Ok(())
    }

    fn print_expression(&mut self, expression: &[OperatorInformation]) -> Result<(), DisassembleError> {
        for (i, operator) in expression.iter().enumerate() {
            if i > 0 {
                self.append(" ");
            }
            self.append("(");
            self.print_operator(operator)?;
            self.append(")");
        }
        Ok(())
    }

    /// Resolves branch depth `depth`, naming the target block on first use.
    /// `extra` counts enclosing blocks that are still on the label stack but
    /// are not visible from the branch.
    fn use_label(&mut self, depth: u32, extra: usize) -> String {
        let Some(backrefs) = &mut self.backref_labels else {
            return depth.to_string();
        };
        let Some(i) = backrefs
            .len()
            .checked_sub(depth as usize + 1 + extra)
        else {
            return depth.to_string();
        };

        let backref = &mut backrefs[i];
        if let Some(label) = &backref.label {
            return label.clone();
        }
        let label = self.name_resolver.label(self.label_index);
        self.label_index += 1;
        backref.label = Some(label.clone());
        if let Some(line) = self.lines.get_mut(backref.line) {
            line.insert_str(backref.position, &format!(" {label}"));
        }
        label
    }

    fn push_block_label(&mut self) {
        let line = self.lines.len();
        let position = self.buffer.len();
        let label = if self.label_mode == LabelMode::Always {
            let label = self.name_resolver.label(self.label_index);
            self.label_index += 1;
            self.append(&format!(" {label}"));
            Some(label)
        } else {
            None
        };
        if let Some(backrefs) = &mut self.backref_labels {
            backrefs.push(BackrefLabel {
                line,
                position,
                label,
            });
        }
    }

    fn print_operator(&mut self, operator: &OperatorInformation) -> Result<(), DisassembleError> {
        let code = operator.code;
        self.append(&code.to_string());

        match &operator.immediates {
            Immediates::None => {
                if code == OperatorCode::END {
                    let closed = self.backref_labels.as_mut().and_then(Vec::pop);
                    if let Some(label) = closed.and_then(|backref| backref.label) {
                        self.append(&format!(" {label}"));
                    }
                }
            }
            Immediates::Block(block_type) => {
                if self.backref_labels.is_some() {
                    self.push_block_label();
                }
                self.print_block_type(*block_type)?;
            }
            Immediates::BranchDepth(depth) => {
                let label = self.use_label(*depth, 0);
                self.append(&format!(" {label}"));
            }
            Immediates::BranchTable { targets, default } => {
                let mut text = String::new();
                for &depth in targets.iter().chain(std::iter::once(default)) {
                    text.push(' ');
                    text.push_str(&self.use_label(depth, 0));
                }
                self.append(&text);
            }
            Immediates::RelativeDepth(depth) => {
                if code == OperatorCode::DELEGATE {
                    // the try being closed is still on the label stack
                    let label = self.use_label(*depth, 1);
                    if let Some(backrefs) = &mut self.backref_labels {
                        backrefs.pop();
                    }
                    self.append(&format!(" {label}"));
                } else {
                    let label = self.use_label(*depth, 0);
                    self.append(&format!(" {label}"));
                }
            }
            Immediates::Function(index) => {
                let name = self.function_ref(*index);
                self.append(&format!(" {name}"));
            }
            Immediates::CallIndirect {
                type_index,
                table_index,
            } => {
                if *table_index != 0 {
                    let table = self.name_resolver.table_name(*table_index, true);
                    self.append(&format!(" {table}"));
                }
                self.print_func_type(*type_index)?;
            }
            Immediates::Local(index) => {
                let name = self.name_resolver.variable_name(self.func_index, *index, true);
                self.append(&format!(" {name}"));
            }
            Immediates::Global(index) => {
                let name = self.name_resolver.global_name(*index, true);
                self.append(&format!(" {name}"));
            }
            Immediates::Table(index) => {
                let name = self.name_resolver.table_name(*index, true);
                self.append(&format!(" {name}"));
            }
            Immediates::Event(index) => {
                let name = self.name_resolver.event_name(*index, true);
                self.append(&format!(" {name}"));
            }
            Immediates::HeapType(heap) => {
                let heap = self.heap_type_to_string(*heap);
                self.append(&format!(" {heap}"));
            }
            Immediates::SelectTypes(types) => {
                let types: Vec<String> = types.iter().map(|&ty| self.type_to_string(ty)).collect();
                self.append(&format!(" (result {})", types.join(" ")));
            }
            Immediates::Memory(address) => self.print_memory_address(code, *address)?,
            Immediates::MemoryLane { address, lane } => {
                self.print_memory_address(code, *address)?;
                self.append(&format!(" {lane}"));
            }
            Immediates::MemoryIndex(index) => {
                if *index != 0 {
                    let name = self.name_resolver.memory_name(*index, true);
                    self.append(&format!(" {name}"));
                }
            }
            Immediates::MemoryCopy {
                destination,
                source,
            } => {
                if *destination != 0 || *source != 0 {
                    let destination = self.name_resolver.memory_name(*destination, true);
                    let source = self.name_resolver.memory_name(*source, true);
                    self.append(&format!(" {destination} {source}"));
                }
            }
            Immediates::MemoryInit { segment, memory } => {
                if *memory != 0 {
                    let memory = self.name_resolver.memory_name(*memory, true);
                    self.append(&format!(" {memory}"));
                }
                self.append(&format!(" {segment}"));
            }
            Immediates::DataSegment(segment) => self.append(&format!(" {segment}")),
            Immediates::ElementSegment(segment) => {
                let name = self.name_resolver.element_name(*segment, true);
                self.append(&format!(" {name}"));
            }
            Immediates::TableInit { segment, table } => {
                let table = self.name_resolver.table_name(*table, true);
                let segment = self.name_resolver.element_name(*segment, true);
                self.append(&format!(" {table} {segment}"));
            }
            Immediates::TableCopy {
                destination,
                source,
            } => {
                let destination = self.name_resolver.table_name(*destination, true);
                let source = self.name_resolver.table_name(*source, true);
                self.append(&format!(" {destination} {source}"));
            }
            Immediates::I32(value) => self.append(&format!(" {value}")),
            Immediates::I64(value) => self.append(&format!(" {value}")),
            Immediates::F32(bits) => self.append(&format!(" {}", format_f32(*bits))),
            Immediates::F64(bits) => self.append(&format!(" {}", format_f64(*bits))),
            Immediates::V128(bytes) => self.append(&format!(" {}", format_v128(bytes))),
            Immediates::Shuffle(lanes) => {
                let lanes: Vec<String> = lanes.iter().map(u8::to_string).collect();
                self.append(&format!(" {}", lanes.join(" ")));
            }
            Immediates::Lane(lane) => self.append(&format!(" {lane}")),
            Immediates::Type(index) => {
                let name = self.name_resolver.type_name(*index, true);
                self.append(&format!(" {name}"));
            }
            Immediates::Field {
                type_index,
                field_index,
            } => {
                let type_name = self.name_resolver.type_name(*type_index, true);
                let field_name = self
                    .name_resolver
                    .field_name(*type_index, *field_index, true);
                self.append(&format!(" {type_name} {field_name}"));
            }
            Immediates::TypePair {
                destination,
                source,
            } => {
                let destination = self.name_resolver.type_name(*destination, true);
                let source = self.name_resolver.type_name(*source, true);
                self.append(&format!(" {destination} {source}"));
            }
        }
        Ok(())
    }

    fn print_block_type(&mut self, block_type: BlockType) -> Result<(), DisassembleError> {
        match block_type {
            BlockType::Empty => Ok(()),
            BlockType::FuncType(index) => self.print_func_type(index),
            BlockType::Value(ty) => {
                let ty = self.type_to_string(ty);
                self.append(&format!(" (result {ty})"));
                Ok(())
            }
        }
    }

    fn print_memory_address(&mut self, code: OperatorCode, address: MemoryAddress) -> Result<(), DisassembleError> {
        if address.memory_index != 0 {
            let name = self.name_resolver.memory_name(address.memory_index, true);
            self.append(&format!(" {name}"));
        }
        if address.offset != 0 {
            self.append(&format!(" offset={}", address.offset));
        }
        if code.natural_alignment() != Some(address.flags) {
            let align = 1u64
                .checked_shl(address.flags)
                .ok_or(DisassembleError::BadAlignment(address.flags))?;
            self.append(&format!(" align={align}"));
        }
        Ok(())
    }

    fn heap_type_to_string(&self, heap: HeapType) -> String {
        match heap {
            HeapType::Func => "func".to_string(),
            HeapType::Extern => "extern".to_string(),
            HeapType::Any => "any".to_string(),
            HeapType::Eq => "eq".to_string(),
            HeapType::I31 => "i31".to_string(),
            HeapType::Data => "data".to_string(),
            HeapType::Index(index) => self.name_resolver.type_name(index, true),
        }
    }

    fn type_to_string(&self, ty: Type) -> String {
        let name = match ty {
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::V128 => "v128",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::FuncRef => "funcref",
            Type::ExternRef => "externref",
            Type::AnyRef => "anyref",
            Type::EqRef => "eqref",
            Type::I31Ref => "i31ref",
            Type::DataRef => "dataref",
            Type::Ref { nullable, heap } => {
                let null = if nullable { "null " } else { "" };
                return format!("(ref {null}{})", self.heap_type_to_string(heap));
            }
            Type::Rtt { depth, heap } => {
                let heap = self.heap_type_to_string(heap);
                return match depth {
                    Some(depth) => format!("(rtt {depth} {heap})"),
                    None => format!("(rtt {heap})"),
                };
            }
        };
        name.to_string()
    }

    fn field_type_to_string(&self, field: FieldType) -> String {
        let storage = self.type_to_string(field.storage);
        if field.mutable {
            format!("(mut {storage})")
        } else {
            storage
        }
    }

    fn global_type_to_string(&self, global: GlobalType) -> String {
        let content = self.type_to_string(global.content_type);
        if global.mutable {
            format!("(mut {content})")
        } else {
            content
        }
    }
}

fn limits_to_string(limits: Limits, memory64: bool) -> String {
    let index_type = if memory64 { "i64 " } else { "" };
    match limits.maximum {
        Some(maximum) => format!("{index_type}{} {maximum}", limits.initial),
        None => format!("{index_type}{}", limits.initial),
    }
}
