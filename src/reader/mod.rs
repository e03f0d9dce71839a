//! An incremental, pull-based decoder for the WebAssembly binary format.
//!
//! The caller owns the bytes and hands the reader a view of them with
//! [`BinaryReader::set_data`]. Each [`BinaryReader::read`] performs one step
//! of the state machine: it either produces one event (`Ok(true)`), asks for
//! more bytes (`Ok(false)`), or fails for good (`Err`). A step that runs out
//! of bytes leaves the position where it started, so it can be retried
//! once the view has been extended.
//!
//! ```
//! use wadis::reader::{BinaryReader, BinaryReaderState};
//!
//! let bytes = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
//! let mut reader = BinaryReader::new();
//! reader.set_data(&bytes[..], 0, bytes.len(), true);
//!
//! assert!(reader.read()?);
//! assert_eq!(reader.state(), BinaryReaderState::BeginWasm);
//! assert!(reader.read()?);
//! assert_eq!(reader.state(), BinaryReaderState::EndWasm);
//! assert!(!reader.read()?);
//! # Ok::<(), wadis::reader::DecodeError>(())
//! ```
mod error;
mod result;
mod state;

pub use error::DecodeError;
pub(crate) use error::ReadFailure;
pub use result::*;
pub use state::BinaryReaderState;

use crate::integer;
use crate::opcode::OperatorCode;
use crate::types::{
    ArrayType, BlockType, EventType, ExternalKind, FieldType, FromMarkerByte, FuncType,
    GlobalType, HeapType, Limits, LinkingType, MemoryType, NameType, RelocType, SectionCode,
    StructType, TableType, Type, TypeEntry,
};
use log::{debug, trace};

pub const WASM_MAGIC_NUMBER: u32 = 0x6d73_6100;
pub const WASM_SUPPORTED_VERSION: u32 = 0x1;
pub const WASM_SUPPORTED_EXPERIMENTAL_VERSION: u32 = 0xd;

/// A byte range relative to the start of the current view. It is moved
/// along whenever the caller rebases the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DataRange {
    start: isize,
    end: isize,
}

impl DataRange {
    fn new(start: usize, end: usize) -> Self {
        DataRange {
            start: start as isize,
            end: end as isize,
        }
    }

    fn offset(&mut self, delta: isize) {
        self.start += delta;
        self.end += delta;
    }
}

enum Step {
    /// `state` and `result` describe a new event.
    Event,
    /// Internal bookkeeping was committed; run the next step right away.
    Continue,
    /// Nothing more to do until the caller supplies more bytes.
    Suspend,
}

pub struct BinaryReader<B = Vec<u8>> {
    data: Option<B>,
    pos: usize,
    length: usize,
    eof: bool,
    state: BinaryReaderState,
    result: ReaderResult,
    error: Option<DecodeError>,
    section_id: Option<SectionCode>,
    section_range: Option<DataRange>,
    function_range: Option<DataRange>,
    section_entries_left: u32,
    element_flags: u32,
    element_items_left: u32,
    data_flags: u32,
}

impl<B: AsRef<[u8]>> Default for BinaryReader<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AsRef<[u8]>> BinaryReader<B> {
    pub fn new() -> Self {
        BinaryReader {
            data: None,
            pos: 0,
            length: 0,
            eof: false,
            state: BinaryReaderState::Initial,
            result: ReaderResult::None,
            error: None,
            section_id: None,
            section_range: None,
            function_range: None,
            section_entries_left: 0,
            element_flags: 0,
            element_items_left: 0,
            data_flags: 0,
        }
    }

    /// Installs a new view: `data[..length]` with the cursor at `pos`. Ranges
    /// recorded for the current section and function body are shifted by the
    /// difference between `pos` and the old position, so a caller may drop
    /// consumed bytes from the front of its buffer between calls.
    pub fn set_data(&mut self, data: B, pos: usize, length: usize, eof: bool) {
        let delta = pos as isize - self.pos as isize;
        let length = length.min(data.as_ref().len());
        self.data = Some(data);
        self.pos = pos;
        self.length = length;
        self.eof = eof;
        if let Some(range) = &mut self.section_range {
            range.offset(delta);
        }
        if let Some(range) = &mut self.function_range {
            range.offset(delta);
        }
    }

    pub fn data(&self) -> Option<&B> {
        self.data.as_ref()
    }

    /// Takes the current view back, e.g. to drop consumed bytes before
    /// handing it to [`set_data`](Self::set_data) again.
    pub fn take_data(&mut self) -> Option<B> {
        self.data.take()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn state(&self) -> BinaryReaderState {
        self.state
    }

    pub fn result(&self) -> &ReaderResult {
        &self.result
    }

    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// The section currently being read, if any.
    pub fn current_section(&self) -> Option<SectionCode> {
        self.section_id
    }

    pub fn has_more_bytes(&self) -> bool {
        self.pos < self.length
    }

    /// Advances the state machine by one event.
    ///
    /// Returns `Ok(false)` when the view ends before the next event is
    /// complete; the position is then unchanged and the call can be repeated
    /// after [`set_data`](Self::set_data). After an `Err`, the reader stays in
    /// [`BinaryReaderState::Error`] and keeps returning the same error.
    pub fn read(&mut self) -> Result<bool, DecodeError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        loop {
            let checkpoint = self.pos;
            match self.step() {
                Ok(Step::Event) => return Ok(true),
                Ok(Step::Continue) => {}
                Ok(Step::Suspend) => return Ok(false),
                Err(ReadFailure::NeedMoreData) => {
                    self.pos = checkpoint;
                    return Ok(false);
                }
                Err(ReadFailure::Malformed(err)) => {
                    debug!("malformed module at byte {checkpoint}: {err}");
                    self.state = BinaryReaderState::Error;
                    self.result = ReaderResult::None;
                    self.error = Some(err.clone());
                    return Err(err);
                }
            }
        }
    }

    /// Fast-forwards past the rest of the current section. The next `read()`
    /// reports [`BinaryReaderState::EndSection`] once the whole section is in
    /// the view.
    pub fn skip_section(&mut self) {
        use BinaryReaderState as S;
        if matches!(
            self.state,
            S::Error | S::Initial | S::EndSection | S::BeginWasm | S::EndWasm
        ) {
            return;
        }
        self.begin_skipping_section();
    }

    /// Fast-forwards past the operators of the current function body.
    pub fn skip_function_body(&mut self) {
        if matches!(
            self.state,
            BinaryReaderState::BeginFunctionBody | BinaryReaderState::CodeOperator
        ) {
            self.state = BinaryReaderState::SkippingFunctionBody;
        }
    }

    /// Reads through the rest of an init expression, stopping at
    /// [`BinaryReaderState::EndInitExpressionBody`].
    pub fn skip_init_expression(&mut self) -> Result<bool, DecodeError> {
        while matches!(
            self.state,
            BinaryReaderState::BeginInitExpressionBody | BinaryReaderState::InitExpressionOperator
        ) {
            if !self.read()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Requests the payload of the section that was just entered as a single
    /// [`ReaderResult::RawData`] instead of decoded entries.
    pub fn fetch_section_raw_data(&mut self) -> Result<(), DecodeError> {
        if self.state != BinaryReaderState::BeginSection {
            return Err(DecodeError::UnexpectedState(self.state));
        }
        self.state = BinaryReaderState::ReadingSectionRawData;
        Ok(())
    }

    fn step(&mut self) -> Result<Step, ReadFailure> {
        use BinaryReaderState as S;
        match self.state {
            S::Error => Ok(Step::Suspend),
            S::Initial => self.read_module_header(),
            S::BeginWasm | S::EndSection => self.read_section_header(),
            S::EndWasm => Ok(self.finish_module()),
            S::BeginSection => self.read_section_body(),
            S::SkippingSection => self.skip_to_section_end(),
            S::ReadingSectionRawData => self.read_section_raw_data(),
            S::SectionRawData | S::StartSectionEntry | S::DataCountSectionEntry | S::SourceMappingUrl => {
                self.begin_skipping_section();
                Ok(Step::Continue)
            }

            S::TypeSectionEntry => self.read_section_entry(S::TypeSectionEntry, Self::read_type_entry),
            S::ImportSectionEntry => {
                self.read_section_entry(S::ImportSectionEntry, Self::read_import_entry)
            }
            S::FunctionSectionEntry => {
                self.read_section_entry(S::FunctionSectionEntry, Self::read_function_entry)
            }
            S::TableSectionEntry => self.read_section_entry(S::TableSectionEntry, |r| {
                Ok(ReaderResult::Table(r.read_table_type()?))
            }),
            S::MemorySectionEntry => self.read_section_entry(S::MemorySectionEntry, |r| {
                Ok(ReaderResult::Memory(r.read_memory_type()?))
            }),
            S::EventSectionEntry => self.read_section_entry(S::EventSectionEntry, |r| {
                Ok(ReaderResult::Event(r.read_event_type()?))
            }),
            S::ExportSectionEntry => {
                self.read_section_entry(S::ExportSectionEntry, Self::read_export_entry)
            }
            S::LinkingSectionEntry => {
                self.read_section_entry(S::LinkingSectionEntry, Self::read_linking_entry)
            }
            S::RelocSectionHeader => {
                self.section_entries_left = self.read_var_u32()?;
                self.state = S::RelocSectionEntry;
                self.result = ReaderResult::None;
                Ok(Step::Continue)
            }
            S::RelocSectionEntry => {
                self.read_section_entry(S::RelocSectionEntry, Self::read_reloc_entry)
            }
            S::NameSectionEntry => self.read_name_entry(),

            S::GlobalSectionEntry | S::EndGlobalSectionEntry => self.read_global_entry(),
            S::BeginGlobalSectionEntry => self.emit(S::BeginInitExpressionBody, ReaderResult::None),

            S::BeginInitExpressionBody => self.read_init_expression_operator(),
            S::InitExpressionOperator if self.result_is_end_operator() => {
                self.emit(S::EndInitExpressionBody, ReaderResult::None)
            }
            S::InitExpressionOperator => self.read_init_expression_operator(),
            S::EndInitExpressionBody => self.end_init_expression(),

            S::BeginOffsetExpressionBody => self.read_offset_expression_operator(),
            S::OffsetExpressionOperator if self.result_is_end_operator() => {
                self.emit(S::EndOffsetExpressionBody, ReaderResult::None)
            }
            S::OffsetExpressionOperator => self.read_offset_expression_operator(),
            S::EndOffsetExpressionBody => match self.section_id {
                Some(SectionCode::Element) => self.read_element_body(),
                Some(SectionCode::Data) => self.read_data_body(),
                _ => Err(DecodeError::UnexpectedState(self.state).into()),
            },

            S::ElementSectionEntry | S::EndElementSectionEntry => self.read_element_entry(),
            S::BeginElementSectionEntry if self.element_flags & 0b001 == 0 => {
                self.emit(S::BeginOffsetExpressionBody, ReaderResult::None)
            }
            S::BeginElementSectionEntry => self.read_element_body(),
            S::ElementSectionEntryBody => self.next_element_item(),

            S::DataSectionEntry | S::EndDataSectionEntry => self.read_data_entry(),
            S::BeginDataSectionEntry if self.data_flags == 1 => self.read_data_body(),
            S::BeginDataSectionEntry => self.emit(S::BeginOffsetExpressionBody, ReaderResult::None),
            S::DataSectionEntryBody => self.emit(S::EndDataSectionEntry, ReaderResult::None),

            S::ReadingFunctionHeader | S::EndFunctionBody => self.read_function_header(),
            S::BeginFunctionBody | S::CodeOperator => self.read_code_operator(),
            S::SkippingFunctionBody => self.skip_to_function_end(),
        }
    }

    fn emit(&mut self, state: BinaryReaderState, result: ReaderResult) -> Result<Step, ReadFailure> {
        self.state = state;
        self.result = result;
        Ok(Step::Event)
    }

    fn result_is_end_operator(&self) -> bool {
        matches!(&self.result, ReaderResult::Operator(op) if op.code == OperatorCode::END)
    }

    fn read_module_header(&mut self) -> Result<Step, ReadFailure> {
        let magic_number = self.read_u32_le()?;
        if magic_number != WASM_MAGIC_NUMBER {
            return Err(DecodeError::BadMagicNumber(magic_number).into());
        }
        let version = self.read_u32_le()?;
        if version != WASM_SUPPORTED_VERSION && version != WASM_SUPPORTED_EXPERIMENTAL_VERSION {
            return Err(DecodeError::BadVersion(version).into());
        }
        self.emit(
            BinaryReaderState::BeginWasm,
            ReaderResult::ModuleHeader(ModuleHeader {
                magic_number,
                version,
            }),
        )
    }

    fn read_section_header(&mut self) -> Result<Step, ReadFailure> {
        if self.pos >= self.length && self.eof {
            return self.end_module();
        }
        // a module concatenated right after this one
        if self.pos + 4 < self.length && self.peek_u32_le() == Some(WASM_MAGIC_NUMBER) {
            return self.end_module();
        }

        let id = SectionCode::from_marker(self.read_u8()?)?;
        let payload_length = self.read_var_u32()? as usize;
        let payload_end = self.pos + payload_length;
        let name = match id {
            SectionCode::Custom => Some(self.read_string_bytes()?),
            _ => None,
        };

        trace!("section {id:?} at {}..{payload_end}", self.pos);
        self.section_id = Some(id);
        self.section_range = Some(DataRange::new(self.pos, payload_end));
        self.emit(
            BinaryReaderState::BeginSection,
            ReaderResult::Section(SectionInformation { id, name }),
        )
    }

    fn end_module(&mut self) -> Result<Step, ReadFailure> {
        self.section_id = None;
        self.section_range = None;
        self.function_range = None;
        self.emit(BinaryReaderState::EndWasm, ReaderResult::None)
    }

    fn finish_module(&mut self) -> Step {
        self.result = ReaderResult::None;
        if self.has_more_bytes() {
            self.state = BinaryReaderState::Initial;
            Step::Continue
        } else {
            self.state = BinaryReaderState::BeginWasm;
            Step::Suspend
        }
    }

    fn read_section_body(&mut self) -> Result<Step, ReadFailure> {
        use BinaryReaderState as S;
        let Some(id) = self.section_id else {
            return Err(DecodeError::UnexpectedState(self.state).into());
        };
        if self.pos >= self.section_end()? {
            return self.end_section();
        }

        let entries_state = match id {
            SectionCode::Type => S::TypeSectionEntry,
            SectionCode::Import => S::ImportSectionEntry,
            SectionCode::Function => S::FunctionSectionEntry,
            SectionCode::Table => S::TableSectionEntry,
            SectionCode::Memory => S::MemorySectionEntry,
            SectionCode::Export => S::ExportSectionEntry,
            SectionCode::Event => S::EventSectionEntry,
            SectionCode::Global => S::GlobalSectionEntry,
            SectionCode::Element => S::ElementSectionEntry,
            SectionCode::Data => S::DataSectionEntry,
            SectionCode::Code => S::ReadingFunctionHeader,
            SectionCode::Start => {
                self.require_section_payload()?;
                let index = self.read_var_u32()?;
                return self.emit(S::StartSectionEntry, ReaderResult::Start(StartEntry { index }));
            }
            SectionCode::DataCount => {
                self.require_section_payload()?;
                let count = self.read_var_u32()?;
                return self.emit(S::DataCountSectionEntry, ReaderResult::DataCount(count));
            }
            SectionCode::Custom => return self.read_custom_section_body(),
        };

        // entries of these sections are small; wait for the whole payload
        // rather than resuming halfway through one
        if !matches!(
            id,
            SectionCode::Global | SectionCode::Element | SectionCode::Data | SectionCode::Code
        ) {
            self.require_section_payload()?;
        }

        self.section_entries_left = self.read_var_u32()?;
        self.state = entries_state;
        self.result = ReaderResult::None;
        Ok(Step::Continue)
    }

    fn read_custom_section_body(&mut self) -> Result<Step, ReadFailure> {
        let name = match &self.result {
            ReaderResult::Section(SectionInformation {
                name: Some(name), ..
            }) => name.clone(),
            _ => Vec::new(),
        };

        match name.as_slice() {
            b"name" => {
                self.state = BinaryReaderState::NameSectionEntry;
                self.result = ReaderResult::None;
                Ok(Step::Continue)
            }
            b"linking" => {
                self.section_entries_left = self.read_var_u32()?;
                self.state = BinaryReaderState::LinkingSectionEntry;
                self.result = ReaderResult::None;
                Ok(Step::Continue)
            }
            b"sourceMappingURL" => {
                let url = self.read_string_bytes()?;
                self.emit(
                    BinaryReaderState::SourceMappingUrl,
                    ReaderResult::SourceMappingUrl(SourceMappingUrl { url }),
                )
            }
            n if n.starts_with(b"reloc.") => {
                let id = SectionCode::from_marker(self.read_u8()?)?;
                let name = match id {
                    SectionCode::Custom => Some(self.read_string_bytes()?),
                    _ => None,
                };
                self.emit(
                    BinaryReaderState::RelocSectionHeader,
                    ReaderResult::RelocHeader(RelocHeader { id, name }),
                )
            }
            _ => self.read_section_raw_data(),
        }
    }

    fn read_section_raw_data(&mut self) -> Result<Step, ReadFailure> {
        self.require_section_payload()?;
        let end = self.section_end()?;
        let data = self.read_bytes(end.saturating_sub(self.pos))?;
        self.emit(BinaryReaderState::SectionRawData, ReaderResult::RawData(data))
    }

    fn begin_skipping_section(&mut self) {
        self.state = BinaryReaderState::SkippingSection;
        self.result = ReaderResult::None;
    }

    fn skip_to_section_end(&mut self) -> Result<Step, ReadFailure> {
        self.require_section_payload()?;
        self.pos = self.section_end()?;
        trace!("skipped to end of section {:?} at {}", self.section_id, self.pos);
        self.end_section()
    }

    fn end_section(&mut self) -> Result<Step, ReadFailure> {
        self.section_id = None;
        self.section_range = None;
        self.function_range = None;
        self.emit(BinaryReaderState::EndSection, ReaderResult::None)
    }

    fn section_end(&self) -> Result<usize, ReadFailure> {
        self.section_range
            .and_then(|range| usize::try_from(range.end).ok())
            .ok_or_else(|| DecodeError::UnexpectedState(self.state).into())
    }

    fn require_section_payload(&self) -> Result<(), ReadFailure> {
        if self.section_end()? > self.length {
            return Err(ReadFailure::NeedMoreData);
        }
        Ok(())
    }

    fn read_section_entry(
        &mut self,
        state: BinaryReaderState,
        read_entry: fn(&mut Self) -> Result<ReaderResult, ReadFailure>,
    ) -> Result<Step, ReadFailure> {
        if self.section_entries_left == 0 {
            self.begin_skipping_section();
            return Ok(Step::Continue);
        }
        let result = read_entry(self)?;
        self.section_entries_left -= 1;
        self.emit(state, result)
    }

    fn read_type_entry(&mut self) -> Result<ReaderResult, ReadFailure> {
        let entry = match self.read_u8()? {
            0x60 => {
                let params = self.read_vec(Self::read_type)?;
                let results = self.read_vec(Self::read_type)?;
                TypeEntry::Func(FuncType { params, results })
            }
            0x5f => TypeEntry::Struct(StructType {
                fields: self.read_vec(Self::read_field_type)?,
            }),
            0x5e => TypeEntry::Array(ArrayType {
                element: self.read_field_type()?,
            }),
            form => return Err(DecodeError::UnknownTypeForm(form).into()),
        };
        Ok(ReaderResult::Type(entry))
    }

    fn read_field_type(&mut self) -> Result<FieldType, ReadFailure> {
        let storage = self.read_type()?;
        let mutable = self.read_u8()? != 0;
        Ok(FieldType { storage, mutable })
    }

    fn read_import_entry(&mut self) -> Result<ReaderResult, ReadFailure> {
        let module = self.read_string_bytes()?;
        let field = self.read_string_bytes()?;
        let desc = match ExternalKind::from_marker(self.read_u8()?)? {
            ExternalKind::Function => ImportDesc::Function {
                type_index: self.read_var_u32()?,
            },
            ExternalKind::Table => ImportDesc::Table(self.read_table_type()?),
            ExternalKind::Memory => ImportDesc::Memory(self.read_memory_type()?),
            ExternalKind::Global => ImportDesc::Global(self.read_global_type()?),
            ExternalKind::Event => ImportDesc::Event(self.read_event_type()?),
        };
        Ok(ReaderResult::Import(ImportEntry {
            module,
            field,
            desc,
        }))
    }

    fn read_export_entry(&mut self) -> Result<ReaderResult, ReadFailure> {
        let field = self.read_string_bytes()?;
        let kind = ExternalKind::from_marker(self.read_u8()?)?;
        let index = self.read_var_u32()?;
        Ok(ReaderResult::Export(ExportEntry { field, kind, index }))
    }

    fn read_function_entry(&mut self) -> Result<ReaderResult, ReadFailure> {
        Ok(ReaderResult::Function(FunctionEntry {
            type_index: self.read_var_u32()?,
        }))
    }

    fn read_linking_entry(&mut self) -> Result<ReaderResult, ReadFailure> {
        let ty = match self.read_var_u32()? {
            1 => LinkingType::StackPointer,
            other => return Err(DecodeError::BadLinkingType(other).into()),
        };
        let index = self.read_var_u32()?;
        Ok(ReaderResult::Linking(LinkingEntry { ty, index }))
    }

    fn read_reloc_entry(&mut self) -> Result<ReaderResult, ReadFailure> {
        let ty = RelocType::from_marker(self.read_u8()?)?;
        let offset = self.read_var_u32()?;
        let index = self.read_var_u32()?;
        let addend = if ty.has_addend() {
            Some(self.read_var_i32()?)
        } else {
            None
        };
        Ok(ReaderResult::RelocEntry(RelocEntry {
            ty,
            offset,
            index,
            addend,
        }))
    }

    fn read_name_entry(&mut self) -> Result<Step, ReadFailure> {
        loop {
            if self.pos >= self.section_end()? {
                self.begin_skipping_section();
                return Ok(Step::Continue);
            }

            let ty = self.read_u8()?;
            let payload_length = self.read_var_u32()? as usize;
            let end = self.pos + payload_length;
            if end > self.length {
                return Err(ReadFailure::NeedMoreData);
            }

            let Ok(kind) = NameType::from_marker(ty) else {
                trace!("skipping unknown name subsection {ty:#04x}");
                self.pos = end;
                continue;
            };
            let entry = match kind {
                NameType::Module => NameEntry::Module(self.read_string_bytes()?),
                NameType::Local | NameType::Label | NameType::Field => NameEntry::IndirectMap {
                    kind,
                    groups: self.read_vec(Self::read_indirect_naming)?,
                },
                _ => NameEntry::Map {
                    kind,
                    names: self.read_vec(Self::read_naming)?,
                },
            };
            self.pos = end;
            return self.emit(BinaryReaderState::NameSectionEntry, ReaderResult::Name(entry));
        }
    }

    fn read_naming(&mut self) -> Result<Naming, ReadFailure> {
        let index = self.read_var_u32()?;
        let name = self.read_string_bytes()?;
        Ok(Naming { index, name })
    }

    fn read_indirect_naming(&mut self) -> Result<IndirectNaming, ReadFailure> {
        let index = self.read_var_u32()?;
        let names = self.read_vec(Self::read_naming)?;
        Ok(IndirectNaming { index, names })
    }

    fn read_global_entry(&mut self) -> Result<Step, ReadFailure> {
        if self.section_entries_left == 0 {
            self.begin_skipping_section();
            return Ok(Step::Continue);
        }
        let global_type = self.read_global_type()?;
        self.section_entries_left -= 1;
        self.emit(
            BinaryReaderState::BeginGlobalSectionEntry,
            ReaderResult::Global(GlobalVariable { global_type }),
        )
    }

    fn read_init_expression_operator(&mut self) -> Result<Step, ReadFailure> {
        let function_index_items =
            self.section_id == Some(SectionCode::Element) && self.element_flags & 0b100 == 0;

        let operator = if !function_index_items {
            self.read_operator()?
        } else if self.state == BinaryReaderState::BeginInitExpressionBody {
            // items given as bare function indices read as `ref.func N`
            let index = self.read_var_u32()?;
            OperatorInformation::new(OperatorCode::REF_FUNC, Immediates::Function(index))
        } else {
            OperatorInformation::new(OperatorCode::END, Immediates::None)
        };
        self.emit(
            BinaryReaderState::InitExpressionOperator,
            ReaderResult::Operator(operator),
        )
    }

    fn end_init_expression(&mut self) -> Result<Step, ReadFailure> {
        match self.section_id {
            Some(SectionCode::Global) => {
                self.emit(BinaryReaderState::EndGlobalSectionEntry, ReaderResult::None)
            }
            Some(SectionCode::Element) => self.next_element_item(),
            _ => Err(DecodeError::UnexpectedState(self.state).into()),
        }
    }

    fn read_offset_expression_operator(&mut self) -> Result<Step, ReadFailure> {
        let operator = self.read_operator()?;
        self.emit(
            BinaryReaderState::OffsetExpressionOperator,
            ReaderResult::Operator(operator),
        )
    }

    fn read_element_entry(&mut self) -> Result<Step, ReadFailure> {
        if self.section_entries_left == 0 {
            self.begin_skipping_section();
            return Ok(Step::Continue);
        }

        // bit 0: passive or declarative, bit 1: explicit table index (active)
        // or declarative (otherwise), bit 2: items are expressions
        let flags = self.read_var_u32()?;
        if flags > 0b111 {
            return Err(DecodeError::BadElementSegmentFlags(flags).into());
        }
        let (mode, table_index) = if flags & 0b001 == 0 {
            let table_index = if flags & 0b010 != 0 {
                self.read_var_u32()?
            } else {
                0
            };
            (ElementMode::Active, Some(table_index))
        } else if flags & 0b010 == 0 {
            (ElementMode::Passive, None)
        } else {
            (ElementMode::Declarative, None)
        };

        self.element_flags = flags;
        self.section_entries_left -= 1;
        self.emit(
            BinaryReaderState::BeginElementSectionEntry,
            ReaderResult::ElementSegment(ElementSegment { mode, table_index }),
        )
    }

    fn read_element_body(&mut self) -> Result<Step, ReadFailure> {
        let flags = self.element_flags;
        let element_type = if flags & 0b011 == 0 {
            Type::FuncRef
        } else if flags & 0b100 == 0 {
            match self.read_u8()? {
                0x00 => Type::FuncRef,
                kind => return Err(DecodeError::BadElementKind(kind).into()),
            }
        } else {
            self.read_type()?
        };
        let items = self.read_var_u32()?;

        self.element_items_left = items;
        self.emit(
            BinaryReaderState::ElementSectionEntryBody,
            ReaderResult::ElementSegmentBody(ElementSegmentBody { element_type }),
        )
    }

    fn next_element_item(&mut self) -> Result<Step, ReadFailure> {
        if self.element_items_left == 0 {
            return self.emit(BinaryReaderState::EndElementSectionEntry, ReaderResult::None);
        }
        self.element_items_left -= 1;
        self.emit(BinaryReaderState::BeginInitExpressionBody, ReaderResult::None)
    }

    fn read_data_entry(&mut self) -> Result<Step, ReadFailure> {
        if self.section_entries_left == 0 {
            self.begin_skipping_section();
            return Ok(Step::Continue);
        }

        let flags = self.read_var_u32()?;
        let (mode, memory_index) = match flags {
            0 => (DataMode::Active, Some(0)),
            1 => (DataMode::Passive, None),
            2 => (DataMode::Active, Some(self.read_var_u32()?)),
            other => return Err(DecodeError::BadDataSegmentFlags(other).into()),
        };

        self.data_flags = flags;
        self.section_entries_left -= 1;
        self.emit(
            BinaryReaderState::BeginDataSectionEntry,
            ReaderResult::DataSegment(DataSegment { mode, memory_index }),
        )
    }

    fn read_data_body(&mut self) -> Result<Step, ReadFailure> {
        let data = self.read_string_bytes()?;
        self.emit(
            BinaryReaderState::DataSectionEntryBody,
            ReaderResult::DataSegmentBody(DataSegmentBody { data }),
        )
    }

    fn read_function_header(&mut self) -> Result<Step, ReadFailure> {
        if self.section_entries_left == 0 {
            self.begin_skipping_section();
            return Ok(Step::Continue);
        }

        let size = self.read_var_u32()? as usize;
        let body_end = self.pos + size;
        let locals = self.read_vec(|r| {
            let count = r.read_var_u32()?;
            let ty = r.read_type()?;
            Ok(Locals { count, ty })
        })?;

        self.function_range = Some(DataRange::new(self.pos, body_end));
        self.section_entries_left -= 1;
        self.emit(
            BinaryReaderState::BeginFunctionBody,
            ReaderResult::FunctionInformation(FunctionInformation { locals }),
        )
    }

    fn function_end(&self) -> Result<usize, ReadFailure> {
        self.function_range
            .and_then(|range| usize::try_from(range.end).ok())
            .ok_or_else(|| DecodeError::UnexpectedState(self.state).into())
    }

    fn read_code_operator(&mut self) -> Result<Step, ReadFailure> {
        if self.pos >= self.function_end()? {
            self.state = BinaryReaderState::SkippingFunctionBody;
            return Ok(Step::Continue);
        }
        let operator = self.read_operator()?;
        self.emit(BinaryReaderState::CodeOperator, ReaderResult::Operator(operator))
    }

    fn skip_to_function_end(&mut self) -> Result<Step, ReadFailure> {
        let end = self.function_end()?;
        if end > self.length {
            return Err(ReadFailure::NeedMoreData);
        }
        self.pos = end;
        self.function_range = None;
        self.emit(BinaryReaderState::EndFunctionBody, ReaderResult::None)
    }

    fn read_operator(&mut self) -> Result<OperatorInformation, ReadFailure> {
        let byte = self.read_u8()?;
        let immediates = match byte {
            0xfb | 0xfc | 0xfd | 0xfe => return self.read_prefixed_operator(byte),

            0x02 | 0x03 | 0x04 | 0x06 => Immediates::Block(self.read_block_type()?),
            0x0c | 0x0d | 0xd4 | 0xd6 => Immediates::BranchDepth(self.read_var_u32()?),
            0x0e => {
                let targets = self.read_vec(Self::read_var_u32)?;
                let default = self.read_var_u32()?;
                Immediates::BranchTable { targets, default }
            }
            0x07 | 0x08 => Immediates::Event(self.read_var_u32()?),
            0x09 | 0x18 => Immediates::RelativeDepth(self.read_var_u32()?),
            0x10 | 0x12 | 0xd2 => Immediates::Function(self.read_var_u32()?),
            0x11 | 0x13 => {
                let type_index = self.read_var_u32()?;
                let table_index = self.read_var_u32()?;
                Immediates::CallIndirect {
                    type_index,
                    table_index,
                }
            }
            0x1c => Immediates::SelectTypes(self.read_vec(Self::read_type)?),
            0x20..=0x22 => Immediates::Local(self.read_var_u32()?),
            0x23 | 0x24 => Immediates::Global(self.read_var_u32()?),
            0x25 | 0x26 => Immediates::Table(self.read_var_u32()?),
            0x28..=0x3e => Immediates::Memory(self.read_memory_address()?),
            0x3f | 0x40 => Immediates::MemoryIndex(self.read_var_u32()?),
            0x41 => Immediates::I32(self.read_var_i32()?),
            0x42 => {
                let mut pos = self.pos;
                let value = integer::decode_i64(self.bytes(), &mut pos)?;
                self.pos = pos;
                Immediates::I64(value)
            }
            0x43 => Immediates::F32(self.read_u32_le()?),
            0x44 => Immediates::F64(u64::from_le_bytes(self.read_array()?)),
            0xd0 => Immediates::HeapType(self.read_heap_type()?),

            0x00 | 0x01 | 0x05 | 0x0a | 0x0b | 0x0f | 0x14 | 0x15 | 0x19 | 0x1a | 0x1b
            | 0x45..=0xc4 | 0xd1 | 0xd3 | 0xd5 => Immediates::None,

            other => {
                return Err(DecodeError::UnknownOperator(OperatorCode(u32::from(other))).into());
            }
        };
        Ok(OperatorInformation::new(
            OperatorCode(u32::from(byte)),
            immediates,
        ))
    }

    fn read_prefixed_operator(&mut self, prefix: u8) -> Result<OperatorInformation, ReadFailure> {
        let sub_opcode = self.read_var_u32()?;
        let code = u8::try_from(sub_opcode)
            .map(|sub| OperatorCode::prefixed(prefix, sub))
            .map_err(|_| DecodeError::UnknownPrefixedOperator { prefix, sub_opcode })?;
        if code.name().is_none() {
            return Err(DecodeError::UnknownOperator(code).into());
        }

        let sub = sub_opcode as u8;
        let immediates = match prefix {
            0xfb => self.read_gc_immediates(sub)?,
            0xfc => self.read_misc_immediates(sub)?,
            0xfd => self.read_simd_immediates(sub)?,
            _ => self.read_atomic_immediates(sub)?,
        };
        Ok(OperatorInformation::new(code, immediates))
    }

    fn read_gc_immediates(&mut self, sub: u8) -> Result<Immediates, ReadFailure> {
        Ok(match sub {
            0x01 | 0x02 | 0x11..=0x17 => Immediates::Type(self.read_var_u32()?),
            0x03..=0x06 => {
                let type_index = self.read_var_u32()?;
                let field_index = self.read_var_u32()?;
                Immediates::Field {
                    type_index,
                    field_index,
                }
            }
            0x18 => {
                let destination = self.read_var_u32()?;
                let source = self.read_var_u32()?;
                Immediates::TypePair {
                    destination,
                    source,
                }
            }
            0x30..=0x32 => Immediates::HeapType(self.read_heap_type()?),
            0x42 | 0x43 | 0x60..=0x65 => Immediates::BranchDepth(self.read_var_u32()?),
            _ => Immediates::None,
        })
    }

    fn read_misc_immediates(&mut self, sub: u8) -> Result<Immediates, ReadFailure> {
        Ok(match sub {
            0x08 => {
                let segment = self.read_var_u32()?;
                let memory = self.read_var_u32()?;
                Immediates::MemoryInit { segment, memory }
            }
            0x09 => Immediates::DataSegment(self.read_var_u32()?),
            0x0a => {
                let destination = self.read_var_u32()?;
                let source = self.read_var_u32()?;
                Immediates::MemoryCopy {
                    destination,
                    source,
                }
            }
            0x0b => Immediates::MemoryIndex(self.read_var_u32()?),
            0x0c => {
                let segment = self.read_var_u32()?;
                let table = self.read_var_u32()?;
                Immediates::TableInit { segment, table }
            }
            0x0d => Immediates::ElementSegment(self.read_var_u32()?),
            0x0e => {
                let destination = self.read_var_u32()?;
                let source = self.read_var_u32()?;
                Immediates::TableCopy {
                    destination,
                    source,
                }
            }
            0x0f..=0x11 => Immediates::Table(self.read_var_u32()?),
            _ => Immediates::None,
        })
    }

    fn read_simd_immediates(&mut self, sub: u8) -> Result<Immediates, ReadFailure> {
        Ok(match sub {
            0x00..=0x0b | 0x5c | 0x5d => Immediates::Memory(self.read_memory_address()?),
            0x0c => Immediates::V128(self.read_array()?),
            0x0d => Immediates::Shuffle(self.read_array()?),
            0x15..=0x22 => Immediates::Lane(self.read_u8()?),
            0x54..=0x5b => {
                let address = self.read_memory_address()?;
                let lane = self.read_u8()?;
                Immediates::MemoryLane { address, lane }
            }
            _ => Immediates::None,
        })
    }

    fn read_atomic_immediates(&mut self, sub: u8) -> Result<Immediates, ReadFailure> {
        Ok(match sub {
            0x03 => {
                // atomic.fence carries a reserved zero byte
                self.read_u8()?;
                Immediates::None
            }
            _ => Immediates::Memory(self.read_memory_address()?),
        })
    }

    fn read_memory_address(&mut self) -> Result<MemoryAddress, ReadFailure> {
        let mut flags = self.read_var_u32()?;
        // bit 6 announces an explicit memory index
        let memory_index = if flags & 0x40 != 0 {
            flags &= !0x40;
            self.read_var_u32()?
        } else {
            0
        };
        let offset = self.read_var_u64()?;
        Ok(MemoryAddress {
            flags,
            offset,
            memory_index,
        })
    }

    fn read_type(&mut self) -> Result<Type, ReadFailure> {
        let code = self.read_var_i32()?;
        self.type_from_code(code)
    }

    fn type_from_code(&mut self, code: i32) -> Result<Type, ReadFailure> {
        Ok(match code {
            -0x01 => Type::I32,
            -0x02 => Type::I64,
            -0x03 => Type::F32,
            -0x04 => Type::F64,
            -0x05 => Type::V128,
            -0x06 => Type::I8,
            -0x07 => Type::I16,
            -0x10 => Type::FuncRef,
            -0x11 => Type::ExternRef,
            -0x12 => Type::AnyRef,
            -0x13 => Type::EqRef,
            -0x14 => Type::reference(true, self.read_heap_type()?),
            -0x15 => Type::reference(false, self.read_heap_type()?),
            -0x16 => Type::I31Ref,
            -0x17 => {
                let depth = self.read_var_u32()?;
                Type::Rtt {
                    depth: Some(depth),
                    heap: self.read_heap_type()?,
                }
            }
            -0x18 => Type::Rtt {
                depth: None,
                heap: self.read_heap_type()?,
            },
            -0x19 => Type::DataRef,
            other => return Err(DecodeError::UnknownType(other).into()),
        })
    }

    fn read_heap_type(&mut self) -> Result<HeapType, ReadFailure> {
        let mut pos = self.pos;
        let code = integer::decode_s33(self.bytes(), &mut pos)?;
        self.pos = pos;
        Ok(match code {
            -0x10 => HeapType::Func,
            -0x11 => HeapType::Extern,
            -0x12 => HeapType::Any,
            -0x13 => HeapType::Eq,
            -0x16 => HeapType::I31,
            -0x19 => HeapType::Data,
            index if index >= 0 => HeapType::Index(index as u32),
            other => return Err(DecodeError::UnknownHeapType(other).into()),
        })
    }

    fn read_block_type(&mut self) -> Result<BlockType, ReadFailure> {
        let mut pos = self.pos;
        let code = integer::decode_s33(self.bytes(), &mut pos)?;
        self.pos = pos;
        match code {
            -0x40 => Ok(BlockType::Empty),
            index if index >= 0 => Ok(BlockType::FuncType(index as u32)),
            // single-byte value type codes
            code => Ok(BlockType::Value(self.type_from_code(code as i32)?)),
        }
    }

    fn read_limits(&mut self) -> Result<(Limits, u32), ReadFailure> {
        let flags = self.read_var_u32()?;
        let memory64 = flags & 0x04 != 0;
        let initial = if memory64 {
            self.read_var_u64()?
        } else {
            u64::from(self.read_var_u32()?)
        };
        let maximum = match (flags & 0x01 != 0, memory64) {
            (false, _) => None,
            (true, true) => Some(self.read_var_u64()?),
            (true, false) => Some(u64::from(self.read_var_u32()?)),
        };
        Ok((Limits { initial, maximum }, flags))
    }

    fn read_table_type(&mut self) -> Result<TableType, ReadFailure> {
        let element_type = self.read_type()?;
        let (limits, _) = self.read_limits()?;
        Ok(TableType {
            element_type,
            limits,
        })
    }

    fn read_memory_type(&mut self) -> Result<MemoryType, ReadFailure> {
        let (limits, flags) = self.read_limits()?;
        Ok(MemoryType {
            limits,
            shared: flags & 0x02 != 0,
            memory64: flags & 0x04 != 0,
        })
    }

    fn read_global_type(&mut self) -> Result<GlobalType, ReadFailure> {
        let content_type = self.read_type()?;
        let mutable = self.read_u8()? != 0;
        Ok(GlobalType {
            content_type,
            mutable,
        })
    }

    fn read_event_type(&mut self) -> Result<EventType, ReadFailure> {
        let attribute = self.read_var_u32()?;
        let type_index = self.read_var_u32()?;
        Ok(EventType {
            attribute,
            type_index,
        })
    }

    fn bytes(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data.as_ref()[..self.length],
            None => &[],
        }
    }

    fn peek_u32_le(&self) -> Option<u32> {
        let bytes = self.bytes().get(self.pos..self.pos + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u8(&mut self) -> Result<u8, ReadFailure> {
        let byte = *self.bytes().get(self.pos).ok_or(ReadFailure::NeedMoreData)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadFailure> {
        let end = self.pos + N;
        let mut out = [0u8; N];
        out.copy_from_slice(
            self.bytes()
                .get(self.pos..end)
                .ok_or(ReadFailure::NeedMoreData)?,
        );
        self.pos = end;
        Ok(out)
    }

    fn read_u32_le(&mut self) -> Result<u32, ReadFailure> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadFailure> {
        let end = self.pos.checked_add(n).ok_or(ReadFailure::NeedMoreData)?;
        let bytes = self
            .bytes()
            .get(self.pos..end)
            .ok_or(ReadFailure::NeedMoreData)?
            .to_vec();
        self.pos = end;
        Ok(bytes)
    }

    fn read_string_bytes(&mut self) -> Result<Vec<u8>, ReadFailure> {
        let length = self.read_var_u32()? as usize;
        self.read_bytes(length)
    }

    fn read_var_u32(&mut self) -> Result<u32, ReadFailure> {
        let mut pos = self.pos;
        let value = integer::decode_u32(self.bytes(), &mut pos)?;
        self.pos = pos;
        Ok(value)
    }

    fn read_var_u64(&mut self) -> Result<u64, ReadFailure> {
        let mut pos = self.pos;
        let value = integer::decode_u64(self.bytes(), &mut pos)?;
        self.pos = pos;
        Ok(value)
    }

    fn read_var_i32(&mut self) -> Result<i32, ReadFailure> {
        let mut pos = self.pos;
        let value = integer::decode_i32(self.bytes(), &mut pos)?;
        self.pos = pos;
        Ok(value)
    }

    fn read_vec<T>(
        &mut self,
        mut read_item: impl FnMut(&mut Self) -> Result<T, ReadFailure>,
    ) -> Result<Vec<T>, ReadFailure> {
        let count = self.read_var_u32()?;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(read_item(self)?);
        }
        Ok(items)
    }
}
