//! Values produced by [`BinaryReader`](super::BinaryReader), one per event.
use crate::integer::Int64;
use crate::opcode::OperatorCode;
use crate::types::{
    BlockType, EventType, ExternalKind, GlobalType, HeapType, LinkingType, MemoryType,
    NameType, RelocType, SectionCode, TableType, Type, TypeEntry,
};

/// The payload of the current reader state. Which variant is present is
/// determined by [`BinaryReaderState`](super::BinaryReaderState); states that
/// carry no payload leave [`ReaderResult::None`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReaderResult {
    #[default]
    None,
    ModuleHeader(ModuleHeader),
    Section(SectionInformation),
    Type(TypeEntry),
    Import(ImportEntry),
    Export(ExportEntry),
    Function(FunctionEntry),
    Table(TableType),
    Memory(MemoryType),
    Event(EventType),
    Global(GlobalVariable),
    Start(StartEntry),
    DataCount(u32),
    ElementSegment(ElementSegment),
    ElementSegmentBody(ElementSegmentBody),
    DataSegment(DataSegment),
    DataSegmentBody(DataSegmentBody),
    FunctionInformation(FunctionInformation),
    Operator(OperatorInformation),
    Name(NameEntry),
    Linking(LinkingEntry),
    RelocHeader(RelocHeader),
    RelocEntry(RelocEntry),
    SourceMappingUrl(SourceMappingUrl),
    RawData(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleHeader {
    pub magic_number: u32,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInformation {
    pub id: SectionCode,
    /// Only custom sections have a name.
    pub name: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub module: Vec<u8>,
    pub field: Vec<u8>,
    pub desc: ImportDesc,
}

impl ImportEntry {
    pub fn kind(&self) -> ExternalKind {
        match self.desc {
            ImportDesc::Function { .. } => ExternalKind::Function,
            ImportDesc::Table(_) => ExternalKind::Table,
            ImportDesc::Memory(_) => ExternalKind::Memory,
            ImportDesc::Global(_) => ExternalKind::Global,
            ImportDesc::Event(_) => ExternalKind::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDesc {
    Function { type_index: u32 },
    Table(TableType),
    Memory(MemoryType),
    Global(GlobalType),
    Event(EventType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub field: Vec<u8>,
    pub kind: ExternalKind,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionEntry {
    pub type_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartEntry {
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalVariable {
    pub global_type: GlobalType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementMode {
    Active,
    Passive,
    Declarative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSegment {
    pub mode: ElementMode,
    /// Present for active segments only.
    pub table_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSegmentBody {
    pub element_type: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Active,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSegment {
    pub mode: DataMode,
    /// Present for active segments only.
    pub memory_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegmentBody {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locals {
    pub count: u32,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInformation {
    pub locals: Vec<Locals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAddress {
    /// Log2 of the alignment.
    pub flags: u32,
    pub offset: u64,
    pub memory_index: u32,
}

/// A decoded operator. Only the immediates that belong to the opcode are
/// present.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorInformation {
    pub code: OperatorCode,
    pub immediates: Immediates,
}

impl OperatorInformation {
    pub fn new(code: OperatorCode, immediates: Immediates) -> Self {
        OperatorInformation { code, immediates }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Immediates {
    None,
    Block(BlockType),
    BranchDepth(u32),
    BranchTable {
        targets: Vec<u32>,
        default: u32,
    },
    /// Depth used by `rethrow` and `delegate`.
    RelativeDepth(u32),
    Function(u32),
    CallIndirect {
        type_index: u32,
        table_index: u32,
    },
    Local(u32),
    Global(u32),
    Table(u32),
    Event(u32),
    HeapType(HeapType),
    SelectTypes(Vec<Type>),
    Memory(MemoryAddress),
    MemoryLane {
        address: MemoryAddress,
        lane: u8,
    },
    MemoryIndex(u32),
    MemoryCopy {
        destination: u32,
        source: u32,
    },
    MemoryInit {
        segment: u32,
        memory: u32,
    },
    DataSegment(u32),
    ElementSegment(u32),
    TableInit {
        segment: u32,
        table: u32,
    },
    TableCopy {
        destination: u32,
        source: u32,
    },
    I32(i32),
    I64(Int64),
    /// Raw IEEE 754 bits, so NaN payloads survive.
    F32(u32),
    /// Raw IEEE 754 bits, so NaN payloads survive.
    F64(u64),
    V128([u8; 16]),
    Shuffle([u8; 16]),
    Lane(u8),
    Type(u32),
    Field {
        type_index: u32,
        field_index: u32,
    },
    TypePair {
        destination: u32,
        source: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub index: u32,
    pub name: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectNaming {
    pub index: u32,
    pub names: Vec<Naming>,
}

/// One subsection of the `name` custom section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameEntry {
    Module(Vec<u8>),
    /// Function, type, table, memory, global, element, data and event names.
    Map { kind: NameType, names: Vec<Naming> },
    /// Local and label names grouped by function, field names grouped by type.
    IndirectMap {
        kind: NameType,
        groups: Vec<IndirectNaming>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkingEntry {
    pub ty: LinkingType,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocHeader {
    pub id: SectionCode,
    pub name: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocEntry {
    pub ty: RelocType,
    pub offset: u32,
    pub index: u32,
    pub addend: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMappingUrl {
    pub url: Vec<u8>,
}
