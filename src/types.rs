//! Types shared between the binary reader, the name scanners and the
//! disassembler.
use phf::phf_ordered_map;
use thiserror::Error;

pub(crate) trait FromMarkerByte
where
    Self: Sized + Copy + std::fmt::Debug + 'static,
{
    type Error: From<u8>;

    // defines the mapping between expected bytes and the corresponding value
    fn markers() -> &'static phf::OrderedMap<u8, Self>;

    fn markers_formatted() -> String {
        Self::markers()
            .entries()
            .map(|(marker, variant)| format!("{marker:#04X} ({variant:?})"))
            .collect::<Vec<String>>()
            .join(", ")
    }

    fn from_marker(b: u8) -> Result<Self, Self::Error> {
        match Self::markers().get(&b) {
            Some(n) => Ok(*n),
            None => Err(b.into()),
        }
    }
}

/// Identifies the kind of a top-level section.
///
/// <https://webassembly.github.io/spec/core/binary/modules.html#sections>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionCode {
    Custom,
    Type,
    Import,
    Function,
    Table,
    Memory,
    Global,
    Export,
    Start,
    Element,
    Code,
    Data,
    DataCount,
    /// Exception handling tags, still called events by the proposal this
    /// encoding follows.
    Event,
}

impl SectionCode {
    pub fn id(self) -> u8 {
        match self {
            SectionCode::Custom => 0,
            SectionCode::Type => 1,
            SectionCode::Import => 2,
            SectionCode::Function => 3,
            SectionCode::Table => 4,
            SectionCode::Memory => 5,
            SectionCode::Global => 6,
            SectionCode::Export => 7,
            SectionCode::Start => 8,
            SectionCode::Element => 9,
            SectionCode::Code => 10,
            SectionCode::Data => 11,
            SectionCode::DataCount => 12,
            SectionCode::Event => 13,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid section ID: expected one of {markers}; got {0:#04X}", markers=SectionCode::markers_formatted())]
pub struct InvalidSectionIdError(pub u8);

impl From<u8> for InvalidSectionIdError {
    fn from(b: u8) -> Self {
        Self(b)
    }
}

#[expect(non_upper_case_globals)]
static SectionCode_MARKERS: phf::OrderedMap<u8, SectionCode> = phf_ordered_map! {
    0u8 => SectionCode::Custom,
    1u8 => SectionCode::Type,
    2u8 => SectionCode::Import,
    3u8 => SectionCode::Function,
    4u8 => SectionCode::Table,
    5u8 => SectionCode::Memory,
    6u8 => SectionCode::Global,
    7u8 => SectionCode::Export,
    8u8 => SectionCode::Start,
    9u8 => SectionCode::Element,
    10u8 => SectionCode::Code,
    11u8 => SectionCode::Data,
    12u8 => SectionCode::DataCount,
    13u8 => SectionCode::Event,
};

impl FromMarkerByte for SectionCode {
    type Error = InvalidSectionIdError;

    fn markers() -> &'static phf::OrderedMap<u8, Self> {
        &SectionCode_MARKERS
    }
}

/// The kind of entity an import or export refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalKind {
    Function,
    Table,
    Memory,
    Global,
    Event,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid external kind: expected one of {markers}; got {0:#04X}", markers=ExternalKind::markers_formatted())]
pub struct InvalidExternalKindError(pub u8);

impl From<u8> for InvalidExternalKindError {
    fn from(b: u8) -> Self {
        Self(b)
    }
}

#[expect(non_upper_case_globals)]
static ExternalKind_MARKERS: phf::OrderedMap<u8, ExternalKind> = phf_ordered_map! {
    0x00u8 => ExternalKind::Function,
    0x01u8 => ExternalKind::Table,
    0x02u8 => ExternalKind::Memory,
    0x03u8 => ExternalKind::Global,
    0x04u8 => ExternalKind::Event,
};

impl FromMarkerByte for ExternalKind {
    type Error = InvalidExternalKindError;

    fn markers() -> &'static phf::OrderedMap<u8, Self> {
        &ExternalKind_MARKERS
    }
}

/// Subsection ids of the `name` custom section.
///
/// <https://webassembly.github.io/spec/core/appendix/custom.html#name-section>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameType {
    Module,
    Function,
    Local,
    Label,
    Type,
    Table,
    Memory,
    Global,
    Element,
    Data,
    Field,
    Event,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid name subsection: expected one of {markers}; got {0:#04X}", markers=NameType::markers_formatted())]
pub struct InvalidNameTypeError(pub u8);

impl From<u8> for InvalidNameTypeError {
    fn from(b: u8) -> Self {
        Self(b)
    }
}

#[expect(non_upper_case_globals)]
static NameType_MARKERS: phf::OrderedMap<u8, NameType> = phf_ordered_map! {
    0u8 => NameType::Module,
    1u8 => NameType::Function,
    2u8 => NameType::Local,
    3u8 => NameType::Label,
    4u8 => NameType::Type,
    5u8 => NameType::Table,
    6u8 => NameType::Memory,
    7u8 => NameType::Global,
    8u8 => NameType::Element,
    9u8 => NameType::Data,
    10u8 => NameType::Field,
    11u8 => NameType::Event,
};

impl FromMarkerByte for NameType {
    type Error = InvalidNameTypeError;

    fn markers() -> &'static phf::OrderedMap<u8, Self> {
        &NameType_MARKERS
    }
}

/// Relocation entry types of the `reloc.*` custom sections emitted by
/// object-file producing toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocType {
    FunctionIndexLeb,
    TableIndexSleb,
    TableIndexI32,
    GlobalAddrLeb,
    GlobalAddrSleb,
    GlobalAddrI32,
    TypeIndexLeb,
    GlobalIndexLeb,
}

impl RelocType {
    /// Memory address relocations carry an addend after the index.
    pub fn has_addend(self) -> bool {
        matches!(
            self,
            RelocType::GlobalAddrLeb | RelocType::GlobalAddrSleb | RelocType::GlobalAddrI32
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid relocation type: expected one of {markers}; got {0:#04X}", markers=RelocType::markers_formatted())]
pub struct InvalidRelocTypeError(pub u8);

impl From<u8> for InvalidRelocTypeError {
    fn from(b: u8) -> Self {
        Self(b)
    }
}

#[expect(non_upper_case_globals)]
static RelocType_MARKERS: phf::OrderedMap<u8, RelocType> = phf_ordered_map! {
    0u8 => RelocType::FunctionIndexLeb,
    1u8 => RelocType::TableIndexSleb,
    2u8 => RelocType::TableIndexI32,
    3u8 => RelocType::GlobalAddrLeb,
    4u8 => RelocType::GlobalAddrSleb,
    5u8 => RelocType::GlobalAddrI32,
    6u8 => RelocType::TypeIndexLeb,
    7u8 => RelocType::GlobalIndexLeb,
};

impl FromMarkerByte for RelocType {
    type Error = InvalidRelocTypeError;

    fn markers() -> &'static phf::OrderedMap<u8, Self> {
        &RelocType_MARKERS
    }
}

/// Entry types of the `linking` custom section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkingType {
    StackPointer,
}

/// The abstract heap types, or a concrete type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapType {
    Func,
    Extern,
    Any,
    Eq,
    I31,
    Data,
    Index(u32),
}

/// Value and storage types.
///
/// Nullable references to the abstract heap types are folded into their
/// shorthand forms when decoded, so `(ref null func)` is always
/// [`Type::FuncRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    I32,
    I64,
    F32,
    F64,
    V128,
    /// Packed storage type, only valid as a struct or array field.
    I8,
    /// Packed storage type, only valid as a struct or array field.
    I16,
    FuncRef,
    ExternRef,
    AnyRef,
    EqRef,
    I31Ref,
    DataRef,
    Ref { nullable: bool, heap: HeapType },
    Rtt { depth: Option<u32>, heap: HeapType },
}

impl Type {
    pub fn reference(nullable: bool, heap: HeapType) -> Type {
        match (nullable, heap) {
            (true, HeapType::Func) => Type::FuncRef,
            (true, HeapType::Extern) => Type::ExternRef,
            (true, HeapType::Any) => Type::AnyRef,
            (true, HeapType::Eq) => Type::EqRef,
            (false, HeapType::I31) => Type::I31Ref,
            (false, HeapType::Data) => Type::DataRef,
            (nullable, heap) => Type::Ref { nullable, heap },
        }
    }
}

/// The type of a `block`, `loop`, `if` or `try`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Empty,
    Value(Type),
    /// Multi-value blocks reference a function type by index.
    FuncType(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub storage: Type,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructType {
    pub fields: Vec<FieldType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayType {
    pub element: FieldType,
}

/// An entry of the type section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeEntry {
    Func(FuncType),
    Struct(StructType),
    Array(ArrayType),
}

/// Sizes of tables and memories, in elements or pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub initial: u64,
    pub maximum: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableType {
    pub element_type: Type,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    pub limits: Limits,
    pub shared: bool,
    pub memory64: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    pub content_type: Type,
    pub mutable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventType {
    pub attribute: u32,
    pub type_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_codes_round_trip_through_markers() {
        for (id, code) in SectionCode::markers().entries() {
            assert_eq!(code.id(), *id);
        }
        assert_eq!(SectionCode::from_marker(14), Err(InvalidSectionIdError(14)));
    }

    #[test]
    fn invalid_marker_message_lists_known_values() {
        let msg = InvalidExternalKindError(9).to_string();
        assert!(msg.contains("0x00 (Function)"), "{msg}");
        assert!(msg.ends_with("got 0x09"), "{msg}");
    }

    #[test]
    fn nullable_abstract_references_use_shorthands() {
        assert_eq!(Type::reference(true, HeapType::Func), Type::FuncRef);
        assert_eq!(Type::reference(false, HeapType::I31), Type::I31Ref);
        assert_eq!(
            Type::reference(false, HeapType::Func),
            Type::Ref {
                nullable: false,
                heap: HeapType::Func
            }
        );
        assert_eq!(
            Type::reference(true, HeapType::Index(3)),
            Type::Ref {
                nullable: true,
                heap: HeapType::Index(3)
            }
        );
    }
}
