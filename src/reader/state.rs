/// The state of a [`BinaryReader`](super::BinaryReader) after a successful
/// `read()`.
///
/// Entry states (`TypeSectionEntry`, `GlobalSectionEntry`, ...) double as the
/// resume point when the reader ran out of bytes before the next entry; in
/// that case the result is [`ReaderResult::None`](super::ReaderResult::None).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BinaryReaderState {
    Error,
    #[default]
    Initial,
    BeginWasm,
    EndWasm,
    BeginSection,
    EndSection,
    SkippingSection,
    ReadingSectionRawData,
    SectionRawData,

    TypeSectionEntry,
    ImportSectionEntry,
    FunctionSectionEntry,
    TableSectionEntry,
    MemorySectionEntry,
    GlobalSectionEntry,
    ExportSectionEntry,
    DataSectionEntry,
    NameSectionEntry,
    ElementSectionEntry,
    LinkingSectionEntry,
    StartSectionEntry,
    DataCountSectionEntry,
    EventSectionEntry,

    BeginInitExpressionBody,
    InitExpressionOperator,
    EndInitExpressionBody,

    BeginFunctionBody,
    ReadingFunctionHeader,
    CodeOperator,
    EndFunctionBody,
    SkippingFunctionBody,

    BeginElementSectionEntry,
    ElementSectionEntryBody,
    EndElementSectionEntry,

    BeginDataSectionEntry,
    DataSectionEntryBody,
    EndDataSectionEntry,

    BeginGlobalSectionEntry,
    EndGlobalSectionEntry,

    RelocSectionHeader,
    RelocSectionEntry,
    SourceMappingUrl,

    BeginOffsetExpressionBody,
    OffsetExpressionOperator,
    EndOffsetExpressionBody,
}
