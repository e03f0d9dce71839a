use pretty_assertions::assert_eq;
use wadis::opcode::OperatorCode;
use wadis::reader::*;
use wadis::types::{ExternalKind, FuncType, SectionCode, Type, TypeEntry};

use BinaryReaderState as S;

// (module (func (export "run") (result i32) i32.const 42))
const RUN_MODULE: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: () -> i32
    0x03, 0x02, 0x01, 0x00, // function: type 0
    0x07, 0x07, 0x01, 0x03, b'r', b'u', b'n', 0x00, 0x00, // export "run" func 0
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x41, 0x2a, 0x0b, // code: i32.const 42
];

const SEGMENTS_MODULE: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: () -> ()
    0x03, 0x02, 0x01, 0x00, // function: type 0
    0x04, 0x04, 0x01, 0x70, 0x00, 0x01, // table: funcref, min 1
    0x05, 0x03, 0x01, 0x00, 0x01, // memory: min 1
    0x06, 0x06, 0x01, 0x7f, 0x00, 0x41, 0x2a, 0x0b, // global: i32 = 42
    0x09, 0x07, 0x01, 0x00, 0x41, 0x00, 0x0b, 0x01, 0x00, // elem: offset 0, func 0
    0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b, // code: empty body
    0x0b, 0x08, 0x01, 0x00, 0x41, 0x00, 0x0b, 0x02, b'h', b'i', // data: offset 0, "hi"
];

fn states(reader: &mut BinaryReader<Vec<u8>>) -> Vec<BinaryReaderState> {
    let mut states = Vec::new();
    while reader.read().unwrap() {
        states.push(reader.state());
    }
    states
}

fn complete(bytes: &[u8]) -> BinaryReader<Vec<u8>> {
    let mut reader = BinaryReader::new();
    reader.set_data(bytes.to_vec(), 0, bytes.len(), true);
    reader
}

#[test]
fn it_reports_module_events() {
    let mut reader = complete(RUN_MODULE);

    assert_eq!(
        states(&mut reader),
        vec![
            S::BeginWasm,
            S::BeginSection,
            S::TypeSectionEntry,
            S::EndSection,
            S::BeginSection,
            S::FunctionSectionEntry,
            S::EndSection,
            S::BeginSection,
            S::ExportSectionEntry,
            S::EndSection,
            S::BeginSection,
            S::BeginFunctionBody,
            S::CodeOperator,
            S::CodeOperator,
            S::EndFunctionBody,
            S::EndSection,
            S::EndWasm,
        ]
    );
    assert!(!reader.has_more_bytes());
}

#[test]
fn it_decodes_entries() {
    let mut reader = complete(RUN_MODULE);

    assert!(reader.read().unwrap());
    assert_eq!(
        reader.result(),
        &ReaderResult::ModuleHeader(ModuleHeader {
            magic_number: WASM_MAGIC_NUMBER,
            version: 1,
        })
    );

    assert!(reader.read().unwrap());
    assert_eq!(reader.current_section(), Some(SectionCode::Type));
    assert!(reader.read().unwrap());
    assert_eq!(
        reader.result(),
        &ReaderResult::Type(TypeEntry::Func(FuncType {
            params: vec![],
            results: vec![Type::I32],
        }))
    );

    let mut export = None;
    let mut operators = Vec::new();
    while reader.read().unwrap() {
        match reader.result() {
            ReaderResult::Export(entry) => export = Some(entry.clone()),
            ReaderResult::Operator(operator) => operators.push(operator.clone()),
            _ => {}
        }
    }

    assert_eq!(
        export,
        Some(ExportEntry {
            field: b"run".to_vec(),
            kind: ExternalKind::Function,
            index: 0,
        })
    );
    assert_eq!(
        operators,
        vec![
            OperatorInformation::new(OperatorCode::I32_CONST, Immediates::I32(42)),
            OperatorInformation::new(OperatorCode::END, Immediates::None),
        ]
    );
}

#[test]
fn it_walks_globals_elements_and_data() {
    let mut reader = complete(SEGMENTS_MODULE);
    let mut trace = Vec::new();
    while reader.read().unwrap() {
        if matches!(
            reader.current_section(),
            Some(SectionCode::Global | SectionCode::Element | SectionCode::Data)
        ) {
            trace.push((reader.state(), reader.result().clone()));
        }
    }

    let i32_const_0 = ReaderResult::Operator(OperatorInformation::new(
        OperatorCode::I32_CONST,
        Immediates::I32(0),
    ));
    let end = ReaderResult::Operator(OperatorInformation::new(OperatorCode::END, Immediates::None));

    let states: Vec<_> = trace.iter().map(|(state, _)| *state).collect();
    assert_eq!(
        states,
        vec![
            S::BeginSection,
            S::BeginGlobalSectionEntry,
            S::BeginInitExpressionBody,
            S::InitExpressionOperator,
            S::InitExpressionOperator,
            S::EndInitExpressionBody,
            S::EndGlobalSectionEntry,
            S::BeginSection,
            S::BeginElementSectionEntry,
            S::BeginOffsetExpressionBody,
            S::OffsetExpressionOperator,
            S::OffsetExpressionOperator,
            S::EndOffsetExpressionBody,
            S::ElementSectionEntryBody,
            S::BeginInitExpressionBody,
            S::InitExpressionOperator,
            S::InitExpressionOperator,
            S::EndInitExpressionBody,
            S::EndElementSectionEntry,
            S::BeginSection,
            S::BeginDataSectionEntry,
            S::BeginOffsetExpressionBody,
            S::OffsetExpressionOperator,
            S::OffsetExpressionOperator,
            S::EndOffsetExpressionBody,
            S::DataSectionEntryBody,
            S::EndDataSectionEntry,
        ]
    );

    assert_eq!(
        trace[8].1,
        ReaderResult::ElementSegment(ElementSegment {
            mode: ElementMode::Active,
            table_index: Some(0),
        })
    );
    assert_eq!(trace[10].1, i32_const_0);
    assert_eq!(trace[11].1, end);
    assert_eq!(
        trace[13].1,
        ReaderResult::ElementSegmentBody(ElementSegmentBody {
            element_type: Type::FuncRef,
        })
    );
    // function indices come back as `ref.func` expressions
    assert_eq!(
        trace[15].1,
        ReaderResult::Operator(OperatorInformation::new(
            OperatorCode::REF_FUNC,
            Immediates::Function(0),
        ))
    );
    assert_eq!(trace[16].1, end);
    assert_eq!(
        trace[25].1,
        ReaderResult::DataSegmentBody(DataSegmentBody {
            data: b"hi".to_vec(),
        })
    );
}

#[test]
fn it_resumes_after_every_split() {
    let expected = states(&mut complete(SEGMENTS_MODULE));

    for split in 0..SEGMENTS_MODULE.len() {
        let mut reader = BinaryReader::new();
        reader.set_data(SEGMENTS_MODULE[..split].to_vec(), 0, split, false);
        let mut seen = states(&mut reader);

        let position = reader.position();
        reader.set_data(SEGMENTS_MODULE.to_vec(), position, SEGMENTS_MODULE.len(), true);
        seen.extend(states(&mut reader));

        assert_eq!(seen, expected, "split at byte {split}");
    }
}

/// Feeds `bytes` one at a time, dropping consumed bytes between calls.
fn states_one_byte_at_a_time(bytes: &[u8]) -> Vec<BinaryReaderState> {
    let mut reader = BinaryReader::new();
    let mut pending = Vec::new();
    let mut seen = Vec::new();
    for (i, &byte) in bytes.iter().enumerate() {
        pending.push(byte);
        let length = pending.len();
        reader.set_data(pending, 0, length, i + 1 == bytes.len());
        seen.extend(states(&mut reader));

        let position = reader.position();
        pending = reader.take_data().unwrap();
        pending.drain(..position);
    }
    seen
}

#[test]
fn it_accepts_one_byte_at_a_time_with_consumed_bytes_dropped() {
    let expected = states(&mut complete(RUN_MODULE));

    assert_eq!(states_one_byte_at_a_time(RUN_MODULE), expected);
}

#[test]
fn it_reads_concatenated_modules() {
    let empty = &RUN_MODULE[..8];
    let bytes = [empty, empty].concat();

    assert_eq!(
        states(&mut complete(&bytes)),
        vec![S::BeginWasm, S::EndWasm, S::BeginWasm, S::EndWasm]
    );
}

#[test]
fn it_reads_concatenated_modules_one_byte_at_a_time() {
    let bytes = [RUN_MODULE, SEGMENTS_MODULE].concat();
    let mut expected = states(&mut complete(RUN_MODULE));
    expected.extend(states(&mut complete(SEGMENTS_MODULE)));

    assert_eq!(states(&mut complete(&bytes)), expected);
    assert_eq!(states_one_byte_at_a_time(&bytes), expected);
}

#[test]
fn it_waits_for_the_rest_of_the_header() {
    let mut reader = BinaryReader::new();
    reader.set_data(RUN_MODULE[..3].to_vec(), 0, 3, false);

    assert!(!reader.read().unwrap());
    assert_eq!(reader.position(), 0);
    assert_eq!(reader.state(), S::Initial);
}

#[test]
fn it_rejects_bad_magic_number() {
    let mut reader = complete(&[0xD3, 0xAD, 0xBE, 0xEF, 0x01, 0x00, 0x00, 0x00]);

    let err = reader.read().expect_err("bad magic should fail");
    assert_eq!(err, DecodeError::BadMagicNumber(0xEFBEADD3));
    assert_eq!(reader.state(), S::Error);

    // errors are sticky
    assert_eq!(reader.read(), Err(DecodeError::BadMagicNumber(0xEFBEADD3)));
    assert_eq!(reader.error(), Some(&DecodeError::BadMagicNumber(0xEFBEADD3)));
}

#[test]
fn it_rejects_unsupported_version() {
    let mut reader = complete(&[0x00, 0x61, 0x73, 0x6d, 0x02, 0x00, 0x00, 0x00]);

    assert_eq!(reader.read(), Err(DecodeError::BadVersion(2)));
}

#[test]
fn it_rejects_unknown_section_id() {
    let mut reader = complete(&[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, 0x0e, 0x00]);

    assert!(reader.read().unwrap());
    let err = reader.read().unwrap_err();
    assert!(matches!(err, DecodeError::InvalidSectionId(_)), "{err:?}");
}

#[test]
fn it_skips_sections_on_request() {
    let mut reader = complete(RUN_MODULE);
    let mut sections = Vec::new();
    while reader.read().unwrap() {
        if let ReaderResult::Section(info) = reader.result() {
            sections.push(info.id);
            reader.skip_section();
        }
    }

    assert_eq!(
        sections,
        vec![
            SectionCode::Type,
            SectionCode::Function,
            SectionCode::Export,
            SectionCode::Code,
        ]
    );
}

#[test]
fn it_skips_function_bodies() {
    let mut reader = complete(RUN_MODULE);
    let mut operators = 0;
    while reader.read().unwrap() {
        match reader.state() {
            S::BeginFunctionBody => reader.skip_function_body(),
            S::CodeOperator => operators += 1,
            _ => {}
        }
    }

    assert_eq!(operators, 0);
}

#[test]
fn it_skips_init_expressions() {
    let mut reader = complete(SEGMENTS_MODULE);
    let mut seen = Vec::new();
    while reader.read().unwrap() {
        if reader.current_section() != Some(SectionCode::Global) {
            continue;
        }
        seen.push(reader.state());
        if reader.state() == S::BeginInitExpressionBody {
            assert!(reader.skip_init_expression().unwrap());
            seen.push(reader.state());
        }
    }

    assert_eq!(
        seen,
        vec![
            S::BeginSection,
            S::BeginGlobalSectionEntry,
            S::BeginInitExpressionBody,
            S::EndInitExpressionBody,
            S::EndGlobalSectionEntry,
        ]
    );
}

#[test]
fn it_fetches_raw_data_of_any_section_on_request() {
    let mut reader = complete(RUN_MODULE);
    assert!(reader.read().unwrap());
    assert_eq!(
        reader.fetch_section_raw_data(),
        Err(DecodeError::UnexpectedState(S::BeginWasm))
    );

    assert!(reader.read().unwrap());
    assert_eq!(reader.current_section(), Some(SectionCode::Type));
    reader.fetch_section_raw_data().unwrap();

    assert!(reader.read().unwrap());
    assert_eq!(reader.state(), S::SectionRawData);
    assert_eq!(
        reader.result(),
        &ReaderResult::RawData(vec![0x01, 0x60, 0x00, 0x01, 0x7f])
    );

    // the following sections are decoded as usual
    let rest = states(&mut reader);
    assert_eq!(rest.first(), Some(&S::EndSection));
    assert!(rest.contains(&S::FunctionSectionEntry));
    assert_eq!(rest.last(), Some(&S::EndWasm));
}

#[test]
fn it_fetches_custom_section_raw_data() {
    let mut bytes = RUN_MODULE.to_vec();
    // custom section "meta" with payload [1, 2, 3]
    bytes.extend([0x00, 0x08, 0x04, b'm', b'e', b't', b'a', 0x01, 0x02, 0x03]);
    let mut reader = complete(&bytes);

    let mut raw = None;
    while reader.read().unwrap() {
        if let ReaderResult::RawData(data) = reader.result() {
            raw = Some(data.clone());
        }
    }

    assert_eq!(raw, Some(vec![0x01, 0x02, 0x03]));
}

#[test]
fn it_reads_name_section_entries() {
    let mut bytes = RUN_MODULE.to_vec();
    bytes.extend([
        0x00, 0x0e, 0x04, b'n', b'a', b'm', b'e', // custom section "name"
        0x01, 0x07, 0x01, 0x00, 0x04, b'm', b'a', b'i', b'n', // function names
    ]);
    let mut reader = complete(&bytes);

    let mut names = Vec::new();
    while reader.read().unwrap() {
        if let ReaderResult::Name(entry) = reader.result() {
            names.push(entry.clone());
        }
    }

    assert_eq!(
        names,
        vec![NameEntry::Map {
            kind: wadis::types::NameType::Function,
            names: vec![Naming {
                index: 0,
                name: b"main".to_vec(),
            }],
        }]
    );
}
