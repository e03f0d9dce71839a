use pretty_assertions::assert_eq;
use wadis::dis::WasmDisassembler;
use wadis::names::*;
use wadis::reader::BinaryReader;
use wadis::types::ExternalKind;

const HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

fn module(sections: &[&[u8]]) -> Vec<u8> {
    let mut bytes = HEADER.to_vec();
    for section in sections {
        bytes.extend_from_slice(section);
    }
    bytes
}

/// A custom `name` section holding a single function-names subsection.
fn function_names(names: &[(u8, &str)]) -> Vec<u8> {
    let mut map = vec![names.len() as u8];
    for (index, name) in names {
        map.push(*index);
        map.push(name.len() as u8);
        map.extend_from_slice(name.as_bytes());
    }
    let mut payload = vec![0x04];
    payload.extend_from_slice(b"name");
    payload.push(0x01);
    payload.push(map.len() as u8);
    payload.extend(map);

    let mut section = vec![0x00, payload.len() as u8];
    section.extend(payload);
    section
}

// two functions of type () -> (), each with an empty body
fn two_functions(name_section: &[u8]) -> Vec<u8> {
    module(&[
        &[0x01, 0x04, 0x01, 0x60, 0x00, 0x00],
        &[0x03, 0x03, 0x02, 0x00, 0x00],
        &[0x0a, 0x07, 0x02, 0x02, 0x00, 0x0b, 0x02, 0x00, 0x0b],
        name_section,
    ])
}

// imports env.log (func) and env.mem (memory), defines and exports "main"
fn imports_and_export() -> Vec<u8> {
    module(&[
        &[0x01, 0x05, 0x01, 0x60, 0x01, 0x7f, 0x00],
        &[
            0x02, 0x16, 0x02, //
            0x03, b'e', b'n', b'v', 0x03, b'l', b'o', b'g', 0x00, 0x00, //
            0x03, b'e', b'n', b'v', 0x03, b'm', b'e', b'm', 0x02, 0x00, 0x01,
        ],
        &[0x03, 0x02, 0x01, 0x00],
        &[0x07, 0x08, 0x01, 0x04, b'm', b'a', b'i', b'n', 0x00, 0x01],
        &[0x0a, 0x08, 0x01, 0x06, 0x00, 0x20, 0x00, 0x10, 0x00, 0x0b],
    ])
}

fn reader_for(bytes: &[u8]) -> BinaryReader<&[u8]> {
    let mut reader = BinaryReader::new();
    reader.set_data(bytes, 0, bytes.len(), true);
    reader
}

fn disassemble_with(bytes: &[u8], disassembler: &mut WasmDisassembler) -> Vec<String> {
    let text = disassembler
        .disassemble(&mut reader_for(bytes))
        .unwrap()
        .expect("module is complete");
    text.lines().map(str::to_string).collect()
}

#[test]
fn name_section_names_functions() {
    let bytes = two_functions(&function_names(&[(0, "main")]));

    let mut names = NameSectionReader::new();
    assert!(names.read(&mut reader_for(&bytes)).unwrap());
    assert!(names.has_valid_names());

    let resolver = names.get_name_resolver().unwrap();
    assert_eq!(resolver.function_name(0, false, false), "$main (;0;)");
    assert_eq!(resolver.function_name(0, false, true), "$main");
    assert_eq!(resolver.function_name(1, false, true), "$unknown1");
    assert_eq!(resolver.global_name(3, true), "$global3");

    let mut disassembler = WasmDisassembler::new();
    disassembler.set_name_resolver(resolver).unwrap();
    assert_eq!(
        disassemble_with(&bytes, &mut disassembler),
        vec![
            "(module",
            "  (func $main (;0;)",
            "  )",
            "  (func $unknown1",
            "  )",
            ")",
        ]
    );
}

#[test]
fn name_section_drops_duplicate_names() {
    let bytes = two_functions(&function_names(&[(0, "f"), (1, "f")]));

    let mut names = NameSectionReader::new();
    assert!(names.read(&mut reader_for(&bytes)).unwrap());

    assert!(!names.has_valid_names());
    assert_eq!(
        names.get_name_resolver().unwrap_err(),
        NameError::NoValidNames
    );
}

#[test]
fn name_section_drops_reserved_and_out_of_range_names() {
    let bytes = two_functions(&function_names(&[
        (0, "unknown7"),
        (1, "ok"),
        (5, "missing"),
        (1, "ok"),
    ]));

    let mut names = NameSectionReader::new();
    assert!(names.read(&mut reader_for(&bytes)).unwrap());

    let resolver = names.get_name_resolver().unwrap();
    assert_eq!(resolver.function_name(0, false, true), "$unknown0");
    assert_eq!(resolver.function_name(1, false, true), "$ok");
    assert_eq!(resolver.function_name(5, false, true), "$unknown5");
}

#[test]
fn name_section_without_names_has_none() {
    let bytes = two_functions(&[]);

    let mut names = NameSectionReader::new();
    assert!(names.read(&mut reader_for(&bytes)).unwrap());
    assert!(!names.has_valid_names());
}

#[test]
fn name_section_reader_waits_for_more_data() {
    let bytes = two_functions(&function_names(&[(0, "main")]));
    let split = bytes.len() - 3;

    let mut names = NameSectionReader::new();
    let mut reader = BinaryReader::new();
    reader.set_data(&bytes[..split], 0, split, false);
    assert!(!names.read(&mut reader).unwrap());

    let position = reader.position();
    reader.set_data(&bytes[..], position, bytes.len(), true);
    assert!(names.read(&mut reader).unwrap());
    assert!(names.has_valid_names());

    assert_eq!(names.read(&mut reader), Err(NameError::AlreadyDone));
}

#[test]
fn devtools_names_imports_and_exports() {
    let bytes = imports_and_export();

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());
    let resolver = generator.get_name_resolver();

    assert_eq!(resolver.function_name(0, true, true), "$env.log");
    assert_eq!(resolver.function_name(1, false, true), "$main");
    assert_eq!(resolver.memory_name(0, false), "$env.mem (;0;)");
    assert_eq!(resolver.table_name(0, true), "$table0");

    let mut disassembler = WasmDisassembler::new();
    disassembler.set_name_resolver(resolver).unwrap();
    assert_eq!(
        disassemble_with(&bytes, &mut disassembler),
        vec![
            "(module",
            "  (func $env.log (;0;) (import \"env\" \"log\") (param i32))",
            "  (memory $env.mem (;0;) (import \"env\" \"mem\") 1)",
            "  (export \"main\" (func $main))",
            "  (func $main (;1;) (param $var0 i32)",
            "    local.get $var0",
            "    call $env.log",
            "  )",
            ")",
        ]
    );
}

#[test]
fn devtools_export_metadata_inlines_exports() {
    let bytes = imports_and_export();

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());
    let metadata = generator.get_export_metadata();
    assert_eq!(metadata.function_export_names(1), ["main".to_string()]);
    assert!(metadata.export_names(ExternalKind::Memory, 0).is_empty());

    let mut disassembler = WasmDisassembler::new();
    disassembler
        .set_name_resolver(generator.get_name_resolver())
        .unwrap();
    disassembler.set_export_metadata(metadata).unwrap();
    assert_eq!(
        disassemble_with(&bytes, &mut disassembler),
        vec![
            "(module",
            "  (func $env.log (;0;) (import \"env\" \"log\") (param i32))",
            "  (memory $env.mem (;0;) (import \"env\" \"mem\") 1)",
            "  (func $main (;1;) (export \"main\") (param $var0 i32)",
            "    local.get $var0",
            "    call $env.log",
            "  )",
            ")",
        ]
    );
}

#[test]
fn devtools_prefers_name_section_over_imports_and_exports() {
    let mut bytes = imports_and_export();
    bytes.extend(function_names(&[(0, "logger"), (1, "entry")]));

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());
    let resolver = generator.get_name_resolver();

    assert_eq!(resolver.function_name(0, true, true), "$logger");
    assert_eq!(resolver.function_name(1, false, true), "$entry");
    assert_eq!(resolver.function_name(1, false, false), "$entry (;1;)");
    // export metadata is unaffected by naming
    assert_eq!(
        generator.get_export_metadata().function_export_names(1),
        ["main".to_string()]
    );
}

#[test]
fn devtools_keeps_function_name_over_export() {
    let bytes = wat::parse_str(
        r#"(module
             (export "export.function" (func $f))
             (func $f (result i32) i32.const 0))"#,
    )
    .unwrap();

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());
    let resolver = generator.get_name_resolver();

    assert_eq!(resolver.function_name(0, false, true), "$f");
    assert_eq!(resolver.function_name(0, false, false), "$f (;0;)");
}

#[test]
fn devtools_keeps_import_name_over_export() {
    let bytes = wat::parse_str(
        r#"(module
             (import "import" "function" (func))
             (export "export.function" (func 0))
             (export "again" (func 0)))"#,
    )
    .unwrap();

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());
    let resolver = generator.get_name_resolver();

    assert_eq!(resolver.function_name(0, true, true), "$import.function");
    assert_eq!(resolver.function_name(0, true, false), "$import.function (;0;)");
}

#[test]
fn devtools_uses_first_export_name() {
    let bytes = wat::parse_str(
        r#"(module
             (func)
             (export "first" (func 0))
             (export "second" (func 0)))"#,
    )
    .unwrap();

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());

    assert_eq!(
        generator.get_name_resolver().function_name(0, false, true),
        "$first"
    );
    assert_eq!(
        generator.get_export_metadata().function_export_names(0),
        ["first".to_string(), "second".to_string()]
    );
}

#[test]
fn devtools_sanitizes_export_names() {
    let bytes = module(&[
        &[0x01, 0x04, 0x01, 0x60, 0x00, 0x00],
        &[0x03, 0x02, 0x01, 0x00],
        &[0x07, 0x09, 0x01, 0x05, b'a', b' ', b'(', b'b', b')', 0x00, 0x00],
        &[0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b],
    ]);

    let mut generator = DevToolsNameGenerator::new();
    assert!(generator.read(&mut reader_for(&bytes)).unwrap());

    assert_eq!(
        generator.get_name_resolver().function_name(0, false, true),
        "$a__b_"
    );
    assert_eq!(
        generator.get_export_metadata().function_export_names(0),
        ["a (b)".to_string()]
    );
}
