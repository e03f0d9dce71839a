use googletest::prelude::*;
use pretty_assertions::assert_eq;
use wadis::dis::WasmDisassembler;

const FACTORIAL: &str = r#"
(module
  (type $t (func (param i32) (result i32)))
  (import "env" "f" (func $imp (param i32)))
  (memory 1)
  (global $g (mut i32) (i32.const 0))
  (table 2 funcref)
  (elem (i32.const 0) $fac $fac)
  (func $fac (export "fac") (type $t)
    local.get 0
    i32.eqz
    if (result i32)
      i32.const 1
    else
      local.get 0
      local.get 0
      i32.const 1
      i32.sub
      call $fac
      i32.mul
    end)
  (func $count (param i32)
    (local i64 f64)
    block $out
      loop $top
        local.get 0
        i32.eqz
        br_if $out
        local.get 0
        i32.const 1
        i32.sub
        local.tee 0
        br $top
      end
    end
    f64.const 1.5
    local.set 2
    i32.const 16
    i32.load8_u offset=3
    call $imp
    global.get $g
    i32.const 0
    br_table 0 0)
  (data (i32.const 8) "hello\00"))
"#;

fn disassemble_in_chunks(bytes: &[u8], chunk_size: usize) -> wadis::DisassemblerResult {
    let mut disassembler = WasmDisassembler::new();
    disassembler.set_add_offsets(true).unwrap();
    wadis::disassemble_chunked(bytes, &mut disassembler, chunk_size).unwrap()
}

fn factorial() -> Vec<u8> {
    wat::parse_str(FACTORIAL).unwrap()
}

#[test]
fn chunk_size_does_not_change_output() {
    let bytes = factorial();
    let whole = disassemble_in_chunks(&bytes, bytes.len());

    for chunk_size in [1, 5, 64] {
        let chunked = disassemble_in_chunks(&bytes, chunk_size);
        assert_eq!(chunked.lines, whole.lines, "chunk size {chunk_size}");
        assert_eq!(chunked.offsets, whole.offsets, "chunk size {chunk_size}");
        assert_eq!(
            chunked.function_body_offsets, whole.function_body_offsets,
            "chunk size {chunk_size}"
        );
        assert!(chunked.done);
    }
}

#[gtest]
fn offsets_increase_monotonically() {
    let bytes = factorial();
    let result = disassemble_in_chunks(&bytes, 7);

    let offsets = result.offsets.unwrap_or_default();
    expect_that!(offsets.len(), eq(result.lines.len()));
    expect_true!(offsets.windows(2).all(|pair| pair[0] <= pair[1]));
    expect_that!(offsets.last().copied(), some(eq(bytes.len())));

    let bodies = result.function_body_offsets.unwrap_or_default();
    expect_that!(bodies.len(), eq(2));
    for body in bodies {
        expect_that!(body.start, lt(body.end));
    }
}

#[gtest]
fn output_is_valid_text_format() {
    let text = wadis::disassemble(&factorial()[..]).unwrap();

    expect_that!(text.as_str(), starts_with("(module\n"));
    expect_that!(text.as_str(), contains_substring("  (export \"fac\" (func $func1))"));
    expect_that!(text.as_str(), contains_substring("    if (result i32)"));
    expect_that!(text.as_str(), contains_substring("    block $label0"));
    expect_that!(text.as_str(), contains_substring("      loop $label1"));
    expect_that!(text.as_str(), contains_substring("    i32.load8_u offset=3"));
    expect_that!(text.as_str(), contains_substring("    f64.const 1.5"));
    expect_that!(text.as_str(), contains_substring("  (data (i32.const 8) \"hello\\00\")"));

    // reassembling and disassembling again is a fixed point
    let reassembled = wat::parse_str(&text).expect("disassembly should reassemble");
    let again = wadis::disassemble(&reassembled[..]).unwrap();
    expect_that!(again.as_str(), eq(text.as_str()));
}

#[gtest]
fn truncated_module_is_an_error() {
    let bytes = factorial();
    let truncated = &bytes[..bytes.len() / 2];

    let err = wadis::disassemble(truncated).unwrap_err();
    expect_that!(err.to_string().as_str(), eq("module ended unexpectedly"));
}
