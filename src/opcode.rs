//! Operator codes and their text-format names.
//!
//! Prefixed operators (`0xfb`, `0xfc`, `0xfd`, `0xfe`) are folded into a
//! single code as `prefix << 8 | sub_opcode`. Sub-opcodes above `0xff` are
//! not assigned by any supported proposal and are rejected by the reader.
use phf::phf_map;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorCode(pub u32);

impl OperatorCode {
    pub const UNREACHABLE: OperatorCode = OperatorCode(0x00);
    pub const NOP: OperatorCode = OperatorCode(0x01);
    pub const BLOCK: OperatorCode = OperatorCode(0x02);
    pub const LOOP: OperatorCode = OperatorCode(0x03);
    pub const IF: OperatorCode = OperatorCode(0x04);
    pub const ELSE: OperatorCode = OperatorCode(0x05);
    pub const TRY: OperatorCode = OperatorCode(0x06);
    pub const CATCH: OperatorCode = OperatorCode(0x07);
    pub const THROW: OperatorCode = OperatorCode(0x08);
    pub const RETHROW: OperatorCode = OperatorCode(0x09);
    pub const UNWIND: OperatorCode = OperatorCode(0x0a);
    pub const END: OperatorCode = OperatorCode(0x0b);
    pub const BR: OperatorCode = OperatorCode(0x0c);
    pub const BR_IF: OperatorCode = OperatorCode(0x0d);
    pub const BR_TABLE: OperatorCode = OperatorCode(0x0e);
    pub const RETURN: OperatorCode = OperatorCode(0x0f);
    pub const CALL: OperatorCode = OperatorCode(0x10);
    pub const CALL_INDIRECT: OperatorCode = OperatorCode(0x11);
    pub const DELEGATE: OperatorCode = OperatorCode(0x18);
    pub const CATCH_ALL: OperatorCode = OperatorCode(0x19);
    pub const DROP: OperatorCode = OperatorCode(0x1a);
    pub const SELECT: OperatorCode = OperatorCode(0x1b);
    pub const SELECT_WITH_TYPE: OperatorCode = OperatorCode(0x1c);
    pub const LOCAL_GET: OperatorCode = OperatorCode(0x20);
    pub const LOCAL_SET: OperatorCode = OperatorCode(0x21);
    pub const GLOBAL_GET: OperatorCode = OperatorCode(0x23);
    pub const GLOBAL_SET: OperatorCode = OperatorCode(0x24);
    pub const I32_LOAD: OperatorCode = OperatorCode(0x28);
    pub const I32_STORE: OperatorCode = OperatorCode(0x36);
    pub const I32_CONST: OperatorCode = OperatorCode(0x41);
    pub const I64_CONST: OperatorCode = OperatorCode(0x42);
    pub const F32_CONST: OperatorCode = OperatorCode(0x43);
    pub const F64_CONST: OperatorCode = OperatorCode(0x44);
    pub const I32_ADD: OperatorCode = OperatorCode(0x6a);
    pub const REF_NULL: OperatorCode = OperatorCode(0xd0);
    pub const REF_FUNC: OperatorCode = OperatorCode(0xd2);

    pub const fn prefixed(prefix: u8, sub_opcode: u8) -> OperatorCode {
        OperatorCode(((prefix as u32) << 8) | sub_opcode as u32)
    }

    /// The text-format mnemonic, if the code is a known operator.
    pub fn name(self) -> Option<&'static str> {
        OPERATOR_NAMES.get(&self.0).copied()
    }

    pub fn prefix(self) -> Option<u8> {
        match self.0 >> 8 {
            0 => None,
            p => u8::try_from(p).ok(),
        }
    }

    /// Log2 of the natural alignment of a memory access, or `None` for
    /// operators without a memory immediate.
    pub fn natural_alignment(self) -> Option<u32> {
        let align = match self.0 {
            0x2c..=0x2d | 0x30..=0x31 | 0x3a | 0x3c => 0,
            0x2e..=0x2f | 0x32..=0x33 | 0x3b | 0x3d => 1,
            0x28 | 0x2a | 0x34..=0x36 | 0x38 | 0x3e => 2,
            0x29 | 0x2b | 0x37 | 0x39 => 3,

            // SIMD
            0xfd00 | 0xfd0b => 4,
            0xfd01..=0xfd06 | 0xfd0a | 0xfd57 | 0xfd5b | 0xfd5d => 3,
            0xfd09 | 0xfd56 | 0xfd5a | 0xfd5c => 2,
            0xfd08 | 0xfd55 | 0xfd59 => 1,
            0xfd07 | 0xfd54 | 0xfd58 => 0,

            // threads
            0xfe00 | 0xfe01 => 2,
            0xfe02 => 3,
            // loads, stores and read-modify-write groups all repeat the
            // same seven access widths
            0xfe10..=0xfe4e => match (self.0 - 0xfe10) % 7 {
                0 | 6 => 2,
                1 => 3,
                2 | 4 => 0,
                _ => 1,
            },
            _ => return None,
        };
        Some(align)
    }
}

impl fmt::Display for OperatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self.prefix()) {
            (Some(name), _) => f.write_str(name),
            (None, Some(prefix)) => write!(f, "{prefix:#04x} {:#04x}", self.0 & 0xff),
            (None, None) => write!(f, "{:#04x}", self.0),
        }
    }
}

static OPERATOR_NAMES: phf::Map<u32, &'static str> = phf_map! {
    // single-byte opcodes
    0x00u32 => "unreachable",
    0x01u32 => "nop",
    0x02u32 => "block",
    0x03u32 => "loop",
    0x04u32 => "if",
    0x05u32 => "else",
    0x06u32 => "try",
    0x07u32 => "catch",
    0x08u32 => "throw",
    0x09u32 => "rethrow",
    0x0au32 => "unwind",
    0x0bu32 => "end",
    0x0cu32 => "br",
    0x0du32 => "br_if",
    0x0eu32 => "br_table",
    0x0fu32 => "return",
    0x10u32 => "call",
    0x11u32 => "call_indirect",
    0x12u32 => "return_call",
    0x13u32 => "return_call_indirect",
    0x14u32 => "call_ref",
    0x15u32 => "return_call_ref",
    0x18u32 => "delegate",
    0x19u32 => "catch_all",
    0x1au32 => "drop",
    0x1bu32 => "select",
    0x1cu32 => "select",
    0x20u32 => "local.get",
    0x21u32 => "local.set",
    0x22u32 => "local.tee",
    0x23u32 => "global.get",
    0x24u32 => "global.set",
    0x25u32 => "table.get",
    0x26u32 => "table.set",
    0x28u32 => "i32.load",
    0x29u32 => "i64.load",
    0x2au32 => "f32.load",
    0x2bu32 => "f64.load",
    0x2cu32 => "i32.load8_s",
    0x2du32 => "i32.load8_u",
    0x2eu32 => "i32.load16_s",
    0x2fu32 => "i32.load16_u",
    0x30u32 => "i64.load8_s",
    0x31u32 => "i64.load8_u",
    0x32u32 => "i64.load16_s",
    0x33u32 => "i64.load16_u",
    0x34u32 => "i64.load32_s",
    0x35u32 => "i64.load32_u",
    0x36u32 => "i32.store",
    0x37u32 => "i64.store",
    0x38u32 => "f32.store",
    0x39u32 => "f64.store",
    0x3au32 => "i32.store8",
    0x3bu32 => "i32.store16",
    0x3cu32 => "i64.store8",
    0x3du32 => "i64.store16",
    0x3eu32 => "i64.store32",
    0x3fu32 => "memory.size",
    0x40u32 => "memory.grow",
    0x41u32 => "i32.const",
    0x42u32 => "i64.const",
    0x43u32 => "f32.const",
    0x44u32 => "f64.const",
    0x45u32 => "i32.eqz",
    0x46u32 => "i32.eq",
    0x47u32 => "i32.ne",
    0x48u32 => "i32.lt_s",
    0x49u32 => "i32.lt_u",
    0x4au32 => "i32.gt_s",
    0x4bu32 => "i32.gt_u",
    0x4cu32 => "i32.le_s",
    0x4du32 => "i32.le_u",
    0x4eu32 => "i32.ge_s",
    0x4fu32 => "i32.ge_u",
    0x50u32 => "i64.eqz",
    0x51u32 => "i64.eq",
    0x52u32 => "i64.ne",
    0x53u32 => "i64.lt_s",
    0x54u32 => "i64.lt_u",
    0x55u32 => "i64.gt_s",
    0x56u32 => "i64.gt_u",
    0x57u32 => "i64.le_s",
    0x58u32 => "i64.le_u",
    0x59u32 => "i64.ge_s",
    0x5au32 => "i64.ge_u",
    0x5bu32 => "f32.eq",
    0x5cu32 => "f32.ne",
    0x5du32 => "f32.lt",
    0x5eu32 => "f32.gt",
    0x5fu32 => "f32.le",
    0x60u32 => "f32.ge",
    0x61u32 => "f64.eq",
    0x62u32 => "f64.ne",
    0x63u32 => "f64.lt",
    0x64u32 => "f64.gt",
    0x65u32 => "f64.le",
    0x66u32 => "f64.ge",
    0x67u32 => "i32.clz",
    0x68u32 => "i32.ctz",
    0x69u32 => "i32.popcnt",
    0x6au32 => "i32.add",
    0x6bu32 => "i32.sub",
    0x6cu32 => "i32.mul",
    0x6du32 => "i32.div_s",
    0x6eu32 => "i32.div_u",
    0x6fu32 => "i32.rem_s",
    0x70u32 => "i32.rem_u",
    0x71u32 => "i32.and",
    0x72u32 => "i32.or",
    0x73u32 => "i32.xor",
    0x74u32 => "i32.shl",
    0x75u32 => "i32.shr_s",
    0x76u32 => "i32.shr_u",
    0x77u32 => "i32.rotl",
    0x78u32 => "i32.rotr",
    0x79u32 => "i64.clz",
    0x7au32 => "i64.ctz",
    0x7bu32 => "i64.popcnt",
    0x7cu32 => "i64.add",
    0x7du32 => "i64.sub",
    0x7eu32 => "i64.mul",
    0x7fu32 => "i64.div_s",
    0x80u32 => "i64.div_u",
    0x81u32 => "i64.rem_s",
    0x82u32 => "i64.rem_u",
    0x83u32 => "i64.and",
    0x84u32 => "i64.or",
    0x85u32 => "i64.xor",
    0x86u32 => "i64.shl",
    0x87u32 => "i64.shr_s",
    0x88u32 => "i64.shr_u",
    0x89u32 => "i64.rotl",
    0x8au32 => "i64.rotr",
    0x8bu32 => "f32.abs",
    0x8cu32 => "f32.neg",
    0x8du32 => "f32.ceil",
    0x8eu32 => "f32.floor",
    0x8fu32 => "f32.trunc",
    0x90u32 => "f32.nearest",
    0x91u32 => "f32.sqrt",
    0x92u32 => "f32.add",
    0x93u32 => "f32.sub",
    0x94u32 => "f32.mul",
    0x95u32 => "f32.div",
    0x96u32 => "f32.min",
    0x97u32 => "f32.max",
    0x98u32 => "f32.copysign",
    0x99u32 => "f64.abs",
    0x9au32 => "f64.neg",
    0x9bu32 => "f64.ceil",
    0x9cu32 => "f64.floor",
    0x9du32 => "f64.trunc",
    0x9eu32 => "f64.nearest",
    0x9fu32 => "f64.sqrt",
    0xa0u32 => "f64.add",
    0xa1u32 => "f64.sub",
    0xa2u32 => "f64.mul",
    0xa3u32 => "f64.div",
    0xa4u32 => "f64.min",
    0xa5u32 => "f64.max",
    0xa6u32 => "f64.copysign",
    0xa7u32 => "i32.wrap_i64",
    0xa8u32 => "i32.trunc_f32_s",
    0xa9u32 => "i32.trunc_f32_u",
    0xaau32 => "i32.trunc_f64_s",
    0xabu32 => "i32.trunc_f64_u",
    0xacu32 => "i64.extend_i32_s",
    0xadu32 => "i64.extend_i32_u",
    0xaeu32 => "i64.trunc_f32_s",
    0xafu32 => "i64.trunc_f32_u",
    0xb0u32 => "i64.trunc_f64_s",
    0xb1u32 => "i64.trunc_f64_u",
    0xb2u32 => "f32.convert_i32_s",
    0xb3u32 => "f32.convert_i32_u",
    0xb4u32 => "f32.convert_i64_s",
    0xb5u32 => "f32.convert_i64_u",
    0xb6u32 => "f32.demote_f64",
    0xb7u32 => "f64.convert_i32_s",
    0xb8u32 => "f64.convert_i32_u",
    0xb9u32 => "f64.convert_i64_s",
    0xbau32 => "f64.convert_i64_u",
    0xbbu32 => "f64.promote_f32",
    0xbcu32 => "i32.reinterpret_f32",
    0xbdu32 => "i64.reinterpret_f64",
    0xbeu32 => "f32.reinterpret_i32",
    0xbfu32 => "f64.reinterpret_i64",
    0xc0u32 => "i32.extend8_s",
    0xc1u32 => "i32.extend16_s",
    0xc2u32 => "i64.extend8_s",
    0xc3u32 => "i64.extend16_s",
    0xc4u32 => "i64.extend32_s",
    0xd0u32 => "ref.null",
    0xd1u32 => "ref.is_null",
    0xd2u32 => "ref.func",
    0xd3u32 => "ref.as_non_null",
    0xd4u32 => "br_on_null",
    0xd5u32 => "ref.eq",
    0xd6u32 => "br_on_non_null",
    // 0xfb: garbage collection
    0xfb01u32 => "struct.new_with_rtt",
    0xfb02u32 => "struct.new_default_with_rtt",
    0xfb03u32 => "struct.get",
    0xfb04u32 => "struct.get_s",
    0xfb05u32 => "struct.get_u",
    0xfb06u32 => "struct.set",
    0xfb11u32 => "array.new_with_rtt",
    0xfb12u32 => "array.new_default_with_rtt",
    0xfb13u32 => "array.get",
    0xfb14u32 => "array.get_s",
    0xfb15u32 => "array.get_u",
    0xfb16u32 => "array.set",
    0xfb17u32 => "array.len",
    0xfb18u32 => "array.copy",
    0xfb20u32 => "i31.new",
    0xfb21u32 => "i31.get_s",
    0xfb22u32 => "i31.get_u",
    0xfb30u32 => "rtt.canon",
    0xfb31u32 => "rtt.sub",
    0xfb32u32 => "rtt.fresh_sub",
    0xfb40u32 => "ref.test",
    0xfb41u32 => "ref.cast",
    0xfb42u32 => "br_on_cast",
    0xfb43u32 => "br_on_cast_fail",
    0xfb50u32 => "ref.is_func",
    0xfb51u32 => "ref.is_data",
    0xfb52u32 => "ref.is_i31",
    0xfb58u32 => "ref.as_func",
    0xfb59u32 => "ref.as_data",
    0xfb5au32 => "ref.as_i31",
    0xfb60u32 => "br_on_func",
    0xfb61u32 => "br_on_data",
    0xfb62u32 => "br_on_i31",
    0xfb63u32 => "br_on_non_func",
    0xfb64u32 => "br_on_non_data",
    0xfb65u32 => "br_on_non_i31",
    // 0xfc: saturating truncation, bulk memory and tables
    0xfc00u32 => "i32.trunc_sat_f32_s",
    0xfc01u32 => "i32.trunc_sat_f32_u",
    0xfc02u32 => "i32.trunc_sat_f64_s",
    0xfc03u32 => "i32.trunc_sat_f64_u",
    0xfc04u32 => "i64.trunc_sat_f32_s",
    0xfc05u32 => "i64.trunc_sat_f32_u",
    0xfc06u32 => "i64.trunc_sat_f64_s",
    0xfc07u32 => "i64.trunc_sat_f64_u",
    0xfc08u32 => "memory.init",
    0xfc09u32 => "data.drop",
    0xfc0au32 => "memory.copy",
    0xfc0bu32 => "memory.fill",
    0xfc0cu32 => "table.init",
    0xfc0du32 => "elem.drop",
    0xfc0eu32 => "table.copy",
    0xfc0fu32 => "table.grow",
    0xfc10u32 => "table.size",
    0xfc11u32 => "table.fill",
    // 0xfd: SIMD
    0xfd00u32 => "v128.load",
    0xfd01u32 => "v128.load8x8_s",
    0xfd02u32 => "v128.load8x8_u",
    0xfd03u32 => "v128.load16x4_s",
    0xfd04u32 => "v128.load16x4_u",
    0xfd05u32 => "v128.load32x2_s",
    0xfd06u32 => "v128.load32x2_u",
    0xfd07u32 => "v128.load8_splat",
    0xfd08u32 => "v128.load16_splat",
    0xfd09u32 => "v128.load32_splat",
    0xfd0au32 => "v128.load64_splat",
    0xfd0bu32 => "v128.store",
    0xfd0cu32 => "v128.const",
    0xfd0du32 => "i8x16.shuffle",
    0xfd0eu32 => "i8x16.swizzle",
    0xfd0fu32 => "i8x16.splat",
    0xfd10u32 => "i16x8.splat",
    0xfd11u32 => "i32x4.splat",
    0xfd12u32 => "i64x2.splat",
    0xfd13u32 => "f32x4.splat",
    0xfd14u32 => "f64x2.splat",
    0xfd15u32 => "i8x16.extract_lane_s",
    0xfd16u32 => "i8x16.extract_lane_u",
    0xfd17u32 => "i8x16.replace_lane",
    0xfd18u32 => "i16x8.extract_lane_s",
    0xfd19u32 => "i16x8.extract_lane_u",
    0xfd1au32 => "i16x8.replace_lane",
    0xfd1bu32 => "i32x4.extract_lane",
    0xfd1cu32 => "i32x4.replace_lane",
    0xfd1du32 => "i64x2.extract_lane",
    0xfd1eu32 => "i64x2.replace_lane",
    0xfd1fu32 => "f32x4.extract_lane",
    0xfd20u32 => "f32x4.replace_lane",
    0xfd21u32 => "f64x2.extract_lane",
    0xfd22u32 => "f64x2.replace_lane",
    0xfd23u32 => "i8x16.eq",
    0xfd24u32 => "i8x16.ne",
    0xfd25u32 => "i8x16.lt_s",
    0xfd26u32 => "i8x16.lt_u",
    0xfd27u32 => "i8x16.gt_s",
    0xfd28u32 => "i8x16.gt_u",
    0xfd29u32 => "i8x16.le_s",
    0xfd2au32 => "i8x16.le_u",
    0xfd2bu32 => "i8x16.ge_s",
    0xfd2cu32 => "i8x16.ge_u",
    0xfd2du32 => "i16x8.eq",
    0xfd2eu32 => "i16x8.ne",
    0xfd2fu32 => "i16x8.lt_s",
    0xfd30u32 => "i16x8.lt_u",
    0xfd31u32 => "i16x8.gt_s",
    0xfd32u32 => "i16x8.gt_u",
    0xfd33u32 => "i16x8.le_s",
    0xfd34u32 => "i16x8.le_u",
    0xfd35u32 => "i16x8.ge_s",
    0xfd36u32 => "i16x8.ge_u",
    0xfd37u32 => "i32x4.eq",
    0xfd38u32 => "i32x4.ne",
    0xfd39u32 => "i32x4.lt_s",
    0xfd3au32 => "i32x4.lt_u",
    0xfd3bu32 => "i32x4.gt_s",
    0xfd3cu32 => "i32x4.gt_u",
    0xfd3du32 => "i32x4.le_s",
    0xfd3eu32 => "i32x4.le_u",
    0xfd3fu32 => "i32x4.ge_s",
    0xfd40u32 => "i32x4.ge_u",
    0xfd41u32 => "f32x4.eq",
    0xfd42u32 => "f32x4.ne",
    0xfd43u32 => "f32x4.lt",
    0xfd44u32 => "f32x4.gt",
    0xfd45u32 => "f32x4.le",
    0xfd46u32 => "f32x4.ge",
    0xfd47u32 => "f64x2.eq",
    0xfd48u32 => "f64x2.ne",
    0xfd49u32 => "f64x2.lt",
    0xfd4au32 => "f64x2.gt",
    0xfd4bu32 => "f64x2.le",
    0xfd4cu32 => "f64x2.ge",
    0xfd4du32 => "v128.not",
    0xfd4eu32 => "v128.and",
    0xfd4fu32 => "v128.andnot",
    0xfd50u32 => "v128.or",
    0xfd51u32 => "v128.xor",
    0xfd52u32 => "v128.bitselect",
    0xfd53u32 => "v128.any_true",
    0xfd54u32 => "v128.load8_lane",
    0xfd55u32 => "v128.load16_lane",
    0xfd56u32 => "v128.load32_lane",
    0xfd57u32 => "v128.load64_lane",
    0xfd58u32 => "v128.store8_lane",
    0xfd59u32 => "v128.store16_lane",
    0xfd5au32 => "v128.store32_lane",
    0xfd5bu32 => "v128.store64_lane",
    0xfd5cu32 => "v128.load32_zero",
    0xfd5du32 => "v128.load64_zero",
    0xfd5eu32 => "f32x4.demote_f64x2_zero",
    0xfd5fu32 => "f64x2.promote_low_f32x4",
    0xfd60u32 => "i8x16.abs",
    0xfd61u32 => "i8x16.neg",
    0xfd62u32 => "i8x16.popcnt",
    0xfd63u32 => "i8x16.all_true",
    0xfd64u32 => "i8x16.bitmask",
    0xfd65u32 => "i8x16.narrow_i16x8_s",
    0xfd66u32 => "i8x16.narrow_i16x8_u",
    0xfd67u32 => "f32x4.ceil",
    0xfd68u32 => "f32x4.floor",
    0xfd69u32 => "f32x4.trunc",
    0xfd6au32 => "f32x4.nearest",
    0xfd6bu32 => "i8x16.shl",
    0xfd6cu32 => "i8x16.shr_s",
    0xfd6du32 => "i8x16.shr_u",
    0xfd6eu32 => "i8x16.add",
    0xfd6fu32 => "i8x16.add_sat_s",
    0xfd70u32 => "i8x16.add_sat_u",
    0xfd71u32 => "i8x16.sub",
    0xfd72u32 => "i8x16.sub_sat_s",
    0xfd73u32 => "i8x16.sub_sat_u",
    0xfd74u32 => "f64x2.ceil",
    0xfd75u32 => "f64x2.floor",
    0xfd76u32 => "i8x16.min_s",
    0xfd77u32 => "i8x16.min_u",
    0xfd78u32 => "i8x16.max_s",
    0xfd79u32 => "i8x16.max_u",
    0xfd7au32 => "f64x2.trunc",
    0xfd7bu32 => "i8x16.avgr_u",
    0xfd7cu32 => "i16x8.extadd_pairwise_i8x16_s",
    0xfd7du32 => "i16x8.extadd_pairwise_i8x16_u",
    0xfd7eu32 => "i32x4.extadd_pairwise_i16x8_s",
    0xfd7fu32 => "i32x4.extadd_pairwise_i16x8_u",
    0xfd80u32 => "i16x8.abs",
    0xfd81u32 => "i16x8.neg",
    0xfd82u32 => "i16x8.q15mulr_sat_s",
    0xfd83u32 => "i16x8.all_true",
    0xfd84u32 => "i16x8.bitmask",
    0xfd85u32 => "i16x8.narrow_i32x4_s",
    0xfd86u32 => "i16x8.narrow_i32x4_u",
    0xfd87u32 => "i16x8.extend_low_i8x16_s",
    0xfd88u32 => "i16x8.extend_high_i8x16_s",
    0xfd89u32 => "i16x8.extend_low_i8x16_u",
    0xfd8au32 => "i16x8.extend_high_i8x16_u",
    0xfd8bu32 => "i16x8.shl",
    0xfd8cu32 => "i16x8.shr_s",
    0xfd8du32 => "i16x8.shr_u",
    0xfd8eu32 => "i16x8.add",
    0xfd8fu32 => "i16x8.add_sat_s",
    0xfd90u32 => "i16x8.add_sat_u",
    0xfd91u32 => "i16x8.sub",
    0xfd92u32 => "i16x8.sub_sat_s",
    0xfd93u32 => "i16x8.sub_sat_u",
    0xfd94u32 => "f64x2.nearest",
    0xfd95u32 => "i16x8.mul",
    0xfd96u32 => "i16x8.min_s",
    0xfd97u32 => "i16x8.min_u",
    0xfd98u32 => "i16x8.max_s",
    0xfd99u32 => "i16x8.max_u",
    0xfd9bu32 => "i16x8.avgr_u",
    0xfd9cu32 => "i16x8.extmul_low_i8x16_s",
    0xfd9du32 => "i16x8.extmul_high_i8x16_s",
    0xfd9eu32 => "i16x8.extmul_low_i8x16_u",
    0xfd9fu32 => "i16x8.extmul_high_i8x16_u",
    0xfda0u32 => "i32x4.abs",
    0xfda1u32 => "i32x4.neg",
    0xfda3u32 => "i32x4.all_true",
    0xfda4u32 => "i32x4.bitmask",
    0xfda7u32 => "i32x4.extend_low_i16x8_s",
    0xfda8u32 => "i32x4.extend_high_i16x8_s",
    0xfda9u32 => "i32x4.extend_low_i16x8_u",
    0xfdaau32 => "i32x4.extend_high_i16x8_u",
    0xfdabu32 => "i32x4.shl",
    0xfdacu32 => "i32x4.shr_s",
    0xfdadu32 => "i32x4.shr_u",
    0xfdaeu32 => "i32x4.add",
    0xfdb1u32 => "i32x4.sub",
    0xfdb5u32 => "i32x4.mul",
    0xfdb6u32 => "i32x4.min_s",
    0xfdb7u32 => "i32x4.min_u",
    0xfdb8u32 => "i32x4.max_s",
    0xfdb9u32 => "i32x4.max_u",
    0xfdbau32 => "i32x4.dot_i16x8_s",
    0xfdbcu32 => "i32x4.extmul_low_i16x8_s",
    0xfdbdu32 => "i32x4.extmul_high_i16x8_s",
    0xfdbeu32 => "i32x4.extmul_low_i16x8_u",
    0xfdbfu32 => "i32x4.extmul_high_i16x8_u",
    0xfdc0u32 => "i64x2.abs",
    0xfdc1u32 => "i64x2.neg",
    0xfdc3u32 => "i64x2.all_true",
    0xfdc4u32 => "i64x2.bitmask",
    0xfdc7u32 => "i64x2.extend_low_i32x4_s",
    0xfdc8u32 => "i64x2.extend_high_i32x4_s",
    0xfdc9u32 => "i64x2.extend_low_i32x4_u",
    0xfdcau32 => "i64x2.extend_high_i32x4_u",
    0xfdcbu32 => "i64x2.shl",
    0xfdccu32 => "i64x2.shr_s",
    0xfdcdu32 => "i64x2.shr_u",
    0xfdceu32 => "i64x2.add",
    0xfdd1u32 => "i64x2.sub",
    0xfdd5u32 => "i64x2.mul",
    0xfdd6u32 => "i64x2.eq",
    0xfdd7u32 => "i64x2.ne",
    0xfdd8u32 => "i64x2.lt_s",
    0xfdd9u32 => "i64x2.gt_s",
    0xfddau32 => "i64x2.le_s",
    0xfddbu32 => "i64x2.ge_s",
    0xfddcu32 => "i64x2.extmul_low_i32x4_s",
    0xfdddu32 => "i64x2.extmul_high_i32x4_s",
    0xfddeu32 => "i64x2.extmul_low_i32x4_u",
    0xfddfu32 => "i64x2.extmul_high_i32x4_u",
    0xfde0u32 => "f32x4.abs",
    0xfde1u32 => "f32x4.neg",
    0xfde3u32 => "f32x4.sqrt",
    0xfde4u32 => "f32x4.add",
    0xfde5u32 => "f32x4.sub",
    0xfde6u32 => "f32x4.mul",
    0xfde7u32 => "f32x4.div",
    0xfde8u32 => "f32x4.min",
    0xfde9u32 => "f32x4.max",
    0xfdeau32 => "f32x4.pmin",
    0xfdebu32 => "f32x4.pmax",
    0xfdecu32 => "f64x2.abs",
    0xfdedu32 => "f64x2.neg",
    0xfdefu32 => "f64x2.sqrt",
    0xfdf0u32 => "f64x2.add",
    0xfdf1u32 => "f64x2.sub",
    0xfdf2u32 => "f64x2.mul",
    0xfdf3u32 => "f64x2.div",
    0xfdf4u32 => "f64x2.min",
    0xfdf5u32 => "f64x2.max",
    0xfdf6u32 => "f64x2.pmin",
    0xfdf7u32 => "f64x2.pmax",
    0xfdf8u32 => "i32x4.trunc_sat_f32x4_s",
    0xfdf9u32 => "i32x4.trunc_sat_f32x4_u",
    0xfdfau32 => "f32x4.convert_i32x4_s",
    0xfdfbu32 => "f32x4.convert_i32x4_u",
    0xfdfcu32 => "i32x4.trunc_sat_f64x2_s_zero",
    0xfdfdu32 => "i32x4.trunc_sat_f64x2_u_zero",
    0xfdfeu32 => "f64x2.convert_low_i32x4_s",
    0xfdffu32 => "f64x2.convert_low_i32x4_u",
    // 0xfe: threads
    0xfe00u32 => "memory.atomic.notify",
    0xfe01u32 => "memory.atomic.wait32",
    0xfe02u32 => "memory.atomic.wait64",
    0xfe03u32 => "atomic.fence",
    0xfe10u32 => "i32.atomic.load",
    0xfe11u32 => "i64.atomic.load",
    0xfe12u32 => "i32.atomic.load8_u",
    0xfe13u32 => "i32.atomic.load16_u",
    0xfe14u32 => "i64.atomic.load8_u",
    0xfe15u32 => "i64.atomic.load16_u",
    0xfe16u32 => "i64.atomic.load32_u",
    0xfe17u32 => "i32.atomic.store",
    0xfe18u32 => "i64.atomic.store",
    0xfe19u32 => "i32.atomic.store8",
    0xfe1au32 => "i32.atomic.store16",
    0xfe1bu32 => "i64.atomic.store8",
    0xfe1cu32 => "i64.atomic.store16",
    0xfe1du32 => "i64.atomic.store32",
    0xfe1eu32 => "i32.atomic.rmw.add",
    0xfe1fu32 => "i64.atomic.rmw.add",
    0xfe20u32 => "i32.atomic.rmw8.add_u",
    0xfe21u32 => "i32.atomic.rmw16.add_u",
    0xfe22u32 => "i64.atomic.rmw8.add_u",
    0xfe23u32 => "i64.atomic.rmw16.add_u",
    0xfe24u32 => "i64.atomic.rmw32.add_u",
    0xfe25u32 => "i32.atomic.rmw.sub",
    0xfe26u32 => "i64.atomic.rmw.sub",
    0xfe27u32 => "i32.atomic.rmw8.sub_u",
    0xfe28u32 => "i32.atomic.rmw16.sub_u",
    0xfe29u32 => "i64.atomic.rmw8.sub_u",
    0xfe2au32 => "i64.atomic.rmw16.sub_u",
    0xfe2bu32 => "i64.atomic.rmw32.sub_u",
    0xfe2cu32 => "i32.atomic.rmw.and",
    0xfe2du32 => "i64.atomic.rmw.and",
    0xfe2eu32 => "i32.atomic.rmw8.and_u",
    0xfe2fu32 => "i32.atomic.rmw16.and_u",
    0xfe30u32 => "i64.atomic.rmw8.and_u",
    0xfe31u32 => "i64.atomic.rmw16.and_u",
    0xfe32u32 => "i64.atomic.rmw32.and_u",
    0xfe33u32 => "i32.atomic.rmw.or",
    0xfe34u32 => "i64.atomic.rmw.or",
    0xfe35u32 => "i32.atomic.rmw8.or_u",
    0xfe36u32 => "i32.atomic.rmw16.or_u",
    0xfe37u32 => "i64.atomic.rmw8.or_u",
    0xfe38u32 => "i64.atomic.rmw16.or_u",
    0xfe39u32 => "i64.atomic.rmw32.or_u",
    0xfe3au32 => "i32.atomic.rmw.xor",
    0xfe3bu32 => "i64.atomic.rmw.xor",
    0xfe3cu32 => "i32.atomic.rmw8.xor_u",
    0xfe3du32 => "i32.atomic.rmw16.xor_u",
    0xfe3eu32 => "i64.atomic.rmw8.xor_u",
    0xfe3fu32 => "i64.atomic.rmw16.xor_u",
    0xfe40u32 => "i64.atomic.rmw32.xor_u",
    0xfe41u32 => "i32.atomic.rmw.xchg",
    0xfe42u32 => "i64.atomic.rmw.xchg",
    0xfe43u32 => "i32.atomic.rmw8.xchg_u",
    0xfe44u32 => "i32.atomic.rmw16.xchg_u",
    0xfe45u32 => "i64.atomic.rmw8.xchg_u",
    0xfe46u32 => "i64.atomic.rmw16.xchg_u",
    0xfe47u32 => "i64.atomic.rmw32.xchg_u",
    0xfe48u32 => "i32.atomic.rmw.cmpxchg",
    0xfe49u32 => "i64.atomic.rmw.cmpxchg",
    0xfe4au32 => "i32.atomic.rmw8.cmpxchg_u",
    0xfe4bu32 => "i32.atomic.rmw16.cmpxchg_u",
    0xfe4cu32 => "i64.atomic.rmw8.cmpxchg_u",
    0xfe4du32 => "i64.atomic.rmw16.cmpxchg_u",
    0xfe4eu32 => "i64.atomic.rmw32.cmpxchg_u",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_every_proposal_table() {
        assert_eq!(OperatorCode::BLOCK.name(), Some("block"));
        assert_eq!(OperatorCode(0xa7).name(), Some("i32.wrap_i64"));
        assert_eq!(OperatorCode::prefixed(0xfc, 0x0a).name(), Some("memory.copy"));
        assert_eq!(OperatorCode::prefixed(0xfd, 0xff).name(), Some("f64x2.convert_low_i32x4_u"));
        assert_eq!(OperatorCode::prefixed(0xfe, 0x4e).name(), Some("i64.atomic.rmw32.cmpxchg_u"));
        assert_eq!(OperatorCode::prefixed(0xfb, 0x30).name(), Some("rtt.canon"));
        assert_eq!(OperatorCode(0x27).name(), None);
    }

    #[test]
    fn unknown_codes_display_as_hex() {
        assert_eq!(OperatorCode(0x27).to_string(), "0x27");
        assert_eq!(OperatorCode::prefixed(0xfd, 0x9a).to_string(), "0xfd 0x9a");
    }

    #[test]
    fn natural_alignment_follows_access_width() {
        assert_eq!(OperatorCode::I32_LOAD.natural_alignment(), Some(2));
        assert_eq!(OperatorCode(0x31).natural_alignment(), Some(0)); // i64.load8_u
        assert_eq!(OperatorCode(0x3e).natural_alignment(), Some(2)); // i64.store32
        assert_eq!(OperatorCode::prefixed(0xfd, 0x00).natural_alignment(), Some(4));
        assert_eq!(OperatorCode::prefixed(0xfd, 0x55).natural_alignment(), Some(1));
        assert_eq!(OperatorCode::prefixed(0xfe, 0x02).natural_alignment(), Some(3));
        assert_eq!(OperatorCode::prefixed(0xfe, 0x16).natural_alignment(), Some(2)); // i64.atomic.load32_u
        assert_eq!(OperatorCode::prefixed(0xfe, 0x1f).natural_alignment(), Some(3)); // i64.atomic.rmw.add
        assert_eq!(OperatorCode::prefixed(0xfe, 0x4a).natural_alignment(), Some(0)); // i32.atomic.rmw8.cmpxchg_u
        assert_eq!(OperatorCode::I32_ADD.natural_alignment(), None);
    }
}
