//! Text-format spelling of literals.

/// `f32.const` operand. The value is widened to `f64` first, so it prints
/// with the digits needed to round-trip the widened value.
pub fn format_f32(bits: u32) -> String {
    let value = f32::from_bits(bits);
    if value.is_nan() {
        let sign = if bits >> 31 != 0 { "-" } else { "" };
        let payload = bits & 0x007f_ffff;
        return if payload == 0x0040_0000 {
            format!("{sign}nan")
        } else {
            format!("{sign}nan:{payload:#x}")
        };
    }
    format_finite_or_inf(f64::from(value))
}

/// `f64.const` operand.
pub fn format_f64(bits: u64) -> String {
    let value = f64::from_bits(bits);
    if value.is_nan() {
        let sign = if bits >> 63 != 0 { "-" } else { "" };
        let payload = bits & 0x000f_ffff_ffff_ffff;
        return if payload == 0x0008_0000_0000_0000 {
            format!("{sign}nan")
        } else {
            format!("{sign}nan:{payload:#x}")
        };
    }
    format_finite_or_inf(value)
}

fn format_finite_or_inf(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    format_shortest(value)
}

/// Shortest round-trip digits; plain notation for magnitudes in
/// `[1e-6, 1e21)`, exponent notation with an explicit sign otherwise.
fn format_shortest(value: f64) -> String {
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let body = match exponent {
        0..=20 => {
            let int_len = exponent as usize + 1;
            if digits.len() <= int_len {
                format!("{digits}{}", "0".repeat(int_len - digits.len()))
            } else {
                format!("{}.{}", &digits[..int_len], &digits[int_len..])
            }
        }
        -6..=-1 => format!("0.{}{digits}", "0".repeat((-exponent - 1) as usize)),
        _ => {
            let (first, rest) = digits.split_at(1);
            let fraction = if rest.is_empty() {
                String::new()
            } else {
                format!(".{rest}")
            };
            let exp_sign = if exponent < 0 { '-' } else { '+' };
            format!("{first}{fraction}e{exp_sign}{}", exponent.unsigned_abs())
        }
    };
    format!("{sign}{body}")
}

/// A quoted string literal. Control characters, non-ASCII bytes, `"` and `\`
/// are written as two-digit hex escapes.
pub fn format_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        if b < 0x20 || b >= 0x7f || b == b'"' || b == b'\\' {
            out.push_str(&format!("\\{b:02x}"));
        } else {
            out.push(char::from(b));
        }
    }
    out.push('"');
    out
}

/// `v128.const` operand, as four 32-bit lanes.
pub fn format_v128(bytes: &[u8; 16]) -> String {
    let lanes: Vec<String> = bytes
        .chunks_exact(4)
        .map(|lane| format!("0x{:08x}", u32::from_le_bytes([lane[0], lane[1], lane[2], lane[3]])))
        .collect();
    format!("i32x4 {}", lanes.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_use_shortest_digits() {
        assert_eq!(format_f64(1.5f64.to_bits()), "1.5");
        assert_eq!(format_f64(42.0f64.to_bits()), "42");
        assert_eq!(format_f64(0.1f64.to_bits()), "0.1");
        assert_eq!(format_f64((-273.15f64).to_bits()), "-273.15");
        assert_eq!(format_f32(42.0f32.to_bits()), "42");
        assert_eq!(format_f32(0.1f32.to_bits()), "0.10000000149011612");
    }

    #[test]
    fn large_and_small_magnitudes_switch_to_exponent_form() {
        assert_eq!(format_f64(1e20f64.to_bits()), "100000000000000000000");
        assert_eq!(format_f64(1e21f64.to_bits()), "1e+21");
        assert_eq!(format_f64(1.25e-7f64.to_bits()), "1.25e-7");
        assert_eq!(format_f64(1e-6f64.to_bits()), "0.000001");
        assert_eq!(format_f64(f64::MAX.to_bits()), "1.7976931348623157e+308");
    }

    #[test]
    fn special_values() {
        assert_eq!(format_f64(0.0f64.to_bits()), "0.0");
        assert_eq!(format_f64((-0.0f64).to_bits()), "-0.0");
        assert_eq!(format_f32(f32::INFINITY.to_bits()), "inf");
        assert_eq!(format_f64(f64::NEG_INFINITY.to_bits()), "-inf");
        assert_eq!(format_f32(0x7fc0_0000), "nan");
        assert_eq!(format_f32(0xffc0_0000), "-nan");
        assert_eq!(format_f32(0x7f80_0001), "nan:0x1");
        assert_eq!(format_f64(0x7ff8_0000_0000_0000), "nan");
        assert_eq!(format_f64(0xfff0_0000_0000_0abc), "-nan:0xabc");
    }

    #[test]
    fn strings_escape_unprintable_bytes() {
        assert_eq!(format_string(b"hello"), "\"hello\"");
        assert_eq!(format_string(b"a\"b\\c"), "\"a\\22b\\5cc\"");
        assert_eq!(format_string(&[0x00, 0x0a, 0x7f, 0xff]), "\"\\00\\0a\\7f\\ff\"");
    }

    #[test]
    fn v128_prints_little_endian_lanes() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0x01;
        bytes[7] = 0xff;
        assert_eq!(
            format_v128(&bytes),
            "i32x4 0x00000001 0xff000000 0x00000000 0x00000000"
        );
    }
}
