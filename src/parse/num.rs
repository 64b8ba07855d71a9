/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Value lexing for the `set` and `thread` commands.
//!
//! Small hand-rolled lexers rather than `str::parse`: the accepted
//! grammar is pinned exactly (no leading `+` on `u32`, no whitespace,
//! single-precision overflow rejected) and the float path must work
//! without any libm support.

use crate::value::{Type, Value};

/// `bit` is exactly `0` or `1`.
pub fn parse_bit(token: &str) -> Option<bool> {
    match token {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

/// Decimal digits only, value must fit in 32 bits.
pub fn parse_u32(token: &str) -> Option<u32> {
    if token.is_empty() {
        return None;
    }
    let mut result: u32 = 0;
    for b in token.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result
            .checked_mul(10)?
            .checked_add((b - b'0') as u32)?;
    }
    Some(result)
}

/// Optional `+`/`-` sign followed by a `u32` lexeme; the value must
/// fit in two's-complement 32 bits.
pub fn parse_s32(token: &str) -> Option<i32> {
    let (neg, rest) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let mag = parse_u32(rest)?;
    if neg {
        if mag > 0x8000_0000 {
            None
        } else {
            Some((mag as i32).wrapping_neg())
        }
    } else {
        if mag > 0x7FFF_FFFF {
            None
        } else {
            Some(mag as i32)
        }
    }
}

/// Optional sign; digits with at most one `.`; optional `e`/`E` signed
/// integer exponent. The mantissa is accumulated as an integer with a
/// decimal shift, the exponent folds into the shift, and the shift is
/// applied as a power of ten built by repeated squaring. Values that
/// round to infinity in single precision are rejected.
pub fn parse_float(token: &str) -> Option<f32> {
    let bytes = token.as_bytes();
    let mut i = 0;
    let neg = match bytes.first()? {
        b'-' => {
            i += 1;
            true
        }
        b'+' => {
            i += 1;
            false
        }
        _ => false,
    };

    let mut mantissa: u32 = 0;
    let mut shift: i32 = 0;
    let mut dp_found = false;
    let mut exponent_part: Option<&str> = None;
    let mut saw_any = false;
    loop {
        let Some(&b) = bytes.get(i) else {
            break;
        };
        if b == b'e' || b == b'E' {
            exponent_part = Some(&token[i + 1..]);
            break;
        }
        if !b.is_ascii_digit() {
            if b == b'.' && !dp_found {
                dp_found = true;
                i += 1;
                saw_any = true;
                continue;
            }
            return None;
        }
        // largest mantissa that can still take another digit
        if mantissa > 429_496_728 {
            // digit is beyond single precision; only track magnitude
            if !dp_found {
                shift += 1;
            }
        } else {
            mantissa = mantissa * 10 + (b - b'0') as u32;
            if dp_found {
                shift -= 1;
            }
        }
        i += 1;
        saw_any = true;
    }
    if !saw_any {
        return None;
    }
    if let Some(exp) = exponent_part {
        shift = shift.checked_add(parse_s32(exp)?)?;
    }
    if shift.unsigned_abs() > 60 {
        return None;
    }

    // power of ten for the shift, by repeated squaring
    let mut squares: f64 = 10.0;
    let mut pow: f64 = 1.0;
    let mut n = shift.unsigned_abs();
    while n != 0 {
        if n & 1 != 0 {
            pow *= squares;
        }
        squares *= squares;
        n >>= 1;
    }
    let shifted = if shift < 0 {
        mantissa as f64 / pow
    } else {
        mantissa as f64 * pow
    };
    let result = shifted as f32;
    if result.is_infinite() {
        return None;
    }
    Some(if neg { -result } else { result })
}

/// Lex a token under a known type tag. `Raw` has no literal form.
pub fn parse_value(ty: Type, token: &str) -> Option<Value> {
    match ty {
        Type::Bit => parse_bit(token).map(Value::Bit),
        Type::Float => parse_float(token).map(Value::Float),
        Type::S32 => parse_s32(token).map(Value::S32),
        Type::U32 => parse_u32(token).map(Value::U32),
        Type::Raw => None,
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_is_strict() {
        assert_eq!(parse_bit("0"), Some(false));
        assert_eq!(parse_bit("1"), Some(true));
        assert_eq!(parse_bit("2"), None);
        assert_eq!(parse_bit("01"), None);
        assert_eq!(parse_bit("true"), None);
    }

    #[test]
    fn u32_boundaries() {
        assert_eq!(parse_u32("0"), Some(0));
        assert_eq!(parse_u32("4294967295"), Some(u32::MAX));
        assert_eq!(parse_u32("4294967296"), None);
        assert_eq!(parse_u32("42949672950"), None);
        assert_eq!(parse_u32("12x4"), None);
        assert_eq!(parse_u32("-1"), None);
        assert_eq!(parse_u32("+1"), None);
        assert_eq!(parse_u32(""), None);
    }

    #[test]
    fn s32_boundaries() {
        assert_eq!(parse_s32("-2147483648"), Some(i32::MIN));
        assert_eq!(parse_s32("2147483647"), Some(i32::MAX));
        assert_eq!(parse_s32("+2147483647"), Some(i32::MAX));
        assert_eq!(parse_s32("2147483648"), None);
        assert_eq!(parse_s32("-2147483649"), None);
        assert_eq!(parse_s32("-"), None);
        assert_eq!(parse_s32(""), None);
    }

    #[test]
    fn float_forms() {
        assert_eq!(parse_float("0"), Some(0.0));
        assert_eq!(parse_float("3.75"), Some(3.75));
        assert_eq!(parse_float("-3.75"), Some(-3.75));
        assert_eq!(parse_float("+0.5"), Some(0.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("2.5e-2"), Some(0.025));
        assert_eq!(parse_float("1E+2"), Some(100.0));
    }

    #[test]
    fn float_rejects() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("1.2.3"), None);
        assert_eq!(parse_float("1e"), None);
        assert_eq!(parse_float("1e1.5"), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("1 "), None);
    }

    #[test]
    fn float_overflow_to_infinity_rejected() {
        // largest finite f32 is about 3.4e38
        assert!(parse_float("3.4e38").is_some());
        assert_eq!(parse_float("1e39"), None);
        assert_eq!(parse_float("-1e39"), None);
        // shift magnitude cap
        assert_eq!(parse_float("1e61"), None);
        assert_eq!(parse_float("1e-61"), None);
    }

    #[test]
    fn float_long_mantissa_keeps_magnitude() {
        // digits beyond single precision are dropped but the
        // magnitude must survive
        let v = parse_float("123456789012345678").unwrap();
        assert!((v - 1.234_567_9e17).abs() < 1e12);
    }

    #[test]
    fn typed_dispatch() {
        use crate::value::Value;
        assert_eq!(parse_value(Type::Bit, "1"), Some(Value::Bit(true)));
        assert_eq!(parse_value(Type::U32, "7"), Some(Value::U32(7)));
        assert_eq!(parse_value(Type::S32, "-7"), Some(Value::S32(-7)));
        assert_eq!(parse_value(Type::Float, "1.5"), Some(Value::Float(1.5)));
        assert_eq!(parse_value(Type::Raw, "1"), None);
    }
}
