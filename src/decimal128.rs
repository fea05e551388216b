//! [BSON Decimal128](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md) data type representation

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// The bias added to an exponent when it is stored in the binary form.
const EXPONENT_BIAS: i32 = 6176;

/// The largest allowed unbiased exponent.
const EXPONENT_MAX: i32 = 6111;

/// The smallest allowed unbiased exponent.
const EXPONENT_MIN: i32 = -6176;

/// The largest allowed coefficient (34 decimal digits).
const COEFFICIENT_MAX: u128 = 10u128.pow(34) - 1;

/// Struct representing a 128-bit IEEE 754-2008 decimal floating point number.
///
/// The value is stored in its 16-byte wire representation (binary integer
/// decimal, little-endian). Equality and hashing are bitwise: two values that
/// compare equal numerically but differ in exponent (e.g. `1E+3` and `1000`)
/// are distinct.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    /// The bytes as they appear in a serialized document.
    bytes: [u8; 16],
}

/// A decimal128 value unpacked into its components.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Unpacked {
    NaN,
    Infinity { negative: bool },
    Finite { negative: bool, exp: i32, coeff: u128 },
}

impl Decimal128 {
    /// Constructs a new `Decimal128` from the provided raw byte representation.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Returns the raw byte representation of this `Decimal128`.
    pub const fn bytes(&self) -> [u8; 16] {
        self.bytes
    }

    /// Whether this value is NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self.unpack(), Unpacked::NaN)
    }

    /// Whether this value is positive or negative infinity.
    pub fn is_infinite(&self) -> bool {
        matches!(self.unpack(), Unpacked::Infinity { .. })
    }

    fn unpack(&self) -> Unpacked {
        let bits = u128::from_le_bytes(self.bytes);
        let negative = (bits >> 127) & 1 == 1;

        // The five bits after the sign distinguish finite values from the
        // infinity (11110) and NaN (11111) specials.
        match (bits >> 122) & 0b11111 {
            0b11111 => return Unpacked::NaN,
            0b11110 => return Unpacked::Infinity { negative },
            _ => {}
        }

        let (biased_exp, coeff) = if (bits >> 125) & 0b11 == 0b11 {
            // High-form encoding: two implicit leading coefficient bits. Any
            // coefficient in this form exceeds 34 decimal digits, which the
            // decimal128 specification says to read as zero.
            (((bits >> 111) & 0x3FFF) as i32, 0u128)
        } else {
            let coeff = bits & ((1 << 113) - 1);
            let coeff = if coeff > COEFFICIENT_MAX { 0 } else { coeff };
            (((bits >> 113) & 0x3FFF) as i32, coeff)
        };

        Unpacked::Finite {
            negative,
            exp: biased_exp - EXPONENT_BIAS,
            coeff,
        }
    }

    fn pack(negative: bool, exp: i32, coeff: u128) -> Self {
        debug_assert!((EXPONENT_MIN..=EXPONENT_MAX).contains(&exp));
        debug_assert!(coeff <= COEFFICIENT_MAX);

        let mut bits = coeff;
        bits |= ((exp + EXPONENT_BIAS) as u128) << 113;
        if negative {
            bits |= 1 << 127;
        }
        Self::from_bytes(bits.to_le_bytes())
    }

    fn nan() -> Self {
        Self::from_bytes((0b11111u128 << 122).to_le_bytes())
    }

    fn infinity(negative: bool) -> Self {
        let mut bits = 0b11110u128 << 122;
        if negative {
            bits |= 1 << 127;
        }
        Self::from_bytes(bits.to_le_bytes())
    }

    /// Converts an `f64` to a `Decimal128` through the float's shortest
    /// decimal string form.
    pub fn from_f64_lossy(value: f64) -> Self {
        if value.is_nan() {
            return Self::nan();
        }
        if value.is_infinite() {
            return Self::infinity(value < 0.0);
        }
        // f64 Display never needs more than 34 significant digits or an
        // exponent outside the decimal128 range, so this cannot fail.
        value
            .to_string()
            .parse()
            .unwrap_or_else(|_| Self::from_bytes([0; 16]))
    }

    /// Returns this value as an `i64` if it is exactly representable as one.
    pub(crate) fn to_i64_exact(&self) -> Option<i64> {
        let (negative, v) = self.integer_value()?;
        if negative {
            // - i64::MIN is representable as u128
            if v <= i64::MAX as u128 + 1 {
                Some((v as i128).checked_neg()? as i64)
            } else {
                None
            }
        } else {
            i64::try_from(v).ok()
        }
    }

    /// Returns this value as an `i32` if it is exactly representable as one.
    pub(crate) fn to_i32_exact(&self) -> Option<i32> {
        self.to_i64_exact()?.try_into().ok()
    }

    /// Returns this value as an `f64` if it is exactly representable as one.
    pub(crate) fn to_f64_exact(&self) -> Option<f64> {
        match self.unpack() {
            Unpacked::NaN => None,
            Unpacked::Infinity { negative } => Some(if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }),
            Unpacked::Finite {
                negative,
                exp,
                coeff,
            } => {
                let magnitude = if exp >= 0 {
                    let scaled = coeff.checked_mul(10u128.checked_pow(exp as u32)?)?;
                    let f = scaled as f64;
                    if f.is_finite() && f as u128 == scaled {
                        f
                    } else {
                        return None;
                    }
                } else {
                    // coeff / 10^k is a binary-representable fraction only if
                    // the factor of 5^k divides out of the coefficient.
                    let k = (-exp) as u32;
                    let mut m = coeff;
                    for _ in 0..k {
                        if m % 5 != 0 {
                            return None;
                        }
                        m /= 5;
                    }
                    let f = m as f64;
                    if f as u128 != m {
                        return None;
                    }
                    let scaled = f * 2f64.powi(-(k as i32));
                    // reverse the scaling to detect subnormal rounding
                    if scaled * 2f64.powi(k as i32) != f {
                        return None;
                    }
                    scaled
                };
                Some(if negative { -magnitude } else { magnitude })
            }
        }
    }

    /// The numeric value as an unsigned integer, if integral.
    fn integer_value(&self) -> Option<(bool, u128)> {
        match self.unpack() {
            Unpacked::Finite {
                negative,
                exp,
                coeff,
            } => {
                if exp >= 0 {
                    Some((negative, coeff.checked_mul(10u128.checked_pow(exp as u32)?)?))
                } else {
                    let mut v = coeff;
                    for _ in 0..(-exp) {
                        if v % 10 != 0 {
                            return None;
                        }
                        v /= 10;
                    }
                    Some((negative, v))
                }
            }
            _ => None,
        }
    }
}

impl From<i32> for Decimal128 {
    fn from(value: i32) -> Self {
        Self::from(value as i64)
    }
}

impl From<i64> for Decimal128 {
    fn from(value: i64) -> Self {
        Self::pack(value < 0, 0, value.unsigned_abs() as u128)
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Decimal128(\"{}\")", self)
    }
}

impl fmt::Display for Decimal128 {
    /// Formats the value with the canonical string algorithm from the
    /// decimal128 specification.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.unpack() {
            Unpacked::NaN => write!(f, "NaN"),
            Unpacked::Infinity { negative: false } => write!(f, "Infinity"),
            Unpacked::Infinity { negative: true } => write!(f, "-Infinity"),
            Unpacked::Finite {
                negative,
                exp,
                coeff,
            } => {
                if negative {
                    write!(f, "-")?;
                }
                let digits = coeff.to_string();
                let adjusted = exp + digits.len() as i32 - 1;
                if exp > 0 || adjusted < -6 {
                    // scientific notation
                    write!(f, "{}", &digits[..1])?;
                    if digits.len() > 1 {
                        write!(f, ".{}", &digits[1..])?;
                    }
                    write!(f, "E{}{}", if adjusted >= 0 { "+" } else { "" }, adjusted)
                } else if exp == 0 {
                    write!(f, "{}", digits)
                } else {
                    let point = digits.len() as i32 + exp;
                    if point > 0 {
                        write!(f, "{}.{}", &digits[..point as usize], &digits[point as usize..])
                    } else {
                        write!(f, "0.")?;
                        for _ in 0..-point {
                            write!(f, "0")?;
                        }
                        write!(f, "{}", digits)
                    }
                }
            }
        }
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    /// Parses the canonical decimal128 string representation: an optional
    /// sign, a coefficient with an optional fractional part, and an optional
    /// base-10 exponent, or one of the specials `NaN` / `Infinity` / `Inf`
    /// (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        let mut rest = s;

        let negative = match rest.as_bytes().first() {
            Some(b'-') => {
                rest = &rest[1..];
                true
            }
            Some(b'+') => {
                rest = &rest[1..];
                false
            }
            _ => false,
        };

        if rest.eq_ignore_ascii_case("nan") {
            // NaN carries no sign on the wire
            return Ok(Self::nan());
        }
        if rest.eq_ignore_ascii_case("inf") || rest.eq_ignore_ascii_case("infinity") {
            return Ok(Self::infinity(negative));
        }

        let (mantissa, exp_str) = match rest.find(['e', 'E']) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };

        let mut exp: i64 = match exp_str {
            Some("") => return Err(decimal_error(s, "empty exponent")),
            Some(e) => e
                .parse()
                .map_err(|_| decimal_error(s, "invalid exponent"))?,
            None => 0,
        };

        let (int_part, frac_part) = match mantissa.find('.') {
            Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(decimal_error(s, "empty coefficient"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(decimal_error(s, "invalid coefficient"));
        }
        exp -= frac_part.len() as i64;

        // Accumulate the significant digits, counting but not storing digits
        // past the 34 the coefficient can hold.
        let mut coeff: u128 = 0;
        let mut digits = 0usize;
        let mut dropped = 0i64;
        let mut dropped_nonzero = false;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if coeff == 0 && b == b'0' {
                continue; // leading zero
            }
            if digits == 34 {
                dropped += 1;
                dropped_nonzero |= b != b'0';
                continue;
            }
            coeff = coeff * 10 + (b - b'0') as u128;
            digits += 1;
        }
        if dropped > 0 {
            if dropped_nonzero {
                return Err(decimal_error(s, "inexact rounding"));
            }
            exp += dropped;
        }

        // Clamp the exponent into range, padding or trimming zeros when the
        // coefficient allows it.
        while exp > EXPONENT_MAX as i64 {
            if coeff == 0 {
                exp = EXPONENT_MAX as i64;
                break;
            }
            if coeff > COEFFICIENT_MAX / 10 {
                return Err(decimal_error(s, "overflow"));
            }
            coeff *= 10;
            exp -= 1;
        }
        while exp < EXPONENT_MIN as i64 {
            if coeff == 0 {
                exp = EXPONENT_MIN as i64;
                break;
            }
            if coeff % 10 != 0 {
                return Err(decimal_error(s, "underflow"));
            }
            coeff /= 10;
            exp += 1;
        }

        Ok(Self::pack(negative, exp as i32, coeff))
    }
}

fn decimal_error(input: &str, kind: &str) -> Error {
    Error::invalid_argument(format!("invalid decimal128 string \"{input}\": {kind}"))
}
