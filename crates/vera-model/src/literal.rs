// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Four-valued bit-vector literals
//!
//! A literal is stored as three disjoint bit masks: the defined value bits, the X bits
//! and the Z bits. Width is always known for literals; unsized literals default to 32.

use num::{BigUint, One, Zero};
use std::fmt;

const UNSIZED_WIDTH: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("empty literal")]
    Empty,
    #[error("invalid width in literal `{0}`")]
    InvalidWidth(String),
    #[error("invalid base `{base}` in literal `{text}`")]
    InvalidBase { base: char, text: String },
    #[error("invalid digit `{digit}` in literal `{text}`")]
    InvalidDigit { digit: char, text: String },
}

/// One bit of a four-valued vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitState {
    Zero,
    One,
    X,
    Z,
}

impl BitState {
    fn to_char(self) -> char {
        match self {
            BitState::Zero => '0',
            BitState::One => '1',
            BitState::X => 'x',
            BitState::Z => 'z',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitLiteral {
    width: u32,
    signed: bool,
    value: BigUint,
    x_mask: BigUint,
    z_mask: BigUint,
}

fn bit_of(mask: &BigUint, index: u32) -> bool {
    !((mask >> index as usize) & BigUint::one()).is_zero()
}

fn low_mask(width: u32) -> BigUint {
    (BigUint::one() << width as usize) - BigUint::one()
}

impl BitLiteral {
    /// Defined literal from an unsigned value, truncated to `width`
    pub fn from_u64(width: u32, value: u64) -> Self {
        Self {
            width,
            signed: false,
            value: BigUint::from(value) & low_mask(width),
            x_mask: BigUint::zero(),
            z_mask: BigUint::zero(),
        }
    }

    /// Defined literal from a signed value in two's complement
    pub fn from_i64(width: u32, value: i64) -> Self {
        let mut lit = Self::from_u64(64, value as u64).resize(width, true);
        lit.signed = true;
        lit
    }

    /// Literal whose bits are all X
    pub fn all_x(width: u32) -> Self {
        Self {
            width,
            signed: false,
            value: BigUint::zero(),
            x_mask: low_mask(width),
            z_mask: BigUint::zero(),
        }
    }

    /// Parse Vera literal syntax: `123`, `8'b10xz_0101`, `'hff`, `4'd5`, `16'sh8000`
    pub fn parse(text: &str) -> Result<Self, LiteralError> {
        let trimmed: String = text.chars().filter(|c| *c != '_').collect();
        if trimmed.is_empty() {
            return Err(LiteralError::Empty);
        }

        let Some(quote) = trimmed.find('\'') else {
            // Plain decimal: 32-bit signed integer
            let value: i64 = trimmed
                .parse()
                .map_err(|_| LiteralError::InvalidDigit {
                    digit: trimmed.chars().find(|c| !c.is_ascii_digit()).unwrap_or('?'),
                    text: text.to_string(),
                })?;
            return Ok(Self::from_i64(UNSIZED_WIDTH, value));
        };

        let (width_text, rest) = trimmed.split_at(quote);
        let explicit_width = if width_text.is_empty() {
            None
        } else {
            match width_text.parse::<u32>() {
                Ok(w) if w > 0 => Some(w),
                _ => return Err(LiteralError::InvalidWidth(text.to_string())),
            }
        };

        let mut chars = rest[1..].chars().peekable();
        let signed = matches!(chars.peek(), Some('s') | Some('S'));
        if signed {
            chars.next();
        }
        let base = chars.next().ok_or(LiteralError::Empty)?;
        let digits: Vec<char> = chars.collect();
        if digits.is_empty() {
            return Err(LiteralError::Empty);
        }

        let bits_per_digit = match base.to_ascii_lowercase() {
            'b' => 1,
            'o' => 3,
            'h' => 4,
            'd' => 0,
            _ => {
                return Err(LiteralError::InvalidBase {
                    base,
                    text: text.to_string(),
                })
            }
        };

        let mut lit = if bits_per_digit == 0 {
            Self::parse_decimal(&digits, text)?
        } else {
            Self::parse_radix(&digits, bits_per_digit, text)?
        };

        let natural_width = lit.width;
        let target = explicit_width.unwrap_or_else(|| natural_width.max(UNSIZED_WIDTH));
        if target > natural_width {
            // Leading X/Z digits extend; everything else zero-extends
            let top = lit.bit(natural_width - 1);
            lit = lit.resize(target, false);
            if matches!(top, BitState::X | BitState::Z) {
                let ext = low_mask(target) ^ low_mask(natural_width);
                if top == BitState::X {
                    lit.x_mask |= ext;
                } else {
                    lit.z_mask |= ext;
                }
            }
        } else if target < natural_width {
            lit = lit.resize(target, false);
        }
        lit.signed = signed;
        Ok(lit)
    }

    fn parse_decimal(digits: &[char], text: &str) -> Result<Self, LiteralError> {
        if digits.len() == 1 && matches!(digits[0], 'x' | 'X' | 'z' | 'Z' | '?') {
            let mut lit = Self::all_x(1);
            if !matches!(digits[0], 'x' | 'X') {
                lit.z_mask = lit.x_mask.clone();
                lit.x_mask = BigUint::zero();
            }
            return Ok(lit);
        }
        let mut value = BigUint::zero();
        for &d in digits {
            let digit = d.to_digit(10).ok_or_else(|| LiteralError::InvalidDigit {
                digit: d,
                text: text.to_string(),
            })?;
            value = value * 10u32 + digit;
        }
        let width = (value.bits() as u32).max(1);
        Ok(Self {
            width,
            signed: false,
            value,
            x_mask: BigUint::zero(),
            z_mask: BigUint::zero(),
        })
    }

    fn parse_radix(digits: &[char], bits_per_digit: u32, text: &str) -> Result<Self, LiteralError> {
        let mut value = BigUint::zero();
        let mut x_mask = BigUint::zero();
        let mut z_mask = BigUint::zero();
        let digit_mask = low_mask(bits_per_digit);
        for &d in digits {
            value <<= bits_per_digit as usize;
            x_mask <<= bits_per_digit as usize;
            z_mask <<= bits_per_digit as usize;
            match d {
                'x' | 'X' => x_mask |= digit_mask.clone(),
                'z' | 'Z' | '?' => z_mask |= digit_mask.clone(),
                _ => {
                    let digit = d
                        .to_digit(1 << bits_per_digit)
                        .ok_or_else(|| LiteralError::InvalidDigit {
                            digit: d,
                            text: text.to_string(),
                        })?;
                    value |= BigUint::from(digit);
                }
            }
        }
        Ok(Self {
            width: digits.len() as u32 * bits_per_digit,
            signed: false,
            value,
            x_mask,
            z_mask,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn has_xz(&self) -> bool {
        !self.x_mask.is_zero() || !self.z_mask.is_zero()
    }

    pub fn bit(&self, index: u32) -> BitState {
        assert!(index < self.width, "BUG: bit {} outside literal of width {}", index, self.width);
        if bit_of(&self.x_mask, index) {
            BitState::X
        } else if bit_of(&self.z_mask, index) {
            BitState::Z
        } else if bit_of(&self.value, index) {
            BitState::One
        } else {
            BitState::Zero
        }
    }

    /// Unsigned value when all bits are defined and it fits in 64 bits
    pub fn to_u64(&self) -> Option<u64> {
        if self.has_xz() || self.value.bits() > 64 {
            return None;
        }
        self.value.to_u64_digits().first().copied().or(Some(0))
    }

    /// Value interpreted with the literal's signedness
    pub fn to_i64(&self) -> Option<i64> {
        let raw = self.to_u64()?;
        if self.signed && self.width < 64 && self.width > 0 && bit_of(&self.value, self.width - 1) {
            Some((raw | (!0u64 << self.width)) as i64)
        } else {
            Some(raw as i64)
        }
    }

    /// Change the width, truncating high bits or extending with zeros (or the sign bit)
    pub fn resize(&self, width: u32, sign_extend: bool) -> Self {
        if width <= self.width {
            let mask = low_mask(width);
            return Self {
                width,
                signed: self.signed,
                value: &self.value & &mask,
                x_mask: &self.x_mask & &mask,
                z_mask: &self.z_mask & &mask,
            };
        }
        let mut result = Self {
            width,
            signed: self.signed,
            value: self.value.clone(),
            x_mask: self.x_mask.clone(),
            z_mask: self.z_mask.clone(),
        };
        if sign_extend && self.width > 0 {
            let ext = low_mask(width) ^ low_mask(self.width);
            match self.bit(self.width - 1) {
                BitState::One => result.value |= ext,
                BitState::X => result.x_mask |= ext,
                BitState::Z => result.z_mask |= ext,
                BitState::Zero => {}
            }
        }
        result
    }

    /// Bits `[high:low]` as a new unsigned literal
    pub fn get_bits(&self, high: u32, low: u32) -> Self {
        assert!(
            high >= low && high < self.width,
            "BUG: range [{}:{}] outside literal of width {}",
            high,
            low,
            self.width
        );
        let width = high - low + 1;
        let mask = low_mask(width);
        Self {
            width,
            signed: false,
            value: (&self.value >> low as usize) & &mask,
            x_mask: (&self.x_mask >> low as usize) & &mask,
            z_mask: (&self.z_mask >> low as usize) & &mask,
        }
    }

    /// `{self, low}`: `self` supplies the high-order bits
    pub fn concat(&self, low: &BitLiteral) -> Self {
        let shift = low.width as usize;
        Self {
            width: self.width + low.width,
            signed: false,
            value: (&self.value << shift) | &low.value,
            x_mask: (&self.x_mask << shift) | &low.x_mask,
            z_mask: (&self.z_mask << shift) | &low.z_mask,
        }
    }

    /// MSB-first string of `0`, `1`, `x`, `z`
    pub fn to_binary_string(&self) -> String {
        (0..self.width)
            .rev()
            .map(|i| self.bit(i).to_char())
            .collect()
    }
}

impl fmt::Display for BitLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}'{}b{}",
            self.width,
            if self.signed { "s" } else { "" },
            self.to_binary_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary_with_xz() {
        let lit = BitLiteral::parse("8'b10xz_0101").unwrap();
        assert_eq!(lit.width(), 8);
        assert!(lit.has_xz());
        assert_eq!(lit.to_binary_string(), "10xz0101");
        assert_eq!(lit.bit(5), BitState::X);
        assert_eq!(lit.bit(4), BitState::Z);
        assert_eq!(lit.to_u64(), None);
    }

    #[test]
    fn test_parse_hex_and_decimal() {
        let lit = BitLiteral::parse("'hff").unwrap();
        assert_eq!(lit.width(), 32);
        assert_eq!(lit.to_u64(), Some(255));

        let lit = BitLiteral::parse("4'd5").unwrap();
        assert_eq!(lit.width(), 4);
        assert_eq!(lit.to_binary_string(), "0101");

        let lit = BitLiteral::parse("42").unwrap();
        assert_eq!(lit.width(), 32);
        assert_eq!(lit.to_i64(), Some(42));
    }

    #[test]
    fn test_leading_x_extends() {
        let lit = BitLiteral::parse("8'bx1").unwrap();
        assert_eq!(lit.to_binary_string(), "xxxxxxx1");
        let lit = BitLiteral::parse("4'b1").unwrap();
        assert_eq!(lit.to_binary_string(), "0001");
    }

    #[test]
    fn test_invalid_literals() {
        assert!(matches!(BitLiteral::parse("8'q12"), Err(LiteralError::InvalidBase { .. })));
        assert!(matches!(BitLiteral::parse("4'b102"), Err(LiteralError::InvalidDigit { .. })));
        assert!(matches!(BitLiteral::parse("0'b1"), Err(LiteralError::InvalidWidth(_))));
        assert_eq!(BitLiteral::parse("_"), Err(LiteralError::Empty));
    }

    #[test]
    fn test_signed_values() {
        let lit = BitLiteral::parse("8'shff").unwrap();
        assert_eq!(lit.to_i64(), Some(-1));
        assert_eq!(BitLiteral::from_i64(8, -2).to_binary_string(), "11111110");
    }

    #[test]
    fn test_round_trip_width_preservation() {
        for text in ["8'b10110011", "12'hab5", "3'b100", "16'd65535"] {
            let original = BitLiteral::parse(text).unwrap();
            for wider in [original.width() + 1, 40, 64, 130] {
                for sign in [false, true] {
                    let round_trip = original.resize(wider, sign).resize(original.width(), sign);
                    assert_eq!(
                        round_trip.to_binary_string(),
                        original.to_binary_string(),
                        "{} via {} bits",
                        text,
                        wider
                    );
                }
            }
        }
    }

    #[test]
    fn test_sign_extension_of_x() {
        let lit = BitLiteral::parse("2'bx0").unwrap();
        assert_eq!(lit.resize(4, true).to_binary_string(), "xxx0");
        assert_eq!(lit.resize(4, false).to_binary_string(), "00x0");
    }

    #[test]
    fn test_slice_and_concat() {
        let high = BitLiteral::parse("4'b1010").unwrap();
        let low = BitLiteral::parse("4'b0x01").unwrap();
        let both = high.concat(&low);
        assert_eq!(both.width(), 8);
        assert_eq!(both.get_bits(7, 4), high);
        assert_eq!(both.get_bits(3, 0).to_binary_string(), "0x01");
    }
}
