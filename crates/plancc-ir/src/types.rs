//! Column type descriptors
//!
//! A `TypeDescriptor` is all the code generator knows about a column's domain:
//! a display name, the name of the generated-code type, and its physical size.
//! Literals are cast at translation time so malformed values never reach the
//! generated program.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest numeric precision whose raw value still fits an `i64`
pub const MAX_NUMERIC_PRECISION: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("Invalid numeric type: precision {precision}, scale {scale}")]
    InvalidNumeric { precision: u8, scale: u8 },

    #[error("Invalid length 0 for {0}")]
    ZeroLength(&'static str),
}

/// Malformed literal for a given column domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot cast {literal:?} to {ty}: {reason}")]
pub struct ValueFormatError {
    pub ty: String,
    pub literal: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypeDescriptor {
    Integer,
    BigInt,
    Date,
    Numeric { precision: u8, scale: u8 },
    Char { length: u32 },
    Varchar { length: u32 },
}

impl TypeDescriptor {
    /// Human readable name, e.g. `Numeric(12, 2)`
    pub fn name(&self) -> String {
        match self {
            TypeDescriptor::Integer => "Integer".to_string(),
            TypeDescriptor::BigInt => "BigInt".to_string(),
            TypeDescriptor::Date => "Date".to_string(),
            TypeDescriptor::Numeric { precision, scale } => {
                format!("Numeric({}, {})", precision, scale)
            }
            TypeDescriptor::Char { length } => format!("Char({})", length),
            TypeDescriptor::Varchar { length } => format!("Varchar({})", length),
        }
    }

    /// Name of the type in generated code
    pub fn code_type(&self) -> String {
        match self {
            TypeDescriptor::Integer => "types::Integer".to_string(),
            TypeDescriptor::BigInt => "types::BigInt".to_string(),
            TypeDescriptor::Date => "types::Date".to_string(),
            TypeDescriptor::Numeric { precision, scale } => {
                format!("types::Numeric<{}, {}>", precision, scale)
            }
            TypeDescriptor::Char { length } => format!("types::Char<{}>", length),
            TypeDescriptor::Varchar { length } => format!("types::Varchar<{}>", length),
        }
    }

    /// Physical storage size in bytes
    pub fn physical_size(&self) -> usize {
        match self {
            TypeDescriptor::Integer => 4,
            TypeDescriptor::BigInt => 8,
            TypeDescriptor::Date => 4,
            TypeDescriptor::Numeric { .. } => 8,
            TypeDescriptor::Char { length } => *length as usize,
            // u16 length prefix
            TypeDescriptor::Varchar { length } => *length as usize + 2,
        }
    }

    pub fn validate(&self) -> Result<(), TypeError> {
        match *self {
            TypeDescriptor::Numeric { precision, scale } => {
                if precision == 0 || precision > MAX_NUMERIC_PRECISION || scale > precision {
                    return Err(TypeError::InvalidNumeric { precision, scale });
                }
                Ok(())
            }
            TypeDescriptor::Char { length: 0 } => Err(TypeError::ZeroLength("Char")),
            TypeDescriptor::Varchar { length: 0 } => Err(TypeError::ZeroLength("Varchar")),
            _ => Ok(()),
        }
    }

    /// Cast a literal into a generated-code constant of this type.
    ///
    /// Returns the rendered constructor expression, e.g.
    /// `types::Numeric::<12, 2>::from_raw(1250)` for `"12.50"`.
    pub fn cast_literal(&self, text: &str) -> Result<String, ValueFormatError> {
        let fail = |reason: &str| ValueFormatError {
            ty: self.name(),
            literal: text.to_string(),
            reason: reason.to_string(),
        };

        match *self {
            TypeDescriptor::Integer => {
                let value: i32 = text
                    .trim()
                    .parse()
                    .map_err(|_| fail("not a 32-bit integer"))?;
                Ok(format!("types::Integer({})", value))
            }
            TypeDescriptor::BigInt => {
                let value: i64 = text
                    .trim()
                    .parse()
                    .map_err(|_| fail("not a 64-bit integer"))?;
                Ok(format!("types::BigInt({})", value))
            }
            TypeDescriptor::Date => {
                let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .map_err(|_| fail("expected a calendar date as YYYY-MM-DD"))?;
                Ok(format!(
                    "types::Date::from_ymd({}, {}, {})",
                    date.year(),
                    date.month(),
                    date.day()
                ))
            }
            TypeDescriptor::Numeric { precision, scale } => {
                self.validate().map_err(|e| fail(&e.to_string()))?;
                let raw = parse_numeric(text.trim(), precision, scale).map_err(|r| fail(r))?;
                Ok(format!(
                    "types::Numeric::<{}, {}>::from_raw({})",
                    precision, scale, raw
                ))
            }
            TypeDescriptor::Char { length } => {
                if text.chars().count() > length as usize {
                    return Err(fail("literal longer than the column"));
                }
                Ok(format!("types::Char::<{}>::new({:?})", length, text))
            }
            TypeDescriptor::Varchar { length } => {
                if text.chars().count() > length as usize {
                    return Err(fail("literal longer than the column"));
                }
                Ok(format!("types::Varchar::<{}>::new({:?})", length, text))
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Parse a decimal literal into its raw scaled integer
fn parse_numeric(text: &str, precision: u8, scale: u8) -> Result<i64, &'static str> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err("empty numeric literal");
    }
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err("not a decimal number");
    }

    let significant = int_part.trim_start_matches('0');
    if significant.len() > usize::from(precision - scale) {
        return Err("too many integer digits for precision");
    }
    if frac_part.len() > usize::from(scale) {
        return Err("too many fractional digits for scale");
    }

    let mut raw: i64 = 0;
    for c in significant.chars().chain(frac_part.chars()) {
        raw = raw * 10 + i64::from(c as u8 - b'0');
    }
    for _ in frac_part.len()..usize::from(scale) {
        raw *= 10;
    }

    Ok(if negative { -raw } else { raw })
}
