//! Column type names.
//!
//! The editor offers a small fixed vocabulary of SQL types. Stored documents
//! keep the type as free text; [`SqlType::parse`] recognizes the vocabulary
//! (case-insensitive, any length/precision arguments) so forms can show a
//! canonical spelling and fall back to the first entry otherwise.

use std::fmt;
use winnow::ascii::{dec_uint, space0};
use winnow::combinator::{delimited, opt, preceded};
use winnow::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

/// Type names offered by the column form, in display order.
pub const COMMON_TYPES: [&str; 8] = [
    "int",
    "bigint",
    "decimal(10,2)",
    "varchar(255)",
    "text",
    "date",
    "timestamp",
    "boolean",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized column type `{input}`")]
pub struct TypeParseError {
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Int,
    BigInt,
    Decimal { precision: u32, scale: u32 },
    Varchar(u32),
    Text,
    Date,
    Timestamp,
    Boolean,
}

impl SqlType {
    /// Parse a type name such as `VARCHAR(64)` or `decimal(12, 4)`.
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        let err = || TypeParseError {
            input: input.to_string(),
        };
        let (name, args) = type_expr.parse(input.trim()).map_err(|_| err())?;
        let name = name.to_ascii_lowercase();

        match (name.as_str(), args) {
            ("int" | "integer", None) => Ok(Self::Int),
            ("bigint", None) => Ok(Self::BigInt),
            ("decimal" | "numeric", None) => Ok(Self::Decimal {
                precision: 10,
                scale: 2,
            }),
            ("decimal" | "numeric", Some((precision, scale))) => Ok(Self::Decimal {
                precision,
                scale: scale.unwrap_or(0),
            }),
            ("varchar", None) => Ok(Self::Varchar(255)),
            ("varchar", Some((len, None))) => Ok(Self::Varchar(len)),
            ("text", None) => Ok(Self::Text),
            ("date", None) => Ok(Self::Date),
            ("timestamp", None) => Ok(Self::Timestamp),
            ("boolean" | "bool", None) => Ok(Self::Boolean),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::BigInt => f.write_str("bigint"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Self::Varchar(len) => write!(f, "varchar({len})"),
            Self::Text => f.write_str("text"),
            Self::Date => f.write_str("date"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Boolean => f.write_str("boolean"),
        }
    }
}

/// Canonical spelling of `raw`, or the first [`COMMON_TYPES`] entry if it
/// is not a recognized type.
pub fn normalize_type_name(raw: &str) -> String {
    match SqlType::parse(raw) {
        Ok(t) => t.to_string(),
        Err(e) => {
            log::debug!("{e}; falling back to {}", COMMON_TYPES[0]);
            COMMON_TYPES[0].to_string()
        }
    }
}

// ─── Grammar ─────────────────────────────────────────────────────────────

type TypeArgs = (u32, Option<u32>);

fn type_expr<'s>(input: &mut &'s str) -> ModalResult<(&'s str, Option<TypeArgs>)> {
    let name = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let args = opt(type_args).parse_next(input)?;
    Ok((name, args))
}

fn type_args(input: &mut &str) -> ModalResult<TypeArgs> {
    delimited(
        ('(', space0),
        (
            dec_uint,
            opt(preceded((space0, ',', space0), dec_uint)),
        ),
        (space0, ')'),
    )
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vocabulary_roundtrips_to_itself() {
        for name in COMMON_TYPES {
            assert_eq!(SqlType::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn accepts_case_and_spacing_variants() {
        assert_eq!(SqlType::parse("VARCHAR ( 64 )"), Ok(SqlType::Varchar(64)));
        assert_eq!(
            SqlType::parse("Decimal(12, 4)"),
            Ok(SqlType::Decimal {
                precision: 12,
                scale: 4
            })
        );
        assert_eq!(SqlType::parse("integer"), Ok(SqlType::Int));
        assert_eq!(SqlType::parse("  bool "), Ok(SqlType::Boolean));
    }

    #[test]
    fn rejects_unknown_or_malformed() {
        assert!(SqlType::parse("uuid").is_err());
        assert!(SqlType::parse("varchar(").is_err());
        assert!(SqlType::parse("int(4)").is_err());
        assert!(SqlType::parse("").is_err());
    }

    #[test]
    fn normalize_falls_back_to_first_entry() {
        assert_eq!(normalize_type_name("TEXT"), "text");
        assert_eq!(normalize_type_name("jsonb"), "int");
    }
}
