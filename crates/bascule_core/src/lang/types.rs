//! Data-type vocabulary.
//!
//! The language has four value types. Each has a source spelling used in declarations (`Dim x As Integer`)
//! and a short name used when rendering IR operands (`int@42`).
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-insensitive ASCII**.
//! - [`DataType::Unspecified`] is not spellable; it marks symbols whose type is not known yet (undeclared
//!   identifiers, fresh temporaries).
//!
//! ## Examples
//! ```rust
//! use bascule_core::lang::types::{self, DataType};
//!
//! assert_eq!(types::from_str("double"), Some(DataType::Float));
//! assert_eq!(DataType::Float.ir_name(), "float");
//! assert_eq!(types::from_str("Float"), None);
//! ```

use super::registry::spelling_matches;

/// Value type of a symbol or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
    Unspecified,
}

impl DataType {
    /// Name used in IR operands (`int`, `float`, `string`, `bool`).
    pub fn ir_name(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Str => "string",
            DataType::Bool => "bool",
            DataType::Unspecified => "nil",
        }
    }

    /// Source spelling, if the type is spellable.
    pub fn source_name(self) -> Option<&'static str> {
        DATA_TYPES.iter().find(|t| t.id == self).map(|t| t.canonical)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.source_name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "<unspecified>"),
        }
    }
}

/// Metadata for a spellable data type.
#[derive(Debug, Clone, Copy)]
pub struct DataTypeInfo {
    pub id: DataType,
    pub canonical: &'static str,
    pub description: &'static str,
}

/// Registry of spellable data types.
pub const DATA_TYPES: &[DataTypeInfo] = &[
    DataTypeInfo {
        id: DataType::Int,
        canonical: "Integer",
        description: "Signed integer.",
    },
    DataTypeInfo {
        id: DataType::Float,
        canonical: "Double",
        description: "Double-precision floating point.",
    },
    DataTypeInfo {
        id: DataType::Str,
        canonical: "String",
        description: "Byte string.",
    },
    DataTypeInfo {
        id: DataType::Bool,
        canonical: "Boolean",
        description: "Boolean (`True` / `False`).",
    },
];

/// Resolve a source type name.
pub fn from_str(name: &str) -> Option<DataType> {
    DATA_TYPES
        .iter()
        .find(|t| spelling_matches(name, t.canonical, &[]))
        .map(|t| t.id)
}
