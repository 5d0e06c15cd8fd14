//! Element type tags.
//!
//! The enum declaration order doubles as the total ordering used for
//! deterministic tie-breaking during kernel selection. Numeric codes follow
//! the serialized variable-type table of the host ecosystem.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Closed set of tensor element types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Bool,
    U8,
    I8,
    I32,
    I64,
    F16,
    BF16,
    F32,
    F64,
    C64,
    C128,
}

impl DType {
    /// Serialized type code, matching the host program format.
    pub fn code(self) -> i32 {
        match self {
            DType::Bool => 0,
            DType::I32 => 2,
            DType::I64 => 3,
            DType::F16 => 4,
            DType::F32 => 5,
            DType::F64 => 6,
            DType::U8 => 20,
            DType::I8 => 21,
            DType::BF16 => 22,
            DType::C64 => 23,
            DType::C128 => 24,
        }
    }

    /// Parse a serialized type code.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(DType::Bool),
            2 => Ok(DType::I32),
            3 => Ok(DType::I64),
            4 => Ok(DType::F16),
            5 => Ok(DType::F32),
            6 => Ok(DType::F64),
            20 => Ok(DType::U8),
            21 => Ok(DType::I8),
            22 => Ok(DType::BF16),
            23 => Ok(DType::C64),
            24 => Ok(DType::C128),
            _ => Err(anyhow!("unknown dtype code {}", code)),
        }
    }

    /// Element width in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::Bool | DType::U8 | DType::I8 => 1,
            DType::F16 | DType::BF16 => 2,
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 | DType::C64 => 8,
            DType::C128 => 16,
        }
    }

    /// String identifier used in kernel keys and error text.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::U8 => "uint8",
            DType::I8 => "int8",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::C64 => "complex64",
            DType::C128 => "complex128",
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(
            self,
            DType::F16 | DType::BF16 | DType::F32 | DType::F64
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, DType::U8 | DType::I8 | DType::I32 | DType::I64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, DType::C64 | DType::C128)
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "bool" => Ok(DType::Bool),
            "uint8" => Ok(DType::U8),
            "int8" => Ok(DType::I8),
            "int32" => Ok(DType::I32),
            "int64" => Ok(DType::I64),
            "float16" => Ok(DType::F16),
            "bfloat16" => Ok(DType::BF16),
            "float32" => Ok(DType::F32),
            "float64" => Ok(DType::F64),
            "complex64" => Ok(DType::C64),
            "complex128" => Ok(DType::C128),
            _ => Err(anyhow!("unknown dtype {}", value)),
        }
    }
}
