//! Attribute values carried by operator descriptors.
//!
//! The union is closed: scalars, homogeneous lists of those scalars, and a
//! sub-program block handle. Two values compare equal iff their tags and
//! payloads compare equal. Checkers consume the tag directly; the set is
//! deliberately not widened to a free-form dynamic value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formatting::DebugString;

/// Tag identifying the shape of an [`AttrValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Str,
    Bools,
    Ints,
    Longs,
    Floats,
    Doubles,
    Strs,
    Block,
}

impl AttrType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Long => "long",
            AttrType::Float => "float",
            AttrType::Double => "double",
            AttrType::Str => "string",
            AttrType::Bools => "bool_list",
            AttrType::Ints => "int_list",
            AttrType::Longs => "long_list",
            AttrType::Floats => "float_list",
            AttrType::Doubles => "double_list",
            AttrType::Strs => "string_list",
            AttrType::Block => "block",
        }
    }
}

impl std::fmt::Display for AttrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attribute value used by operator descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Bools(Vec<bool>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Strs(Vec<String>),
    Block(usize),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Long(_) => AttrType::Long,
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Double(_) => AttrType::Double,
            AttrValue::Str(_) => AttrType::Str,
            AttrValue::Bools(_) => AttrType::Bools,
            AttrValue::Ints(_) => AttrType::Ints,
            AttrValue::Longs(_) => AttrType::Longs,
            AttrValue::Floats(_) => AttrType::Floats,
            AttrValue::Doubles(_) => AttrType::Doubles,
            AttrValue::Strs(_) => AttrType::Strs,
            AttrValue::Block(_) => AttrType::Block,
        }
    }

    /// Numeric view of a scalar attribute, used by range validators.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Long(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v as f64),
            AttrValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric views of a list attribute's elements.
    pub fn as_number_list(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Ints(v) => Some(v.iter().map(|x| *x as f64).collect()),
            AttrValue::Longs(v) => Some(v.iter().map(|x| *x as f64).collect()),
            AttrValue::Floats(v) => Some(v.iter().map(|x| *x as f64).collect()),
            AttrValue::Doubles(v) => Some(v.iter().map(|x| *x as f64).collect()),
            _ => None,
        }
    }

    /// Element count for list-shaped values.
    pub fn list_len(&self) -> Option<usize> {
        match self {
            AttrValue::Bools(v) => Some(v.len()),
            AttrValue::Ints(v) => Some(v.len()),
            AttrValue::Longs(v) => Some(v.len()),
            AttrValue::Floats(v) => Some(v.len()),
            AttrValue::Doubles(v) => Some(v.len()),
            AttrValue::Strs(v) => Some(v.len()),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Long(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::Str(v) => write!(f, "\"{}\"", v),
            AttrValue::Bools(v) => write!(f, "{:?}", v),
            AttrValue::Ints(v) => write!(f, "{:?}", v),
            AttrValue::Longs(v) => write!(f, "{:?}", v),
            AttrValue::Floats(v) => write!(f, "{:?}", v),
            AttrValue::Doubles(v) => write!(f, "{:?}", v),
            AttrValue::Strs(v) => write!(f, "{:?}", v),
            AttrValue::Block(v) => write!(f, "block({})", v),
        }
    }
}

/// Name-keyed attribute collection. The map is ordered so debug output is
/// deterministic; insertion order carries no meaning.
pub type AttributeMap = BTreeMap<String, AttrValue>;

impl DebugString for AttributeMap {
    fn debug_string(&self) -> String {
        let parts: Vec<String> = self
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// Typed extraction from an [`AttrValue`], used by `attr::<T>` accessors.
pub trait AttrAccess: Sized {
    /// Human name used in type-mismatch errors.
    fn type_name() -> &'static str;
    fn from_attr(value: &AttrValue) -> Option<Self>;
}

macro_rules! impl_attr_access {
    ($($ty:ty => $variant:ident / $name:expr),+ $(,)?) => {
        $(impl AttrAccess for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn from_attr(value: &AttrValue) -> Option<Self> {
                match value {
                    AttrValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        })+
    };
}

impl_attr_access!(
    bool => Bool / "bool",
    i32 => Int / "int",
    i64 => Long / "long",
    f32 => Float / "float",
    f64 => Double / "double",
    String => Str / "string",
    Vec<bool> => Bools / "bool_list",
    Vec<i32> => Ints / "int_list",
    Vec<i64> => Longs / "long_list",
    Vec<f32> => Floats / "float_list",
    Vec<f64> => Doubles / "double_list",
    Vec<String> => Strs / "string_list",
);

// The block handle deserves its own impl: `usize` only ever means a block
// index in attribute position.
impl AttrAccess for usize {
    fn type_name() -> &'static str {
        "block"
    }

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Block(idx) => Some(*idx),
            _ => None,
        }
    }
}
