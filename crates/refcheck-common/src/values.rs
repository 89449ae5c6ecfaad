//! Typed variable data and attribute values.
//!
//! Equality here is exact. Floating-point values compare by bit pattern, so
//! a NaN equals an identically encoded NaN and `0.0` differs from `-0.0`.
//! Any change to a stored value, however small, makes two values unequal.

use std::fmt;

/// Flat, row-major variable data in its stored element type.
#[derive(Debug, Clone)]
pub enum ArrayData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// NetCDF classic `char` data, kept as raw bytes
    Char(Vec<u8>),
    /// Variable-length strings (NetCDF-4 `string`)
    Str(Vec<String>),
}

impl ArrayData {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::I8(v) => v.len(),
            ArrayData::U8(v) => v.len(),
            ArrayData::I16(v) => v.len(),
            ArrayData::U16(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::U32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::U64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
            ArrayData::Char(v) => v.len(),
            ArrayData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// NetCDF-style name of the element type.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArrayData::I8(_) => "byte",
            ArrayData::U8(_) => "ubyte",
            ArrayData::I16(_) => "short",
            ArrayData::U16(_) => "ushort",
            ArrayData::I32(_) => "int",
            ArrayData::U32(_) => "uint",
            ArrayData::I64(_) => "int64",
            ArrayData::U64(_) => "uint64",
            ArrayData::F32(_) => "float",
            ArrayData::F64(_) => "double",
            ArrayData::Char(_) => "char",
            ArrayData::Str(_) => "string",
        }
    }

    /// Element-wise exact equality. Different element types are never equal.
    pub fn exact_eq(&self, other: &ArrayData) -> bool {
        match (self, other) {
            (ArrayData::I8(a), ArrayData::I8(b)) => a == b,
            (ArrayData::U8(a), ArrayData::U8(b)) => a == b,
            (ArrayData::I16(a), ArrayData::I16(b)) => a == b,
            (ArrayData::U16(a), ArrayData::U16(b)) => a == b,
            (ArrayData::I32(a), ArrayData::I32(b)) => a == b,
            (ArrayData::U32(a), ArrayData::U32(b)) => a == b,
            (ArrayData::I64(a), ArrayData::I64(b)) => a == b,
            (ArrayData::U64(a), ArrayData::U64(b)) => a == b,
            (ArrayData::F32(a), ArrayData::F32(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (ArrayData::F64(a), ArrayData::F64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (ArrayData::Char(a), ArrayData::Char(b)) => a == b,
            (ArrayData::Str(a), ArrayData::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        self.exact_eq(other)
    }
}

/// A global or per-variable attribute value.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Str(String),
    Strs(Vec<String>),
    Int(i64),
    Ints(Vec<i64>),
    /// Unsigned 64-bit values that do not fit `Int`
    UInt(u64),
    UInts(Vec<u64>),
    Float(f64),
    Floats(Vec<f64>),
}

impl AttrValue {
    /// Exact equality, floats by bit pattern.
    pub fn exact_eq(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Strs(a), AttrValue::Strs(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Ints(a), AttrValue::Ints(b)) => a == b,
            (AttrValue::UInt(a), AttrValue::UInt(b)) => a == b,
            (AttrValue::UInts(a), AttrValue::UInts(b)) => a == b,
            (AttrValue::Float(a), AttrValue::Float(b)) => a.to_bits() == b.to_bits(),
            (AttrValue::Floats(a), AttrValue::Floats(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            _ => false,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.exact_eq(other)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            AttrValue::Str(s) => write!(f, "\"{}\"", s),
            AttrValue::Strs(v) => {
                let quoted: Vec<String> = v.iter().map(|s| format!("\"{}\"", s)).collect();
                join(f, &quoted)
            }
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Ints(v) => join(f, v),
            AttrValue::UInt(v) => write!(f, "{}", v),
            AttrValue::UInts(v) => join(f, v),
            AttrValue::Float(v) => write!(f, "{:?}", v),
            AttrValue::Floats(v) => {
                let rendered: Vec<String> = v.iter().map(|x| format!("{:?}", x)).collect();
                join(f, &rendered)
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::Floats(value)
    }
}
