//! # Type system and value vectors
//!
//! `LogicalType` is the schema-visible type; `PhysicalType` is the in-memory
//! representation `ValueVector` actually stores. Several logical types share
//! one physical representation (e.g. `DATE` and `INT32` are both `Int32`
//! physically, `NODE`/`REL` carry an `InternalId` pair physically).

mod scalar;
mod vector;

pub use scalar::{InternalId, Interval, Scalar};
pub use vector::{ListEntry, NullMask, SelectionVector, Value, ValueVector, VectorState};

use std::fmt;

/// `DEFAULT_VECTOR_CAPACITY`: the batch size every operator produces/consumes.
pub const DEFAULT_VECTOR_CAPACITY: usize = 2048;

/// Decimal precision/scale, carried inline on the logical type the way
/// carries it on `LogicalTypeID::DECIMAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalSpec {
    pub precision: u8,
    pub scale: u8,
}

/// Resolution tag for TIMESTAMP variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeResolution {
    Sec,
    Ms,
    Us,
    Ns,
    Tz,
}

/// The logical (schema-visible) type of a value or column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Decimal(DecimalSpec),
    Date,
    Timestamp(TimeResolution),
    Interval,
    String,
    Blob,
    Uuid,
    Serial,
    InternalId,
    List(Box<LogicalType>),
    Array(Box<LogicalType>, usize),
    Map(Box<LogicalType>, Box<LogicalType>),
    Struct(Vec<(String, LogicalType)>),
    Union(Vec<(String, LogicalType)>),
    Node(String),
    Rel(String),
}

impl LogicalType {
    /// The physical representation this logical type is stored as.
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            LogicalType::Bool => PhysicalType::Bool,
            LogicalType::Int8 => PhysicalType::Int8,
            LogicalType::Int16 => PhysicalType::Int16,
            LogicalType::Int32 | LogicalType::Date | LogicalType::Serial => PhysicalType::Int32,
            LogicalType::Int64 => PhysicalType::Int64,
            LogicalType::Timestamp(_) => PhysicalType::Int64,
            LogicalType::Int128 | LogicalType::Uuid => PhysicalType::Int128,
            LogicalType::UInt8 => PhysicalType::UInt8,
            LogicalType::UInt16 => PhysicalType::UInt16,
            LogicalType::UInt32 => PhysicalType::UInt32,
            LogicalType::UInt64 => PhysicalType::UInt64,
            LogicalType::Float => PhysicalType::Float,
            LogicalType::Double => PhysicalType::Double,
            LogicalType::Decimal(_) => PhysicalType::Int64,
            LogicalType::Interval => PhysicalType::Interval,
            LogicalType::String | LogicalType::Blob => PhysicalType::VarLen,
            LogicalType::InternalId => PhysicalType::InternalId,
            LogicalType::List(_) | LogicalType::Array(_, _) | LogicalType::Map(_, _) => {
                PhysicalType::List
            }
            LogicalType::Struct(_) | LogicalType::Union(_) => PhysicalType::Struct,
            LogicalType::Node(_) | LogicalType::Rel(_) => PhysicalType::InternalId,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Int8
                | LogicalType::Int16
                | LogicalType::Int32
                | LogicalType::Int64
                | LogicalType::Int128
                | LogicalType::UInt8
                | LogicalType::UInt16
                | LogicalType::UInt32
                | LogicalType::UInt64
                | LogicalType::Float
                | LogicalType::Double
                | LogicalType::Decimal(_)
        )
    }

    /// Numeric widening rank, used by the binder's implicit-cast rule: casts
    /// are only ever allowed from a lower rank to a higher one.
    pub fn numeric_rank(&self) -> Option<u8> {
        Some(match self {
            LogicalType::Int8 | LogicalType::UInt8 => 0,
            LogicalType::Int16 | LogicalType::UInt16 => 1,
            LogicalType::Int32 | LogicalType::UInt32 => 2,
            LogicalType::Int64 | LogicalType::UInt64 => 3,
            LogicalType::Int128 => 4,
            LogicalType::Float => 5,
            LogicalType::Double => 6,
            _ => return None,
        })
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Bool => write!(f, "BOOL"),
            LogicalType::Int8 => write!(f, "INT8"),
            LogicalType::Int16 => write!(f, "INT16"),
            LogicalType::Int32 => write!(f, "INT32"),
            LogicalType::Int64 => write!(f, "INT64"),
            LogicalType::Int128 => write!(f, "INT128"),
            LogicalType::UInt8 => write!(f, "UINT8"),
            LogicalType::UInt16 => write!(f, "UINT16"),
            LogicalType::UInt32 => write!(f, "UINT32"),
            LogicalType::UInt64 => write!(f, "UINT64"),
            LogicalType::Float => write!(f, "FLOAT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Decimal(s) => write!(f, "DECIMAL({},{})", s.precision, s.scale),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Timestamp(_) => write!(f, "TIMESTAMP"),
            LogicalType::Interval => write!(f, "INTERVAL"),
            LogicalType::String => write!(f, "STRING"),
            LogicalType::Blob => write!(f, "BLOB"),
            LogicalType::Uuid => write!(f, "UUID"),
            LogicalType::Serial => write!(f, "SERIAL"),
            LogicalType::InternalId => write!(f, "INTERNAL_ID"),
            LogicalType::List(t) => write!(f, "{t}[]"),
            LogicalType::Array(t, n) => write!(f, "{t}[{n}]"),
            LogicalType::Map(k, v) => write!(f, "MAP({k},{v})"),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                write!(f, ")")
            }
            LogicalType::Union(fields) => {
                write!(f, "UNION(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                write!(f, ")")
            }
            LogicalType::Node(t) => write!(f, "NODE({t})"),
            LogicalType::Rel(t) => write!(f, "REL({t})"),
        }
    }
}

/// The fixed-width (or variable-width-entry) representation `ValueVector`
/// physically stores a column as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Interval,
    /// `{length, prefix, inline-or-overflow-pointer}` entry into the vector's
    /// overflow buffer.
    VarLen,
    /// `{node-group-idx, offset-in-group}` packed pair.
    InternalId,
    /// `list_entry_t{offset, size}` into a child data vector.
    List,
    /// One child vector per field, sharing the parent's selection vector.
    Struct,
}
