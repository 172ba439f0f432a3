//! Scalar runtime values: the unit a single vector position decodes to.

use std::fmt;

use uuid::Uuid;

/// A node/rel offset, decomposed as `(node-group-idx, offset-in-group)`.
///
/// See storage §3: "A node offset decomposes uniquely into
/// `(node-group-idx, offset-in-group)`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalId {
    pub table_id: u32,
    pub offset: u64,
}

impl InternalId {
    pub const NODE_GROUP_SIZE_SHIFT: u32 = 18; // 2^18 rows per node group

    pub fn new(table_id: u32, offset: u64) -> Self {
        InternalId { table_id, offset }
    }

    pub fn node_group_idx(&self) -> u64 {
        self.offset >> Self::NODE_GROUP_SIZE_SHIFT
    }

    pub fn offset_in_group(&self) -> u64 {
        self.offset & ((1u64 << Self::NODE_GROUP_SIZE_SHIFT) - 1)
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.offset)
    }
}

/// A calendar interval: `{months, days, micros}`, the same three-field split
/// an `interval_t` uses so that month-based and day-based arithmetic stay
/// separate from sub-day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Interval { months, days, micros }
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.micros == 0
    }

    pub fn negate(&self) -> Self {
        Interval { months: -self.months, days: -self.days, micros: -self.micros }
    }
}

/// A fully-materialized scalar value, used for literals, cast output, and
/// vector position reads. Nested container scalars (list/map/struct/union)
/// box their children because `Scalar` is also the element type of those
/// containers.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Date(i32),
    Timestamp(i64),
    Interval(Interval),
    String(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    InternalId(InternalId),
    List(Vec<Scalar>),
    Map(Vec<(Scalar, Scalar)>),
    Struct(Vec<(String, Scalar)>),
    Union { tag: String, value: Box<Scalar> },
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int8(v) => Some(*v as i64),
            Scalar::Int16(v) => Some(*v as i64),
            Scalar::Int32(v) => Some(*v as i64),
            Scalar::Int64(v) => Some(*v),
            Scalar::UInt8(v) => Some(*v as i64),
            Scalar::UInt16(v) => Some(*v as i64),
            Scalar::UInt32(v) => Some(*v as i64),
            Scalar::Date(v) => Some(*v as i64),
            Scalar::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v as f64),
            Scalar::Double(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Int128(v) => write!(f, "{v}"),
            Scalar::UInt8(v) => write!(f, "{v}"),
            Scalar::UInt16(v) => write!(f, "{v}"),
            Scalar::UInt32(v) => write!(f, "{v}"),
            Scalar::UInt64(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Double(v) => write!(f, "{v}"),
            Scalar::Date(days) => write!(f, "{}", crate::cast::format::format_date(*days)),
            Scalar::Timestamp(micros) => {
                write!(f, "{}", crate::cast::format::format_timestamp(*micros))
            }
            Scalar::Interval(iv) => write!(f, "{}", crate::cast::format::format_interval(iv)),
            Scalar::String(s) => write!(f, "{s}"),
            Scalar::Blob(b) => write!(f, "{}", crate::cast::format::format_blob(b)),
            Scalar::Uuid(u) => write!(f, "{u}"),
            Scalar::InternalId(id) => write!(f, "{id}"),
            Scalar::List(items) => {
                write!(f, "[")?;
                for (i, it) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{it}")?;
                }
                write!(f, "]")
            }
            Scalar::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
            Scalar::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, "}}")
            }
            Scalar::Union { value, .. } => write!(f, "{value}"),
        }
    }
}
