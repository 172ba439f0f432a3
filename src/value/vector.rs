//! `ValueVector`: a columnar batch of up to `DEFAULT_VECTOR_CAPACITY` values
//! of one logical type, with a null bitmap and a selection vector.
//!
//! Values are stored as a flat `Vec<Scalar>` rather than byte-packed buffers:
//! this keeps the crate free of unsafe transmutes while preserving the usual
//! vectorized-execution invariants (null-before-read, list entries pointing
//! into a child vector, struct vectors sharing one selection vector). The
//! packed byte layout a native engine would use is an implementation detail
//! this crate does not need to reproduce.

use super::{LogicalType, Scalar};

/// `list_entry_t{offset, size}`: where a LIST/ARRAY/MAP value's elements
/// live in the parent list vector's child data vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    pub offset: usize,
    pub size: usize,
}

/// A bitmap of null positions, one bit (here: one bool) per vector capacity
/// slot. The null bit for a position must be consulted before reading the
/// typed value (invariant i).
#[derive(Debug, Clone)]
pub struct NullMask {
    bits: Vec<bool>,
}

impl NullMask {
    pub fn new(capacity: usize) -> Self {
        NullMask { bits: vec![false; capacity] }
    }

    pub fn is_null(&self, pos: usize) -> bool {
        self.bits.get(pos).copied().unwrap_or(false)
    }

    pub fn set_null(&mut self, pos: usize, is_null: bool) {
        if pos >= self.bits.len() {
            self.bits.resize(pos + 1, false);
        }
        self.bits[pos] = is_null;
    }

    pub fn resize(&mut self, new_len: usize) {
        self.bits.resize(new_len, false);
    }
}

/// Whether a data chunk's vectors carry one logical row (`Flat`, the common
/// case right after a scalar `WHERE`/projection collapses a group) or up to
/// `DEFAULT_VECTOR_CAPACITY` rows (`Unflat`, the common case right after a
/// scan or an extend), optionally narrowed by a filtered selection vector.
#[derive(Debug, Clone)]
pub enum VectorState {
    Flat(usize),
    Unflat { selected: Option<Vec<usize>>, len: usize },
}

impl VectorState {
    pub fn is_flat(&self) -> bool {
        matches!(self, VectorState::Flat(_))
    }

    /// Positions the vector logically iterates over, honoring any filtered
    /// selection vector.
    pub fn positions(&self) -> SelectionVector<'_> {
        match self {
            VectorState::Flat(pos) => SelectionVector::Single(*pos),
            VectorState::Unflat { selected: Some(sel), .. } => SelectionVector::Filtered(sel),
            VectorState::Unflat { selected: None, len } => SelectionVector::Dense(*len),
        }
    }
}

/// A view over the active positions of a vector's current state.
pub enum SelectionVector<'a> {
    Single(usize),
    Dense(usize),
    Filtered(&'a [usize]),
}

impl<'a> SelectionVector<'a> {
    pub fn iter(&self) -> Box<dyn Iterator<Item = usize> + 'a> {
        match self {
            SelectionVector::Single(p) => Box::new(std::iter::once(*p)),
            SelectionVector::Dense(n) => Box::new(0..*n),
            SelectionVector::Filtered(sel) => Box::new(sel.iter().copied()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SelectionVector::Single(_) => 1,
            SelectionVector::Dense(n) => *n,
            SelectionVector::Filtered(sel) => sel.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thin wrapper so callers can read a vector position as a typed [`Scalar`]
/// without re-deriving null semantics at every call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
}

impl Value {
    pub fn scalar(self) -> Option<Scalar> {
        match self {
            Value::Null => None,
            Value::Scalar(s) => Some(s),
        }
    }
}

/// A columnar batch of one logical type, sharing a [`VectorState`] with its
/// sibling vectors in the same data chunk (the factorization group, §4.G).
#[derive(Debug, Clone)]
pub struct ValueVector {
    logical_type: LogicalType,
    data: Vec<Scalar>,
    nulls: NullMask,
    capacity: usize,
    /// For LIST/ARRAY/MAP vectors: entries into `child`.
    list_entries: Vec<ListEntry>,
    child: Option<Box<ValueVector>>,
    /// For STRUCT/UNION vectors: one child vector per field, sharing this
    /// vector's selection vector (invariant iii).
    fields: Vec<(String, ValueVector)>,
}

impl ValueVector {
    /// Construct a vector of the given logical type with `capacity` slots,
    /// all initially null.
    pub fn new(logical_type: LogicalType, capacity: usize) -> Self {
        let child = match &logical_type {
            LogicalType::List(inner) | LogicalType::Array(inner, _) => {
                Some(Box::new(ValueVector::new((**inner).clone(), capacity)))
            }
            LogicalType::Map(k, v) => {
                let entry_ty = LogicalType::Struct(vec![
                    ("key".to_string(), (**k).clone()),
                    ("value".to_string(), (**v).clone()),
                ]);
                Some(Box::new(ValueVector::new(entry_ty, capacity)))
            }
            _ => None,
        };
        let fields = match &logical_type {
            LogicalType::Struct(fields) | LogicalType::Union(fields) => fields
                .iter()
                .map(|(name, ty)| (name.clone(), ValueVector::new(ty.clone(), capacity)))
                .collect(),
            _ => Vec::new(),
        };
        ValueVector {
            logical_type,
            data: vec![Scalar::Null; capacity],
            nulls: NullMask::new(capacity),
            capacity,
            list_entries: vec![ListEntry { offset: 0, size: 0 }; capacity],
            child,
            fields,
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_null(&self, pos: usize) -> bool {
        self.nulls.is_null(pos)
    }

    pub fn set_null(&mut self, pos: usize, is_null: bool) {
        self.nulls.set_null(pos, is_null);
    }

    /// Typed read: `None` when the position is null, consistent with
    /// invariant (i) (callers must consult the null bit before reading).
    pub fn get(&self, pos: usize) -> Option<&Scalar> {
        if self.is_null(pos) {
            None
        } else {
            self.data.get(pos)
        }
    }

    pub fn set(&mut self, pos: usize, value: Scalar) {
        self.ensure_capacity(pos + 1);
        self.set_null(pos, false);
        self.data[pos] = value;
    }

    pub fn set_null_value(&mut self, pos: usize) {
        self.ensure_capacity(pos + 1);
        self.set_null(pos, true);
    }

    fn ensure_capacity(&mut self, n: usize) {
        if n > self.data.len() {
            self.data.resize(n, Scalar::Null);
            self.nulls.resize(n);
            self.list_entries.resize(n, ListEntry { offset: 0, size: 0 });
            self.capacity = n;
        }
    }

    /// Append a string/blob payload; for `ValueVector` (which is not
    /// byte-packed) this is equivalent to `set`, but kept as a distinctly
    /// named entry point matching the spec's "append variable-length
    /// payload... returning an inline entry" operation.
    pub fn append_bytes(&mut self, pos: usize, value: Scalar) {
        self.set(pos, value);
    }

    /// Appends a list/array element sequence at `pos`, returning the entry
    /// that was recorded. The child vector's logical size grows
    /// monotonically within a batch (invariant ii).
    pub fn append_list(&mut self, pos: usize, elements: Vec<Scalar>) -> ListEntry {
        let child = self
            .child
            .get_or_insert_with(|| Box::new(ValueVector::new(LogicalType::String, 0)));
        let offset = child.len();
        let size = elements.len();
        for (i, e) in elements.into_iter().enumerate() {
            child.ensure_capacity(offset + i + 1);
            child.set(offset + i, e);
        }
        let entry = ListEntry { offset, size };
        self.ensure_capacity(pos + 1);
        self.list_entries[pos] = entry;
        self.set_null(pos, false);
        entry
    }

    pub fn list_entry(&self, pos: usize) -> ListEntry {
        self.list_entries[pos]
    }

    pub fn child(&self) -> Option<&ValueVector> {
        self.child.as_deref()
    }

    pub fn child_mut(&mut self) -> &mut ValueVector {
        self.child
            .get_or_insert_with(|| Box::new(ValueVector::new(LogicalType::String, self.capacity)))
    }

    pub fn field(&self, name: &str) -> Option<&ValueVector> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut ValueVector> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, ValueVector)] {
        &self.fields
    }

    /// Current logical length (number of populated slots), used as the
    /// child-vector write cursor during nested cast decoding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Produce a read-only typed scalar for position `pos`, materializing
    /// nested containers recursively. Used by expression evaluation and by
    /// result-row formatting.
    pub fn read_scalar(&self, pos: usize) -> Value {
        if self.is_null(pos) {
            return Value::Null;
        }
        match &self.logical_type {
            LogicalType::List(_) | LogicalType::Array(_, _) => {
                let entry = self.list_entry(pos);
                let child = self.child.as_ref().expect("list vector missing child");
                let items: Vec<Scalar> = (entry.offset..entry.offset + entry.size)
                    .map(|i| match child.read_scalar(i) {
                        Value::Null => Scalar::Null,
                        Value::Scalar(s) => s,
                    })
                    .collect();
                Value::Scalar(Scalar::List(items))
            }
            LogicalType::Map(_, _) => {
                let entry = self.list_entry(pos);
                let child = self.child.as_ref().expect("map vector missing child");
                let mut pairs = Vec::new();
                for i in entry.offset..entry.offset + entry.size {
                    let k = child
                        .field("key")
                        .and_then(|f| f.read_scalar(i).scalar())
                        .unwrap_or(Scalar::Null);
                    let v = child
                        .field("value")
                        .and_then(|f| f.read_scalar(i).scalar())
                        .unwrap_or(Scalar::Null);
                    pairs.push((k, v));
                }
                Value::Scalar(Scalar::Map(pairs))
            }
            LogicalType::Struct(_) => {
                let fields = self
                    .fields
                    .iter()
                    .map(|(name, v)| {
                        let s = match v.read_scalar(pos) {
                            Value::Null => Scalar::Null,
                            Value::Scalar(s) => s,
                        };
                        (name.clone(), s)
                    })
                    .collect();
                Value::Scalar(Scalar::Struct(fields))
            }
            LogicalType::Union(_) => {
                for (name, v) in &self.fields {
                    if !v.is_null(pos) {
                        let inner = match v.read_scalar(pos) {
                            Value::Null => Scalar::Null,
                            Value::Scalar(s) => s,
                        };
                        return Value::Scalar(Scalar::Union {
                            tag: name.clone(),
                            value: Box::new(inner),
                        });
                    }
                }
                Value::Null
            }
            _ => self.get(pos).cloned().map(Value::Scalar).unwrap_or(Value::Null),
        }
    }
}
