//! Columnar output sinks
//!
//! Templates render each event into a flat `EventRow`: column name ->
//! value, scalars for the header block and arrays for the per-object
//! blocks. A sink is given the full schema once, before the first event,
//! and then receives one row per event. Commit validates the row against
//! the schema; a malformed row is a logic error in the fill code and is
//! reported as a fatal error, never silently padded.

use crate::error::{NtupleError, NtupleResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// One cell of an output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl ColumnValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValue::Int(_) => ColumnKind::Int,
            ColumnValue::UInt(_) => ColumnKind::UInt,
            ColumnValue::Float(_) => ColumnKind::Float,
            ColumnValue::IntArray(_) => ColumnKind::IntArray,
            ColumnValue::FloatArray(_) => ColumnKind::FloatArray,
        }
    }
}

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Int,
    UInt,
    Float,
    IntArray,
    FloatArray,
}

/// One column declaration in the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One event rendered as a flat row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRow {
    columns: BTreeMap<String, ColumnValue>,
}

impl EventRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: ColumnValue) {
        self.columns.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.columns.get(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnValue)> {
        self.columns.iter()
    }
}

/// Validate a row against the registered schema.
///
/// Every declared column must be present with the declared kind, and the
/// row must contain nothing the schema does not declare.
fn validate(schema: &[ColumnSpec], row: &EventRow) -> NtupleResult<()> {
    for spec in schema {
        match row.get(&spec.name) {
            None => return Err(NtupleError::MissingColumn(spec.name.clone())),
            Some(v) if v.kind() != spec.kind => {
                return Err(NtupleError::SchemaMismatch {
                    column: spec.name.clone(),
                    detail: format!("declared {:?}, filled {:?}", spec.kind, v.kind()),
                })
            }
            Some(_) => {}
        }
    }
    if row.len() != schema.len() {
        for (name, _) in row.iter() {
            if !schema.iter().any(|s| &s.name == name) {
                return Err(NtupleError::UnknownColumn(name.clone()));
            }
        }
    }
    Ok(())
}

/// Destination for flattened events
pub trait ColumnarStore {
    /// Declare the full column set; must be called exactly once, first
    fn register_schema(&mut self, schema: Vec<ColumnSpec>) -> NtupleResult<()>;

    /// Validate and persist one event row
    fn commit(&mut self, row: EventRow) -> NtupleResult<()>;
}

/// In-memory sink used by tests and by callers that post-process rows
#[derive(Debug, Default)]
pub struct MemoryStore {
    schema: Option<Vec<ColumnSpec>>,
    rows: Vec<EventRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> Option<&[ColumnSpec]> {
        self.schema.as_deref()
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }
}

impl ColumnarStore for MemoryStore {
    fn register_schema(&mut self, schema: Vec<ColumnSpec>) -> NtupleResult<()> {
        if self.schema.is_some() {
            return Err(NtupleError::SchemaAlreadyRegistered);
        }
        self.schema = Some(schema);
        Ok(())
    }

    fn commit(&mut self, row: EventRow) -> NtupleResult<()> {
        let schema = self
            .schema
            .as_ref()
            .ok_or(NtupleError::SchemaNotRegistered)?;
        validate(schema, &row)?;
        self.rows.push(row);
        Ok(())
    }
}

/// Streaming sink: one schema header line, then one JSON object per event
pub struct JsonLinesWriter<W: Write> {
    inner: W,
    schema: Option<Vec<ColumnSpec>>,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            schema: None,
        }
    }

    /// Flush and hand the underlying writer back
    pub fn into_inner(mut self) -> NtupleResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> ColumnarStore for JsonLinesWriter<W> {
    fn register_schema(&mut self, schema: Vec<ColumnSpec>) -> NtupleResult<()> {
        if self.schema.is_some() {
            return Err(NtupleError::SchemaAlreadyRegistered);
        }
        serde_json::to_writer(&mut self.inner, &schema)?;
        self.inner.write_all(b"\n")?;
        self.schema = Some(schema);
        Ok(())
    }

    fn commit(&mut self, row: EventRow) -> NtupleResult<()> {
        let schema = self
            .schema
            .as_ref()
            .ok_or(NtupleError::SchemaNotRegistered)?;
        validate(schema, &row)?;
        serde_json::to_writer(&mut self.inner, &row)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }
}
