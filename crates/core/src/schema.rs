//! Schema description records.
//!
//! A schema enumerates the record kinds a DAG subtree may contain. Kind 0 is
//! conventionally the root kind. Schemas are themselves records, so a schema
//! can be stored in the DAG and addressed by digest like any other value.

use crate::error::{Error, Result};
use crate::field::WireType;
use crate::record::{Record, RecordReader, RecordWriter};

/// Conventional kind id of the root record.
pub const ROOT_KIND: u32 = 0;

/// A set of kind definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    pub kinds: Vec<Kind>,
}

impl Schema {
    /// Look up a kind by id.
    pub fn kind(&self, kind_id: u32) -> Option<&Kind> {
        self.kinds.iter().find(|k| k.kind_id == kind_id)
    }
}

/// One record kind: an id, a display name and its fields in declared order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kind {
    pub kind_id: u32,
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// A field of a kind. `raw` non-zero marks a leaf-bytes field; otherwise
/// `kind_id` names the referenced child kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDef {
    pub field_id: u32,
    pub name: String,
    pub kind_id: u32,
    pub raw: u32,
}

impl Record for Schema {
    fn encode(&self, w: &mut RecordWriter<'_>) -> Result<()> {
        w.children(0, &self.kinds)
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        let mut out = Self::default();
        while let Some(f) = r.next_field() {
            match (f.id, f.wire) {
                (0, WireType::Msg) => out.kinds.push(r.child(&f)?),
                _ => return Err(Error::InvalidRecord(format!("unexpected field {}", f.id))),
            }
        }
        Ok(out)
    }
}

impl Record for Kind {
    fn encode(&self, w: &mut RecordWriter<'_>) -> Result<()> {
        w.uint(0, u64::from(self.kind_id));
        w.string(1, &self.name);
        w.children(2, &self.fields)
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        let mut out = Self::default();
        while let Some(f) = r.next_field() {
            match (f.id, f.wire) {
                (0, WireType::Int) => out.kind_id = f.uint as u32,
                (1, WireType::Bytes) => out.name = f.as_string()?,
                (2, WireType::Msg) => out.fields.push(r.child(&f)?),
                _ => return Err(Error::InvalidRecord(format!("unexpected field {}", f.id))),
            }
        }
        Ok(out)
    }
}

impl Record for FieldDef {
    fn encode(&self, w: &mut RecordWriter<'_>) -> Result<()> {
        w.uint(0, u64::from(self.field_id));
        w.string(1, &self.name);
        w.uint(2, u64::from(self.kind_id));
        w.uint(3, u64::from(self.raw));
        Ok(())
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        let mut out = Self::default();
        while let Some(f) = r.next_field() {
            match (f.id, f.wire) {
                (0, WireType::Int) => out.field_id = f.uint as u32,
                (1, WireType::Bytes) => out.name = f.as_string()?,
                (2, WireType::Int) => out.kind_id = f.uint as u32,
                (3, WireType::Int) => out.raw = f.uint as u32,
                _ => return Err(Error::InvalidRecord(format!("unexpected field {}", f.id))),
            }
        }
        Ok(out)
    }
}
