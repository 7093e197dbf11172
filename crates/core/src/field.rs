//! Tagged field records carried inside a node's byte payload.
//!
//! Each record is `<field id varint><wire type varint><payload>`. An `Int`
//! payload is one varint, `Bytes` is a length-prefixed byte string and `Msg`
//! is a presence varint; a present `Msg` consumes one link from the
//! enclosing node's link list, in field-appearance order. That pairing is
//! the concern of the record layer, not of this codec.

use crate::error::{Error, Result};
use crate::varint::{read_uvarint, write_uvarint};
use bytes::{Buf, BufMut};

/// Wire type of a field payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Int,
    Bytes,
    Msg,
}

impl WireType {
    pub const fn code(self) -> u64 {
        match self {
            Self::Int => 0,
            Self::Bytes => 1,
            Self::Msg => 2,
        }
    }

    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Self::Int),
            1 => Ok(Self::Bytes),
            2 => Ok(Self::Msg),
            other => Err(Error::UnknownWireType(other)),
        }
    }
}

/// One decoded field record.
///
/// `uint` carries the value for `Int` and the presence bit for `Msg`;
/// `bytes` carries the payload for `Bytes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRecord {
    pub id: u64,
    pub wire: WireType,
    pub uint: u64,
    pub bytes: Vec<u8>,
}

impl FieldRecord {
    pub fn int(id: u64, value: u64) -> Self {
        Self {
            id,
            wire: WireType::Int,
            uint: value,
            bytes: Vec::new(),
        }
    }

    pub fn bytes(id: u64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            wire: WireType::Bytes,
            uint: 0,
            bytes: value.into(),
        }
    }

    pub fn msg(id: u64, present: bool) -> Self {
        Self {
            id,
            wire: WireType::Msg,
            uint: u64::from(present),
            bytes: Vec::new(),
        }
    }

    /// Interpret a `Bytes` payload as UTF-8.
    pub fn as_string(&self) -> Result<String> {
        String::from_utf8(self.bytes.clone())
            .map_err(|e| Error::InvalidRecord(format!("field {} is not UTF-8: {e}", self.id)))
    }

    /// Append the wire encoding to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_uvarint(buf, self.id);
        write_uvarint(buf, self.wire.code());
        match self.wire {
            WireType::Int | WireType::Msg => write_uvarint(buf, self.uint),
            WireType::Bytes => {
                write_uvarint(buf, self.bytes.len() as u64);
                buf.put_slice(&self.bytes);
            }
        }
    }

    /// Decode the next record, or `None` at a clean end of input.
    pub fn decode(buf: &mut impl Buf) -> Result<Option<Self>> {
        if !buf.has_remaining() {
            return Ok(None);
        }
        let id = read_uvarint(buf)?;
        let wire = WireType::from_code(read_uvarint(buf)?)?;
        let record = match wire {
            WireType::Int => Self::int(id, read_uvarint(buf)?),
            WireType::Msg => {
                let presence = read_uvarint(buf)?;
                if presence > 1 {
                    return Err(Error::InvalidRecord(format!(
                        "field {id} has presence {presence}, expected 0 or 1"
                    )));
                }
                Self {
                    id,
                    wire,
                    uint: presence,
                    bytes: Vec::new(),
                }
            }
            WireType::Bytes => {
                let len = read_uvarint(buf)?;
                if buf.remaining() < len as usize {
                    return Err(Error::InvalidRecord(format!(
                        "field {id} declares {len} bytes, {} remain",
                        buf.remaining()
                    )));
                }
                let mut bytes = vec![0u8; len as usize];
                buf.copy_to_slice(&mut bytes);
                Self::bytes(id, bytes)
            }
        };
        Ok(Some(record))
    }

    /// Decode an entire field stream, preserving order.
    pub fn decode_all(mut data: &[u8]) -> Result<Vec<Self>> {
        let mut records = Vec::new();
        while let Some(record) = Self::decode(&mut data)? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_each_wire_type() {
        for record in [
            FieldRecord::int(3, 42),
            FieldRecord::bytes(1, b"hello".to_vec()),
            FieldRecord::bytes(2, Vec::new()),
            FieldRecord::msg(7, true),
            FieldRecord::msg(7, false),
        ] {
            let mut buf = Vec::new();
            record.encode(&mut buf);
            let decoded = FieldRecord::decode(&mut buf.as_slice()).unwrap().unwrap();
            assert_eq!(decoded, record);
        }
    }

    #[test]
    fn test_stream_preserves_order_and_repetition() {
        let records = vec![
            FieldRecord::int(0, 1),
            FieldRecord::int(0, 2),
            FieldRecord::bytes(1, b"a".to_vec()),
            FieldRecord::int(0, 3),
        ];
        let mut buf = Vec::new();
        for record in &records {
            record.encode(&mut buf);
        }
        assert_eq!(FieldRecord::decode_all(&buf).unwrap(), records);
    }

    #[test]
    fn test_clean_eof() {
        assert_eq!(FieldRecord::decode(&mut &[][..]).unwrap(), None);
    }

    #[test]
    fn test_unknown_wire_type() {
        let mut buf = Vec::new();
        crate::varint::write_uvarint(&mut buf, 0);
        crate::varint::write_uvarint(&mut buf, 9);
        match FieldRecord::decode(&mut buf.as_slice()) {
            Err(Error::UnknownWireType(9)) => {}
            other => panic!("expected UnknownWireType, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_bytes_payload() {
        let mut buf = Vec::new();
        FieldRecord::bytes(1, b"hello".to_vec()).encode(&mut buf);
        buf.truncate(buf.len() - 2);
        assert!(FieldRecord::decode(&mut buf.as_slice()).is_err());
    }
}
