// Tagged polymorphic JDWP values, as exchanged in StackFrame.GetValues,
// ObjectReference.GetValues, Event.Composite and method invocation results.

use super::{read_id, write_id, IdKind, IdSizes, Tag};
use crate::error::JdwpResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueData {
    Byte(i8),
    Char(u16),
    Float(f32),
    Double(f64),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    Object(u64),
    Void,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub tag: u8,
    pub data: ValueData,
}

impl Value {
    pub fn tag(&self) -> JdwpResult<Tag> {
        Tag::try_from(self.tag)
    }

    /// Encodes the tag byte followed by the value's inline representation
    /// (object-like tags carry an object id sized per `sizes`).
    pub fn encode(&self, sizes: &IdSizes, out: &mut Vec<u8>) -> JdwpResult<()> {
        out.push(self.tag);
        match &self.data {
            ValueData::Byte(v) => out.push(*v as u8),
            ValueData::Boolean(v) => out.push(*v as u8),
            ValueData::Char(v) => out.extend_from_slice(&v.to_be_bytes()),
            ValueData::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
            ValueData::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            ValueData::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
            ValueData::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            ValueData::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
            ValueData::Object(id) => write_id(out, sizes, IdKind::Object, *id)?,
            ValueData::Void => {}
        }
        Ok(())
    }

    /// Decodes a tag byte followed by its inline representation.
    pub fn decode(sizes: &IdSizes, buf: &mut &[u8]) -> JdwpResult<Self> {
        let raw_tag = super::read_u8(buf)?;
        let tag = Tag::try_from(raw_tag)?;
        let data = decode_tagged(sizes, tag, buf)?;
        Ok(Value { tag: raw_tag, data })
    }

    pub fn void() -> Self {
        Value { tag: Tag::Void.as_u8(), data: ValueData::Void }
    }

    pub fn format(&self) -> String {
        match &self.data {
            ValueData::Byte(v) => format!("{v}"),
            ValueData::Char(v) => char::from_u32(*v as u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| format!("\\u{v:04x}")),
            ValueData::Float(v) => format!("{v}"),
            ValueData::Double(v) => format!("{v}"),
            ValueData::Int(v) => format!("{v}"),
            ValueData::Long(v) => format!("{v}"),
            ValueData::Short(v) => format!("{v}"),
            ValueData::Boolean(v) => format!("{v}"),
            ValueData::Object(id) => format!("object@{id:#x}"),
            ValueData::Void => "void".to_string(),
        }
    }
}

/// Decodes the inline payload for a value already known to carry `tag`, as
/// used when a surrounding message has already announced the tag separately
/// from the value bytes (e.g. StackFrame.GetValues slot descriptors).
pub fn decode_tagged(sizes: &IdSizes, tag: Tag, buf: &mut &[u8]) -> JdwpResult<ValueData> {
    Ok(match tag {
        Tag::Byte => ValueData::Byte(super::read_i8(buf)?),
        Tag::Boolean => ValueData::Boolean(super::read_bool(buf)?),
        Tag::Char => ValueData::Char(super::read_u16(buf)?),
        Tag::Short => ValueData::Short(super::read_i16(buf)?),
        Tag::Int => ValueData::Int(super::read_i32(buf)?),
        Tag::Long => ValueData::Long(super::read_i64(buf)?),
        Tag::Float => ValueData::Float(super::read_f32(buf)?),
        Tag::Double => ValueData::Double(super::read_f64(buf)?),
        Tag::Void => ValueData::Void,
        Tag::Array
        | Tag::Object
        | Tag::String
        | Tag::Thread
        | Tag::ThreadGroup
        | Tag::ClassLoader
        | Tag::ClassObject => ValueData::Object(read_id(buf, sizes, IdKind::Object)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> IdSizes {
        IdSizes::ALL_EIGHT
    }

    #[test]
    fn int_value_round_trips() {
        let v = Value { tag: Tag::Int.as_u8(), data: ValueData::Int(-42) };
        let mut out = Vec::new();
        v.encode(&sizes(), &mut out).unwrap();
        assert_eq!(out.len(), 5);
        let mut slice = out.as_slice();
        let decoded = Value::decode(&sizes(), &mut slice).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn object_value_round_trips_at_four_byte_width() {
        let mut sizes = IdSizes::ALL_EIGHT;
        sizes.object_id_size = 4;
        let v = Value { tag: Tag::Object.as_u8(), data: ValueData::Object(0xdead_beef) };
        let mut out = Vec::new();
        v.encode(&sizes, &mut out).unwrap();
        assert_eq!(out.len(), 1 + 4);
        let mut slice = out.as_slice();
        assert_eq!(Value::decode(&sizes, &mut slice).unwrap(), v);
    }

    #[test]
    fn void_value_has_no_payload() {
        let v = Value::void();
        let mut out = Vec::new();
        v.encode(&sizes(), &mut out).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        let data = [b'?'];
        let mut slice = &data[..];
        assert!(Value::decode(&sizes(), &mut slice).is_err());
    }

    #[test]
    fn format_renders_primitives() {
        assert_eq!(Value { tag: Tag::Int.as_u8(), data: ValueData::Int(7) }.format(), "7");
        assert_eq!(
            Value { tag: Tag::Boolean.as_u8(), data: ValueData::Boolean(true) }.format(),
            "true"
        );
    }
}
