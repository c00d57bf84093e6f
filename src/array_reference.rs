// ArrayReference command implementations (command set 13)

use crate::codec::{self, decode_tagged, IdKind, Tag, Value, ValueData};
use crate::commands::{array_reference_commands, command_sets};
use crate::connection::JdwpConnection;
use crate::error::{JdwpError, JdwpResult};
use crate::protocol::CommandPacket;
use crate::types::ArrayId;

impl JdwpConnection {
    /// ArrayReference.Length
    pub async fn get_array_length(&self, array_id: ArrayId) -> JdwpResult<i32> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::ARRAY_REFERENCE, array_reference_commands::LENGTH);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, array_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_i32(&mut reply.data())
    }

    /// ArrayReference.GetValues — reads `length` elements starting at
    /// `first_index`. All values share one tag, broadcast once ahead of the
    /// element payloads rather than per-element as in StackFrame.GetValues.
    pub async fn get_array_values(&self, array_id: ArrayId, first_index: i32, length: i32) -> JdwpResult<Vec<Value>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::ARRAY_REFERENCE, array_reference_commands::GET_VALUES);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, array_id)?;
        packet.data.extend_from_slice(&first_index.to_be_bytes());
        packet.data.extend_from_slice(&length.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let raw_tag = codec::read_u8(&mut data)?;
        let tag = Tag::try_from(raw_tag)?;
        let count = codec::read_i32(&mut data)?;
        let mut values = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let element_data = decode_tagged(&sizes, tag, &mut data)?;
            values.push(Value { tag: raw_tag, data: element_data });
        }
        Ok(values)
    }

    /// ArrayReference.SetValues — writes consecutive elements starting at
    /// `first_index`. All values must share the array's element tag.
    pub async fn set_array_values(&self, array_id: ArrayId, first_index: i32, values: &[Value]) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::ARRAY_REFERENCE, array_reference_commands::SET_VALUES);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, array_id)?;
        packet.data.extend_from_slice(&first_index.to_be_bytes());
        packet.data.extend_from_slice(&(values.len() as i32).to_be_bytes());
        for value in values {
            write_untagged(&sizes, value, &mut packet.data)?;
        }

        self.send_command(packet).await?.check_error()
    }
}

fn write_untagged(sizes: &crate::codec::IdSizes, value: &Value, out: &mut Vec<u8>) -> JdwpResult<()> {
    match &value.data {
        ValueData::Byte(v) => out.push(*v as u8),
        ValueData::Boolean(v) => out.push(*v as u8),
        ValueData::Char(v) => out.extend_from_slice(&v.to_be_bytes()),
        ValueData::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        ValueData::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        ValueData::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        ValueData::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        ValueData::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        ValueData::Object(id) => codec::write_id(out, sizes, IdKind::Object, *id)?,
        ValueData::Void => return Err(JdwpError::Codec("cannot store void in an array".into())),
    }
    Ok(())
}
