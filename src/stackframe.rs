// StackFrame command implementations (command set 16)

use crate::codec::{self, IdKind, Tag, Value};
use crate::commands::{command_sets, stack_frame_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{FrameId, ObjectId, ThreadId};

#[derive(Debug, Clone, Copy)]
pub struct VariableSlot {
    pub slot: i32,
    pub sig_byte: u8,
}

impl JdwpConnection {
    /// StackFrame.GetValues
    pub async fn get_frame_values(
        &self,
        thread_id: ThreadId,
        frame_id: FrameId,
        slots: &[VariableSlot],
    ) -> JdwpResult<Vec<Value>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::STACK_FRAME, stack_frame_commands::GET_VALUES);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Frame, frame_id)?;
        packet.data.extend_from_slice(&(slots.len() as i32).to_be_bytes());
        for slot in slots {
            packet.data.extend_from_slice(&slot.slot.to_be_bytes());
            packet.data.push(slot.sig_byte);
        }

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut values = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            values.push(Value::decode(&sizes, &mut data)?);
        }
        Ok(values)
    }

    /// StackFrame.SetValues
    pub async fn set_frame_values(
        &self,
        thread_id: ThreadId,
        frame_id: FrameId,
        values: &[(VariableSlot, Value)],
    ) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::STACK_FRAME, stack_frame_commands::SET_VALUES);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Frame, frame_id)?;
        packet.data.extend_from_slice(&(values.len() as i32).to_be_bytes());
        for (slot, value) in values {
            packet.data.extend_from_slice(&slot.slot.to_be_bytes());
            value.encode(&sizes, &mut packet.data)?;
        }

        self.send_command(packet).await?.check_error()
    }

    /// StackFrame.ThisObject — the receiver of the frame's method, or object
    /// id 0 if the frame is in a static method.
    pub async fn get_this_object(&self, thread_id: ThreadId, frame_id: FrameId) -> JdwpResult<ObjectId> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::STACK_FRAME, stack_frame_commands::THIS_OBJECT);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Frame, frame_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let _tag = codec::read_u8(&mut data)?;
        codec::read_id(&mut data, &sizes, IdKind::Object)
    }
}

/// Builds the tag byte StackFrame.GetValues expects for a variable of the
/// given signature's first character.
pub fn tag_for_signature(signature: &str) -> JdwpResult<u8> {
    let first = signature
        .bytes()
        .next()
        .ok_or_else(|| crate::error::JdwpError::Signature("empty signature".into()))?;
    let tag = match first {
        b'[' => Tag::Array,
        b'B' => Tag::Byte,
        b'C' => Tag::Char,
        b'L' => Tag::Object,
        b'F' => Tag::Float,
        b'D' => Tag::Double,
        b'I' => Tag::Int,
        b'J' => Tag::Long,
        b'S' => Tag::Short,
        b'V' => Tag::Void,
        b'Z' => Tag::Boolean,
        other => {
            return Err(crate::error::JdwpError::Signature(format!(
                "unrecognized signature lead byte: {other:#x}"
            )))
        }
    };
    Ok(tag.as_u8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_for_signature_handles_primitives_and_objects() {
        assert_eq!(tag_for_signature("I").unwrap(), Tag::Int.as_u8());
        assert_eq!(tag_for_signature("Ljava/lang/String;").unwrap(), Tag::Object.as_u8());
        assert_eq!(tag_for_signature("[I").unwrap(), Tag::Array.as_u8());
    }

    #[test]
    fn tag_for_signature_rejects_empty() {
        assert!(tag_for_signature("").is_err());
    }
}
