// ObjectReference command implementations (command set 9)

use crate::codec::{self, IdKind, Value};
use crate::commands::{command_sets, object_reference_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{ClassId, FieldId, MethodId, ObjectId, ReferenceTypeId, ThreadId};

impl JdwpConnection {
    /// ObjectReference.ReferenceType — the runtime class of an object.
    pub async fn get_object_reference_type(&self, object_id: ObjectId) -> JdwpResult<ReferenceTypeId> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::REFERENCE_TYPE,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let _type_tag = codec::read_u8(&mut data)?;
        codec::read_id(&mut data, &sizes, IdKind::ReferenceType)
    }

    /// ObjectReference.GetValues
    pub async fn get_object_values(&self, object_id: ObjectId, field_ids: &[FieldId]) -> JdwpResult<Vec<Value>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::GET_VALUES,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;
        packet.data.extend_from_slice(&(field_ids.len() as i32).to_be_bytes());
        for field_id in field_ids {
            codec::write_id(&mut packet.data, &sizes, IdKind::Field, *field_id)?;
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

    /// ObjectReference.SetValues
    pub async fn set_object_values(&self, object_id: ObjectId, values: &[(FieldId, Value)]) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::SET_VALUES,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;
        packet.data.extend_from_slice(&(values.len() as i32).to_be_bytes());
        for (field_id, value) in values {
            codec::write_id(&mut packet.data, &sizes, IdKind::Field, *field_id)?;
            // ObjectReference.SetValues carries untagged values (the field's
            // declared type is already known from the field id); write only
            // the payload, not the leading tag byte `Value::encode` adds.
            let mut tagged = Vec::new();
            value.encode(&sizes, &mut tagged)?;
            packet.data.extend_from_slice(&tagged[1..]);
        }

        self.send_command(packet).await?.check_error()
    }

    /// ObjectReference.DisableCollection — pins an object against garbage
    /// collection until a matching EnableCollection.
    pub async fn disable_collection(&self, object_id: ObjectId) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::DISABLE_COLLECTION,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;
        self.send_command(packet).await?.check_error()
    }

    /// ObjectReference.EnableCollection — undoes a DisableCollection.
    pub async fn enable_collection(&self, object_id: ObjectId) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::ENABLE_COLLECTION,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;
        self.send_command(packet).await?.check_error()
    }

    /// ObjectReference.InvokeMethod — runs an instance method on `object_id`
    /// via virtual dispatch starting at `class_id`, resuming the threads
    /// described by `options` for the invocation's duration.
    pub async fn invoke_instance_method(
        &self,
        object_id: ObjectId,
        thread_id: ThreadId,
        class_id: ClassId,
        method_id: MethodId,
        arguments: &[Value],
        options: i32,
    ) -> JdwpResult<crate::class_type::InvokeResult> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::INVOKE_METHOD,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, class_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Method, method_id)?;
        packet.data.extend_from_slice(&(arguments.len() as i32).to_be_bytes());
        for argument in arguments {
            argument.encode(&sizes, &mut packet.data)?;
        }
        packet.data.extend_from_slice(&options.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        crate::class_type::read_invoke_reply(&sizes, &mut reply.data())
    }

    /// ObjectReference.IsCollected
    pub async fn is_collected(&self, object_id: ObjectId) -> JdwpResult<bool> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(
            self.next_id(),
            command_sets::OBJECT_REFERENCE,
            object_reference_commands::IS_COLLECTED,
        );
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, object_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_bool(&mut reply.data())
    }
}
