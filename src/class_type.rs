// ClassType command implementations (command set 3)

use crate::codec::{self, IdKind, Value};
use crate::commands::{class_type_commands, command_sets};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{ClassId, FieldId, MethodId, ObjectId, ThreadId};

/// Bit 0 of the `options` argument to `InvokeMethod`/`NewInstance`: invoke
/// with only the invoking thread resumed rather than the whole VM.
pub const INVOKE_SINGLE_THREADED: i32 = 0x01;

/// Result of ClassType/ObjectReference InvokeMethod: the method's return
/// value, plus a non-null exception object id if the invoked method threw.
#[derive(Debug, Clone)]
pub struct InvokeResult {
    pub return_value: Value,
    pub exception: Option<ObjectId>,
}

impl JdwpConnection {
    /// ClassType.Superclass
    pub async fn get_superclass(&self, class_id: ClassId) -> JdwpResult<ClassId> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::CLASS_TYPE, class_type_commands::SUPERCLASS);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, class_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_id(&mut reply.data(), &sizes, IdKind::ReferenceType)
    }

    /// ClassType.SetValues — sets static field values.
    pub async fn set_static_values(&self, class_id: ClassId, values: &[(FieldId, Value)]) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::CLASS_TYPE, class_type_commands::SET_VALUES);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, class_id)?;
        packet.data.extend_from_slice(&(values.len() as i32).to_be_bytes());
        for (field_id, value) in values {
            codec::write_id(&mut packet.data, &sizes, IdKind::Field, *field_id)?;
            let mut tagged = Vec::new();
            value.encode(&sizes, &mut tagged)?;
            packet.data.extend_from_slice(&tagged[1..]);
        }

        self.send_command(packet).await?.check_error()
    }

    /// ClassType.InvokeMethod — runs a static method in the target VM,
    /// resuming the threads described by `options` for the invocation's
    /// duration.
    pub async fn invoke_static_method(
        &self,
        class_id: ClassId,
        thread_id: ThreadId,
        method_id: MethodId,
        arguments: &[Value],
        options: i32,
    ) -> JdwpResult<InvokeResult> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::CLASS_TYPE, class_type_commands::INVOKE_METHOD);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, class_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Method, method_id)?;
        packet.data.extend_from_slice(&(arguments.len() as i32).to_be_bytes());
        for argument in arguments {
            argument.encode(&sizes, &mut packet.data)?;
        }
        packet.data.extend_from_slice(&options.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        read_invoke_reply(&sizes, &mut reply.data())
    }

    /// ClassType.NewInstance — constructs a new instance of `class_id`,
    /// invoking the constructor named by `method_id` with `arguments`.
    pub async fn new_instance(
        &self,
        class_id: ClassId,
        thread_id: ThreadId,
        method_id: MethodId,
        arguments: &[Value],
        options: i32,
    ) -> JdwpResult<InvokeResult> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::CLASS_TYPE, class_type_commands::NEW_INSTANCE);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, class_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Method, method_id)?;
        packet.data.extend_from_slice(&(arguments.len() as i32).to_be_bytes());
        for argument in arguments {
            argument.encode(&sizes, &mut packet.data)?;
        }
        packet.data.extend_from_slice(&options.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        read_invoke_reply(&sizes, &mut reply.data())
    }
}

/// Shared decode for the `(return_value, exception)` tail common to every
/// InvokeMethod/NewInstance reply. The exception slot is a tagged object id;
/// id `0` means no exception was thrown.
pub(crate) fn read_invoke_reply(sizes: &crate::codec::IdSizes, data: &mut &[u8]) -> JdwpResult<InvokeResult> {
    let return_value = Value::decode(sizes, data)?;
    let _exception_tag = codec::read_u8(data)?;
    let exception_id = codec::read_id(data, sizes, IdKind::Object)?;
    Ok(InvokeResult {
        return_value,
        exception: if exception_id == 0 { None } else { Some(exception_id) },
    })
}
