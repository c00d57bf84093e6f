// ArrayType command implementations (command set 4)

use crate::codec::{self, IdKind};
use crate::commands::{array_type_commands, command_sets};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{ArrayId, ArrayTypeId};

impl JdwpConnection {
    /// ArrayType.NewInstance — allocates a new array of the given length and
    /// returns its object id.
    pub async fn new_array_instance(&self, array_type_id: ArrayTypeId, length: i32) -> JdwpResult<ArrayId> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::ARRAY_TYPE, array_type_commands::NEW_INSTANCE);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, array_type_id)?;
        packet.data.extend_from_slice(&length.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let _tag = codec::read_u8(&mut data)?;
        codec::read_id(&mut data, &sizes, IdKind::Object)
    }
}
