// StringReference command implementations (command set 10)

use crate::codec::{self, IdKind};
use crate::commands::{command_sets, string_reference_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::ObjectId;

impl JdwpConnection {
    /// StringReference.Value — the contents of a java.lang.String instance,
    /// as arbitrary UTF-8 (JDWP's modified UTF-8 is not NUL-terminated, so
    /// embedded NUL bytes are preserved rather than treated as a terminator).
    pub async fn get_string_value(&self, string_id: ObjectId) -> JdwpResult<String> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::STRING_REFERENCE, string_reference_commands::VALUE);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, string_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_string(&mut reply.data())
    }
}
