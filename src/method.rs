// Method command implementations (command set 6)

use crate::codec::{self, IdKind};
use crate::commands::{command_sets, method_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{MethodId, ReferenceTypeId, Variable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineTableEntry {
    pub line_code_index: u64,
    pub line_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineTable {
    pub start: u64,
    pub end: u64,
    pub lines: Vec<LineTableEntry>,
}

impl JdwpConnection {
    /// Method.LineTable — maps source line numbers to bytecode positions.
    pub async fn get_line_table(&self, ref_type_id: ReferenceTypeId, method_id: MethodId) -> JdwpResult<LineTable> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::METHOD, method_commands::LINE_TABLE);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Method, method_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let start = codec::read_u64(&mut data)?;
        let end = codec::read_u64(&mut data)?;
        let count = codec::read_i32(&mut data)?;
        let mut lines = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let line_code_index = codec::read_u64(&mut data)?;
            let line_number = codec::read_i32(&mut data)?;
            lines.push(LineTableEntry { line_code_index, line_number });
        }
        Ok(LineTable { start, end, lines })
    }

    /// Method.VariableTable — local variable names, signatures and slots.
    pub async fn get_variable_table(&self, ref_type_id: ReferenceTypeId, method_id: MethodId) -> JdwpResult<Vec<Variable>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::METHOD, method_commands::VARIABLE_TABLE);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Method, method_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let _arg_count = codec::read_i32(&mut data)?;
        let count = codec::read_i32(&mut data)?;
        let mut variables = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let code_index = codec::read_u64(&mut data)?;
            let name = codec::read_string(&mut data)?;
            let signature = codec::read_string(&mut data)?;
            let length = codec::read_u32(&mut data)?;
            let slot = codec::read_u32(&mut data)?;
            variables.push(Variable { code_index, name, signature, length, slot });
        }
        Ok(variables)
    }

    /// Method.Bytecodes — raw bytecode of the method, for opcode-level
    /// inspection.
    pub async fn get_bytecodes(&self, ref_type_id: ReferenceTypeId, method_id: MethodId) -> JdwpResult<Vec<u8>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::METHOD, method_commands::BYTECODES);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;
        codec::write_id(&mut packet.data, &sizes, IdKind::Method, method_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let len = codec::read_i32(&mut data)? as usize;
        codec::read_bytes(&mut data, len)
    }
}
