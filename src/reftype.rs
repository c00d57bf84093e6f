// ReferenceType command implementations (command set 2)
//
// Commands for introspecting classes, interfaces, and arrays once their
// ReferenceTypeId is known.

use crate::codec::{self, IdKind, Value};
use crate::commands::{command_sets, reference_type_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{FieldId, MethodId, ReferenceTypeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub method_id: MethodId,
    pub name: String,
    pub signature: String,
    pub mod_bits: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub field_id: FieldId,
    pub name: String,
    pub signature: String,
    pub mod_bits: i32,
}

impl JdwpConnection {
    /// ReferenceType.Signature
    pub async fn get_signature(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<String> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::SIGNATURE);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_string(&mut reply.data())
    }

    /// ReferenceType.Status
    pub async fn get_status(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<i32> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::STATUS);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_i32(&mut reply.data())
    }

    /// ReferenceType.Methods
    pub async fn get_methods(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<Vec<MethodInfo>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::METHODS);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut methods = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let method_id = codec::read_id(&mut data, &sizes, IdKind::Method)?;
            let name = codec::read_string(&mut data)?;
            let signature = codec::read_string(&mut data)?;
            let mod_bits = codec::read_i32(&mut data)?;
            methods.push(MethodInfo { method_id, name, signature, mod_bits });
        }
        Ok(methods)
    }

    /// ReferenceType.Fields
    pub async fn get_fields(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<Vec<FieldInfo>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::FIELDS);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut fields = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let field_id = codec::read_id(&mut data, &sizes, IdKind::Field)?;
            let name = codec::read_string(&mut data)?;
            let signature = codec::read_string(&mut data)?;
            let mod_bits = codec::read_i32(&mut data)?;
            fields.push(FieldInfo { field_id, name, signature, mod_bits });
        }
        Ok(fields)
    }

    /// ReferenceType.Interfaces — direct superinterfaces implemented by this
    /// type.
    pub async fn get_interfaces(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<Vec<ReferenceTypeId>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::INTERFACES);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut interfaces = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            interfaces.push(codec::read_id(&mut data, &sizes, IdKind::ReferenceType)?);
        }
        Ok(interfaces)
    }

    /// ReferenceType.GetValues — reads static field values.
    pub async fn get_static_values(&self, ref_type_id: ReferenceTypeId, field_ids: &[FieldId]) -> JdwpResult<Vec<Value>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::GET_VALUES);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;
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

    /// ReferenceType.ClassLoader
    pub async fn get_class_loader(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<u64> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::REFERENCE_TYPE, reference_type_commands::CLASS_LOADER);
        codec::write_id(&mut packet.data, &sizes, IdKind::ReferenceType, ref_type_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_id(&mut reply.data(), &sizes, IdKind::Object)
    }
}
