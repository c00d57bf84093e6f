// VirtualMachine command implementations (command set 1)
//
// The fundamental commands for querying and controlling the target JVM.

use crate::codec::{self, IdKind};
use crate::commands::{command_sets, vm_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::types::{ReferenceTypeId, ThreadId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmVersion {
    pub description: String,
    pub jdwp_major: i32,
    pub jdwp_minor: i32,
    pub vm_version: String,
    pub vm_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassInfo {
    pub ref_type_tag: u8,
    pub type_id: ReferenceTypeId,
    pub signature: String,
    pub status: i32,
}

impl JdwpConnection {
    /// VirtualMachine.Version
    pub async fn get_version(&self) -> JdwpResult<VmVersion> {
        let packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::VERSION);
        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        Ok(VmVersion {
            description: codec::read_string(&mut data)?,
            jdwp_major: codec::read_i32(&mut data)?,
            jdwp_minor: codec::read_i32(&mut data)?,
            vm_version: codec::read_string(&mut data)?,
            vm_name: codec::read_string(&mut data)?,
        })
    }

    /// VirtualMachine.ClassesBySignature. Signature format:
    /// `Lcom/example/MyClass;` for classes, `[I` for an int array, etc.
    pub async fn classes_by_signature(&self, signature: &str) -> JdwpResult<Vec<ClassInfo>> {
        let sizes = self.id_sizes();
        let mut packet = crate::protocol::CommandPacket::new(
            self.next_id(),
            command_sets::VIRTUAL_MACHINE,
            vm_commands::CLASSES_BY_SIGNATURE,
        );
        codec::write_string(&mut packet.data, signature);

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut classes = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let ref_type_tag = codec::read_u8(&mut data)?;
            let type_id = codec::read_id(&mut data, &sizes, IdKind::ReferenceType)?;
            let status = codec::read_i32(&mut data)?;
            classes.push(ClassInfo { ref_type_tag, type_id, signature: signature.to_string(), status });
        }
        Ok(classes)
    }

    /// VirtualMachine.AllClasses
    pub async fn all_classes(&self) -> JdwpResult<Vec<ClassInfo>> {
        let sizes = self.id_sizes();
        let packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::ALL_CLASSES);
        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut classes = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let ref_type_tag = codec::read_u8(&mut data)?;
            let type_id = codec::read_id(&mut data, &sizes, IdKind::ReferenceType)?;
            let signature = codec::read_string(&mut data)?;
            let status = codec::read_i32(&mut data)?;
            classes.push(ClassInfo { ref_type_tag, type_id, signature, status });
        }
        Ok(classes)
    }

    /// VirtualMachine.AllThreads
    pub async fn all_threads(&self) -> JdwpResult<Vec<ThreadId>> {
        let sizes = self.id_sizes();
        let packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::ALL_THREADS);
        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut threads = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            threads.push(codec::read_id(&mut data, &sizes, IdKind::Object)?);
        }
        Ok(threads)
    }

    /// VirtualMachine.Suspend — suspends every thread in the target VM.
    pub async fn suspend_all(&self) -> JdwpResult<()> {
        let packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::SUSPEND);
        self.send_command(packet).await?.check_error()
    }

    /// VirtualMachine.Resume
    pub async fn resume_all(&self) -> JdwpResult<()> {
        let packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::RESUME);
        self.send_command(packet).await?.check_error()
    }

    /// Resumes every thread except `thread_id`. JDWP has no dedicated
    /// command for this, so it is built from ThreadReference.Suspend and
    /// VirtualMachine.Resume: suspending the excluded thread once more
    /// before the blanket resume leaves its suspend count exactly where it
    /// was, while every other thread's count drops by one and runs.
    pub async fn resume_all_except(&self, thread_id: ThreadId) -> JdwpResult<()> {
        self.suspend_thread(thread_id).await?;
        self.resume_all().await
    }

    /// VirtualMachine.CreateString — allocates a new String instance in the
    /// target VM and returns its object id.
    pub async fn create_string(&self, value: &str) -> JdwpResult<u64> {
        let sizes = self.id_sizes();
        let mut packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::CREATE_STRING);
        codec::write_string(&mut packet.data, value);

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        let mut data = reply.data();
        codec::read_id(&mut data, &sizes, IdKind::Object)
    }

    /// VirtualMachine.Dispose — releases the debugger's hold on the VM.
    pub async fn dispose(&self) -> JdwpResult<()> {
        let packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::DISPOSE);
        self.send_command(packet).await?.check_error()
    }

    /// VirtualMachine.Exit — terminates the target VM with the given exit
    /// code.
    pub async fn exit(&self, exit_code: i32) -> JdwpResult<()> {
        let mut packet = crate::protocol::CommandPacket::new(self.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::EXIT);
        packet.data.extend_from_slice(&exit_code.to_be_bytes());
        self.send_command(packet).await?.check_error()
    }
}
