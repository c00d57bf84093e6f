// ThreadReference command implementations (command set 11)

use crate::codec::{self, IdKind};
use crate::commands::{command_sets, thread_commands};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::protocol::CommandPacket;
use crate::types::{FrameInfo, Location, ThreadId, ThreadStatus};

impl JdwpConnection {
    /// ThreadReference.Name
    pub async fn get_thread_name(&self, thread_id: ThreadId) -> JdwpResult<String> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::NAME);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_string(&mut reply.data())
    }

    /// ThreadReference.Status — returns (thread status, suspend status).
    pub async fn get_thread_status(&self, thread_id: ThreadId) -> JdwpResult<(i32, i32)> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::STATUS);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let thread_status = codec::read_i32(&mut data)?;
        let suspend_status = codec::read_i32(&mut data)?;
        Ok((thread_status, suspend_status))
    }

    /// ThreadReference.Frames — returns `length` frames starting at
    /// `start_frame` (0 = topmost); pass `length = -1` for all remaining
    /// frames.
    pub async fn get_frames(&self, thread_id: ThreadId, start_frame: i32, length: i32) -> JdwpResult<Vec<FrameInfo>> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::FRAMES);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        packet.data.extend_from_slice(&start_frame.to_be_bytes());
        packet.data.extend_from_slice(&length.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let count = codec::read_i32(&mut data)?;
        let mut frames = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let frame_id = codec::read_id(&mut data, &sizes, IdKind::Frame)?;
            let type_tag = codec::read_u8(&mut data)?;
            let class_id = codec::read_id(&mut data, &sizes, IdKind::ReferenceType)?;
            let method_id = codec::read_id(&mut data, &sizes, IdKind::Method)?;
            let index = codec::read_u64(&mut data)?;
            frames.push(FrameInfo { frame_id, location: Location { type_tag, class_id, method_id, index } });
        }
        Ok(frames)
    }

    /// ThreadReference.FrameCount
    pub async fn get_frame_count(&self, thread_id: ThreadId) -> JdwpResult<i32> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::FRAME_COUNT);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_i32(&mut reply.data())
    }

    /// ThreadReference.Suspend — suspends a single thread.
    pub async fn suspend_thread(&self, thread_id: ThreadId) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::SUSPEND);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        self.send_command(packet).await?.check_error()
    }

    /// ThreadReference.Resume — resumes a single thread.
    pub async fn resume_thread(&self, thread_id: ThreadId) -> JdwpResult<()> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::RESUME);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;
        self.send_command(packet).await?.check_error()
    }

    /// ThreadReference.SuspendCount — how many nested suspends are
    /// outstanding for this thread.
    pub async fn suspend_count(&self, thread_id: ThreadId) -> JdwpResult<i32> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::THREAD_REFERENCE, thread_commands::SUSPEND_COUNT);
        codec::write_id(&mut packet.data, &sizes, IdKind::Object, thread_id)?;

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        codec::read_i32(&mut reply.data())
    }
}

pub fn status_name(thread_status: i32) -> &'static str {
    match ThreadStatus::from_i32(thread_status) {
        Some(ThreadStatus::Zombie) => "zombie",
        Some(ThreadStatus::Running) => "running",
        Some(ThreadStatus::Sleeping) => "sleeping",
        Some(ThreadStatus::Monitor) => "monitor",
        Some(ThreadStatus::Wait) => "wait",
        None => "unknown",
    }
}
