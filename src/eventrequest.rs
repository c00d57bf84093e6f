// EventRequest command implementations
//
// Sets up and tears down event requests (breakpoints, steps, exceptions,
// class prepares, ...).

use crate::codec::{self, IdKind};
use crate::commands::{command_sets, event_commands, event_kinds, step_depths, step_sizes};
use crate::connection::JdwpConnection;
use crate::error::JdwpResult;
use crate::events::EventModifier;
use crate::protocol::CommandPacket;
use crate::types::{Location, MethodId, ReferenceTypeId, ThreadId};

/// Determines which threads are suspended when a matching event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SuspendPolicy {
    None = 0,
    EventThread = 1,
    All = 2,
}

impl JdwpConnection {
    /// EventRequest.Set: requests notification when an event of `event_kind`
    /// matching every modifier occurs. Returns the request id to later pass
    /// to `subscribe_events`/`clear_event_request`.
    pub async fn set_event_request(
        &self,
        event_kind: u8,
        suspend_policy: SuspendPolicy,
        modifiers: &[EventModifier],
    ) -> JdwpResult<i32> {
        let sizes = self.id_sizes();
        let mut packet = CommandPacket::new(self.next_id(), command_sets::EVENT_REQUEST, event_commands::SET);

        packet.data.push(event_kind);
        packet.data.push(suspend_policy as u8);
        packet.data.extend_from_slice(&(modifiers.len() as i32).to_be_bytes());
        for modifier in modifiers {
            modifier.encode(&sizes, &mut packet.data)?;
        }

        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        codec::read_i32(&mut data)
    }

    /// EventRequest.Clear for a single request id and kind.
    pub async fn clear_event_request(&self, event_kind: u8, request_id: i32) -> JdwpResult<()> {
        let mut packet = CommandPacket::new(self.next_id(), command_sets::EVENT_REQUEST, event_commands::CLEAR);
        packet.data.push(event_kind);
        packet.data.extend_from_slice(&request_id.to_be_bytes());

        let reply = self.send_command(packet).await?;
        reply.check_error()?;
        self.unsubscribe_events(request_id);
        Ok(())
    }

    /// Convenience wrapper: requests a breakpoint at a bytecode location.
    pub async fn set_breakpoint(
        &self,
        class_id: ReferenceTypeId,
        method_id: MethodId,
        bytecode_index: u64,
        suspend_policy: SuspendPolicy,
    ) -> JdwpResult<i32> {
        let location = Location { type_tag: 1, class_id, method_id, index: bytecode_index };
        self.set_event_request(
            event_kinds::BREAKPOINT,
            suspend_policy,
            &[EventModifier::LocationOnly(location)],
        )
        .await
    }

    pub async fn clear_breakpoint(&self, request_id: i32) -> JdwpResult<()> {
        self.clear_event_request(event_kinds::BREAKPOINT, request_id).await
    }

    /// Convenience wrapper: requests a single-step notification for a
    /// thread, stepping by line, through the given depth.
    pub async fn set_step_request(
        &self,
        thread: ThreadId,
        depth: StepDepth,
        suspend_policy: SuspendPolicy,
    ) -> JdwpResult<i32> {
        self.set_event_request(
            event_kinds::SINGLE_STEP,
            suspend_policy,
            &[
                EventModifier::Step { thread, size: step_sizes::LINE, depth: depth.as_i32() },
                EventModifier::ThreadOnly(thread),
            ],
        )
        .await
    }

    pub async fn clear_step_request(&self, request_id: i32) -> JdwpResult<()> {
        self.clear_event_request(event_kinds::SINGLE_STEP, request_id).await
    }

    /// EventRequest.ClearAllBreakpoints — clears every breakpoint request
    /// regardless of request id.
    pub async fn clear_all_breakpoints(&self) -> JdwpResult<()> {
        let packet = CommandPacket::new(self.next_id(), command_sets::EVENT_REQUEST, event_commands::CLEAR_ALL_BREAKPOINTS);
        self.send_command(packet).await?.check_error()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDepth {
    Into,
    Over,
    Out,
}

impl StepDepth {
    fn as_i32(self) -> i32 {
        match self {
            StepDepth::Into => step_depths::INTO,
            StepDepth::Over => step_depths::OVER,
            StepDepth::Out => step_depths::OUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::IdSizes;

    #[test]
    fn location_only_modifier_encodes_expected_layout() {
        let location = Location { type_tag: 1, class_id: 0xAA, method_id: 0xBB, index: 0x10 };
        let modifier = EventModifier::LocationOnly(location);
        let mut out = Vec::new();
        modifier.encode(&IdSizes::ALL_EIGHT, &mut out).unwrap();
        assert_eq!(out[0], crate::commands::modifier_kinds::LOCATION_ONLY);
        assert_eq!(out[1], 1); // type tag
        assert_eq!(out.len(), 1 + 1 + 8 + 8 + 8);
    }

    #[test]
    fn step_depth_maps_to_jdwp_constants() {
        assert_eq!(StepDepth::Into.as_i32(), step_depths::INTO);
        assert_eq!(StepDepth::Over.as_i32(), step_depths::OVER);
        assert_eq!(StepDepth::Out.as_i32(), step_depths::OUT);
    }
}
