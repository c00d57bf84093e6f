// JDWP event handling
//
// Events are delivered from the JVM as Event.Composite command packets (set
// 64, command 100) carrying a suspend policy and a batch of individual
// events, each tagged with the request ID of the EventRequest.Set call that
// asked for it.

use crate::codec::{self, IdKind, IdSizes, Value};
use crate::commands::event_kinds;
use crate::error::JdwpResult;
use crate::types::{FieldId, Location, ObjectId, ReferenceTypeId, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSet {
    pub suspend_policy: u8,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: u8,
    pub request_id: i32,
    pub details: EventDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventDetail {
    VmStart { thread: ThreadId },
    VmDeath,
    VmDisconnected,
    ThreadStart { thread: ThreadId },
    ThreadDeath { thread: ThreadId },
    ClassPrepare { thread: ThreadId, ref_type: ReferenceTypeId, signature: String, status: i32 },
    ClassUnload { signature: String },
    ClassLoad { thread: ThreadId, location: Location },
    SingleStep { thread: ThreadId, location: Location },
    Breakpoint { thread: ThreadId, location: Location },
    FramePop { thread: ThreadId, location: Location },
    UserDefined { thread: ThreadId, location: Location },
    ExceptionCatch { thread: ThreadId, location: Location },
    MethodEntry { thread: ThreadId, location: Location },
    MethodExit { thread: ThreadId, location: Location },
    MethodExitWithReturnValue { thread: ThreadId, location: Location, value: Value },
    Exception {
        thread: ThreadId,
        location: Location,
        exception: ObjectId,
        catch_location: Option<Location>,
    },
    FieldAccess {
        thread: ThreadId,
        location: Location,
        ref_type: ReferenceTypeId,
        field: FieldId,
        object: ObjectId,
    },
    FieldModification {
        thread: ThreadId,
        location: Location,
        ref_type: ReferenceTypeId,
        field: FieldId,
        object: ObjectId,
        value: Value,
    },
    MonitorContendedEnter { thread: ThreadId, object: ObjectId, location: Location },
    MonitorContendedEntered { thread: ThreadId, object: ObjectId, location: Location },
    MonitorWait { thread: ThreadId, object: ObjectId, timeout: i64 },
    MonitorWaited { thread: ThreadId, object: ObjectId, location: Location, timed_out: bool },
    Unknown { kind: u8 },
}

/// EventRequest.Set modifiers, restricting which occurrences of an event
/// kind are reported.
#[derive(Debug, Clone)]
pub enum EventModifier {
    Count(i32),
    ThreadOnly(ThreadId),
    ClassOnly(ReferenceTypeId),
    ClassMatch(String),
    ClassExclude(String),
    LocationOnly(Location),
    ExceptionOnly { ref_type: ReferenceTypeId, caught: bool, uncaught: bool },
    FieldOnly { ref_type: ReferenceTypeId, field_id: FieldId },
    Step { thread: ThreadId, size: i32, depth: i32 },
    InstanceOnly(ObjectId),
}

impl EventModifier {
    /// Encodes this modifier's kind byte and payload. Ids are written using
    /// `sizes` since object/reference-type/field ids appear in several
    /// modifier kinds.
    pub fn encode(&self, sizes: &IdSizes, out: &mut Vec<u8>) -> JdwpResult<()> {
        use crate::commands::modifier_kinds as m;
        match self {
            EventModifier::Count(n) => {
                out.push(m::COUNT);
                out.extend_from_slice(&n.to_be_bytes());
            }
            EventModifier::ThreadOnly(thread) => {
                out.push(m::THREAD_ONLY);
                codec::write_id(out, sizes, IdKind::Object, *thread)?;
            }
            EventModifier::ClassOnly(ref_type) => {
                out.push(m::CLASS_ONLY);
                codec::write_id(out, sizes, IdKind::ReferenceType, *ref_type)?;
            }
            EventModifier::ClassMatch(pattern) => {
                out.push(m::CLASS_MATCH);
                codec::write_string(out, pattern);
            }
            EventModifier::ClassExclude(pattern) => {
                out.push(m::CLASS_EXCLUDE);
                codec::write_string(out, pattern);
            }
            EventModifier::LocationOnly(location) => {
                out.push(m::LOCATION_ONLY);
                encode_location(sizes, location, out)?;
            }
            EventModifier::ExceptionOnly { ref_type, caught, uncaught } => {
                out.push(m::EXCEPTION_ONLY);
                codec::write_id(out, sizes, IdKind::ReferenceType, *ref_type)?;
                out.push(*caught as u8);
                out.push(*uncaught as u8);
            }
            EventModifier::FieldOnly { ref_type, field_id } => {
                out.push(m::FIELD_ONLY);
                codec::write_id(out, sizes, IdKind::ReferenceType, *ref_type)?;
                codec::write_id(out, sizes, IdKind::Field, *field_id)?;
            }
            EventModifier::Step { thread, size, depth } => {
                out.push(m::STEP);
                codec::write_id(out, sizes, IdKind::Object, *thread)?;
                out.extend_from_slice(&size.to_be_bytes());
                out.extend_from_slice(&depth.to_be_bytes());
            }
            EventModifier::InstanceOnly(object) => {
                out.push(m::INSTANCE_ONLY);
                codec::write_id(out, sizes, IdKind::Object, *object)?;
            }
        }
        Ok(())
    }
}

fn encode_location(sizes: &IdSizes, location: &Location, out: &mut Vec<u8>) -> JdwpResult<()> {
    out.push(location.type_tag);
    codec::write_id(out, sizes, IdKind::ReferenceType, location.class_id)?;
    codec::write_id(out, sizes, IdKind::Method, location.method_id)?;
    out.extend_from_slice(&location.index.to_be_bytes());
    Ok(())
}

fn read_location(sizes: &IdSizes, buf: &mut &[u8]) -> JdwpResult<Location> {
    let type_tag = codec::read_u8(buf)?;
    let class_id = codec::read_id(buf, sizes, IdKind::ReferenceType)?;
    let method_id = codec::read_id(buf, sizes, IdKind::Method)?;
    let index = codec::read_u64(buf)?;
    Ok(Location { type_tag, class_id, method_id, index })
}

/// Parses the body of an Event.Composite command packet (everything after
/// the 11-byte header).
pub fn parse_composite_event(sizes: &IdSizes, data: &[u8]) -> JdwpResult<EventSet> {
    let mut buf = data;
    let suspend_policy = codec::read_u8(&mut buf)?;
    let event_count = codec::read_i32(&mut buf)?;

    let mut events = Vec::with_capacity(event_count.max(0) as usize);
    for _ in 0..event_count {
        let kind = codec::read_u8(&mut buf)?;
        let request_id = codec::read_i32(&mut buf)?;
        let details = decode_event_detail(sizes, kind, &mut buf)?;
        events.push(Event { kind, request_id, details });
    }

    Ok(EventSet { suspend_policy, events })
}

fn decode_event_detail(sizes: &IdSizes, kind: u8, buf: &mut &[u8]) -> JdwpResult<EventDetail> {
    use IdKind::Object as Obj;
    use IdKind::ReferenceType as RefTy;

    Ok(match kind {
        event_kinds::VM_START => {
            EventDetail::VmStart { thread: codec::read_id(buf, sizes, Obj)? }
        }
        event_kinds::VM_DEATH => EventDetail::VmDeath,
        event_kinds::VM_DISCONNECTED => EventDetail::VmDisconnected,
        event_kinds::THREAD_START => {
            EventDetail::ThreadStart { thread: codec::read_id(buf, sizes, Obj)? }
        }
        event_kinds::THREAD_DEATH => {
            EventDetail::ThreadDeath { thread: codec::read_id(buf, sizes, Obj)? }
        }
        event_kinds::CLASS_PREPARE => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let _ref_type_tag = codec::read_u8(buf)?;
            let ref_type = codec::read_id(buf, sizes, RefTy)?;
            let signature = codec::read_string(buf)?;
            let status = codec::read_i32(buf)?;
            EventDetail::ClassPrepare { thread, ref_type, signature, status }
        }
        event_kinds::CLASS_UNLOAD => {
            EventDetail::ClassUnload { signature: codec::read_string(buf)? }
        }
        event_kinds::SINGLE_STEP => EventDetail::SingleStep {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::BREAKPOINT => EventDetail::Breakpoint {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::FRAME_POP => EventDetail::FramePop {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::USER_DEFINED => EventDetail::UserDefined {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::CLASS_LOAD => EventDetail::ClassLoad {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::EXCEPTION_CATCH => EventDetail::ExceptionCatch {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::METHOD_ENTRY => EventDetail::MethodEntry {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::METHOD_EXIT => EventDetail::MethodExit {
            thread: codec::read_id(buf, sizes, Obj)?,
            location: read_location(sizes, buf)?,
        },
        event_kinds::METHOD_EXIT_WITH_RETURN_VALUE => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let location = read_location(sizes, buf)?;
            let value = Value::decode(sizes, buf)?;
            EventDetail::MethodExitWithReturnValue { thread, location, value }
        }
        event_kinds::EXCEPTION => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let location = read_location(sizes, buf)?;
            let _tag = codec::read_u8(buf)?;
            let exception = codec::read_id(buf, sizes, Obj)?;
            let catch_type_tag = codec::read_u8(buf)?;
            let catch_location = if catch_type_tag == 0 {
                let _class_id = codec::read_id(buf, sizes, RefTy)?;
                let _method_id = codec::read_id(buf, sizes, IdKind::Method)?;
                let _index = codec::read_u64(buf)?;
                None
            } else {
                let class_id = codec::read_id(buf, sizes, RefTy)?;
                let method_id = codec::read_id(buf, sizes, IdKind::Method)?;
                let index = codec::read_u64(buf)?;
                Some(Location { type_tag: catch_type_tag, class_id, method_id, index })
            };
            EventDetail::Exception { thread, location, exception, catch_location }
        }
        event_kinds::FIELD_ACCESS => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let location = read_location(sizes, buf)?;
            let _ref_type_tag = codec::read_u8(buf)?;
            let ref_type = codec::read_id(buf, sizes, RefTy)?;
            let field = codec::read_id(buf, sizes, IdKind::Field)?;
            let _object_tag = codec::read_u8(buf)?;
            let object = codec::read_id(buf, sizes, Obj)?;
            EventDetail::FieldAccess { thread, location, ref_type, field, object }
        }
        event_kinds::FIELD_MODIFICATION => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let location = read_location(sizes, buf)?;
            let _ref_type_tag = codec::read_u8(buf)?;
            let ref_type = codec::read_id(buf, sizes, RefTy)?;
            let field = codec::read_id(buf, sizes, IdKind::Field)?;
            let _object_tag = codec::read_u8(buf)?;
            let object = codec::read_id(buf, sizes, Obj)?;
            let value = Value::decode(sizes, buf)?;
            EventDetail::FieldModification { thread, location, ref_type, field, object, value }
        }
        event_kinds::MONITOR_CONTENDED_ENTER => EventDetail::MonitorContendedEnter {
            thread: codec::read_id(buf, sizes, Obj)?,
            object: { let _t = codec::read_u8(buf)?; codec::read_id(buf, sizes, Obj)? },
            location: read_location(sizes, buf)?,
        },
        event_kinds::MONITOR_CONTENDED_ENTERED => EventDetail::MonitorContendedEntered {
            thread: codec::read_id(buf, sizes, Obj)?,
            object: { let _t = codec::read_u8(buf)?; codec::read_id(buf, sizes, Obj)? },
            location: read_location(sizes, buf)?,
        },
        event_kinds::MONITOR_WAIT => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let _t = codec::read_u8(buf)?;
            let object = codec::read_id(buf, sizes, Obj)?;
            let timeout = codec::read_i64(buf)?;
            EventDetail::MonitorWait { thread, object, timeout }
        }
        event_kinds::MONITOR_WAITED => {
            let thread = codec::read_id(buf, sizes, Obj)?;
            let _t = codec::read_u8(buf)?;
            let object = codec::read_id(buf, sizes, Obj)?;
            let location = read_location(sizes, buf)?;
            let timed_out = codec::read_bool(buf)?;
            EventDetail::MonitorWaited { thread, object, location, timed_out }
        }
        other => {
            warn!("unrecognized event kind: {}", other);
            EventDetail::Unknown { kind: other }
        }
    })
}

/// Bounded, non-blocking mailbox for a single event subscription.
///
/// When full, `push` drops the oldest queued event rather than blocking the
/// receive task — a slow or absent consumer must never stall delivery of
/// replies to other in-flight commands.
#[derive(Debug)]
pub struct EventMailbox {
    capacity: usize,
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
}

impl EventMailbox {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, queue: Mutex::new(VecDeque::with_capacity(capacity)), notify: Notify::new() }
    }

    pub fn push(&self, event: Event) {
        let mut queue = self.queue.lock().expect("event mailbox poisoned");
        if queue.len() >= self.capacity {
            if queue.pop_front().is_some() {
                warn!("event mailbox full, dropping oldest queued event");
            }
        }
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.queue.lock().expect("event mailbox poisoned").pop_front()
    }

    pub async fn recv(&self) -> Event {
        loop {
            if let Some(event) = self.try_recv() {
                return event;
            }
            self.notify.notified().await;
        }
    }
}

pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> IdSizes {
        IdSizes::ALL_EIGHT
    }

    #[test]
    fn parses_vm_start_and_death() {
        let mut data = Vec::new();
        data.push(2u8); // suspend policy ALL
        data.extend_from_slice(&2i32.to_be_bytes());
        data.push(event_kinds::VM_START);
        data.extend_from_slice(&1i32.to_be_bytes());
        data.extend_from_slice(&7u64.to_be_bytes());
        data.push(event_kinds::VM_DEATH);
        data.extend_from_slice(&2i32.to_be_bytes());

        let set = parse_composite_event(&sizes(), &data).unwrap();
        assert_eq!(set.suspend_policy, 2);
        assert_eq!(set.events.len(), 2);
        assert!(matches!(set.events[0].details, EventDetail::VmStart { thread: 7 }));
        assert!(matches!(set.events[1].details, EventDetail::VmDeath));
    }

    #[test]
    fn unknown_kind_falls_back() {
        let mut data = Vec::new();
        data.push(0u8);
        data.extend_from_slice(&1i32.to_be_bytes());
        data.push(200u8);
        data.extend_from_slice(&5i32.to_be_bytes());

        let set = parse_composite_event(&sizes(), &data).unwrap();
        assert!(matches!(set.events[0].details, EventDetail::Unknown { kind: 200 }));
    }

    #[tokio::test]
    async fn mailbox_drops_oldest_when_full() {
        let mailbox = EventMailbox::new(2);
        for i in 0..3u8 {
            mailbox.push(Event { kind: event_kinds::VM_START, request_id: i as i32, details: EventDetail::VmDeath });
        }
        let first = mailbox.recv().await;
        assert_eq!(first.request_id, 1);
        let second = mailbox.recv().await;
        assert_eq!(second.request_id, 2);
        assert!(mailbox.try_recv().is_none());
    }
}
