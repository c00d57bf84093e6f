// Receive task shared by every JdwpConnection.
//
// A single task owns the read half of the transport and is the only place
// that ever reads from the socket. Replies are routed to the caller that
// sent the matching request via a `oneshot` channel; inbound Event.Composite
// packets are decoded and fanned out to whichever event subscriptions are
// registered for each event's request id.

use crate::codec::IdSizes;
use crate::commands::{command_sets, event_reply_commands};
use crate::error::{JdwpError, JdwpResult};
use crate::events::{self, EventMailbox};
use crate::protocol::{self, Frame, ReplyPacket, HEADER_SIZE};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

pub(crate) struct Shared {
    pub(crate) writer: AsyncMutex<Box<dyn AsyncWrite + Unpin + Send>>,
    pub(crate) next_id: AtomicU32,
    pub(crate) pending: StdMutex<HashMap<u32, oneshot::Sender<JdwpResult<ReplyPacket>>>>,
    pub(crate) subscriptions: StdMutex<HashMap<i32, Arc<EventMailbox>>>,
    pub(crate) id_sizes: RwLock<IdSizes>,
}

impl Shared {
    pub(crate) fn new(writer: Box<dyn AsyncWrite + Unpin + Send>) -> Self {
        Self {
            writer: AsyncMutex::new(writer),
            next_id: AtomicU32::new(1),
            pending: StdMutex::new(HashMap::new()),
            subscriptions: StdMutex::new(HashMap::new()),
            id_sizes: RwLock::new(IdSizes::ALL_EIGHT),
        }
    }

    pub(crate) fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn id_sizes(&self) -> IdSizes {
        *self.id_sizes.read().expect("id_sizes lock poisoned")
    }

    pub(crate) fn set_id_sizes(&self, sizes: IdSizes) {
        *self.id_sizes.write().expect("id_sizes lock poisoned") = sizes;
    }

    pub(crate) fn register(&self, id: u32, tx: oneshot::Sender<JdwpResult<ReplyPacket>>) {
        self.pending.lock().expect("pending lock poisoned").insert(id, tx);
    }

    pub(crate) fn subscribe(&self, request_id: i32, capacity: usize) -> Arc<EventMailbox> {
        let mailbox = Arc::new(EventMailbox::new(capacity));
        self.subscriptions
            .lock()
            .expect("subscriptions lock poisoned")
            .insert(request_id, mailbox.clone());
        mailbox
    }

    pub(crate) fn unsubscribe(&self, request_id: i32) {
        self.subscriptions.lock().expect("subscriptions lock poisoned").remove(&request_id);
    }

    fn complete_reply(&self, id: u32, result: JdwpResult<ReplyPacket>) {
        if let Some(tx) = self.pending.lock().expect("pending lock poisoned").remove(&id) {
            let _ = tx.send(result);
        } else {
            warn!("received reply for unknown command id={} (may have timed out)", id);
        }
    }

    fn dispatch_event_set(&self, set: events::EventSet) {
        let subscriptions = self.subscriptions.lock().expect("subscriptions lock poisoned");
        for event in set.events {
            match subscriptions.get(&event.request_id) {
                Some(mailbox) => mailbox.push(event),
                None if event.request_id == 0 => {
                    // Automatically-generated events (VMStart, VMDeath) carry no
                    // request id of their own; broadcast to every subscriber.
                    for mailbox in subscriptions.values() {
                        mailbox.push(event.clone());
                    }
                }
                None => {
                    debug!(
                        "dropping event for unregistered request id={} (kind={})",
                        event.request_id, event.kind
                    );
                }
            }
        }
    }

    fn fail_all_pending(&self, err_factory: impl Fn() -> JdwpError) {
        let mut pending = self.pending.lock().expect("pending lock poisoned");
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(err_factory()));
        }
    }
}

/// Spawns the receive task and returns the shared state used to send
/// commands and register event subscriptions.
pub(crate) fn spawn<R>(reader: R, shared: Arc<Shared>) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(receive_loop(reader, shared))
}

async fn receive_loop<R>(mut reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    info!("JDWP receive loop started");

    loop {
        match read_frame(&mut reader, &shared.id_sizes()).await {
            Ok(Frame::Reply(reply)) => {
                debug!("received reply id={}", reply.id);
                shared.complete_reply(reply.id, Ok(reply));
            }
            Ok(Frame::Command(view)) => {
                debug!("received command packet set={} cmd={}", view.command_set, view.command);
                if view.command_set == command_sets::EVENT && view.command == event_reply_commands::COMPOSITE {
                    match events::parse_composite_event(&shared.id_sizes(), &view.data) {
                        Ok(set) => shared.dispatch_event_set(set),
                        Err(e) => warn!("failed to parse event composite: {}", e),
                    }
                } else {
                    warn!(
                        "ignoring unexpected server-originated command set={} cmd={}",
                        view.command_set, view.command
                    );
                }
            }
            Err(e) => {
                error!("JDWP receive loop ending: {}", e);
                shared.fail_all_pending(|| JdwpError::Disconnected);
                break;
            }
        }
    }

    info!("JDWP receive loop stopped");
}

async fn read_frame<R>(reader: &mut R, _sizes: &IdSizes) -> JdwpResult<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).await.map_err(JdwpError::Io)?;
    let (length, _is_reply) = protocol::peek_header(&header)?;

    let mut full = Vec::with_capacity(length as usize);
    full.extend_from_slice(&header);

    let remaining = length as usize - HEADER_SIZE;
    if remaining > 0 {
        let mut rest = vec![0u8; remaining];
        reader.read_exact(&mut rest).await.map_err(JdwpError::Io)?;
        full.extend_from_slice(&rest);
    }

    Frame::decode(&full)
}

pub(crate) async fn write_packet(
    shared: &Shared,
    encoded: &[u8],
) -> JdwpResult<()> {
    let mut writer = shared.writer.lock().await;
    writer.write_all(encoded).await.map_err(JdwpError::Io)?;
    writer.flush().await.map_err(JdwpError::Io)?;
    Ok(())
}
