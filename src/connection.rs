// JDWP connection management
//
// Owns the handshake, the IDSizes bootstrap, and the request/reply
// bookkeeping every command module sends through.

use crate::codec::IdSizes;
use crate::commands::{command_sets, vm_commands};
use crate::error::{JdwpError, JdwpResult};
use crate::events::{EventMailbox, DEFAULT_MAILBOX_CAPACITY};
use crate::eventloop::{self, Shared};
use crate::protocol::{CommandPacket, ReplyPacket, JDWP_HANDSHAKE};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Commands time out after this long if the connection doesn't specify its
/// own timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct JdwpConnection {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl JdwpConnection {
    /// Connects to a JVM listening for JDWP over TCP, performs the
    /// handshake, and negotiates id sizes.
    pub async fn connect(host: &str, port: u16) -> JdwpResult<Self> {
        info!("connecting to JDWP at {}:{}", host, port);
        let stream = TcpStream::connect((host, port)).await?;
        Self::open(stream, DEFAULT_TIMEOUT).await
    }

    /// Wraps an already-established duplex stream (a live TCP connection, or
    /// a scripted fake peer in tests) as a JDWP connection.
    pub async fn open<S>(mut stream: S, timeout: Duration) -> JdwpResult<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        handshake(&mut stream).await?;

        let (reader, writer) = tokio::io::split(stream);
        let shared = Arc::new(Shared::new(Box::new(writer)));
        eventloop::spawn(reader, shared.clone());

        let conn = JdwpConnection { shared, timeout };
        conn.bootstrap_id_sizes().await?;
        Ok(conn)
    }

    async fn bootstrap_id_sizes(&self) -> JdwpResult<()> {
        let packet = CommandPacket::new(self.shared.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::ID_SIZES);
        let reply = self.send_command(packet).await?;
        reply.check_error()?;

        let mut data = reply.data();
        let sizes = IdSizes {
            field_id_size: crate::codec::read_u32(&mut data)?,
            method_id_size: crate::codec::read_u32(&mut data)?,
            object_id_size: crate::codec::read_u32(&mut data)?,
            reference_type_id_size: crate::codec::read_u32(&mut data)?,
            frame_id_size: crate::codec::read_u32(&mut data)?,
        };
        debug!("negotiated id sizes: {:?}", sizes);
        self.shared.set_id_sizes(sizes);
        Ok(())
    }

    pub fn id_sizes(&self) -> IdSizes {
        self.shared.id_sizes()
    }

    pub fn next_id(&self) -> u32 {
        self.shared.next_id()
    }

    /// Sends a command and awaits its reply, subject to the connection's
    /// configured timeout.
    pub async fn send_command(&self, packet: CommandPacket) -> JdwpResult<ReplyPacket> {
        let id = packet.id;
        let (tx, rx) = oneshot::channel();
        self.shared.register(id, tx);

        let encoded = packet.encode();
        if let Err(e) = eventloop::write_packet(&self.shared, &encoded).await {
            // Registration is still in the pending map; nobody will complete
            // it now, so remove it ourselves before returning the error.
            self.shared.pending.lock().expect("pending lock poisoned").remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(JdwpError::Disconnected),
            Err(_) => {
                self.shared.pending.lock().expect("pending lock poisoned").remove(&id);
                Err(JdwpError::Timeout)
            }
        }
    }

    /// Registers a mailbox for events carrying the given EventRequest.Set
    /// request id. Call after a successful EventRequest.Set, before the
    /// first matching event could plausibly arrive.
    pub fn subscribe_events(&self, request_id: i32) -> Arc<EventMailbox> {
        self.shared.subscribe(request_id, DEFAULT_MAILBOX_CAPACITY)
    }

    /// Stops routing events for this request id; does not send
    /// EventRequest.Clear itself.
    pub fn unsubscribe_events(&self, request_id: i32) {
        self.shared.unsubscribe(request_id);
    }
}

async fn handshake<S>(stream: &mut S) -> JdwpResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!("performing JDWP handshake");
    stream.write_all(JDWP_HANDSHAKE).await?;
    stream.flush().await?;

    let mut buf = vec![0u8; JDWP_HANDSHAKE.len()];
    stream.read_exact(&mut buf).await?;

    if buf != JDWP_HANDSHAKE {
        warn!("invalid handshake response: {:?}", buf);
        return Err(JdwpError::Handshake);
    }

    info!("JDWP handshake successful");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HEADER_SIZE, REPLY_FLAG};

    #[tokio::test]
    async fn open_performs_handshake_and_bootstraps_id_sizes() {
        let (mut peer, client) = tokio::io::duplex(4096);

        let peer_task = tokio::spawn(async move {
            let mut hs = [0u8; 14];
            peer.read_exact(&mut hs).await.unwrap();
            assert_eq!(&hs, JDWP_HANDSHAKE);
            peer.write_all(JDWP_HANDSHAKE).await.unwrap();
            peer.flush().await.unwrap();

            let mut header = [0u8; HEADER_SIZE];
            peer.read_exact(&mut header).await.unwrap();
            let id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

            let mut reply = Vec::new();
            reply.extend_from_slice(&(HEADER_SIZE as u32 + 20).to_be_bytes());
            reply.extend_from_slice(&id.to_be_bytes());
            reply.push(REPLY_FLAG);
            reply.extend_from_slice(&0u16.to_be_bytes());
            for width in [8u32, 8, 8, 8, 8] {
                reply.extend_from_slice(&width.to_be_bytes());
            }
            peer.write_all(&reply).await.unwrap();
            peer.flush().await.unwrap();
            peer
        });

        let conn = JdwpConnection::open(client, Duration::from_secs(5)).await.unwrap();
        assert_eq!(conn.id_sizes(), IdSizes::ALL_EIGHT);
        peer_task.await.unwrap();
    }

    #[tokio::test]
    async fn send_command_times_out_without_reply() {
        let (peer, client) = tokio::io::duplex(4096);

        let peer_task = tokio::spawn(async move {
            let mut peer = peer;
            let mut hs = [0u8; 14];
            peer.read_exact(&mut hs).await.unwrap();
            peer.write_all(JDWP_HANDSHAKE).await.unwrap();
            peer.flush().await.unwrap();

            // Answer the IDSizes bootstrap, then go silent.
            let mut header = [0u8; HEADER_SIZE];
            peer.read_exact(&mut header).await.unwrap();
            let id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
            let mut reply = Vec::new();
            reply.extend_from_slice(&(HEADER_SIZE as u32 + 20).to_be_bytes());
            reply.extend_from_slice(&id.to_be_bytes());
            reply.push(REPLY_FLAG);
            reply.extend_from_slice(&0u16.to_be_bytes());
            for _ in 0..5 {
                reply.extend_from_slice(&8u32.to_be_bytes());
            }
            peer.write_all(&reply).await.unwrap();
            peer.flush().await.unwrap();

            // Drain without replying so the next command times out.
            let mut junk = vec![0u8; HEADER_SIZE];
            let _ = peer.read_exact(&mut junk).await;
            peer
        });

        let conn = JdwpConnection::open(client, Duration::from_millis(50)).await.unwrap();
        let packet = CommandPacket::new(conn.next_id(), command_sets::VIRTUAL_MACHINE, vm_commands::VERSION);
        let result = conn.send_command(packet).await;
        assert!(matches!(result, Err(JdwpError::Timeout)));
        peer_task.await.unwrap();
    }
}
