// End-to-end scenarios against a scripted fake peer, driven over
// `tokio::io::duplex` rather than a live JVM.

use jdwp_engine::{JdwpConnection, JdwpError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

const HEADER_SIZE: usize = 11;
const REPLY_FLAG: u8 = 0x80;
const JDWP_HANDSHAKE: &[u8] = b"JDWP-Handshake";

async fn perform_handshake(peer: &mut DuplexStream) {
    let mut hs = [0u8; 14];
    peer.read_exact(&mut hs).await.unwrap();
    assert_eq!(&hs, JDWP_HANDSHAKE);
    peer.write_all(JDWP_HANDSHAKE).await.unwrap();
    peer.flush().await.unwrap();
}

async fn read_command_header(peer: &mut DuplexStream) -> (u32, u8, u8) {
    let mut header = [0u8; HEADER_SIZE];
    peer.read_exact(&mut header).await.unwrap();
    let id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    (id, header[9], header[10])
}

async fn read_command(peer: &mut DuplexStream) -> (u32, u8, u8, Vec<u8>) {
    let mut header = [0u8; HEADER_SIZE];
    peer.read_exact(&mut header).await.unwrap();
    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    let mut payload = vec![0u8; length - HEADER_SIZE];
    peer.read_exact(&mut payload).await.unwrap();
    (id, header[9], header[10], payload)
}

async fn reply(peer: &mut DuplexStream, id: u32, error: u16, data: &[u8]) {
    let mut out = Vec::new();
    out.extend_from_slice(&((HEADER_SIZE + data.len()) as u32).to_be_bytes());
    out.extend_from_slice(&id.to_be_bytes());
    out.push(REPLY_FLAG);
    out.extend_from_slice(&error.to_be_bytes());
    out.extend_from_slice(data);
    peer.write_all(&out).await.unwrap();
    peer.flush().await.unwrap();
}

/// Handles the VirtualMachine.IDSizes bootstrap every `JdwpConnection::open`
/// issues immediately after the handshake, answering with all-8-byte widths.
async fn answer_id_sizes_bootstrap(peer: &mut DuplexStream) {
    let (id, _set, _cmd) = read_command_header(peer).await;
    let mut data = Vec::new();
    for _ in 0..5 {
        data.extend_from_slice(&8u32.to_be_bytes());
    }
    reply(peer, id, 0, &data).await;
}

async fn connect_with_fake_peer() -> (JdwpConnection, DuplexStream) {
    let (mut peer, client) = tokio::io::duplex(8192);
    perform_handshake(&mut peer).await;

    let peer_handle = tokio::spawn(async move {
        answer_id_sizes_bootstrap(&mut peer).await;
        peer
    });

    let conn = JdwpConnection::open(client, Duration::from_secs(5)).await.unwrap();
    let peer = peer_handle.await.unwrap();
    (conn, peer)
}

#[tokio::test]
async fn interleaved_replies_route_to_the_right_caller() {
    let (conn, mut peer) = connect_with_fake_peer().await;

    let peer_task = tokio::spawn(async move {
        let (id_a, _, _, _) = read_command(&mut peer).await;
        let (id_b, _, _, _) = read_command(&mut peer).await;
        let (id_c, _, _, _) = read_command(&mut peer).await;

        // Reply out of order: B, C, A.
        reply(&mut peer, id_b, 0, &2i32.to_be_bytes()).await;
        reply(&mut peer, id_c, 0, &3i32.to_be_bytes()).await;
        reply(&mut peer, id_a, 0, &1i32.to_be_bytes()).await;
    });

    let a = conn.get_frame_count(0xA);
    let b = conn.get_frame_count(0xB);
    let c = conn.get_frame_count(0xC);
    let (ra, rb, rc) = tokio::join!(a, b, c);
    assert_eq!(ra.unwrap(), 1);
    assert_eq!(rb.unwrap(), 2);
    assert_eq!(rc.unwrap(), 3);

    peer_task.await.unwrap();
}

#[tokio::test]
async fn create_string_then_read_it_back() {
    let (conn, mut peer) = connect_with_fake_peer().await;

    let peer_task = tokio::spawn(async move {
        let (id, _set, _cmd, payload) = read_command(&mut peer).await;
        let len = u32::from_be_bytes(payload[0..4].try_into().unwrap()) as usize;
        let text = String::from_utf8(payload[4..4 + len].to_vec()).unwrap();
        assert_eq!(text, "Hello, 世界");
        reply(&mut peer, id, 0, &42u64.to_be_bytes()).await;

        let (id, _set, _cmd, payload) = read_command(&mut peer).await;
        assert_eq!(u64::from_be_bytes(payload[0..8].try_into().unwrap()), 42);
        let mut data = Vec::new();
        let s = "Hello, 世界";
        data.extend_from_slice(&(s.len() as u32).to_be_bytes());
        data.extend_from_slice(s.as_bytes());
        reply(&mut peer, id, 0, &data).await;
        peer
    });

    let string_id = conn.create_string("Hello, 世界").await.unwrap();
    assert_ne!(string_id, 0);
    let value = conn.get_string_value(string_id).await.unwrap();
    assert_eq!(value, "Hello, 世界");

    peer_task.await.unwrap();
}

#[tokio::test]
async fn suspend_count_bookkeeping_round_trips() {
    let (conn, mut peer) = connect_with_fake_peer().await;
    let thread_id = 0x100u64;

    let peer_task = tokio::spawn(async move {
        // GetSuspendCount -> 0
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &0i32.to_be_bytes()).await;

        // Suspend
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &[]).await;

        // GetSuspendCount -> 1
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &1i32.to_be_bytes()).await;

        // Resume
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &[]).await;

        // GetSuspendCount -> 0
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &0i32.to_be_bytes()).await;
        peer
    });

    let before = conn.suspend_count(thread_id).await.unwrap();
    assert_eq!(before, 0);
    conn.suspend_thread(thread_id).await.unwrap();
    let during = conn.suspend_count(thread_id).await.unwrap();
    assert_eq!(during, before + 1);
    conn.resume_thread(thread_id).await.unwrap();
    let after = conn.suspend_count(thread_id).await.unwrap();
    assert_eq!(after, before);

    peer_task.await.unwrap();
}

#[tokio::test]
async fn event_routing_keeps_subscriptions_independent() {
    let (conn, mut peer) = connect_with_fake_peer().await;

    let peer_task = tokio::spawn(async move {
        // EventRequest.Set for r1
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &1i32.to_be_bytes()).await;
        // EventRequest.Set for r2
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &2i32.to_be_bytes()).await;

        // Composite event: two Breakpoint events tagged to r1.
        let mut data = Vec::new();
        data.push(2u8); // suspend policy ALL
        data.extend_from_slice(&2i32.to_be_bytes());
        for _ in 0..2 {
            data.push(jdwp_engine::commands::event_kinds::BREAKPOINT);
            data.extend_from_slice(&1i32.to_be_bytes()); // request id r1
            data.extend_from_slice(&0xAAu64.to_be_bytes()); // thread
            data.push(1u8); // location type tag
            data.extend_from_slice(&0xBBu64.to_be_bytes()); // class id
            data.extend_from_slice(&0xCCu64.to_be_bytes()); // method id
            data.extend_from_slice(&0u64.to_be_bytes()); // index
        }
        let mut packet = Vec::new();
        packet.extend_from_slice(&((HEADER_SIZE + data.len()) as u32).to_be_bytes());
        packet.extend_from_slice(&0u32.to_be_bytes());
        packet.push(0x00);
        packet.push(64); // Event command set
        packet.push(100); // Composite command
        packet.extend_from_slice(&data);
        peer.write_all(&packet).await.unwrap();
        peer.flush().await.unwrap();

        // EventRequest.Clear for r1
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 0, &[]).await;
        peer
    });

    use jdwp_engine::SuspendPolicy;
    let r1 = conn
        .set_breakpoint(0xBB, 0xCC, 0, SuspendPolicy::All)
        .await
        .unwrap();
    let r2 = conn
        .set_event_request(jdwp_engine::commands::event_kinds::BREAKPOINT, SuspendPolicy::All, &[])
        .await
        .unwrap();
    let mailbox1 = conn.subscribe_events(r1);
    let mailbox2 = conn.subscribe_events(r2);

    let first = mailbox1.recv().await;
    let second = mailbox1.recv().await;
    assert_eq!(first.request_id, r1);
    assert_eq!(second.request_id, r1);

    conn.clear_breakpoint(r1).await.unwrap();
    assert!(mailbox2.try_recv().is_none());

    peer_task.await.unwrap();
}

#[tokio::test]
async fn protocol_error_surfaces_and_connection_stays_usable() {
    let (conn, mut peer) = connect_with_fake_peer().await;
    let thread_id = 0x200u64;

    let peer_task = tokio::spawn(async move {
        // ThreadReference.Frames against a non-suspended thread.
        let (id, _, _, _) = read_command(&mut peer).await;
        reply(&mut peer, id, 13, &[]).await; // THREAD_NOT_SUSPENDED

        // A subsequent, unrelated command still succeeds.
        let (id, _, _, _) = read_command(&mut peer).await;
        let mut version_body = Vec::new();
        version_body.extend_from_slice(&(11u32).to_be_bytes());
        version_body.extend_from_slice(b"debug build");
        version_body.extend_from_slice(&1i32.to_be_bytes());
        version_body.extend_from_slice(&8i32.to_be_bytes());
        version_body.extend_from_slice(&(5u32).to_be_bytes());
        version_body.extend_from_slice(b"1.8.0");
        version_body.extend_from_slice(&(9u32).to_be_bytes());
        version_body.extend_from_slice(b"OpenJDK 8");
        reply(&mut peer, id, 0, &version_body).await;
        peer
    });

    let result = conn.get_frames(thread_id, 0, -1).await;
    match result {
        Err(JdwpError::Reply { code }) => assert_eq!(code.0, 13),
        other => panic!("expected THREAD_NOT_SUSPENDED, got {other:?}"),
    }

    let version = conn.get_version().await.unwrap();
    assert_eq!(version.vm_name, "OpenJDK 8");

    peer_task.await.unwrap();
}
