// JDWP packet framing
//
// Reference: https://docs.oracle.com/javase/8/docs/platform/jpda/jdwp/jdwp-protocol.html
//
// Packet structure:
// length (4 bytes, includes header) | id (4 bytes) | flags (1 byte)
// [command packet: command set (1 byte) + command (1 byte)]
// [reply packet: error code (2 bytes)]
// data (variable)

use crate::error::{JdwpError, JdwpResult};
use bytes::{Buf, BufMut, BytesMut};

pub const JDWP_HANDSHAKE: &[u8] = b"JDWP-Handshake";
pub const HEADER_SIZE: usize = 11;
pub const REPLY_FLAG: u8 = 0x80;

/// Upper bound on a packet's declared length, guarding against a malicious
/// or buggy peer driving unbounded allocation.
pub const MAX_PACKET_SIZE: u32 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CommandPacket {
    pub id: u32,
    pub command_set: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

impl CommandPacket {
    pub fn new(id: u32, command_set: u8, command: u8) -> Self {
        Self {
            id,
            command_set,
            command,
            data: Vec::new(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let length = HEADER_SIZE + self.data.len();
        let mut buf = BytesMut::with_capacity(length);

        buf.put_u32(length as u32);
        buf.put_u32(self.id);
        buf.put_u8(0x00);
        buf.put_u8(self.command_set);
        buf.put_u8(self.command);
        buf.put_slice(&self.data);

        buf.to_vec()
    }
}

#[derive(Debug, Clone)]
pub struct ReplyPacket {
    pub id: u32,
    pub error_code: u16,
    pub data: Vec<u8>,
}

impl ReplyPacket {
    /// `buf` must contain the full packet, header included.
    pub fn decode(mut buf: &[u8]) -> JdwpResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(JdwpError::Protocol("reply packet shorter than header".into()));
        }

        let _length = buf.get_u32();
        let id = buf.get_u32();
        let flags = buf.get_u8();

        if flags != REPLY_FLAG {
            return Err(JdwpError::Protocol(format!("expected reply flag, got {flags:#x}")));
        }

        let error_code = buf.get_u16();
        let data = buf.to_vec();

        Ok(Self { id, error_code, data })
    }

    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }

    pub fn check_error(&self) -> JdwpResult<()> {
        match JdwpError::from_reply_code(self.error_code) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A decoded server-originated command packet (as observed on the receive
/// side — in practice only `Event.Composite` is ever sent this direction).
#[derive(Debug, Clone)]
pub struct CommandView {
    pub id: u32,
    pub command_set: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

/// Either half of a packet the receive task can observe.
#[derive(Debug, Clone)]
pub enum Frame {
    Reply(ReplyPacket),
    Command(CommandView),
}

impl Frame {
    /// `buf` must contain the full packet, header included.
    pub fn decode(mut buf: &[u8]) -> JdwpResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(JdwpError::Protocol("packet shorter than header".into()));
        }
        let full = buf;
        let _length = buf.get_u32();
        let id = buf.get_u32();
        let flags = buf.get_u8();

        if flags & REPLY_FLAG != 0 {
            Ok(Frame::Reply(ReplyPacket::decode(full)?))
        } else {
            let command_set = buf.get_u8();
            let command = buf.get_u8();
            Ok(Frame::Command(CommandView {
                id,
                command_set,
                command,
                data: buf.to_vec(),
            }))
        }
    }
}

/// Parses the 11-byte header of a frame already read off the wire, returning
/// the declared total length (header included) and whether the reply flag
/// is set. Used by the receive loop to know how many more bytes to read.
pub fn peek_header(header: &[u8; HEADER_SIZE]) -> JdwpResult<(u32, bool)> {
    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let flags = header[8];
    if (length as usize) < HEADER_SIZE {
        return Err(JdwpError::Protocol(format!("invalid packet length: {length}")));
    }
    if length > MAX_PACKET_SIZE {
        return Err(JdwpError::Protocol(format!(
            "packet too large: {length} bytes (max {MAX_PACKET_SIZE})"
        )));
    }
    Ok((length, flags & REPLY_FLAG != 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_packet_big_endian() {
        let packet = CommandPacket::new(0x1234_5678, 3, 9);
        let encoded = packet.encode();
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(&encoded[4..8], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(encoded[8], 0x00);
        assert_eq!(encoded[9], 3);
        assert_eq!(encoded[10], 9);
    }

    #[test]
    fn reply_packet_decodes() {
        let mut data = vec![0u8; 11];
        data[0..4].copy_from_slice(&11u32.to_be_bytes());
        data[4..8].copy_from_slice(&1u32.to_be_bytes());
        data[8] = REPLY_FLAG;
        let packet = ReplyPacket::decode(&data).unwrap();
        assert_eq!(packet.id, 1);
        assert_eq!(packet.error_code, 0);
        assert!(!packet.is_error());
    }

    #[test]
    fn reply_packet_rejects_command_flag() {
        let mut data = vec![0u8; 11];
        data[8] = 0x00;
        assert!(ReplyPacket::decode(&data).is_err());
    }

    #[test]
    fn frame_discriminates_by_flag() {
        let mut reply = vec![0u8; 11];
        reply[0..4].copy_from_slice(&11u32.to_be_bytes());
        reply[8] = REPLY_FLAG;
        assert!(matches!(Frame::decode(&reply).unwrap(), Frame::Reply(_)));

        let mut cmd = vec![0u8; 11];
        cmd[0..4].copy_from_slice(&11u32.to_be_bytes());
        cmd[8] = 0x00;
        cmd[9] = 64;
        cmd[10] = 100;
        match Frame::decode(&cmd).unwrap() {
            Frame::Command(c) => {
                assert_eq!(c.command_set, 64);
                assert_eq!(c.command, 100);
            }
            _ => panic!("expected command frame"),
        }
    }

    #[test]
    fn peek_header_rejects_oversized_packet() {
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&(MAX_PACKET_SIZE + 1).to_be_bytes());
        assert!(peek_header(&header).is_err());
    }

    #[test]
    fn peek_header_rejects_undersized_length() {
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&3u32.to_be_bytes());
        assert!(peek_header(&header).is_err());
    }
}
