// JDWP error taxonomy
//
// Transport / Protocol / Codec / Timeout / Cancelled, per the protocol
// engine's error handling design.

use thiserror::Error;

pub type JdwpResult<T> = Result<T, JdwpError>;

#[derive(Debug, Error)]
pub enum JdwpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JDWP handshake response")]
    Handshake,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("JDWP error {}: {}", .code.0, .code.name())]
    Reply { code: JdwpErrorCode },

    #[error("command timed out waiting for reply")]
    Timeout,

    #[error("connection disconnected")]
    Disconnected,

    #[error("invalid type signature: {0}")]
    Signature(String),
}

/// Numeric JDWP reply error code, with a name lookup covering the full
/// error set defined by the protocol (not just the subset spec.md tabulates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JdwpErrorCode(pub u16);

impl JdwpErrorCode {
    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "NONE",
            10 => "INVALID_THREAD",
            11 => "INVALID_THREAD_GROUP",
            12 => "INVALID_PRIORITY",
            13 => "THREAD_NOT_SUSPENDED",
            14 => "THREAD_SUSPENDED",
            15 => "THREAD_NOT_ALIVE",
            20 => "INVALID_OBJECT",
            21 => "INVALID_CLASS",
            22 => "CLASS_NOT_PREPARED",
            23 => "INVALID_METHODID",
            24 => "INVALID_LOCATION",
            25 => "INVALID_FIELDID",
            30 => "INVALID_FRAMEID",
            31 => "NO_MORE_FRAMES",
            32 => "OPAQUE_FRAME",
            33 => "NOT_CURRENT_FRAME",
            34 => "TYPE_MISMATCH",
            35 => "INVALID_SLOT",
            40 => "DUPLICATE",
            41 => "NOT_FOUND",
            50 => "INVALID_MONITOR",
            51 => "NOT_MONITOR_OWNER",
            52 => "INTERRUPT",
            60 => "INVALID_CLASS_FORMAT",
            61 => "CIRCULAR_CLASS_DEFINITION",
            62 => "FAILS_VERIFICATION",
            63 => "ADD_METHOD_NOT_IMPLEMENTED",
            64 => "SCHEMA_CHANGE_NOT_IMPLEMENTED",
            65 => "INVALID_TYPESTATE",
            66 => "HIERARCHY_CHANGE_NOT_IMPLEMENTED",
            67 => "DELETE_METHOD_NOT_IMPLEMENTED",
            68 => "UNSUPPORTED_VERSION",
            69 => "NAMES_DONT_MATCH",
            70 => "CLASS_MODIFIERS_CHANGE_NOT_IMPLEMENTED",
            71 => "METHOD_MODIFIERS_CHANGE_NOT_IMPLEMENTED",
            99 => "NOT_IMPLEMENTED",
            100 => "NULL_POINTER",
            101 => "ABSENT_INFORMATION",
            102 => "INVALID_EVENT_TYPE",
            103 => "ILLEGAL_ARGUMENT",
            110 => "OUT_OF_MEMORY",
            111 => "ACCESS_DENIED",
            112 => "VM_DEAD",
            113 => "INTERNAL",
            115 => "UNATTACHED_THREAD",
            500 => "INVALID_TAG",
            502 => "ALREADY_INVOKING",
            503 => "INVALID_INDEX",
            504 => "INVALID_LENGTH",
            506 => "INVALID_STRING",
            507 => "INVALID_CLASS_LOADER",
            508 => "INVALID_ARRAY",
            509 => "TRANSPORT_LOAD",
            510 => "TRANSPORT_INIT",
            511 => "NATIVE_METHOD",
            512 => "INVALID_COUNT",
            _ => "UNKNOWN_ERROR",
        }
    }
}

impl JdwpError {
    pub fn from_reply_code(code: u16) -> Option<Self> {
        if code == 0 {
            None
        } else {
            Some(JdwpError::Reply {
                code: JdwpErrorCode(code),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_names() {
        assert_eq!(JdwpErrorCode(10).name(), "INVALID_THREAD");
        assert_eq!(JdwpErrorCode(112).name(), "VM_DEAD");
        assert_eq!(JdwpErrorCode(13).name(), "THREAD_NOT_SUSPENDED");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(JdwpErrorCode(9999).name(), "UNKNOWN_ERROR");
    }

    #[test]
    fn success_code_has_no_error() {
        assert!(JdwpError::from_reply_code(0).is_none());
        assert!(JdwpError::from_reply_code(10).is_some());
    }
}
