// JDWP type definitions
//
// Identifiers (object/thread/method/field/frame/reference-type ids) are
// carried as u64 for ergonomics; their actual wire width is negotiated per
// connection and handled by `crate::codec`, not by these aliases.

use serde::{Deserialize, Serialize};

pub type ObjectId = u64;
pub type ThreadId = ObjectId;
pub type ThreadGroupId = ObjectId;
pub type StringId = ObjectId;
pub type ClassLoaderId = ObjectId;
pub type ClassObjectId = ObjectId;
pub type ArrayId = ObjectId;

pub type ReferenceTypeId = u64;
pub type ClassId = ReferenceTypeId;
pub type InterfaceId = ReferenceTypeId;
pub type ArrayTypeId = ReferenceTypeId;

pub type MethodId = u64;
pub type FieldId = u64;
pub type FrameId = u64;

/// Identifies a code position: a reference type, a method within it, and a
/// bytecode index within that method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub type_tag: u8,
    pub class_id: ReferenceTypeId,
    pub method_id: MethodId,
    pub index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ThreadStatus {
    Zombie = 0,
    Running = 1,
    Sleeping = 2,
    Monitor = 3,
    Wait = 4,
}

impl ThreadStatus {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => ThreadStatus::Zombie,
            1 => ThreadStatus::Running,
            2 => ThreadStatus::Sleeping,
            3 => ThreadStatus::Monitor,
            4 => ThreadStatus::Wait,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum SuspendStatus {
    Running = 0,
    Suspended = 1,
}

/// ReferenceType tags, distinct from the value Tag universe in `crate::codec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeTag {
    Class = 1,
    Interface = 2,
    Array = 3,
}

impl TypeTag {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => TypeTag::Class,
            2 => TypeTag::Interface,
            3 => TypeTag::Array,
            _ => return None,
        })
    }
}

/// A local variable or method argument slot, as returned by
/// Method.VariableTable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub code_index: u64,
    pub name: String,
    pub signature: String,
    pub length: u32,
    pub slot: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInfo {
    pub frame_id: FrameId,
    pub location: Location,
}

/// Bit flags for a class's status, as returned alongside its ReferenceTypeId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStatus(pub i32);

impl ClassStatus {
    pub const VERIFIED: i32 = 1;
    pub const PREPARED: i32 = 2;
    pub const INITIALIZED: i32 = 4;
    pub const ERROR: i32 = 8;

    pub fn is_verified(self) -> bool {
        self.0 & Self::VERIFIED != 0
    }
    pub fn is_prepared(self) -> bool {
        self.0 & Self::PREPARED != 0
    }
    pub fn is_initialized(self) -> bool {
        self.0 & Self::INITIALIZED != 0
    }
    pub fn is_error(self) -> bool {
        self.0 & Self::ERROR != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_status_bits() {
        let status = ClassStatus(ClassStatus::PREPARED | ClassStatus::INITIALIZED);
        assert!(status.is_prepared());
        assert!(status.is_initialized());
        assert!(!status.is_verified());
    }

    #[test]
    fn thread_status_round_trips() {
        assert_eq!(ThreadStatus::from_i32(2), Some(ThreadStatus::Sleeping));
        assert_eq!(ThreadStatus::from_i32(99), None);
    }
}
