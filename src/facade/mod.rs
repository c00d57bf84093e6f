// High-level debugger facade.
//
// Wraps the raw command modules with the bookkeeping a debugger frontend
// actually wants: a scope that undoes its own DisableCollection pins on the
// way out, a type-handle cache keyed by signature so repeated lookups don't
// re-hit the wire, and argument resolution that falls back to positional
// slot counting when a variable table lacks debug names.

pub mod signature;

use crate::codec::{IdSizes, Tag, Value, ValueData};
use crate::connection::JdwpConnection;
use crate::error::{JdwpError, JdwpResult};
use crate::types::{ObjectId, ReferenceTypeId, ThreadId};
use signature::SignatureKind;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

/// A resolved JDWP type: either a primitive/void with no reference type id,
/// or a class/interface/array backed by one.
#[derive(Debug, Clone)]
pub enum TypeHandle {
    Simple(SignatureKind),
    Class {
        ref_type_id: ReferenceTypeId,
        signature: String,
        super_type: Option<Box<TypeHandle>>,
        implements: Vec<TypeHandle>,
    },
    Array { ref_type_id: ReferenceTypeId, signature: String, element: Box<TypeHandle> },
}

impl TypeHandle {
    pub fn signature(&self) -> String {
        match self {
            TypeHandle::Simple(kind) => simple_signature(kind),
            TypeHandle::Class { signature, .. } => signature.clone(),
            TypeHandle::Array { signature, .. } => signature.clone(),
        }
    }

    pub fn ref_type_id(&self) -> Option<ReferenceTypeId> {
        match self {
            TypeHandle::Simple(_) => None,
            TypeHandle::Class { ref_type_id, .. } => Some(*ref_type_id),
            TypeHandle::Array { ref_type_id, .. } => Some(*ref_type_id),
        }
    }
}

fn simple_signature(kind: &SignatureKind) -> String {
    match kind {
        SignatureKind::Boolean => "Z",
        SignatureKind::Byte => "B",
        SignatureKind::Char => "C",
        SignatureKind::Short => "S",
        SignatureKind::Int => "I",
        SignatureKind::Long => "J",
        SignatureKind::Float => "F",
        SignatureKind::Double => "D",
        SignatureKind::Void => "V",
        _ => unreachable!("simple_signature called on non-primitive kind"),
    }
    .to_string()
}

#[derive(Default)]
struct TypeCache {
    by_signature: HashMap<String, TypeHandle>,
    id_to_signature: HashMap<ReferenceTypeId, String>,
}

/// A debugging session scoped to one thread, with its own type cache and
/// GC-disable bookkeeping. Construct via `DebuggerScope::enter`.
pub struct DebuggerScope<'a> {
    conn: &'a JdwpConnection,
    thread: ThreadId,
    cache: Mutex<TypeCache>,
    pinned: Mutex<Vec<ObjectId>>,
}

impl<'a> DebuggerScope<'a> {
    /// Runs `f` with a fresh scope, priming the cache with the primitive and
    /// common boxed types, then re-enables collection on every object this
    /// scope pinned via `pin`, in the order pinned, regardless of how `f`
    /// returns.
    pub async fn enter<F, Fut, T>(conn: &'a JdwpConnection, thread: ThreadId, f: F) -> JdwpResult<T>
    where
        F: FnOnce(&DebuggerScope<'a>) -> Fut,
        Fut: Future<Output = JdwpResult<T>>,
    {
        let scope = DebuggerScope {
            conn,
            thread,
            cache: Mutex::new(TypeCache::default()),
            pinned: Mutex::new(Vec::new()),
        };
        scope.prime_primitives();

        let result = f(&scope).await;

        let pinned = std::mem::take(&mut *scope.pinned.lock().expect("pinned lock poisoned"));
        for object_id in pinned {
            // Best-effort: a VM that already died or detached makes this a
            // no-op either way, and we must not let cleanup mask `result`.
            let _ = conn.enable_collection(object_id).await;
        }

        result
    }

    fn prime_primitives(&self) {
        let mut cache = self.cache.lock().expect("cache lock poisoned");
        for kind in [
            SignatureKind::Boolean,
            SignatureKind::Byte,
            SignatureKind::Char,
            SignatureKind::Short,
            SignatureKind::Int,
            SignatureKind::Long,
            SignatureKind::Float,
            SignatureKind::Double,
            SignatureKind::Void,
        ] {
            let sig = simple_signature(&kind);
            cache.by_signature.insert(sig, TypeHandle::Simple(kind));
        }
    }

    /// Pins `object_id` against garbage collection for the remainder of the
    /// scope; the pin is released automatically when the scope ends.
    pub async fn pin(&self, object_id: ObjectId) -> JdwpResult<()> {
        self.conn.disable_collection(object_id).await?;
        self.pinned.lock().expect("pinned lock poisoned").push(object_id);
        Ok(())
    }

    /// Resolves a signature string to a `TypeHandle`, consulting the cache
    /// before issuing ClassesBySignature.
    pub async fn resolve_type(&self, sig: &str) -> JdwpResult<TypeHandle> {
        if let Some(handle) = self.cache.lock().expect("cache lock poisoned").by_signature.get(sig) {
            return Ok(handle.clone());
        }

        let parsed = SignatureKind::parse(sig)?;
        let handle = match parsed {
            SignatureKind::Array(element) => {
                let element_handle = Box::pin(self.resolve_type(&simple_or_signature(&element))).await?;
                let classes = self.conn.classes_by_signature(sig).await?;
                let class = classes
                    .into_iter()
                    .next()
                    .ok_or_else(|| JdwpError::Signature(format!("no array class for {sig}")))?;
                TypeHandle::Array { ref_type_id: class.type_id, signature: sig.to_string(), element: Box::new(element_handle) }
            }
            SignatureKind::Class(_) => {
                let classes = self.conn.classes_by_signature(sig).await?;
                let class = classes
                    .into_iter()
                    .next()
                    .ok_or_else(|| JdwpError::Signature(format!("class not loaded: {sig}")))?;

                let super_type = match self.conn.get_superclass(class.type_id).await? {
                    0 => None,
                    super_id => {
                        let super_sig = self.signature_of(super_id).await?;
                        Some(Box::new(Box::pin(self.resolve_type(&super_sig)).await?))
                    }
                };

                let mut implements = Vec::new();
                for interface_id in self.conn.get_interfaces(class.type_id).await? {
                    let interface_sig = self.signature_of(interface_id).await?;
                    implements.push(Box::pin(self.resolve_type(&interface_sig)).await?);
                }

                TypeHandle::Class { ref_type_id: class.type_id, signature: sig.to_string(), super_type, implements }
            }
            simple => TypeHandle::Simple(simple),
        };

        let mut cache = self.cache.lock().expect("cache lock poisoned");
        cache.by_signature.insert(sig.to_string(), handle.clone());
        if let Some(ref_type_id) = handle.ref_type_id() {
            cache.id_to_signature.insert(ref_type_id, sig.to_string());
        }
        Ok(handle)
    }

    /// Resolves a dotted or slashed Java class name, e.g. `java.lang.String`.
    pub async fn resolve_class(&self, name: &str) -> JdwpResult<TypeHandle> {
        self.resolve_type(&SignatureKind::class_signature(name)).await
    }

    /// Reverse lookup from a reference type id back to its signature,
    /// fetching ReferenceType.Signature on first use and caching the result.
    pub async fn signature_of(&self, ref_type_id: ReferenceTypeId) -> JdwpResult<String> {
        if let Some(sig) = self.cache.lock().expect("cache lock poisoned").id_to_signature.get(&ref_type_id) {
            return Ok(sig.clone());
        }
        let sig = self.conn.get_signature(ref_type_id).await?;
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .id_to_signature
            .insert(ref_type_id, sig.clone());
        Ok(sig)
    }

    /// The receiver of the top frame's method (StackFrame.ThisObject), or
    /// `None` in a static method.
    pub async fn this_object(&self) -> JdwpResult<Option<ObjectId>> {
        let frames = self.conn.get_frames(self.thread, 0, 1).await?;
        let frame = frames.first().ok_or_else(|| JdwpError::Protocol("no frames on thread".into()))?;
        let this_id = self.conn.get_this_object(self.thread, frame.frame_id).await?;
        Ok(if this_id == 0 { None } else { Some(this_id) })
    }

    /// Resolves an argument by name first, falling back to counting
    /// positional argument slots after the implicit `this` slot (or from
    /// slot 0 for static methods) when the variable table has no matching
    /// name — debug info is frequently stripped from release builds.
    pub async fn find_argument(
        &self,
        ref_type_id: ReferenceTypeId,
        method_id: crate::types::MethodId,
        name: Option<&str>,
        positional_index: usize,
    ) -> JdwpResult<crate::types::Variable> {
        let variables = self.conn.get_variable_table(ref_type_id, method_id).await?;

        if let Some(name) = name {
            if let Some(found) = variables.iter().find(|v| v.name == name) {
                return Ok(found.clone());
            }
        }

        let this_slot = variables.iter().find(|v| v.name == "this").map(|v| v.slot);
        let target_slot = match this_slot {
            Some(slot) => slot + 1 + positional_index as u32,
            None => positional_index as u32,
        };

        variables
            .into_iter()
            .find(|v| v.slot == target_slot)
            .ok_or_else(|| JdwpError::Protocol(format!("no argument at slot {target_slot}")))
    }

    pub fn id_sizes(&self) -> IdSizes {
        self.conn.id_sizes()
    }

    /// Wraps a Rust string as a new java.lang.String instance.
    pub async fn new_string(&self, s: &str) -> JdwpResult<ObjectId> {
        self.conn.create_string(s).await
    }
}

fn simple_or_signature(kind: &SignatureKind) -> String {
    match kind {
        SignatureKind::Class(name) => format!("L{name};"),
        SignatureKind::Array(inner) => format!("[{}", simple_or_signature(inner)),
        other => simple_signature(other),
    }
}

/// Converts a decoded `Value` into a human-displayable Rust value,
/// resolving object tags to their string contents when the tag indicates a
/// string, otherwise leaving a bare object id.
pub async fn unmarshal(conn: &JdwpConnection, value: &Value) -> JdwpResult<Unmarshaled> {
    Ok(match Tag::try_from(value.tag)? {
        Tag::String => match &value.data {
            ValueData::Object(id) if *id != 0 => Unmarshaled::Str(conn.get_string_value(*id).await?),
            _ => Unmarshaled::Null,
        },
        _ => Unmarshaled::Value(value.clone()),
    })
}

#[derive(Debug, Clone)]
pub enum Unmarshaled {
    Value(Value),
    Str(String),
    Null,
}

/// Converts a scalar Rust value into a tagged JDWP `Value` for argument
/// slots and field writes whose static type is already known.
pub fn marshal_bool(b: bool) -> Value {
    Value { tag: Tag::Boolean.as_u8(), data: ValueData::Boolean(b) }
}
pub fn marshal_int(i: i32) -> Value {
    Value { tag: Tag::Int.as_u8(), data: ValueData::Int(i) }
}
pub fn marshal_long(i: i64) -> Value {
    Value { tag: Tag::Long.as_u8(), data: ValueData::Long(i) }
}
pub fn marshal_double(d: f64) -> Value {
    Value { tag: Tag::Double.as_u8(), data: ValueData::Double(d) }
}
pub fn marshal_object(id: ObjectId) -> Value {
    Value { tag: Tag::Object.as_u8(), data: ValueData::Object(id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marshal_helpers_tag_correctly() {
        assert_eq!(marshal_bool(true).tag, Tag::Boolean.as_u8());
        assert_eq!(marshal_int(5).tag, Tag::Int.as_u8());
        assert_eq!(marshal_object(9).tag, Tag::Object.as_u8());
    }

    #[test]
    fn type_handle_signature_round_trips() {
        let handle = TypeHandle::Class {
            ref_type_id: 1,
            signature: "Ljava/lang/String;".into(),
            super_type: None,
            implements: Vec::new(),
        };
        assert_eq!(handle.signature(), "Ljava/lang/String;");
        assert_eq!(handle.ref_type_id(), Some(1));
    }
}
