// id.rs — Identifiers for declarations and remote dispatch
//
// Two families live here. Arena ids (`DeclId`, `MethodRef`) index the
// declaration table of one round and never leave the process. Wire ids
// (`InterfaceId`, `MethodId`) cross process boundaries: they are a pure
// function of the declaration text under the `orbit-id-v1` hash, so a proxy
// and a dispatcher compiled independently from the same interface agree.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Name and version of the identifier hash. Part of the wire contract.
pub const ID_HASH_ALGORITHM: &str = "orbit-id-v1";

/// Arena index of a type declaration in a `DeclTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Arena index of a method declaration in a `DeclTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef(pub u32);

/// Wire identifier of an actor or observer interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InterfaceId(pub i32);

/// Wire identifier of a remote method signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MethodId(pub i32);

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `orbit-id-v1`: SHA-256 over the UTF-8 bytes, first four digest bytes
/// read big-endian as `i32`.
pub fn stable_hash(text: &str) -> i32 {
    let digest = Sha256::digest(text.as_bytes());
    i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Identifier of the interface with the given fully-qualified name.
pub fn interface_id(qualified_name: &str) -> InterfaceId {
    InterfaceId(stable_hash(qualified_name))
}

/// Identifier of a canonical method signature `name(T1,T2,...)`.
pub fn method_id(signature: &str) -> MethodId {
    MethodId(stable_hash(signature))
}

/// Canonical signature string hashed into a `MethodId`.
pub fn signature<'a>(name: &str, param_types: impl IntoIterator<Item = &'a str>) -> String {
    let params: Vec<&str> = param_types.into_iter().collect();
    format!("{}({})", name, params.join(","))
}
