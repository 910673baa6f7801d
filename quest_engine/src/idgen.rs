//! ** idgen module **
//! Namespaces and helpers for generating stable v5 uuids for entities loaded from a `WorldDef`.
//! Entities created at runtime use v4 (random) UUIDs instead.
use uuid::Uuid;

use crate::Id;

pub const NAMESPACE_ZONE: Uuid = uuid::uuid!("5b1f0c9e-3f7a-4a53-9d8e-2c61a7f4b0d1");

pub const NAMESPACE_LEVEL: Uuid = uuid::uuid!("c2a8e6d4-71b9-4f0e-8a3c-95d7e1b2f6a0");

pub const NAMESPACE_ACTOR: Uuid = uuid::uuid!("8e47d1a2-0b6c-4c95-b3f8-1a9e5d7c2f64");

pub const NAMESPACE_ITEM: Uuid = uuid::uuid!("f3d9b7a1-6e2c-48d0-9a5b-c7e1f8a24d39");

/// Generate a v5 UUID for a given token id from the world definition.
///
/// Uses the namespaces above to separate zones / levels / actors / items.
pub fn uuid_from_token(namespace: &Uuid, token: &str) -> Id {
    Uuid::new_v5(namespace, token.as_bytes())
}

/// Fresh random id for an entity created at runtime.
pub fn new_id() -> Id {
    Uuid::new_v4()
}
