//! Record domain model shared by every entity kind (dishes, tasks, sessions).
//!
//! # Responsibility
//! - Define the canonical `Record` shape: system fields plus opaque payload.
//! - Define explicit `RecordPatch` merge semantics and `RecordSchema`
//!   validation/coercion applied at creation.
//!
//! # Invariants
//! - Every record carries a non-empty `RecordId` that is never rewritten.
//! - `createdAt` is set once; `updatedAt` is absent until the first update.
//! - System fields never live inside the payload map.

pub mod patch;
pub mod record;
pub mod schema;
