//! Core primitives.
//!
//! Plain value types and state hashing shared by every simulation module.

pub mod vec2;
pub mod rect;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rect::Aabb;
pub use hash::{compute_state_hash, StateHash, StateHasher};
