//! # Brawl Simulation Core
//!
//! Real-time combat core for a two-player platform fighter: fighter state
//! machine, attack tables, platform physics, damage and knockback, stage
//! hooks and the match loop, plus transcript recording and replay checks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BRAWL SIMULATION                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                 │
//! │  ├── vec2.rs     - 2D vector                                │
//! │  ├── rect.rs     - Axis-aligned boxes                       │
//! │  └── hash.rs     - State hashing for verification           │
//! │                                                             │
//! │  game/           - Game logic (deterministic)               │
//! │  ├── input.rs    - Buttons, edges, input recording          │
//! │  ├── moves.rs    - Attack table and timing windows          │
//! │  ├── roster.rs   - Character profiles                       │
//! │  ├── fighter.rs  - Fighter state machine                    │
//! │  ├── stage.rs    - Platforms, hazards, physics hooks        │
//! │  ├── physics.rs  - Forces and integration                   │
//! │  ├── collision.rs- Platform and hitbox overlap              │
//! │  ├── combat.rs   - Damage, knockback, grabs                 │
//! │  ├── state.rs    - Match state                              │
//! │  └── tick.rs     - Authoritative simulation loop            │
//! │                                                             │
//! │  replay/         - Snapshots, transcripts, verification     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same config, roster and sequence of `(inputs, dt)` pairs the
//! simulation produces identical state hashes:
//! - No HashMap (BTreeMap for sorted iteration)
//! - No system time or randomness in game logic
//! - Fighters are processed in id order
//!
//! Timing constants are expressed in frames at [`FRAME_RATE`] and scaled by
//! the elapsed `dt`, so variable tick lengths stay frame-rate independent.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod replay;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rect::Aabb;
pub use core::hash::StateHash;
pub use game::config::{MatchConfig, ConfigError};
pub use game::input::{Button, InputFrame, InputDelta, InputRecorder};
pub use game::state::{MatchState, MatchPhase, MatchError};
pub use game::fighter::FighterId;
pub use game::tick::{tick, TickResult};
pub use replay::{MatchRecorder, MatchSnapshot, MatchTranscript, verify_transcript};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Reference frame rate that frame-denominated data is authored at.
pub const FRAME_RATE: f64 = TICK_RATE as f64;

/// Slack when comparing elapsed frame counts against window boundaries.
pub const FRAME_EPSILON: f64 = 1e-6;

/// A timer at or below this many seconds has expired.
pub const TIMER_EPSILON: f64 = 1e-9;
