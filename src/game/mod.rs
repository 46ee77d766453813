//! Game Logic Module
//!
//! All combat simulation code. Deterministic for a given `dt` sequence.
//!
//! ## Module Structure
//!
//! - `input`: Logical buttons, edge queries, input recording
//! - `moves`: Attack definitions and timing windows
//! - `roster`: Character profiles (weight, tuning, move sets, hooks)
//! - `hitbox`: Hitbox variants and their hit bookkeeping
//! - `fighter`: Fighter state machine
//! - `stage` / `stages`: Arena geometry, physics hooks, the stage catalog
//! - `physics`: Forces, integration, blast zone
//! - `collision`: Platform resolution and hit/grab detection
//! - `combat`: Damage, knockback, hit and grab passes
//! - `state` / `tick`: Match state and the authoritative loop
//! - `config`: Match configuration
//! - `events`: Game events for presentation and replay

pub mod input;
pub mod moves;
pub mod roster;
pub mod hitbox;
pub mod fighter;
pub mod stage;
pub mod stages;
pub mod physics;
pub mod collision;
pub mod combat;
pub mod state;
pub mod tick;
pub mod config;
pub mod events;

// Re-export key types
pub use input::{Button, InputFrame, InputDelta, InputRecorder, PlayerInput};
pub use fighter::{Fighter, FighterId, FighterState};
pub use roster::CharacterId;
pub use stage::{Stage, StageId};
pub use state::{MatchState, MatchPhase, MatchError};
pub use config::{MatchConfig, ConfigError};
pub use tick::{tick, replay_match, TickResult};
pub use events::GameEvent;
