//! Match Configuration
//!
//! Every tunable of a match in one serde struct. Defaults carry the game's
//! constants; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::combat::CombatConfig;
use crate::game::fighter::FighterConfig;
use crate::game::physics::PhysicsConfig;
use crate::game::roster::CharacterId;
use crate::game::stage::StageId;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON could not be parsed
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// File could not be read
    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),

    /// A value is out of range
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Stage name not in the catalog
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    /// Character name not in the roster
    #[error("unknown character: {0}")]
    UnknownCharacter(String),
}

/// What happens to a fighter's percent when it is knocked out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KoDamagePolicy {
    /// Respawn at 0 %
    #[default]
    Reset,
    /// Keep accumulated percent across stocks
    Keep,
}

/// Configuration for match simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Default forces for stages without a hook
    pub physics: PhysicsConfig,
    /// Hit resolution tuning
    pub combat: CombatConfig,
    /// State machine timing
    pub fighter: FighterConfig,
    /// Lives per fighter; `None` plays without stocks
    pub stocks: Option<u32>,
    /// Round length in seconds; `None` plays without a clock
    pub round_time: Option<f64>,
    /// Ticks of countdown before play starts
    pub countdown_ticks: u32,
    /// Seconds out of play after a KO
    pub respawn_delay: f64,
    /// Percent handling on KO
    pub ko_damage: KoDamagePolicy,
    /// Largest step a single tick may take, in seconds
    pub max_delta_time: f64,
    /// Ticks between transcript checkpoints
    pub checkpoint_interval: u32,
    /// Stage name
    pub stage: String,
    /// Character names, one per fighter slot
    pub characters: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            combat: CombatConfig::default(),
            fighter: FighterConfig::default(),
            stocks: Some(3),
            round_time: Some(180.0),
            countdown_ticks: 180,
            respawn_delay: 2.0,
            ko_damage: KoDamagePolicy::Reset,
            max_delta_time: 1.0 / 20.0,
            checkpoint_interval: 600,
            stage: StageId::Battlefield.as_str().to_string(),
            characters: vec![
                CharacterId::Brawler.as_str().to_string(),
                CharacterId::Brawler.as_str().to_string(),
            ],
        }
    }
}

impl MatchConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Stage named by this config.
    pub fn stage_id(&self) -> Result<StageId, ConfigError> {
        self.stage
            .parse()
            .map_err(|_| ConfigError::UnknownStage(self.stage.clone()))
    }

    /// Characters named by this config, in slot order.
    pub fn character_ids(&self) -> Result<Vec<CharacterId>, ConfigError> {
        self.characters
            .iter()
            .map(|name| {
                name.parse()
                    .map_err(|_| ConfigError::UnknownCharacter(name.clone()))
            })
            .collect()
    }

    /// Check ranges and names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("physics.gravity", self.physics.gravity)?;
        positive("physics.terminal_velocity", self.physics.terminal_velocity)?;
        unit_interval("physics.air_friction", self.physics.air_friction)?;
        unit_interval("physics.ground_friction", self.physics.ground_friction)?;
        unit_interval("combat.block_chip", self.combat.block_chip)?;
        non_negative("combat.post_hit_invincibility", self.combat.post_hit_invincibility)?;
        non_negative("fighter.landing_lag", self.fighter.landing_lag)?;
        non_negative("fighter.respawn_invincibility", self.fighter.respawn_invincibility)?;
        positive("max_delta_time", self.max_delta_time)?;
        non_negative("respawn_delay", self.respawn_delay)?;

        if let Some(round_time) = self.round_time {
            positive("round_time", round_time)?;
        }
        if self.stocks == Some(0) {
            return Err(invalid("stocks", "must be at least 1"));
        }
        if self.checkpoint_interval == 0 {
            return Err(invalid("checkpoint_interval", "must be at least 1"));
        }
        if self.characters.len() != 2 {
            return Err(invalid(
                "characters",
                format!("expected 2 entries, found {}", self.characters.len()),
            ));
        }

        self.stage_id()?;
        self.character_ids()?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must not be negative, got {value}")))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be within [0, 1], got {value}")))
    }
}
