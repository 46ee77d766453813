//! Recorded Match Session
//!
//! Drives a match at a fixed tick length while building its transcript:
//! inputs are recorded per simulated tick, state hashes are checkpointed
//! every `checkpoint_interval` ticks, significant events are kept.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::info;

use crate::game::config::MatchConfig;
use crate::game::fighter::FighterId;
use crate::game::input::InputFrame;
use crate::game::state::{MatchError, MatchState};
use crate::game::tick::{tick, TickResult};
use crate::replay::transcript::{
    hash_config, FighterStanding, MatchMetadata, MatchResult, MatchTranscript, TranscriptError,
};

/// Errors starting a recorded match.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Match could not be built
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Transcript setup failed
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// Tick length unusable for replay
    #[error("tick length must be finite and positive, got {0}")]
    InvalidDt(f64),
}

/// A match plus the transcript being written for it.
#[derive(Debug)]
pub struct MatchRecorder {
    state: MatchState,
    config: MatchConfig,
    dt: f64,
    transcript: MatchTranscript,
}

impl MatchRecorder {
    /// Build the configured match and open its transcript.
    pub fn new(config: MatchConfig, dt: f64) -> Result<Self, RecordError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(RecordError::InvalidDt(dt));
        }
        let state = MatchState::from_config(&config)?;

        let mut roster: Vec<_> = state.fighters.values().collect();
        roster.sort_by_key(|f| f.spawn_slot);
        let metadata = MatchMetadata {
            stage: state.stage.id,
            roster: roster.iter().map(|f| (f.id, f.character)).collect(),
            dt,
            config_hash: hash_config(&config)?,
            config: config.clone(),
            initial_state_hash: state.compute_hash(),
        };
        info!(
            stage = %metadata.stage,
            initial = %hex::encode(metadata.initial_state_hash),
            "recording match"
        );

        Ok(Self {
            state,
            config,
            dt,
            transcript: MatchTranscript::new(metadata),
        })
    }

    /// Begin the countdown.
    pub fn start(&mut self) {
        self.state.start(self.config.countdown_ticks);
    }

    /// Current match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Transcript so far.
    pub fn transcript(&self) -> &MatchTranscript {
        &self.transcript
    }

    /// Run one tick and record it.
    pub fn step(&mut self, inputs: &BTreeMap<FighterId, InputFrame>) -> TickResult {
        let before = self.state.tick;
        let result = tick(&mut self.state, inputs, self.dt, &self.config);

        let current = self.state.tick;
        if current != before {
            for recorder in self.transcript.inputs.iter_mut() {
                let frame = inputs.get(&recorder.fighter_id).copied().unwrap_or_default();
                recorder.record(current, frame);
            }
            if current % self.config.checkpoint_interval == 0 {
                self.transcript.add_checkpoint(current, self.state.compute_hash());
            }
        }

        for event in &result.events {
            self.transcript.record_event(event);
        }
        result
    }

    /// Close the transcript with the current outcome.
    pub fn finish(mut self) -> (MatchState, MatchTranscript) {
        let final_state_hash = self.state.compute_hash();
        let standings = self
            .state
            .fighters
            .values()
            .map(|f| FighterStanding {
                fighter: f.id,
                stocks: f.stocks,
                falls: f.falls,
                damage_percent: f.damage_percent,
            })
            .collect();

        info!(
            ticks = self.state.tick,
            winner = ?self.state.winner(),
            hash = %hex::encode(final_state_hash),
            "transcript finalized"
        );
        self.transcript.finalize(MatchResult {
            end_tick: self.state.tick,
            winner: self.state.winner(),
            reason: self.state.outcome.map(|o| o.reason),
            standings,
            final_state_hash,
        });
        (self.state, self.transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::Button;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_rejects_bad_dt() {
        assert!(matches!(
            MatchRecorder::new(MatchConfig::default(), 0.0),
            Err(RecordError::InvalidDt(_))
        ));
        assert!(matches!(
            MatchRecorder::new(MatchConfig::default(), f64::NAN),
            Err(RecordError::InvalidDt(_))
        ));
    }

    #[test]
    fn test_countdown_ticks_not_recorded() {
        let config = MatchConfig {
            countdown_ticks: 5,
            checkpoint_interval: 10,
            ..MatchConfig::default()
        };
        let mut recorder = MatchRecorder::new(config, DT).unwrap();
        recorder.start();

        let mut inputs = BTreeMap::new();
        inputs.insert(FighterId(0), InputFrame::with(&[Button::Right]));
        for _ in 0..26 {
            recorder.step(&inputs);
        }

        // 6 countdown steps, then 20 simulated ticks
        assert_eq!(recorder.state().tick, 20);
        let transcript = recorder.transcript();
        let p1 = transcript.inputs_for(FighterId(0)).unwrap();
        assert_eq!(p1.start_tick, 1);
        assert_eq!(p1.end_tick, 20);
        assert_eq!(p1.delta_count(), 1);
        assert_eq!(
            transcript.checkpoints.iter().map(|c| c.tick).collect::<Vec<_>>(),
            vec![10, 20]
        );
    }

    #[test]
    fn test_finish_records_result() {
        let config = MatchConfig {
            countdown_ticks: 0,
            round_time: Some(10.0 * DT),
            ..MatchConfig::default()
        };
        let mut recorder = MatchRecorder::new(config, DT).unwrap();
        recorder.start();
        let idle = BTreeMap::new();
        while !recorder.step(&idle).match_ended {}

        let (state, transcript) = recorder.finish();
        let result = transcript.result.as_ref().unwrap();
        assert_eq!(result.end_tick, state.tick);
        assert_eq!(result.final_state_hash, state.compute_hash());
        assert_eq!(result.standings.len(), 2);
        assert_eq!(result.reason, state.outcome.map(|o| o.reason));
    }
}
