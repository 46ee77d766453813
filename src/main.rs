//! Brawl Simulation Runner
//!
//! Runs a scripted match headless, records its transcript and verifies it
//! by replay. Optional first argument: path to a JSON match config.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use brawl::{
    TICK_RATE, VERSION,
    game::{
        events::GameEventData,
        fighter::FighterId,
        input::{Button, InputFrame},
        MatchConfig,
    },
    replay::{verify_transcript, MatchRecorder},
};

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Brawl Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => MatchConfig::from_path(&path)
            .with_context(|| format!("loading match config from {path}"))?,
        None => MatchConfig::default(),
    };

    demo_match(config)
}

/// Scripted input for one fighter on one step.
fn scripted_input(slot: usize, step: u32) -> InputFrame {
    let phase = (step + slot as u32 * 37) % 120;
    let toward = if slot == 0 { Button::Right } else { Button::Left };
    match phase {
        0..=39 => InputFrame::with(&[toward]),
        40 => InputFrame::with(&[Button::Attack]),
        55 => InputFrame::with(&[Button::Up]),
        60..=64 => InputFrame::with(&[toward, Button::Up]),
        70 => InputFrame::with(&[Button::Attack, toward]),
        85 => InputFrame::with(&[Button::Grab]),
        95 => InputFrame::with(&[Button::Attack, Button::Down]),
        100..=110 => InputFrame::with(&[Button::Grab, Button::Down]),
        _ => InputFrame::new(),
    }
}

/// Record a scripted match, then verify the transcript.
fn demo_match(config: MatchConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");
    info!(stage = %config.stage, characters = ?config.characters, "config");

    let dt = 1.0 / TICK_RATE as f64;
    let max_steps = config
        .round_time
        .map_or(u32::MAX, |t| (t * TICK_RATE as f64) as u32)
        .saturating_add(config.countdown_ticks)
        .saturating_add(1);

    let mut recorder = MatchRecorder::new(config, dt).context("building match")?;
    let fighters: Vec<FighterId> = recorder.state().fighters.keys().copied().collect();
    recorder.start();

    let mut total_events = 0;
    for step in 0..max_steps {
        let inputs: BTreeMap<FighterId, InputFrame> = fighters
            .iter()
            .enumerate()
            .map(|(slot, id)| (*id, scripted_input(slot, step)))
            .collect();

        let result = recorder.step(&inputs);
        total_events += result.events.len();

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::Knockout { fighter, stocks_remaining, last_attacker } => {
                    info!(tick = event.tick, %fighter, ?stocks_remaining, ?last_attacker, "knockout");
                }
                GameEventData::Thrown { grabber, target, damage } => {
                    info!(tick = event.tick, %grabber, %target, damage, "throw");
                }
                GameEventData::PlatformBroken { index } => {
                    info!(tick = event.tick, index, "platform broke");
                }
                _ => {}
            }
        }

        if result.match_ended {
            info!("Match ended at tick {}", recorder.state().tick);
            break;
        }
    }

    // Print final results
    let (state, transcript) = recorder.finish();
    info!("=== Match Results ===");
    info!("Final State Hash: {}", hex::encode(state.compute_hash()));
    for fighter in state.fighters.values() {
        info!(
            "{} ({}) - {:.1}%, stocks {:?}, falls {}",
            fighter.id, fighter.character, fighter.damage_percent, fighter.stocks, fighter.falls
        );
    }
    match state.outcome {
        Some(outcome) => info!(winner = ?outcome.winner, reason = ?outcome.reason, "outcome"),
        None => warn!("match still running after {} steps", max_steps),
    }
    info!("Total events: {}", total_events);

    let bytes = transcript.to_bytes().context("encoding transcript")?;
    info!(
        "Transcript: {} bytes, {} checkpoints, {} events",
        bytes.len(),
        transcript.checkpoints.len(),
        transcript.events.len()
    );

    // Verify determinism by replaying
    info!("=== Verifying Transcript ===");
    let verification = verify_transcript(&transcript);
    info!("Replay State Hash: {}", hex::encode(verification.computed_final_hash));

    if let Some(error) = verification.error {
        bail!("verification failed: {error}");
    }
    info!("VERIFIED: {} checkpoints matched", verification.checkpoint_results.len());
    Ok(())
}
