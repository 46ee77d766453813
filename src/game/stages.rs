//! Stage Catalog
//!
//! The built-in arenas. Coordinates are screen pixels with y growing
//! downward; spawn points are feet positions a little above the platform
//! they drop onto.

use crate::game::stage::{PlatformKind, Stage, StageError, StageId, StageTuning, Zone};
use crate::core::vec2::Vec2;

impl StageId {
    /// Build the catalog stage for this id.
    pub fn build(self) -> Result<Stage, StageError> {
        match self {
            StageId::Battlefield => battlefield(),
            StageId::Plains => plains(),
            StageId::Volcano => volcano(),
            StageId::Toybox => toybox(),
            StageId::Custom => Err(StageError::UnknownStage(self.as_str().to_string())),
        }
    }
}

/// Flat solid main stage with three pass-through ledges.
pub fn battlefield() -> Result<Stage, StageError> {
    let (width, height) = (1200.0, 800.0);
    Stage::builder(StageId::Battlefield, "Battlefield", width, height)
        .platform(100.0, 700.0, 1000.0, 40.0, PlatformKind::Solid)
        .platform(200.0, 500.0, 200.0, 20.0, PlatformKind::PassThrough)
        .platform(800.0, 500.0, 200.0, 20.0, PlatformKind::PassThrough)
        .platform(500.0, 300.0, 200.0, 20.0, PlatformKind::PassThrough)
        .blast_zone(-300.0, width + 300.0, -300.0, height + 300.0)
        .spawn(300.0, 660.0)
        .spawn(900.0, 660.0)
        .build()
}

/// Main platform x range on Plains, shared by its terrain zones.
const PLAINS_MAIN: (f64, f64) = (200.0, 1200.0);

/// Physics for Plains: heavier gravity near the edges, grassy friction
/// bands, a light steady wind and sticky landings.
pub fn plains_tuning() -> StageTuning {
    let (left, right) = PLAINS_MAIN;
    let third = (right - left) * 0.3;
    StageTuning {
        gravity_scale: 1.15,
        air_friction: 0.02 * 1.3,
        ground_friction: 0.08,
        horizontal_bias: 0.5 * 0.02,
        landing_magnetism: 1.2 * 0.15,
        terminal_velocity: 16.0,
        gravity_zones: vec![
            Zone { min_x: f64::NEG_INFINITY, max_x: left + 100.0, scale: 1.05 },
            Zone { min_x: right - 100.0, max_x: f64::INFINITY, scale: 1.05 },
        ],
        friction_zones: vec![
            Zone { min_x: left, max_x: left + third, scale: 0.9 },
            Zone { min_x: right - third, max_x: right, scale: 0.9 },
        ],
    }
}

/// Wide grassland; one main platform, two small floating ledges.
pub fn plains() -> Result<Stage, StageError> {
    let (left, right) = PLAINS_MAIN;
    Stage::builder(StageId::Plains, "Plains", 1400.0, 800.0)
        .platform(left, 700.0, right - left, 50.0, PlatformKind::Solid)
        .platform(280.0, 580.0, 120.0, 18.0, PlatformKind::PassThrough)
        .platform(1000.0, 580.0, 120.0, 18.0, PlatformKind::PassThrough)
        .blast_zone(-320.0, 1720.0, -220.0, 1100.0)
        .spawn(380.0, 640.0)
        .spawn(1020.0, 640.0)
        .physics(plains_tuning())
        .build()
}

/// Two islands over lava, bridged by a moving platform, with breakable
/// ledges above.
pub fn volcano() -> Result<Stage, StageError> {
    let breakable = PlatformKind::Breakable {
        durability: 1.5,
        respawn_time: 5.0,
    };
    Stage::builder(StageId::Volcano, "Volcano", 1400.0, 900.0)
        .platform(50.0, 780.0, 400.0, 50.0, PlatformKind::Solid)
        .platform(950.0, 780.0, 400.0, 50.0, PlatformKind::Solid)
        .platform(
            500.0,
            700.0,
            150.0,
            30.0,
            PlatformKind::Moving {
                velocity: Vec2::new(2.0, 0.0),
                range: 350.0,
            },
        )
        .platform(200.0, 500.0, 120.0, 25.0, breakable)
        .platform(1080.0, 500.0, 120.0, 25.0, breakable)
        .platform(600.0, 300.0, 200.0, 30.0, PlatformKind::PassThrough)
        .hazard(500.0, 820.0, 400.0, 80.0, 15.0)
        .hazard(0.0, 840.0, 50.0, 60.0, 12.0)
        .hazard(1350.0, 840.0, 50.0, 60.0, 12.0)
        .blast_zone(-300.0, 1700.0, -300.0, 1200.0)
        .spawn(200.0, 730.0)
        .spawn(1150.0, 730.0)
        .build()
}

/// Practice room: one floor and a ledge, blast zones far enough away that
/// nobody gets KO'd by accident.
pub fn toybox() -> Result<Stage, StageError> {
    let (width, height) = (1280.0, 720.0);
    Stage::builder(StageId::Toybox, "Toybox", width, height)
        .platform(0.0, 650.0, width, 70.0, PlatformKind::Solid)
        .platform(440.0, 550.0, 400.0, 40.0, PlatformKind::PassThrough)
        .blast_zone(-10_000.0, width + 10_000.0, -10_000.0, height + 10_000.0)
        .spawn(300.0, 600.0)
        .spawn(980.0, 600.0)
        .build()
}
