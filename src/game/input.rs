//! Input Capture and Normalization
//!
//! A fighter is driven by a fixed set of six logical buttons. Each tick the
//! match controller pairs the current frame with the previous one so the
//! state machine can ask for held / just-pressed / just-released edges.

use serde::{Serialize, Deserialize};

use crate::game::fighter::FighterId;

// =============================================================================
// BUTTONS
// =============================================================================

/// Logical button set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    /// Move left
    Left = 0,
    /// Move right
    Right = 1,
    /// Jump / aim up
    Up = 2,
    /// Crouch / aim down
    Down = 3,
    /// Attack
    Attack = 4,
    /// Grab (with Down: block)
    Grab = 5,
}

impl Button {
    /// All buttons in bit order.
    pub const ALL: [Button; 6] = [
        Button::Left,
        Button::Right,
        Button::Up,
        Button::Down,
        Button::Attack,
        Button::Grab,
    ];

    /// Bit mask of this button inside an [`InputFrame`].
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Direction tag that selects an attack from a move set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttackDirection {
    /// No direction held
    Neutral = 0,
    /// Left or right held
    Side = 1,
    /// Up held
    Up = 2,
    /// Down held
    Down = 3,
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Held buttons for a single tick, packed into one byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// One bit per [`Button`]; bits 6-7 unused
    pub buttons: u8,
}

impl InputFrame {
    /// Size in bytes
    pub const SIZE: usize = 1;

    /// Mask of the bits that map to real buttons.
    const VALID_MASK: u8 = 0b0011_1111;

    /// Create an empty (idle) frame.
    pub const fn new() -> Self {
        Self { buttons: 0 }
    }

    /// Create from a raw bitmask. Unused bits are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self { buttons: bits & Self::VALID_MASK }
    }

    /// Create with the given buttons held.
    pub fn with(buttons: &[Button]) -> Self {
        buttons.iter().fold(Self::new(), |frame, b| frame.press(*b))
    }

    /// Builder: same frame with `button` held.
    #[inline]
    pub const fn press(self, button: Button) -> Self {
        Self { buttons: self.buttons | button.bit() }
    }

    /// Builder: same frame with `button` released.
    #[inline]
    pub const fn release(self, button: Button) -> Self {
        Self { buttons: self.buttons & !button.bit() }
    }

    /// Is `button` held in this frame?
    #[inline]
    pub const fn held(&self, button: Button) -> bool {
        self.buttons & button.bit() != 0
    }

    /// No button held.
    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.buttons == 0
    }

    /// Horizontal axis in [-1, 1]: right minus left.
    #[inline]
    pub fn horizontal_axis(&self) -> f64 {
        let mut axis = 0.0;
        if self.held(Button::Left) {
            axis -= 1.0;
        }
        if self.held(Button::Right) {
            axis += 1.0;
        }
        axis
    }

    /// Direction implied by held buttons. Up beats down beats side.
    pub fn attack_direction(&self) -> AttackDirection {
        if self.held(Button::Up) {
            AttackDirection::Up
        } else if self.held(Button::Down) {
            AttackDirection::Down
        } else if self.held(Button::Left) || self.held(Button::Right) {
            AttackDirection::Side
        } else {
            AttackDirection::Neutral
        }
    }
}

/// Current and previous frame for one fighter, for edge queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    /// Buttons held this tick
    pub current: InputFrame,
    /// Buttons held last tick
    pub previous: InputFrame,
}

impl PlayerInput {
    /// Pair a frame with its predecessor.
    pub const fn new(current: InputFrame, previous: InputFrame) -> Self {
        Self { current, previous }
    }

    /// Button is held now.
    #[inline]
    pub fn held(&self, button: Button) -> bool {
        self.current.held(button)
    }

    /// Rising edge: held now, not held last tick.
    #[inline]
    pub fn just_pressed(&self, button: Button) -> bool {
        self.current.held(button) && !self.previous.held(button)
    }

    /// Falling edge: held last tick, not held now.
    #[inline]
    pub fn just_released(&self, button: Button) -> bool {
        !self.current.held(button) && self.previous.held(button)
    }

    /// Horizontal axis of the current frame.
    #[inline]
    pub fn horizontal_axis(&self) -> f64 {
        self.current.horizontal_axis()
    }

    /// Attack direction of the current frame.
    #[inline]
    pub fn attack_direction(&self) -> AttackDirection {
        self.current.attack_direction()
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Complete input recording for one fighter in one match.
///
/// Used for replay playback and transcript verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecorder {
    /// Fighter this recording belongs to
    pub fighter_id: FighterId,

    /// First recorded tick
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Only ticks where input changed
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecorder {
    /// Create an empty recording.
    pub fn new(fighter_id: FighterId) -> Self {
        Self {
            fighter_id,
            start_tick: 0,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Rebuild a recording from stored deltas (e.g. after deserializing).
    pub fn from_deltas(fighter_id: FighterId, deltas: Vec<InputDelta>, end_tick: u32) -> Self {
        let last_frame = deltas.last().map(|d| d.frame).unwrap_or_default();
        let start_tick = deltas.first().map(|d| d.tick).unwrap_or(0);
        Self {
            fighter_id,
            start_tick,
            end_tick,
            deltas,
            last_frame,
        }
    }

    /// Record input for a tick. Only stored if it changed.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        if self.deltas.is_empty() && self.end_tick == 0 {
            self.start_tick = tick;
        }
        self.end_tick = tick;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Input held at a specific tick (binary search over deltas).
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of stored changes.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Iterate every tick in `start..=end` with its input.
    pub fn replay_iter(&self, start: u32, end: u32) -> impl Iterator<Item = (u32, InputFrame)> + '_ {
        (start..=end).map(move |t| (t, self.get_input_at(t)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let prev = InputFrame::with(&[Button::Up]);
        let cur = InputFrame::with(&[Button::Attack]);
        let input = PlayerInput::new(cur, prev);

        assert!(input.just_pressed(Button::Attack));
        assert!(input.just_released(Button::Up));
        assert!(!input.held(Button::Up));
        assert!(!input.just_pressed(Button::Grab));
    }

    #[test]
    fn test_held_is_not_just_pressed() {
        let frame = InputFrame::with(&[Button::Right]);
        let input = PlayerInput::new(frame, frame);
        assert!(input.held(Button::Right));
        assert!(!input.just_pressed(Button::Right));
        assert_eq!(input.horizontal_axis(), 1.0);
    }

    #[test]
    fn test_attack_direction_priority() {
        let up_down = InputFrame::with(&[Button::Up, Button::Down, Button::Left]);
        assert_eq!(up_down.attack_direction(), AttackDirection::Up);

        let down_side = InputFrame::with(&[Button::Down, Button::Right]);
        assert_eq!(down_side.attack_direction(), AttackDirection::Down);

        let side = InputFrame::with(&[Button::Left]);
        assert_eq!(side.attack_direction(), AttackDirection::Side);

        assert_eq!(InputFrame::new().attack_direction(), AttackDirection::Neutral);
    }

    #[test]
    fn test_opposing_directions_cancel() {
        let frame = InputFrame::with(&[Button::Left, Button::Right]);
        assert_eq!(frame.horizontal_axis(), 0.0);
    }

    #[test]
    fn test_from_bits_masks_unused() {
        let frame = InputFrame::from_bits(0xFF);
        assert_eq!(frame.buttons, 0b0011_1111);
    }

    #[test]
    fn test_recorder_delta_compression() {
        let mut recorder = InputRecorder::new(FighterId(0));
        let idle = InputFrame::new();
        let right = InputFrame::with(&[Button::Right]);

        for t in 1..=10 {
            recorder.record(t, idle);
        }
        for t in 11..=20 {
            recorder.record(t, right);
        }
        for t in 21..=30 {
            recorder.record(t, idle);
        }

        // Idle matches the initial state, so only two changes are stored
        assert_eq!(recorder.delta_count(), 2);
        assert_eq!(recorder.get_input_at(5), idle);
        assert_eq!(recorder.get_input_at(11), right);
        assert_eq!(recorder.get_input_at(20), right);
        assert_eq!(recorder.get_input_at(25), idle);
        assert_eq!(recorder.end_tick, 30);
    }

    #[test]
    fn test_recorder_replay_iter() {
        let mut recorder = InputRecorder::new(FighterId(1));
        let jump = InputFrame::with(&[Button::Up]);
        recorder.record(1, InputFrame::new());
        recorder.record(2, jump);
        recorder.record(3, jump);

        let frames: Vec<_> = recorder.replay_iter(1, 3).collect();
        assert_eq!(frames, vec![(1, InputFrame::new()), (2, jump), (3, jump)]);
    }
}
