//! Platform abstraction layer
//!
//! Handles host differences for:
//! - Input polling (keyboard, gamepad, scripted)
//! - Frame timing (variable frame delta to fixed simulation steps)

use std::collections::VecDeque;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sim::state::PlayerId;
use crate::sim::tick::{PlayerInput, TickInput};

/// Input collaborator: one snapshot per player per tick
pub trait InputSource {
    fn poll(&mut self, player: PlayerId) -> PlayerInput;
}

/// Replays a fixed list of tick inputs, then idles
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<TickInput>,
    current: TickInput,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            current: TickInput::default(),
        }
    }

    /// Hold `input` for `ticks` ticks
    pub fn hold(mut self, input: TickInput, ticks: usize) -> Self {
        self.frames.extend(std::iter::repeat_n(input, ticks));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, player: PlayerId) -> PlayerInput {
        // Player one's poll advances the script; player two reads the same frame
        if player == PlayerId::One {
            self.current = self.frames.pop_front().unwrap_or_default();
        }
        *self.current.player(player)
    }
}

/// Fixed timestep accumulator
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's wall-clock delta; returns how many `SIM_DT` ticks to run
    ///
    /// Long frames are capped at 0.1s and `MAX_SUBSTEPS` to prevent a spiral
    /// of death after a stall.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let dt = frame_dt.clamp(0.0, 0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Fraction of a tick left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_replays_then_idles() {
        let fire = PlayerInput {
            fire: true,
            ..Default::default()
        };
        let mut source = ScriptedInput::new([TickInput::new(fire, PlayerInput::default())])
            .hold(TickInput::new(PlayerInput::default(), fire), 2);
        assert_eq!(source.remaining(), 3);

        let first = TickInput::poll(&mut source);
        assert!(first.players[0].fire && !first.players[1].fire);
        let second = TickInput::poll(&mut source);
        assert!(!second.players[0].fire && second.players[1].fire);
        TickInput::poll(&mut source);
        assert_eq!(TickInput::poll(&mut source), TickInput::default());
    }

    #[test]
    fn test_frame_clock_accumulates() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(SIM_DT * 0.5), 0);
        assert_eq!(clock.advance(SIM_DT * 0.6), 1);
        assert!(clock.alpha() < 0.2);
    }

    #[test]
    fn test_frame_clock_caps_substeps() {
        let capped = FrameClock::new().advance(10.0);
        assert_eq!(capped, FrameClock::new().advance(0.1));
        let mut clock = FrameClock::new();
        for _ in 0..3 {
            assert!(clock.advance(0.1) <= MAX_SUBSTEPS);
        }
    }
}
