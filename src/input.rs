//! Input collector: pointer motion accumulated between polls plus held movement keys.

use bitflags::bitflags;
use glam::Vec2;
use winit::keyboard::KeyCode;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MovementKeys: u8 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
    }
}

impl MovementKeys {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW => Some(Self::FORWARD),
            KeyCode::KeyS => Some(Self::BACK),
            KeyCode::KeyA => Some(Self::LEFT),
            KeyCode::KeyD => Some(Self::RIGHT),
            KeyCode::KeyQ => Some(Self::UP),
            KeyCode::KeyE => Some(Self::DOWN),
            _ => None,
        }
    }
}

/// What the camera consumes once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    /// Pointer motion in pixels since the previous snapshot, +y down.
    pub pointer_delta: Vec2,
    pub held: MovementKeys,
}

#[derive(Debug, Default)]
pub struct InputState {
    pointer_delta: Vec2,
    held: MovementKeys,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_moved(&mut self, dx: f64, dy: f64) {
        self.pointer_delta += Vec2::new(dx as f32, dy as f32);
    }

    pub fn set_key(&mut self, keys: MovementKeys, pressed: bool) {
        self.held.set(keys, pressed);
    }

    /// Releases every key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held = MovementKeys::empty();
    }

    /// Returns the accumulated state and restarts pointer accumulation.
    /// Held keys persist until released.
    pub fn snapshot_and_reset(&mut self) -> InputSnapshot {
        InputSnapshot {
            pointer_delta: std::mem::take(&mut self.pointer_delta),
            held: self.held,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_delta_accumulates_until_snapshot() {
        let mut input = InputState::new();
        input.pointer_moved(3.0, -1.0);
        input.pointer_moved(2.0, 4.0);

        assert_eq!(input.snapshot_and_reset().pointer_delta, Vec2::new(5.0, 3.0));
        assert_eq!(input.snapshot_and_reset().pointer_delta, Vec2::ZERO);
    }

    #[test]
    fn held_keys_survive_snapshots() {
        let mut input = InputState::new();
        input.set_key(MovementKeys::FORWARD, true);
        input.set_key(MovementKeys::UP, true);
        input.snapshot_and_reset();
        input.set_key(MovementKeys::UP, false);

        assert_eq!(input.snapshot_and_reset().held, MovementKeys::FORWARD);
    }

    #[test]
    fn wasdqe_map_to_six_directions() {
        let codes = [
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::KeyQ,
            KeyCode::KeyE,
        ];
        let all = codes
            .iter()
            .filter_map(|&code| MovementKeys::from_key_code(code))
            .fold(MovementKeys::empty(), |acc, key| acc | key);

        assert_eq!(all, MovementKeys::all());
        assert_eq!(MovementKeys::from_key_code(KeyCode::Space), None);
    }
}
