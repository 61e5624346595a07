/// Movement integrator.
///
/// Gravity is tuned against a 60 Hz reference: each second of simulation
/// adds `GRAVITY * 60 * dt` per call, so a body falling for one 60 Hz frame
/// gains 8 units/s.
///
/// ## Order within one slice
///   1. Gravity, unless resting or gravity is disabled (then `vy = 0`)
///   2. Clamp `vy` to ±`TERMINAL_SPEED`
///   3. Snap components with `|v| < VELOCITY_EPSILON` to zero
///   4. `position += velocity * dt`
///   5. Collision pass (see `collision::resolve`)
///
/// Players are sliced into `SUBSTEP`-sized pieces; enemies take one slice
/// per frame.

use super::collision::{self, Contacts};
use super::entity::{CollisionProbe, MovementState};
use super::tile::TileGrid;

pub const GRAVITY: f32 = 8.0;
pub const REFERENCE_HZ: f32 = 60.0;
pub const TERMINAL_SPEED: f32 = 479.0;
pub const VELOCITY_EPSILON: f32 = 0.01;
/// Fixed slice length for sub-stepped bodies.
pub const SUBSTEP: f32 = 0.008;

/// Apply gravity, clamp, snap and move. No collision.
pub fn integrate(body: &mut MovementState, dt: f32) {
    if !body.resting && !body.ignore_gravity {
        body.velocity.y += GRAVITY * REFERENCE_HZ * dt;
    } else {
        body.velocity.y = 0.0;
    }

    body.velocity.y = body.velocity.y.clamp(-TERMINAL_SPEED, TERMINAL_SPEED);

    if body.velocity.x.abs() < VELOCITY_EPSILON {
        body.velocity.x = 0.0;
    }
    if body.velocity.y.abs() < VELOCITY_EPSILON {
        body.velocity.y = 0.0;
    }

    body.position += body.velocity * dt;
}

/// Slices of at most `SUBSTEP` covering `dt`; the last one takes the remainder.
/// The slice count is fixed up front, so the iterator ends even once `dt`
/// is too large for subtraction to make progress.
#[derive(Clone, Copy, Debug)]
pub struct SubSteps {
    remaining: f32,
    left: u32,
}

impl Iterator for SubSteps {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        let slice = if self.left == 0 { self.remaining } else { self.remaining.min(SUBSTEP) };
        self.remaining -= slice;
        Some(slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.left as usize, Some(self.left as usize))
    }
}

pub fn substeps(dt: f32) -> SubSteps {
    let left = if dt > 0.0 { (dt / SUBSTEP).ceil() as u32 } else { 0 };
    SubSteps { remaining: dt, left }
}

/// One integrate + collide slice.
pub fn advance(grid: &TileGrid, probe: &CollisionProbe, body: &mut MovementState, dt: f32) -> Contacts {
    integrate(body, dt);
    collision::resolve(grid, probe, body)
}

/// Integrate + collide in `SUBSTEP` slices. Returns the contacts of the last slice.
pub fn advance_substepped(grid: &TileGrid, probe: &CollisionProbe, body: &mut MovementState, dt: f32) -> Contacts {
    let mut last = Contacts::default();
    for slice in substeps(dt) {
        last = advance(grid, probe, body, slice);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;
    use glam::Vec2;

    fn floor_grid(width: usize, height: usize, floor_row: usize) -> TileGrid {
        let tiles = (0..width).map(|c| Tile::new(c, floor_row, 'X', false));
        TileGrid::from_tiles(width, height, tiles)
    }

    #[test]
    fn gravity_accumulates_when_airborne() {
        let mut b = MovementState::at(Vec2::ZERO, 10.0);
        integrate(&mut b, 1.0 / 60.0);
        assert!((b.velocity.y - 8.0).abs() < 1e-4);
        let before = b.velocity.y;
        integrate(&mut b, 1.0 / 60.0);
        assert!(b.velocity.y > before);
    }

    #[test]
    fn resting_or_floating_zeroes_vertical_speed() {
        let mut b = MovementState::at(Vec2::ZERO, 10.0);
        b.velocity.y = 30.0;
        b.resting = true;
        integrate(&mut b, 0.1);
        assert_eq!(b.velocity.y, 0.0);

        let mut g = MovementState::at(Vec2::ZERO, 10.0);
        g.velocity.y = -30.0;
        g.ignore_gravity = true;
        integrate(&mut g, 0.1);
        assert_eq!(g.velocity.y, 0.0);
        assert_eq!(g.position, Vec2::ZERO);
    }

    #[test]
    fn terminal_speed_holds_both_ways() {
        let mut b = MovementState::at(Vec2::ZERO, 10.0);
        for _ in 0..10_000 {
            integrate(&mut b, 1.0 / 60.0);
            assert!(b.velocity.y.abs() <= TERMINAL_SPEED);
        }
        assert_eq!(b.velocity.y, TERMINAL_SPEED);

        let mut up = MovementState::at(Vec2::ZERO, 10.0);
        up.ignore_gravity = false;
        up.velocity.y = -900.0;
        integrate(&mut up, 0.0);
        assert_eq!(up.velocity.y, -TERMINAL_SPEED);
    }

    #[test]
    fn tiny_speeds_snap_to_zero() {
        let mut b = MovementState::at(Vec2::new(5.0, 5.0), 10.0);
        b.resting = true;
        b.velocity.x = 0.009;
        integrate(&mut b, 1.0);
        assert_eq!(b.velocity, Vec2::ZERO);
        assert_eq!(b.position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn substeps_cover_dt_with_partial_tail() {
        let slices: Vec<f32> = substeps(0.02).collect();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0], SUBSTEP);
        assert_eq!(slices[1], SUBSTEP);
        assert!((slices[2] - 0.004).abs() < 1e-6);
        let total: f32 = slices.iter().sum();
        assert!((total - 0.02).abs() < 1e-6);

        assert_eq!(substeps(0.0).count(), 0);
        assert_eq!(substeps(-1.0).count(), 0);
        assert_eq!(substeps(SUBSTEP).count(), 1);
        assert_eq!(substeps(f32::NAN).count(), 0);
    }

    #[test]
    fn substeps_are_counted_for_huge_dt() {
        // Far past the point where `dt - SUBSTEP == dt` in f32.
        let (lo, hi) = substeps(3.0e5).size_hint();
        assert_eq!(Some(lo), hi);
        assert!((37_000_000..=38_000_000).contains(&lo));
    }

    #[test]
    fn falling_body_lands_on_floor() {
        let grid = floor_grid(8, 8, 6);
        let mut b = MovementState::at(Vec2::new(32.0, 10.0), 10.0);
        for _ in 0..120 {
            advance_substepped(&grid, &CollisionProbe::PLAYER, &mut b, 1.0 / 60.0);
        }
        assert!(b.resting);
        assert_eq!(b.velocity.y, 0.0);
        // Floor top at y 48; feet one unit inside.
        assert!((b.position.y + 12.0 - 49.0).abs() < 1e-3);
    }
}
