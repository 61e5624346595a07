/// Tile-grid collision resolver.
///
/// ## Probes
///
/// Each actor samples the grid at a fixed set of local points, grouped by
/// side. Only the groups facing the direction of travel are tested:
///   - right  — only while moving right (`vx > 0`)
///   - left   — only while moving left  (`vx < 0`)
///   - top    — only while moving up    (`vy < 0`)
///   - bottom — whenever `vy >= 0` (continuous ground detection, even at rest)
///
/// ## Depth
///
/// A probe point inside an impassable tile reports how far it has crossed
/// into the tile from the side it entered. Per axis the deepest point wins;
/// a point only counts when it is strictly deeper than everything seen so
/// far (a point sitting exactly on a tile edge reports 0 and is ignored).
///
/// ## Resolution order
///
/// The axis with the larger penetration is resolved first. Ties go to the
/// vertical axis. Landing pushes the actor up by `depth - 1`, leaving it one
/// unit inside the ground so the next pass still sees the floor.

use glam::Vec2;

use super::entity::{CollisionProbe, MovementState};
use super::tile::{TileGrid, TILE_SIZE};

/// Vertical speed after a ceiling bump when the horizontal axis dominated.
pub const BUMP_SPEED_SIDEWAYS: f32 = 5.0;
/// Vertical speed after a ceiling bump when the vertical axis dominated.
pub const BUMP_SPEED_UPWARD: f32 = 1.0;

/// Which sides collided during one pass, with the winning depth per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Contacts {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub x_depth: f32,
    pub y_depth: f32,
}

impl Contacts {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

// ══════════════════════════════════════════════════════════════
// Penetration depth (world-space point)
// ══════════════════════════════════════════════════════════════

#[inline]
pub fn depth_down(grid: &TileGrid, point: Vec2) -> f32 {
    grid.solid_at(point).map_or(0.0, |t| point.y - t.origin().y)
}

#[inline]
pub fn depth_up(grid: &TileGrid, point: Vec2) -> f32 {
    grid.solid_at(point).map_or(0.0, |t| t.origin().y + TILE_SIZE - point.y)
}

#[inline]
pub fn depth_left(grid: &TileGrid, point: Vec2) -> f32 {
    grid.solid_at(point).map_or(0.0, |t| t.origin().x + TILE_SIZE - point.x)
}

#[inline]
pub fn depth_right(grid: &TileGrid, point: Vec2) -> f32 {
    grid.solid_at(point).map_or(0.0, |t| point.x - t.origin().x)
}

/// Deepest penetration among `points` (local offsets from `origin`).
/// Returns 0 and false when nothing penetrates.
fn deepest(grid: &TileGrid, origin: Vec2, points: &[Vec2], depth: fn(&TileGrid, Vec2) -> f32) -> (f32, bool) {
    let mut best = 0.0;
    let mut hit = false;
    for &p in points {
        let d = depth(grid, origin + p);
        if d > best {
            best = d;
            hit = true;
        }
    }
    (best, hit)
}

// ══════════════════════════════════════════════════════════════
// Resolution
// ══════════════════════════════════════════════════════════════

/// Push `body` out of impassable tiles. No-clip bodies are left untouched.
pub fn resolve(grid: &TileGrid, probe: &CollisionProbe, body: &mut MovementState) -> Contacts {
    let mut c = Contacts::default();
    if body.no_clip {
        return c;
    }
    body.bumped_head = false;
    let origin = body.position;

    if body.velocity.x > 0.0 {
        (c.x_depth, c.right) = deepest(grid, origin, probe.right, depth_right);
    } else if body.velocity.x < 0.0 {
        (c.x_depth, c.left) = deepest(grid, origin, probe.left, depth_left);
    }

    if body.velocity.y < 0.0 {
        (c.y_depth, c.up) = deepest(grid, origin, probe.top, depth_up);
    } else {
        (c.y_depth, c.down) = deepest(grid, origin, probe.bottom, depth_down);
    }

    if c.x_depth.abs() > c.y_depth.abs() {
        push_horizontal(body, &c);
        push_vertical(body, &c, BUMP_SPEED_SIDEWAYS);
    } else {
        push_vertical(body, &c, BUMP_SPEED_UPWARD);
        push_horizontal(body, &c);
    }
    c
}

fn push_horizontal(body: &mut MovementState, c: &Contacts) {
    if c.left {
        body.position.x += c.x_depth;
        body.velocity.x = 0.0;
    } else if c.right {
        body.position.x -= c.x_depth;
        body.velocity.x = 0.0;
    }
}

fn push_vertical(body: &mut MovementState, c: &Contacts, bump_speed: f32) {
    if c.down {
        // Already resting: stay put, the 1-unit overlap is intended.
        if !body.resting {
            body.position.y -= c.y_depth - 1.0;
            body.resting = true;
            body.velocity.y = 0.0;
        }
    } else {
        body.resting = false;
    }

    if c.up {
        body.bumped_head = true;
        body.position.y += c.y_depth;
        body.velocity.y = bump_speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;

    fn grid_from(rows: &[&str]) -> TileGrid {
        let h = rows.len();
        let w = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut tiles = vec![];
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == 'X' {
                    tiles.push(Tile::new(col, row, ch, false));
                }
            }
        }
        TileGrid::from_tiles(w, h, tiles)
    }

    fn body(x: f32, y: f32, vx: f32, vy: f32) -> MovementState {
        let mut b = MovementState::at(Vec2::new(x, y), 10.0);
        b.velocity = Vec2::new(vx, vy);
        b
    }

    const PROBE: CollisionProbe = CollisionProbe::PLAYER;

    #[test]
    fn depth_per_side() {
        let g = grid_from(&["--", "-X"]);
        let p = Vec2::new(10.0, 11.0);
        assert_eq!(depth_down(&g, p), 3.0);
        assert_eq!(depth_up(&g, p), 5.0);
        assert_eq!(depth_left(&g, p), 6.0);
        assert_eq!(depth_right(&g, p), 2.0);
        assert_eq!(depth_down(&g, Vec2::new(2.0, 2.0)), 0.0);
    }

    #[test]
    fn landing_pushes_up_leaving_one_unit() {
        // Ground row 3 (y 24..32). Bottom probes at +12: y = 18 + 12 = 30 → depth 6.
        let g = grid_from(&["----", "----", "----", "XXXX"]);
        let mut b = body(16.0, 18.0, 0.0, 40.0);
        let c = resolve(&g, &PROBE, &mut b);
        assert!(c.down);
        assert!(b.resting);
        assert_eq!(b.velocity.y, 0.0);
        assert_eq!(b.position.y, 13.0);
        assert_eq!(b.position.y + 12.0, 25.0);
    }

    #[test]
    fn resting_body_is_not_pushed_again() {
        let g = grid_from(&["----", "----", "----", "XXXX"]);
        let mut b = body(16.0, 13.0, 0.0, 0.0);
        b.resting = true;
        let c = resolve(&g, &PROBE, &mut b);
        assert!(c.down);
        assert!(b.resting);
        assert_eq!(b.position.y, 13.0);
    }

    #[test]
    fn leaving_the_ground_clears_resting() {
        let g = grid_from(&["----", "----", "----", "----"]);
        let mut b = body(16.0, 13.0, 0.0, 0.0);
        b.resting = true;
        let c = resolve(&g, &PROBE, &mut b);
        assert!(!c.any());
        assert!(!b.resting);
    }

    #[test]
    fn point_on_tile_edge_does_not_collide() {
        let g = grid_from(&["----", "----", "----", "XXXX"]);
        // Feet exactly at y = 24, the top of the ground row.
        let mut b = body(16.0, 12.0, 0.0, 0.0);
        let c = resolve(&g, &PROBE, &mut b);
        assert!(!c.down);
        assert!(!b.resting);
    }

    #[test]
    fn wall_on_the_right_stops_horizontal_motion() {
        // Wall column 3 (x 24..32); right probe at +5 → x = 24.5, depth 0.5.
        let g = grid_from(&["---X", "---X", "---X", "---X"]);
        let mut b = body(19.5, 14.0, 30.0, 0.0);
        let c = resolve(&g, &PROBE, &mut b);
        assert!(c.right);
        assert_eq!(b.velocity.x, 0.0);
        assert_eq!(b.position.x, 19.0);
    }

    #[test]
    fn ceiling_bump_depends_on_dominant_axis() {
        // Ceiling row 0 (y 0..8). Top probes at -10.
        let g = grid_from(&["XXXX", "----", "----", "----"]);

        // Mostly vertical: depth 2 up, no horizontal contact.
        let mut b = body(16.0, 16.0, 0.0, -50.0);
        let c = resolve(&g, &PROBE, &mut b);
        assert!(c.up);
        assert!(b.bumped_head);
        assert_eq!(b.position.y, 18.0);
        assert_eq!(b.velocity.y, BUMP_SPEED_UPWARD);

        // Horizontal dominates: wall on the left deeper than the ceiling.
        let g = grid_from(&["XXXX", "X---", "X---", "X---"]);
        let mut b = body(10.0, 17.5, -20.0, -50.0);
        let c = resolve(&g, &PROBE, &mut b);
        assert!(c.left && c.up);
        assert!(c.x_depth > c.y_depth);
        assert_eq!(b.velocity.y, BUMP_SPEED_SIDEWAYS);
        assert_eq!(b.velocity.x, 0.0);
    }

    #[test]
    fn bumped_head_resets_each_pass() {
        let g = grid_from(&["----", "----"]);
        let mut b = body(8.0, 4.0, 0.0, -10.0);
        b.bumped_head = true;
        resolve(&g, &PROBE, &mut b);
        assert!(!b.bumped_head);
    }

    #[test]
    fn no_clip_skips_everything() {
        let g = grid_from(&["XXXX", "XXXX", "XXXX", "XXXX"]);
        let mut b = body(16.0, 16.0, 10.0, 10.0);
        b.no_clip = true;
        let before = b.clone();
        let c = resolve(&g, &PROBE, &mut b);
        assert!(!c.any());
        assert_eq!(b, before);
    }

    #[test]
    fn outside_the_grid_is_open_space() {
        let g = grid_from(&["XX", "XX"]);
        let mut b = body(-50.0, -50.0, -10.0, 10.0);
        let c = resolve(&g, &PROBE, &mut b);
        assert!(!c.any());
        assert_eq!(b.position, Vec2::new(-50.0, -50.0));
    }
}
