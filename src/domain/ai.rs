/// Enemy behaviours.
///
/// One closed enum, one `advance` per frame. Behaviours only read and write
/// the enemy's movement state and facing; combat state is read-only here.
///
///   - **Patrol** (ghoul) — walk in the facing direction, turn around every
///     `patrol_period` seconds. The timer keeps its overflow when it wraps.
///   - **Hop** (skeleton) — on every landing, launch up and sideways along
///     the current facing, then turn around for the next hop.
///   - **Hover** (ghost) — no gravity, no collision; orbit the anchor on a
///     circle of radius `hover_radius`. Being hit re-anchors the orbit at the
///     point of impact.
///
/// Patrol and Hop do nothing while the enemy is in hit-stun. Hover always
/// runs: it owns the enemy's gravity and collision flags.

use glam::Vec2;

use crate::config::EnemyTuning;
use super::combat::CombatState;
use super::entity::{EnemyKind, Facing, MovementState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    Patrol { timer: f32 },
    Hop,
    Hover { anchor: Vec2, phase: f32 },
}

impl Behavior {
    pub fn for_kind(kind: EnemyKind, spawn: Vec2) -> Self {
        match kind {
            EnemyKind::Ghoul => Behavior::Patrol { timer: 0.0 },
            EnemyKind::Skeleton => Behavior::Hop,
            EnemyKind::Ghost => Behavior::Hover { anchor: spawn, phase: 0.0 },
        }
    }

    /// Movement flags the behaviour needs from its first frame on.
    pub fn prepare(&self, body: &mut MovementState) {
        if let Behavior::Hover { .. } = self {
            body.no_clip = true;
            body.ignore_gravity = true;
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Patrol { .. } => "patrol",
            Behavior::Hop => "hop",
            Behavior::Hover { .. } => "hover",
        }
    }

    pub fn advance(
        &mut self,
        body: &mut MovementState,
        combat: &CombatState,
        facing: &mut Facing,
        tuning: &EnemyTuning,
        dt: f32,
    ) {
        match self {
            Behavior::Patrol { timer } => {
                if combat.in_hit_stun() { return; }
                body.velocity.x = facing.sign() * tuning.patrol_speed;
                *timer += dt;
                if *timer > tuning.patrol_period {
                    *facing = facing.flipped();
                    *timer -= tuning.patrol_period;
                }
            }
            Behavior::Hop => {
                if combat.in_hit_stun() { return; }
                if body.resting {
                    body.velocity.x = facing.sign() * tuning.hop_speed;
                    body.velocity.y = -tuning.hop_launch;
                    body.resting = false;
                    *facing = facing.flipped();
                }
            }
            Behavior::Hover { anchor, phase } => {
                body.no_clip = true;
                body.ignore_gravity = true;
                *phase += dt;
                if combat.in_hit_stun() {
                    body.ignore_gravity = false;
                    *anchor = body.position;
                    *phase = 0.0;
                }
                if combat.dead {
                    body.ignore_gravity = false;
                    body.no_clip = true;
                }
                if !combat.in_hit_stun() {
                    // The orbit owns the position; leftover knockback must not drift it.
                    body.velocity = Vec2::ZERO;
                    let r = tuning.hover_radius;
                    body.position = Vec2::new(
                        anchor.x + r * (1.0 - phase.cos()),
                        anchor.y + r * phase.sin(),
                    );
                }
            }
        }
    }
}
