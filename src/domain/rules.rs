/// Player control rules: one input frame → intent.
///
/// Mutates the player's velocity, facing, animation label and jump
/// bookkeeping. Never moves the player; the integrator does that.
///
/// ## Branch table (first match wins)
/// ┌──────────────────────┬──────────────────────────────────────────┐
/// │ Condition             │ Effect                                   │
/// ├──────────────────────┼──────────────────────────────────────────┤
/// │ dead                  │ anim = Dead, nothing else                │
/// │ Waiting / Appearing   │ count down the arrival, no input         │
/// │ hit-stun              │ drop all jump state, anim = HitStun      │
/// │ attacking             │ brake if grounded, anim = Attacking      │
/// │ resting               │ walk / brake / jump                      │
/// │ airborne              │ jump thrust window + half air control    │
/// └──────────────────────┴──────────────────────────────────────────┘
///
/// The attack trigger is checked after the branch, for every live,
/// arrived player that is neither attacking nor in hit-stun.
///
/// All rates are per 60 Hz reference frame and scaled by `60 * dt`.

use glam::Vec2;

use crate::config::PlayerTuning;
use super::collision::BUMP_SPEED_UPWARD;
use super::entity::{Facing, FrameInput, MovementState, Player, PlayerAnim};
use super::geom::Rect;
use super::physics::REFERENCE_HZ;

/// A melee swing the caller should spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackRequest {
    pub position: Vec2,
    pub hitbox: Rect,
    pub duration: f32,
}

/// What happened while applying one input frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Control {
    pub jumped: bool,
    /// The player just finished appearing and is now controllable.
    pub appeared: bool,
    pub attack: Option<AttackRequest>,
}

pub fn control_player(p: &mut Player, input: &FrameInput, t: &PlayerTuning, dt: f32) -> Control {
    let mut out = Control::default();

    if p.combat.dead {
        p.anim = PlayerAnim::Dead;
        return out;
    }
    if p.anim.is_arriving() {
        out.appeared = advance_arrival(p, t, dt);
        return out;
    }

    if p.combat.in_hit_stun() {
        p.jump = Default::default();
        p.anim = PlayerAnim::HitStun;
    } else if p.combat.is_attacking() {
        if p.body.resting {
            slow_to_stop(&mut p.body, t.ground_friction, dt);
        }
        p.anim = PlayerAnim::Attacking;
    } else if p.body.resting {
        out.jumped = ground_control(p, input, t, dt);
    } else {
        air_control(p, input, t, dt);
    }

    if !p.combat.is_attacking() && !p.combat.in_hit_stun() && input.pressed.attack {
        p.combat.attack.start();
        out.attack = Some(melee_swing(p.body.position, p.facing, t));
    }

    out
}

/// Waiting → Appearing → Standing. Returns true on the frame control is handed over.
fn advance_arrival(p: &mut Player, t: &PlayerTuning, dt: f32) -> bool {
    match p.anim {
        PlayerAnim::Waiting { remaining } => {
            let remaining = remaining - dt;
            p.anim = if remaining <= 0.0 {
                PlayerAnim::Appearing { remaining: t.appear_time }
            } else {
                PlayerAnim::Waiting { remaining }
            };
            false
        }
        PlayerAnim::Appearing { remaining } => {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                p.anim = PlayerAnim::Standing;
                true
            } else {
                p.anim = PlayerAnim::Appearing { remaining };
                false
            }
        }
        _ => false,
    }
}

fn ground_control(p: &mut Player, input: &FrameInput, t: &PlayerTuning, dt: f32) -> bool {
    let held = &input.held;
    let scale = REFERENCE_HZ * dt;
    let accel = p.body.base_speed * scale;

    p.jump.is_jumping = false;
    p.jump.has_control = false;
    p.anim = PlayerAnim::Standing;

    if held.left == held.right {
        slow_to_stop(&mut p.body, t.ground_friction, dt);
    } else {
        let dir = if held.left { Facing::Left } else { Facing::Right };
        let s = dir.sign();
        p.facing = dir;
        let reversing = p.body.velocity.x * s < 0.0;
        p.body.velocity.x += s * if reversing { accel * t.reverse_boost } else { accel };
        p.body.velocity.x = p.body.velocity.x.clamp(-p.max_speed, p.max_speed);
        p.anim = PlayerAnim::Walking;
    }

    if input.pressed.jump {
        p.anim = PlayerAnim::Jumping;
        p.body.velocity.y = -t.jump_speed;
        p.body.resting = false;
        p.jump.time = 0.0;
        p.jump.is_jumping = true;
        p.jump.has_control = true;
        p.jump.button_still_down = true;
        true
    } else {
        p.jump.button_still_down = false;
        false
    }
}

fn air_control(p: &mut Player, input: &FrameInput, t: &PlayerTuning, dt: f32) {
    let scale = REFERENCE_HZ * dt;

    if p.jump.is_jumping {
        p.anim = PlayerAnim::Jumping;
        if p.body.bumped_head {
            p.jump.has_control = false;
            p.body.velocity.y = BUMP_SPEED_UPWARD;
        }

        if p.jump.has_control && input.held.jump {
            p.body.velocity.y -= t.jump_thrust * scale;
            p.jump.time += dt;
            if p.jump.time > t.max_jump_time {
                p.jump.has_control = false;
            }
        } else if p.jump.has_control {
            // Released early: cut the rise short.
            if p.body.velocity.y < 0.0 {
                p.body.velocity.y *= t.early_release * scale;
            }
            p.jump.has_control = false;
            p.jump.button_still_down = false;
        }
    } else {
        p.anim = PlayerAnim::Falling;
    }

    let accel = p.body.base_speed * t.air_control * scale;
    if input.held.left {
        p.body.velocity.x = (p.body.velocity.x - accel).max(-p.max_speed);
    }
    if input.held.right {
        p.body.velocity.x = (p.body.velocity.x + accel).min(p.max_speed);
    }
}

/// Ground friction toward zero without overshooting.
pub fn slow_to_stop(body: &mut MovementState, friction: f32, dt: f32) {
    let decel = friction * REFERENCE_HZ * dt;
    let vx = body.velocity.x;
    if vx > 0.0 {
        body.velocity.x = (vx - decel).max(0.0);
    } else if vx < 0.0 {
        body.velocity.x = (vx + decel).min(0.0);
    }
}

/// Hitbox in front of the player, raised toward head height.
pub fn melee_swing(position: Vec2, facing: Facing, t: &PlayerTuning) -> AttackRequest {
    let offset = match facing {
        Facing::Right => t.attack_reach,
        Facing::Left => -t.attack_reach - t.attack_width,
    };
    AttackRequest {
        position: Vec2::new(position.x + offset, position.y - t.attack_rise),
        hitbox: Rect::new(0.0, 0.0, t.attack_width, t.attack_height),
        duration: t.attack_duration,
    }
}
