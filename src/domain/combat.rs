/// Combat model: hurt boxes, attacks, damage and the three combat timers.
///
/// ## Timers
///
/// Every combatant carries three independent phase timers:
///   - **attack**     — active while an attack is in progress (cooldown)
///   - **hit-stun**   — active after being hit; the combatant loses control
///   - **invincible** — active after being hit; further attacks are ignored
///
/// An inactive timer holds its full duration. Starting it only raises the
/// flag; ticking counts it down and, at ≤0, drops the flag and reloads the
/// full duration so the next activation starts fresh. A dead combatant's
/// timers are frozen.
///
/// ## Hits
///
/// Attack vs. combatant is an inclusive AABB test between the attack's
/// world hitbox and the combatant's world hurtbox. The owner of an attack,
/// invincible combatants and the dead are never hit. Every hit removes
/// exactly one hit point (the attack power scalar is carried but unused).

use glam::Vec2;

use super::entity::{ActorId, MovementState};
use super::geom::Rect;

/// Knockback speed applied on both axes when hit.
pub const KNOCKBACK_SPEED: f32 = 75.0;

/// Hit points removed per hit.
pub const HIT_DAMAGE: i32 = 1;

/// Duration marking an attack as persistent (never expires on its own).
pub const PERSISTENT: f32 = -1.0;

/// Remaining time persistent attacks are re-armed to every frame.
const PERSISTENT_REARM: f32 = 1000.0;

// ══════════════════════════════════════════════════════════════
// Phase timer
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseTimer {
    pub active: bool,
    pub duration: f32,
    pub remaining: f32,
}

impl PhaseTimer {
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(0.0);
        PhaseTimer { active: false, duration, remaining: duration }
    }

    /// Raise the flag. A timer that is already running keeps its remaining time.
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Drop the flag and reload the full duration.
    pub fn reset(&mut self) {
        self.active = false;
        self.remaining = self.duration;
    }

    /// Count down by `dt`. Returns true on the tick the timer runs out.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.reset();
            return true;
        }
        false
    }
}

// ══════════════════════════════════════════════════════════════
// Combat state
// ══════════════════════════════════════════════════════════════

/// Archetype numbers a `CombatState` is built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatProfile {
    pub hit_points: i32,
    pub attack_power: f32,
    pub hurtbox: Rect,
    pub cooldown: f32,
    pub hit_stun: f32,
    pub invincible: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CombatState {
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub attack_power: f32,
    /// Local offset from `hurt_pos`.
    pub hurtbox: Rect,
    /// World anchor of the hurtbox (the owner's position, refreshed each frame).
    pub hurt_pos: Vec2,
    pub attack: PhaseTimer,
    pub hit_stun: PhaseTimer,
    pub invincible: PhaseTimer,
    pub dead: bool,
}

impl CombatState {
    pub fn new(profile: &CombatProfile) -> Self {
        let hit_points = profile.hit_points.max(1);
        CombatState {
            hit_points,
            max_hit_points: hit_points,
            attack_power: profile.attack_power,
            hurtbox: profile.hurtbox,
            hurt_pos: Vec2::ZERO,
            attack: PhaseTimer::new(profile.cooldown),
            hit_stun: PhaseTimer::new(profile.hit_stun),
            invincible: PhaseTimer::new(profile.invincible),
            dead: false,
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.attack.active
    }

    pub fn in_hit_stun(&self) -> bool {
        self.hit_stun.active
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible.active
    }

    /// Advance all three timers. Frozen once dead.
    pub fn advance_timers(&mut self, dt: f32) {
        if self.dead {
            return;
        }
        self.attack.tick(dt);
        self.hit_stun.tick(dt);
        self.invincible.tick(dt);
    }

    /// Move the hurtbox anchor to the owner's position.
    pub fn track(&mut self, position: Vec2) {
        self.hurt_pos = position;
    }

    pub fn world_hurtbox(&self) -> Rect {
        self.hurtbox.translated(self.hurt_pos)
    }

    /// Bring a combatant back: full health if dead, all timers idle.
    pub fn revive(&mut self) {
        if self.dead {
            self.hit_points = self.max_hit_points;
            self.dead = false;
        }
        self.attack.reset();
        self.hit_stun.reset();
        self.invincible.reset();
    }
}

// ══════════════════════════════════════════════════════════════
// Attacks
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct AttackId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub struct Attack {
    pub id: AttackId,
    /// The combatant this attack can never hit.
    pub owner: ActorId,
    pub position: Vec2,
    /// Local offset from `position`.
    pub hitbox: Rect,
    /// Configured lifetime; `PERSISTENT` for touch attacks.
    pub duration: f32,
    pub remaining: f32,
}

impl Attack {
    /// Short-lived attack. Negative durations are normalized to zero (expire on first tick).
    pub fn timed(id: AttackId, owner: ActorId, position: Vec2, hitbox: Rect, duration: f32) -> Self {
        let duration = duration.max(0.0);
        Attack { id, owner, position, hitbox, duration, remaining: duration }
    }

    /// Touch attack: lives as long as its owner does.
    pub fn persistent(id: AttackId, owner: ActorId, position: Vec2, hitbox: Rect) -> Self {
        Attack { id, owner, position, hitbox, duration: PERSISTENT, remaining: PERSISTENT_REARM }
    }

    pub fn is_persistent(&self) -> bool {
        self.duration == PERSISTENT
    }

    pub fn world_hitbox(&self) -> Rect {
        self.hitbox.translated(self.position)
    }

    /// Age the attack by `dt`. Returns true once it has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.is_persistent() {
            self.remaining = PERSISTENT_REARM;
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }
}

// ══════════════════════════════════════════════════════════════
// Hit resolution
// ══════════════════════════════════════════════════════════════

/// Result of a landed hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// +1 when the target sits left of the hitbox (knocked left), −1 otherwise.
    pub direction: f32,
    pub hit_points: i32,
    pub killed: bool,
}

/// Test one attack against one combatant and apply the hit if it lands.
pub fn try_hit(
    attack: &Attack,
    target: ActorId,
    body: &mut MovementState,
    combat: &mut CombatState,
) -> Option<Hit> {
    if combat.dead { return None; }
    if attack.owner == target { return None; }
    if combat.is_invincible() { return None; }

    let hurt = combat.world_hurtbox();
    let hit = attack.world_hitbox();
    if !hit.intersects(&hurt) {
        return None;
    }

    let direction = if hurt.x - hit.x < 0.0 { 1.0 } else { -1.0 };
    Some(apply_hit(body, combat, direction))
}

/// Knockback, hit-stun, invincibility and one point of damage.
pub fn apply_hit(body: &mut MovementState, combat: &mut CombatState, direction: f32) -> Hit {
    combat.hit_stun.start();
    combat.invincible.start();
    body.velocity.y = -KNOCKBACK_SPEED;
    body.velocity.x = -KNOCKBACK_SPEED * direction;
    body.resting = false;

    combat.hit_points = (combat.hit_points - HIT_DAMAGE).max(0);
    if combat.hit_points <= 0 {
        combat.dead = true;
        body.no_clip = true;
    }

    Hit { direction, hit_points: combat.hit_points, killed: combat.dead }
}
