/// Entities: Player and Enemy, plus the pieces they are composed of.
///
/// An actor is MovementState + CollisionProbe + CombatState + a small
/// animation/behaviour label. Movement and combat state are shared by
/// every archetype; only the probe layout, the combat profile and (for
/// enemies) the behaviour differ.

use glam::Vec2;

use crate::config::{EnemyTuning, PlayerTuning};
use super::ai::Behavior;
use super::combat::{AttackId, CombatProfile, CombatState};
use super::geom::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// −1 for left, +1 for right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EnemyId(pub u32);

/// Stable identity of a combatant. Attacks name their owner by this,
/// so self-hit exclusion is an identity comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ActorId {
    Player(usize),
    Enemy(EnemyId),
}

// ══════════════════════════════════════════════════════════════
// Input
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Buttons {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub start: bool,
    pub jump: bool,
    pub attack: bool,
}

/// One player slot's input for one step: held state plus edge-triggered
/// presses. Read-only to the simulation; the input layer clears `pressed`
/// between steps.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub held: Buttons,
    pub pressed: Buttons,
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct MovementState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Standing on a surface.
    pub resting: bool,
    /// Skip collision entirely (death, hovering).
    pub no_clip: bool,
    /// Hit a ceiling during the last collision pass.
    pub bumped_head: bool,
    pub ignore_gravity: bool,
    pub base_speed: f32,
}

impl MovementState {
    pub fn at(position: Vec2, base_speed: f32) -> Self {
        MovementState {
            position,
            velocity: Vec2::ZERO,
            resting: false,
            no_clip: false,
            bumped_head: false,
            ignore_gravity: false,
            base_speed,
        }
    }
}

/// Local sample points on each side of an actor, tested against the tile
/// grid. Fixed for the actor's lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionProbe {
    pub top: &'static [Vec2],
    pub bottom: &'static [Vec2],
    pub left: &'static [Vec2],
    pub right: &'static [Vec2],
}

impl CollisionProbe {
    pub const PLAYER: CollisionProbe = CollisionProbe {
        top: &[Vec2::new(-4.0, -10.0), Vec2::new(4.0, -10.0)],
        bottom: &[Vec2::new(-4.0, 12.0), Vec2::new(4.0, 12.0)],
        left: &[Vec2::new(-5.0, 5.0), Vec2::new(-5.0, -8.0)],
        right: &[Vec2::new(5.0, 5.0), Vec2::new(5.0, -8.0)],
    };

    /// Shared by every enemy archetype. No head probes: enemies never bonk.
    pub const ENEMY: CollisionProbe = CollisionProbe {
        top: &[],
        bottom: &[Vec2::new(-3.0, 9.0), Vec2::new(2.0, 9.0)],
        left: &[Vec2::new(-4.0, 5.0)],
        right: &[Vec2::new(3.0, 5.0)],
    };
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Player animation state. The arrival states carry their own countdown
/// and are advanced by the fixed-step clock.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PlayerAnim {
    Standing,
    Walking,
    Jumping,
    Falling,
    Attacking,
    HitStun,
    Dead,
    Waiting { remaining: f32 },
    Appearing { remaining: f32 },
}

impl PlayerAnim {
    /// Still entering the level: no input is processed.
    pub fn is_arriving(&self) -> bool {
        matches!(self, PlayerAnim::Waiting { .. } | PlayerAnim::Appearing { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlayerAnim::Standing => "standing",
            PlayerAnim::Walking => "walking",
            PlayerAnim::Jumping => "jumping",
            PlayerAnim::Falling => "falling",
            PlayerAnim::Attacking => "attacking",
            PlayerAnim::HitStun => "hitStun",
            PlayerAnim::Dead => "dead",
            PlayerAnim::Waiting { .. } => "waiting",
            PlayerAnim::Appearing { .. } => "appearing",
        }
    }
}

/// Variable-height jump bookkeeping.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct JumpControl {
    pub is_jumping: bool,
    /// Holding jump still adds upward thrust.
    pub has_control: bool,
    pub time: f32,
    pub button_still_down: bool,
}

pub const PLAYER_HURTBOX: Rect = Rect::new(-9.0, -10.0, 18.0, 20.0);

pub fn player_profile(t: &PlayerTuning) -> CombatProfile {
    CombatProfile {
        hit_points: t.hit_points,
        attack_power: t.attack_power,
        hurtbox: PLAYER_HURTBOX,
        cooldown: t.attack_cooldown,
        hit_stun: t.hit_stun,
        invincible: t.invincible,
    }
}

/// Why a player left the level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Departure {
    pub won: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub slot: usize,
    pub body: MovementState,
    pub probe: CollisionProbe,
    pub combat: CombatState,
    pub facing: Facing,
    pub anim: PlayerAnim,
    pub jump: JumpControl,
    pub max_speed: f32,
    /// Counting down after death; departure when it runs out.
    pub respawn_timer: Option<f32>,
    /// Set once the player has left the level; the step skips them.
    pub departure: Option<Departure>,
}

impl Player {
    pub fn new(slot: usize, position: Vec2, t: &PlayerTuning) -> Self {
        let mut combat = CombatState::new(&player_profile(t));
        combat.track(position);
        Player {
            slot,
            body: MovementState::at(position, t.base_speed),
            probe: CollisionProbe::PLAYER,
            combat,
            facing: Facing::Right,
            anim: PlayerAnim::Standing,
            jump: JumpControl::default(),
            max_speed: t.max_speed,
            respawn_timer: None,
            departure: None,
        }
    }

    pub fn id(&self) -> ActorId {
        ActorId::Player(self.slot)
    }

    pub fn is_active(&self) -> bool {
        self.departure.is_none()
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    Ghoul,
    Skeleton,
    Ghost,
}

impl EnemyKind {
    pub fn hit_points(self) -> i32 {
        match self {
            EnemyKind::Ghoul => 1,
            EnemyKind::Skeleton => 2,
            EnemyKind::Ghost => 3,
        }
    }

    pub fn hurtbox(self) -> Rect {
        match self {
            EnemyKind::Ghoul => Rect::new(-6.0, -6.0, 12.0, 13.0),
            EnemyKind::Skeleton | EnemyKind::Ghost => Rect::new(-7.0, -10.0, 14.0, 20.0),
        }
    }

    /// Local hitbox of the persistent touch attack.
    pub fn touch_box(self) -> Rect {
        match self {
            EnemyKind::Ghoul | EnemyKind::Skeleton => Rect::new(-6.0, -4.0, 12.0, 12.0),
            EnemyKind::Ghost => Rect::new(-5.0, -6.0, 10.0, 12.0),
        }
    }

    pub fn profile(self, t: &EnemyTuning) -> CombatProfile {
        CombatProfile {
            hit_points: self.hit_points(),
            attack_power: 1.0,
            hurtbox: self.hurtbox(),
            cooldown: t.attack_cooldown,
            hit_stun: t.hit_stun,
            invincible: t.invincible,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Ghoul => "ghoul",
            EnemyKind::Skeleton => "skeleton",
            EnemyKind::Ghost => "ghost",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub body: MovementState,
    pub probe: CollisionProbe,
    pub combat: CombatState,
    pub facing: Facing,
    pub behavior: Behavior,
    /// The enemy's touch attack while it lives.
    pub touch_attack: Option<AttackId>,
}

impl Enemy {
    pub fn new(id: EnemyId, kind: EnemyKind, position: Vec2, t: &EnemyTuning) -> Self {
        let mut combat = CombatState::new(&kind.profile(t));
        combat.track(position);
        let mut body = MovementState::at(position, t.base_speed);
        let behavior = Behavior::for_kind(kind, position);
        behavior.prepare(&mut body);
        Enemy {
            id,
            kind,
            body,
            probe: CollisionProbe::ENEMY,
            combat,
            facing: Facing::Left,
            behavior,
            touch_attack: None,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        ActorId::Enemy(self.id)
    }
}
