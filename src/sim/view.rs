/// Read-only presentation snapshot, built once per frame after the step.

use glam::Vec2;

use crate::domain::entity::{ActorId, Enemy, Facing, Player};
use crate::domain::geom::Rect;
use super::world::{Level, Outcome};

#[derive(Clone, Debug, PartialEq)]
pub struct ActorView {
    pub id: ActorId,
    pub position: Vec2,
    pub facing: Facing,
    pub anim: &'static str,
    pub hit_points: i32,
    pub invincible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveView {
    pub win_x: f32,
    pub flag: Option<Vec2>,
    pub owner: Option<usize>,
    pub progress: f32,
    pub progress_max: f32,
    pub contested: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameView {
    pub frame: u64,
    pub time: f32,
    pub players: Vec<ActorView>,
    pub enemies: Vec<ActorView>,
    /// World hitbox of every live attack.
    pub attacks: Vec<Rect>,
    /// World hurtboxes of living combatants; empty unless hitboxes are shown.
    pub hurtboxes: Vec<Rect>,
    pub objective: ObjectiveView,
    pub outcome: Option<Outcome>,
}

impl FrameView {
    /// Where a camera should look: the centroid of the active players.
    pub fn focus(&self) -> Option<Vec2> {
        if self.players.is_empty() {
            return None;
        }
        let sum: Vec2 = self.players.iter().map(|p| p.position).sum();
        Some(sum / self.players.len() as f32)
    }
}

fn player_view(p: &Player) -> ActorView {
    ActorView {
        id: p.id(),
        position: p.body.position,
        facing: p.facing,
        anim: p.anim.label(),
        hit_points: p.combat.hit_points,
        invincible: p.combat.is_invincible(),
    }
}

fn enemy_view(e: &Enemy) -> ActorView {
    let anim = if e.combat.dead {
        "dead"
    } else if e.combat.in_hit_stun() {
        "hitStun"
    } else {
        e.behavior.label()
    };
    ActorView {
        id: e.actor_id(),
        position: e.body.position,
        facing: e.facing,
        anim,
        hit_points: e.combat.hit_points,
        invincible: e.combat.is_invincible(),
    }
}

impl Level {
    pub fn snapshot(&self) -> FrameView {
        let mut hurtboxes = vec![];
        if self.config.show_hitboxes {
            hurtboxes.extend(self.active_players().filter(|p| !p.combat.dead).map(|p| p.combat.world_hurtbox()));
            hurtboxes.extend(self.enemies.iter().filter(|e| !e.combat.dead).map(|e| e.combat.world_hurtbox()));
        }

        let flag = self.objective.flag.as_ref();
        FrameView {
            frame: self.frame,
            time: self.time,
            players: self.active_players().map(player_view).collect(),
            enemies: self.enemies.iter().map(enemy_view).collect(),
            attacks: self.attacks.iter().map(|a| a.world_hitbox()).collect(),
            hurtboxes,
            objective: ObjectiveView {
                win_x: self.objective.win_x,
                flag: flag.map(|f| f.position),
                owner: flag.and_then(|f| f.owner),
                progress: flag.map_or(0.0, |f| f.progress),
                progress_max: flag.map_or(0.0, |f| f.progress_max),
                contested: flag.map_or(false, |f| f.contested),
            },
            outcome: self.outcome,
        }
    }
}
