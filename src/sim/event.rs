/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound.

use crate::domain::combat::AttackId;
use crate::domain::entity::{ActorId, EnemyId};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    AttackSpawned { id: AttackId, owner: ActorId },
    AttackExpired { id: AttackId },
    ActorHit { target: ActorId, by: ActorId, hit_points: i32 },
    ActorKilled { target: ActorId },
    PlayerJumped { slot: usize },
    PlayerAppeared { slot: usize },
    PlayerDeparted { slot: usize, won: bool },
    EnemyDespawned { id: EnemyId },
    FlagClaimed { slot: usize },
    FlagContested { owner: usize },
    FlagReleased,
    FlagCaptured { slot: usize },
    ExitReached { slot: usize },
}
