/// Level: the complete state of one running level.
///
/// ## Ownership
///
/// The level exclusively owns its tile grid, players, enemies and live
/// attacks. Attacks name their owner by `ActorId`; they never hold a
/// reference to it.
///
///   - `players` — indexed by slot, one per configured player. A departed
///     player stays in the vector (skipped by the step) until re-admitted
///     with `add_player`.
///   - `enemies` — in spawn order. Dead enemies stay until they have
///     fallen well below the map.
///   - `attacks` — live hitboxes. Touch attacks live as long as their
///     owning enemy does.
///
/// Configuration is fixed at construction (`SimConfig` by value).

use glam::Vec2;
use log::{info, trace};

use crate::config::{SimConfig, MAX_PLAYERS};
use crate::domain::combat::{Attack, AttackId};
use crate::domain::entity::{ActorId, Enemy, EnemyId, EnemyKind, Facing, Player, PlayerAnim};
use crate::domain::rules::AttackRequest;
use crate::domain::tile::TileGrid;
use super::level::{build_layout, LevelDef, LevelError, SymbolTable, Theme};
use super::objective::{Flag, Objective};

/// How a level ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    FlagCaptured { slot: usize },
    ExitReached { slot: usize },
    /// Every player left without winning.
    AllDeparted,
}

impl Outcome {
    pub fn winner(self) -> Option<usize> {
        match self {
            Outcome::FlagCaptured { slot } | Outcome::ExitReached { slot } => Some(slot),
            Outcome::AllDeparted => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Level {
    pub theme: Theme,
    pub name: String,
    pub grid: TileGrid,
    pub config: SimConfig,
    pub spawn_point: Vec2,

    // ── Actors ──
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,
    pub attacks: Vec<Attack>,

    // ── Objective ──
    pub objective: Objective,
    pub outcome: Option<Outcome>,

    // ── Clock ──
    pub frame: u64,
    pub time: f32,

    next_enemy: u32,
    next_attack: u32,
}

// ── Construction ──

impl Level {
    /// Build a level from a parsed layout. Every configured player is
    /// admitted and starts waiting at the spawn point.
    pub fn new(theme: Theme, def: &LevelDef, table: &SymbolTable, config: SimConfig) -> Result<Level, LevelError> {
        if config.player_count == 0 || config.player_count > MAX_PLAYERS {
            return Err(LevelError::PlayerCount(config.player_count));
        }
        let layout = build_layout(def, table)?;

        let spawn_point = theme.spawn_point();
        let win_x = theme.exit_line(config.multiplayer());
        let objective = if theme.has_flag() {
            Objective::with_flag(win_x, Flag::new(&config.flag))
        } else {
            Objective::exit(win_x)
        };
        let players = (0..config.player_count)
            .map(|slot| Player::new(slot, spawn_point, &config.player))
            .collect();

        let mut level = Level {
            theme,
            name: def.name.clone(),
            grid: layout.grid,
            config,
            spawn_point,
            players,
            enemies: vec![],
            attacks: vec![],
            objective,
            outcome: None,
            frame: 0,
            time: 0.0,
            next_enemy: 0,
            next_attack: 0,
        };

        for (kind, position) in layout.spawns {
            level.spawn_enemy(kind, position);
        }
        for slot in 0..level.players.len() {
            level.add_player(slot)?;
        }

        info!(
            "level '{}' ready: {}×{} cells ({} solid), {} enemies, {} player(s), exit at x {}{}",
            level.name,
            level.grid.width(),
            level.grid.height(),
            level.grid.solid_count(),
            level.enemies.len(),
            level.players.len(),
            win_x,
            if level.objective.flag.is_some() { ", flag in play" } else { "" },
        );
        Ok(level)
    }

    /// (Re)admit a player: back to the spawn point, full health if dead,
    /// timers idle, then the timed Waiting → Appearing arrival.
    pub fn add_player(&mut self, slot: usize) -> Result<(), LevelError> {
        let spawn = self.spawn_point;
        let wait = self.config.player.wait_time;
        let p = self.players.get_mut(slot).ok_or(LevelError::PlayerSlot(slot))?;

        p.body.position = spawn;
        p.body.velocity = Vec2::ZERO;
        p.body.no_clip = false;
        p.body.resting = false;
        p.body.bumped_head = false;
        p.combat.revive();
        p.combat.track(spawn);
        p.facing = Facing::Right;
        p.jump = Default::default();
        p.anim = PlayerAnim::Waiting { remaining: wait };
        p.respawn_timer = None;
        p.departure = None;

        info!("player {} admitted at ({}, {})", slot + 1, spawn.x, spawn.y);
        Ok(())
    }

    /// Place an enemy and give it its touch attack.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec2) -> EnemyId {
        let id = EnemyId(self.next_enemy);
        self.next_enemy += 1;

        let mut enemy = Enemy::new(id, kind, position, &self.config.enemy);
        let attack = self.alloc_attack_id();
        self.attacks.push(Attack::persistent(attack, enemy.actor_id(), position, kind.touch_box()));
        enemy.touch_attack = Some(attack);
        self.enemies.push(enemy);

        trace!("{} {:?} spawned at ({}, {})", kind.name(), id, position.x, position.y);
        id
    }

    /// Register a short-lived attack.
    pub fn spawn_attack(&mut self, owner: ActorId, req: AttackRequest) -> AttackId {
        let id = self.alloc_attack_id();
        self.attacks.push(Attack::timed(id, owner, req.position, req.hitbox, req.duration));
        id
    }

    fn alloc_attack_id(&mut self) -> AttackId {
        let id = AttackId(self.next_attack);
        self.next_attack = self.next_attack.wrapping_add(1);
        id
    }
}

// ── Queries ──

impl Level {
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn attack(&self, id: AttackId) -> Option<&Attack> {
        self.attacks.iter().find(|a| a.id == id)
    }

    /// Enemies still alive.
    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| !e.combat.dead).count()
    }
}
