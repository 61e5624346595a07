/// The step function: advances a level by one fixed timestep.
///
/// Processing order:
///   1. Player control (input → intent, attack spawns)
///   2. Player movement (sub-stepped integrate + collide)
///   3. Player timers, hurtboxes, respawn countdown, exit line
///   4. Enemies (AI → integrate → collide, timers, hurtboxes)
///   5. Touch attacks follow their owners
///   6. Attacks vs. combatants (back to front), expiry, corpse cleanup
///   7. Objective
///
/// Players always go before enemies, and enemies before attack resolution.
/// Once the level has an outcome the step is a no-op.

use log::{debug, info, trace};

use crate::domain::combat;
use crate::domain::entity::{ActorId, Departure, EnemyId, FrameInput, PlayerAnim};
use crate::domain::physics;
use crate::domain::rules;
use super::event::GameEvent;
use super::objective::Contender;
use super::world::{Level, Outcome};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Longest timestep a single call will simulate; longer frames are cut short.
pub const MAX_DT: f32 = 0.25;

/// `inputs[slot]` is that player's input; missing slots read as idle.
pub fn step(level: &mut Level, inputs: &[FrameInput], dt: f32) -> Vec<GameEvent> {
    if level.outcome.is_some() { return vec![]; }

    let dt = dt.max(0.0).min(MAX_DT);
    let mut events: Vec<GameEvent> = Vec::new();
    level.frame += 1;
    level.time += dt;

    resolve_player_control(level, inputs, dt, &mut events);
    resolve_player_movement(level, dt);
    resolve_player_timers(level, dt, &mut events);
    resolve_enemies(level, dt);
    resolve_touch_attacks(level);
    resolve_attacks(level, dt, &mut events);
    resolve_corpses(level, &mut events);
    resolve_objective(level, dt, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Players
// ══════════════════════════════════════════════════════════════

fn resolve_player_control(level: &mut Level, inputs: &[FrameInput], dt: f32, events: &mut Vec<GameEvent>) {
    for slot in 0..level.players.len() {
        let p = &mut level.players[slot];
        if !p.is_active() { continue; }

        let input = inputs.get(slot).copied().unwrap_or_default();
        let ctl = rules::control_player(p, &input, &level.config.player, dt);
        let owner = p.id();

        if ctl.appeared {
            events.push(GameEvent::PlayerAppeared { slot });
        }
        if ctl.jumped {
            events.push(GameEvent::PlayerJumped { slot });
        }
        if let Some(req) = ctl.attack {
            let id = level.spawn_attack(owner, req);
            trace!("player {} swings ({:?})", slot + 1, id);
            events.push(GameEvent::AttackSpawned { id, owner });
        }
    }
}

fn resolve_player_movement(level: &mut Level, dt: f32) {
    for p in level.players.iter_mut().filter(|p| p.is_active()) {
        physics::advance_substepped(&level.grid, &p.probe, &mut p.body, dt);
    }
}

fn resolve_player_timers(level: &mut Level, dt: f32, events: &mut Vec<GameEvent>) {
    for p in level.players.iter_mut().filter(|p| p.is_active()) {
        p.combat.advance_timers(dt);
        p.combat.track(p.body.position);

        if let Some(remaining) = p.respawn_timer {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                p.respawn_timer = None;
                p.departure = Some(Departure { won: false });
                info!("player {} is out", p.slot + 1);
                events.push(GameEvent::PlayerDeparted { slot: p.slot, won: false });
            } else {
                p.respawn_timer = Some(remaining);
            }
            continue;
        }

        if !p.combat.dead && level.objective.crossed_exit(p.body.position.x) {
            p.departure = Some(Departure { won: true });
            info!("player {} reached the exit at x {:.1}", p.slot + 1, p.body.position.x);
            events.push(GameEvent::ExitReached { slot: p.slot });
            events.push(GameEvent::PlayerDeparted { slot: p.slot, won: true });
            if level.outcome.is_none() {
                level.outcome = Some(Outcome::ExitReached { slot: p.slot });
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(level: &mut Level, dt: f32) {
    for e in level.enemies.iter_mut() {
        e.combat.advance_timers(dt);
        e.behavior.advance(&mut e.body, &e.combat, &mut e.facing, &level.config.enemy, dt);
        physics::advance(&level.grid, &e.probe, &mut e.body, dt);
        e.combat.track(e.body.position);
    }
}

fn resolve_touch_attacks(level: &mut Level) {
    for e in &level.enemies {
        let Some(id) = e.touch_attack else { continue };
        if let Some(a) = level.attacks.iter_mut().find(|a| a.id == id) {
            a.position = e.body.position;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Attacks
// ══════════════════════════════════════════════════════════════

/// Every live attack against every combatant, newest first. Expired
/// attacks are removed in the same pass.
fn resolve_attacks(level: &mut Level, dt: f32, events: &mut Vec<GameEvent>) {
    let respawn_delay = level.config.player.respawn_delay;
    let mut fallen: Vec<EnemyId> = vec![];

    let mut i = level.attacks.len();
    while i > 0 {
        i -= 1;
        let inert = owner_fallen(level, level.attacks[i].owner);
        let attack = &level.attacks[i];

        for p in level.players.iter_mut().filter(|p| p.is_active() && !inert) {
            let target = p.id();
            let Some(hit) = combat::try_hit(attack, target, &mut p.body, &mut p.combat) else { continue };
            debug!("player {} hit by {:?}, {} hp left", p.slot + 1, attack.owner, hit.hit_points);
            events.push(GameEvent::ActorHit { target, by: attack.owner, hit_points: hit.hit_points });
            if hit.killed {
                p.anim = PlayerAnim::Dead;
                p.respawn_timer = Some(respawn_delay);
                info!("player {} was knocked out", p.slot + 1);
                events.push(GameEvent::ActorKilled { target });
            }
        }

        for e in level.enemies.iter_mut().filter(|_| !inert) {
            let target = e.actor_id();
            let Some(hit) = combat::try_hit(attack, target, &mut e.body, &mut e.combat) else { continue };
            debug!("{} {:?} hit by {:?}, {} hp left", e.kind.name(), e.id, attack.owner, hit.hit_points);
            events.push(GameEvent::ActorHit { target, by: attack.owner, hit_points: hit.hit_points });
            if hit.killed {
                events.push(GameEvent::ActorKilled { target });
                fallen.push(e.id);
            }
        }

        if level.attacks[i].tick(dt) {
            let expired = level.attacks.remove(i);
            trace!("attack {:?} expired", expired.id);
            events.push(GameEvent::AttackExpired { id: expired.id });
        }
    }

    // A touch attack only lives as long as its owner.
    for id in fallen {
        let Some(e) = level.enemies.iter_mut().find(|e| e.id == id) else { continue };
        if let Some(touch) = e.touch_attack.take() {
            level.attacks.retain(|a| a.id != touch);
            events.push(GameEvent::AttackExpired { id: touch });
        }
    }
}

/// An enemy's attacks stop landing the moment it dies, even when its
/// touch attack has not been swept yet.
fn owner_fallen(level: &Level, owner: ActorId) -> bool {
    match owner {
        ActorId::Enemy(id) => level.enemies.iter().any(|e| e.id == id && e.combat.dead),
        ActorId::Player(_) => false,
    }
}

/// Dead enemies fall through the map; drop them once well below it.
fn resolve_corpses(level: &mut Level, events: &mut Vec<GameEvent>) {
    let floor = level.grid.world_size().y + level.config.enemy.despawn_depth;
    level.enemies.retain(|e| {
        let gone = e.combat.dead && e.body.position.y > floor;
        if gone {
            debug!("{} {:?} despawned", e.kind.name(), e.id);
            events.push(GameEvent::EnemyDespawned { id: e.id });
        }
        !gone
    });
}

// ══════════════════════════════════════════════════════════════
// Objective
// ══════════════════════════════════════════════════════════════

fn resolve_objective(level: &mut Level, dt: f32, events: &mut Vec<GameEvent>) {
    if level.outcome.is_none() {
        let contenders: Vec<Contender> = level
            .players
            .iter()
            .filter(|p| p.is_active() && !p.combat.dead)
            .map(|p| Contender { slot: p.slot, x: p.body.position.x })
            .collect();
        let multiplayer = level.config.multiplayer();
        if let Some(slot) = level.objective.evaluate_flag(&contenders, multiplayer, &level.config.flag, dt, events) {
            level.outcome = Some(Outcome::FlagCaptured { slot });
        }
    }

    if level.outcome.is_none() && level.players.iter().all(|p| !p.is_active()) {
        level.outcome = Some(Outcome::AllDeparted);
    }

    if let Some(outcome) = level.outcome {
        match outcome.winner() {
            Some(slot) => info!("level '{}' won by player {} ({:?})", level.name, slot + 1, outcome),
            None => info!("level '{}' over: nobody won", level.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::domain::ai::Behavior;
    use crate::domain::combat::AttackId;
    use crate::domain::entity::{Buttons, EnemyKind};
    use crate::domain::geom::Rect;
    use crate::domain::rules::AttackRequest;
    use glam::Vec2;
    use crate::sim::level::{parse_level, SymbolTable, Theme};

    const DT: f32 = 1.0 / 60.0;

    /// Flat floor at row 6 (y = 48), wall at column 0.
    fn strip(enemies: &str) -> String {
        let width = 100;
        let mut rows = vec![];
        for _ in 0..5 {
            rows.push(format!("X{}", "-".repeat(width - 1)));
        }
        let mut row5 = format!("X{}", "-".repeat(width - 1));
        for (col, ch) in enemies.chars().enumerate().filter(|(_, c)| *c != '-') {
            row5.replace_range(col..col + 1, &ch.to_string());
        }
        rows.push(row5);
        rows.push("X".repeat(width));
        rows.push("X".repeat(width));
        rows.join("\n")
    }

    fn level_with(enemies: &str, config: SimConfig) -> Level {
        let def = parse_level(&strip(enemies)).expect("parse");
        Level::new(Theme::Rough, &def, &SymbolTable::standard(), config).expect("level")
    }

    fn idle() -> Vec<FrameInput> {
        vec![FrameInput::default(); 4]
    }

    fn run(level: &mut Level, inputs: &[FrameInput], frames: usize) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..frames {
            all.extend(step(level, inputs, DT));
        }
        all
    }

    /// Step until every player has finished arriving.
    fn settle(level: &mut Level) -> Vec<GameEvent> {
        run(level, &idle(), 60)
    }

    fn holding(f: impl Fn(&mut Buttons)) -> Vec<FrameInput> {
        let mut input = FrameInput::default();
        f(&mut input.held);
        vec![input]
    }

    fn pressing(f: impl Fn(&mut Buttons)) -> Vec<FrameInput> {
        let mut input = FrameInput::default();
        f(&mut input.held);
        f(&mut input.pressed);
        vec![input]
    }

    #[test]
    fn player_arrives_then_lands() {
        let mut lvl = level_with("", SimConfig::default());
        let events = settle(&mut lvl);
        assert!(events.contains(&GameEvent::PlayerAppeared { slot: 0 }));
        let p = &lvl.players[0];
        assert_eq!(p.anim, PlayerAnim::Standing);
        assert!(p.body.resting);
        assert_eq!(p.body.velocity.y, 0.0);
        assert!((p.body.position.y - 37.0).abs() < 0.1, "y = {}", p.body.position.y);
    }

    #[test]
    fn input_is_ignored_while_arriving() {
        let mut lvl = level_with("", SimConfig::default());
        run(&mut lvl, &holding(|b| b.right = true), 10);
        assert_eq!(lvl.players[0].body.position.x, 140.0);
    }

    #[test]
    fn walking_right_moves_and_faces() {
        let mut lvl = level_with("", SimConfig::default());
        settle(&mut lvl);
        run(&mut lvl, &holding(|b| b.right = true), 30);
        let p = &lvl.players[0];
        assert!(p.body.position.x > 150.0);
        assert_eq!(p.anim, PlayerAnim::Walking);
        assert!(p.body.velocity.x <= 72.0);
    }

    #[test]
    fn jump_emits_event_and_leaves_ground() {
        let mut lvl = level_with("", SimConfig::default());
        settle(&mut lvl);
        let events = step(&mut lvl, &pressing(|b| b.jump = true), DT);
        assert!(events.contains(&GameEvent::PlayerJumped { slot: 0 }));
        assert!(!lvl.players[0].body.resting);
        assert!(lvl.players[0].body.velocity.y < 0.0);

        // Comes back down onto the floor.
        run(&mut lvl, &idle(), 120);
        assert!(lvl.players[0].body.resting);
        assert!(lvl.players[0].body.position.y < 40.0);
    }

    #[test]
    fn swing_spawns_and_expires() {
        let mut lvl = level_with("", SimConfig::default());
        settle(&mut lvl);
        let before = lvl.attacks.len();
        let events = step(&mut lvl, &pressing(|b| b.attack = true), DT);
        let spawned: Vec<AttackId> = events.iter().filter_map(|e| match e {
            GameEvent::AttackSpawned { id, owner: ActorId::Player(0) } => Some(*id),
            _ => None,
        }).collect();
        assert_eq!(spawned.len(), 1);
        assert_eq!(lvl.attacks.len(), before + 1);

        let later = run(&mut lvl, &idle(), 10);
        assert!(later.contains(&GameEvent::AttackExpired { id: spawned[0] }));
        assert_eq!(lvl.attacks.len(), before);
    }

    #[test]
    fn melee_kills_ghoul_and_removes_touch_attack() {
        // Ghoul right in front of the spawn point, facing away.
        let mut cfg = SimConfig::default();
        cfg.enemy.patrol_speed = 0.0;
        let mut lvl = level_with(&format!("{}G", "-".repeat(20)), cfg);
        lvl.players[0].combat.invincible.start();
        lvl.players[0].combat.invincible.duration = 100.0;
        lvl.players[0].combat.invincible.remaining = 100.0;
        settle(&mut lvl);
        let ghoul = lvl.enemies[0].id;
        let touch = lvl.enemies[0].touch_attack.expect("touch");

        // Walk up to it, then swing.
        let mut events = vec![];
        for _ in 0..120 {
            let gap = lvl.enemies[0].body.position.x - lvl.players[0].body.position.x;
            let input = if gap > 12.0 { holding(|b| b.right = true) } else { pressing(|b| b.attack = true) };
            events.extend(step(&mut lvl, &input, DT));
            if lvl.enemies.first().map_or(true, |e| e.combat.dead) { break; }
        }

        assert!(events.contains(&GameEvent::ActorKilled { target: ActorId::Enemy(ghoul) }));
        assert!(events.contains(&GameEvent::AttackExpired { id: touch }));
        assert!(lvl.attack(touch).is_none());
        let e = lvl.enemy(ghoul).expect("corpse still falling");
        assert!(e.body.no_clip);
        assert_eq!(e.touch_attack, None);
    }

    #[test]
    fn corpse_despawns_below_the_map() {
        let mut lvl = level_with(&format!("{}S", "-".repeat(60)), SimConfig::default());
        let id = lvl.enemies[0].id;
        let e = &mut lvl.enemies[0];
        combat::apply_hit(&mut e.body, &mut e.combat, 1.0);
        combat::apply_hit(&mut e.body, &mut e.combat, 1.0);
        assert!(e.combat.dead);

        let events = run(&mut lvl, &idle(), 240);
        assert!(events.contains(&GameEvent::EnemyDespawned { id }));
        assert!(lvl.enemy(id).is_none());
    }

    #[test]
    fn touch_attack_tracks_its_enemy() {
        let mut lvl = level_with(&format!("{}G", "-".repeat(60)), SimConfig::default());
        run(&mut lvl, &idle(), 30);
        let e = &lvl.enemies[0];
        let a = lvl.attack(e.touch_attack.expect("touch")).expect("live");
        assert_eq!(a.position, e.body.position);
        assert!(e.body.position.x < 480.0);
    }

    #[test]
    fn enemy_contact_hurts_player_and_death_leads_to_departure() {
        let mut cfg = SimConfig::default();
        cfg.player.hit_points = 1;
        let mut lvl = level_with("", cfg);
        settle(&mut lvl);
        let pos = lvl.players[0].body.position;
        let req = AttackRequest { position: pos, hitbox: Rect::new(-4.0, -4.0, 8.0, 8.0), duration: 0.1 };
        lvl.spawn_attack(ActorId::Enemy(EnemyId(99)), req);

        let events = step(&mut lvl, &idle(), DT);
        assert!(events.contains(&GameEvent::ActorKilled { target: ActorId::Player(0) }));
        assert_eq!(lvl.players[0].anim, PlayerAnim::Dead);
        assert!(lvl.players[0].respawn_timer.is_some());

        let events = run(&mut lvl, &idle(), 100);
        assert!(events.contains(&GameEvent::PlayerDeparted { slot: 0, won: false }));
        assert!(!lvl.players[0].is_active());
        assert_eq!(lvl.outcome, Some(Outcome::AllDeparted));
    }

    #[test]
    fn own_swing_never_hits_self() {
        let mut lvl = level_with("", SimConfig::default());
        settle(&mut lvl);
        let pos = lvl.players[0].body.position;
        let req = AttackRequest { position: pos, hitbox: Rect::new(-20.0, -20.0, 40.0, 40.0), duration: 0.5 };
        lvl.spawn_attack(ActorId::Player(0), req);
        let events = run(&mut lvl, &idle(), 10);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::ActorHit { .. })));
        assert_eq!(lvl.players[0].combat.hit_points, 5);
    }

    #[test]
    fn crossing_exit_wins_and_freezes_level() {
        let mut lvl = level_with("", SimConfig::default());
        settle(&mut lvl);
        lvl.objective.win_x = 200.0;
        let mut events = vec![];
        for _ in 0..300 {
            events.extend(step(&mut lvl, &holding(|b| b.right = true), DT));
            if lvl.is_over() { break; }
        }
        assert_eq!(lvl.outcome, Some(Outcome::ExitReached { slot: 0 }));
        assert!(events.contains(&GameEvent::PlayerDeparted { slot: 0, won: true }));

        let frame = lvl.frame;
        assert!(step(&mut lvl, &idle(), DT).is_empty());
        assert_eq!(lvl.frame, frame);
    }

    #[test]
    fn departed_player_is_frozen_until_readmitted() {
        let mut lvl = level_with("", SimConfig::with_players(2));
        settle(&mut lvl);
        lvl.players[1].departure = Some(Departure { won: false });
        let parked = lvl.players[1].body.position;
        let mut inputs = idle();
        inputs[1].held.right = true;
        run(&mut lvl, &inputs, 30);
        assert_eq!(lvl.players[1].body.position, parked);

        lvl.add_player(1).expect("slot");
        let events = settle(&mut lvl);
        assert!(events.contains(&GameEvent::PlayerAppeared { slot: 1 }));
    }

    #[test]
    fn missing_inputs_read_as_idle() {
        let mut lvl = level_with("", SimConfig::with_players(3));
        let events = run(&mut lvl, &[], 60);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::PlayerAppeared { .. })).count(), 3);
    }

    #[test]
    fn ghost_orbits_without_collision() {
        let mut lvl = level_with(&format!("{}H", "-".repeat(50)), SimConfig::default());
        let start = lvl.enemies[0].body.position;
        run(&mut lvl, &idle(), 90);
        let e = &lvl.enemies[0];
        assert_eq!(e.kind, EnemyKind::Ghost);
        assert!(e.body.no_clip);
        assert!(e.body.position.distance(start) > 1.0);
        assert!(e.body.position.distance(start) <= 2.0 * 48.0 + 0.5);
    }

    #[test]
    fn ghost_returns_to_its_orbit_after_hit_stun() {
        let mut lvl = level_with(&format!("{}H", "-".repeat(50)), SimConfig::default());
        run(&mut lvl, &idle(), 20);
        let e = &mut lvl.enemies[0];
        combat::apply_hit(&mut e.body, &mut e.combat, 1.0);
        assert!(!e.combat.dead);

        run(&mut lvl, &idle(), 120);
        let e = &lvl.enemies[0];
        assert!(!e.combat.in_hit_stun());
        let Behavior::Hover { anchor, phase } = e.behavior else { panic!("not hovering") };
        let r = lvl.config.enemy.hover_radius;
        let orbit = Vec2::new(anchor.x + r * (1.0 - phase.cos()), anchor.y + r * phase.sin());
        assert!(e.body.position.distance(orbit) < 1e-3, "{:?} vs {:?}", e.body.position, orbit);
        assert_eq!(e.body.velocity, Vec2::ZERO);
    }

    #[test]
    fn touch_attack_of_enemy_killed_this_frame_does_not_land() {
        let mut cfg = SimConfig::default();
        cfg.enemy.patrol_speed = 0.0;
        let mut lvl = level_with(&format!("{}G", "-".repeat(60)), cfg);
        settle(&mut lvl);

        // Stand inside the ghoul and swing at it in the same frame.
        let ghoul = lvl.enemies[0].id;
        let at = lvl.enemies[0].body.position;
        lvl.players[0].body.position.x = at.x;
        let req = AttackRequest { position: at, hitbox: Rect::new(-8.0, -8.0, 16.0, 16.0), duration: 0.2 };
        lvl.spawn_attack(ActorId::Player(0), req);

        let events = step(&mut lvl, &idle(), DT);
        assert!(events.contains(&GameEvent::ActorKilled { target: ActorId::Enemy(ghoul) }));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::ActorHit { target: ActorId::Player(0), .. })));
        assert_eq!(lvl.players[0].combat.hit_points, 5);
    }

    #[test]
    fn oversized_timestep_is_capped() {
        let mut lvl = level_with("", SimConfig::default());
        settle(&mut lvl);
        let t = lvl.time;
        step(&mut lvl, &idle(), 1.0e9);
        step(&mut lvl, &idle(), f32::INFINITY);
        assert!((lvl.time - (t + 2.0 * MAX_DT)).abs() < 1e-4);
        assert!(lvl.players[0].body.position.is_finite());
        assert!(lvl.players[0].body.resting);
    }
}
