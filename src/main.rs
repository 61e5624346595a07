/// Headless driver: runs one level against wall-clock time with a scripted
/// autopilot and logs what happens.

use std::time::{Duration, Instant};

use glam::Vec2;
use log::{debug, error, info};

use golfbrawl::config::GameConfig;
use golfbrawl::domain::entity::{Buttons, FrameInput, Player};
use golfbrawl::sim::clock::SimClock;
use golfbrawl::sim::event::GameEvent;
use golfbrawl::sim::level::load_level;
use golfbrawl::sim::step;
use golfbrawl::sim::world::Level;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// How close (ahead of the player) an enemy must be to swing at it.
const SWING_RANGE: f32 = 24.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load();

    let mut level = match load_level(&config) {
        Ok(level) => level,
        Err(e) => {
            error!("could not build level: {e}");
            eprintln!("Level error: {e}");
            std::process::exit(1);
        }
    };

    run_loop(&mut level, &config);

    println!();
    println!("{} ({}) after {:.1}s, {} steps", level.name, level.theme.name(), level.time, level.frame);
    match level.outcome.map(|o| (o, o.winner())) {
        Some((o, Some(slot))) => println!("Player {} wins: {:?}", slot + 1, o),
        Some((_, None)) => println!("Nobody made it."),
        None => println!("Still playing when the clock ran out."),
    }
}

fn run_loop(level: &mut Level, config: &GameConfig) {
    let mut clock = SimClock::new(&config.clock);
    info!("stepping at {:.4}s, up to {} catch-up steps per frame", clock.dt(), config.clock.max_steps);
    let mut pilot = Autopilot::new(level.players.len());
    let idle = vec![FrameInput::default(); level.players.len()];

    let started = Instant::now();
    let mut last = started;
    let mut next_status = 1.0;
    let mut tally = Tally::default();

    while !level.is_over() && started.elapsed().as_secs_f32() < config.run.seconds {
        let now = Instant::now();
        let elapsed = now.duration_since(last).as_secs_f32();
        last = now;

        clock.run(elapsed, |dt| {
            let inputs = if config.run.autopilot { pilot.drive(level) } else { idle.clone() };
            let events = step::step(level, &inputs, dt);
            tally.record(&events);
        });

        if level.time >= next_status {
            next_status += 1.0;
            log_status(level, &tally);
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    info!(
        "{} steps: {} swings, {} hits, {} knockouts, {} jumps",
        clock.steps, tally.swings, tally.hits, tally.kills, tally.jumps
    );
}

fn log_status(level: &Level, tally: &Tally) {
    for p in level.active_players() {
        info!(
            "t={:>4.1}s  P{} x={:>6.1} y={:>5.1} hp={} {}",
            level.time,
            p.slot + 1,
            p.body.position.x,
            p.body.position.y,
            p.combat.hit_points,
            p.anim.label(),
        );
    }
    if let Some(flag) = &level.objective.flag {
        info!(
            "t={:>4.1}s  flag owner={:?} progress={:.1}/{:.0}{}",
            level.time,
            flag.owner.map(|s| s + 1),
            flag.progress,
            flag.progress_max,
            if flag.contested { " (contested)" } else { "" },
        );
    }
    if let Some(focus) = level.snapshot().focus() {
        debug!("camera focus ({:.1}, {:.1})", focus.x, focus.y);
    }
    debug!("enemies alive: {}, live attacks: {}, knockouts so far: {}", level.living_enemies(), level.attacks.len(), tally.kills);
}

// ── Event tally ──

#[derive(Default)]
struct Tally {
    swings: u32,
    hits: u32,
    kills: u32,
    jumps: u32,
}

impl Tally {
    fn record(&mut self, events: &[GameEvent]) {
        for e in events {
            debug!("{e:?}");
            match e {
                GameEvent::AttackSpawned { .. } => self.swings += 1,
                GameEvent::ActorHit { .. } => self.hits += 1,
                GameEvent::ActorKilled { .. } => self.kills += 1,
                GameEvent::PlayerJumped { .. } => self.jumps += 1,
                _ => {}
            }
        }
    }
}

// ── Autopilot ──

/// Scripted input: walk right, jump when blocked, swing at enemies ahead.
/// Presses are edge-triggered against the previous step's held state.
struct Autopilot {
    prev: Vec<Buttons>,
}

impl Autopilot {
    fn new(players: usize) -> Self {
        Autopilot { prev: vec![Buttons::default(); players] }
    }

    fn drive(&mut self, level: &Level) -> Vec<FrameInput> {
        let mut inputs = Vec::with_capacity(self.prev.len());
        for (slot, prev) in self.prev.iter_mut().enumerate() {
            let held = match level.players.get(slot) {
                Some(p) if p.is_active() && !p.combat.dead => intent(level, p),
                _ => Buttons::default(),
            };
            let pressed = Buttons {
                up: held.up && !prev.up,
                down: held.down && !prev.down,
                left: held.left && !prev.left,
                right: held.right && !prev.right,
                start: held.start && !prev.start,
                jump: held.jump && !prev.jump,
                attack: held.attack && !prev.attack,
            };
            *prev = held;
            inputs.push(FrameInput { held, pressed });
        }
        inputs
    }
}

fn intent(level: &Level, p: &Player) -> Buttons {
    let pos = p.body.position;
    let mut b = Buttons::default();

    // Hold the flag in multiplayer instead of running past it.
    let camp = level.config.multiplayer()
        && level.objective.flag.as_ref().is_some_and(|f| (pos.x - f.position.x).abs() < 16.0);
    b.right = !camp;

    let wall_ahead = [Vec2::new(8.0, 4.0), Vec2::new(8.0, -8.0)]
        .iter()
        .any(|&o| level.grid.solid_at(pos + o).is_some());
    b.jump = (p.body.resting && wall_ahead && b.right) || (p.jump.is_jumping && p.jump.has_control);

    // Released while the swing runs, so the next one is a fresh press.
    b.attack = !p.combat.is_attacking() && level.enemies.iter().any(|e| {
        let d = e.body.position - pos;
        !e.combat.dead && d.x * p.facing.sign() >= 0.0 && d.x.abs() < SWING_RANGE && d.y.abs() < 16.0
    });

    b
}
