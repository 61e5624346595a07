/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// The simulation only ever sees `SimConfig`, handed to `Level::new` by
/// value. Nothing reads configuration through a global.

use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MAX_PLAYERS: usize = 4;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub clock: ClockConfig,
    pub level: LevelConfig,
    pub run: RunConfig,
    pub levels_dir: PathBuf,
}

/// Everything a `Level` needs to know. Immutable once the level is built.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub player_count: usize,
    pub show_hitboxes: bool,
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub flag: FlagTuning,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    pub step_hz: f32,
    pub max_steps: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    pub theme: String,
    pub file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunConfig {
    pub seconds: f32,
    pub autopilot: bool,
}

// ── Tuning tables (deserialized directly, per-field defaults) ──

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct PlayerTuning {
    pub base_speed: f32,
    pub max_speed: f32,
    pub hit_points: i32,
    pub attack_power: f32,
    pub attack_cooldown: f32,
    pub hit_stun: f32,
    pub invincible: f32,
    pub jump_speed: f32,
    pub jump_thrust: f32,
    pub max_jump_time: f32,
    pub early_release: f32,
    pub ground_friction: f32,
    pub air_control: f32,
    pub reverse_boost: f32,
    pub attack_width: f32,
    pub attack_height: f32,
    pub attack_reach: f32,
    pub attack_rise: f32,
    pub attack_duration: f32,
    pub wait_time: f32,
    pub appear_time: f32,
    pub respawn_delay: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        PlayerTuning {
            base_speed: 10.0,
            max_speed: 72.0,
            hit_points: 5,
            attack_power: 1.0,
            attack_cooldown: 0.2,
            hit_stun: 0.3,
            invincible: 0.5,
            jump_speed: 100.0,
            jump_thrust: 8.0,
            max_jump_time: 0.25,
            early_release: 0.3,
            ground_friction: 20.0,
            air_control: 0.5,
            reverse_boost: 2.0,
            attack_width: 14.0,
            attack_height: 10.0,
            attack_reach: 6.0,
            attack_rise: 10.0,
            attack_duration: 0.1,
            wait_time: 0.5,
            appear_time: 0.3,
            respawn_delay: 1.5,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct EnemyTuning {
    pub base_speed: f32,
    pub attack_cooldown: f32,
    pub hit_stun: f32,
    pub invincible: f32,
    pub patrol_speed: f32,
    pub patrol_period: f32,
    pub hop_speed: f32,
    pub hop_launch: f32,
    pub hover_radius: f32,
    /// Dead enemies are removed this far below the bottom of the grid.
    pub despawn_depth: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        EnemyTuning {
            base_speed: 10.0,
            attack_cooldown: 0.2,
            hit_stun: 0.2,
            invincible: 0.1,
            patrol_speed: 15.0,
            patrol_period: 1.5,
            hop_speed: 20.0,
            hop_launch: 150.0,
            hover_radius: 48.0,
            despawn_depth: 64.0,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct FlagTuning {
    pub x: f32,
    pub y: f32,
    pub progress_max: f32,
    /// Reach radius with a single player.
    pub solo_radius: f32,
    /// Reach radius with two or more players.
    pub near_radius: f32,
}

impl Default for FlagTuning {
    fn default() -> Self {
        FlagTuning { x: 500.0, y: 144.0, progress_max: 10.0, solo_radius: 8.0, near_radius: 32.0 }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig { step_hz: default_step_hz(), max_steps: default_max_steps() }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            player_count: 1,
            show_hitboxes: false,
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            flag: FlagTuning::default(),
        }
    }
}

impl SimConfig {
    pub fn with_players(player_count: usize) -> Self {
        SimConfig { player_count, ..SimConfig::default() }
    }

    pub fn multiplayer(&self) -> bool {
        self.player_count > 1
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    clock: TomlClock,
    #[serde(default)]
    level: TomlLevel,
    #[serde(default)]
    run: TomlRun,
    #[serde(default)]
    player: PlayerTuning,
    #[serde(default)]
    enemy: EnemyTuning,
    #[serde(default)]
    flag: FlagTuning,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_players")]
    players: usize,
    #[serde(default)]
    show_hitboxes: bool,
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlClock {
    #[serde(default = "default_step_hz")]
    step_hz: f32,
    #[serde(default = "default_max_steps")]
    max_steps: u32,
}

#[derive(Deserialize, Debug)]
struct TomlLevel {
    #[serde(default = "default_theme")]
    theme: String,
    #[serde(default)]
    file: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlRun {
    #[serde(default = "default_run_seconds")]
    seconds: f32,
    #[serde(default = "default_autopilot")]
    autopilot: bool,
}

// ── Defaults ──

fn default_players() -> usize { 1 }
fn default_levels_dir() -> String { "levels".into() }
fn default_step_hz() -> f32 { 60.0 }
fn default_max_steps() -> u32 { 5 }
fn default_theme() -> String { "green".into() }
fn default_run_seconds() -> f32 { 30.0 }
fn default_autopilot() -> bool { true }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { players: default_players(), show_hitboxes: false, levels_dir: default_levels_dir() }
    }
}

impl Default for TomlClock {
    fn default() -> Self {
        TomlClock { step_hz: default_step_hz(), max_steps: default_max_steps() }
    }
}

impl Default for TomlLevel {
    fn default() -> Self {
        TomlLevel { theme: default_theme(), file: None }
    }
}

impl Default for TomlRun {
    fn default() -> Self {
        TomlRun { seconds: default_run_seconds(), autopilot: default_autopilot() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) ~/.local/share/golfbrawl, (4) /usr/share/golfbrawl.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search = SearchPath::standard();
        let toml_cfg = search.read_config();
        Self::from_schema(toml_cfg, &search)
    }

    /// Parse a config document. Search-relative paths resolve against CWD.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_schema(toml_cfg, &SearchPath::default()))
    }

    fn from_schema(toml_cfg: TomlConfig, search: &SearchPath) -> Self {
        let levels_dir = search.levels_dir(&toml_cfg.general.levels_dir);

        let mut player_count = toml_cfg.general.players;
        if !(1..=MAX_PLAYERS).contains(&player_count) {
            warn!("config: players = {player_count} out of range, clamping to 1..={MAX_PLAYERS}");
            player_count = player_count.clamp(1, MAX_PLAYERS);
        }

        let mut clock = ClockConfig { step_hz: toml_cfg.clock.step_hz, max_steps: toml_cfg.clock.max_steps };
        if !(clock.step_hz > 0.0) {
            warn!("config: clock.step_hz must be positive, using {}", default_step_hz());
            clock.step_hz = default_step_hz();
        }
        if clock.max_steps == 0 {
            warn!("config: clock.max_steps must be at least 1, using {}", default_max_steps());
            clock.max_steps = default_max_steps();
        }

        GameConfig {
            sim: SimConfig {
                player_count,
                show_hitboxes: toml_cfg.general.show_hitboxes,
                player: toml_cfg.player,
                enemy: toml_cfg.enemy,
                flag: toml_cfg.flag,
            },
            clock,
            level: LevelConfig {
                theme: toml_cfg.level.theme,
                file: toml_cfg.level.file.map(|f| resolve_file(&f, &levels_dir)),
            },
            run: RunConfig { seconds: toml_cfg.run.seconds.max(0.0), autopilot: toml_cfg.run.autopilot },
            levels_dir,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_schema(TomlConfig::default(), &SearchPath::default())
    }
}

/// A bare level file name is taken relative to the levels directory.
fn resolve_file(file: &str, levels_dir: &Path) -> PathBuf {
    let path = PathBuf::from(file);
    if path.is_absolute() || path.exists() {
        return path;
    }
    levels_dir.join(file)
}

/// Ordered, duplicate-free list of data directories. Empty means "relative
/// to the working directory only".
#[derive(Clone, Debug, Default)]
struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Next to the (symlink-resolved) executable, the working directory,
    /// then the per-user and system data directories when they exist.
    fn standard() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .map(|exe| exe.canonicalize().unwrap_or(exe))
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let user_dir = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share/golfbrawl"))
            .filter(|d| d.is_dir());
        let system_dir = Some(PathBuf::from("/usr/share/golfbrawl")).filter(|d| d.is_dir());

        let mut search = SearchPath::default();
        for dir in [exe_dir, std::env::current_dir().ok(), user_dir, system_dir].into_iter().flatten() {
            if !search.dirs.contains(&dir) {
                search.dirs.push(dir);
            }
        }
        search
    }

    /// First existing `name` under the search dirs.
    fn find(&self, name: &str, want_dir: bool) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|d| d.join(name))
            .find(|p| if want_dir { p.is_dir() } else { p.is_file() })
    }

    /// Absolute paths are kept; relative ones are looked up, else taken as given.
    fn levels_dir(&self, dir: &str) -> PathBuf {
        let path = PathBuf::from(dir);
        if path.is_absolute() {
            return path;
        }
        self.find(dir, true).unwrap_or(path)
    }

    /// The first `config.toml` found. Unreadable or malformed files fall
    /// back to defaults with a warning.
    fn read_config(&self) -> TomlConfig {
        let Some(path) = self.find("config.toml", false) else {
            return TomlConfig::default();
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| toml::from_str::<TomlConfig>(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(cfg) => {
                info!("config: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("{}: {e}; using default settings", path.display());
                TomlConfig::default()
            }
        }
    }
}
