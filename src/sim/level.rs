/// Level loader: themes, symbol tables and layout parsing.
///
/// ## Sources (priority order):
///   1. The level file named in the config (`[level] file`)
///   2. The theme's built-in layout
///
/// ## Layout format (`.txt`):
///   Optional line 1: `# Level Name`
///   Remaining non-blank lines: map rows, one character per 8×8 cell.
///   The first row's length is the declared width. Shorter rows are
///   padded with empty cells; longer rows are rejected.
///
/// ## Standard legend:
///   '-' = empty
///   'X' 'x' 'u' 'd' 'l' 'r' 'n' 's' 'e' 'w' = impassable terrain
///   'G' = ghoul    'S' = skeleton    'H' = ghost
///
/// Any other character is an error unless the caller declares it in the
/// `SymbolTable` (e.g. a passable decoration).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use log::info;
use thiserror::Error;

use crate::config::{GameConfig, MAX_PLAYERS};
use crate::domain::entity::EnemyKind;
use crate::domain::tile::{Tile, TileGrid, TILE_SIZE};
use super::world::Level;

/// Horizontal shift of the exit line when more than one player is in.
pub const MULTIPLAYER_EXIT_SHIFT: f32 = 62.0;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} is {len} cells wide, declared width is {width}")]
    RowTooWide { row: usize, len: usize, width: usize },
    #[error("unknown symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
    #[error("player count {0} out of range (1..={max})", max = MAX_PLAYERS)]
    PlayerCount(usize),
    #[error("player slot {0} out of range")]
    PlayerSlot(usize),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ══════════════════════════════════════════════════════════════
// Themes
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Theme {
    Green,
    Fairway,
    Rough,
    Bunker,
    OutOfBounds,
}

impl Theme {
    pub const ALL: [Theme; 5] = [Theme::Green, Theme::Fairway, Theme::Rough, Theme::Bunker, Theme::OutOfBounds];

    pub fn from_name(name: &str) -> Result<Theme, LevelError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(Theme::Green),
            "fairway" => Ok(Theme::Fairway),
            "rough" => Ok(Theme::Rough),
            "bunker" | "water" => Ok(Theme::Bunker),
            "oob" | "out_of_bounds" | "out-of-bounds" => Ok(Theme::OutOfBounds),
            _ => Err(LevelError::UnknownTheme(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Green => "green",
            Theme::Fairway => "fairway",
            Theme::Rough => "rough",
            Theme::Bunker => "bunker",
            Theme::OutOfBounds => "oob",
        }
    }

    /// Exit line for a single player.
    pub fn win_x(self) -> f32 {
        match self {
            Theme::Green => 1370.0,
            Theme::Fairway => 1070.0,
            Theme::Rough => 730.0,
            Theme::Bunker => 485.0,
            Theme::OutOfBounds => 480.0,
        }
    }

    pub fn exit_line(self, multiplayer: bool) -> f32 {
        if multiplayer { self.win_x() - MULTIPLAYER_EXIT_SHIFT } else { self.win_x() }
    }

    /// Where players enter the level.
    pub fn spawn_point(self) -> Vec2 {
        match self {
            Theme::Green => Vec2::new(140.0, 127.0),
            _ => Vec2::new(140.0, 36.0),
        }
    }

    pub fn has_flag(self) -> bool {
        self == Theme::Green
    }

    pub fn built_in_layout(self) -> &'static str {
        match self {
            Theme::Green => include_str!("../../levels/green.txt"),
            Theme::Fairway => include_str!("../../levels/fairway.txt"),
            Theme::Rough => include_str!("../../levels/rough.txt"),
            Theme::Bunker => include_str!("../../levels/bunker.txt"),
            Theme::OutOfBounds => include_str!("../../levels/oob.txt"),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Symbol table
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Symbol {
    Empty,
    Terrain { passable: bool },
    Spawn(EnemyKind),
}

#[derive(Clone, Debug)]
pub struct SymbolTable {
    entries: HashMap<char, Symbol>,
}

impl SymbolTable {
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        entries.insert('-', Symbol::Empty);
        for ch in "Xxudlrnsew".chars() {
            entries.insert(ch, Symbol::Terrain { passable: false });
        }
        entries.insert('G', Symbol::Spawn(EnemyKind::Ghoul));
        entries.insert('S', Symbol::Spawn(EnemyKind::Skeleton));
        entries.insert('H', Symbol::Spawn(EnemyKind::Ghost));
        SymbolTable { entries }
    }

    /// Declare (or override) a symbol.
    pub fn with(mut self, ch: char, symbol: Symbol) -> Self {
        self.entries.insert(ch, symbol);
        self
    }

    pub fn lookup(&self, ch: char) -> Option<Symbol> {
        self.entries.get(&ch).copied()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// A level as read from text, before symbols are interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub rows: Vec<String>,
}

/// Tile grid plus enemy spawn points, ready for `Level::new`.
#[derive(Clone, Debug)]
pub struct Layout {
    pub grid: TileGrid,
    pub spawns: Vec<(EnemyKind, Vec2)>,
}

pub fn parse_level(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if rows.is_empty() && name.is_empty() && line.starts_with('#') {
            name = line[1..].trim().to_string();
            continue;
        }
        rows.push(line.to_string());
    }

    let width = rows.first().map(|r| r.chars().count()).ok_or(LevelError::Empty)?;
    if width == 0 {
        return Err(LevelError::Empty);
    }
    for (row, line) in rows.iter().enumerate() {
        let len = line.chars().count();
        if len > width {
            return Err(LevelError::RowTooWide { row, len, width });
        }
    }

    if name.is_empty() {
        name = "Unnamed Hole".to_string();
    }

    Ok(LevelDef { name, width, rows })
}

/// Interpret every symbol. Fails on the first unknown one.
pub fn build_layout(def: &LevelDef, table: &SymbolTable) -> Result<Layout, LevelError> {
    let mut tiles = vec![];
    let mut spawns = vec![];

    for (row, line) in def.rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            match table.lookup(ch) {
                Some(Symbol::Empty) => {}
                Some(Symbol::Terrain { passable }) => tiles.push(Tile::new(col, row, ch, passable)),
                Some(Symbol::Spawn(kind)) => {
                    spawns.push((kind, Vec2::new(col as f32 * TILE_SIZE, row as f32 * TILE_SIZE)));
                }
                None => return Err(LevelError::UnknownSymbol { symbol: ch, row, col }),
            }
        }
    }

    Ok(Layout { grid: TileGrid::from_tiles(def.width, def.rows.len(), tiles), spawns })
}

pub fn load_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_level(&content)
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Build the level the config asks for.
pub fn load_level(config: &GameConfig) -> Result<Level, LevelError> {
    let theme = Theme::from_name(&config.level.theme)?;
    let def = match &config.level.file {
        Some(path) => load_file(path)?,
        None => parse_level(theme.built_in_layout())?,
    };
    info!("loading {} ({}×{}) as {}", def.name, def.width, def.rows.len(), theme.name());
    Level::new(theme, &def, &SymbolTable::standard(), config.sim.clone())
}
