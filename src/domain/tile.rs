/// Tiles and the static tile grid.
///
/// The grid is built once by the level loader and never mutated afterwards.
/// Cells without a tile are empty space (passable). Queries outside the grid
/// are also treated as empty: actors may leave the map without hitting an
/// invisible wall.

use glam::Vec2;

/// Edge length of one grid cell, in world units.
pub const TILE_SIZE: f32 = 8.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub col: usize,
    pub row: usize,
    pub passable: bool,
    /// Visual key (the source symbol). Irrelevant to simulation.
    pub key: char,
}

impl Tile {
    pub fn new(col: usize, row: usize, key: char, passable: bool) -> Self {
        Tile { col, row, passable, key }
    }

    /// Does this tile stop movement?
    pub fn is_solid(&self) -> bool {
        !self.passable
    }

    /// World-space top-left corner of this tile.
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.col as f32 * TILE_SIZE, self.row as f32 * TILE_SIZE)
    }
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    /// Row-major, `cells[row * width + col]`.
    cells: Vec<Option<Tile>>,
}

impl TileGrid {
    /// Empty grid of the given size (every cell passable).
    pub fn new(width: usize, height: usize) -> Self {
        TileGrid { width, height, cells: vec![None; width * height] }
    }

    /// Build a grid from a list of tiles. Tiles outside `width × height` are dropped.
    pub fn from_tiles(width: usize, height: usize, tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut grid = TileGrid::new(width, height);
        for tile in tiles {
            if tile.col < width && tile.row < height {
                grid.cells[tile.row * width + tile.col] = Some(tile);
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Size of the grid in world units.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * TILE_SIZE, self.height as f32 * TILE_SIZE)
    }

    /// Tile at a grid coordinate. Out-of-range (including negative) → None.
    #[inline]
    pub fn get(&self, col: i32, row: i32) -> Option<&Tile> {
        if col < 0 || row < 0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells[row * self.width + col].as_ref()
    }

    /// Grid cell containing a world point.
    #[inline]
    pub fn cell_of(point: Vec2) -> (i32, i32) {
        ((point.x / TILE_SIZE).floor() as i32, (point.y / TILE_SIZE).floor() as i32)
    }

    /// The impassable tile containing `point`, if any.
    #[inline]
    pub fn solid_at(&self, point: Vec2) -> Option<&Tile> {
        let (col, row) = Self::cell_of(point);
        self.get(col, row).filter(|t| t.is_solid())
    }

    /// Number of impassable tiles (diagnostics only).
    pub fn solid_count(&self) -> usize {
        self.cells.iter().flatten().filter(|t| t.is_solid()).count()
    }
}
