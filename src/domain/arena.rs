// Static tile layout for the current battle map.

/// Largest arena side, in world units, the client accepts from the server.
pub const MAX_ARENA_SIDE: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Wall,
    Block,
    Spawn,
}

impl Tile {
    pub fn from_symbol(symbol: u8) -> Self {
        match symbol {
            b'W' => Tile::Wall,
            b'B' => Tile::Block,
            b'S' => Tile::Spawn,
            _ => Tile::Empty,
        }
    }
}

/// Arena as sent by the server. `obstacles` holds one symbol per tile, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub obstacles: String,
}

impl Arena {
    /// Whether both sides are within [`MAX_ARENA_SIDE`].
    pub fn is_within_bounds(&self) -> bool {
        self.width <= MAX_ARENA_SIDE && self.height <= MAX_ARENA_SIDE
    }

    pub fn columns(&self, tile_size: u32) -> u32 {
        self.width.checked_div(tile_size).unwrap_or(0)
    }

    pub fn rows(&self, tile_size: u32) -> u32 {
        self.height.checked_div(tile_size).unwrap_or(0)
    }

    /// Tile at (row, col). Symbols past the end of the obstacle string are empty.
    pub fn tile_at(&self, row: u32, col: u32, tile_size: u32) -> Tile {
        let Some(idx) = (row as usize)
            .checked_mul(self.columns(tile_size) as usize)
            .and_then(|idx| idx.checked_add(col as usize))
        else {
            return Tile::Empty;
        };
        self.obstacles
            .as_bytes()
            .get(idx)
            .copied()
            .map(Tile::from_symbol)
            .unwrap_or(Tile::Empty)
    }

    /// Every non-empty tile with its grid position.
    pub fn solid_tiles(&self, tile_size: u32) -> impl Iterator<Item = (u32, u32, Tile)> + '_ {
        let rows = self.rows(tile_size);
        let cols = self.columns(tile_size);
        (0..rows)
            .flat_map(move |row| (0..cols).map(move |col| (row, col)))
            .map(move |(row, col)| (row, col, self.tile_at(row, col, tile_size)))
            .filter(|(_, _, tile)| *tile != Tile::Empty)
    }
}
