use std::collections::BTreeMap;

use crate::catalog::Structure;
use crate::hex;
use crate::types::{IslandId, Terrain, TilePos};

pub const CHUNK_WIDTH: u32 = 40;
pub const CHUNK_HEIGHT: u32 = 30;

// ============================================================================
// Tile
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Sequential label assigned when the chunk is created
    pub id: u32,
    pub pos: TilePos,
    pub terrain: Terrain,
    /// `None` for ocean / unassigned tiles
    pub island: Option<IslandId>,
    pub discovered: bool,
    pub structure: Option<Structure>,
}

impl Tile {
    pub fn water(id: u32, pos: TilePos) -> Self {
        Self {
            id,
            pos,
            terrain: Terrain::Water,
            island: None,
            discovered: false,
            structure: None,
        }
    }
}

// ============================================================================
// Grid - Rows of columns of tiles
// ============================================================================

/// A rectangular chunk of tiles stored as row -> column -> tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    rows: BTreeMap<i32, BTreeMap<i32, Tile>>,
}

impl Grid {
    /// All-water chunk with row-major ids.
    pub fn init_chunk(width: u32, height: u32) -> Self {
        let mut rows: BTreeMap<i32, BTreeMap<i32, Tile>> = BTreeMap::new();
        for i in 0..width * height {
            let x = (i % width) as i32;
            let y = (i / width) as i32;
            rows.entry(y)
                .or_default()
                .insert(x, Tile::water(i, TilePos::new(x, y)));
        }
        Self {
            width,
            height,
            rows,
        }
    }

    /// Rebuild a grid from restored tiles. Dimensions are taken from the extent of the tiles.
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut rows: BTreeMap<i32, BTreeMap<i32, Tile>> = BTreeMap::new();
        let mut width = 0u32;
        let mut height = 0u32;
        for tile in tiles {
            width = width.max(tile.pos.x.max(-1).saturating_add(1) as u32);
            height = height.max(tile.pos.y.max(-1).saturating_add(1) as u32);
            rows.entry(tile.pos.y).or_default().insert(tile.pos.x, tile);
        }
        Self {
            width,
            height,
            rows,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn get(&self, pos: TilePos) -> Option<&Tile> {
        self.rows.get(&pos.y)?.get(&pos.x)
    }

    pub fn get_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.rows.get_mut(&pos.y)?.get_mut(&pos.x)
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.get(pos).is_some()
    }

    /// Tiles within `radius` steps of `pos`, the tile itself included.
    ///
    /// Output runs ring by ring from the center. Positions off the chunk produce
    /// no tile. A radius wider than the chunk scans the tiles instead of walking
    /// rings, so the cost is bounded by the chunk size.
    pub fn neighbors(&self, pos: TilePos, radius: u32) -> Vec<&Tile> {
        if radius > self.width.saturating_add(self.height) {
            let mut tiles: Vec<&Tile> = self
                .tiles()
                .filter(|t| hex::distance(pos, t.pos) <= radius)
                .collect();
            tiles.sort_by_key(|t| hex::distance(pos, t.pos));
            return tiles;
        }
        hex::within(pos, radius)
            .into_iter()
            .filter_map(|p| self.get(p))
            .collect()
    }

    /// The six immediate neighbours that exist, in offset order.
    pub fn adjacent(&self, pos: TilePos) -> Vec<&Tile> {
        hex::offset_neighbors(pos)
            .into_iter()
            .filter_map(|p| self.get(p))
            .collect()
    }

    /// All tiles, row-major.
    pub fn flatten(&self) -> Vec<&Tile> {
        self.tiles().collect()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.rows.values().flat_map(BTreeMap::values)
    }

}

impl Default for Grid {
    fn default() -> Self {
        Self::init_chunk(CHUNK_WIDTH, CHUNK_HEIGHT)
    }
}
