use thiserror::Error;

use crate::catalog::structure_for;
use crate::config::SimConfig;
use crate::economy::{self, WorkReport};
use crate::grid::{Grid, Tile};
use crate::islands::{Island, IslandRegistry, PaintOutcome};
use crate::snapshot::{self, Snapshot, SnapshotError};
use crate::types::{IslandId, StructureType, Terrain, TilePos};

// ============================================================================
// World - The complete sandbox state
// ============================================================================

/// Grid, islands and treasury for one session. Every mutation goes through
/// a method here and reports what it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub grid: Grid,
    pub islands: IslandRegistry,
    pub treasury: u64,
    pub config: SimConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no tile at {0}")]
    NoTile(TilePos),
    #[error("tile {0} is not part of an island")]
    NotOnIsland(TilePos),
    #[error("{0:?} has no building definition")]
    Undefined(StructureType),
    #[error("{kind:?} cannot be built on {terrain:?}")]
    WrongTerrain {
        kind: StructureType,
        terrain: Terrain,
    },
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl World {
    /// A fresh all-water chunk.
    pub fn new(config: SimConfig) -> Self {
        let Snapshot {
            grid,
            islands,
            treasury,
        } = Snapshot::fresh(&config);
        Self {
            grid,
            islands,
            treasury,
            config,
        }
    }

    // === Queries ===

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.grid.get(pos)
    }

    pub fn island(&self, id: IslandId) -> Option<&Island> {
        self.islands.get(id)
    }

    /// Island the tile at `pos` belongs to, if any.
    pub fn island_at(&self, pos: TilePos) -> Option<(IslandId, &Island)> {
        let id = self.grid.get(pos)?.island?;
        self.islands.island_for(Some(id)).map(|island| (id, island))
    }

    pub fn neighbors(&self, pos: TilePos, radius: u32) -> Vec<&Tile> {
        self.grid.neighbors(pos, radius)
    }

    // === Commands ===

    pub fn paint(&mut self, pos: TilePos, terrain: Terrain) -> PaintOutcome {
        let policy = self.config.paint_policy();
        self.islands
            .paint_terrain(&mut self.grid, pos, terrain, policy)
    }

    /// Build (or with `StructureType::None`, demolish) on a tile.
    pub fn place_structure(
        &mut self,
        pos: TilePos,
        kind: StructureType,
    ) -> Result<(), PlacementError> {
        let on_island = self.island_at(pos).is_some();
        let tile = self.grid.get_mut(pos).ok_or(PlacementError::NoTile(pos))?;

        if kind == StructureType::None {
            tile.structure = None;
            return Ok(());
        }
        if !on_island {
            return Err(PlacementError::NotOnIsland(pos));
        }
        let structure = structure_for(kind).ok_or(PlacementError::Undefined(kind))?;
        if !structure.allows(tile.terrain) {
            return Err(PlacementError::WrongTerrain {
                kind,
                terrain: tile.terrain,
            });
        }
        tile.structure = Some(structure);
        Ok(())
    }

    /// Work a single tile against its island's inventory. No labour cost.
    pub fn work_tile(&mut self, pos: TilePos) -> bool {
        let Some(tile) = self.grid.get(pos) else {
            return false;
        };
        let Some(island) = tile.island.and_then(|id| self.islands.get_mut(id)) else {
            return false;
        };
        economy::work_tile(&mut island.inventory, tile)
    }

    pub fn work_islands(&mut self) -> WorkReport {
        economy::work_islands(
            &self.grid,
            &mut self.islands,
            &mut self.treasury,
            &self.config.economy,
        )
    }

    pub fn rename_island(&mut self, id: IslandId, name: impl Into<String>) -> bool {
        self.islands.rename(id, name)
    }

    // === Persistence ===

    pub fn save(&self) -> Result<String, SnapshotError> {
        snapshot::encode(&self.grid, &self.islands, self.treasury)
    }

    /// Replace the state with a save. Unreadable saves become a fresh chunk.
    pub fn load(&mut self, blob: &str) {
        let Snapshot {
            grid,
            islands,
            treasury,
        } = snapshot::load_or_default(blob, &self.config);
        self.grid = grid;
        self.islands = islands;
        self.treasury = treasury;
    }

    /// Like [`World::load`] but surfaces the decode error and keeps the current
    /// state when there is one.
    pub fn try_load(&mut self, blob: &str) -> Result<(), SnapshotError> {
        let Snapshot {
            grid,
            islands,
            treasury,
        } = snapshot::decode(blob, &self.config)?;
        self.grid = grid;
        self.islands = islands;
        self.treasury = treasury;
        Ok(())
    }
}
