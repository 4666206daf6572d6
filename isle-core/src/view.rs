use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::catalog::Structure;
use crate::economy::{IslandWorkReport, WorkReport};
use crate::grid::{Grid, Tile};
use crate::inventory::Inventory;
use crate::islands::{Island, PaintOutcome};
use crate::types::{IslandId, Resource, StructureType, Terrain, TilePos};

// ============================================================================
// Views handed to the UI
// ============================================================================
// Views are copies. Mutating one never touches the world.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ResourceAmount {
    pub resource: Resource,
    pub amount: u64,
}

fn amounts(inventory: &Inventory) -> Vec<ResourceAmount> {
    inventory
        .iter()
        .map(|(resource, amount)| ResourceAmount { resource, amount })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TileView {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub terrain: Terrain,
    pub island: Option<u32>,
    pub discovered: bool,
    pub structure: Option<StructureType>,
}

impl From<&Tile> for TileView {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id,
            x: tile.pos.x,
            y: tile.pos.y,
            terrain: tile.terrain,
            island: tile.island.map(IslandId::to_u32),
            discovered: tile.discovered,
            structure: tile.structure.as_ref().map(|s| s.kind),
        }
    }
}

/// A list of tiles, row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GridView {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<TileView>,
}

impl GridView {
    pub fn of(grid: &Grid) -> Self {
        Self::from_tiles(grid, grid.flatten())
    }

    pub fn from_tiles(grid: &Grid, tiles: Vec<&Tile>) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            tiles: tiles.into_iter().map(TileView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct IslandView {
    pub id: u32,
    pub name: String,
    pub tiles: Vec<TilePos>,
    pub inventory: Vec<ResourceAmount>,
}

impl IslandView {
    pub fn new(id: IslandId, island: &Island) -> Self {
        Self {
            id: id.to_u32(),
            name: island.name.clone(),
            tiles: island.tiles.clone(),
            inventory: amounts(&island.inventory),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct IslandList {
    pub islands: Vec<IslandView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StructureView {
    pub kind: StructureType,
    pub input: Vec<ResourceAmount>,
    pub output: Vec<ResourceAmount>,
    pub terrain: Option<Terrain>,
    pub special: bool,
}

impl From<&Structure> for StructureView {
    fn from(structure: &Structure) -> Self {
        Self {
            kind: structure.kind,
            input: amounts(&structure.input),
            output: amounts(&structure.output),
            terrain: structure.required_terrain,
            special: structure.special,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StructureList {
    pub structures: Vec<StructureView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct IslandWorkView {
    pub island: u32,
    pub building_limit: u64,
    pub sell_limit: u64,
    pub max_production: u64,
    pub used_production: u64,
    pub worked: Vec<TilePos>,
    pub sold: Vec<ResourceAmount>,
    pub revenue: u64,
    pub food_consumed: u64,
    pub wages_paid: u64,
}

impl From<&IslandWorkReport> for IslandWorkView {
    fn from(report: &IslandWorkReport) -> Self {
        Self {
            island: report.island.to_u32(),
            building_limit: report.building_limit,
            sell_limit: report.sell_limit,
            max_production: report.max_production,
            used_production: report.used_production(),
            worked: report.worked.clone(),
            sold: amounts(&report.sold),
            revenue: report.revenue,
            food_consumed: report.food_consumed,
            wages_paid: report.wages_paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WorkReportView {
    pub islands: Vec<IslandWorkView>,
    pub treasury_before: u64,
    pub treasury_after: u64,
}

impl From<&WorkReport> for WorkReportView {
    fn from(report: &WorkReport) -> Self {
        Self {
            islands: report.islands.iter().map(IslandWorkView::from).collect(),
            treasury_before: report.treasury_before,
            treasury_after: report.treasury_after,
        }
    }
}

/// Current selection. Both fields are empty when nothing is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Selection {
    pub tile: Option<TileView>,
    pub island: Option<IslandView>,
}

/// Result of clicking a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct PaintView {
    /// `ignored`, `out_of_bounds`, `founded`, `joined`, `flooded` or `rejected`
    pub outcome: String,
    pub island: Option<u32>,
    /// Islands involved beyond `island`: the touching islands of a rejection
    /// or the islands split off by a flood
    pub others: Vec<u32>,
}

impl From<&PaintOutcome> for PaintView {
    fn from(outcome: &PaintOutcome) -> Self {
        let ids = |ids: &[IslandId]| -> Vec<u32> { ids.iter().map(|id| id.to_u32()).collect() };
        let (name, island, others) = match outcome {
            PaintOutcome::Ignored => ("ignored", None, Vec::new()),
            PaintOutcome::OutOfBounds => ("out_of_bounds", None, Vec::new()),
            PaintOutcome::Founded(id) => ("founded", Some(id.to_u32()), Vec::new()),
            PaintOutcome::Joined(id) => ("joined", Some(id.to_u32()), Vec::new()),
            PaintOutcome::Flooded {
                island, split_into, ..
            } => ("flooded", island.map(IslandId::to_u32), ids(split_into)),
            PaintOutcome::Rejected { touching } => ("rejected", None, ids(touching)),
        };
        Self {
            outcome: name.to_string(),
            island,
            others,
        }
    }
}
