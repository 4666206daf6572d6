// Economy: structure production, island work ticks and market sales

use serde::{Deserialize, Serialize};

use crate::catalog::resource_cost;
use crate::grid::{Grid, Tile};
use crate::inventory::Inventory;
use crate::islands::{Island, IslandRegistry};
use crate::types::{IslandId, Resource, StructureType, TilePos};

// ============================================================================
// Config
// ============================================================================

/// Which resources pay for labour each tick.
///
/// Each switch caps production by that stock and charges one unit per worked
/// tile. With food on, a lone Farm can never start because it needs food to
/// produce food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborPolicy {
    pub food_fuels_labor: bool,
    pub treasury_pays_wages: bool,
}

impl Default for LaborPolicy {
    fn default() -> Self {
        Self {
            food_fuels_labor: true,
            treasury_pays_wages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Worked tiles allowed per Settlement
    pub settlement_capacity: u64,
    /// Resources a Market sells, highest priority first
    pub sell_priority: Vec<Resource>,
    pub labor: LaborPolicy,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            settlement_capacity: 2,
            sell_priority: vec![Resource::Gold],
            labor: LaborPolicy::default(),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandWorkReport {
    pub island: IslandId,
    pub building_limit: u64,
    pub sell_limit: u64,
    pub max_production: u64,
    /// Tiles successfully worked, in the order they ran
    pub worked: Vec<TilePos>,
    pub sold: Inventory,
    pub revenue: u64,
    pub food_consumed: u64,
    pub wages_paid: u64,
}

impl IslandWorkReport {
    pub fn used_production(&self) -> u64 {
        self.worked.len() as u64
    }

    /// Production was capped below settlement capacity by food or treasury.
    pub fn short_of_resources(&self) -> bool {
        self.max_production < self.building_limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkReport {
    pub islands: Vec<IslandWorkReport>,
    pub treasury_before: u64,
    pub treasury_after: u64,
}

// ============================================================================
// Production
// ============================================================================

/// Run one tile's structure against its island's inventory.
///
/// All inputs must be strictly exceeded. On success every input is deducted and
/// every output credited; on failure nothing changes.
pub fn work_tile(inventory: &mut Inventory, tile: &Tile) -> bool {
    let Some(structure) = &tile.structure else {
        return false;
    };
    if structure.special {
        return false;
    }
    if !inventory.exceeds(&structure.input) {
        return false;
    }

    for (resource, amount) in structure.input.iter() {
        inventory.remove(resource, amount);
    }
    for (resource, amount) in structure.output.iter() {
        inventory.add(resource, amount);
    }
    true
}

fn count_structures(grid: &Grid, tiles: &[TilePos], kind: StructureType) -> u64 {
    tiles
        .iter()
        .filter_map(|pos| grid.get(*pos))
        .filter(|tile| tile.structure.as_ref().is_some_and(|s| s.kind == kind))
        .count() as u64
}

/// One work tick for a single island.
pub fn work_island(
    grid: &Grid,
    id: IslandId,
    island: &mut Island,
    treasury: &mut u64,
    config: &EconomyConfig,
) -> IslandWorkReport {
    let Island {
        tiles, inventory, ..
    } = island;
    inventory.ensure(Resource::Food);

    let settlements = count_structures(grid, tiles.as_slice(), StructureType::Settlement);
    let building_limit = config.settlement_capacity.saturating_mul(settlements);
    let sell_limit = count_structures(grid, tiles.as_slice(), StructureType::Market);

    let mut max_production = building_limit;
    if config.labor.food_fuels_labor {
        max_production = max_production.min(inventory.get(Resource::Food));
    }
    if config.labor.treasury_pays_wages {
        max_production = max_production.min(*treasury);
    }

    if max_production < building_limit {
        #[cfg(feature = "instrument")]
        tracing::warn!(
            target: "work_island",
            island = id.0,
            building_limit,
            max_production,
            food = inventory.get(Resource::Food),
            treasury = *treasury,
            "insufficient resources to staff every building",
        );
    }

    // 1. PRODUCTION
    let mut worked = Vec::new();
    for pos in tiles.iter() {
        if worked.len() as u64 >= max_production {
            break;
        }
        let Some(tile) = grid.get(*pos) else {
            continue;
        };
        if work_tile(inventory, tile) {
            worked.push(*pos);
        }
    }

    // 2. SALES
    let mut sold = Inventory::new();
    let mut revenue = 0u64;
    for _ in 0..sell_limit {
        let offer = config.sell_priority.iter().find_map(|resource| {
            let price = resource_cost(*resource)?;
            (inventory.get(*resource) > 0).then_some((*resource, price))
        });
        let Some((resource, price)) = offer else {
            break;
        };
        inventory.remove(resource, 1);
        sold.add(resource, 1);
        revenue = revenue.saturating_add(price);
        *treasury = treasury.saturating_add(price);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "sale",
            island = id.0,
            resource = ?resource,
            price,
        );
    }

    // 3. LABOUR COSTS
    let used = worked.len() as u64;
    let food_consumed = if config.labor.food_fuels_labor {
        inventory.remove(Resource::Food, used)
    } else {
        0
    };
    let wages_paid = if config.labor.treasury_pays_wages {
        let paid = used.min(*treasury);
        *treasury -= paid;
        paid
    } else {
        0
    };

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "work_island",
        island = id.0,
        building_limit,
        sell_limit,
        max_production,
        used_production = used,
        revenue,
        food_consumed,
        wages_paid,
        treasury = *treasury,
    );

    IslandWorkReport {
        island: id,
        building_limit,
        sell_limit,
        max_production,
        worked,
        sold,
        revenue,
        food_consumed,
        wages_paid,
    }
}

/// Work every island in ascending id order. Islands never affect each other
/// except through the shared treasury.
pub fn work_islands(
    grid: &Grid,
    registry: &mut IslandRegistry,
    treasury: &mut u64,
    config: &EconomyConfig,
) -> WorkReport {
    let treasury_before = *treasury;
    let mut islands = Vec::with_capacity(registry.len());
    for id in registry.ids() {
        let Some(island) = registry.get_mut(id) else {
            continue;
        };
        islands.push(work_island(grid, id, island, treasury, config));
    }
    WorkReport {
        islands,
        treasury_before,
        treasury_after: *treasury,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Structure, structure_for};
    use crate::types::Terrain;

    fn tile_with(structure: Option<Structure>) -> Tile {
        let mut tile = Tile::water(0, TilePos::new(0, 0));
        tile.terrain = Terrain::Grass;
        tile.structure = structure;
        tile
    }

    fn potter() -> Structure {
        Structure::new(StructureType::Potter)
            .with_input(Resource::Clay, 2)
            .with_input(Resource::Wood, 1)
            .with_output(Resource::Pots, 1)
    }

    #[test]
    fn test_work_tile_without_structure_fails() {
        let mut inventory = Inventory::new();
        assert!(!work_tile(&mut inventory, &tile_with(None)));
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_work_tile_special_fails() {
        let mut inventory = Inventory::new().with(Resource::Food, 10);
        let tile = tile_with(structure_for(StructureType::Market));
        assert!(!work_tile(&mut inventory, &tile));
        assert_eq!(inventory, Inventory::new().with(Resource::Food, 10));
    }

    #[test]
    fn test_work_tile_output_only() {
        let mut inventory = Inventory::new();
        let tile = tile_with(structure_for(StructureType::Farm));
        assert!(work_tile(&mut inventory, &tile));
        assert_eq!(inventory.get(Resource::Food), 2);
    }

    #[test]
    fn test_work_tile_consumes_and_produces() {
        let mut inventory = Inventory::new()
            .with(Resource::Clay, 5)
            .with(Resource::Wood, 2);
        assert!(work_tile(&mut inventory, &tile_with(Some(potter()))));
        assert_eq!(inventory.get(Resource::Clay), 3);
        assert_eq!(inventory.get(Resource::Wood), 1);
        assert_eq!(inventory.get(Resource::Pots), 1);
    }

    #[test]
    fn test_work_tile_is_atomic() {
        // Clay is plentiful but wood only ties the requirement
        let mut inventory = Inventory::new()
            .with(Resource::Clay, 5)
            .with(Resource::Wood, 1);
        let before = inventory.clone();
        assert!(!work_tile(&mut inventory, &tile_with(Some(potter()))));
        assert_eq!(inventory, before);
    }

    #[test]
    fn test_work_tile_near_max_stock_saturates() {
        let mut inventory = Inventory::new().with(Resource::Food, u64::MAX - 1);
        let tile = tile_with(structure_for(StructureType::Farm));
        assert!(work_tile(&mut inventory, &tile));
        assert_eq!(inventory.get(Resource::Food), u64::MAX);
    }

    #[test]
    fn test_building_limit_saturates() {
        let mut grid = Grid::init_chunk(4, 4);
        let pos = TilePos::new(1, 1);
        if let Some(tile) = grid.get_mut(pos) {
            tile.terrain = Terrain::Grass;
            tile.structure = structure_for(StructureType::Settlement);
        }
        let mut island = Island::new(IslandId(0), pos);
        let config = EconomyConfig {
            settlement_capacity: u64::MAX,
            labor: LaborPolicy {
                food_fuels_labor: false,
                treasury_pays_wages: false,
            },
            ..EconomyConfig::default()
        };
        let mut treasury = 0;
        let report = work_island(&grid, IslandId(0), &mut island, &mut treasury, &config);
        assert_eq!(report.building_limit, u64::MAX);
    }

    #[test]
    fn test_labor_policy_defaults() {
        let config = EconomyConfig::default();
        assert_eq!(config.settlement_capacity, 2);
        assert_eq!(config.sell_priority, vec![Resource::Gold]);
        assert!(config.labor.food_fuels_labor);
        assert!(config.labor.treasury_pays_wages);
    }
}
