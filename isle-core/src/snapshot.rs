//! Save / load of the whole sandbox as one JSON string.
//!
//! Layout:
//!
//! ```json
//! {
//!   "grid": { "<y>": { "<x>": { "id": 0, "x": 0, "y": 0, "terrain": "Water",
//!                               "islandId": -1, "discovered": false } } },
//!   "islands": { "<id>": { "name": "Island 0", "tiles": [{"x": 5, "y": 5}],
//!                          "inventory": { "Food": 2 } } },
//!   "nextIslandId": 1,
//!   "treasury": 10
//! }
//! ```
//!
//! Older saves are accepted too: `layout` instead of `grid`, `treasure`
//! instead of `treasury`, and `islands` as a list of `{id, name, tiles}`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::catalog::Structure;
use crate::config::SimConfig;
use crate::grid::{Grid, Tile};
use crate::inventory::Inventory;
use crate::islands::{Island, IslandRegistry};
use crate::types::{IslandId, Terrain, TilePos};

const OCEAN: i64 = -1;

// ============================================================================
// Wire records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileRecord {
    id: u32,
    x: i32,
    y: i32,
    terrain: Terrain,
    #[serde(default = "ocean")]
    island_id: i64,
    #[serde(default)]
    discovered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    structure: Option<Structure>,
}

fn ocean() -> i64 {
    OCEAN
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IslandRecord {
    name: String,
    tiles: Vec<TilePos>,
    #[serde(default)]
    inventory: Inventory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListedIslandRecord {
    id: u32,
    name: String,
    tiles: Vec<TilePos>,
    #[serde(default)]
    inventory: Inventory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IslandsRecord {
    // String keys: integer map keys do not survive untagged buffering
    Map(BTreeMap<String, IslandRecord>),
    List(Vec<ListedIslandRecord>),
}

type GridRecord = BTreeMap<i32, BTreeMap<i32, TileRecord>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveFile {
    #[serde(default, alias = "layout")]
    grid: Option<GridRecord>,
    #[serde(default)]
    islands: Option<IslandsRecord>,
    #[serde(default)]
    next_island_id: u32,
    #[serde(default, alias = "treasure")]
    treasury: u64,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Everything a save captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub grid: Grid,
    pub islands: IslandRegistry,
    pub treasury: u64,
}

impl Snapshot {
    /// A new all-water chunk with the configured size and treasury.
    pub fn fresh(config: &SimConfig) -> Self {
        Self {
            grid: Grid::init_chunk(config.chunk_width, config.chunk_height),
            islands: IslandRegistry::new(),
            treasury: config.starting_treasury,
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is empty")]
    Empty,
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("tile stored at {key} claims to be at {tile}")]
    MisplacedTile { key: TilePos, tile: TilePos },
    #[error("island key {0:?} is not an id")]
    InvalidIslandKey(String),
    #[error("tile {pos} refers to island {id}, which is not a valid id")]
    InvalidIslandRef { pos: TilePos, id: i64 },
    #[error("island {id} and tile {pos} disagree about membership")]
    InconsistentIsland { id: IslandId, pos: TilePos },
}

pub fn encode(
    grid: &Grid,
    islands: &IslandRegistry,
    treasury: u64,
) -> Result<String, SnapshotError> {
    let mut rows: GridRecord = BTreeMap::new();
    for tile in grid.tiles() {
        rows.entry(tile.pos.y).or_default().insert(
            tile.pos.x,
            TileRecord {
                id: tile.id,
                x: tile.pos.x,
                y: tile.pos.y,
                terrain: tile.terrain,
                island_id: tile.island.map_or(OCEAN, |id| i64::from(id.0)),
                discovered: tile.discovered,
                structure: tile.structure.clone(),
            },
        );
    }

    let records = islands
        .iter()
        .map(|(id, island)| {
            (
                id.0.to_string(),
                IslandRecord {
                    name: island.name.clone(),
                    tiles: island.tiles.clone(),
                    inventory: island.inventory.clone(),
                },
            )
        })
        .collect();

    let file = SaveFile {
        grid: Some(rows),
        islands: Some(IslandsRecord::Map(records)),
        next_island_id: islands.next_id(),
        treasury,
    };
    Ok(serde_json::to_string(&file)?)
}

/// Strict inverse of [`encode`]. Missing sections fall back to defaults: a
/// fresh chunk, no islands, counter 0, treasury 0.
pub fn decode(blob: &str, config: &SimConfig) -> Result<Snapshot, SnapshotError> {
    if blob.trim().is_empty() {
        return Err(SnapshotError::Empty);
    }
    let file: SaveFile = serde_json::from_str(blob)?;

    let grid = match file.grid {
        Some(rows) if !rows.is_empty() => restore_grid(rows)?,
        _ => Grid::init_chunk(config.chunk_width, config.chunk_height),
    };

    let mut islands = match file.islands {
        Some(IslandsRecord::Map(records)) => records
            .into_iter()
            .map(|(key, record)| {
                let id = key
                    .parse::<u32>()
                    .map_err(|_| SnapshotError::InvalidIslandKey(key.clone()))?;
                Ok((IslandId(id), record.into_island()))
            })
            .collect::<Result<BTreeMap<_, _>, SnapshotError>>()?,
        Some(IslandsRecord::List(records)) => records
            .into_iter()
            .map(|record| {
                (
                    IslandId(record.id),
                    Island {
                        name: record.name,
                        tiles: record.tiles,
                        inventory: record.inventory,
                    },
                )
            })
            .collect(),
        None => BTreeMap::new(),
    };

    // Ids of empty islands from old saves are still retired
    let next_id = islands
        .keys()
        .next_back()
        .map_or(file.next_island_id, |id| file.next_island_id.max(id.0 + 1));
    islands.retain(|_, island| !island.is_empty());
    check_membership(&grid, &islands)?;

    Ok(Snapshot {
        grid,
        islands: IslandRegistry::from_parts(islands, next_id),
        treasury: file.treasury,
    })
}

/// Decode, or start over with a fresh chunk when the blob is empty or unusable.
pub fn load_or_default(blob: &str, config: &SimConfig) -> Snapshot {
    match decode(blob, config) {
        Ok(snapshot) => snapshot,
        Err(SnapshotError::Empty) => Snapshot::fresh(config),
        Err(_err) => {
            #[cfg(feature = "instrument")]
            tracing::warn!(target: "snapshot", error = %_err, "discarding unreadable save");
            Snapshot::fresh(config)
        }
    }
}

impl IslandRecord {
    fn into_island(self) -> Island {
        Island {
            name: self.name,
            tiles: self.tiles,
            inventory: self.inventory,
        }
    }
}

/// Island tile lists and tile island ids must agree. Tiles pointing at an id
/// with no island are left alone and read as ocean.
fn check_membership(
    grid: &Grid,
    islands: &BTreeMap<IslandId, Island>,
) -> Result<(), SnapshotError> {
    let mut listed = BTreeSet::new();
    for (id, island) in islands {
        for pos in &island.tiles {
            let member = grid
                .get(*pos)
                .is_some_and(|t| t.terrain.is_land() && t.island == Some(*id));
            if !member || !listed.insert(*pos) {
                return Err(SnapshotError::InconsistentIsland { id: *id, pos: *pos });
            }
        }
    }
    for tile in grid.tiles() {
        let Some(id) = tile.island.filter(|id| islands.contains_key(id)) else {
            continue;
        };
        if !listed.contains(&tile.pos) {
            return Err(SnapshotError::InconsistentIsland { id, pos: tile.pos });
        }
    }
    Ok(())
}

fn restore_grid(rows: GridRecord) -> Result<Grid, SnapshotError> {
    let mut tiles = Vec::new();
    for (y, row) in rows {
        for (x, record) in row {
            let key = TilePos::new(x, y);
            let pos = TilePos::new(record.x, record.y);
            if key != pos {
                return Err(SnapshotError::MisplacedTile { key, tile: pos });
            }
            let island = if record.island_id < 0 {
                None
            } else {
                let id = u32::try_from(record.island_id).map_err(|_| {
                    SnapshotError::InvalidIslandRef {
                        pos,
                        id: record.island_id,
                    }
                })?;
                Some(IslandId(id))
            };
            tiles.push(Tile {
                id: record.id,
                pos,
                terrain: record.terrain,
                island,
                discovered: record.discovered,
                structure: record.structure,
            });
        }
    }
    Ok(Grid::from_tiles(tiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::PaintPolicy;
    use crate::types::Resource;

    fn small() -> SimConfig {
        SimConfig {
            chunk_width: 6,
            chunk_height: 4,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_empty_blob_is_an_error_but_loads_fresh() {
        let config = small();
        assert!(matches!(decode("", &config), Err(SnapshotError::Empty)));
        assert_eq!(load_or_default("   ", &config), Snapshot::fresh(&config));
    }

    #[test]
    fn test_corrupt_blob_loads_fresh() {
        let config = small();
        assert!(matches!(
            decode("{\"grid\": [", &config),
            Err(SnapshotError::Malformed(_))
        ));
        assert_eq!(load_or_default("{\"grid\": [", &config), Snapshot::fresh(&config));
    }

    #[test]
    fn test_missing_sections_default() {
        let snapshot = decode("{}", &small()).unwrap();
        assert_eq!(snapshot.grid, Grid::init_chunk(6, 4));
        assert!(snapshot.islands.is_empty());
        assert_eq!(snapshot.islands.next_id(), 0);
        assert_eq!(snapshot.treasury, 0);
    }

    #[test]
    fn test_tile_wire_shape() {
        let grid = Grid::init_chunk(1, 1);
        let json = encode(&grid, &IslandRegistry::new(), 0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["grid"]["0"]["0"],
            serde_json::json!({
                "id": 0, "x": 0, "y": 0, "terrain": "Water",
                "islandId": -1, "discovered": false
            })
        );
        assert_eq!(value["nextIslandId"], 0);
        assert_eq!(value["treasury"], 0);
    }

    #[test]
    fn test_round_trip_with_islands() {
        let config = small();
        let mut grid = Grid::init_chunk(6, 4);
        let mut islands = IslandRegistry::new();
        let policy = PaintPolicy::default();
        islands.paint_terrain(&mut grid, TilePos::new(1, 1), Terrain::Grass, policy);
        islands.paint_terrain(&mut grid, TilePos::new(4, 2), Terrain::Mountain, policy);
        islands.paint_terrain(&mut grid, TilePos::new(4, 2), Terrain::Water, policy);
        islands
            .get_mut(IslandId(0))
            .unwrap()
            .inventory
            .add(Resource::Food, 7);
        grid.get_mut(TilePos::new(1, 1)).unwrap().structure =
            crate::catalog::structure_for(crate::types::StructureType::Farm);

        let blob = encode(&grid, &islands, 42).unwrap();
        let restored = decode(&blob, &config).unwrap();

        assert_eq!(restored.grid, grid);
        assert_eq!(restored.islands, islands);
        assert_eq!(restored.islands.next_id(), 2);
        assert_eq!(restored.treasury, 42);
    }

    #[test]
    fn test_misplaced_tile_is_rejected() {
        let blob = r#"{"grid": {"0": {"1": {"id": 0, "x": 0, "y": 0, "terrain": "Water"}}}}"#;
        assert!(matches!(
            decode(blob, &small()),
            Err(SnapshotError::MisplacedTile { .. })
        ));
    }

    #[test]
    fn test_legacy_layout_and_island_list() {
        let blob = r#"{
            "layout": {"0": {
                "0": {"id": 0, "x": 0, "y": 0, "terrain": "Grass", "islandId": 3, "discovered": false},
                "1": {"id": 1, "x": 1, "y": 0, "terrain": "Water", "islandId": -1, "discovered": false}
            }},
            "islands": [{"id": 3, "name": "Old Isle", "tiles": [{"x": 0, "y": 0}]}],
            "treasure": 9
        }"#;
        let snapshot = decode(blob, &small()).unwrap();

        assert_eq!(snapshot.grid.tile_count(), 2);
        assert_eq!(
            snapshot.grid.get(TilePos::new(0, 0)).unwrap().island,
            Some(IslandId(3))
        );
        let island = snapshot.islands.get(IslandId(3)).unwrap();
        assert_eq!(island.name, "Old Isle");
        assert!(island.inventory.is_empty());
        // Counter never hands out a restored id again
        assert_eq!(snapshot.islands.next_id(), 4);
        assert_eq!(snapshot.treasury, 9);
    }

    #[test]
    fn test_empty_legacy_island_is_dropped() {
        let blob = r#"{"islands": [{"id": 0, "name": "Island 1", "tiles": []}]}"#;
        let snapshot = decode(blob, &small()).unwrap();
        assert!(snapshot.islands.is_empty());
        assert_eq!(snapshot.islands.next_id(), 1);
    }

    #[test]
    fn test_bad_island_key() {
        let blob = r#"{"islands": {"north": {"name": "N", "tiles": []}}}"#;
        assert!(matches!(
            decode(blob, &small()),
            Err(SnapshotError::InvalidIslandKey(_))
        ));
    }

    #[test]
    fn test_island_listing_water_is_rejected() {
        let blob = r#"{
            "grid": {"0": {
                "0": {"id": 0, "x": 0, "y": 0, "terrain": "Grass", "islandId": 0},
                "1": {"id": 1, "x": 1, "y": 0, "terrain": "Water", "islandId": -1}
            }},
            "islands": {"0": {"name": "Island 0", "tiles": [{"x": 0, "y": 0}, {"x": 1, "y": 0}]}}
        }"#;
        let config = small();
        assert!(matches!(
            decode(blob, &config),
            Err(SnapshotError::InconsistentIsland { id: IslandId(0), pos }) if pos == TilePos::new(1, 0)
        ));
        assert_eq!(load_or_default(blob, &config), Snapshot::fresh(&config));
    }

    #[test]
    fn test_unlisted_member_tile_is_rejected() {
        let blob = r#"{
            "grid": {"0": {
                "0": {"id": 0, "x": 0, "y": 0, "terrain": "Grass", "islandId": 0},
                "1": {"id": 1, "x": 1, "y": 0, "terrain": "Grass", "islandId": 0}
            }},
            "islands": {"0": {"name": "Island 0", "tiles": [{"x": 0, "y": 0}]}}
        }"#;
        assert!(matches!(
            decode(blob, &small()),
            Err(SnapshotError::InconsistentIsland { pos, .. }) if pos == TilePos::new(1, 0)
        ));
    }

    #[test]
    fn test_dangling_tile_reference_is_tolerated() {
        let blob = r#"{
            "grid": {"0": {
                "0": {"id": 0, "x": 0, "y": 0, "terrain": "Grass", "islandId": 5}
            }},
            "nextIslandId": 6
        }"#;
        let snapshot = decode(blob, &small()).unwrap();
        assert!(snapshot.islands.is_empty());
        assert_eq!(
            snapshot.grid.get(TilePos::new(0, 0)).unwrap().island,
            Some(IslandId(5))
        );
    }
}
