// Island registry: the partition of land tiles into islands

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::grid::Grid;
use crate::hex;
use crate::inventory::Inventory;
use crate::types::{IslandId, Terrain, TilePos};

// ============================================================================
// Island
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    pub name: String,
    /// Member positions in join order
    pub tiles: Vec<TilePos>,
    pub inventory: Inventory,
}

impl Island {
    pub fn new(id: IslandId, first: TilePos) -> Self {
        Self {
            name: default_name(id),
            tiles: vec![first],
            inventory: Inventory::new(),
        }
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.tiles.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

pub fn default_name(id: IslandId) -> String {
    format!("Island {id}")
}

// ============================================================================
// Paint - Terrain changes and their effect on the partition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintPolicy {
    /// Drop the structure of a tile that is painted to water
    pub clear_structure_on_water: bool,
}

impl Default for PaintPolicy {
    fn default() -> Self {
        Self {
            clear_structure_on_water: true,
        }
    }
}

/// What a paint did to the partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintOutcome {
    /// The `None` brush paints nothing
    Ignored,
    OutOfBounds,
    /// Land with no island next to it started a new island
    Founded(IslandId),
    /// Land joined (or stayed on) the single island next to it
    Joined(IslandId),
    /// Tile became water
    Flooded {
        island: Option<IslandId>,
        /// The island lost its last tile and was deleted
        dissolved: bool,
        /// Islands created because the removal cut the island apart
        split_into: Vec<IslandId>,
    },
    /// Land would have touched two islands; nothing changed
    Rejected { touching: Vec<IslandId> },
}

impl PaintOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, PaintOutcome::Rejected { .. })
    }

    pub fn changed(&self) -> bool {
        !matches!(
            self,
            PaintOutcome::Ignored | PaintOutcome::OutOfBounds | PaintOutcome::Rejected { .. }
        )
    }
}

// ============================================================================
// Island Registry
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IslandRegistry {
    islands: BTreeMap<IslandId, Island>,
    next_id: u32,
}

impl IslandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from restored islands. The counter is raised past every
    /// restored id so ids are never handed out twice.
    pub fn from_parts(islands: BTreeMap<IslandId, Island>, next_id: u32) -> Self {
        let floor = islands.keys().next_back().map_or(0, |id| id.0 + 1);
        Self {
            islands,
            next_id: next_id.max(floor),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    pub fn get(&self, id: IslandId) -> Option<&Island> {
        self.islands.get(&id)
    }

    pub fn get_mut(&mut self, id: IslandId) -> Option<&mut Island> {
        self.islands.get_mut(&id)
    }

    pub fn contains(&self, id: IslandId) -> bool {
        self.islands.contains_key(&id)
    }

    /// Islands in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (IslandId, &Island)> {
        self.islands.iter().map(|(id, island)| (*id, island))
    }

    pub fn ids(&self) -> Vec<IslandId> {
        self.islands.keys().copied().collect()
    }

    /// Island a tile belongs to. `None` for ocean or for a dangling id.
    pub fn island_for(&self, island: Option<IslandId>) -> Option<&Island> {
        self.islands.get(&island?)
    }

    pub fn rename(&mut self, id: IslandId, name: impl Into<String>) -> bool {
        match self.islands.get_mut(&id) {
            Some(island) => {
                island.name = name.into();
                true
            }
            None => false,
        }
    }

    fn allocate(&mut self) -> IslandId {
        let id = IslandId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Paint a tile and keep the partition consistent.
    pub fn paint_terrain(
        &mut self,
        grid: &mut Grid,
        pos: TilePos,
        terrain: Terrain,
        policy: PaintPolicy,
    ) -> PaintOutcome {
        if terrain == Terrain::None {
            return PaintOutcome::Ignored;
        }
        if !grid.contains(pos) {
            return PaintOutcome::OutOfBounds;
        }
        if terrain == Terrain::Water {
            self.flood(grid, pos, policy)
        } else {
            self.raise(grid, pos, terrain)
        }
    }

    fn raise(&mut self, grid: &mut Grid, pos: TilePos, terrain: Terrain) -> PaintOutcome {
        let own = grid.get(pos).and_then(|t| t.island);
        let mut touching: BTreeSet<IslandId> = grid
            .adjacent(pos)
            .into_iter()
            .filter_map(|t| t.island)
            .filter(|id| self.contains(*id))
            .collect();
        if let Some(own) = own.filter(|id| self.contains(*id)) {
            touching.insert(own);
        }

        let outcome = match touching.len() {
            0 => {
                let id = self.allocate();
                self.islands.insert(id, Island::new(id, pos));
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "paint",
                    event = "founded",
                    island = id.0,
                    x = pos.x,
                    y = pos.y,
                );
                PaintOutcome::Founded(id)
            }
            1 => {
                let Some(id) = touching.first().copied() else {
                    return PaintOutcome::Ignored;
                };
                if let Some(island) = self.islands.get_mut(&id) {
                    if !island.contains(pos) {
                        island.tiles.push(pos);
                    }
                }
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "paint",
                    event = "joined",
                    island = id.0,
                    x = pos.x,
                    y = pos.y,
                );
                PaintOutcome::Joined(id)
            }
            _ => {
                let touching: Vec<IslandId> = touching.into_iter().collect();
                #[cfg(feature = "instrument")]
                tracing::warn!(
                    target: "paint",
                    event = "rejected",
                    x = pos.x,
                    y = pos.y,
                    islands = ?touching,
                    "paint would join distinct islands",
                );
                return PaintOutcome::Rejected { touching };
            }
        };

        if let Some(tile) = grid.get_mut(pos) {
            tile.terrain = terrain;
            tile.island = match outcome {
                PaintOutcome::Founded(id) | PaintOutcome::Joined(id) => Some(id),
                _ => tile.island,
            };
            // A structure never outlives the terrain it requires
            if tile.structure.as_ref().is_some_and(|s| !s.allows(terrain)) {
                tile.structure = None;
            }
        }
        outcome
    }

    fn flood(&mut self, grid: &mut Grid, pos: TilePos, policy: PaintPolicy) -> PaintOutcome {
        let Some(tile) = grid.get_mut(pos) else {
            return PaintOutcome::OutOfBounds;
        };
        let previous = tile.island.take();
        tile.terrain = Terrain::Water;
        if policy.clear_structure_on_water {
            tile.structure = None;
        }

        let Some(id) = previous.filter(|id| self.contains(*id)) else {
            return PaintOutcome::Flooded {
                island: None,
                dissolved: false,
                split_into: Vec::new(),
            };
        };

        let Some(island) = self.islands.get_mut(&id) else {
            return PaintOutcome::Ignored;
        };
        island.tiles.retain(|p| *p != pos);

        if island.is_empty() {
            self.islands.remove(&id);
            #[cfg(feature = "instrument")]
            tracing::info!(target: "paint", event = "dissolved", island = id.0, x = pos.x, y = pos.y);
            return PaintOutcome::Flooded {
                island: Some(id),
                dissolved: true,
                split_into: Vec::new(),
            };
        }

        let split_into = self.split_disconnected(grid, id);
        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "paint",
            event = "removed",
            island = id.0,
            x = pos.x,
            y = pos.y,
            split = split_into.len() as u64,
        );
        PaintOutcome::Flooded {
            island: Some(id),
            dissolved: false,
            split_into,
        }
    }

    /// Break an island into its connected parts. The part holding the earliest
    /// joined tile keeps the id, name and inventory; every other part becomes
    /// a new island.
    fn split_disconnected(&mut self, grid: &mut Grid, id: IslandId) -> Vec<IslandId> {
        let Some(island) = self.islands.get_mut(&id) else {
            return Vec::new();
        };
        let mut parts = connected_components(&island.tiles).into_iter();
        let Some(kept) = parts.next() else {
            return Vec::new();
        };
        island.tiles = kept;

        let mut created = Vec::new();
        for part in parts {
            let new_id = self.allocate();
            for pos in &part {
                if let Some(tile) = grid.get_mut(*pos) {
                    tile.island = Some(new_id);
                }
            }
            self.islands.insert(
                new_id,
                Island {
                    name: default_name(new_id),
                    tiles: part,
                    inventory: Inventory::new(),
                },
            );
            created.push(new_id);
        }
        created
    }
}

/// Group positions into hex-connected components. Components are ordered by
/// their earliest member, and members keep their relative order.
pub fn connected_components(tiles: &[TilePos]) -> Vec<Vec<TilePos>> {
    let members: HashSet<TilePos> = tiles.iter().copied().collect();
    let mut label: BTreeMap<TilePos, usize> = BTreeMap::new();
    let mut count = 0usize;

    for start in tiles {
        if label.contains_key(start) {
            continue;
        }
        let mut queue = VecDeque::from([*start]);
        label.insert(*start, count);
        while let Some(pos) = queue.pop_front() {
            for n in hex::offset_neighbors(pos) {
                if members.contains(&n) && !label.contains_key(&n) {
                    label.insert(n, count);
                    queue.push_back(n);
                }
            }
        }
        count += 1;
    }

    let mut parts = vec![Vec::new(); count];
    for pos in tiles {
        if let Some(&part) = label.get(pos) {
            parts[part].push(*pos);
        }
    }
    parts
}
