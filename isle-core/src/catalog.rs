use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inventory::Inventory;
use crate::types::{Resource, StructureType, Terrain};

// ============================================================================
// Structure - A building placed on a tile
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(rename = "type")]
    pub kind: StructureType,
    #[serde(default, skip_serializing_if = "Inventory::is_empty")]
    pub input: Inventory,
    #[serde(default, skip_serializing_if = "Inventory::is_empty")]
    pub output: Inventory,
    /// Terrain the hosting tile must have
    #[serde(
        rename = "terrain",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub required_terrain: Option<Terrain>,
    /// Special structures (Market, Settlement) never run the production rule
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub special: bool,
}

impl Structure {
    pub fn new(kind: StructureType) -> Self {
        Self {
            kind,
            input: Inventory::new(),
            output: Inventory::new(),
            required_terrain: None,
            special: false,
        }
    }

    pub fn special(mut self) -> Self {
        self.special = true;
        self
    }

    pub fn on(mut self, terrain: Terrain) -> Self {
        self.required_terrain = Some(terrain);
        self
    }

    pub fn with_input(mut self, resource: Resource, amount: u64) -> Self {
        self.input.add(resource, amount);
        self
    }

    pub fn with_output(mut self, resource: Resource, amount: u64) -> Self {
        self.output.add(resource, amount);
        self
    }

    pub fn allows(&self, terrain: Terrain) -> bool {
        self.required_terrain.is_none_or(|required| required == terrain)
    }
}

// ============================================================================
// Catalog - Static definitions keyed by structure type
// ============================================================================

/// Get the definition for a structure type. `None` for types without one.
pub fn structure_for(kind: StructureType) -> Option<Structure> {
    match kind {
        StructureType::Market => Some(Structure::new(kind).special()),
        StructureType::Settlement => Some(Structure::new(kind).special()),
        StructureType::Farm => Some(
            Structure::new(kind)
                .on(Terrain::Grass)
                .with_output(Resource::Food, 2),
        ),
        StructureType::GoldMine => Some(
            Structure::new(kind)
                .on(Terrain::Mountain)
                .with_output(Resource::Gold, 1),
        ),
        StructureType::LoggingCamp => Some(
            Structure::new(kind)
                .on(Terrain::Jungle)
                .with_output(Resource::Wood, 1),
        ),
        StructureType::None
        | StructureType::Tavern
        | StructureType::ShipYard
        | StructureType::IronMine
        | StructureType::CoalMine
        | StructureType::ClayPit
        | StructureType::SandPit
        | StructureType::SugarPlantation
        | StructureType::CottonPlantation
        | StructureType::TobaccoPlantation
        | StructureType::Woodcutters
        | StructureType::Smelter
        | StructureType::BrickMaker
        | StructureType::Potter
        | StructureType::Weavers
        | StructureType::PaperMill
        | StructureType::ConcreteFactory
        | StructureType::GlassBlowers
        | StructureType::Distillery
        | StructureType::Tailor
        | StructureType::SailMakers
        | StructureType::CigarFactory
        | StructureType::Blacksmith => None,
    }
}

/// Every structure with a definition, in declaration order.
pub fn defined_structures() -> impl Iterator<Item = Structure> {
    StructureType::all().filter_map(structure_for)
}

/// Structures that may be built on a tile of the given terrain.
pub fn buildable_on(terrain: Terrain) -> Vec<Structure> {
    defined_structures().filter(|s| s.allows(terrain)).collect()
}

/// Sale price of one unit at a market.
pub fn resource_cost(resource: Resource) -> Option<u64> {
    match resource {
        Resource::Gold => Some(3),
        Resource::Pots => Some(7),
        Resource::Clothes => Some(12),
        Resource::Cigar => Some(18),
        Resource::Weapons => Some(25),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog entry for {key:?} defines {found:?}")]
    KindMismatch {
        key: StructureType,
        found: StructureType,
    },
    #[error("{kind:?} requires {terrain:?}, which is not a land terrain")]
    InvalidTerrain {
        kind: StructureType,
        terrain: Terrain,
    },
}

/// Consistency check over the whole catalog.
pub fn validate_catalog() -> Result<(), CatalogError> {
    for key in StructureType::all() {
        let Some(def) = structure_for(key) else {
            continue;
        };
        if def.kind != key {
            return Err(CatalogError::KindMismatch {
                key,
                found: def.kind,
            });
        }
        if let Some(terrain) = def.required_terrain {
            if !terrain.is_land() {
                return Err(CatalogError::InvalidTerrain {
                    kind: key,
                    terrain,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_consistent() {
        assert_eq!(validate_catalog(), Ok(()));
    }

    #[test]
    fn test_special_structures() {
        let market = structure_for(StructureType::Market).unwrap();
        assert!(market.special);
        assert!(market.output.is_empty());
        assert!(structure_for(StructureType::Settlement).unwrap().special);
        assert!(!structure_for(StructureType::Farm).unwrap().special);
    }

    #[test]
    fn test_undefined_types() {
        assert!(structure_for(StructureType::None).is_none());
        assert!(structure_for(StructureType::Blacksmith).is_none());
        assert_eq!(defined_structures().count(), 5);
    }

    #[test]
    fn test_buildable_on_terrain() {
        let kinds: Vec<_> = buildable_on(Terrain::Grass)
            .into_iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                StructureType::Market,
                StructureType::Settlement,
                StructureType::Farm
            ]
        );

        let kinds: Vec<_> = buildable_on(Terrain::Desert)
            .into_iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(kinds, vec![StructureType::Market, StructureType::Settlement]);
    }

    #[test]
    fn test_resource_costs() {
        assert_eq!(resource_cost(Resource::Gold), Some(3));
        assert_eq!(resource_cost(Resource::Weapons), Some(25));
        assert_eq!(resource_cost(Resource::Food), None);
    }

    #[test]
    fn test_structure_wire_shape() {
        let farm = structure_for(StructureType::Farm).unwrap();
        let json = serde_json::to_value(&farm).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Farm", "output": {"Food": 2}, "terrain": "Grass"})
        );
    }
}
