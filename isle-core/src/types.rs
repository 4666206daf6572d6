use serde::{Deserialize, Serialize};
use std::fmt;
use tsify_next::Tsify;

// ============================================================================
// IDs
// ============================================================================

/// Island identifier. Allocated from a monotonic counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IslandId(pub u32);

impl IslandId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn to_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for IslandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a tile on the offset hex grid (column `x`, row `y`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Terrain
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Terrain {
    /// Brush value meaning "select only". Never stored on a tile by painting.
    None,
    Water,
    Grass,
    Jungle,
    Mountain,
    Desert,
}

impl Terrain {
    /// Terrains that belong to an island when painted.
    pub fn is_land(self) -> bool {
        !matches!(self, Terrain::None | Terrain::Water)
    }

    pub fn all() -> impl Iterator<Item = Terrain> {
        [
            Terrain::None,
            Terrain::Water,
            Terrain::Grass,
            Terrain::Jungle,
            Terrain::Mountain,
            Terrain::Desert,
        ]
        .into_iter()
    }
}

// ============================================================================
// Resources - Commodities held in island inventories
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Resource {
    Food,
    Gold,
    Wood,
    Sand,
    Glass,
    Rumours,
    Clay,
    Pots,
    Bricks,
    Planks,
    Iron,
    Cotton,
    Cloth,
    Clothes,
    Coal,
    Steel,
    Sugar,
    Rum,
    Tobacco,
    Paper,
    Cigar,
    Concrete,
    Weapons,
    Sails,
    #[serde(rename = "Ships")]
    Ship,
}

impl Resource {
    pub fn all() -> impl Iterator<Item = Resource> {
        [
            Resource::Food,
            Resource::Gold,
            Resource::Wood,
            Resource::Sand,
            Resource::Glass,
            Resource::Rumours,
            Resource::Clay,
            Resource::Pots,
            Resource::Bricks,
            Resource::Planks,
            Resource::Iron,
            Resource::Cotton,
            Resource::Cloth,
            Resource::Clothes,
            Resource::Coal,
            Resource::Steel,
            Resource::Sugar,
            Resource::Rum,
            Resource::Tobacco,
            Resource::Paper,
            Resource::Cigar,
            Resource::Concrete,
            Resource::Weapons,
            Resource::Sails,
            Resource::Ship,
        ]
        .into_iter()
    }
}

// ============================================================================
// Structure Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum StructureType {
    None,
    Market,
    Settlement,
    Tavern,
    #[serde(rename = "Ship Yard")]
    ShipYard,
    #[serde(rename = "Gold Mine")]
    GoldMine,
    #[serde(rename = "Iron Mine")]
    IronMine,
    #[serde(rename = "Coal Mine")]
    CoalMine,
    #[serde(rename = "Clay Pit")]
    ClayPit,
    #[serde(rename = "Sand Pit")]
    SandPit,
    Farm,
    #[serde(rename = "Sugar Plantation")]
    SugarPlantation,
    #[serde(rename = "Cotton Plantation")]
    CottonPlantation,
    #[serde(rename = "Tobacco Plantation")]
    TobaccoPlantation,
    Woodcutters,
    Smelter,
    #[serde(rename = "Brick Maker")]
    BrickMaker,
    Potter,
    Weavers,
    #[serde(rename = "Paper Mill")]
    PaperMill,
    #[serde(rename = "Logging Camp")]
    LoggingCamp,
    #[serde(rename = "Concrete Factory")]
    ConcreteFactory,
    #[serde(rename = "Glass Blowers")]
    GlassBlowers,
    Distillery,
    Tailor,
    #[serde(rename = "Sail Makers")]
    SailMakers,
    #[serde(rename = "Cigar Factory")]
    CigarFactory,
    Blacksmith,
}

impl StructureType {
    pub fn all() -> impl Iterator<Item = StructureType> {
        [
            StructureType::None,
            StructureType::Market,
            StructureType::Settlement,
            StructureType::Tavern,
            StructureType::ShipYard,
            StructureType::GoldMine,
            StructureType::IronMine,
            StructureType::CoalMine,
            StructureType::ClayPit,
            StructureType::SandPit,
            StructureType::Farm,
            StructureType::SugarPlantation,
            StructureType::CottonPlantation,
            StructureType::TobaccoPlantation,
            StructureType::Woodcutters,
            StructureType::Smelter,
            StructureType::BrickMaker,
            StructureType::Potter,
            StructureType::Weavers,
            StructureType::PaperMill,
            StructureType::LoggingCamp,
            StructureType::ConcreteFactory,
            StructureType::GlassBlowers,
            StructureType::Distillery,
            StructureType::Tailor,
            StructureType::SailMakers,
            StructureType::CigarFactory,
            StructureType::Blacksmith,
        ]
        .into_iter()
    }
}
