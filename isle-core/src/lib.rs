use wasm_bindgen::prelude::*;

mod catalog;
mod grid;
mod inventory;
mod islands;
mod state;
mod types;
mod view;

pub mod config;
pub mod economy;
pub mod hex;
pub mod snapshot;

pub use catalog::*;
pub use config::{ConfigError, SimConfig};
pub use economy::{EconomyConfig, IslandWorkReport, LaborPolicy, WorkReport};
pub use grid::*;
pub use inventory::*;
pub use islands::*;
pub use snapshot::{Snapshot, SnapshotError};
pub use state::*;
pub use types::*;
pub use view::*;

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - Editor
// ============================================================================

/// The map editor as seen from the browser: one world plus UI state
/// (selection, brush and the last warning shown to the user).
#[wasm_bindgen]
pub struct Editor {
    world: World,
    selected: Option<TilePos>,
    brush: Terrain,
    last_warning: Option<String>,
}

#[wasm_bindgen]
impl Editor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();
        Self::from_config(SimConfig::default())
    }

    /// Create an editor from a JSON config. Missing fields take their defaults.
    #[wasm_bindgen]
    pub fn with_config(json: &str) -> Result<Editor, JsError> {
        console_error_panic_hook::set_once();
        Ok(Self::from_config(SimConfig::from_json(json)?))
    }

    /// Same as `with_config` but takes a plain JS object.
    #[wasm_bindgen]
    pub fn with_config_object(config: JsValue) -> Result<Editor, JsError> {
        console_error_panic_hook::set_once();
        let config: SimConfig =
            serde_wasm_bindgen::from_value(config).map_err(|e| JsError::new(&e.to_string()))?;
        config.validate()?;
        Ok(Self::from_config(config))
    }

    // === Selection & painting ===

    /// Click a tile: toggles the selection and paints it with the current brush.
    #[wasm_bindgen]
    pub fn select_tile(&mut self, x: i32, y: i32) -> PaintView {
        PaintView::from(&self.click(TilePos::new(x, y)))
    }

    #[wasm_bindgen]
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    #[wasm_bindgen]
    pub fn set_terrain_brush(&mut self, terrain: Terrain) {
        self.brush = terrain;
    }

    #[wasm_bindgen]
    pub fn terrain_brush(&self) -> Terrain {
        self.brush
    }

    #[wasm_bindgen]
    pub fn selected_tile(&self) -> Selection {
        Selection {
            tile: self
                .selected
                .and_then(|pos| self.world.tile(pos))
                .map(TileView::from),
            island: None,
        }
    }

    /// The island of the selected tile, if it is on one.
    #[wasm_bindgen]
    pub fn selected_island(&self) -> Selection {
        let island = self
            .selected
            .and_then(|pos| self.world.island_at(pos))
            .map(|(id, island)| IslandView::new(id, island));
        Selection {
            tile: None,
            island,
        }
    }

    /// Message of the most recent rejected action. Cleared by the next successful one.
    #[wasm_bindgen]
    pub fn last_warning(&self) -> Option<String> {
        self.last_warning.clone()
    }

    // === Queries ===

    #[wasm_bindgen]
    pub fn get_neighbors(&self, x: i32, y: i32, radius: u32) -> GridView {
        let pos = TilePos::new(x, y);
        GridView::from_tiles(&self.world.grid, self.world.neighbors(pos, radius))
    }

    #[wasm_bindgen]
    pub fn flatten_grid(&self) -> GridView {
        GridView::of(&self.world.grid)
    }

    #[wasm_bindgen]
    pub fn islands(&self) -> IslandList {
        IslandList {
            islands: self
                .world
                .islands
                .iter()
                .map(|(id, island)| IslandView::new(id, island))
                .collect(),
        }
    }

    /// Structures that may be built on the tile's terrain.
    #[wasm_bindgen]
    pub fn buildable_structures(&self, x: i32, y: i32) -> StructureList {
        let structures = match self.world.tile(TilePos::new(x, y)) {
            Some(tile) => buildable_on(tile.terrain),
            None => Vec::new(),
        };
        StructureList {
            structures: structures.iter().map(StructureView::from).collect(),
        }
    }

    #[wasm_bindgen]
    pub fn treasury(&self) -> u64 {
        self.world.treasury
    }

    // === Commands ===

    /// Build on a tile. Returns false and sets `last_warning` when the placement is refused.
    #[wasm_bindgen]
    pub fn construct(&mut self, x: i32, y: i32, kind: StructureType) -> bool {
        let result = self.world.place_structure(TilePos::new(x, y), kind);
        self.note(result.err().map(|e| e.to_string()))
    }

    #[wasm_bindgen]
    pub fn work_tile(&mut self, x: i32, y: i32) -> bool {
        self.world.work_tile(TilePos::new(x, y))
    }

    #[wasm_bindgen]
    pub fn work_islands(&mut self) -> WorkReportView {
        WorkReportView::from(&self.world.work_islands())
    }

    #[wasm_bindgen]
    pub fn rename_island(&mut self, id: u32, name: String) -> bool {
        self.world.rename_island(IslandId(id), name)
    }

    // === Persistence ===

    #[wasm_bindgen]
    pub fn save(&self) -> Result<String, JsError> {
        Ok(self.world.save()?)
    }

    /// Load a save. Anything unreadable leaves a fresh chunk and a warning.
    #[wasm_bindgen]
    pub fn load(&mut self, blob: &str) {
        self.restore(blob);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn from_config(config: SimConfig) -> Self {
        Self {
            world: World::new(config),
            selected: None,
            brush: Terrain::None,
            last_warning: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn selected(&self) -> Option<TilePos> {
        self.selected
    }

    fn click(&mut self, pos: TilePos) -> PaintOutcome {
        if !self.world.grid.contains(pos) {
            return PaintOutcome::OutOfBounds;
        }
        self.selected = if self.selected == Some(pos) {
            None
        } else {
            Some(pos)
        };

        let outcome = self.world.paint(pos, self.brush);
        let warning = match &outcome {
            PaintOutcome::Rejected { touching } => Some(format!(
                "painting {pos} would join islands {}",
                touching
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            _ => None,
        };
        if outcome.changed() || warning.is_some() {
            self.note(warning);
        }
        outcome
    }

    fn restore(&mut self, blob: &str) {
        let warning = match self.world.try_load(blob) {
            Ok(()) => None,
            Err(e) => {
                self.world.load(blob);
                Some(format!("could not load save, started a new map: {e}"))
            }
        };
        self.selected = None;
        self.note(warning);
    }

    /// Record the outcome of an action. Returns true when it succeeded.
    fn note(&mut self, warning: Option<String>) -> bool {
        let ok = warning.is_none();
        self.last_warning = warning;
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === TEST FIXTURES ===

    fn small_editor() -> Editor {
        Editor::from_config(SimConfig {
            chunk_width: 10,
            chunk_height: 8,
            ..SimConfig::default()
        })
    }

    fn paint(editor: &mut Editor, terrain: Terrain, x: i32, y: i32) -> PaintView {
        editor.set_terrain_brush(terrain);
        editor.select_tile(x, y)
    }

    // === TESTS ===

    #[test]
    fn test_new_editor_is_all_water() {
        let editor = small_editor();
        let grid = editor.flatten_grid();
        assert_eq!(grid.tiles.len(), 80);
        assert!(grid.tiles.iter().all(|t| t.terrain == Terrain::Water));
        assert_eq!(editor.terrain_brush(), Terrain::None);
        assert_eq!(editor.treasury(), 0);
    }

    #[test]
    fn test_select_toggles() {
        let mut editor = small_editor();
        editor.select_tile(2, 2);
        assert_eq!(editor.selected(), Some(TilePos::new(2, 2)));
        editor.select_tile(2, 2);
        assert_eq!(editor.selected(), None);

        editor.select_tile(3, 3);
        editor.clear_selection();
        assert_eq!(editor.selected_tile(), Selection::default());
    }

    #[test]
    fn test_none_brush_only_selects() {
        let mut editor = small_editor();
        let view = editor.select_tile(4, 4);
        assert_eq!(view.outcome, "ignored");
        assert_eq!(editor.world().tile(TilePos::new(4, 4)).unwrap().terrain, Terrain::Water);
    }

    #[test]
    fn test_out_of_bounds_click() {
        let mut editor = small_editor();
        let view = editor.select_tile(40, 40);
        assert_eq!(view.outcome, "out_of_bounds");
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn test_paint_selects_island() {
        let mut editor = small_editor();
        let view = paint(&mut editor, Terrain::Grass, 3, 3);
        assert_eq!(view.outcome, "founded");

        let selection = editor.selected_island();
        let island = selection.island.unwrap();
        assert_eq!(island.name, "Island 0");
        assert_eq!(island.tiles, vec![TilePos::new(3, 3)]);
    }

    #[test]
    fn test_rejected_paint_sets_warning() {
        let mut editor = small_editor();
        paint(&mut editor, Terrain::Grass, 1, 3);
        paint(&mut editor, Terrain::Grass, 3, 3);
        let view = paint(&mut editor, Terrain::Grass, 2, 3);

        assert_eq!(view.outcome, "rejected");
        assert!(editor.last_warning().unwrap().contains("0, 1"));
        assert_eq!(editor.islands().islands.len(), 2);

        paint(&mut editor, Terrain::Desert, 5, 5);
        assert_eq!(editor.last_warning(), None);
    }

    #[test]
    fn test_construct_and_buildable() {
        let mut editor = small_editor();
        paint(&mut editor, Terrain::Mountain, 2, 2);

        let kinds: Vec<StructureType> = editor
            .buildable_structures(2, 2)
            .structures
            .iter()
            .map(|s| s.kind)
            .collect();
        assert!(kinds.contains(&StructureType::GoldMine));
        assert!(kinds.contains(&StructureType::Market));
        assert!(!kinds.contains(&StructureType::Farm));

        assert!(!editor.construct(2, 2, StructureType::Farm));
        assert!(editor.last_warning().is_some());
        assert!(editor.construct(2, 2, StructureType::GoldMine));
        assert!(editor.last_warning().is_none());
        assert!(editor.work_tile(2, 2));
    }

    #[test]
    fn test_neighbors_view() {
        let editor = small_editor();
        assert_eq!(editor.get_neighbors(4, 4, 0).tiles.len(), 1);
        assert_eq!(editor.get_neighbors(4, 4, 1).tiles.len(), 7);
        assert_eq!(editor.get_neighbors(4, 4, 2).tiles.len(), 19);
    }

    #[test]
    fn test_neighbors_view_with_unbounded_radius() {
        let editor = small_editor();
        assert_eq!(editor.get_neighbors(4, 4, u32::MAX).tiles.len(), 80);
        assert!(editor.get_neighbors(i32::MAX, i32::MIN, 2).tiles.is_empty());
        assert_eq!(editor.get_neighbors(i32::MAX, i32::MIN, u32::MAX).tiles.len(), 80);
    }

    #[test]
    fn test_save_load_through_editor() {
        let mut editor = small_editor();
        paint(&mut editor, Terrain::Grass, 3, 3);
        editor.rename_island(0, "Tortuga".to_string());
        let blob = editor.world().save().unwrap();

        let mut other = small_editor();
        other.load(&blob);
        assert_eq!(other.world().islands, editor.world().islands);
        assert_eq!(other.last_warning(), None);

        other.load("{broken");
        assert!(other.last_warning().is_some());
        assert!(other.world().islands.is_empty());
    }

    #[test]
    fn test_work_islands_view() {
        let mut editor = Editor::from_config(SimConfig {
            starting_treasury: 10,
            ..SimConfig::default()
        });
        paint(&mut editor, Terrain::Grass, 5, 5);
        paint(&mut editor, Terrain::Grass, 5, 6);
        assert!(editor.construct(5, 5, StructureType::Settlement));
        assert!(editor.construct(5, 6, StructureType::Farm));

        let report = editor.work_islands();
        assert_eq!(report.islands.len(), 1);
        assert_eq!(report.islands[0].building_limit, 2);
        assert_eq!(report.islands[0].max_production, 0);
        assert_eq!(report.treasury_after, 10);
    }
}
