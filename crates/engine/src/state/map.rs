//! Static battle-map layout: grid dimensions and terrain overlays.

use serde::{Deserialize, Serialize};

use super::common::Position;

/// Map data carried inside the state. Terrain is a sparse overlay; cells
/// without an entry are normal ground.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapState {
    pub name: String,
    pub grid: GridSpec,
    pub terrain: Vec<TerrainTile>,
    pub fog_of_war_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    #[serde(rename = "type")]
    pub kind: GridKind,
    pub size: GridSize,
    pub cell_size: u32,
}

/// Only square grids are supported; the variant is closed so foreign grid
/// types fail at the boundary parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainTile {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: TerrainKind,
    pub blocks_movement: bool,
    pub blocks_vision: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    Normal,
    Difficult,
    Blocked,
}

impl MapState {
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.grid.size.width
            && position.y < self.grid.size.height
    }

    pub fn terrain_at(&self, position: Position) -> Option<&TerrainTile> {
        self.terrain
            .iter()
            .find(|t| t.x == position.x && t.y == position.y)
    }

    pub fn blocks_movement(&self, position: Position) -> bool {
        self.terrain_at(position)
            .map(|t| t.blocks_movement)
            .unwrap_or(false)
    }

    /// Cost of entering a cell: 2 on difficult terrain, 1 otherwise.
    pub fn movement_cost(&self, position: Position) -> u32 {
        match self.terrain_at(position).map(|t| t.kind) {
            Some(TerrainKind::Difficult) => 2,
            _ => 1,
        }
    }
}
