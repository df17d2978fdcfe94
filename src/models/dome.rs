use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Physical venue with a fixed rows x seats-per-row grid.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlanetariumDome {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

impl PlanetariumDome {
    pub fn capacity(&self) -> i64 {
        self.rows as i64 * self.seats_in_row as i64
    }
}
