pub mod memory;

pub use memory::MemoryStore;

use crate::error::{CompostOpsError, Result};
use crate::models::{
    CompostMethod, MaterialAddition, MoistureCategory, Pile, TemperatureCategory, TurnEvent,
};
use chrono::{DateTime, Utc};

/// Persistence collaborator for piles and their children.
///
/// Children refer to piles by id. Reads return a full snapshot of a pile
/// with its additions and turns in chronological order. Mutations on a
/// missing pile or material fail with `NotFound`.
pub trait PileStore: Send + Sync {
    fn insert_pile(&self, pile: &Pile) -> Result<i64>;

    fn get_pile(&self, id: i64) -> Result<Option<Pile>>;

    fn list_piles(&self) -> Result<Vec<Pile>>;

    fn update_vitals(
        &self,
        pile_id: i64,
        temperature: TemperatureCategory,
        moisture: MoistureCategory,
        logged_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Stores a batch of additions for one pile and sets its `last_logged`.
    /// Either every addition is stored or none is. Returns the new ids.
    fn insert_materials(
        &self,
        pile_id: i64,
        additions: &[MaterialAddition],
        logged_at: DateTime<Utc>,
    ) -> Result<Vec<i64>>;

    fn get_material(&self, id: i64) -> Result<Option<MaterialAddition>>;

    fn set_material_shredded(&self, id: i64, shredded: bool) -> Result<()>;

    fn delete_material(&self, id: i64) -> Result<()>;

    fn insert_turn(&self, turn: &TurnEvent) -> Result<i64>;

    fn set_estimated_harvest(&self, pile_id: i64, at: Option<DateTime<Utc>>) -> Result<()>;

    /// Sets `harvested_at` if it is still empty. An existing value is kept.
    fn mark_harvested(&self, pile_id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Removes the pile together with its additions and turns.
    fn delete_pile(&self, pile_id: i64) -> Result<()>;

    fn insert_method(&self, method: &CompostMethod) -> Result<i64>;

    fn get_method(&self, id: i64) -> Result<Option<CompostMethod>>;

    fn find_method(&self, name: &str) -> Result<Option<CompostMethod>>;

    fn list_methods(&self) -> Result<Vec<CompostMethod>>;
}

/// Rejects a batch containing additions that belong to another pile.
pub(crate) fn check_batch(pile_id: i64, additions: &[MaterialAddition]) -> Result<()> {
    match additions.iter().find(|a| a.pile_id != pile_id) {
        Some(stray) => Err(CompostOpsError::InvalidData(format!(
            "material for pile {} in a batch for pile {}",
            stray.pile_id, pile_id
        ))),
        None => Ok(()),
    }
}
