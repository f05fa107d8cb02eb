use super::{check_batch, PileStore};
use crate::error::{CompostOpsError, Result};
use crate::models::{
    CompostMethod, MaterialAddition, MoistureCategory, Pile, TemperatureCategory, TurnEvent,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Arena {
    next_id: i64,
    /// Pile rows; child vectors are always empty here.
    piles: BTreeMap<i64, Pile>,
    materials: BTreeMap<i64, MaterialAddition>,
    turns: BTreeMap<i64, TurnEvent>,
    methods: BTreeMap<i64, CompostMethod>,
}

impl Arena {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn pile_mut(&mut self, id: i64) -> Result<&mut Pile> {
        self.piles
            .get_mut(&id)
            .ok_or_else(|| CompostOpsError::NotFound(format!("pile {}", id)))
    }

    fn snapshot(&self, row: &Pile) -> Pile {
        let mut pile = row.clone();
        let id = row.id;

        pile.additions = self
            .materials
            .values()
            .filter(|m| Some(m.pile_id) == id)
            .cloned()
            .collect();
        pile.additions.sort_by_key(|m| (m.created_at, m.id));

        pile.turns = self
            .turns
            .values()
            .filter(|t| Some(t.pile_id) == id)
            .cloned()
            .collect();
        pile.turns.sort_by_key(|t| (t.turned_at, t.id));

        pile
    }
}

/// Process-local store keyed by stable ids. Used by tests and as a scratch
/// backend; nothing is persisted.
#[derive(Default)]
pub struct MemoryStore {
    arena: Mutex<Arena>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Arena>> {
        self.arena.lock().map_err(|_| CompostOpsError::LockPoisoned)
    }
}

impl PileStore for MemoryStore {
    fn insert_pile(&self, pile: &Pile) -> Result<i64> {
        let mut arena = self.lock()?;
        let id = arena.allocate_id();
        let mut row = pile.clone();
        row.id = Some(id);
        row.additions.clear();
        row.turns.clear();
        arena.piles.insert(id, row);
        Ok(id)
    }

    fn get_pile(&self, id: i64) -> Result<Option<Pile>> {
        let arena = self.lock()?;
        Ok(arena.piles.get(&id).map(|row| arena.snapshot(row)))
    }

    fn list_piles(&self) -> Result<Vec<Pile>> {
        let arena = self.lock()?;
        Ok(arena.piles.values().map(|row| arena.snapshot(row)).collect())
    }

    fn update_vitals(
        &self,
        pile_id: i64,
        temperature: TemperatureCategory,
        moisture: MoistureCategory,
        logged_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut arena = self.lock()?;
        let pile = arena.pile_mut(pile_id)?;
        pile.temperature = temperature;
        pile.moisture = moisture;
        pile.last_logged = Some(logged_at);
        Ok(())
    }

    fn insert_materials(
        &self,
        pile_id: i64,
        additions: &[MaterialAddition],
        logged_at: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        let mut arena = self.lock()?;
        arena.pile_mut(pile_id)?;
        check_batch(pile_id, additions)?;

        let mut ids = Vec::with_capacity(additions.len());
        for addition in additions {
            let id = arena.allocate_id();
            let mut row = addition.clone();
            row.id = Some(id);
            arena.materials.insert(id, row);
            ids.push(id);
        }
        arena.pile_mut(pile_id)?.last_logged = Some(logged_at);
        Ok(ids)
    }

    fn get_material(&self, id: i64) -> Result<Option<MaterialAddition>> {
        Ok(self.lock()?.materials.get(&id).cloned())
    }

    fn set_material_shredded(&self, id: i64, shredded: bool) -> Result<()> {
        let mut arena = self.lock()?;
        let material = arena
            .materials
            .get_mut(&id)
            .ok_or_else(|| CompostOpsError::NotFound(format!("material {}", id)))?;
        material.is_shredded = shredded;
        Ok(())
    }

    fn delete_material(&self, id: i64) -> Result<()> {
        self.lock()?
            .materials
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CompostOpsError::NotFound(format!("material {}", id)))
    }

    fn insert_turn(&self, turn: &TurnEvent) -> Result<i64> {
        let mut arena = self.lock()?;
        arena.pile_mut(turn.pile_id)?;
        let id = arena.allocate_id();
        let mut row = turn.clone();
        row.id = Some(id);
        arena.turns.insert(id, row);
        Ok(id)
    }

    fn set_estimated_harvest(&self, pile_id: i64, at: Option<DateTime<Utc>>) -> Result<()> {
        let mut arena = self.lock()?;
        arena.pile_mut(pile_id)?.estimated_harvest_at = at;
        Ok(())
    }

    fn mark_harvested(&self, pile_id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut arena = self.lock()?;
        let pile = arena.pile_mut(pile_id)?;
        if pile.harvested_at.is_none() {
            pile.harvested_at = Some(at);
        }
        Ok(())
    }

    fn delete_pile(&self, pile_id: i64) -> Result<()> {
        let mut arena = self.lock()?;
        if arena.piles.remove(&pile_id).is_none() {
            return Err(CompostOpsError::NotFound(format!("pile {}", pile_id)));
        }
        arena.materials.retain(|_, m| m.pile_id != pile_id);
        arena.turns.retain(|_, t| t.pile_id != pile_id);
        Ok(())
    }

    fn insert_method(&self, method: &CompostMethod) -> Result<i64> {
        let mut arena = self.lock()?;
        if arena
            .methods
            .values()
            .any(|m| m.name.eq_ignore_ascii_case(&method.name))
        {
            return Err(CompostOpsError::InvalidData(format!(
                "method '{}' already exists",
                method.name
            )));
        }
        let id = arena.allocate_id();
        let mut row = method.clone();
        row.id = Some(id);
        arena.methods.insert(id, row);
        Ok(id)
    }

    fn get_method(&self, id: i64) -> Result<Option<CompostMethod>> {
        Ok(self.lock()?.methods.get(&id).cloned())
    }

    fn find_method(&self, name: &str) -> Result<Option<CompostMethod>> {
        Ok(self
            .lock()?
            .methods
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn list_methods(&self) -> Result<Vec<CompostMethod>> {
        Ok(self.lock()?.methods.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MaterialKind;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 3, 7, 30, 0).unwrap()
    }

    #[test]
    fn snapshot_includes_children_in_order() {
        let store = MemoryStore::new();
        let id = store.insert_pile(&Pile::new("Bin", t0())).unwrap();

        store
            .insert_materials(
                id,
                &[MaterialAddition::new(id, MaterialKind::Green, false, t0() + Duration::hours(2))],
                t0(),
            )
            .unwrap();
        store
            .insert_materials(
                id,
                &[MaterialAddition::new(id, MaterialKind::Brown, true, t0() + Duration::hours(1))],
                t0(),
            )
            .unwrap();
        store.insert_turn(&TurnEvent::new(id, t0() + Duration::days(4))).unwrap();
        store.insert_turn(&TurnEvent::new(id, t0() + Duration::days(2))).unwrap();

        let pile = store.get_pile(id).unwrap().unwrap();
        assert_eq!(pile.id, Some(id));
        assert_eq!(pile.additions.len(), 2);
        assert_eq!(pile.additions[0].brown_amount, 1);
        assert_eq!(pile.turns[0].turned_at, t0() + Duration::days(2));
    }

    #[test]
    fn children_of_other_piles_are_not_mixed_in() {
        let store = MemoryStore::new();
        let a = store.insert_pile(&Pile::new("A", t0())).unwrap();
        let b = store.insert_pile(&Pile::new("B", t0())).unwrap();
        store
            .insert_materials(b, &[MaterialAddition::new(b, MaterialKind::Brown, false, t0())], t0())
            .unwrap();

        assert!(store.get_pile(a).unwrap().unwrap().additions.is_empty());
        assert_eq!(store.get_pile(b).unwrap().unwrap().additions.len(), 1);
    }

    #[test]
    fn delete_cascades() {
        let store = MemoryStore::new();
        let id = store.insert_pile(&Pile::new("Bin", t0())).unwrap();
        let material = store
            .insert_materials(id, &[MaterialAddition::new(id, MaterialKind::Brown, false, t0())], t0())
            .unwrap()[0];
        store.insert_turn(&TurnEvent::new(id, t0())).unwrap();

        store.delete_pile(id).unwrap();
        assert!(store.get_pile(id).unwrap().is_none());
        assert!(store.get_material(material).unwrap().is_none());
        assert!(matches!(
            store.delete_pile(id),
            Err(CompostOpsError::NotFound(_))
        ));
    }

    #[test]
    fn children_require_existing_pile() {
        let store = MemoryStore::new();
        let err = store
            .insert_materials(42, &[MaterialAddition::new(42, MaterialKind::Brown, false, t0())], t0())
            .unwrap_err();
        assert!(matches!(err, CompostOpsError::NotFound(_)));
        assert!(store.insert_turn(&TurnEvent::new(42, t0())).is_err());
    }

    #[test]
    fn harvest_timestamp_is_never_replaced() {
        let store = MemoryStore::new();
        let id = store.insert_pile(&Pile::new("Bin", t0())).unwrap();
        store.mark_harvested(id, t0() + Duration::days(60)).unwrap();
        store.mark_harvested(id, t0() + Duration::days(90)).unwrap();
        let pile = store.get_pile(id).unwrap().unwrap();
        assert_eq!(pile.harvested_at, Some(t0() + Duration::days(60)));
    }

    #[test]
    fn methods_are_unique_by_name() {
        let store = MemoryStore::new();
        store.insert_method(&CompostMethod::new("Hot", 30, 90)).unwrap();
        assert!(store.insert_method(&CompostMethod::new("Hot", 10, 20)).is_err());
        let found = store.find_method("hot").unwrap().unwrap();
        assert_eq!(found.low_days, 30);
        assert_eq!(store.list_methods().unwrap().len(), 1);
    }

    #[test]
    fn method_names_clash_ignoring_case() {
        let store = MemoryStore::new();
        store.insert_method(&CompostMethod::new("Hot", 30, 90)).unwrap();
        let err = store
            .insert_method(&CompostMethod::new("hot", 30, 90))
            .unwrap_err();
        assert!(matches!(err, CompostOpsError::InvalidData(_)));
        assert_eq!(store.list_methods().unwrap().len(), 1);
    }

    #[test]
    fn material_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = store.insert_pile(&Pile::new("A", t0())).unwrap();
        let b = store.insert_pile(&Pile::new("B", t0())).unwrap();
        let later = t0() + Duration::days(3);

        let batch = [
            MaterialAddition::new(a, MaterialKind::Brown, false, later),
            MaterialAddition::new(b, MaterialKind::Brown, false, later),
        ];
        assert!(store.insert_materials(a, &batch, later).is_err());

        let pile = store.get_pile(a).unwrap().unwrap();
        assert!(pile.additions.is_empty());
        assert_eq!(pile.last_logged, Some(t0()));

        let ids = store
            .insert_materials(a, &batch[..1], later)
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(
            store.get_pile(a).unwrap().unwrap().last_logged,
            Some(later)
        );
    }
}
