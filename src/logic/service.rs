use super::balance;
use super::eta::EtaEngine;
use super::tasks::TaskEngine;
use crate::config::{Config, MethodConfig, PileDefaults};
use crate::error::{CompostOpsError, Result};
use crate::models::{
    BalanceRecommendation, CompostMethod, EtaResult, MaterialAddition, MaterialKind,
    MoistureCategory, Pile, Reminder, Task, TemperatureCategory, TurnEvent,
};
use crate::store::PileStore;
use chrono::{DateTime, Utc};

/// Application service tying the store to the three engines.
///
/// Every mutation that can change an estimate input is followed by an
/// estimate recompute. Writing the estimate back is best effort: a failed
/// write is logged and the previous estimate stays in place.
pub struct PileService<S: PileStore> {
    store: S,
    eta: EtaEngine,
    tasks: TaskEngine,
    defaults: PileDefaults,
}

impl<S: PileStore> PileService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            eta: EtaEngine::new(&config.harvest),
            tasks: TaskEngine::new(&config.reminders),
            defaults: config.pile.clone(),
        }
    }

    pub fn eta_engine(&self) -> &EtaEngine {
        &self.eta
    }

    pub fn task_engine(&self) -> &TaskEngine {
        &self.tasks
    }

    /// Inserts configured methods that the store does not know yet.
    /// Returns how many were added.
    pub fn seed_methods(&self, methods: &[MethodConfig]) -> Result<usize> {
        let mut added = 0;
        for method in methods {
            if self.store.find_method(&method.name)?.is_some() {
                continue;
            }
            self.store.insert_method(&CompostMethod::new(
                method.name.clone(),
                method.low_days,
                method.high_days,
            ))?;
            added += 1;
        }
        if added > 0 {
            tracing::info!(added, "Seeded compost methods");
        }
        Ok(added)
    }

    pub fn create_pile(
        &self,
        name: &str,
        method_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Pile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompostOpsError::InvalidData(
                "pile name must not be empty".into(),
            ));
        }

        let mut pile = Pile::new(name, now)
            .with_vitals(self.defaults.temperature, self.defaults.moisture);

        if let Some(method_name) = method_name {
            let method = self
                .store
                .find_method(method_name)?
                .ok_or_else(|| CompostOpsError::NotFound(format!("method '{}'", method_name)))?;
            if let Some(method_id) = method.id {
                pile = pile.with_method(method_id);
            }
        }

        let id = self.store.insert_pile(&pile)?;
        self.recompute_eta(id, now)?;
        self.pile(id)
    }

    pub fn pile(&self, pile_id: i64) -> Result<Pile> {
        self.store
            .get_pile(pile_id)?
            .ok_or_else(|| CompostOpsError::NotFound(format!("pile {}", pile_id)))
    }

    pub fn piles(&self) -> Result<Vec<Pile>> {
        self.store.list_piles()
    }

    pub fn method_for(&self, pile: &Pile) -> Result<Option<CompostMethod>> {
        match pile.method_id {
            Some(id) => self.store.get_method(id),
            None => Ok(None),
        }
    }

    pub fn methods(&self) -> Result<Vec<CompostMethod>> {
        self.store.list_methods()
    }

    /// Logs `count` single-unit additions of one material kind.
    pub fn add_material(
        &self,
        pile_id: i64,
        kind: MaterialKind,
        count: u32,
        shredded: bool,
        now: DateTime<Utc>,
    ) -> Result<Pile> {
        if count == 0 {
            return Err(CompostOpsError::InvalidData(
                "material count must be at least 1".into(),
            ));
        }
        self.pile(pile_id)?;

        let batch: Vec<MaterialAddition> = (0..count)
            .map(|_| MaterialAddition::new(pile_id, kind, shredded, now))
            .collect();
        self.store.insert_materials(pile_id, &batch, now)?;
        tracing::info!(pile_id, kind = kind.as_str(), count, shredded, "Added material");

        self.recompute_eta(pile_id, now)?;
        self.pile(pile_id)
    }

    pub fn set_shredded(&self, material_id: i64, shredded: bool, now: DateTime<Utc>) -> Result<Pile> {
        let material = self.material(material_id)?;
        self.store.set_material_shredded(material_id, shredded)?;
        self.recompute_eta(material.pile_id, now)?;
        self.pile(material.pile_id)
    }

    pub fn remove_material(&self, material_id: i64, now: DateTime<Utc>) -> Result<Pile> {
        let material = self.material(material_id)?;
        self.store.delete_material(material_id)?;
        tracing::info!(material_id, pile_id = material.pile_id, "Removed material");
        self.recompute_eta(material.pile_id, now)?;
        self.pile(material.pile_id)
    }

    pub fn update_vitals(
        &self,
        pile_id: i64,
        temperature: TemperatureCategory,
        moisture: MoistureCategory,
        now: DateTime<Utc>,
    ) -> Result<Pile> {
        self.store
            .update_vitals(pile_id, temperature, moisture, now)?;
        tracing::info!(
            pile_id,
            temperature = temperature.as_str(),
            moisture = moisture.as_str(),
            "Updated vitals"
        );
        self.recompute_eta(pile_id, now)?;
        self.pile(pile_id)
    }

    pub fn turn_pile(&self, pile_id: i64, now: DateTime<Utc>) -> Result<Pile> {
        self.store.insert_turn(&TurnEvent::new(pile_id, now))?;
        tracing::info!(pile_id, "Recorded turn");
        self.recompute_eta(pile_id, now)?;
        self.pile(pile_id)
    }

    /// Marks the pile harvested. Harvesting twice keeps the first timestamp.
    pub fn harvest_pile(&self, pile_id: i64, now: DateTime<Utc>) -> Result<Pile> {
        self.store.mark_harvested(pile_id, now)?;
        tracing::info!(pile_id, "Harvested pile");
        self.pile(pile_id)
    }

    pub fn delete_pile(&self, pile_id: i64) -> Result<()> {
        self.store.delete_pile(pile_id)
    }

    /// Computes the estimate without writing anything back.
    pub fn estimate(&self, pile_id: i64, now: DateTime<Utc>) -> Result<EtaResult> {
        let pile = self.pile(pile_id)?;
        Ok(self.eta.compute(&pile, now))
    }

    /// Computes the estimate and stores its date on the pile.
    ///
    /// Only reading the pile can fail; the write-back is non-fatal.
    pub fn recompute_eta(&self, pile_id: i64, now: DateTime<Utc>) -> Result<EtaResult> {
        let result = self.estimate(pile_id, now)?;
        if let Err(e) = self
            .store
            .set_estimated_harvest(pile_id, Some(result.estimated_date))
        {
            tracing::warn!(pile_id, error = %e, "Failed to store harvest estimate, keeping previous value");
        }
        Ok(result)
    }

    pub fn balance(&self, pile_id: i64) -> Result<BalanceRecommendation> {
        let pile = self.pile(pile_id)?;
        Ok(balance::recommend(pile.total_brown(), pile.total_green()))
    }

    pub fn tasks(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let piles = self.store.list_piles()?;
        Ok(self.tasks.build_tasks(&piles, now))
    }

    pub fn reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        Ok(self
            .tasks(now)?
            .iter()
            .filter_map(Task::reminder)
            .collect())
    }

    fn material(&self, material_id: i64) -> Result<MaterialAddition> {
        self.store
            .get_material(material_id)?
            .ok_or_else(|| CompostOpsError::NotFound(format!("material {}", material_id)))
    }
}
