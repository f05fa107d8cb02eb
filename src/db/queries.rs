use crate::db::Database;
use crate::error::{CompostOpsError, Result};
use crate::models::{
    CompostMethod, MaterialAddition, MoistureCategory, Pile, TemperatureCategory, TurnEvent,
};
use crate::store::PileStore;
use chrono::{DateTime, Utc};
use crate::store::check_batch;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;

/// Required timestamp column. An unparseable value is a decode error.
fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            let index = row.as_ref().column_index(column).unwrap_or_default();
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
        })
}

fn parse_optional_timestamp(column: &str, value: Option<String>) -> Option<DateTime<Utc>> {
    let raw = value?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| warn!(column, value = %raw, "Unparseable timestamp in database, ignoring"))
        .ok()
}

fn ensure_pile(conn: &Connection, pile_id: i64) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM piles WHERE id = ?1", [pile_id], |row| {
            row.get(0)
        })
        .optional()?;
    exists
        .map(|_| ())
        .ok_or_else(|| CompostOpsError::NotFound(format!("pile {}", pile_id)))
}

fn expect_changed(changed: usize, what: impl FnOnce() -> String) -> Result<()> {
    if changed == 0 {
        Err(CompostOpsError::NotFound(what()))
    } else {
        Ok(())
    }
}

// Pile rows

fn row_to_pile(row: &Row) -> rusqlite::Result<Pile> {
    let temperature_str: String = row.get("temperature")?;
    let moisture_str: String = row.get("moisture")?;
    let temperature = TemperatureCategory::from_str(&temperature_str).unwrap_or_else(|| {
        warn!(
            temperature = %temperature_str,
            "Unknown temperature in database, defaulting to Warm"
        );
        TemperatureCategory::Warm
    });
    let moisture = MoistureCategory::from_str(&moisture_str).unwrap_or_else(|| {
        warn!(
            moisture = %moisture_str,
            "Unknown moisture in database, defaulting to Humid"
        );
        MoistureCategory::Humid
    });

    Ok(Pile {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        temperature,
        moisture,
        method_id: row.get("method_id")?,
        created_at: timestamp_column(row, "created_at")?,
        last_logged: parse_optional_timestamp("last_logged", row.get("last_logged")?),
        harvested_at: parse_optional_timestamp("harvested_at", row.get("harvested_at")?),
        estimated_harvest_at: parse_optional_timestamp(
            "estimated_harvest_at",
            row.get("estimated_harvest_at")?,
        ),
        additions: Vec::new(),
        turns: Vec::new(),
    })
}

fn row_to_material(row: &Row) -> rusqlite::Result<MaterialAddition> {
    Ok(MaterialAddition {
        id: Some(row.get("id")?),
        pile_id: row.get("pile_id")?,
        brown_amount: row.get("brown_amount")?,
        green_amount: row.get("green_amount")?,
        is_shredded: row.get("is_shredded")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

fn row_to_turn(row: &Row) -> rusqlite::Result<TurnEvent> {
    Ok(TurnEvent {
        id: Some(row.get("id")?),
        pile_id: row.get("pile_id")?,
        turned_at: timestamp_column(row, "turned_at")?,
    })
}

fn row_to_method(row: &Row) -> rusqlite::Result<CompostMethod> {
    Ok(CompostMethod {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        low_days: row.get("low_days")?,
        high_days: row.get("high_days")?,
    })
}

fn load_children(conn: &Connection, pile: &mut Pile) -> Result<()> {
    let Some(id) = pile.id else {
        return Ok(());
    };

    let mut stmt = conn.prepare(
        "SELECT * FROM material_additions WHERE pile_id = ?1 ORDER BY created_at, id",
    )?;
    pile.additions = stmt
        .query_map([id], row_to_material)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt =
        conn.prepare("SELECT * FROM turn_events WHERE pile_id = ?1 ORDER BY turned_at, id")?;
    pile.turns = stmt
        .query_map([id], row_to_turn)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(())
}

impl PileStore for Database {
    fn insert_pile(&self, pile: &Pile) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO piles
                    (name, temperature, moisture, method_id, created_at, last_logged,
                     harvested_at, estimated_harvest_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    pile.name,
                    pile.temperature.as_str(),
                    pile.moisture.as_str(),
                    pile.method_id,
                    pile.created_at.to_rfc3339(),
                    pile.last_logged.map(|t| t.to_rfc3339()),
                    pile.harvested_at.map(|t| t.to_rfc3339()),
                    pile.estimated_harvest_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            let id = conn.last_insert_rowid();
            tracing::info!(pile_id = id, name = %pile.name, "Created pile");
            Ok(id)
        })
    }

    fn get_pile(&self, id: i64) -> Result<Option<Pile>> {
        self.with_conn(|conn| {
            let pile = conn
                .query_row("SELECT * FROM piles WHERE id = ?1", [id], row_to_pile)
                .optional()?;
            match pile {
                Some(mut pile) => {
                    load_children(conn, &mut pile)?;
                    Ok(Some(pile))
                }
                None => Ok(None),
            }
        })
    }

    fn list_piles(&self) -> Result<Vec<Pile>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM piles ORDER BY id")?;
            let mut piles = stmt
                .query_map([], row_to_pile)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for pile in &mut piles {
                load_children(conn, pile)?;
            }
            Ok(piles)
        })
    }

    fn update_vitals(
        &self,
        pile_id: i64,
        temperature: TemperatureCategory,
        moisture: MoistureCategory,
        logged_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE piles SET temperature = ?1, moisture = ?2, last_logged = ?3 WHERE id = ?4",
                params![
                    temperature.as_str(),
                    moisture.as_str(),
                    logged_at.to_rfc3339(),
                    pile_id
                ],
            )?;
            expect_changed(changed, || format!("pile {}", pile_id))
        })
    }

    fn insert_materials(
        &self,
        pile_id: i64,
        additions: &[MaterialAddition],
        logged_at: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        check_batch(pile_id, additions)?;
        self.with_conn_mut(|conn| {
            ensure_pile(conn, pile_id)?;

            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(additions.len());
            for addition in additions {
                tx.execute(
                    r#"
                    INSERT INTO material_additions
                        (pile_id, brown_amount, green_amount, is_shredded, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        addition.pile_id,
                        addition.brown_amount,
                        addition.green_amount,
                        addition.is_shredded,
                        addition.created_at.to_rfc3339(),
                    ],
                )?;
                ids.push(tx.last_insert_rowid());
            }
            tx.execute(
                "UPDATE piles SET last_logged = ?1 WHERE id = ?2",
                params![logged_at.to_rfc3339(), pile_id],
            )?;
            tx.commit()?;

            Ok(ids)
        })
    }

    fn get_material(&self, id: i64) -> Result<Option<MaterialAddition>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM material_additions WHERE id = ?1",
                [id],
                row_to_material,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    fn set_material_shredded(&self, id: i64, shredded: bool) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE material_additions SET is_shredded = ?1 WHERE id = ?2",
                params![shredded, id],
            )?;
            expect_changed(changed, || format!("material {}", id))
        })
    }

    fn delete_material(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM material_additions WHERE id = ?1", [id])?;
            expect_changed(changed, || format!("material {}", id))
        })
    }

    fn insert_turn(&self, turn: &TurnEvent) -> Result<i64> {
        self.with_conn(|conn| {
            ensure_pile(conn, turn.pile_id)?;
            conn.execute(
                "INSERT INTO turn_events (pile_id, turned_at) VALUES (?1, ?2)",
                params![turn.pile_id, turn.turned_at.to_rfc3339()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn set_estimated_harvest(&self, pile_id: i64, at: Option<DateTime<Utc>>) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE piles SET estimated_harvest_at = ?1 WHERE id = ?2",
                params![at.map(|t| t.to_rfc3339()), pile_id],
            )?;
            expect_changed(changed, || format!("pile {}", pile_id))
        })
    }

    fn mark_harvested(&self, pile_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE piles SET harvested_at = COALESCE(harvested_at, ?1) WHERE id = ?2",
                params![at.to_rfc3339(), pile_id],
            )?;
            expect_changed(changed, || format!("pile {}", pile_id))
        })
    }

    fn delete_pile(&self, pile_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM piles WHERE id = ?1", [pile_id])?;
            expect_changed(changed, || format!("pile {}", pile_id))?;
            tracing::info!(pile_id, "Deleted pile");
            Ok(())
        })
    }

    fn insert_method(&self, method: &CompostMethod) -> Result<i64> {
        if self.find_method(&method.name)?.is_some() {
            return Err(CompostOpsError::InvalidData(format!(
                "method '{}' already exists",
                method.name
            )));
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO methods (name, low_days, high_days) VALUES (?1, ?2, ?3)",
                params![method.name, method.low_days, method.high_days],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn get_method(&self, id: i64) -> Result<Option<CompostMethod>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM methods WHERE id = ?1", [id], row_to_method)
                .optional()
                .map_err(Into::into)
        })
    }

    fn find_method(&self, name: &str) -> Result<Option<CompostMethod>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM methods WHERE name = ?1 COLLATE NOCASE",
                [name],
                row_to_method,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    fn list_methods(&self) -> Result<Vec<CompostMethod>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM methods ORDER BY id")?;
            let methods = stmt
                .query_map([], row_to_method)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(methods)
        })
    }
}
