use crate::db::Database;
use crate::error::Result;

const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS methods (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        low_days INTEGER NOT NULL,
        high_days INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS piles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        temperature TEXT NOT NULL,
        moisture TEXT NOT NULL,
        method_id INTEGER REFERENCES methods(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL,
        last_logged TEXT,
        harvested_at TEXT,
        estimated_harvest_at TEXT
    );

    CREATE TABLE IF NOT EXISTS material_additions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pile_id INTEGER NOT NULL REFERENCES piles(id) ON DELETE CASCADE,
        brown_amount INTEGER NOT NULL DEFAULT 0 CHECK (brown_amount >= 0),
        green_amount INTEGER NOT NULL DEFAULT 0 CHECK (green_amount >= 0),
        is_shredded INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS turn_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pile_id INTEGER NOT NULL REFERENCES piles(id) ON DELETE CASCADE,
        turned_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    // Migration 2: Add indexes
    r#"
    CREATE INDEX IF NOT EXISTS idx_material_additions_pile_id
        ON material_additions(pile_id);
    CREATE INDEX IF NOT EXISTS idx_turn_events_pile_id
        ON turn_events(pile_id, turned_at);
    "#,
];

pub fn run(db: &Database) -> Result<()> {
    db.with_conn_mut(|conn| {
        // Ensure schema_migrations table exists
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                tracing::info!("Applying migration {}", version);
                let tx = conn.transaction()?;
                tx.execute_batch(migration)?;
                tx.execute(
                    "INSERT INTO schema_migrations (version) VALUES (?1)",
                    [version],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    })
}
