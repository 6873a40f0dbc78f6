//! Registry database schema

use rusqlite::Connection;
use tracing::info;

use crate::error::RegistryError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), RegistryError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new registry schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating registry schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, RegistryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| RegistryError::Internal(format!("Failed to create schema_version table: {}", e)))?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), RegistryError> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| RegistryError::Internal(format!("Failed to clear schema_version: {}", e)))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .map_err(|e| RegistryError::Internal(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), RegistryError> {
    conn.execute_batch(PROJECTS_SCHEMA)
        .map_err(|e| RegistryError::Internal(format!("Failed to create projects table: {}", e)))?;

    conn.execute_batch(CHILDREN_SCHEMA)
        .map_err(|e| RegistryError::Internal(format!("Failed to create child tables: {}", e)))?;

    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|e| RegistryError::Internal(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

fn migrate_schema(conn: &Connection, from_version: i32) -> Result<(), RegistryError> {
    // Add migration steps here as the schema evolves
    match from_version {
        _ => {}
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

/// Parent table: one row per submission, both variants.
/// Variant-specific columns stay NULL for the other variant.
const PROJECTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    variant TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,

    -- Shared selections stored as JSON
    ecosystems_json TEXT NOT NULL DEFAULT '[]',
    plant_types_json TEXT NOT NULL DEFAULT '{}',
    consent INTEGER NOT NULL DEFAULT 0,
    start_date TEXT,

    -- Local submitter columns
    owner_name TEXT,
    phone TEXT,
    email TEXT,
    country TEXT,
    place_name TEXT,
    latitude REAL,
    longitude REAL,
    accuracy_m REAL,
    area_ha REAL,
    approx_plant_count INTEGER,
    seeks_carbon_credits INTEGER,

    -- Organization columns
    org_type TEXT,
    org_name TEXT,
    registration_number TEXT,
    contact_person TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    wallet_address TEXT,
    baseline_date TEXT,
    end_date TEXT,
    ongoing INTEGER,
    habitat_subtype TEXT,
    methodology TEXT,
    sequestration_estimate REAL,
    requested_credits REAL,
    monitoring_plan TEXT,
    soil_organic_carbon REAL,
    salinity REAL,
    water_ph REAL,
    regulatory_required TEXT,
    license_number TEXT,
    confidential INTEGER
);
"#;

/// Child tables, cascade-deleted with their parent
const CHILDREN_SCHEMA: &str = r#"
-- Species planted (Organization submissions only)
CREATE TABLE IF NOT EXISTS species (
    id INTEGER PRIMARY KEY,
    project_id TEXT NOT NULL,
    species_name TEXT NOT NULL,
    count_planted INTEGER NOT NULL DEFAULT 0,
    planting_density REAL,
    expected_survival_percent REAL,
    age_class TEXT,
    order_index INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);

-- Evidence files (both variants); bytes live in the blob store
CREATE TABLE IF NOT EXISTS evidence_files (
    id INTEGER PRIMARY KEY,
    project_id TEXT NOT NULL,
    category TEXT NOT NULL,
    file_name TEXT NOT NULL,
    mime TEXT NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    locator TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);
CREATE INDEX IF NOT EXISTS idx_projects_variant ON projects(variant);
CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at);

CREATE INDEX IF NOT EXISTS idx_species_project_id ON species(project_id);
CREATE INDEX IF NOT EXISTS idx_species_order ON species(project_id, order_index);

CREATE INDEX IF NOT EXISTS idx_evidence_project_id ON evidence_files(project_id);
CREATE INDEX IF NOT EXISTS idx_evidence_category ON evidence_files(category);
CREATE INDEX IF NOT EXISTS idx_evidence_locator ON evidence_files(locator);
"#;
