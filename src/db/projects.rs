//! Submission insert transaction and record queries
//!
//! The insert is one atomic transaction: exactly one parent row, the
//! species children (Organization only) and one evidence row per stored
//! file. Any failure mid-way rolls the whole submission back; no partial
//! project, species or file rows are ever observable.

use rusqlite::{named_params, params, Connection, OptionalExtension};

use super::record::{NewEvidence, NewSpecies, ProjectRecord, ProjectSummary, SubmissionStatus};
use crate::error::RegistryError;

const INSERT_PROJECT_SQL: &str = "\
INSERT INTO projects (
    id, variant, status, created_at,
    ecosystems_json, plant_types_json, consent, start_date,
    owner_name, phone, email, country, place_name,
    latitude, longitude, accuracy_m, area_ha, approx_plant_count, seeks_carbon_credits,
    org_type, org_name, registration_number, contact_person, contact_email,
    contact_phone, wallet_address, baseline_date, end_date, ongoing,
    habitat_subtype, methodology, sequestration_estimate, requested_credits,
    monitoring_plan, soil_organic_carbon, salinity, water_ph,
    regulatory_required, license_number, confidential
) VALUES (
    :id, :variant, :status, :created_at,
    :ecosystems_json, :plant_types_json, :consent, :start_date,
    :owner_name, :phone, :email, :country, :place_name,
    :latitude, :longitude, :accuracy_m, :area_ha, :approx_plant_count, :seeks_carbon_credits,
    :org_type, :org_name, :registration_number, :contact_person, :contact_email,
    :contact_phone, :wallet_address, :baseline_date, :end_date, :ongoing,
    :habitat_subtype, :methodology, :sequestration_estimate, :requested_credits,
    :monitoring_plan, :soil_organic_carbon, :salinity, :water_ph,
    :regulatory_required, :license_number, :confidential
)";

/// Insert one submission atomically
pub fn insert_submission(
    conn: &mut Connection,
    project: &ProjectRecord,
    species: &[NewSpecies],
    files: &[NewEvidence],
) -> Result<(), RegistryError> {
    insert_submission_impl(conn, project, species, files, false)
}

/// Test hook: fail after the species rows land but before any evidence row
#[cfg(test)]
pub(crate) fn insert_submission_fail_after_species(
    conn: &mut Connection,
    project: &ProjectRecord,
    species: &[NewSpecies],
    files: &[NewEvidence],
) -> Result<(), RegistryError> {
    insert_submission_impl(conn, project, species, files, true)
}

fn insert_submission_impl(
    conn: &mut Connection,
    project: &ProjectRecord,
    species: &[NewSpecies],
    files: &[NewEvidence],
    fail_after_species: bool,
) -> Result<(), RegistryError> {
    // Intake may only ever create pending records.
    if project.status != SubmissionStatus::Pending {
        return Err(RegistryError::InvalidInput(format!(
            "New submissions must be pending, got {}",
            project.status.as_str()
        )));
    }

    let tx = conn
        .transaction()
        .map_err(|e| RegistryError::Transaction(format!("Begin failed: {}", e)))?;

    tx.execute(
        INSERT_PROJECT_SQL,
        named_params! {
            ":id": project.id,
            ":variant": project.variant,
            ":status": project.status.as_str(),
            ":created_at": project.created_at,
            ":ecosystems_json": project.ecosystems_json,
            ":plant_types_json": project.plant_types_json,
            ":consent": project.consent,
            ":start_date": project.start_date,
            ":owner_name": project.owner_name,
            ":phone": project.phone,
            ":email": project.email,
            ":country": project.country,
            ":place_name": project.place_name,
            ":latitude": project.latitude,
            ":longitude": project.longitude,
            ":accuracy_m": project.accuracy_m,
            ":area_ha": project.area_ha,
            ":approx_plant_count": project.approx_plant_count,
            ":seeks_carbon_credits": project.seeks_carbon_credits,
            ":org_type": project.org_type,
            ":org_name": project.org_name,
            ":registration_number": project.registration_number,
            ":contact_person": project.contact_person,
            ":contact_email": project.contact_email,
            ":contact_phone": project.contact_phone,
            ":wallet_address": project.wallet_address,
            ":baseline_date": project.baseline_date,
            ":end_date": project.end_date,
            ":ongoing": project.ongoing,
            ":habitat_subtype": project.habitat_subtype,
            ":methodology": project.methodology,
            ":sequestration_estimate": project.sequestration_estimate,
            ":requested_credits": project.requested_credits,
            ":monitoring_plan": project.monitoring_plan,
            ":soil_organic_carbon": project.soil_organic_carbon,
            ":salinity": project.salinity,
            ":water_ph": project.water_ph,
            ":regulatory_required": project.regulatory_required,
            ":license_number": project.license_number,
            ":confidential": project.confidential,
        },
    )
    .map_err(|e| RegistryError::Transaction(format!("Project insert failed: {}", e)))?;

    for (index, row) in species.iter().enumerate() {
        tx.execute(
            "INSERT INTO species (
                project_id, species_name, count_planted, planting_density,
                expected_survival_percent, age_class, order_index
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                row.species_name,
                row.count_planted,
                row.planting_density,
                row.expected_survival_percent,
                row.age_class,
                index as i64,
            ],
        )
        .map_err(|e| RegistryError::Transaction(format!("Species insert failed: {}", e)))?;
    }

    if fail_after_species {
        // Dropping the transaction without commit rolls everything back.
        return Err(RegistryError::Transaction("Injected failure".into()));
    }

    for (index, file) in files.iter().enumerate() {
        tx.execute(
            "INSERT INTO evidence_files (
                project_id, category, file_name, mime, size_bytes, locator, order_index
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                file.category,
                file.file_name,
                file.mime,
                file.size_bytes,
                file.locator,
                index as i64,
            ],
        )
        .map_err(|e| RegistryError::Transaction(format!("Evidence insert failed: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| RegistryError::Transaction(format!("Commit failed: {}", e)))?;

    Ok(())
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRecord> {
    let status_text: String = row.get("status")?;
    let status = SubmissionStatus::parse(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown status: {}", status_text).into(),
        )
    })?;

    Ok(ProjectRecord {
        id: row.get("id")?,
        variant: row.get("variant")?,
        status,
        created_at: row.get("created_at")?,
        ecosystems_json: row.get("ecosystems_json")?,
        plant_types_json: row.get("plant_types_json")?,
        consent: row.get("consent")?,
        start_date: row.get("start_date")?,
        owner_name: row.get("owner_name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        country: row.get("country")?,
        place_name: row.get("place_name")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        accuracy_m: row.get("accuracy_m")?,
        area_ha: row.get("area_ha")?,
        approx_plant_count: row.get("approx_plant_count")?,
        seeks_carbon_credits: row.get("seeks_carbon_credits")?,
        org_type: row.get("org_type")?,
        org_name: row.get("org_name")?,
        registration_number: row.get("registration_number")?,
        contact_person: row.get("contact_person")?,
        contact_email: row.get("contact_email")?,
        contact_phone: row.get("contact_phone")?,
        wallet_address: row.get("wallet_address")?,
        baseline_date: row.get("baseline_date")?,
        end_date: row.get("end_date")?,
        ongoing: row.get("ongoing")?,
        habitat_subtype: row.get("habitat_subtype")?,
        methodology: row.get("methodology")?,
        sequestration_estimate: row.get("sequestration_estimate")?,
        requested_credits: row.get("requested_credits")?,
        monitoring_plan: row.get("monitoring_plan")?,
        soil_organic_carbon: row.get("soil_organic_carbon")?,
        salinity: row.get("salinity")?,
        water_ph: row.get("water_ph")?,
        regulatory_required: row.get("regulatory_required")?,
        license_number: row.get("license_number")?,
        confidential: row.get("confidential")?,
    })
}

/// Fetch a full record by id
pub fn get_record(
    conn: &Connection,
    project_id: &str,
) -> Result<Option<ProjectRecord>, RegistryError> {
    conn.query_row(
        "SELECT * FROM projects WHERE id = ?1",
        params![project_id],
        record_from_row,
    )
    .optional()
    .map_err(|e| RegistryError::Internal(format!("Query failed: {}", e)))
}

/// Fetch the lookup summary for a record
pub fn get_summary(
    conn: &Connection,
    project_id: &str,
) -> Result<Option<ProjectSummary>, RegistryError> {
    conn.query_row(
        "SELECT id, variant, status, created_at,
                (SELECT COUNT(*) FROM species WHERE project_id = projects.id),
                (SELECT COUNT(*) FROM evidence_files WHERE project_id = projects.id)
         FROM projects WHERE id = ?1",
        params![project_id],
        |row| {
            Ok(ProjectSummary {
                id: row.get(0)?,
                variant: row.get(1)?,
                status: row.get(2)?,
                created_at: row.get(3)?,
                species_count: row.get(4)?,
                evidence_count: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(|e| RegistryError::Internal(format!("Query failed: {}", e)))
}

/// Species children for a record, in insert order
pub fn species_for(
    conn: &Connection,
    project_id: &str,
) -> Result<Vec<NewSpecies>, RegistryError> {
    let mut stmt = conn
        .prepare(
            "SELECT species_name, count_planted, planting_density,
                    expected_survival_percent, age_class
             FROM species WHERE project_id = ?1 ORDER BY order_index",
        )
        .map_err(|e| RegistryError::Internal(format!("Prepare failed: {}", e)))?;

    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok(NewSpecies {
                species_name: row.get(0)?,
                count_planted: row.get(1)?,
                planting_density: row.get(2)?,
                expected_survival_percent: row.get(3)?,
                age_class: row.get(4)?,
            })
        })
        .map_err(|e| RegistryError::Internal(format!("Query failed: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| RegistryError::Internal(format!("Row failed: {}", e)))
}

/// Evidence children for a record, in insert order
pub fn evidence_for(
    conn: &Connection,
    project_id: &str,
) -> Result<Vec<NewEvidence>, RegistryError> {
    let mut stmt = conn
        .prepare(
            "SELECT category, file_name, mime, size_bytes, locator
             FROM evidence_files WHERE project_id = ?1 ORDER BY order_index",
        )
        .map_err(|e| RegistryError::Internal(format!("Prepare failed: {}", e)))?;

    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok(NewEvidence {
                category: row.get(0)?,
                file_name: row.get(1)?,
                mime: row.get(2)?,
                size_bytes: row.get(3)?,
                locator: row.get(4)?,
            })
        })
        .map_err(|e| RegistryError::Internal(format!("Query failed: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| RegistryError::Internal(format!("Row failed: {}", e)))
}

/// Delete a record; children cascade
pub fn delete_record(conn: &Connection, project_id: &str) -> Result<bool, RegistryError> {
    let deleted = conn
        .execute("DELETE FROM projects WHERE id = ?1", params![project_id])
        .map_err(|e| RegistryError::Internal(format!("Delete failed: {}", e)))?;
    Ok(deleted > 0)
}
