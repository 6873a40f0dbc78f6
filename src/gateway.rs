//! Persistence gateway for the intake endpoint
//!
//! Accepts the multipart transport payload, rebuilds the draft shape it
//! describes, re-runs the rule engine server-side (the client is not
//! trusted), stores evidence bytes in the blob store, and lands the record
//! in one atomic transaction. Any failure rolls the transaction back; the
//! client sees `{success: false, error}` and keeps its draft for a manual
//! retry. Retried requests are not deduplicated in this version.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blob_store::BlobStore;
use crate::db::projects::insert_submission;
use crate::db::{NewEvidence, NewSpecies, ProjectRecord, RegistryDb};
use crate::draft::{
    LocalDraft, OrganizationDraft, ProjectDraft, RegulatoryStatus, SpeciesRow, Variant,
};
use crate::error::RegistryError;
use crate::evidence::{EvidenceBundle, EvidenceCategory, EvidenceFile};
use crate::multipart::{self, Part};
use crate::validate;

/// Intake endpoint response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntakeResponse {
    pub fn accepted(id: String) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn rejected(error: String) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error),
        }
    }
}

/// Server-side intake processing
pub struct Gateway {
    db: Arc<RegistryDb>,
    blobs: Arc<BlobStore>,
}

impl Gateway {
    pub fn new(db: Arc<RegistryDb>, blobs: Arc<BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Process one submission payload, returning the new record id
    pub async fn accept(
        &self,
        content_type: &str,
        body: &[u8],
    ) -> Result<String, RegistryError> {
        let boundary = multipart::boundary_from_content_type(content_type)?;
        let parts = multipart::decode(&boundary, body)?;
        let (draft, bundle) = draft_from_parts(&parts)?;

        let errors = validate::validate(&draft, &bundle);
        if !errors.is_empty() {
            let (key, message) = errors
                .first_error(validate::field_order(&draft))
                .unwrap_or(("form", "Invalid submission"));
            warn!(field = key, "Rejected submission");
            return Err(RegistryError::InvalidInput(format!("{}: {}", key, message)));
        }

        self.persist(&draft, &bundle).await
    }

    async fn persist(
        &self,
        draft: &ProjectDraft,
        bundle: &EvidenceBundle,
    ) -> Result<String, RegistryError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let record = record_from_draft(&id, &created_at, draft);
        let species = species_rows(draft);

        // Evidence bytes land in the blob store first; rows only reference
        // them. A blob orphaned by a failed transaction is harmless: it is
        // content-addressed and reused on retry.
        let mut files = Vec::with_capacity(bundle.files().len());
        for file in bundle.files() {
            let stored = self.blobs.store(&file.bytes).await?;
            files.push(NewEvidence {
                category: file.category.field_name().to_string(),
                file_name: file.name.clone(),
                mime: file.mime.clone(),
                size_bytes: file.size_bytes as i64,
                locator: stored.locator,
            });
        }

        self.db
            .with_conn_mut(|conn| insert_submission(conn, &record, &species, &files))?;

        info!(
            id = %id,
            variant = %record.variant,
            species = species.len(),
            files = files.len(),
            "Stored pending submission"
        );
        Ok(id)
    }

    /// Lookup summary for a stored record
    pub fn summary(
        &self,
        id: &str,
    ) -> Result<Option<crate::db::ProjectSummary>, RegistryError> {
        self.db
            .with_conn(|conn| crate::db::projects::get_summary(conn, id))
    }

    pub fn db_stats(&self) -> Result<crate::db::DbStats, RegistryError> {
        self.db.stats()
    }

    pub async fn blob_stats(&self) -> Result<crate::blob_store::BlobStats, RegistryError> {
        self.blobs.stats().await
    }
}

// ── Payload → draft reconstruction ──────────────────────────────────────────

fn split_parts(parts: &[Part]) -> Result<(HashMap<String, String>, EvidenceBundle), RegistryError> {
    let mut texts = HashMap::new();
    let mut bundle = EvidenceBundle::new();

    for part in parts {
        match part {
            Part::Text { name, value } => {
                texts.insert(name.clone(), value.clone());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                let category = EvidenceCategory::from_field_name(name).ok_or_else(|| {
                    RegistryError::Payload(format!("Unknown file field: {}", name))
                })?;
                bundle.attach(EvidenceFile::new(
                    category,
                    filename.clone(),
                    content_type.clone(),
                    data.clone(),
                ));
            }
        }
    }

    Ok((texts, bundle))
}

fn text(texts: &HashMap<String, String>, key: &str) -> String {
    texts.get(key).cloned().unwrap_or_default()
}

fn opt_text(texts: &HashMap<String, String>, key: &str) -> Option<String> {
    texts.get(key).filter(|v| !v.is_empty()).cloned()
}

fn parse_bool(texts: &HashMap<String, String>, key: &str) -> bool {
    texts.get(key).map(|v| v == "true").unwrap_or(false)
}

fn parse_f64(
    texts: &HashMap<String, String>,
    key: &str,
) -> Result<Option<f64>, RegistryError> {
    match opt_text(texts, key) {
        Some(v) => v
            .parse::<f64>()
            .map(Some)
            .map_err(|_| RegistryError::Payload(format!("{} is not a number: {}", key, v))),
        None => Ok(None),
    }
}

fn parse_u32(
    texts: &HashMap<String, String>,
    key: &str,
) -> Result<Option<u32>, RegistryError> {
    match opt_text(texts, key) {
        Some(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| RegistryError::Payload(format!("{} is not a count: {}", key, v))),
        None => Ok(None),
    }
}

fn parse_date(
    texts: &HashMap<String, String>,
    key: &str,
) -> Result<Option<NaiveDate>, RegistryError> {
    match opt_text(texts, key) {
        Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RegistryError::Payload(format!("{} is not a date: {}", key, v))),
        None => Ok(None),
    }
}

fn parse_ecosystems(
    texts: &HashMap<String, String>,
) -> Result<crate::draft::EcosystemSelection, RegistryError> {
    let raw = texts.get("ecosystems").cloned().unwrap_or_else(|| "[]".into());
    let names: Vec<String> = serde_json::from_str(&raw)
        .map_err(|_| RegistryError::Payload("ecosystems is not a JSON array".into()))?;

    let mut selection = crate::draft::EcosystemSelection::default();
    for name in names {
        match name.as_str() {
            "mangrove" => selection.mangrove = true,
            "seagrass" => selection.seagrass = true,
            "salt_marsh" => selection.salt_marsh = true,
            "tidal_wetland" => selection.tidal_wetland = true,
            "kelp" => selection.kelp = true,
            "coral_associated" => selection.coral_associated = true,
            other => {
                return Err(RegistryError::Payload(format!(
                    "Unknown ecosystem: {}",
                    other
                )))
            }
        }
    }
    Ok(selection)
}

fn parse_plant_types(
    texts: &HashMap<String, String>,
) -> Result<crate::draft::PlantTypeSelection, RegistryError> {
    let raw = texts.get("plant_types").cloned().unwrap_or_else(|| "{}".into());
    let counts: HashMap<String, Option<u32>> = serde_json::from_str(&raw)
        .map_err(|_| RegistryError::Payload("plant_types is not a JSON object".into()))?;

    let mut selection = crate::draft::PlantTypeSelection::default();
    for (name, count) in counts {
        let choice = match name.as_str() {
            "mangrove_species" => &mut selection.mangrove_species,
            "seagrass_species" => &mut selection.seagrass_species,
            "salt_marsh_grasses" => &mut selection.salt_marsh_grasses,
            "dune_vegetation" => &mut selection.dune_vegetation,
            "other" => &mut selection.other,
            other => {
                return Err(RegistryError::Payload(format!(
                    "Unknown plant type: {}",
                    other
                )))
            }
        };
        choice.selected = true;
        choice.count = count;
    }
    Ok(selection)
}

fn shared_from_texts(
    texts: &HashMap<String, String>,
) -> Result<crate::draft::SharedFields, RegistryError> {
    Ok(crate::draft::SharedFields {
        ecosystems: parse_ecosystems(texts)?,
        plant_types: parse_plant_types(texts)?,
        // The payload's signature slot is already normalized to a file.
        signature: crate::draft::SignatureSource::default(),
        consent: parse_bool(texts, "consent"),
    })
}

/// Rebuild the draft shape a payload describes, so the server runs the
/// same rule engine the client did
pub fn draft_from_parts(
    parts: &[Part],
) -> Result<(ProjectDraft, EvidenceBundle), RegistryError> {
    let (texts, bundle) = split_parts(parts)?;

    let variant = texts
        .get("variant")
        .and_then(|v| Variant::parse(v))
        .ok_or_else(|| RegistryError::Payload("Missing or unknown variant".into()))?;

    let draft = match variant {
        Variant::Local => ProjectDraft::Local(LocalDraft {
            owner_name: text(&texts, "owner_name"),
            phone: text(&texts, "phone"),
            email: text(&texts, "email"),
            country: text(&texts, "country"),
            place_name: text(&texts, "place_name"),
            lat: parse_f64(&texts, "latitude")?,
            lng: parse_f64(&texts, "longitude")?,
            accuracy_m: parse_f64(&texts, "accuracy_m")?,
            area_ha: parse_f64(&texts, "area_ha")?,
            approx_plant_count: parse_u32(&texts, "approx_plant_count")?,
            start_date: parse_date(&texts, "start_date")?,
            seeks_carbon_credits: parse_bool(&texts, "seeks_carbon_credits"),
            shared: shared_from_texts(&texts)?,
        }),
        Variant::Organization => {
            let species: Vec<SpeciesRow> = match opt_text(&texts, "species") {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|_| RegistryError::Payload("species is not valid JSON".into()))?,
                None => Vec::new(),
            };
            let regulatory_required = match opt_text(&texts, "regulatory_required") {
                Some(raw) => RegulatoryStatus::parse(&raw).ok_or_else(|| {
                    RegistryError::Payload(format!("Unknown regulatory status: {}", raw))
                })?,
                None => RegulatoryStatus::default(),
            };

            ProjectDraft::Organization(OrganizationDraft {
                org_type: text(&texts, "org_type"),
                org_name: text(&texts, "org_name"),
                registration_number: text(&texts, "registration_number"),
                contact_person: text(&texts, "contact_person"),
                contact_email: text(&texts, "contact_email"),
                contact_phone: opt_text(&texts, "contact_phone"),
                wallet_address: opt_text(&texts, "wallet_address"),
                start_date: parse_date(&texts, "start_date")?,
                baseline_date: parse_date(&texts, "baseline_date")?,
                end_date: parse_date(&texts, "end_date")?,
                ongoing: parse_bool(&texts, "ongoing"),
                habitat_subtype: text(&texts, "habitat_subtype"),
                methodology: text(&texts, "methodology"),
                sequestration_estimate_tco2e: parse_f64(&texts, "sequestration_estimate")?,
                requested_credits: parse_f64(&texts, "requested_credits")?,
                species,
                monitoring_plan: text(&texts, "monitoring_plan"),
                soil_organic_carbon_pct: parse_f64(&texts, "soil_organic_carbon")?,
                salinity_psu: parse_f64(&texts, "salinity")?,
                water_ph: parse_f64(&texts, "water_ph")?,
                regulatory_required,
                license_number: opt_text(&texts, "license_number"),
                confidential: parse_bool(&texts, "confidential"),
                shared: shared_from_texts(&texts)?,
            })
        }
    };

    Ok((draft, bundle))
}

// ── Draft → record rows ─────────────────────────────────────────────────────

fn plant_types_json(draft: &ProjectDraft) -> String {
    let mut object = serde_json::Map::new();
    for (name, choice) in draft.shared().plant_types.selected() {
        object.insert(name.to_string(), json!(choice.count));
    }
    serde_json::Value::Object(object).to_string()
}

fn record_from_draft(id: &str, created_at: &str, draft: &ProjectDraft) -> ProjectRecord {
    let mut record = ProjectRecord::pending(
        id.to_string(),
        draft.variant().as_str().to_string(),
        created_at.to_string(),
    );
    record.ecosystems_json = json!(draft.shared().ecosystems.selected_names()).to_string();
    record.plant_types_json = plant_types_json(draft);
    record.consent = draft.shared().consent;

    match draft {
        ProjectDraft::Local(d) => {
            record.start_date = d.start_date.map(|d| d.to_string());
            record.owner_name = Some(d.owner_name.clone());
            record.phone = Some(d.phone.clone());
            record.email = Some(d.email.clone());
            record.country = Some(d.country.clone());
            record.place_name = Some(d.place_name.clone());
            record.latitude = d.lat;
            record.longitude = d.lng;
            record.accuracy_m = d.accuracy_m;
            record.area_ha = d.area_ha;
            record.approx_plant_count = d.approx_plant_count.map(|c| c as i64);
            record.seeks_carbon_credits = Some(d.seeks_carbon_credits);
        }
        ProjectDraft::Organization(d) => {
            record.start_date = d.start_date.map(|d| d.to_string());
            record.org_type = Some(d.org_type.clone());
            record.org_name = Some(d.org_name.clone());
            record.registration_number = Some(d.registration_number.clone());
            record.contact_person = Some(d.contact_person.clone());
            record.contact_email = Some(d.contact_email.clone());
            record.contact_phone = d.contact_phone.clone();
            record.wallet_address = d.wallet_address.clone();
            record.baseline_date = d.baseline_date.map(|d| d.to_string());
            record.end_date = d.end_date.map(|d| d.to_string());
            record.ongoing = Some(d.ongoing);
            record.habitat_subtype = Some(d.habitat_subtype.clone());
            record.methodology = Some(d.methodology.clone());
            record.sequestration_estimate = d.sequestration_estimate_tco2e;
            record.requested_credits = d.requested_credits;
            record.monitoring_plan = Some(d.monitoring_plan.clone());
            record.soil_organic_carbon = d.soil_organic_carbon_pct;
            record.salinity = d.salinity_psu;
            record.water_ph = d.water_ph;
            record.regulatory_required = Some(d.regulatory_required.as_str().to_string());
            record.license_number = d.license_number.clone();
            record.confidential = Some(d.confidential);
        }
    }

    record
}

fn species_rows(draft: &ProjectDraft) -> Vec<NewSpecies> {
    match draft {
        ProjectDraft::Local(_) => Vec::new(),
        ProjectDraft::Organization(d) => d
            .species
            .iter()
            .map(|s| NewSpecies {
                species_name: s.species_name.clone(),
                count_planted: s.count_planted as i64,
                planting_density: s.planting_density,
                expected_survival_percent: s.expected_survival_percent,
                age_class: s.age_class.clone(),
            })
            .collect(),
    }
}
