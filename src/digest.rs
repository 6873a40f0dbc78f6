//! Canonical serialization and content digest (dormant)
//!
//! Deterministic SHA-256 over a fixed scalar subset of a submission
//! record, intended to be anchored to an external ledger once a record is
//! verified. Nothing in the intake path calls this module; it is composed
//! later behind the admin verify transition. Pure functions only: no
//! network, no storage.
//!
//! The canonical encoding is one line per field in the declared order,
//! `key:length:value` for present values and `key:-` for absent ones.
//! Length prefixes make the encoding unambiguous for values containing
//! newlines, colons or leading/trailing whitespace.

use sha2::{Digest, Sha256};

use crate::db::record::ProjectRecord;

/// The scalar fields included in the digest, in canonical order.
///
/// Changing this list changes every digest; append-only once anchoring
/// goes live.
pub const DIGEST_FIELDS: &[&str] = &[
    "id",
    "variant",
    "status",
    "created_at",
    "start_date",
    "owner_name",
    "phone",
    "email",
    "country",
    "place_name",
    "latitude",
    "longitude",
    "area_ha",
    "approx_plant_count",
    "org_type",
    "org_name",
    "registration_number",
    "contact_email",
    "habitat_subtype",
    "sequestration_estimate",
    "requested_credits",
    "regulatory_required",
    "license_number",
    "consent",
];

fn push_field(out: &mut String, key: &str, value: Option<&str>) {
    out.push_str(key);
    match value {
        Some(v) => {
            out.push(':');
            out.push_str(&v.len().to_string());
            out.push(':');
            out.push_str(v);
        }
        None => out.push_str(":-"),
    }
    out.push('\n');
}

fn field_value(record: &ProjectRecord, key: &str) -> Option<String> {
    match key {
        "id" => Some(record.id.clone()),
        "variant" => Some(record.variant.clone()),
        "status" => Some(record.status.as_str().to_string()),
        "created_at" => Some(record.created_at.clone()),
        "start_date" => record.start_date.clone(),
        "owner_name" => record.owner_name.clone(),
        "phone" => record.phone.clone(),
        "email" => record.email.clone(),
        "country" => record.country.clone(),
        "place_name" => record.place_name.clone(),
        "latitude" => record.latitude.map(|v| v.to_string()),
        "longitude" => record.longitude.map(|v| v.to_string()),
        "area_ha" => record.area_ha.map(|v| v.to_string()),
        "approx_plant_count" => record.approx_plant_count.map(|v| v.to_string()),
        "org_type" => record.org_type.clone(),
        "org_name" => record.org_name.clone(),
        "registration_number" => record.registration_number.clone(),
        "contact_email" => record.contact_email.clone(),
        "habitat_subtype" => record.habitat_subtype.clone(),
        "sequestration_estimate" => record.sequestration_estimate.map(|v| v.to_string()),
        "requested_credits" => record.requested_credits.map(|v| v.to_string()),
        "regulatory_required" => record.regulatory_required.clone(),
        "license_number" => record.license_number.clone(),
        "consent" => Some(record.consent.to_string()),
        _ => None,
    }
}

/// The canonical textual encoding of a record's digest fields
pub fn canonicalize(record: &ProjectRecord) -> String {
    let mut out = String::new();
    for key in DIGEST_FIELDS {
        push_field(&mut out, key, field_value(record, key).as_deref());
    }
    out
}

/// Hex SHA-256 digest of the canonical encoding
pub fn content_digest(record: &ProjectRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(record).as_bytes());
    hex::encode(hasher.finalize())
}
