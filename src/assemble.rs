//! Submission assembly
//!
//! Pure transform from a validated draft plus its attached files to the
//! multipart transport payload. Scalars serialize as text parts, the nested
//! selections and the species list as JSON text parts, files as binary
//! parts under their category field names with multiplicity preserved. The
//! source draft is never mutated.

use serde_json::json;
use uuid::Uuid;

use crate::draft::{LocalDraft, OrganizationDraft, ProjectDraft};
use crate::evidence::{EvidenceBundle, EvidenceCategory};
use crate::multipart::{self, Part};
use crate::signature;

/// An assembled transport payload, ready to encode
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    pub boundary: String,
    pub parts: Vec<Part>,
}

impl SubmissionPayload {
    pub fn content_type(&self) -> String {
        multipart::content_type_header(&self.boundary)
    }

    pub fn to_bytes(&self) -> bytes::Bytes {
        multipart::encode(&self.boundary, &self.parts)
    }
}

fn text(name: &str, value: impl ToString) -> Part {
    Part::Text {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn optional_text(parts: &mut Vec<Part>, name: &str, value: Option<impl ToString>) {
    if let Some(v) = value {
        parts.push(text(name, v));
    }
}

/// Ecosystems as a JSON array of selected names
fn ecosystems_part(draft: &ProjectDraft) -> Part {
    text(
        "ecosystems",
        json!(draft.shared().ecosystems.selected_names()).to_string(),
    )
}

/// Plant types as a JSON object of selected names to counts
fn plant_types_part(draft: &ProjectDraft) -> Part {
    let mut object = serde_json::Map::new();
    for (name, choice) in draft.shared().plant_types.selected() {
        object.insert(name.to_string(), json!(choice.count));
    }
    text("plant_types", serde_json::Value::Object(object).to_string())
}

fn local_scalar_parts(d: &LocalDraft) -> Vec<Part> {
    let mut parts = vec![
        text("variant", "local"),
        text("owner_name", &d.owner_name),
        text("phone", &d.phone),
        text("email", &d.email),
        text("country", &d.country),
        text("place_name", &d.place_name),
    ];
    optional_text(&mut parts, "latitude", d.lat);
    optional_text(&mut parts, "longitude", d.lng);
    optional_text(&mut parts, "accuracy_m", d.accuracy_m);
    optional_text(&mut parts, "area_ha", d.area_ha);
    optional_text(&mut parts, "approx_plant_count", d.approx_plant_count);
    optional_text(&mut parts, "start_date", d.start_date);
    parts.push(text("seeks_carbon_credits", d.seeks_carbon_credits));
    parts
}

fn organization_scalar_parts(d: &OrganizationDraft) -> Vec<Part> {
    let mut parts = vec![
        text("variant", "organization"),
        text("org_type", &d.org_type),
        text("org_name", &d.org_name),
        text("registration_number", &d.registration_number),
        text("contact_person", &d.contact_person),
        text("contact_email", &d.contact_email),
    ];
    optional_text(&mut parts, "contact_phone", d.contact_phone.as_deref());
    optional_text(&mut parts, "wallet_address", d.wallet_address.as_deref());
    optional_text(&mut parts, "start_date", d.start_date);
    optional_text(&mut parts, "baseline_date", d.baseline_date);
    optional_text(&mut parts, "end_date", d.end_date);
    parts.push(text("ongoing", d.ongoing));
    parts.push(text("habitat_subtype", &d.habitat_subtype));
    parts.push(text("methodology", &d.methodology));
    optional_text(
        &mut parts,
        "sequestration_estimate",
        d.sequestration_estimate_tco2e,
    );
    optional_text(&mut parts, "requested_credits", d.requested_credits);
    parts.push(text("monitoring_plan", &d.monitoring_plan));
    optional_text(&mut parts, "soil_organic_carbon", d.soil_organic_carbon_pct);
    optional_text(&mut parts, "salinity", d.salinity_psu);
    optional_text(&mut parts, "water_ph", d.water_ph);
    parts.push(text("regulatory_required", d.regulatory_required.as_str()));
    optional_text(&mut parts, "license_number", d.license_number.as_deref());
    parts.push(text("confidential", d.confidential));

    let species_json = serde_json::to_string(&d.species).unwrap_or_else(|_| "[]".to_string());
    parts.push(text("species", species_json));
    parts
}

/// Assemble the transport payload for a validated draft.
///
/// The caller is expected to have run the rule engine first; assembly does
/// not re-validate.
pub fn assemble(draft: &ProjectDraft, bundle: &EvidenceBundle) -> SubmissionPayload {
    let mut parts = match draft {
        ProjectDraft::Local(d) => local_scalar_parts(d),
        ProjectDraft::Organization(d) => organization_scalar_parts(d),
    };

    parts.push(ecosystems_part(draft));
    parts.push(plant_types_part(draft));
    parts.push(text("consent", draft.shared().consent));

    // Files, in upload order. The signature slot is normalized separately.
    for file in bundle.files() {
        if file.category == EvidenceCategory::Signature {
            continue;
        }
        parts.push(Part::File {
            name: file.category.field_name().to_string(),
            filename: file.name.clone(),
            content_type: file.mime.clone(),
            data: file.bytes.clone(),
        });
    }

    // One signature slot; the drawn artifact wins over an uploaded image.
    let drawn = draft.shared().signature.drawn_data_url.as_deref();
    let uploaded = bundle.first_for(EvidenceCategory::Signature);
    if let Some(artifact) = signature::normalize(drawn, uploaded) {
        parts.push(Part::File {
            name: EvidenceCategory::Signature.field_name().to_string(),
            filename: artifact.name,
            content_type: artifact.mime,
            data: artifact.bytes,
        });
    }

    SubmissionPayload {
        boundary: format!("----bluecarbon-{}", Uuid::new_v4().simple()),
        parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MIN_FILE_BYTES;
    use crate::fixtures;

    fn text_value<'a>(payload: &'a SubmissionPayload, name: &str) -> Option<&'a str> {
        payload.parts.iter().find_map(|p| match p {
            Part::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    fn file_parts<'a>(payload: &'a SubmissionPayload, name: &str) -> Vec<&'a Part> {
        payload
            .parts
            .iter()
            .filter(|p| matches!(p, Part::File { name: n, .. } if n == name))
            .collect()
    }

    #[test]
    fn test_local_payload_fields() {
        let draft = ProjectDraft::Local(fixtures::clean_local_draft());
        let bundle = fixtures::clean_local_bundle();
        let payload = assemble(&draft, &bundle);

        assert_eq!(text_value(&payload, "variant"), Some("local"));
        assert_eq!(text_value(&payload, "phone"), Some("9198765432"));
        assert_eq!(text_value(&payload, "start_date"), Some("2025-06-01"));
        assert_eq!(text_value(&payload, "consent"), Some("true"));
        assert_eq!(file_parts(&payload, "photos").len(), 2);

        let ecosystems: Vec<String> =
            serde_json::from_str(text_value(&payload, "ecosystems").unwrap()).unwrap();
        assert_eq!(ecosystems, vec!["mangrove"]);
    }

    #[test]
    fn test_organization_payload_includes_species_json() {
        let draft = ProjectDraft::Organization(fixtures::clean_org_draft());
        let bundle = fixtures::clean_org_bundle();
        let payload = assemble(&draft, &bundle);

        let species: Vec<crate::draft::SpeciesRow> =
            serde_json::from_str(text_value(&payload, "species").unwrap()).unwrap();
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].species_name, "Rhizophora mucronata");

        assert_eq!(file_parts(&payload, "boundary_file").len(), 1);
        assert_eq!(file_parts(&payload, "photos").len(), 5);
    }

    #[test]
    fn test_assemble_does_not_mutate_draft() {
        let draft = ProjectDraft::Organization(fixtures::clean_org_draft());
        let bundle = fixtures::clean_org_bundle();
        let before = draft.clone();

        let _ = assemble(&draft, &bundle);
        assert_eq!(draft, before);
    }

    #[test]
    fn test_signature_slot_prefers_drawn() {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let mut local = fixtures::clean_local_draft();
        local.shared.signature.drawn_data_url =
            Some(format!("data:image/png;base64,{}", STANDARD.encode(b"ink")));
        let draft = ProjectDraft::Local(local);

        let mut bundle = fixtures::clean_local_bundle();
        bundle.attach(fixtures::sized_file(
            EvidenceCategory::Signature,
            "upload.jpg",
            "image/jpeg",
            MIN_FILE_BYTES,
        ));

        let payload = assemble(&draft, &bundle);
        let sigs = file_parts(&payload, "signature");
        assert_eq!(sigs.len(), 1, "exactly one signature slot");
        match sigs[0] {
            Part::File { filename, data, .. } => {
                assert_eq!(filename, "signature.png");
                assert_eq!(data, b"ink");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_payload_roundtrips_through_codec() {
        let draft = ProjectDraft::Organization(fixtures::clean_org_draft());
        let bundle = fixtures::clean_org_bundle();
        let payload = assemble(&draft, &bundle);

        let body = payload.to_bytes();
        let decoded = multipart::decode(&payload.boundary, &body).unwrap();
        assert_eq!(decoded, payload.parts);
    }

    #[test]
    fn test_optional_scalars_omitted_when_absent() {
        let mut org = fixtures::clean_org_draft();
        org.wallet_address = None;
        org.contact_phone = None;
        let payload = assemble(
            &ProjectDraft::Organization(org),
            &fixtures::clean_org_bundle(),
        );

        assert!(text_value(&payload, "wallet_address").is_none());
        assert!(text_value(&payload, "contact_phone").is_none());
    }
}
