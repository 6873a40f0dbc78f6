//! Shared test fixtures: clean drafts and evidence bundles that satisfy
//! every invariant, for tests to break one piece at a time.

use chrono::NaiveDate;

use crate::draft::{LocalDraft, OrganizationDraft, RegulatoryStatus, SpeciesRow};
use crate::evidence::{EvidenceBundle, EvidenceCategory, EvidenceFile, MIN_FILE_BYTES};

/// An evidence file with real bytes of the given size
pub fn sized_file(
    category: EvidenceCategory,
    name: &str,
    mime: &str,
    size: u64,
) -> EvidenceFile {
    EvidenceFile::new(category, name, mime, vec![0xA5; size as usize])
}

pub fn clean_local_draft() -> LocalDraft {
    let mut draft = LocalDraft {
        owner_name: "Asha Nair".into(),
        phone: "9198765432".into(),
        email: "asha@example.org".into(),
        country: "India".into(),
        place_name: "Pichavaram".into(),
        lat: Some(11.43),
        lng: Some(79.79),
        accuracy_m: Some(12.0),
        area_ha: Some(2.5),
        approx_plant_count: Some(800),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        seeks_carbon_credits: false,
        ..Default::default()
    };
    draft.shared.ecosystems.mangrove = true;
    draft.shared.consent = true;
    draft
}

pub fn clean_local_bundle() -> EvidenceBundle {
    let mut bundle = EvidenceBundle::new();
    bundle.attach(sized_file(
        EvidenceCategory::Photo,
        "photo-1.jpg",
        "image/jpeg",
        MIN_FILE_BYTES,
    ));
    bundle.attach(sized_file(
        EvidenceCategory::Photo,
        "photo-2.jpg",
        "image/jpeg",
        MIN_FILE_BYTES,
    ));
    bundle
}

pub fn clean_org_draft() -> OrganizationDraft {
    let mut draft = OrganizationDraft {
        org_type: "ngo".into(),
        org_name: "Deltas United".into(),
        registration_number: "NGO-4471".into(),
        contact_person: "R. Okafor".into(),
        contact_email: "projects@deltasunited.org".into(),
        contact_phone: Some("5551234567".into()),
        wallet_address: None,
        start_date: NaiveDate::from_ymd_opt(2024, 3, 15),
        baseline_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2030, 3, 15),
        ongoing: false,
        habitat_subtype: "estuarine mangrove".into(),
        methodology: "Hydrological restoration followed by assisted natural regeneration.".into(),
        sequestration_estimate_tco2e: Some(420.0),
        requested_credits: Some(400.0),
        species: vec![SpeciesRow {
            species_name: "Rhizophora mucronata".into(),
            count_planted: 12000,
            planting_density: Some(2500.0),
            expected_survival_percent: Some(70.0),
            age_class: "seedling".into(),
        }],
        monitoring_plan: "Quarterly drone surveys and annual biomass plots.".into(),
        soil_organic_carbon_pct: Some(4.2),
        salinity_psu: Some(28.0),
        water_ph: Some(7.8),
        regulatory_required: RegulatoryStatus::No,
        license_number: None,
        confidential: false,
        ..Default::default()
    };
    draft.shared.ecosystems.mangrove = true;
    draft.shared.ecosystems.tidal_wetland = true;
    draft.shared.consent = true;
    draft
}

/// Base organization evidence plus the given photo/satellite counts
pub fn org_bundle_with(photos: usize, satellites: usize) -> EvidenceBundle {
    let mut bundle = EvidenceBundle::new();
    bundle.attach(sized_file(
        EvidenceCategory::BoundaryFile,
        "site.geojson",
        "application/geo+json",
        MIN_FILE_BYTES,
    ));
    bundle.attach(sized_file(
        EvidenceCategory::LandOwnershipDocument,
        "tenure.pdf",
        "application/pdf",
        MIN_FILE_BYTES,
    ));
    bundle.attach(sized_file(
        EvidenceCategory::CommunityConsentDocument,
        "consent.pdf",
        "application/pdf",
        MIN_FILE_BYTES,
    ));
    bundle.attach(sized_file(
        EvidenceCategory::ResearchDocument,
        "study.pdf",
        "application/pdf",
        MIN_FILE_BYTES,
    ));
    for i in 0..photos {
        bundle.attach(sized_file(
            EvidenceCategory::Photo,
            &format!("photo-{}.jpg", i + 1),
            "image/jpeg",
            MIN_FILE_BYTES,
        ));
    }
    for i in 0..satellites {
        bundle.attach(sized_file(
            EvidenceCategory::SatelliteImage,
            &format!("scene-{}.tif", i + 1),
            "image/tiff",
            MIN_FILE_BYTES,
        ));
    }
    bundle
}

pub fn clean_org_bundle() -> EvidenceBundle {
    org_bundle_with(5, 0)
}
