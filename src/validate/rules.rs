//! Declarative rule tables for both variants.
//!
//! Each rule is a (predicate, field key, message) tuple. Field rules read
//! the draft alone; count rules also read the evidence bundle and are only
//! evaluated once every per-file evidence check has passed, so an
//! insufficient-count error never masks a broken file.

use super::keys;
use crate::draft::{LocalDraft, OrganizationDraft, RegulatoryStatus};
use crate::evidence::{EvidenceBundle, EvidenceCategory};

/// A rule over the draft alone. `failed` returns true when the rule is
/// violated.
pub struct Rule<D> {
    pub key: &'static str,
    pub message: &'static str,
    pub failed: fn(&D) -> bool,
}

/// A rule over the draft plus the attached evidence counts
pub struct CountRule<D> {
    pub key: &'static str,
    pub message: &'static str,
    pub failed: fn(&D, &EvidenceBundle) -> bool,
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Minimal plausibility check; real verification happens out of band
fn implausible_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return true;
    };
    local.is_empty() || domain.is_empty() || !domain.contains('.')
}

fn bad_optional_phone(phone: &Option<String>) -> bool {
    match phone {
        Some(p) => p.len() != 10,
        None => false,
    }
}

fn bad_wallet(wallet: &Option<String>) -> bool {
    match wallet.as_deref() {
        Some(w) if !w.trim().is_empty() => {
            let Some(hex_part) = w.strip_prefix("0x") else {
                return true;
            };
            hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit())
        }
        _ => false,
    }
}

fn out_of_range(value: Option<f64>, min: f64, max: f64) -> bool {
    match value {
        Some(v) => v < min || v > max,
        None => false,
    }
}

/// More than two selected plant types and at least one selected type
/// missing a positive count
fn plant_type_counts_missing(
    plant_types: &crate::draft::PlantTypeSelection,
) -> bool {
    if plant_types.selected_count() <= 2 {
        return false;
    }
    plant_types
        .selected()
        .iter()
        .any(|(_, choice)| choice.count.map(|c| c == 0).unwrap_or(true))
}

// ── Local rules ─────────────────────────────────────────────────────────────

pub const LOCAL_FIELDS: &[Rule<LocalDraft>] = &[
    Rule {
        key: keys::OWNER_NAME,
        message: "Your name is required",
        failed: |d| blank(&d.owner_name),
    },
    Rule {
        key: keys::PHONE,
        message: "Phone number must be exactly 10 digits",
        failed: |d| d.phone.len() != 10,
    },
    Rule {
        key: keys::EMAIL,
        message: "A valid email address is required",
        failed: |d| implausible_email(&d.email),
    },
    Rule {
        key: keys::COUNTRY,
        message: "Country is required",
        failed: |d| blank(&d.country),
    },
    Rule {
        key: keys::PLACE_NAME,
        message: "Place name is required",
        failed: |d| blank(&d.place_name),
    },
    Rule {
        key: keys::LATITUDE,
        message: "Latitude must be between -90 and 90",
        failed: |d| d.lat.map(|v| !(-90.0..=90.0).contains(&v)).unwrap_or(true),
    },
    Rule {
        key: keys::LONGITUDE,
        message: "Longitude must be between -180 and 180",
        failed: |d| d.lng.map(|v| !(-180.0..=180.0).contains(&v)).unwrap_or(true),
    },
    Rule {
        key: keys::AREA_HA,
        message: "Restoration area must be greater than zero hectares",
        failed: |d| d.area_ha.map(|v| v <= 0.0).unwrap_or(true),
    },
    Rule {
        key: keys::APPROX_PLANT_COUNT,
        message: "Approximate plant count is required",
        failed: |d| d.approx_plant_count.map(|c| c == 0).unwrap_or(true),
    },
    Rule {
        key: keys::START_DATE,
        message: "Start date is required",
        failed: |d| d.start_date.is_none(),
    },
    Rule {
        key: keys::ECOSYSTEMS,
        message: "Select at least one ecosystem",
        failed: |d| !d.shared.ecosystems.any_selected(),
    },
    Rule {
        key: keys::PLANT_TYPES,
        message: "Each selected plant type needs a planting count when more than two are selected",
        failed: |d| plant_type_counts_missing(&d.shared.plant_types),
    },
    Rule {
        key: keys::CONSENT,
        message: "Consent is required to submit",
        failed: |d| !d.shared.consent,
    },
];

pub const LOCAL_COUNTS: &[CountRule<LocalDraft>] = &[CountRule {
    key: keys::PHOTOS,
    message: "At least 2 photos of the site are required",
    failed: |_, bundle| bundle.count(EvidenceCategory::Photo) < 2,
}];

// ── Organization rules ──────────────────────────────────────────────────────

pub const ORGANIZATION_FIELDS: &[Rule<OrganizationDraft>] = &[
    Rule {
        key: keys::ORG_TYPE,
        message: "Organization type is required",
        failed: |d| blank(&d.org_type),
    },
    Rule {
        key: keys::ORG_NAME,
        message: "Organization name is required",
        failed: |d| blank(&d.org_name),
    },
    Rule {
        key: keys::REGISTRATION_NUMBER,
        message: "Registration number is required",
        failed: |d| blank(&d.registration_number),
    },
    Rule {
        key: keys::CONTACT_PERSON,
        message: "Contact person is required",
        failed: |d| blank(&d.contact_person),
    },
    Rule {
        key: keys::CONTACT_EMAIL,
        message: "A valid contact email is required",
        failed: |d| implausible_email(&d.contact_email),
    },
    Rule {
        key: keys::CONTACT_PHONE,
        message: "Contact phone must be exactly 10 digits when provided",
        failed: |d| bad_optional_phone(&d.contact_phone),
    },
    Rule {
        key: keys::WALLET_ADDRESS,
        message: "Wallet address must be 0x followed by 40 hex characters",
        failed: |d| bad_wallet(&d.wallet_address),
    },
    Rule {
        key: keys::START_DATE,
        message: "Project start date is required",
        failed: |d| d.start_date.is_none(),
    },
    Rule {
        key: keys::END_DATE,
        message: "Provide an end date or mark the project as ongoing",
        failed: |d| d.end_date.is_none() && !d.ongoing,
    },
    Rule {
        key: keys::HABITAT_SUBTYPE,
        message: "Habitat subtype is required",
        failed: |d| blank(&d.habitat_subtype),
    },
    Rule {
        key: keys::METHODOLOGY,
        message: "Methodology description is required",
        failed: |d| blank(&d.methodology),
    },
    Rule {
        key: keys::SEQUESTRATION_ESTIMATE,
        message: "Sequestration estimate must be zero or greater",
        failed: |d| d.sequestration_estimate_tco2e.map(|v| v < 0.0).unwrap_or(true),
    },
    Rule {
        key: keys::REQUESTED_CREDITS,
        message: "Requested credits must be zero or greater",
        failed: |d| d.requested_credits.map(|v| v < 0.0).unwrap_or(true),
    },
    Rule {
        key: keys::SPECIES,
        message: "At least one species row is required",
        failed: |d| d.species.is_empty(),
    },
    Rule {
        key: keys::SPECIES,
        message: "The first species row must be named",
        failed: |d| d.species.first().map(|s| blank(&s.species_name)).unwrap_or(false),
    },
    Rule {
        key: keys::SPECIES,
        message: "Expected survival must be between 0 and 100 percent",
        failed: |d| {
            d.species
                .iter()
                .any(|s| out_of_range(s.expected_survival_percent, 0.0, 100.0))
        },
    },
    Rule {
        key: keys::SPECIES,
        message: "Planting density cannot be negative",
        failed: |d| d.species.iter().any(|s| s.planting_density.map(|v| v < 0.0).unwrap_or(false)),
    },
    Rule {
        key: keys::MONITORING_PLAN,
        message: "Monitoring plan is required",
        failed: |d| blank(&d.monitoring_plan),
    },
    Rule {
        key: keys::SOIL_ORGANIC_CARBON,
        message: "Soil organic carbon must be between 0 and 100 percent",
        failed: |d| out_of_range(d.soil_organic_carbon_pct, 0.0, 100.0),
    },
    Rule {
        key: keys::SALINITY,
        message: "Salinity must be between 0 and 60 PSU",
        failed: |d| out_of_range(d.salinity_psu, 0.0, 60.0),
    },
    Rule {
        key: keys::WATER_PH,
        message: "Water pH must be between 0 and 14",
        failed: |d| out_of_range(d.water_ph, 0.0, 14.0),
    },
    Rule {
        key: keys::LICENSE_NUMBER,
        message: "License number is required when regulatory approval applies",
        failed: |d| {
            d.regulatory_required == RegulatoryStatus::Yes
                && d.license_number.as_deref().map(blank).unwrap_or(true)
        },
    },
    Rule {
        key: keys::ECOSYSTEMS,
        message: "Select at least one ecosystem",
        failed: |d| !d.shared.ecosystems.any_selected(),
    },
    Rule {
        key: keys::PLANT_TYPES,
        message: "Each selected plant type needs a planting count when more than two are selected",
        failed: |d| plant_type_counts_missing(&d.shared.plant_types),
    },
    Rule {
        key: keys::CONSENT,
        message: "Consent is required to submit",
        failed: |d| !d.shared.consent,
    },
];

pub const ORGANIZATION_COUNTS: &[CountRule<OrganizationDraft>] = &[
    CountRule {
        key: keys::BOUNDARY_FILE,
        message: "A spatial boundary file is required",
        failed: |_, bundle| bundle.count(EvidenceCategory::BoundaryFile) == 0,
    },
    CountRule {
        key: keys::PHOTOS,
        message: "Provide at least 5 photos, or at least 3 photos plus a satellite image",
        failed: |_, bundle| {
            let photos = bundle.count(EvidenceCategory::Photo);
            let satellite = bundle.count(EvidenceCategory::SatelliteImage);
            !(photos >= 5 || (satellite >= 1 && photos >= 3))
        },
    },
    CountRule {
        key: keys::RESEARCH_DOCUMENTS,
        message: "Selecting more than two plant types requires a research document",
        failed: |d, bundle| {
            d.shared.plant_types.selected_count() > 2
                && bundle.count(EvidenceCategory::ResearchDocument) == 0
        },
    },
    CountRule {
        key: keys::LICENSE_DOCUMENT,
        message: "A license document is required when regulatory approval applies",
        failed: |d, bundle| {
            d.regulatory_required == RegulatoryStatus::Yes
                && bundle.count(EvidenceCategory::LicenseDocument) == 0
        },
    },
    CountRule {
        key: keys::PERMIT_DOCUMENTS,
        message: "At least one permit document is required when regulatory approval applies",
        failed: |d, bundle| {
            d.regulatory_required == RegulatoryStatus::Yes
                && bundle.count(EvidenceCategory::PermitDocument) == 0
        },
    },
    CountRule {
        key: keys::LAND_OWNERSHIP_DOCUMENT,
        message: "Proof of land ownership or tenure is required",
        failed: |_, bundle| bundle.count(EvidenceCategory::LandOwnershipDocument) == 0,
    },
    CountRule {
        key: keys::COMMUNITY_CONSENT_DOCUMENT,
        message: "A community consent document is required",
        failed: |_, bundle| bundle.count(EvidenceCategory::CommunityConsentDocument) == 0,
    },
];
