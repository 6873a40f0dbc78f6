//! Field-key constants and the fixed navigation order.
//!
//! Single source of truth for error-map keys. The order arrays drive which
//! error the client navigates to first; they are declared here, not derived
//! from map iteration order.

// ── Shared keys ─────────────────────────────────────────────────────────────
pub const ECOSYSTEMS: &str = "ecosystems";
pub const PLANT_TYPES: &str = "plant_types";
pub const SIGNATURE: &str = "signature";
pub const CONSENT: &str = "consent";

// ── Local keys ──────────────────────────────────────────────────────────────
pub const OWNER_NAME: &str = "owner_name";
pub const PHONE: &str = "phone";
pub const EMAIL: &str = "email";
pub const COUNTRY: &str = "country";
pub const PLACE_NAME: &str = "place_name";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const AREA_HA: &str = "area_ha";
pub const APPROX_PLANT_COUNT: &str = "approx_plant_count";
pub const START_DATE: &str = "start_date";

// ── Organization keys ───────────────────────────────────────────────────────
pub const ORG_TYPE: &str = "org_type";
pub const ORG_NAME: &str = "org_name";
pub const REGISTRATION_NUMBER: &str = "registration_number";
pub const CONTACT_PERSON: &str = "contact_person";
pub const CONTACT_EMAIL: &str = "contact_email";
pub const CONTACT_PHONE: &str = "contact_phone";
pub const WALLET_ADDRESS: &str = "wallet_address";
pub const END_DATE: &str = "end_date";
pub const HABITAT_SUBTYPE: &str = "habitat_subtype";
pub const METHODOLOGY: &str = "methodology";
pub const SEQUESTRATION_ESTIMATE: &str = "sequestration_estimate";
pub const REQUESTED_CREDITS: &str = "requested_credits";
pub const SPECIES: &str = "species";
pub const MONITORING_PLAN: &str = "monitoring_plan";
pub const SOIL_ORGANIC_CARBON: &str = "soil_organic_carbon";
pub const SALINITY: &str = "salinity";
pub const WATER_PH: &str = "water_ph";
pub const LICENSE_NUMBER: &str = "license_number";

// ── Evidence keys (multipart field names) ───────────────────────────────────
pub const PHOTOS: &str = "photos";
pub const ONSET_IMAGE: &str = "onset_image";
pub const SUPPORTING_DOCUMENTS: &str = "supporting_documents";
pub const SATELLITE_IMAGES: &str = "satellite_images";
pub const LAB_REPORTS: &str = "lab_reports";
pub const RESEARCH_DOCUMENTS: &str = "research_documents";
pub const PERMIT_DOCUMENT: &str = "permit_document";
pub const PERMIT_DOCUMENTS: &str = "permit_documents";
pub const FUNDING_DOCUMENTS: &str = "funding_documents";
pub const BOUNDARY_FILE: &str = "boundary_file";
pub const LICENSE_DOCUMENT: &str = "license_document";
pub const LAND_OWNERSHIP_DOCUMENT: &str = "land_ownership_document";
pub const COMMUNITY_CONSENT_DOCUMENT: &str = "community_consent_document";

/// Navigation order for Local drafts: identity, location, project facts,
/// selections, evidence, then consent.
pub const LOCAL_ORDER: &[&str] = &[
    OWNER_NAME,
    PHONE,
    EMAIL,
    COUNTRY,
    PLACE_NAME,
    LATITUDE,
    LONGITUDE,
    AREA_HA,
    APPROX_PLANT_COUNT,
    START_DATE,
    ECOSYSTEMS,
    PLANT_TYPES,
    PHOTOS,
    ONSET_IMAGE,
    SUPPORTING_DOCUMENTS,
    PERMIT_DOCUMENT,
    SIGNATURE,
    CONSENT,
];

/// Navigation order for Organization drafts
pub const ORGANIZATION_ORDER: &[&str] = &[
    ORG_TYPE,
    ORG_NAME,
    REGISTRATION_NUMBER,
    CONTACT_PERSON,
    CONTACT_EMAIL,
    CONTACT_PHONE,
    WALLET_ADDRESS,
    START_DATE,
    END_DATE,
    HABITAT_SUBTYPE,
    METHODOLOGY,
    SEQUESTRATION_ESTIMATE,
    REQUESTED_CREDITS,
    SPECIES,
    MONITORING_PLAN,
    SOIL_ORGANIC_CARBON,
    SALINITY,
    WATER_PH,
    ECOSYSTEMS,
    PLANT_TYPES,
    BOUNDARY_FILE,
    PHOTOS,
    SATELLITE_IMAGES,
    LAB_REPORTS,
    RESEARCH_DOCUMENTS,
    LICENSE_NUMBER,
    LICENSE_DOCUMENT,
    PERMIT_DOCUMENTS,
    FUNDING_DOCUMENTS,
    LAND_OWNERSHIP_DOCUMENT,
    COMMUNITY_CONSENT_DOCUMENT,
    SIGNATURE,
    CONSENT,
];
