//! Draft data model for project registrations
//!
//! A draft is the client-held, not-yet-submitted registration state. Exactly
//! one variant is active at a time: Local (individual/community submitters)
//! or Organization (formal organizations). Sub-structures common to both
//! variants live in [`SharedFields`] and are factored out once.
//!
//! Drafts hold scalar state only. Attached evidence bytes live in an
//! [`crate::evidence::EvidenceBundle`] owned by the same session; draft
//! snapshots survive reloads, file handles do not.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The two mutually exclusive draft shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Local,
    Organization,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Local => "local",
            Variant::Organization => "organization",
        }
    }

    pub fn parse(s: &str) -> Option<Variant> {
        match s {
            "local" => Some(Variant::Local),
            "organization" => Some(Variant::Organization),
            _ => None,
        }
    }
}

/// Coastal ecosystem checkboxes. At least one must be selected to submit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcosystemSelection {
    #[serde(default)]
    pub mangrove: bool,
    #[serde(default)]
    pub seagrass: bool,
    #[serde(default)]
    pub salt_marsh: bool,
    #[serde(default)]
    pub tidal_wetland: bool,
    #[serde(default)]
    pub kelp: bool,
    #[serde(default)]
    pub coral_associated: bool,
}

impl EcosystemSelection {
    pub fn any_selected(&self) -> bool {
        self.mangrove
            || self.seagrass
            || self.salt_marsh
            || self.tidal_wetland
            || self.kelp
            || self.coral_associated
    }

    /// Names of the selected ecosystems, in declaration order
    pub fn selected_names(&self) -> Vec<&'static str> {
        let flags = [
            (self.mangrove, "mangrove"),
            (self.seagrass, "seagrass"),
            (self.salt_marsh, "salt_marsh"),
            (self.tidal_wetland, "tidal_wetland"),
            (self.kelp, "kelp"),
            (self.coral_associated, "coral_associated"),
        ];
        flags.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect()
    }
}

/// One plant-type checkbox with its per-type planting count.
///
/// The count is only mandatory when more than two plant types are selected
/// overall; the rule engine enforces that, not this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantTypeChoice {
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Plant-type checkboxes shared by both variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantTypeSelection {
    #[serde(default)]
    pub mangrove_species: PlantTypeChoice,
    #[serde(default)]
    pub seagrass_species: PlantTypeChoice,
    #[serde(default)]
    pub salt_marsh_grasses: PlantTypeChoice,
    #[serde(default)]
    pub dune_vegetation: PlantTypeChoice,
    #[serde(default)]
    pub other: PlantTypeChoice,
}

impl PlantTypeSelection {
    /// Selected choices with their field names, in declaration order
    pub fn selected(&self) -> Vec<(&'static str, &PlantTypeChoice)> {
        let all = [
            ("mangrove_species", &self.mangrove_species),
            ("seagrass_species", &self.seagrass_species),
            ("salt_marsh_grasses", &self.salt_marsh_grasses),
            ("dune_vegetation", &self.dune_vegetation),
            ("other", &self.other),
        ];
        all.into_iter().filter(|(_, c)| c.selected).collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected().len()
    }
}

/// Signature source held in the draft.
///
/// The drawn bitmap is exported from the drawing surface as a base64 data
/// URL and survives autosave. An uploaded signature image is a file and
/// lives in the evidence bundle instead. When both exist, the drawn artifact
/// wins (see `signature::normalize`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureSource {
    #[serde(default)]
    pub drawn_data_url: Option<String>,
}

/// Sub-structures common to both variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedFields {
    #[serde(default)]
    pub ecosystems: EcosystemSelection,
    #[serde(default)]
    pub plant_types: PlantTypeSelection,
    #[serde(default)]
    pub signature: SignatureSource,
    #[serde(default)]
    pub consent: bool,
}

/// Individual/community submitter draft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalDraft {
    #[serde(default)]
    pub owner_name: String,
    /// Sanitized to at most 10 digits; must be exactly 10 to submit
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub place_name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    #[serde(default)]
    pub area_ha: Option<f64>,
    #[serde(default)]
    pub approx_plant_count: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub seeks_carbon_credits: bool,
    #[serde(default)]
    pub shared: SharedFields,
}

/// Regulatory approval requirement declared by an organization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulatoryStatus {
    Yes,
    No,
    #[default]
    Pending,
}

impl RegulatoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegulatoryStatus::Yes => "yes",
            RegulatoryStatus::No => "no",
            RegulatoryStatus::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Option<RegulatoryStatus> {
        match s {
            "yes" => Some(RegulatoryStatus::Yes),
            "no" => Some(RegulatoryStatus::No),
            "pending" => Some(RegulatoryStatus::Pending),
            _ => None,
        }
    }
}

/// One species planted by an organization project.
///
/// Becomes a child row of the submission record after persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRow {
    #[serde(default)]
    pub species_name: String,
    #[serde(default)]
    pub count_planted: u32,
    /// Plants per hectare
    #[serde(default)]
    pub planting_density: Option<f64>,
    #[serde(default)]
    pub expected_survival_percent: Option<f64>,
    #[serde(default)]
    pub age_class: String,
}

/// Formal organization draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    #[serde(default)]
    pub org_type: String,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    /// 0x-prefixed 40-hex-char string, format-checked, not consumed anywhere
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub baseline_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub ongoing: bool,
    #[serde(default)]
    pub habitat_subtype: String,
    #[serde(default)]
    pub methodology: String,
    /// Tonnes CO2e per year
    #[serde(default)]
    pub sequestration_estimate_tco2e: Option<f64>,
    #[serde(default)]
    pub requested_credits: Option<f64>,
    #[serde(default = "default_species_list")]
    pub species: Vec<SpeciesRow>,
    #[serde(default)]
    pub monitoring_plan: String,
    #[serde(default)]
    pub soil_organic_carbon_pct: Option<f64>,
    #[serde(default)]
    pub salinity_psu: Option<f64>,
    #[serde(default)]
    pub water_ph: Option<f64>,
    #[serde(default)]
    pub regulatory_required: RegulatoryStatus,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub shared: SharedFields,
}

fn default_species_list() -> Vec<SpeciesRow> {
    // The form always shows one species row; the first must be named.
    vec![SpeciesRow::default()]
}

impl Default for OrganizationDraft {
    fn default() -> Self {
        Self {
            org_type: String::new(),
            org_name: String::new(),
            registration_number: String::new(),
            contact_person: String::new(),
            contact_email: String::new(),
            contact_phone: None,
            wallet_address: None,
            start_date: None,
            baseline_date: None,
            end_date: None,
            ongoing: false,
            habitat_subtype: String::new(),
            methodology: String::new(),
            sequestration_estimate_tco2e: None,
            requested_credits: None,
            species: default_species_list(),
            monitoring_plan: String::new(),
            soil_organic_carbon_pct: None,
            salinity_psu: None,
            water_ph: None,
            regulatory_required: RegulatoryStatus::default(),
            license_number: None,
            confidential: false,
            shared: SharedFields::default(),
        }
    }
}

/// The active draft, tagged by variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum ProjectDraft {
    Local(LocalDraft),
    Organization(OrganizationDraft),
}

impl ProjectDraft {
    pub fn variant(&self) -> Variant {
        match self {
            ProjectDraft::Local(_) => Variant::Local,
            ProjectDraft::Organization(_) => Variant::Organization,
        }
    }

    pub fn shared(&self) -> &SharedFields {
        match self {
            ProjectDraft::Local(d) => &d.shared,
            ProjectDraft::Organization(d) => &d.shared,
        }
    }

    pub fn shared_mut(&mut self) -> &mut SharedFields {
        match self {
            ProjectDraft::Local(d) => &mut d.shared,
            ProjectDraft::Organization(d) => &mut d.shared,
        }
    }

    /// The default (empty) draft for a variant
    pub fn default_for(variant: Variant) -> ProjectDraft {
        match variant {
            Variant::Local => ProjectDraft::Local(LocalDraft::default()),
            Variant::Organization => ProjectDraft::Organization(OrganizationDraft::default()),
        }
    }
}

/// Strip non-digit characters and keep at most the first 10 digits.
///
/// Applied on every phone edit so the stored value is always sanitized;
/// the rule engine then only has to check the length.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(10)
        .collect()
}

/// In-memory store for the active session's drafts.
///
/// Both variant drafts are kept so switching tabs does not lose state; the
/// selector records which one is active. Mutations go through the closure
/// API so callers can hand the fresh snapshot to the autosave manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftStore {
    pub active: Variant,
    pub local: LocalDraft,
    pub organization: OrganizationDraft,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self {
            active: Variant::Local,
            local: LocalDraft::default(),
            organization: OrganizationDraft::default(),
        }
    }
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active draft as a tagged value (clones the variant's state)
    pub fn active_draft(&self) -> ProjectDraft {
        match self.active {
            Variant::Local => ProjectDraft::Local(self.local.clone()),
            Variant::Organization => ProjectDraft::Organization(self.organization.clone()),
        }
    }

    pub fn set_active(&mut self, variant: Variant) {
        self.active = variant;
    }

    /// Mutate the local draft in place
    pub fn update_local<F: FnOnce(&mut LocalDraft)>(&mut self, f: F) {
        f(&mut self.local);
        self.local.phone = sanitize_phone(&self.local.phone);
    }

    /// Mutate the organization draft in place
    pub fn update_organization<F: FnOnce(&mut OrganizationDraft)>(&mut self, f: F) {
        f(&mut self.organization);
        if let Some(phone) = self.organization.contact_phone.take() {
            let digits = sanitize_phone(&phone);
            self.organization.contact_phone = if digits.is_empty() { None } else { Some(digits) };
        }
    }

    /// Reset the active variant's draft to its default (after a successful
    /// submission)
    pub fn clear_active(&mut self) {
        match self.active {
            Variant::Local => self.local = LocalDraft::default(),
            Variant::Organization => self.organization = OrganizationDraft::default(),
        }
    }
}
