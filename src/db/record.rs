//! Submission record types and the status state machine

use serde::{Deserialize, Serialize};

/// Lifecycle state of a persisted submission.
///
/// Intake creates records as `Pending` only; every other state is reached
/// through the verification side, never from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    Pending,
    Verified,
    Rejected,
    NeedsInfo,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Verified => "verified",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::NeedsInfo => "needs-info",
        }
    }

    pub fn parse(s: &str) -> Option<SubmissionStatus> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "verified" => Some(SubmissionStatus::Verified),
            "rejected" => Some(SubmissionStatus::Rejected),
            "needs-info" => Some(SubmissionStatus::NeedsInfo),
            _ => None,
        }
    }

    /// Whether the verification side may move a record from `self` to `to`
    pub fn can_transition(&self, to: SubmissionStatus) -> bool {
        matches!(
            (self, to),
            (
                SubmissionStatus::Pending,
                SubmissionStatus::Verified
                    | SubmissionStatus::Rejected
                    | SubmissionStatus::NeedsInfo
            ) | (SubmissionStatus::NeedsInfo, SubmissionStatus::Pending)
        )
    }
}

/// One `projects` row. Variant-specific columns are `None` for the other
/// variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: String,
    pub variant: String,
    pub status: SubmissionStatus,
    pub created_at: String,

    // Shared
    pub ecosystems_json: String,
    pub plant_types_json: String,
    pub consent: bool,
    pub start_date: Option<String>,

    // Local
    pub owner_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub place_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub area_ha: Option<f64>,
    pub approx_plant_count: Option<i64>,
    pub seeks_carbon_credits: Option<bool>,

    // Organization
    pub org_type: Option<String>,
    pub org_name: Option<String>,
    pub registration_number: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub wallet_address: Option<String>,
    pub baseline_date: Option<String>,
    pub end_date: Option<String>,
    pub ongoing: Option<bool>,
    pub habitat_subtype: Option<String>,
    pub methodology: Option<String>,
    pub sequestration_estimate: Option<f64>,
    pub requested_credits: Option<f64>,
    pub monitoring_plan: Option<String>,
    pub soil_organic_carbon: Option<f64>,
    pub salinity: Option<f64>,
    pub water_ph: Option<f64>,
    pub regulatory_required: Option<String>,
    pub license_number: Option<String>,
    pub confidential: Option<bool>,
}

impl ProjectRecord {
    /// An empty pending record shell; the gateway fills in the variant's
    /// columns.
    pub fn pending(id: String, variant: String, created_at: String) -> Self {
        Self {
            id,
            variant,
            status: SubmissionStatus::Pending,
            created_at,
            ecosystems_json: "[]".into(),
            plant_types_json: "{}".into(),
            consent: false,
            start_date: None,
            owner_name: None,
            phone: None,
            email: None,
            country: None,
            place_name: None,
            latitude: None,
            longitude: None,
            accuracy_m: None,
            area_ha: None,
            approx_plant_count: None,
            seeks_carbon_credits: None,
            org_type: None,
            org_name: None,
            registration_number: None,
            contact_person: None,
            contact_email: None,
            contact_phone: None,
            wallet_address: None,
            baseline_date: None,
            end_date: None,
            ongoing: None,
            habitat_subtype: None,
            methodology: None,
            sequestration_estimate: None,
            requested_credits: None,
            monitoring_plan: None,
            soil_organic_carbon: None,
            salinity: None,
            water_ph: None,
            regulatory_required: None,
            license_number: None,
            confidential: None,
        }
    }
}

/// One `species` child row to insert (Organization submissions only)
#[derive(Debug, Clone, PartialEq)]
pub struct NewSpecies {
    pub species_name: String,
    pub count_planted: i64,
    pub planting_density: Option<f64>,
    pub expected_survival_percent: Option<f64>,
    pub age_class: String,
}

/// One `evidence_files` child row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvidence {
    pub category: String,
    pub file_name: String,
    pub mime: String,
    pub size_bytes: i64,
    pub locator: String,
}

/// Summary returned by the lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub variant: String,
    pub status: String,
    pub created_at: String,
    pub species_count: i64,
    pub evidence_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::Verified,
            SubmissionStatus::Rejected,
            SubmissionStatus::NeedsInfo,
        ] {
            assert_eq!(SubmissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::parse("draft"), None);
    }

    #[test]
    fn test_legal_transitions() {
        use SubmissionStatus::*;

        assert!(Pending.can_transition(Verified));
        assert!(Pending.can_transition(Rejected));
        assert!(Pending.can_transition(NeedsInfo));
        assert!(NeedsInfo.can_transition(Pending));
    }

    #[test]
    fn test_illegal_transitions() {
        use SubmissionStatus::*;

        assert!(!Verified.can_transition(Pending));
        assert!(!Verified.can_transition(Rejected));
        assert!(!Rejected.can_transition(Pending));
        assert!(!Rejected.can_transition(Verified));
        assert!(!NeedsInfo.can_transition(Verified));
        assert!(!Pending.can_transition(Pending));
    }
}
