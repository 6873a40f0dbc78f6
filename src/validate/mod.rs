//! Validation rule engine
//!
//! Pure, deterministic function from (variant, draft snapshot, attached
//! evidence) to a [`ValidationErrorMap`]. The map is fully recomputed on
//! every call; nothing is cached or merged across calls. Rules live in
//! declarative tables in [`rules`], field keys and the client navigation
//! order in [`keys`].
//!
//! Evaluation order: field rules over the draft, then per-file evidence
//! checks, and only when every per-file check passed, the aggregate count
//! rules. A count failure can therefore never mask a broken file.

pub mod keys;
pub mod rules;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draft::ProjectDraft;
use crate::evidence::EvidenceBundle;
use self::rules::{CountRule, Rule};

/// Field key → stacked messages. Returned as data, never thrown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorMap {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a field's error stack
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one error
    pub fn field_count(&self) -> usize {
        self.errors.len()
    }

    pub fn messages_for(&self, key: &str) -> &[String] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.errors.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    /// The error the client should navigate to first, chosen by the fixed
    /// pre-declared field order, never by map insertion order. Keys absent
    /// from the order (none in practice) sort last, alphabetically.
    pub fn first_error<'a>(&'a self, order: &[&'a str]) -> Option<(&'a str, &'a str)> {
        for key in order {
            if let Some(messages) = self.errors.get(*key) {
                if let Some(first) = messages.first() {
                    return Some((*key, first.as_str()));
                }
            }
        }
        self.errors
            .iter()
            .find(|(k, _)| !order.contains(&k.as_str()))
            .and_then(|(k, msgs)| msgs.first().map(|m| (k.as_str(), m.as_str())))
    }
}

fn apply_rules<D>(map: &mut ValidationErrorMap, table: &[Rule<D>], draft: &D) {
    for rule in table {
        if (rule.failed)(draft) {
            map.add(rule.key, rule.message);
        }
    }
}

fn apply_count_rules<D>(
    map: &mut ValidationErrorMap,
    table: &[CountRule<D>],
    draft: &D,
    bundle: &EvidenceBundle,
) {
    for rule in table {
        if (rule.failed)(draft, bundle) {
            map.add(rule.key, rule.message);
        }
    }
}

/// Validate a draft snapshot with its attached evidence.
///
/// Pure: same inputs always produce the same map.
pub fn validate(draft: &ProjectDraft, bundle: &EvidenceBundle) -> ValidationErrorMap {
    let mut map = ValidationErrorMap::new();

    let per_file = bundle.check_all();
    for violation in &per_file {
        map.add(violation.field_key.clone(), violation.message());
    }

    match draft {
        ProjectDraft::Local(d) => {
            apply_rules(&mut map, rules::LOCAL_FIELDS, d);
            if per_file.is_empty() {
                apply_count_rules(&mut map, rules::LOCAL_COUNTS, d, bundle);
            }
        }
        ProjectDraft::Organization(d) => {
            apply_rules(&mut map, rules::ORGANIZATION_FIELDS, d);
            if per_file.is_empty() {
                apply_count_rules(&mut map, rules::ORGANIZATION_COUNTS, d, bundle);
            }
        }
    }

    map
}

/// The navigation order for a draft's variant
pub fn field_order(draft: &ProjectDraft) -> &'static [&'static str] {
    match draft {
        ProjectDraft::Local(_) => keys::LOCAL_ORDER,
        ProjectDraft::Organization(_) => keys::ORGANIZATION_ORDER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::ProjectDraft;
    use crate::evidence::{EvidenceCategory, MIN_FILE_BYTES};
    use crate::fixtures;

    #[test]
    fn test_clean_local_draft_is_valid() {
        let draft = ProjectDraft::Local(fixtures::clean_local_draft());
        let bundle = fixtures::clean_local_bundle();
        let map = validate(&draft, &bundle);
        assert!(map.is_empty(), "unexpected errors: {:?}", map);
    }

    #[test]
    fn test_clean_organization_draft_is_valid() {
        let draft = ProjectDraft::Organization(fixtures::clean_org_draft());
        let bundle = fixtures::clean_org_bundle();
        let map = validate(&draft, &bundle);
        assert!(map.is_empty(), "unexpected errors: {:?}", map);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut local = fixtures::clean_local_draft();
        local.owner_name.clear();
        local.phone = "123".into();
        let draft = ProjectDraft::Local(local);
        let bundle = fixtures::clean_local_bundle();

        let first = validate(&draft, &bundle);
        let second = validate(&draft, &bundle);
        let third = validate(&draft, &bundle);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_single_broken_invariant_keys_that_field() {
        let mut local = fixtures::clean_local_draft();
        local.area_ha = Some(0.0);
        let map = validate(&ProjectDraft::Local(local), &fixtures::clean_local_bundle());

        assert_eq!(map.field_count(), 1);
        assert!(map.contains(keys::AREA_HA));
    }

    #[test]
    fn test_phone_must_be_ten_digits() {
        let mut local = fixtures::clean_local_draft();
        local.phone = "123456789".into();
        let map = validate(&ProjectDraft::Local(local), &fixtures::clean_local_bundle());
        assert!(map.contains(keys::PHONE));
    }

    #[test]
    fn test_latitude_longitude_ranges() {
        let mut local = fixtures::clean_local_draft();
        local.lat = Some(90.5);
        local.lng = Some(-180.5);
        let map = validate(&ProjectDraft::Local(local), &fixtures::clean_local_bundle());
        assert!(map.contains(keys::LATITUDE));
        assert!(map.contains(keys::LONGITUDE));
    }

    #[test]
    fn test_local_needs_two_photos() {
        let mut bundle = fixtures::clean_local_bundle();
        bundle.remove(EvidenceCategory::Photo, "photo-1.jpg");
        let draft = ProjectDraft::Local(fixtures::clean_local_draft());

        let map = validate(&draft, &bundle);
        assert!(map.contains(keys::PHOTOS));
    }

    #[test]
    fn test_organization_evidence_boundary() {
        let draft = ProjectDraft::Organization(fixtures::clean_org_draft());

        // 5 photos, 0 satellite: pass
        let map = validate(&draft, &fixtures::org_bundle_with(5, 0));
        assert!(!map.contains(keys::PHOTOS), "5/0 should pass: {:?}", map);

        // 4 photos, 0 satellite: fail
        let map = validate(&draft, &fixtures::org_bundle_with(4, 0));
        assert!(map.contains(keys::PHOTOS), "4/0 should fail");

        // 3 photos, 1 satellite: pass
        let map = validate(&draft, &fixtures::org_bundle_with(3, 1));
        assert!(!map.contains(keys::PHOTOS), "3/1 should pass: {:?}", map);

        // 3 photos, 0 satellite: fail
        let map = validate(&draft, &fixtures::org_bundle_with(3, 0));
        assert!(map.contains(keys::PHOTOS), "3/0 should fail");
    }

    #[test]
    fn test_two_plant_types_never_require_counts() {
        let mut org = fixtures::clean_org_draft();
        org.shared.plant_types.mangrove_species.selected = true;
        org.shared.plant_types.seagrass_species.selected = true;
        org.shared.plant_types.mangrove_species.count = None;
        org.shared.plant_types.seagrass_species.count = None;

        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(!map.contains(keys::PLANT_TYPES));
    }

    #[test]
    fn test_three_plant_types_require_counts_and_research_doc() {
        let mut org = fixtures::clean_org_draft();
        org.shared.plant_types.mangrove_species.selected = true;
        org.shared.plant_types.seagrass_species.selected = true;
        org.shared.plant_types.salt_marsh_grasses.selected = true;
        org.shared.plant_types.mangrove_species.count = Some(100);
        org.shared.plant_types.seagrass_species.count = Some(50);
        // third count missing

        let mut bundle = fixtures::clean_org_bundle();
        bundle.remove(EvidenceCategory::ResearchDocument, "study.pdf");

        let map = validate(&ProjectDraft::Organization(org.clone()), &bundle);
        assert!(map.contains(keys::PLANT_TYPES));
        assert!(map.contains(keys::RESEARCH_DOCUMENTS));

        // With all counts and a research doc, both clear.
        org.shared.plant_types.salt_marsh_grasses.count = Some(25);
        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(!map.contains(keys::PLANT_TYPES), "{:?}", map);
        assert!(!map.contains(keys::RESEARCH_DOCUMENTS));
    }

    #[test]
    fn test_regulatory_yes_requires_license_and_permits() {
        let mut org = fixtures::clean_org_draft();
        org.regulatory_required = crate::draft::RegulatoryStatus::Yes;
        org.license_number = None;

        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(map.contains(keys::LICENSE_NUMBER));
        assert!(map.contains(keys::LICENSE_DOCUMENT));
        assert!(map.contains(keys::PERMIT_DOCUMENTS));
    }

    #[test]
    fn test_regulatory_yes_satisfied() {
        let mut org = fixtures::clean_org_draft();
        org.regulatory_required = crate::draft::RegulatoryStatus::Yes;
        org.license_number = Some("WL-2209/A".into());

        let mut bundle = fixtures::clean_org_bundle();
        bundle.attach(fixtures::sized_file(
            EvidenceCategory::LicenseDocument,
            "license.pdf",
            "application/pdf",
            MIN_FILE_BYTES,
        ));
        bundle.attach(fixtures::sized_file(
            EvidenceCategory::PermitDocument,
            "permit.pdf",
            "application/pdf",
            MIN_FILE_BYTES,
        ));

        let map = validate(&ProjectDraft::Organization(org), &bundle);
        assert!(map.is_empty(), "{:?}", map);
    }

    #[test]
    fn test_per_file_failure_masks_count_rules() {
        // One undersized photo: its per-file error must appear, and the
        // aggregate photo-count rule must not run at all.
        let draft = ProjectDraft::Local(fixtures::clean_local_draft());
        let mut bundle = crate::evidence::EvidenceBundle::new();
        bundle.attach(fixtures::sized_file(
            EvidenceCategory::Photo,
            "tiny.jpg",
            "image/jpeg",
            10,
        ));

        let map = validate(&draft, &bundle);
        let messages = map.messages_for(keys::PHOTOS);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("smaller than 20KB"), "{:?}", messages);
    }

    #[test]
    fn test_errors_stack_for_one_field() {
        let mut org = fixtures::clean_org_draft();
        org.species = vec![crate::draft::SpeciesRow {
            species_name: "".into(),
            count_planted: 10,
            planting_density: Some(-1.0),
            expected_survival_percent: Some(150.0),
            age_class: "seedling".into(),
        }];

        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(map.messages_for(keys::SPECIES).len() >= 3);
    }

    #[test]
    fn test_first_error_follows_declared_order() {
        // consent comes last in the declared order even though "consent"
        // sorts before "phone" alphabetically.
        let mut local = fixtures::clean_local_draft();
        local.phone = "12".into();
        local.shared.consent = false;

        let draft = ProjectDraft::Local(local);
        let map = validate(&draft, &fixtures::clean_local_bundle());
        let (key, _) = map.first_error(field_order(&draft)).unwrap();
        assert_eq!(key, keys::PHONE);
    }

    #[test]
    fn test_first_error_empty_map() {
        let map = ValidationErrorMap::new();
        assert!(map.first_error(keys::LOCAL_ORDER).is_none());
    }

    #[test]
    fn test_wallet_format_checked_when_present() {
        let mut org = fixtures::clean_org_draft();
        org.wallet_address = Some("0x1234".into());
        let map = validate(&ProjectDraft::Organization(org.clone()), &fixtures::clean_org_bundle());
        assert!(map.contains(keys::WALLET_ADDRESS));

        org.wallet_address = Some(format!("0x{}", "ab12".repeat(10)));
        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(!map.contains(keys::WALLET_ADDRESS));
    }

    #[test]
    fn test_ongoing_replaces_end_date() {
        let mut org = fixtures::clean_org_draft();
        org.end_date = None;
        org.ongoing = false;
        let map = validate(&ProjectDraft::Organization(org.clone()), &fixtures::clean_org_bundle());
        assert!(map.contains(keys::END_DATE));

        org.ongoing = true;
        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(!map.contains(keys::END_DATE));
    }

    #[test]
    fn test_soil_water_metrics_bounded_when_present() {
        let mut org = fixtures::clean_org_draft();
        org.soil_organic_carbon_pct = Some(101.0);
        org.salinity_psu = Some(61.0);
        org.water_ph = Some(14.5);

        let map = validate(&ProjectDraft::Organization(org.clone()), &fixtures::clean_org_bundle());
        assert!(map.contains(keys::SOIL_ORGANIC_CARBON));
        assert!(map.contains(keys::SALINITY));
        assert!(map.contains(keys::WATER_PH));

        org.soil_organic_carbon_pct = None;
        org.salinity_psu = None;
        org.water_ph = None;
        let map = validate(&ProjectDraft::Organization(org), &fixtures::clean_org_bundle());
        assert!(map.is_empty(), "{:?}", map);
    }
}
