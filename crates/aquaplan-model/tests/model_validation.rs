// SPDX-License-Identifier: Apache-2.0

use aquaplan_model::{PlanningHorizon, SelectionScope, VillageRef, WellRecord, WellsDataset};
use proptest::prelude::*;

fn village(code: &str, state: &str, district: &str, sub: &str) -> VillageRef {
    VillageRef {
        village_code: code.to_string(),
        village_name: format!("Village {code}"),
        state_code: state.to_string(),
        district_code: district.to_string(),
        subdistrict_code: sub.to_string(),
    }
}

#[test]
fn admin_codes_are_deduplicated_in_first_seen_order() {
    let scope = SelectionScope {
        villages: vec![
            village("1", "09", "187", "A"),
            village("2", "09", "150", "B"),
            village("3", "09", "187", "A"),
        ],
        ..SelectionScope::default()
    };
    let codes = scope.admin_codes();
    assert_eq!(codes.states, vec!["09"]);
    assert_eq!(codes.districts, vec!["187", "150"]);
    assert_eq!(codes.subdistricts, vec!["A", "B"]);
}

#[test]
fn duplicate_or_incomplete_villages_are_rejected() {
    let dup = SelectionScope {
        villages: vec![village("1", "09", "1", "A"), village("1", "09", "1", "A")],
        ..SelectionScope::default()
    };
    assert!(dup.validate().is_err());

    let missing = SelectionScope {
        villages: vec![village("1", "09", "", "A")],
        ..SelectionScope::default()
    };
    let err = missing.validate().expect_err("missing district");
    assert!(err.to_string().contains("district"));
}

#[test]
fn wells_dataset_requires_wells_and_sane_yield() {
    assert!(WellsDataset::default().validate().is_err());
    let mut ds = WellsDataset {
        name: "survey".to_string(),
        wells: vec![WellRecord {
            well_id: "W1".to_string(),
            village_code: "1".to_string(),
            pre_monsoon_level_m: Some(8.0),
            post_monsoon_level_m: Some(5.5),
            specific_yield: Some(0.12),
        }],
    };
    assert!(ds.validate().is_ok());
    ds.wells[0].specific_yield = Some(1.7);
    assert!(ds.validate().is_err());
}

proptest! {
    #[test]
    fn horizon_parse_matches_range(n in 0u32..200) {
        let parsed = PlanningHorizon::parse(&n.to_string());
        prop_assert_eq!(parsed.is_ok(), (1..=50).contains(&n));
    }
}
