// SPDX-License-Identifier: Apache-2.0

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageRef {
    pub village_code: String,
    #[serde(alias = "village")]
    pub village_name: String,
    pub state_code: String,
    pub district_code: String,
    pub subdistrict_code: String,
}

/// The spatial extent the whole pipeline runs over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionScope {
    #[serde(default)]
    pub river: Option<String>,
    #[serde(default)]
    pub stretch: Option<String>,
    #[serde(default)]
    pub drain: Option<String>,
    #[serde(default)]
    pub catchments: Vec<String>,
    #[serde(default)]
    pub villages: Vec<VillageRef>,
}

/// Administrative codes handed to the downstream module, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCodes {
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub subdistricts: Vec<String>,
}

impl AdminCodes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.districts.is_empty() && self.subdistricts.is_empty()
    }
}

impl SelectionScope {
    #[must_use]
    pub fn has_villages(&self) -> bool {
        !self.villages.is_empty()
    }

    #[must_use]
    pub fn admin_codes(&self) -> AdminCodes {
        let mut codes = AdminCodes::default();
        for v in &self.villages {
            push_unique(&mut codes.states, &v.state_code);
            push_unique(&mut codes.districts, &v.district_code);
            push_unique(&mut codes.subdistricts, &v.subdistrict_code);
        }
        codes
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for v in &self.villages {
            if v.village_code.trim().is_empty() {
                return Err(ValidationError::new("village code must not be empty"));
            }
            if v.village_name.trim().is_empty() {
                return Err(ValidationError(format!(
                    "village {} has an empty name",
                    v.village_code
                )));
            }
            for (kind, code) in [
                ("state", &v.state_code),
                ("district", &v.district_code),
                ("subdistrict", &v.subdistrict_code),
            ] {
                if code.trim().is_empty() {
                    return Err(ValidationError(format!(
                        "village {} is missing its {kind} code",
                        v.village_code
                    )));
                }
            }
            if !seen.insert(v.village_code.as_str()) {
                return Err(ValidationError(format!(
                    "village {} selected more than once",
                    v.village_code
                )));
            }
        }
        if self.catchments.iter().any(|c| c.trim().is_empty()) {
            return Err(ValidationError::new("catchment ids must not be empty"));
        }
        Ok(())
    }
}

fn push_unique(out: &mut Vec<String>, code: &str) {
    let code = code.trim();
    if !code.is_empty() && !out.iter().any(|c| c == code) {
        out.push(code.to_string());
    }
}
