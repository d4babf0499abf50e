// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod demand;
mod horizon;
mod rows;
mod scope;
mod validation;
mod wells;

pub use demand::{
    AgriculturalDemand, DemandCategory, DemandSelection, DomesticDemand, IndustrialDemand, Season,
};
pub use horizon::{PlanningHorizon, PLANNING_HORIZON_MAX_YEARS, PLANNING_HORIZON_MIN_YEARS};
pub use rows::{
    DemandRow, GsrBand, GsrRow, RechargeRow, StressRow, TotalDemandRow, TrendStatus, VillageKeyed,
};
pub use scope::{AdminCodes, SelectionScope, VillageRef};
pub use validation::ValidationError;
pub use wells::{WellRecord, WellsDataset};

pub const CRATE_NAME: &str = "aquaplan-model";
