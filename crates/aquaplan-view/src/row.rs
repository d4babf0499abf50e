// SPDX-License-Identifier: Apache-2.0

use aquaplan_model::{
    DemandRow, GsrRow, RechargeRow, StressRow, TotalDemandRow, TrendStatus, VillageKeyed,
};

/// A single cell as seen by the sort comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl<'a> From<Option<f64>> for CellValue<'a> {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl<'a> From<Option<&'a str>> for CellValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }
}

/// Column access for view projections.
///
/// `cell` returns `None` for a column the row type does not have, and
/// `Some(CellValue::Missing)` for a known column without a value.
pub trait TableRow {
    fn search_text(&self) -> &str;
    fn cell(&self, column: &str) -> Option<CellValue<'_>>;
}

fn trend(status: Option<TrendStatus>) -> CellValue<'static> {
    status.map(TrendStatus::as_str).into()
}

fn identity_cell<'a, R: VillageKeyed>(row: &'a R, column: &str) -> Option<CellValue<'a>> {
    match column {
        "village_name" | "village" => Some(CellValue::Text(row.village_name())),
        "village_code" => Some(row.village_code().into()),
        _ => None,
    }
}

impl TableRow for RechargeRow {
    fn search_text(&self) -> &str {
        &self.village_name
    }

    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        match column {
            "recharge" => Some(self.recharge.into()),
            other => identity_cell(self, other),
        }
    }
}

impl TableRow for DemandRow {
    fn search_text(&self) -> &str {
        &self.village_name
    }

    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        match column {
            "demand" => Some(self.demand.into()),
            other => identity_cell(self, other),
        }
    }
}

impl TableRow for TotalDemandRow {
    fn search_text(&self) -> &str {
        &self.village_name
    }

    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        match column {
            "domestic" => Some(self.domestic.into()),
            "agricultural" => Some(self.agricultural.into()),
            "industrial" => Some(self.industrial.into()),
            "total_demand" => Some(self.total_demand.into()),
            other => identity_cell(self, other),
        }
    }
}

impl TableRow for GsrRow {
    fn search_text(&self) -> &str {
        &self.village_name
    }

    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        match column {
            "recharge" => Some(self.recharge.into()),
            "total_demand" => Some(self.total_demand.into()),
            "gsr" => Some(self.gsr.into()),
            "gsr_classification" => Some(self.gsr_classification.as_deref().into()),
            "trend_status" => Some(trend(self.trend_status)),
            other => identity_cell(self, other),
        }
    }
}

impl TableRow for StressRow {
    fn search_text(&self) -> &str {
        &self.village_name
    }

    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        match column {
            "gsr" => Some(self.gsr.into()),
            "trend_status" => Some(trend(self.trend_status)),
            "stress_value" | "injection" => Some(self.stress_value.into()),
            other => identity_cell(self, other),
        }
    }
}
