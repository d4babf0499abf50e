// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, OutputMode};
use aquaplan_pipeline::PipelineReport;
use aquaplan_view::format::{format_ratio, format_volume, MISSING_PLACEHOLDER};
use aquaplan_view::{project, CellValue, SortDirection, SortSpec, TableRow, ViewSpec};
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableName {
    Recharge,
    DemandDomestic,
    DemandAgricultural,
    DemandIndustrial,
    TotalDemand,
    Gsr,
    Stress,
}

pub struct ViewArgs {
    pub report: PathBuf,
    pub table: TableName,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
}

#[derive(Clone, Copy)]
enum Kind {
    Text,
    Volume,
    Ratio,
}

const RECHARGE_COLUMNS: &[(&str, Kind)] = &[
    ("village_name", Kind::Text),
    ("village_code", Kind::Text),
    ("recharge", Kind::Volume),
];
const DEMAND_COLUMNS: &[(&str, Kind)] = &[
    ("village_name", Kind::Text),
    ("village_code", Kind::Text),
    ("demand", Kind::Volume),
];
const TOTAL_COLUMNS: &[(&str, Kind)] = &[
    ("village_name", Kind::Text),
    ("domestic", Kind::Volume),
    ("agricultural", Kind::Volume),
    ("industrial", Kind::Volume),
    ("total_demand", Kind::Volume),
];
const GSR_COLUMNS: &[(&str, Kind)] = &[
    ("village_name", Kind::Text),
    ("recharge", Kind::Volume),
    ("total_demand", Kind::Volume),
    ("gsr", Kind::Ratio),
    ("gsr_classification", Kind::Text),
    ("trend_status", Kind::Text),
];
const STRESS_COLUMNS: &[(&str, Kind)] = &[
    ("village_name", Kind::Text),
    ("gsr", Kind::Ratio),
    ("trend_status", Kind::Text),
    ("stress_value", Kind::Volume),
];

pub fn run_view(args: ViewArgs, output_mode: OutputMode) -> Result<(), CliError> {
    let raw = std::fs::read(&args.report).map_err(|e| {
        CliError::validation(format!("read report {}: {e}", args.report.display()))
    })?;
    let report: PipelineReport = serde_json::from_slice(&raw).map_err(|e| {
        CliError::validation(format!("parse report {}: {e}", args.report.display()))
    })?;
    let spec = ViewSpec {
        search: args
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        sort: args.sort.map(|column| {
            let direction = if args.descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            SortSpec::new(column, direction)
        }),
    };
    let empty = Vec::new();
    let demand = |key: &str| report.demand.get(key).unwrap_or(&empty);
    match args.table {
        TableName::Recharge => render(&report.recharge, &spec, RECHARGE_COLUMNS, output_mode),
        TableName::DemandDomestic => render(demand("domestic"), &spec, DEMAND_COLUMNS, output_mode),
        TableName::DemandAgricultural => {
            render(demand("agricultural"), &spec, DEMAND_COLUMNS, output_mode)
        }
        TableName::DemandIndustrial => {
            render(demand("industrial"), &spec, DEMAND_COLUMNS, output_mode)
        }
        TableName::TotalDemand => render(&report.total_demand, &spec, TOTAL_COLUMNS, output_mode),
        TableName::Gsr => render(&report.gsr, &spec, GSR_COLUMNS, output_mode),
        TableName::Stress => render(&report.stress, &spec, STRESS_COLUMNS, output_mode),
    }
}

fn render<R: TableRow + Serialize>(
    rows: &[R],
    spec: &ViewSpec,
    columns: &[(&str, Kind)],
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let visible = project(rows, spec);
    if output_mode.json {
        let payload = serde_json::to_string(&visible)
            .map_err(|e| CliError::internal(format!("encode rows: {e}")))?;
        println!("{payload}");
        return Ok(());
    }
    let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    println!("{}", header.join("\t"));
    for row in visible {
        let cells: Vec<String> = columns
            .iter()
            .map(|(name, kind)| display_cell(row.cell(name), *kind))
            .collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

fn display_cell(cell: Option<CellValue<'_>>, kind: Kind) -> String {
    match (cell, kind) {
        (Some(CellValue::Text(s)), _) => s.to_string(),
        (Some(CellValue::Number(n)), Kind::Ratio) => format_ratio(Some(n)),
        (Some(CellValue::Number(n)), Kind::Volume | Kind::Text) => format_volume(Some(n)),
        (Some(CellValue::Missing) | None, _) => MISSING_PLACEHOLDER.to_string(),
    }
}
