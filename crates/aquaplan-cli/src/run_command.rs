// SPDX-License-Identifier: Apache-2.0

use crate::scenario::Scenario;
use crate::settings::storage_dir;
use crate::{CliError, OutputMode};
use aquaplan_core::{canonical, ErrorCode, ExitCode, MachineError, ResultExt};
use aquaplan_pipeline::{
    HandoffOutcome, HandoffPackager, Pipeline, PipelineConfig, PipelineReport, Stage, StageError,
    StageOutcome,
};
use aquaplan_store::LocalFsBlobStore;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

type HandoffResult = Result<HandoffOutcome, StageError>;

pub struct RunArgs {
    pub scenario: PathBuf,
    pub horizon: Option<String>,
    pub report: Option<PathBuf>,
    pub skip_handoff: bool,
}

#[derive(Debug, Serialize)]
struct StageLine {
    stage: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip)]
    error: Option<(Stage, StageError)>,
}

impl StageLine {
    fn from_result(stage: Stage, result: Result<StageOutcome, StageError>) -> Self {
        let (status, detail, error) = match result {
            Ok(StageOutcome::Applied { rows }) => ("applied", format!("{rows} rows"), None),
            Ok(StageOutcome::Discarded) => (
                "discarded",
                "selection changed while in flight".to_string(),
                None,
            ),
            Err(err @ StageError::PreconditionNotMet(_)) => {
                ("skipped", err.to_string(), Some((stage, err)))
            }
            Err(err) => ("failed", err.to_string(), Some((stage, err))),
        };
        Self {
            stage: stage.as_str(),
            status,
            detail,
            error,
        }
    }

    fn skipped(stage: &'static str, detail: &str) -> Self {
        Self {
            stage,
            status: "skipped",
            detail: detail.to_string(),
            error: None,
        }
    }
}

pub fn run_scenario(
    args: RunArgs,
    config: PipelineConfig,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let scenario = Scenario::load(&args.scenario).map_err(CliError::validation)?;
    let backend = scenario.backend(&config).map_err(CliError::validation)?;
    let packager = HandoffPackager::new(&config.handoff)
        .map_err(|e| CliError::validation(e.to_string()))?;
    let store = LocalFsBlobStore::new(storage_dir(&config))
        .with_quota(Some(config.storage.quota_bytes));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("tokio runtime: {e}")))?;

    let pipeline = Pipeline::new(config, backend);
    let horizon = args.horizon.or_else(|| scenario.horizon.clone());
    let (lines, handoff, report) = runtime.block_on(async {
        drive(&pipeline, scenario, horizon, (!args.skip_handoff).then_some((&packager, &store)))
            .await
    })?;

    if let Some(path) = &args.report {
        let bytes = canonical::stable_json_bytes(&report)
            .with_context("encode report")
            .map_err(|e| CliError::internal(e.to_string()))?;
        std::fs::write(path, bytes)
            .with_context("write report")
            .map_err(|e| CliError::internal(e.at(path.display())))?;
        info!(path = %path.display(), "report written");
    }

    if output_mode.json {
        let handoff = match &handoff {
            Some(Ok(outcome)) => json!(outcome),
            Some(Err(err)) => json!({"status": "skipped", "detail": err.to_string()}),
            None => serde_json::Value::Null,
        };
        let payload = json!({
            "stages": lines,
            "handoff": handoff,
            "report": args.report.as_ref().map(|p| p.display().to_string()),
        });
        println!("{payload}");
    } else {
        for line in &lines {
            println!("{:<20} {:<10} {}", line.stage, line.status, line.detail);
        }
        match &handoff {
            Some(Ok(outcome)) => {
                println!("handoff url: {}", outcome.url);
                if let Some(warning) = &outcome.warning {
                    println!("handoff warning: {}", warning.message);
                }
            }
            Some(Err(err)) => println!("handoff skipped: {err}"),
            None => {}
        }
    }

    let failure = lines.iter().find_map(|l| match &l.error {
        Some((_, StageError::PreconditionNotMet(_))) | None => None,
        Some((stage, err)) => Some((*stage, err)),
    });
    if let Some((stage, err)) = failure {
        return Err(CliError::from_stage(stage, err));
    }
    if report.is_complete() {
        return Ok(());
    }
    Err(CliError {
        exit_code: ExitCode::Validation,
        machine: MachineError::new(
            ErrorCode::PreconditionNotMet,
            "pipeline stopped before the stress stage",
        ),
    })
}

async fn drive(
    pipeline: &Pipeline,
    scenario: Scenario,
    horizon: Option<String>,
    handoff: Option<(&HandoffPackager, &LocalFsBlobStore)>,
) -> Result<(Vec<StageLine>, Option<HandoffResult>, PipelineReport), CliError> {
    pipeline
        .confirm_selection(scenario.scope)
        .await
        .map_err(|e| CliError::validation(format!("selection: {e}")))?;
    if let Some(wells) = scenario.wells {
        pipeline
            .save_wells_dataset(wells)
            .await
            .map_err(|e| CliError::validation(format!("wells dataset: {e}")))?;
    }
    pipeline.set_demand_selection(scenario.demand).await;

    let mut lines = Vec::new();
    let recharge_done = pipeline.read(|s| !s.recharge_table().is_empty()).await;
    if recharge_done {
        let rows = pipeline.read(|s| s.recharge_table().len()).await;
        lines.push(StageLine::from_result(
            Stage::Recharge,
            Ok(StageOutcome::Applied { rows }),
        ));
    } else {
        lines.push(StageLine::from_result(
            Stage::Recharge,
            pipeline.compute_recharge().await,
        ));
    }
    for (category, result) in pipeline.compute_enabled_demand().await {
        lines.push(StageLine::from_result(Stage::Demand(category), result));
    }
    if pipeline
        .read(|s| s.demand_selection().enabled_categories().is_empty())
        .await
    {
        lines.push(StageLine::skipped("demand", "no demand category enabled"));
    }
    lines.push(StageLine::from_result(Stage::Gsr, pipeline.compute_gsr().await));
    let horizon_text = horizon.unwrap_or_default();
    lines.push(StageLine::from_result(
        Stage::Stress,
        pipeline.compute_stress(&horizon_text).await,
    ));

    let handoff = match handoff {
        Some((packager, store)) => Some(pipeline.handoff(packager, store).await),
        None => None,
    };
    Ok((lines, handoff, pipeline.snapshot().await))
}
