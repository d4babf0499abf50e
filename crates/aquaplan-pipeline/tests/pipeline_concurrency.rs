mod support;

use std::sync::Arc;

use aquaplan_model::{DemandCategory, DemandSelection};
use aquaplan_pipeline::{Pipeline, Stage, StageError, StageOutcome};
use support::*;

async fn ready_pipeline(backend: Arc<aquaplan_pipeline::FakeComputeBackend>) -> Arc<Pipeline> {
    let pipeline = Arc::new(Pipeline::new(config(false), backend));
    pipeline
        .confirm_selection(three_village_scope())
        .await
        .expect("confirm");
    pipeline.save_wells_dataset(wells()).await.expect("wells");
    pipeline
}

#[tokio::test]
async fn second_call_while_loading_is_refused() {
    let backend = Arc::new(fake_backend());
    let pipeline = ready_pipeline(backend.clone()).await;
    let _gate = backend.hold().await;

    let first = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.compute_recharge().await })
    };
    wait_until_loading(&pipeline, Stage::Recharge).await;

    let err = pipeline.compute_recharge().await.expect_err("busy");
    assert_eq!(err, StageError::AlreadyRunning(Stage::Recharge));

    backend.release().await;
    let outcome = first.await.expect("join").expect("first call");
    assert_eq!(outcome, StageOutcome::Applied { rows: 3 });
    assert_eq!(backend.calls_for(Stage::Recharge).await, 1);
    assert!(!pipeline.read(|s| s.is_loading(Stage::Recharge)).await);
}

#[tokio::test]
async fn other_stages_stay_usable_during_a_call() {
    let backend = Arc::new(fake_backend());
    let pipeline = ready_pipeline(backend.clone()).await;
    let mut sel = DemandSelection::default();
    sel.domestic.enabled = true;
    sel.domestic.per_capita_lpcd = 55.0;
    pipeline.set_demand_selection(sel).await;
    let _gate = backend.hold().await;

    let recharge = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.compute_recharge().await })
    };
    wait_until_loading(&pipeline, Stage::Recharge).await;

    let snapshot = pipeline.snapshot().await;
    assert!(snapshot.recharge.is_empty());
    assert!(pipeline
        .read(|s| s.can_compute_demand(DemandCategory::Domestic))
        .await);

    backend.release().await;
    recharge.await.expect("join").expect("recharge");
    pipeline
        .compute_demand(DemandCategory::Domestic)
        .await
        .expect("demand after release");
    assert_eq!(pipeline.read(|s| s.total_demand_table().len()).await, 3);
}

#[tokio::test]
async fn response_for_a_replaced_scope_is_discarded() {
    let backend = Arc::new(fake_backend());
    let pipeline = ready_pipeline(backend.clone()).await;
    let _gate = backend.hold().await;

    let inflight = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.compute_recharge().await })
    };
    wait_until_loading(&pipeline, Stage::Recharge).await;

    pipeline.unlock_selection().await;
    let mut narrowed = three_village_scope();
    narrowed.villages.truncate(1);
    pipeline.confirm_selection(narrowed).await.expect("reconfirm");

    // Still loading: a new call must wait for the stale one to land.
    let err = pipeline.compute_recharge().await.expect_err("busy");
    assert_eq!(err, StageError::AlreadyRunning(Stage::Recharge));

    backend.release().await;
    let outcome = inflight.await.expect("join").expect("stale call");
    assert_eq!(outcome, StageOutcome::Discarded);
    let (rows, error, loading) = pipeline
        .read(|s| {
            (
                s.recharge_table().len(),
                s.stage_error(Stage::Recharge).map(str::to_string),
                s.is_loading(Stage::Recharge),
            )
        })
        .await;
    assert_eq!(rows, 0);
    assert_eq!(error, None);
    assert!(!loading);

    let outcome = pipeline.compute_recharge().await.expect("fresh call");
    assert_eq!(outcome, StageOutcome::Applied { rows: 3 });
}

#[tokio::test]
async fn reset_discards_inflight_results() {
    let backend = Arc::new(fake_backend());
    let pipeline = ready_pipeline(backend.clone()).await;
    let _gate = backend.hold().await;

    let inflight = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.compute_recharge().await })
    };
    wait_until_loading(&pipeline, Stage::Recharge).await;
    pipeline.reset().await;
    backend.release().await;

    assert_eq!(
        inflight.await.expect("join").expect("call"),
        StageOutcome::Discarded
    );
    let report = pipeline.snapshot().await;
    assert!(report.recharge.is_empty());
    assert!(!report.selection_locked);
    assert!(report.wells_dataset.is_none());
}

#[tokio::test]
async fn abandoned_call_releases_the_stage_for_a_retry() {
    let backend = Arc::new(fake_backend());
    let pipeline = ready_pipeline(backend.clone()).await;
    let _gate = backend.hold().await;

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        pipeline.compute_recharge(),
    )
    .await
    .is_err();
    assert!(timed_out);
    assert!(!pipeline.read(|s| s.is_loading(Stage::Recharge)).await);

    backend.release().await;
    let outcome = pipeline.compute_recharge().await.expect("retry");
    assert_eq!(outcome, StageOutcome::Applied { rows: 3 });
    assert_eq!(backend.calls_for(Stage::Recharge).await, 2);
}
