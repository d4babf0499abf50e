// SPDX-License-Identifier: Apache-2.0

use aquaplan_model::GsrRow;
use aquaplan_view::{project, SortDirection, SortSpec, ViewSpec};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn fixture(n: usize) -> Vec<GsrRow> {
    (0..n)
        .map(|i| GsrRow {
            village_code: Some(format!("{i:06}")),
            village_name: format!("Village {}", (i * 7919) % n),
            recharge: Some(i as f64 * 1.5),
            total_demand: Some(((i * 31) % 97) as f64 + 1.0),
            gsr: if i % 11 == 0 { None } else { Some((i % 13) as f64 / 7.0) },
            gsr_classification: None,
            classification_color: None,
            trend_status: None,
        })
        .collect()
}

fn bench_project(c: &mut Criterion) {
    let rows = fixture(5_000);
    let by_ratio = ViewSpec {
        search: None,
        sort: Some(SortSpec::new("gsr", SortDirection::Descending)),
    };
    let by_name_filtered = ViewSpec {
        search: Some("village 1".to_string()),
        sort: Some(SortSpec::new("village_name", SortDirection::Ascending)),
    };
    c.bench_function("project_sort_gsr_5k", |b| {
        b.iter(|| project(black_box(&rows), black_box(&by_ratio)).len())
    });
    c.bench_function("project_search_sort_name_5k", |b| {
        b.iter(|| project(black_box(&rows), black_box(&by_name_filtered)).len())
    });
}

criterion_group!(benches, bench_project);
criterion_main!(benches);
