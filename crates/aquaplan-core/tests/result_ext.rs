// SPDX-License-Identifier: Apache-2.0

use aquaplan_core::ResultExt;
use std::path::Path;

#[test]
fn context_prefixes_the_source_error() {
    let parsed: Result<u32, _> = "ten".parse::<u32>().with_context("parse horizon");
    let err = parsed.expect_err("not a number");
    assert_eq!(err.context, "parse horizon");
    assert!(err.to_string().starts_with("parse horizon: "));
}

#[test]
fn located_context_names_the_file() {
    let missing = Path::new("/nonexistent/aquaplan/scenario.json");
    let err = std::fs::read(missing)
        .with_context("read scenario")
        .expect_err("missing file");
    let message = err.at(missing.display());
    assert!(message.starts_with("read scenario /nonexistent/aquaplan/scenario.json: "));
    assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
}
