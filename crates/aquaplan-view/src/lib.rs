// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod format;
mod row;
mod transform;

pub use row::{CellValue, TableRow};
pub use transform::{
    fold_text, matches_search, project, SearchState, SortDirection, SortSpec,
    TableView, ViewSpec,
};

pub const CRATE_NAME: &str = "aquaplan-view";
