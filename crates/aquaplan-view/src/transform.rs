// SPDX-License-Identifier: Apache-2.0

use crate::{CellValue, TableRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Filter text typed by the user and the filter actually in effect.
///
/// Typing only updates `draft`; the projection uses `applied`, which changes
/// on `apply` or `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub draft: String,
    pub applied: String,
}

impl SearchState {
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn apply(&mut self) {
        self.applied = self.draft.trim().to_string();
    }

    pub fn clear(&mut self) {
        self.draft.clear();
        self.applied.clear();
    }

    #[must_use]
    pub fn applied_filter(&self) -> Option<&str> {
        let s = self.applied.as_str();
        (!s.is_empty()).then_some(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
}

/// Search and sort state kept per table by a front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub search: SearchState,
    pub sort: Option<SortSpec>,
}

impl TableView {
    /// Header click: a new column sorts ascending, the same column flips direction.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort = Some(match self.sort.take() {
            Some(current) if current.column == column => {
                SortSpec::new(column, current.direction.flipped())
            }
            _ => SortSpec::new(column, SortDirection::Ascending),
        });
    }

    #[must_use]
    pub fn spec(&self) -> ViewSpec {
        ViewSpec {
            search: self.search.applied_filter().map(ToString::to_string),
            sort: self.sort.clone(),
        }
    }

    #[must_use]
    pub fn project<'a, R: TableRow>(&self, rows: &'a [R]) -> Vec<&'a R> {
        project(rows, &self.spec())
    }
}

#[must_use]
pub fn fold_text(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

#[must_use]
pub fn matches_search<R: TableRow>(row: &R, folded_needle: &str) -> bool {
    folded_needle.is_empty() || fold_text(row.search_text()).contains(folded_needle)
}

/// Sort key with text folded once per row. Ascending order: missing
/// values, then numbers, then text.
enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn from_cell(cell: Option<CellValue<'_>>) -> Self {
        match cell {
            Some(CellValue::Number(n)) => Self::Number(n),
            Some(CellValue::Text(t)) => Self::Text(fold_text(t)),
            Some(CellValue::Missing) | None => Self::Missing,
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Less,
            (_, Self::Missing) => Ordering::Greater,
            (Self::Number(x), Self::Number(y)) => x.total_cmp(y),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(x), Self::Text(y)) => x.cmp(y),
        }
    }
}

/// Derives a read-only view of `rows`; the source slice is never reordered.
///
/// Sorting is stable, so ties keep their input order and projecting an
/// already projected view with the same spec yields the same sequence.
#[must_use]
pub fn project<'a, R: TableRow>(rows: &'a [R], spec: &ViewSpec) -> Vec<&'a R> {
    let needle = spec
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(fold_text);
    let filtered = rows
        .iter()
        .filter(|row| needle.as_deref().is_none_or(|n| matches_search(*row, n)));

    let Some(sort) = &spec.sort else {
        return filtered.collect();
    };

    let mut keyed: Vec<(SortKey, &'a R)> = filtered
        .map(|row| (SortKey::from_cell(row.cell(&sort.column)), row))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match sort.direction {
        SortDirection::Ascending => a.cmp(b),
        SortDirection::Descending => a.cmp(b).reverse(),
    });
    keyed.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_only_changes_on_apply() {
        let mut s = SearchState::default();
        s.set_draft("  alp ");
        assert_eq!(s.applied_filter(), None);
        s.apply();
        assert_eq!(s.applied_filter(), Some("alp"));
        s.clear();
        assert_eq!(s.applied_filter(), None);
        assert!(s.draft.is_empty());
    }

    #[test]
    fn toggle_sort_flips_same_column_and_resets_on_new_column() {
        let mut view = TableView::default();
        view.toggle_sort("gsr");
        assert_eq!(view.sort, Some(SortSpec::new("gsr", SortDirection::Ascending)));
        view.toggle_sort("gsr");
        assert_eq!(view.sort, Some(SortSpec::new("gsr", SortDirection::Descending)));
        view.toggle_sort("village_name");
        assert_eq!(
            view.sort,
            Some(SortSpec::new("village_name", SortDirection::Ascending))
        );
    }

    #[test]
    fn sort_keys_order_missing_numbers_text() {
        let key = |cell| SortKey::from_cell(Some(cell));
        assert_eq!(
            key(CellValue::Missing).cmp(&key(CellValue::Number(-1.0))),
            Ordering::Less
        );
        assert_eq!(
            key(CellValue::Number(5.0)).cmp(&key(CellValue::Text("a"))),
            Ordering::Less
        );
        assert_eq!(
            key(CellValue::Text("Beta")).cmp(&key(CellValue::Text("alpha"))),
            Ordering::Greater
        );
        assert_eq!(SortKey::from_cell(None).cmp(&key(CellValue::Missing)), Ordering::Equal);
    }

    #[test]
    fn fold_text_is_case_and_width_insensitive() {
        assert_eq!(fold_text("ＡＬＰＨＡ"), "alpha");
        assert_eq!(fold_text("Alpha"), fold_text("aLPHA"));
    }
}
