//! Filter-pivot engine: selected records → year-by-genre table of summed popularity.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;

use crate::dataset::{Dataset, GenreRecord, GENRE_COLUMN, POPULARITY_COLUMN, YEAR_COLUMN};
use crate::selection::Selection;

/// One row of the wide table: a year label and one value per genre column.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    /// Row key. Text so the grid can edit it without numeric coercion.
    pub year: String,
    pub values: Vec<f64>,
}

/// Years down, genres across. Every row has exactly `genres.len()` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub genres: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Pivot integer-year cells. Duplicate (year, genre) pairs are summed.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (i64, String, f64)>,
    {
        Self::from_labeled_cells(
            cells
                .into_iter()
                .map(|(year, genre, value)| (year.to_string(), genre, value)),
        )
    }

    /// Pivot labeled cells: rows sorted descending by year label, genres alphabetical,
    /// missing combinations filled with 0.
    pub fn from_labeled_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (String, String, f64)>,
    {
        let mut genres = BTreeSet::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        let mut sums: Vec<(String, HashMap<String, f64>)> = Vec::new();

        for (year, genre, value) in cells {
            let idx = *row_index.entry(year.clone()).or_insert_with(|| {
                sums.push((year.clone(), HashMap::new()));
                sums.len() - 1
            });
            *sums[idx].1.entry(genre.clone()).or_insert(0.0) += value;
            genres.insert(genre);
        }

        sums.sort_by(|a, b| compare_year_labels(&b.0, &a.0));
        let genres: Vec<String> = genres.into_iter().collect();
        let rows = sums
            .into_iter()
            .map(|(year, by_genre)| WideRow {
                values: genres
                    .iter()
                    .map(|g| by_genre.get(g).copied().unwrap_or(0.0))
                    .collect(),
                year,
            })
            .collect();

        Self { genres, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.genres.is_empty()
    }

    pub fn genre_index(&self, genre: &str) -> Option<usize> {
        self.genres.iter().position(|g| g == genre)
    }

    /// Value at (year label, genre), if both exist. First matching row wins.
    pub fn get(&self, year: &str, genre: &str) -> Option<f64> {
        let col = self.genre_index(genre)?;
        self.rows
            .iter()
            .find(|r| r.year == year)
            .and_then(|r| r.values.get(col).copied())
    }
}

/// Order year labels: integers numerically, integers before free text, text lexically.
pub fn compare_year_labels(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Predicate keeping rows whose genre is selected and whose year is inside the window.
fn selection_predicate(selection: &Selection) -> Expr {
    let genre_pred = selection
        .genres
        .iter()
        .fold(lit(false), |acc, genre| {
            acc.or(col(GENRE_COLUMN).eq(lit(genre.as_str())))
        });
    let year_pred = col(YEAR_COLUMN)
        .gt_eq(lit(selection.year_range.start))
        .and(col(YEAR_COLUMN).lt_eq(lit(selection.year_range.end)));
    genre_pred.and(year_pred)
}

/// Filter the dataset by `selection`, sum popularity per (year, genre) and pivot.
pub fn filter_pivot(dataset: &Dataset, selection: &Selection) -> PolarsResult<WideTable> {
    if selection.genres.is_empty() || selection.year_range.is_empty() {
        return Ok(WideTable::default());
    }

    let grouped = dataset
        .frame()
        .clone()
        .lazy()
        .filter(selection_predicate(selection))
        .group_by([col(YEAR_COLUMN), col(GENRE_COLUMN)])
        .agg([col(POPULARITY_COLUMN).sum()])
        .collect()?;

    let years = grouped.column(YEAR_COLUMN)?.i64()?;
    let genres = grouped.column(GENRE_COLUMN)?.str()?;
    let sums = grouped.column(POPULARITY_COLUMN)?.f64()?;

    let cells: Vec<(i64, String, f64)> = years
        .into_iter()
        .zip(genres)
        .zip(sums)
        .filter_map(|((year, genre), sum)| Some((year?, genre?.to_string(), sum.unwrap_or(0.0))))
        .collect();

    let table = WideTable::from_cells(cells);
    tracing::debug!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        genres = selection.genres.len(),
        start = selection.year_range.start,
        end = selection.year_range.end,
        "filter-pivot complete"
    );
    Ok(table)
}

/// Same result as [`filter_pivot`], computed directly over records.
pub fn pivot_records(records: &[GenreRecord], selection: &Selection) -> WideTable {
    WideTable::from_cells(
        records
            .iter()
            .filter(|r| selection.matches(&r.genre, r.year))
            .map(|r| (r.year, r.genre.clone(), r.popularity)),
    )
}
