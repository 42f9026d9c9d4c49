//! Dataset loading: read the genre popularity CSV into a normalized frame.
//!
//! The normalized frame always has exactly three columns: `genre` (String),
//! `year` (Int64) and `popularity` (Float64).

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;

pub const GENRE_COLUMN: &str = "genre";
pub const YEAR_COLUMN: &str = "year";
pub const POPULARITY_COLUMN: &str = "popularity";

const REQUIRED_COLUMNS: [&str; 3] = [GENRE_COLUMN, YEAR_COLUMN, POPULARITY_COLUMN];

/// One source row: popularity of a genre in a given year.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreRecord {
    pub genre: String,
    pub year: i64,
    pub popularity: f64,
}

impl GenreRecord {
    pub fn new(genre: impl Into<String>, year: i64, popularity: f64) -> Self {
        Self {
            genre: genre.into(),
            year,
            popularity,
        }
    }
}

/// Failures while reading or normalizing the source file. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is missing required column(s): {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("year column in {} is not integer-coercible: {detail}", path.display())]
    YearCoercion { path: PathBuf, detail: String },
    #[error("popularity column in {} is not numeric: {detail}", path.display())]
    PopularityCoercion { path: PathBuf, detail: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// CSV reading options (from config and CLI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub has_header: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// The loaded, normalized dataset. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    frame: DataFrame,
    records: Vec<GenreRecord>,
}

impl Dataset {
    /// Read `path` as CSV and normalize it.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        // Surface permission problems and directories as I/O errors rather than parser errors
        if let Err(source) = std::fs::File::open(path).and_then(|f| {
            if f.metadata()?.is_dir() {
                Err(std::io::Error::other("Is a directory"))
            } else {
                Ok(())
            }
        }) {
            return Err(LoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }

        let mut read_options = CsvReadOptions::default().with_has_header(options.has_header);
        if let Some(delimiter) = options.delimiter {
            read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
        }
        let mut df = read_options
            .try_into_reader_with_file_path(Some(path.into()))?
            .finish()?;
        if !options.has_header {
            name_positional_columns(&mut df)?;
        }

        let dataset = Self::from_frame(df, path)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            genres = dataset.genres().len(),
            year_bounds = ?dataset.year_bounds(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Normalize an already-read frame. `path` is only used for error messages.
    pub fn from_frame(df: DataFrame, path: &Path) -> Result<Self, LoadError> {
        let present: HashSet<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !present.contains(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        let mut frame = df.select(REQUIRED_COLUMNS)?;

        let year = frame
            .column(YEAR_COLUMN)?
            .as_materialized_series()
            .strict_cast(&DataType::Int64)
            .map_err(|e| LoadError::YearCoercion {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        if year.null_count() > 0 {
            return Err(LoadError::YearCoercion {
                path: path.to_path_buf(),
                detail: format!("{} row(s) have no year", year.null_count()),
            });
        }

        let popularity = frame
            .column(POPULARITY_COLUMN)?
            .as_materialized_series()
            .strict_cast(&DataType::Float64)
            .map_err(|e| LoadError::PopularityCoercion {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let genre = frame
            .column(GENRE_COLUMN)?
            .as_materialized_series()
            .cast(&DataType::String)?;

        frame.with_column(year)?;
        frame.with_column(popularity)?;
        frame.with_column(genre)?;

        // A row without a genre can never be selected
        let frame = frame
            .lazy()
            .filter(col(GENRE_COLUMN).is_not_null())
            .collect()?;

        let records = collect_records(&frame)?;
        Ok(Self {
            path: path.to_path_buf(),
            frame,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized frame (`genre`, `year`, `popularity`).
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Source rows in file order.
    pub fn records(&self) -> &[GenreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct genres in order of first appearance.
    pub fn genres(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.genre.as_str()))
            .map(|r| r.genre.clone())
            .collect()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i64> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Smallest and largest year, or None for an empty dataset.
    pub fn year_bounds(&self) -> Option<(i64, i64)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }
}

/// Headerless files are read as genre, year, popularity in that order.
fn name_positional_columns(df: &mut DataFrame) -> PolarsResult<()> {
    let names = df.get_column_names_owned();
    for (old, new) in names.iter().zip(REQUIRED_COLUMNS) {
        df.rename(old.as_str(), new.into())?;
    }
    Ok(())
}

fn collect_records(frame: &DataFrame) -> PolarsResult<Vec<GenreRecord>> {
    let genres = frame.column(GENRE_COLUMN)?.str()?;
    let years = frame.column(YEAR_COLUMN)?.i64()?;
    let popularity = frame.column(POPULARITY_COLUMN)?.f64()?;

    let records = genres
        .into_iter()
        .zip(years)
        .zip(popularity)
        .filter_map(|((genre, year), popularity)| {
            Some(GenreRecord {
                genre: genre?.to_string(),
                year: year?,
                // Sums ignore missing values, which is the same as adding zero
                popularity: popularity.unwrap_or(0.0),
            })
        })
        .collect();
    Ok(records)
}
