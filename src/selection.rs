//! Selection state: which genres and which inclusive year window are shown.

use std::collections::BTreeSet;

use crate::dataset::Dataset;

/// Genres selected when the application starts (those missing from the data are skipped).
pub const DEFAULT_GENRES: [&str; 5] = ["Pop", "Rock", "Hip-Hop", "Jazz", "Classical"];

/// Year window selected when the application starts, before clamping to the data.
pub const DEFAULT_YEAR_RANGE: (i64, i64) = (2000, 2020);

/// Inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i64,
    pub end: i64,
}

impl YearRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i64) -> bool {
        self.start <= year && year <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Clamp into `bounds`. A window that misses `bounds` entirely becomes `bounds`.
    pub fn clamp_to(self, bounds: (i64, i64)) -> Self {
        let (lo, hi) = bounds;
        if self.end < lo || self.start > hi || self.is_empty() {
            return Self::new(lo, hi);
        }
        Self::new(self.start.clamp(lo, hi), self.end.clamp(lo, hi))
    }
}

/// Values the user can pick from, derived from the loaded dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOptions {
    /// Distinct genres in order of first appearance.
    pub genres: Vec<String>,
    /// Distinct years, ascending.
    pub years: Vec<i64>,
}

impl SelectionOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            genres: dataset.genres(),
            years: dataset.years(),
        }
    }

    /// Slider bounds: min and max available year.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}

/// Starting selection, configurable through `[selection]` in the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDefaults {
    pub genres: Vec<String>,
    pub year_range: YearRange,
}

impl Default for SelectionDefaults {
    fn default() -> Self {
        Self {
            genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            year_range: YearRange::new(DEFAULT_YEAR_RANGE.0, DEFAULT_YEAR_RANGE.1),
        }
    }
}

/// The user's current genre set and year window.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub genres: BTreeSet<String>,
    pub year_range: YearRange,
}

impl Selection {
    pub fn new<I, S>(genres: I, year_range: YearRange) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            genres: genres.into_iter().map(Into::into).collect(),
            year_range,
        }
    }

    /// Initial selection: default genres that exist in the data, default window clamped to the data.
    pub fn default_for(options: &SelectionOptions, defaults: &SelectionDefaults) -> Self {
        let genres: BTreeSet<String> = defaults
            .genres
            .iter()
            .filter(|g| options.genres.contains(g))
            .cloned()
            .collect();

        let year_range = match options.bounds() {
            Some(bounds) => {
                let clamped = defaults.year_range.clamp_to(bounds);
                if clamped != defaults.year_range {
                    tracing::debug!(
                        requested = ?defaults.year_range,
                        ?bounds,
                        ?clamped,
                        "default year range clamped to data bounds"
                    );
                }
                clamped
            }
            None => defaults.year_range,
        };

        Self { genres, year_range }
    }

    pub fn contains_genre(&self, genre: &str) -> bool {
        self.genres.contains(genre)
    }

    /// Add the genre if absent, remove it if present.
    pub fn toggle_genre(&mut self, genre: &str) {
        if !self.genres.remove(genre) {
            self.genres.insert(genre.to_string());
        }
    }

    /// True when a record with this genre and year passes the selection.
    pub fn matches(&self, genre: &str, year: i64) -> bool {
        self.genres.contains(genre) && self.year_range.contains(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(genres: &[&str], years: &[i64]) -> SelectionOptions {
        SelectionOptions {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            years: years.to_vec(),
        }
    }

    #[test]
    fn test_default_genres_intersect_with_data() {
        let opts = options(&["Pop", "Jazz", "Metal"], &[1990, 2025]);
        let selection = Selection::default_for(&opts, &SelectionDefaults::default());
        let genres: Vec<&str> = selection.genres.iter().map(|s| s.as_str()).collect();
        assert_eq!(genres, vec!["Jazz", "Pop"]);
        assert_eq!(selection.year_range, YearRange::new(2000, 2020));
    }

    #[test]
    fn test_default_range_clamped_to_bounds() {
        let opts = options(&["Pop"], &[2005, 2010, 2015]);
        let selection = Selection::default_for(&opts, &SelectionDefaults::default());
        assert_eq!(selection.year_range, YearRange::new(2005, 2015));
    }

    #[test]
    fn test_default_range_outside_bounds_uses_full_bounds() {
        let opts = options(&["Pop"], &[1950, 1960, 1970]);
        let selection = Selection::default_for(&opts, &SelectionDefaults::default());
        assert_eq!(selection.year_range, YearRange::new(1950, 1970));
    }

    #[test]
    fn test_empty_options_keep_defaults() {
        let selection =
            Selection::default_for(&SelectionOptions::default(), &SelectionDefaults::default());
        assert!(selection.genres.is_empty());
        assert_eq!(selection.year_range, YearRange::new(2000, 2020));
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = YearRange::new(2000, 2002);
        assert!(range.contains(2000));
        assert!(range.contains(2001));
        assert!(range.contains(2002));
        assert!(!range.contains(1999));
        assert!(!range.contains(2003));
    }

    #[test]
    fn test_toggle_genre() {
        let mut selection = Selection::new(["Pop"], YearRange::new(2000, 2000));
        selection.toggle_genre("Rock");
        assert!(selection.contains_genre("Rock"));
        selection.toggle_genre("Pop");
        assert!(!selection.contains_genre("Pop"));
        assert!(selection.matches("Rock", 2000));
        assert!(!selection.matches("Rock", 2001));
    }
}
