//! Long-form reshaping: wide year-by-genre table → (year, genre, popularity) triples.

use crate::pivot::{WideRow, WideTable};

/// One melted cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub year: String,
    pub genre: String,
    pub popularity: f64,
}

/// Long-form table in row-major order (each wide row's cells, left to right).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    pub rows: Vec<LongRow>,
}

impl LongTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every popularity value.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.popularity).sum()
    }

    /// Distinct genres, in first-appearance order.
    pub fn genres(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.genre.as_str()) {
                seen.push(&row.genre);
            }
        }
        seen
    }

    /// Rebuild the wide table. Inverse of [`melt`] for tables with unique year labels.
    pub fn pivot(&self) -> WideTable {
        WideTable::from_labeled_cells(
            self.rows
                .iter()
                .map(|r| (r.year.clone(), r.genre.clone(), r.popularity)),
        )
    }
}

/// Unpivot every genre column. Produces `rows × columns` entries.
pub fn melt(table: &WideTable) -> LongTable {
    let rows = table
        .rows
        .iter()
        .flat_map(|WideRow { year, values }| {
            table
                .genres
                .iter()
                .zip(values)
                .map(move |(genre, value)| LongRow {
                    year: year.clone(),
                    genre: genre.clone(),
                    popularity: *value,
                })
        })
        .collect();
    LongTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide() -> WideTable {
        WideTable {
            genres: vec!["Pop".to_string(), "Rock".to_string()],
            rows: vec![
                WideRow {
                    year: "2001".to_string(),
                    values: vec![2.0, 0.0],
                },
                WideRow {
                    year: "2000".to_string(),
                    values: vec![8.0, 7.0],
                },
            ],
        }
    }

    #[test]
    fn test_melt_is_row_major() {
        let long = melt(&wide());
        let cells: Vec<(&str, &str, f64)> = long
            .rows
            .iter()
            .map(|r| (r.year.as_str(), r.genre.as_str(), r.popularity))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("2001", "Pop", 2.0),
                ("2001", "Rock", 0.0),
                ("2000", "Pop", 8.0),
                ("2000", "Rock", 7.0),
            ]
        );
    }

    #[test]
    fn test_melt_keeps_zero_cells() {
        let long = melt(&wide());
        assert_eq!(long.len(), 4);
        assert_eq!(long.total(), 17.0);
    }

    #[test]
    fn test_melt_then_pivot_restores_table() {
        let table = wide();
        assert_eq!(melt(&table).pivot(), table);
    }

    #[test]
    fn test_melt_empty_table() {
        assert!(melt(&WideTable::default()).is_empty());
        let no_rows = WideTable {
            genres: vec!["Pop".to_string()],
            rows: vec![],
        };
        assert!(melt(&no_rows).is_empty());
    }

    #[test]
    fn test_genres_in_first_appearance_order() {
        assert_eq!(melt(&wide()).genres(), vec!["Pop", "Rock"]);
    }
}
