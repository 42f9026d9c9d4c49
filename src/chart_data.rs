//! Prepare chart data from the long-form table: year labels become nominal x categories,
//! one (x, y) series per genre.

use crate::pivot::compare_year_labels;
use crate::reshape::LongTable;

/// One line of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub genre: String,
    /// (category index, popularity), sorted by category index.
    pub points: Vec<(f64, f64)>,
}

/// Everything needed to draw the chart, independent of the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    /// Distinct year labels, ascending. Point x values index into this.
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    /// Label for an x value, if it lands on a category.
    pub fn category_label(&self, x: f64) -> Option<&str> {
        if x < 0.0 || x.fract() != 0.0 {
            return None;
        }
        self.categories.get(x as usize).map(|s| s.as_str())
    }

    /// (x_min, x_max, y_min, y_max) over all points, `None` when there are none.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let &(x0, y0) = points.next()?;
        Some(points.fold((x0, x0, y0, y0), |(x_lo, x_hi, y_lo, y_hi), &(x, y)| {
            (x_lo.min(x), x_hi.max(x), y_lo.min(y), y_hi.max(y))
        }))
    }
}

/// Build chart series from the long-form table. Non-finite values are skipped.
pub fn prepare_chart_data(long: &LongTable) -> ChartData {
    let mut categories: Vec<String> = Vec::new();
    for row in &long.rows {
        if !categories.contains(&row.year) {
            categories.push(row.year.clone());
        }
    }
    categories.sort_by(|a, b| compare_year_labels(a, b));

    let series = long
        .genres()
        .into_iter()
        .map(|genre| {
            let mut points: Vec<(f64, f64)> = long
                .rows
                .iter()
                .filter(|r| r.genre == genre && r.popularity.is_finite())
                .filter_map(|r| {
                    let x = categories.iter().position(|c| *c == r.year)?;
                    Some((x as f64, r.popularity))
                })
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            ChartSeries {
                genre: genre.to_string(),
                points,
            }
        })
        .collect();

    ChartData { categories, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::LongRow;

    fn long(rows: &[(&str, &str, f64)]) -> LongTable {
        LongTable {
            rows: rows
                .iter()
                .map(|(y, g, p)| LongRow {
                    year: y.to_string(),
                    genre: g.to_string(),
                    popularity: *p,
                })
                .collect(),
        }
    }

    #[test]
    fn prepare_orders_categories_ascending() {
        let data = prepare_chart_data(&long(&[
            ("2001", "Pop", 2.0),
            ("2001", "Rock", 0.0),
            ("2000", "Pop", 8.0),
            ("2000", "Rock", 7.0),
        ]));
        assert_eq!(data.categories, vec!["2000", "2001"]);
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series[0].genre, "Pop");
        assert_eq!(data.series[0].points, vec![(0.0, 8.0), (1.0, 2.0)]);
        assert_eq!(data.series[1].points, vec![(0.0, 7.0), (1.0, 0.0)]);
    }

    #[test]
    fn prepare_empty_table() {
        let data = prepare_chart_data(&LongTable::default());
        assert!(data.is_empty());
        assert!(data.categories.is_empty());
        assert_eq!(data.bounds(), None);
    }

    #[test]
    fn prepare_skips_nan() {
        let data = prepare_chart_data(&long(&[
            ("2000", "Pop", 1.0),
            ("2001", "Pop", f64::NAN),
            ("2002", "Pop", 3.0),
        ]));
        assert_eq!(data.series[0].points, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn text_labels_follow_numeric_years() {
        let data = prepare_chart_data(&long(&[("later", "Pop", 1.0), ("1999", "Pop", 2.0)]));
        assert_eq!(data.categories, vec!["1999", "later"]);
        assert_eq!(data.category_label(1.0), Some("later"));
        assert_eq!(data.category_label(0.5), None);
    }

    #[test]
    fn bounds_cover_all_series() {
        let data = prepare_chart_data(&long(&[
            ("2000", "Pop", -1.0),
            ("2001", "Rock", 9.0),
        ]));
        assert_eq!(data.bounds(), Some((0.0, 1.0, -1.0, 9.0)));
    }
}
