mod common;

use genre_trends::chart_data::prepare_chart_data;
use genre_trends::pivot::{compare_year_labels, pivot_records};
use genre_trends::widgets::grid::GridState;
use genre_trends::{
    filter_pivot, melt, Dataset, LoadError, LoadOptions, PipelineContext, ReloadPolicy, Selection,
    YearRange,
};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tempfile::TempDir;

fn load(body: &str) -> (TempDir, Dataset) {
    let dir = TempDir::new().unwrap();
    let path = common::write_csv(&dir, "music_genres_summary.csv", body);
    let dataset = Dataset::load(&path, &LoadOptions::default()).unwrap();
    (dir, dataset)
}

#[test]
fn test_scenario_duplicates_summed() {
    let (_dir, dataset) = load(common::SCENARIO_CSV);
    let selection = Selection::new(["Pop", "Rock"], YearRange::new(2000, 2000));
    let table = filter_pivot(&dataset, &selection).unwrap();

    assert_eq!(table.num_rows(), 1);
    assert_eq!(table.rows[0].year, "2000");
    assert_eq!(table.get("2000", "Pop"), Some(8.0));
    assert_eq!(table.get("2000", "Rock"), Some(7.0));
}

#[test]
fn test_scenario_edit_then_melt() {
    let (_dir, dataset) = load(common::SCENARIO_CSV);
    let selection = Selection::new(["Pop", "Rock"], YearRange::new(2000, 2000));
    let mut grid = GridState::new(filter_pivot(&dataset, &selection).unwrap());

    let pop = grid.table().genre_index("Pop").unwrap();
    grid.set_cell(0, pop, 20.0).unwrap();
    let long = melt(grid.table());

    let triples: Vec<(&str, &str, f64)> = long
        .rows
        .iter()
        .map(|r| (r.year.as_str(), r.genre.as_str(), r.popularity))
        .collect();
    assert!(triples.contains(&("2000", "Pop", 20.0)));
    assert!(triples.contains(&("2000", "Rock", 7.0)));
    assert_eq!(long.len(), 2);
}

#[test]
fn test_shape_matches_distinct_years_and_genres() {
    let (_dir, dataset) = load(&common::sample_csv());
    let selection = Selection::new(["Jazz", "Metal", "Blues"], YearRange::new(2005, 2010));
    let table = filter_pivot(&dataset, &selection).unwrap();

    let present: Vec<_> = dataset
        .records()
        .iter()
        .filter(|r| selection.matches(&r.genre, r.year))
        .collect();
    let years: BTreeSet<i64> = present.iter().map(|r| r.year).collect();
    let genres: BTreeSet<&str> = present.iter().map(|r| r.genre.as_str()).collect();

    assert_eq!(table.num_rows(), years.len());
    assert_eq!(table.num_columns(), genres.len());
    assert_eq!(table.genres, vec!["Jazz", "Metal"]);
}

#[test]
fn test_every_cell_is_group_sum() {
    let (_dir, dataset) = load(&common::sample_csv());
    let selection = Selection::new(["Pop", "Rock", "Classical"], YearRange::new(1998, 2022));
    let table = filter_pivot(&dataset, &selection).unwrap();

    for row in &table.rows {
        let year: i64 = row.year.parse().unwrap();
        for (genre, value) in table.genres.iter().zip(&row.values) {
            let expected: f64 = dataset
                .records()
                .iter()
                .filter(|r| r.year == year && &r.genre == genre)
                .map(|r| r.popularity)
                .sum();
            assert_eq!(*value, expected, "{} @ {}", genre, year);
        }
    }
}

#[test]
fn test_rows_strictly_descending() {
    let (_dir, dataset) = load(&common::sample_csv());
    let selection = Selection::new(["Pop", "Hip-Hop"], YearRange::new(1990, 2030));
    let table = filter_pivot(&dataset, &selection).unwrap();

    assert_eq!(table.num_rows(), 25);
    for pair in table.rows.windows(2) {
        assert_eq!(
            compare_year_labels(&pair[0].year, &pair[1].year),
            Ordering::Greater
        );
    }
}

#[test]
fn test_melt_then_pivot_round_trips() {
    let (_dir, dataset) = load(&common::sample_csv());
    let selection = Selection::new(["Pop", "Jazz", "Rock"], YearRange::new(2003, 2011));
    let table = filter_pivot(&dataset, &selection).unwrap();

    let long = melt(&table);
    assert_eq!(long.len(), table.num_rows() * table.num_columns());
    assert_eq!(long.pivot(), table);
}

#[test]
fn test_zero_genres_is_empty_not_error() {
    let (_dir, dataset) = load(&common::sample_csv());
    let selection = Selection::new(Vec::<String>::new(), YearRange::new(2000, 2020));
    let table = filter_pivot(&dataset, &selection).unwrap();

    assert_eq!(table.num_columns(), 0);
    assert_eq!(table.num_rows(), 0);
    let long = melt(&table);
    assert!(long.is_empty());
    assert!(prepare_chart_data(&long).is_empty());
}

#[test]
fn test_engine_matches_record_pivot() {
    let (_dir, dataset) = load(&common::sample_csv());
    for (genres, range) in [
        (vec!["Pop"], YearRange::new(1998, 1998)),
        (vec!["Rock", "Metal", "Jazz"], YearRange::new(2010, 2022)),
        (vec!["Classical", "Hip-Hop"], YearRange::new(2030, 2040)),
    ] {
        let selection = Selection::new(genres, range);
        assert_eq!(
            filter_pivot(&dataset, &selection).unwrap(),
            pivot_records(dataset.records(), &selection)
        );
    }
}

#[test]
fn test_chart_categories_follow_table_years() {
    let (_dir, dataset) = load(&common::sample_csv());
    let selection = Selection::new(["Pop", "Rock"], YearRange::new(2018, 2020));
    let chart = prepare_chart_data(&melt(&filter_pivot(&dataset, &selection).unwrap()));

    assert_eq!(chart.categories, vec!["2018", "2019", "2020"]);
    assert_eq!(chart.series.len(), 2);
    assert!(chart.series.iter().all(|s| s.points.len() == 3));
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("music_genres_summary.csv");
    let mut ctx = PipelineContext::new(&path, LoadOptions::default(), ReloadPolicy::EveryRun);
    let err = ctx.dataset().unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
}

#[test]
fn test_non_integer_year_fails_load() {
    let dir = TempDir::new().unwrap();
    let path = common::write_csv(
        &dir,
        "bad.csv",
        "genre,year,popularity\nPop,2000,1\nRock,twenty,2\n",
    );
    let err = Dataset::load(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::YearCoercion { .. }), "{:?}", err);
}

#[test]
fn test_absent_column_fails_load() {
    let dir = TempDir::new().unwrap();
    let path = common::write_csv(&dir, "bad.csv", "genre,year\nPop,2000\n");
    let err = Dataset::load(&path, &LoadOptions::default()).unwrap_err();
    match err {
        LoadError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["popularity"]),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_reload_picks_up_file_changes() {
    let dir = TempDir::new().unwrap();
    let path = common::scenario_csv(&dir);
    let mut ctx = PipelineContext::new(&path, LoadOptions::default(), ReloadPolicy::EveryRun);
    let selection = Selection::new(["Pop", "Rock"], YearRange::new(2000, 2000));
    assert_eq!(ctx.run(&selection).unwrap().table.get("2000", "Pop"), Some(8.0));

    common::write_csv(
        &dir,
        "music_genres_summary.csv",
        "genre,year,popularity\nPop,2000,1\n",
    );
    let run = ctx.run(&selection).unwrap();
    assert_eq!(run.table.get("2000", "Pop"), Some(1.0));
    assert_eq!(run.table.get("2000", "Rock"), None);
}
