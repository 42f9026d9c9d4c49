#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Records (Pop,1999,10), (Pop,2000,5), (Rock,2000,7), (Pop,2000,3)
pub const SCENARIO_CSV: &str = "\
genre,year,popularity
Pop,1999,10
Pop,2000,5
Rock,2000,7
Pop,2000,3
";

/// Several genres over 1998..=2022 with duplicate (year, genre) rows
pub fn sample_csv() -> String {
    let mut body = String::from("genre,year,popularity\n");
    let genres = ["Pop", "Rock", "Hip-Hop", "Jazz", "Classical", "Metal"];
    for year in 1998..=2022 {
        for (i, genre) in genres.iter().enumerate() {
            let value = ((year - 1990) * (i as i64 + 1)) % 17;
            body.push_str(&format!("{},{},{}\n", genre, year, value));
        }
        body.push_str(&format!("Pop,{},1\n", year));
    }
    body
}

pub fn write_csv(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write test csv");
    path
}

pub fn scenario_csv(dir: &TempDir) -> PathBuf {
    write_csv(dir, "music_genres_summary.csv", SCENARIO_CSV)
}
