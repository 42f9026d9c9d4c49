//! User-facing error message formatting.
//!
//! Matches on typed errors (LoadError, PolarsError, io::ErrorKind) to produce
//! short messages for the error modal and startup failures.

use polars::prelude::PolarsError;
use std::io;
use std::path::Path;

use crate::dataset::LoadError;
use crate::pipeline::PipelineError;

/// Message for a failed dataset load.
pub fn user_message_from_load(err: &LoadError) -> String {
    match err {
        LoadError::NotFound(path) => format!(
            "Data file not found: {}. Pass a path or set [data] path in the config.",
            path.display()
        ),
        LoadError::Unreadable { path, source } => format!(
            "Cannot read {}: {}",
            path.display(),
            user_message_from_io(source, None)
        ),
        LoadError::MissingColumns { path, missing } => format!(
            "{} is missing column(s): {}. Expected genre, year and popularity.",
            path.display(),
            missing.join(", ")
        ),
        LoadError::YearCoercion { path, .. } => format!(
            "The year column in {} must contain whole numbers.",
            path.display()
        ),
        LoadError::PopularityCoercion { path, .. } => format!(
            "The popularity column in {} must be numeric.",
            path.display()
        ),
        LoadError::Polars(e) => user_message_from_polars(e),
    }
}

pub fn user_message_from_pipeline(err: &PipelineError) -> String {
    match err {
        PipelineError::Load(e) => user_message_from_load(e),
        PipelineError::Pivot(e) => format!("Could not build table: {}", user_message_from_polars(e)),
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!("Column not found: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::ComputeError(msg) => format!("Could not parse the file: {}", msg),
        PE::Context { error, msg } => format!("{}: {}", msg, user_message_from_polars(error)),
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check access rights.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            msg
        }
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Walk a report's cause chain for a known error type; first line of the report otherwise.
pub fn user_message_from_report(report: &color_eyre::eyre::Report, path: Option<&Path>) -> String {
    let msg = report
        .chain()
        .find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<LoadError>() {
                Some(user_message_from_load(e))
            } else if let Some(e) = cause.downcast_ref::<PolarsError>() {
                Some(user_message_from_polars(e))
            } else {
                cause
                    .downcast_ref::<io::Error>()
                    .map(|e| user_message_from_io(e, None))
            }
        })
        .unwrap_or_else(|| {
            report
                .to_string()
                .lines()
                .next()
                .unwrap_or("An error occurred")
                .trim()
                .to_string()
        });

    match path {
        Some(p) => format!("{}: {}", p.display(), msg),
        None => msg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_columns_lists_names() {
        let err = LoadError::MissingColumns {
            path: PathBuf::from("data.csv"),
            missing: vec!["year".to_string(), "popularity".to_string()],
        };
        let msg = user_message_from_load(&err);
        assert!(msg.contains("data.csv"), "got: {}", msg);
        assert!(msg.contains("year, popularity"), "got: {}", msg);
    }

    #[test]
    fn test_not_found_mentions_path() {
        let err = LoadError::NotFound(PathBuf::from("music_genres_summary.csv"));
        let msg = user_message_from_load(&err);
        assert!(msg.contains("not found"), "got: {}", msg);
        assert!(msg.contains("music_genres_summary.csv"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_io_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let msg = user_message_from_io(&err, None);
        assert!(msg.to_lowercase().contains("permission"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_polars_column_not_found() {
        let err = PolarsError::ColumnNotFound("foo".into());
        let msg = user_message_from_polars(&err);
        assert!(msg.contains("Column not found"), "got: {}", msg);
        assert!(msg.contains("foo"), "got: {}", msg);
    }

    #[test]
    fn test_report_downcasts_load_error() {
        let report = color_eyre::eyre::Report::new(LoadError::NotFound(PathBuf::from("x.csv")));
        let msg = user_message_from_report(&report, None);
        assert!(msg.starts_with("Data file not found"), "got: {}", msg);
    }

    #[test]
    fn test_report_fallback_uses_first_line() {
        let report = color_eyre::eyre::eyre!("first line\nsecond line");
        assert_eq!(user_message_from_report(&report, None), "first line");
    }
}
