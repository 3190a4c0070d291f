//! Column validation and projection helpers
//!
//! Every frame entering the pipeline is checked against the columns it must
//! carry before any value is read, so a malformed input fails with the complete
//! list of what is missing rather than on the first absent column.

use crate::error::PipelineError;
use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Names of the required columns that `df` does not carry, in request order
pub fn missing_columns(df: &DataFrame, columns: &[&str]) -> Vec<String> {
    let actual: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    columns
        .iter()
        .filter(|&&name| !actual.contains(name))
        .map(|&name| name.to_string())
        .collect()
}

/// Fail with `PipelineError::MissingColumns` unless every column is present
pub fn require_columns(df: &DataFrame, columns: &[&str], context: &str) -> Result<()> {
    let missing = missing_columns(df, columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns {
            context: context.to_string(),
            missing,
        }
        .into())
    }
}

/// Materialize exactly the given columns after validating they exist
///
/// # Example
/// ```rust,ignore
/// let slim = materialize_with_columns(&enriched, &["state", "crop", "agro_stress_index"], "report")?;
/// ```
pub fn materialize_with_columns(
    df: &DataFrame,
    columns: &[&str],
    context: &str,
) -> Result<DataFrame> {
    require_columns(df, columns, context)?;

    let col_exprs: Vec<Expr> = columns.iter().map(|&name| col(name)).collect();

    df.clone()
        .lazy()
        .select(&col_exprs)
        .collect()
        .with_context(|| format!("{}: Failed to materialize columns {:?}", context, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_with_columns_success() {
        let df = df![
            "state" => &["punjab", "kerala"],
            "crop" => &["rice", "rice"],
            "extra_col" => &["e1", "e2"],
        ]
        .unwrap();

        let materialized = materialize_with_columns(&df, &["state", "crop"], "test").unwrap();
        assert_eq!(materialized.width(), 2);
        assert_eq!(materialized.height(), 2);
    }

    #[test]
    fn test_require_columns_reports_all_missing() {
        let df = df![
            "state" => &["punjab"],
        ]
        .unwrap();

        let err = require_columns(&df, &["state", "crop", "year"], "records").unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingColumns { context, missing }) => {
                assert_eq!(context, "records");
                assert_eq!(missing, &vec!["crop".to_string(), "year".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_materialize_with_columns_missing() {
        let df = df![
            "state" => &["punjab"],
        ]
        .unwrap();

        let result = materialize_with_columns(&df, &["missing_column"], "test");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("missing_column"));
    }
}
