//! Structured filters for the advanced search page.
//!
//! Filters are validated and serialized into discrete query parameters;
//! user input is never spliced into a query string by the client.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

/// Earliest deposition year accepted by the filter form.
pub const MIN_DEPOSITION_YEAR: i32 = 1970;

/// Latest deposition year accepted by the filter form.
pub const MAX_DEPOSITION_YEAR: i32 = 2100;

/// Advanced search criteria. Every field is optional; blank strings are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ranges"))]
pub struct SearchFilter {
    #[validate(length(max = 200))]
    pub keyword: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub resolution_min: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub resolution_max: Option<f64>,
    #[validate(length(max = 200))]
    pub organism: Option<String>,
    #[validate(range(min = 0))]
    pub chain_length_min: Option<i64>,
    #[validate(range(min = 0))]
    pub chain_length_max: Option<i64>,
    #[validate(range(min = 1970, max = 2100))]
    pub deposition_year_from: Option<i32>,
    #[validate(range(min = 1970, max = 2100))]
    pub deposition_year_to: Option<i32>,
    #[validate(length(max = 200))]
    pub author: Option<String>,
    #[validate(length(max = 200))]
    pub journal: Option<String>,
    pub has_ligands: Option<bool>,
}

fn validate_ranges(filter: &SearchFilter) -> Result<(), ValidationError> {
    fn ordered<T: PartialOrd>(lo: Option<T>, hi: Option<T>) -> bool {
        match (lo, hi) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        }
    }

    if !ordered(filter.resolution_min, filter.resolution_max) {
        return Err(range_error("resolution"));
    }
    if !ordered(filter.chain_length_min, filter.chain_length_max) {
        return Err(range_error("chain length"));
    }
    if !ordered(filter.deposition_year_from, filter.deposition_year_to) {
        return Err(range_error("deposition year"));
    }
    Ok(())
}

fn range_error(what: &'static str) -> ValidationError {
    let mut err = ValidationError::new("range_order");
    err.message = Some(format!("Minimum {what} must not exceed maximum").into());
    err
}

impl SearchFilter {
    /// `true` when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.query_params().is_empty()
    }

    /// Validate and serialize into `(name, value)` query parameters, in a
    /// stable order. Values are passed through verbatim; percent-encoding
    /// is the HTTP layer's job.
    pub fn to_query_params(&self) -> Result<Vec<(&'static str, String)>, CoreError> {
        self.validate()?;
        Ok(self.query_params())
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        let mut text = |name: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((name, v.to_string()));
            }
        };
        text("keyword", &self.keyword);
        text("organism", &self.organism);
        text("author", &self.author);
        text("journal", &self.journal);

        let numbers = [
            ("resolution_min", self.resolution_min.map(|v| v.to_string())),
            ("resolution_max", self.resolution_max.map(|v| v.to_string())),
            ("chain_length_min", self.chain_length_min.map(|v| v.to_string())),
            ("chain_length_max", self.chain_length_max.map(|v| v.to_string())),
            ("deposition_year_from", self.deposition_year_from.map(|v| v.to_string())),
            ("deposition_year_to", self.deposition_year_to.map(|v| v.to_string())),
            ("has_ligands", self.has_ligands.map(|v| v.to_string())),
        ];
        params.extend(numbers.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_filter_has_no_params() {
        let filter = SearchFilter::default();
        assert!(filter.is_empty());
        assert!(filter.to_query_params().unwrap().is_empty());
    }

    #[test]
    fn params_carry_raw_values_without_sql() {
        let filter = SearchFilter {
            organism: Some("Homo sapiens' OR '1'='1".into()),
            resolution_max: Some(2.5),
            has_ligands: Some(true),
            ..Default::default()
        };
        let params = filter.to_query_params().unwrap();
        assert_eq!(
            params,
            vec![
                ("organism", "Homo sapiens' OR '1'='1".to_string()),
                ("resolution_max", "2.5".to_string()),
                ("has_ligands", "true".to_string()),
            ]
        );
        assert!(params.iter().all(|(_, v)| !v.contains("LIKE")));
    }

    #[test]
    fn blank_text_is_dropped() {
        let filter = SearchFilter {
            author: Some("   ".into()),
            ..Default::default()
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let filter = SearchFilter {
            resolution_min: Some(3.0),
            resolution_max: Some(1.0),
            ..Default::default()
        };
        assert_matches!(filter.to_query_params(), Err(CoreError::Validation(msg)) if msg.contains("resolution"));
    }

    #[test]
    fn out_of_range_year_is_rejected() {
        let filter = SearchFilter {
            deposition_year_from: Some(1850),
            ..Default::default()
        };
        assert!(filter.to_query_params().is_err());
    }
}
