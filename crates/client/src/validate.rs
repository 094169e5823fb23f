use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Only CSV files are allowed: {0}")]
    NotCsv(String),
}

/// Accepts names ending in `.csv`, the same check the upload endpoint applies.
pub fn validate_csv_name(name: &str) -> Result<(), ValidationError> {
    if name.ends_with(".csv") {
        Ok(())
    } else {
        Err(ValidationError::NotCsv(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_csv() {
        assert!(validate_csv_name("gst_jan.csv").is_ok());
        assert!(validate_csv_name("dir/ledger.v2.csv").is_ok());
    }

    #[test]
    fn rejects_other_extensions() {
        assert_eq!(
            validate_csv_name("ledger.xlsx"),
            Err(ValidationError::NotCsv("ledger.xlsx".to_string()))
        );
        assert!(validate_csv_name("csv").is_err());
        assert!(validate_csv_name("GST.CSV").is_err());
    }
}
