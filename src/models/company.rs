use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One entry of the static companies list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub ticker: String,
    pub name: String,
}

/// Load the companies list from a JSON file.
///
/// A missing file is NotFound (the endpoint surfaces it as 404); a file that
/// exists but fails to parse is an internal error.
pub fn load_companies<P: AsRef<Path>>(path: P) -> Result<Vec<Company>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AppError::NotFound("companies.json not found".to_string()));
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Internal(format!("Invalid companies file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_companies_list() {
        let content = r#"[
            {"ticker": "RELIANCE.NS", "name": "Reliance Industries"},
            {"ticker": "TCS.NS", "name": "Tata Consultancy Services"}
        ]"#;
        let companies: Vec<Company> = serde_json::from_str(content).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].ticker, "RELIANCE.NS");
        assert_eq!(companies[1].name, "Tata Consultancy Services");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_companies("/nonexistent/companies.json").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
