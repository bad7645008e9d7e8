//! Seedable category taxonomy, loaded from a YAML file by the CLI.
//!
//! Categories are a read-only collaborator for the catalog itself;
//! this module only covers the seed path.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::product::slugify;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryConfig {
    /// The slug to persist: the configured one, or derived from the name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| slugify(&self.name), ToString::to_string)
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategoryConfig>,
}

/// Load and validate the category taxonomy from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoryFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CategoriesFile = serde_yaml::from_str(&content)?;

    validate_categories(&file)?;

    Ok(file)
}

fn validate_categories(file: &CategoriesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for category in &file.categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }

        let lower_name = category.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name: '{}'",
                category.name
            )));
        }

        let slug = category.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' produces an empty slug",
                category.name
            )));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug: '{slug}' (from category '{}')",
                category.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> CategoryConfig {
        CategoryConfig {
            name: name.to_string(),
            slug: None,
            description: None,
        }
    }

    #[test]
    fn slug_derived_from_name_when_absent() {
        assert_eq!(category("Stress & Sleep").slug(), "stress-sleep");
    }

    #[test]
    fn explicit_slug_wins() {
        let mut c = category("Stress & Sleep");
        c.slug = Some("calm".to_string());
        assert_eq!(c.slug(), "calm");
    }

    #[test]
    fn validate_rejects_empty_name() {
        let file = CategoriesFile {
            categories: vec![category("  ")],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_name_case_insensitive() {
        let file = CategoriesFile {
            categories: vec![category("Immunity"), category("immunity")],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate category name"));
    }

    #[test]
    fn validate_rejects_colliding_slugs() {
        let mut a = category("Skin Care");
        a.slug = Some("care".to_string());
        let mut b = category("Hair Care");
        b.slug = Some("care".to_string());

        let file = CategoriesFile {
            categories: vec![a, b],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate category slug"));
    }

    #[test]
    fn validate_accepts_distinct_categories() {
        let file = CategoriesFile {
            categories: vec![category("Immunity"), category("Digestive Health")],
        };
        assert!(validate_categories(&file).is_ok());
    }
}
