//! The canonical product model shared by the normalizer, store, and API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dosage form of a remedy.
///
/// The legacy `Beginner`/`Intermediate`/`Advanced` variants survive from
/// the pre-catalog schema; existing records still carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Form {
    Tablet,
    Syrup,
    Oil,
    Powder,
    Capsule,
    RawHerb,
    Beginner,
    Intermediate,
    Advanced,
}

impl Form {
    /// Parse a submitted form value, falling back to [`Form::Tablet`]
    /// for unknown or missing input.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("Tablet") => Form::Tablet,
            Some("Syrup") => Form::Syrup,
            Some("Oil") => Form::Oil,
            Some("Powder") => Form::Powder,
            Some("Capsule") => Form::Capsule,
            Some("RawHerb") => Form::RawHerb,
            Some("Beginner") => Form::Beginner,
            Some("Intermediate") => Form::Intermediate,
            Some("Advanced") => Form::Advanced,
            _ => Form::Tablet,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Form::Tablet => "Tablet",
            Form::Syrup => "Syrup",
            Form::Oil => "Oil",
            Form::Powder => "Powder",
            Form::Capsule => "Capsule",
            Form::RawHerb => "RawHerb",
            Form::Beginner => "Beginner",
            Form::Intermediate => "Intermediate",
            Form::Advanced => "Advanced",
        }
    }
}

/// One step of a product's usage guide (dosage instructions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStep {
    pub order: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_label: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Canonical product record produced by the normalizer.
///
/// Store-managed fields (id, stats, brochure metadata, timestamps) are
/// deliberately absent: this is exactly the set of fields an admin
/// write replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProduct {
    pub title: String,
    /// Derived from `title`; re-derived on every write so a title
    /// change can never leave a stale slug behind.
    pub slug: String,
    pub short_description: Option<String>,
    pub description: String,
    pub category_id: i64,
    pub brand_or_formulator: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub is_free: bool,
    pub net_quantity: Decimal,
    pub shelf_life: String,
    pub form: Form,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub preview_video: Option<String>,
    /// Never empty; the normalizer synthesizes a default step.
    pub usage_guide: Vec<UsageStep>,
    pub ingredients: Vec<String>,
    pub health_benefits: Vec<String>,
    pub precautions: Vec<String>,
    pub target_audience: Vec<String>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub faqs: Vec<Faq>,
    pub is_published: bool,
    pub show_on_home: bool,
    pub is_featured: bool,
    pub prescription_required: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Derive a URL slug from a title: lowercase, runs of non-alphanumeric
/// characters collapse to a single hyphen, leading/trailing hyphens
/// trimmed. Idempotent: `slugify(slugify(t)) == slugify(t)`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_simple_title() {
        assert_eq!(slugify("Ashwagandha Tablets"), "ashwagandha-tablets");
    }

    #[test]
    fn slugify_collapses_symbol_runs() {
        assert_eq!(slugify("Brahmi  --  & Ghee!"), "brahmi-ghee");
    }

    #[test]
    fn slugify_trims_edge_hyphens() {
        assert_eq!(slugify("  ~Tulsi Drops~  "), "tulsi-drops");
    }

    #[test]
    fn slugify_is_idempotent() {
        let once = slugify("Neem & Turmeric (500mg)");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn slugify_strips_non_ascii() {
        assert_eq!(slugify("Chyawanprash™ Crème"), "chyawanprash-cr-me");
    }

    #[test]
    fn form_parse_falls_back_to_tablet() {
        assert_eq!(Form::parse_or_default(Some("Elixir")), Form::Tablet);
        assert_eq!(Form::parse_or_default(None), Form::Tablet);
        assert_eq!(Form::parse_or_default(Some("Syrup")), Form::Syrup);
        assert_eq!(Form::parse_or_default(Some(" Oil ")), Form::Oil);
    }

    #[test]
    fn form_legacy_levels_still_parse() {
        assert_eq!(Form::parse_or_default(Some("Beginner")), Form::Beginner);
        assert_eq!(Form::parse_or_default(Some("Advanced")), Form::Advanced);
    }
}
