//! Input Normalizer: converts a raw admin-submitted payload into the
//! canonical [`NormalizedProduct`] or a complete set of validation
//! errors.
//!
//! Admin payloads are heterogeneous: list fields arrive as JSON arrays
//! or newline-delimited strings, numbers arrive as numbers or strings,
//! and most fields may simply be absent. Coercion is tolerant; the
//! required-field checks at the end are not, and every violation is
//! collected so the caller can fix the whole payload in one round trip.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::product::{slugify, Faq, Form, NormalizedProduct, UsageStep};

const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 150;
const SHORT_DESCRIPTION_MAX_CHARS: usize = 300;

/// Placeholder injected when a create payload carries no ingredient list.
const DEFAULT_INGREDIENT: &str = "See product label for the full ingredient list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    Create,
    Update,
}

/// Field-level validation failures, collected in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ValidationErrors {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

/// Raw create/update payload as submitted by the admin UI.
///
/// Coercible fields are kept as [`serde_json::Value`] so the normalizer
/// can accept the array-or-string, number-or-string shapes the UI sends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProductPayload {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category: Option<Value>,
    pub brand_or_formulator: Option<String>,
    pub price: Option<Value>,
    pub original_price: Option<Value>,
    pub is_free: Option<bool>,
    pub net_quantity: Option<Value>,
    pub shelf_life: Option<String>,
    pub form: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub preview_video: Option<String>,
    pub usage_guide: Option<Vec<RawUsageStep>>,
    pub ingredients: Option<Value>,
    pub health_benefits: Option<Value>,
    pub precautions: Option<Value>,
    pub target_audience: Option<Value>,
    pub tags: Option<Value>,
    pub keywords: Option<Value>,
    pub faqs: Option<Vec<RawFaq>>,
    pub is_published: Option<bool>,
    pub show_on_home: Option<bool>,
    pub is_featured: Option<bool>,
    pub prescription_required: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUsageStep {
    pub order: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_label: Option<String>,
    pub steps: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFaq {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// Normalize a raw payload into a canonical product record.
///
/// Pure transformation: slug derivation, pricing reconciliation, list
/// coercion, and usage-guide synthesis all happen here; uniqueness and
/// reference existence are enforced by the store at write time.
///
/// # Errors
///
/// Returns the complete [`ValidationErrors`] set when any required
/// field is missing or malformed. Never fails on the first violation.
pub fn normalize(
    raw: &RawProductPayload,
    mode: NormalizeMode,
) -> Result<NormalizedProduct, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = trimmed(&raw.title);
    match title.as_deref() {
        None => errors.push("title", "title is required"),
        Some(t) if t.chars().count() < TITLE_MIN_CHARS || t.chars().count() > TITLE_MAX_CHARS => {
            errors.push(
                "title",
                format!("title must be {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS} characters"),
            );
        }
        Some(_) => {}
    }

    let description = trimmed(&raw.description);
    if description.is_none() {
        errors.push("description", "description is required");
    }

    let short_description = trimmed(&raw.short_description);
    if let Some(ref s) = short_description {
        if s.chars().count() > SHORT_DESCRIPTION_MAX_CHARS {
            errors.push(
                "shortDescription",
                format!("short description must be at most {SHORT_DESCRIPTION_MAX_CHARS} characters"),
            );
        }
    }

    let category_id = match coerce_id(raw.category.as_ref()) {
        Some(id) if id > 0 => Some(id),
        Some(_) => {
            errors.push("category", "category must be a valid category id");
            None
        }
        None => {
            if raw.category.is_none() {
                errors.push("category", "category is required");
            } else {
                errors.push("category", "category must be a valid category id");
            }
            None
        }
    };

    let brand_or_formulator = trimmed(&raw.brand_or_formulator);
    if brand_or_formulator.is_none() {
        errors.push("brandOrFormulator", "brand or formulator is required");
    }

    let shelf_life = trimmed(&raw.shelf_life);
    if shelf_life.is_none() {
        errors.push("shelfLife", "shelf life is required");
    }

    let is_free = raw.is_free.unwrap_or(false);
    let (price, original_price) = reconcile_pricing(
        raw.price.as_ref(),
        raw.original_price.as_ref(),
        is_free,
        &mut errors,
    );

    let net_quantity = coerce_decimal(raw.net_quantity.as_ref())
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let form = Form::parse_or_default(raw.form.as_deref());

    let mut ingredients = coerce_string_list(raw.ingredients.as_ref());
    if ingredients.is_empty() && mode == NormalizeMode::Create {
        ingredients.push(DEFAULT_INGREDIENT.to_string());
    }

    let usage_guide = normalize_usage_guide(raw.usage_guide.as_deref());

    let faqs = raw
        .faqs
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|f| {
            let question = trimmed(&f.question)?;
            let answer = trimmed(&f.answer)?;
            Some(Faq { question, answer })
        })
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }

    // All required fields checked above; unwraps below cannot fire.
    let title = title.unwrap_or_default();
    let slug = slugify(&title);

    Ok(NormalizedProduct {
        slug,
        title,
        short_description,
        description: description.unwrap_or_default(),
        category_id: category_id.unwrap_or_default(),
        brand_or_formulator: brand_or_formulator.unwrap_or_default(),
        price,
        original_price,
        is_free,
        net_quantity,
        shelf_life: shelf_life.unwrap_or_default(),
        form,
        image: trimmed(&raw.image),
        thumbnail: trimmed(&raw.thumbnail),
        preview_video: trimmed(&raw.preview_video),
        usage_guide,
        ingredients,
        health_benefits: coerce_string_list(raw.health_benefits.as_ref()),
        precautions: coerce_string_list(raw.precautions.as_ref()),
        target_audience: coerce_string_list(raw.target_audience.as_ref()),
        tags: coerce_string_list(raw.tags.as_ref()),
        keywords: coerce_string_list(raw.keywords.as_ref()),
        faqs,
        is_published: raw.is_published.unwrap_or(false),
        show_on_home: raw.show_on_home.unwrap_or(false),
        is_featured: raw.is_featured.unwrap_or(false),
        prescription_required: raw.prescription_required.unwrap_or(false),
        meta_title: trimmed(&raw.meta_title),
        meta_description: trimmed(&raw.meta_description),
    })
}

/// Parse and reconcile `price`/`originalPrice` with the `isFree` flag.
///
/// `isFree` forces both to zero regardless of input. Otherwise a
/// missing or lower-than-price original price snaps up to `price`.
fn reconcile_pricing(
    price: Option<&Value>,
    original_price: Option<&Value>,
    is_free: bool,
    errors: &mut ValidationErrors,
) -> (Decimal, Decimal) {
    if is_free {
        return (Decimal::ZERO, Decimal::ZERO);
    }

    let price = match coerce_decimal(price) {
        Some(p) if p >= Decimal::ZERO => p,
        Some(_) => {
            errors.push("price", "price must be a non-negative number");
            Decimal::ZERO
        }
        None => {
            errors.push("price", "price must be a non-negative number");
            Decimal::ZERO
        }
    };

    let original_price = match coerce_decimal(original_price) {
        Some(op) if op >= price => op,
        _ => price,
    };

    (price, original_price)
}

/// Normalize the usage-guide steps, synthesizing one default step when
/// the submitted collection is absent or empty.
fn normalize_usage_guide(raw: Option<&[RawUsageStep]>) -> Vec<UsageStep> {
    let steps: Vec<UsageStep> = raw
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let fallback_order = i32::try_from(index + 1).unwrap_or(i32::MAX);
            UsageStep {
                order: step.order.filter(|o| *o >= 1).unwrap_or(fallback_order),
                title: trimmed(&step.title).unwrap_or_else(|| format!("Step {}", index + 1)),
                description: trimmed(&step.description).unwrap_or_default(),
                duration_label: trimmed(&step.duration_label).unwrap_or_default(),
                steps: coerce_string_list(step.steps.as_ref()),
            }
        })
        .collect();

    if steps.is_empty() {
        vec![default_usage_step()]
    } else {
        steps
    }
}

fn default_usage_step() -> UsageStep {
    UsageStep {
        order: 1,
        title: "How to use".to_string(),
        description: "Follow the recommended dosage printed on the pack.".to_string(),
        duration_label: String::new(),
        steps: vec!["Take as directed by your practitioner.".to_string()],
    }
}

/// Coerce a list field: JSON array → trimmed non-blank entries;
/// string → newline-split, trimmed, blanks dropped; anything else → empty.
fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Coerce a numeric field that may arrive as a JSON number or a
/// numeric string. Blank strings and non-numeric values yield `None`.
fn coerce_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value {
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Decimal::from_str(s).ok()
            }
        }
        _ => None,
    }
}

/// Coerce a reference id that may arrive as a JSON number or string.
fn coerce_id(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Trim an optional string field, mapping blank results to `None`.
fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
