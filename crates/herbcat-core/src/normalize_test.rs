use rust_decimal::Decimal;
use serde_json::json;

use super::*;

fn valid_payload() -> RawProductPayload {
    RawProductPayload {
        title: Some("Ashwagandha Tablets".to_string()),
        description: Some("Classic adaptogen in tablet form.".to_string()),
        category: Some(json!(3)),
        brand_or_formulator: Some("Vanaja Herbals".to_string()),
        shelf_life: Some("24 months".to_string()),
        price: Some(json!("150")),
        ..RawProductPayload::default()
    }
}

// -----------------------------------------------------------------------
// Pricing reconciliation
// -----------------------------------------------------------------------

#[test]
fn missing_original_price_defaults_to_price() {
    let mut raw = valid_payload();
    raw.original_price = Some(json!(""));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.price, Decimal::from(150));
    assert_eq!(product.original_price, Decimal::from(150));
    assert!(!product.is_free);
    assert_eq!(product.slug, "ashwagandha-tablets");
}

#[test]
fn original_price_below_price_snaps_up() {
    let mut raw = valid_payload();
    raw.price = Some(json!(200));
    raw.original_price = Some(json!(120));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.original_price, Decimal::from(200));
}

#[test]
fn original_price_above_price_is_kept() {
    let mut raw = valid_payload();
    raw.price = Some(json!("99.50"));
    raw.original_price = Some(json!("149.50"));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.price.to_string(), "99.50");
    assert_eq!(product.original_price.to_string(), "149.50");
}

#[test]
fn free_product_forces_zero_prices() {
    let mut raw = valid_payload();
    raw.title = Some("Free Sample Pack".to_string());
    raw.is_free = Some(true);
    raw.price = Some(json!(500));
    raw.original_price = Some(json!(800));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert!(product.is_free);
    assert_eq!(product.price, Decimal::ZERO);
    assert_eq!(product.original_price, Decimal::ZERO);
}

#[test]
fn free_price_invariant_holds_both_ways() {
    let paid = normalize(&valid_payload(), NormalizeMode::Create).unwrap();
    assert!(!paid.is_free && paid.price > Decimal::ZERO);

    let mut raw = valid_payload();
    raw.is_free = Some(true);
    let free = normalize(&raw, NormalizeMode::Create).unwrap();
    assert!(free.is_free && free.price == Decimal::ZERO && free.original_price == Decimal::ZERO);
}

#[test]
fn negative_price_is_a_validation_error() {
    let mut raw = valid_payload();
    raw.price = Some(json!(-10));

    let errors = normalize(&raw, NormalizeMode::Create).unwrap_err();
    assert!(errors.fields().contains(&"price"));
}

#[test]
fn missing_price_is_a_validation_error_unless_free() {
    let mut raw = valid_payload();
    raw.price = None;
    let errors = normalize(&raw, NormalizeMode::Create).unwrap_err();
    assert!(errors.fields().contains(&"price"));

    raw.is_free = Some(true);
    assert!(normalize(&raw, NormalizeMode::Create).is_ok());
}

// -----------------------------------------------------------------------
// Required fields
// -----------------------------------------------------------------------

#[test]
fn missing_category_is_collected_with_other_errors() {
    let raw = RawProductPayload {
        title: Some("Ab".to_string()), // too short as well
        ..RawProductPayload::default()
    };

    let errors = normalize(&raw, NormalizeMode::Create).unwrap_err();
    let fields = errors.fields();
    assert!(fields.contains(&"category"));
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"description"));
    assert!(fields.contains(&"brandOrFormulator"));
    assert!(fields.contains(&"shelfLife"));
    assert!(fields.contains(&"price"));
}

#[test]
fn non_numeric_category_is_rejected() {
    let mut raw = valid_payload();
    raw.category = Some(json!("digestive-health"));

    let errors = normalize(&raw, NormalizeMode::Create).unwrap_err();
    assert!(errors.fields().contains(&"category"));
}

#[test]
fn category_accepts_numeric_string() {
    let mut raw = valid_payload();
    raw.category = Some(json!("42"));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.category_id, 42);
}

#[test]
fn whitespace_only_required_fields_are_rejected() {
    let mut raw = valid_payload();
    raw.shelf_life = Some("   ".to_string());
    raw.brand_or_formulator = Some("\t".to_string());

    let errors = normalize(&raw, NormalizeMode::Create).unwrap_err();
    assert!(errors.fields().contains(&"shelfLife"));
    assert!(errors.fields().contains(&"brandOrFormulator"));
}

#[test]
fn overlong_short_description_is_rejected() {
    let mut raw = valid_payload();
    raw.short_description = Some("x".repeat(301));

    let errors = normalize(&raw, NormalizeMode::Create).unwrap_err();
    assert!(errors.fields().contains(&"shortDescription"));
}

// -----------------------------------------------------------------------
// List coercion
// -----------------------------------------------------------------------

#[test]
fn newline_string_lists_are_split_and_deblanked() {
    let mut raw = valid_payload();
    raw.health_benefits = Some(json!("Calms the mind\n\n  Supports sleep  \n"));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(
        product.health_benefits,
        vec!["Calms the mind".to_string(), "Supports sleep".to_string()]
    );
}

#[test]
fn array_lists_are_trimmed_and_deblanked() {
    let mut raw = valid_payload();
    raw.tags = Some(json!([" sleep ", "", "stress", "   "]));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.tags, vec!["sleep".to_string(), "stress".to_string()]);
}

#[test]
fn absent_lists_default_to_empty() {
    let product = normalize(&valid_payload(), NormalizeMode::Create).unwrap();
    assert!(product.precautions.is_empty());
    assert!(product.keywords.is_empty());
}

#[test]
fn absent_ingredients_get_placeholder_on_create_only() {
    let created = normalize(&valid_payload(), NormalizeMode::Create).unwrap();
    assert_eq!(created.ingredients.len(), 1);

    let updated = normalize(&valid_payload(), NormalizeMode::Update).unwrap();
    assert!(updated.ingredients.is_empty());
}

// -----------------------------------------------------------------------
// Usage guide
// -----------------------------------------------------------------------

#[test]
fn empty_usage_guide_synthesizes_default_step() {
    let product = normalize(&valid_payload(), NormalizeMode::Create).unwrap();
    assert_eq!(product.usage_guide.len(), 1);
    assert_eq!(product.usage_guide[0].order, 1);
    assert!(!product.usage_guide[0].title.is_empty());
    assert!(!product.usage_guide[0].steps.is_empty());
}

#[test]
fn usage_guide_is_never_empty_in_update_mode_either() {
    let mut raw = valid_payload();
    raw.usage_guide = Some(vec![]);
    let product = normalize(&raw, NormalizeMode::Update).unwrap();
    assert!(!product.usage_guide.is_empty());
}

#[test]
fn usage_steps_get_positional_order_and_titles() {
    let mut raw = valid_payload();
    raw.usage_guide = Some(vec![
        RawUsageStep {
            order: None,
            title: Some("Morning dose".to_string()),
            steps: Some(json!("One tablet\nWith warm water")),
            ..RawUsageStep::default()
        },
        RawUsageStep {
            order: Some(5),
            title: Some("  ".to_string()),
            ..RawUsageStep::default()
        },
    ]);

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.usage_guide[0].order, 1);
    assert_eq!(product.usage_guide[0].title, "Morning dose");
    assert_eq!(
        product.usage_guide[0].steps,
        vec!["One tablet".to_string(), "With warm water".to_string()]
    );
    assert_eq!(product.usage_guide[1].order, 5);
    assert_eq!(product.usage_guide[1].title, "Step 2");
}

#[test]
fn zero_or_negative_supplied_order_falls_back_to_position() {
    let mut raw = valid_payload();
    raw.usage_guide = Some(vec![RawUsageStep {
        order: Some(0),
        title: Some("Dose".to_string()),
        ..RawUsageStep::default()
    }]);

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.usage_guide[0].order, 1);
}

// -----------------------------------------------------------------------
// FAQs, form, misc
// -----------------------------------------------------------------------

#[test]
fn incomplete_faqs_are_dropped() {
    let mut raw = valid_payload();
    raw.faqs = Some(vec![
        RawFaq {
            question: Some("Is it vegan?".to_string()),
            answer: Some("Yes.".to_string()),
        },
        RawFaq {
            question: Some("Orphan question".to_string()),
            answer: None,
        },
        RawFaq {
            question: Some("   ".to_string()),
            answer: Some("Orphan answer".to_string()),
        },
    ]);

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.faqs.len(), 1);
    assert_eq!(product.faqs[0].question, "Is it vegan?");
}

#[test]
fn invalid_form_falls_back_to_tablet() {
    let mut raw = valid_payload();
    raw.form = Some("Tincture".to_string());

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.form, Form::Tablet);
}

#[test]
fn negative_net_quantity_clamps_to_zero() {
    let mut raw = valid_payload();
    raw.net_quantity = Some(json!(-4));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.net_quantity, Decimal::ZERO);
}

#[test]
fn net_quantity_accepts_numeric_string() {
    let mut raw = valid_payload();
    raw.net_quantity = Some(json!("12.5"));

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert_eq!(product.net_quantity.to_string(), "12.5");
}

#[test]
fn slug_tracks_title_changes() {
    let mut raw = valid_payload();
    raw.title = Some("Brahmi & Ghee Softgels".to_string());

    let product = normalize(&raw, NormalizeMode::Update).unwrap();
    assert_eq!(product.slug, "brahmi-ghee-softgels");
}

#[test]
fn blank_optional_strings_become_none() {
    let mut raw = valid_payload();
    raw.image = Some("  ".to_string());
    raw.meta_title = Some(String::new());

    let product = normalize(&raw, NormalizeMode::Create).unwrap();
    assert!(product.image.is_none());
    assert!(product.meta_title.is_none());
}
