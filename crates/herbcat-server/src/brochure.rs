//! Brochure lifecycle: PDF rendering and the file-naming / cleanup
//! rules shared by the generate, delete, and download handlers.
//!
//! A product is either without a brochure (both metadata fields NULL)
//! or has exactly one live file under `<media_root>/brochures/`.
//! Regeneration removes the previously referenced file so repeated
//! generations never accumulate orphans.

use std::path::PathBuf;

use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use thiserror::Error;

use herbcat_core::AppConfig;
use herbcat_db::ProductRecord;

// printpdf's Mm and font sizes are f32.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 20.0;
const MARGIN_TOP_MM: f32 = 277.0;
const MARGIN_BOTTOM_MM: f32 = 20.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_LEFT_MM;

#[derive(Debug, Error)]
pub enum BrochureError {
    #[error("failed to render brochure: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn brochures_dir(config: &AppConfig) -> PathBuf {
    config.media_root.join("brochures")
}

pub fn uploads_dir(config: &AppConfig) -> PathBuf {
    config.media_root.join("uploads")
}

/// Timestamped brochure filename: regeneration always produces a new
/// name, so a stale client URL can never read the new content by
/// accident.
pub fn brochure_filename(slug: &str) -> String {
    format!("{slug}-{}.pdf", Utc::now().timestamp_millis())
}

/// Absolute URL under which a stored media file is served.
pub fn public_media_url(config: &AppConfig, subdir: &str, filename: &str) -> String {
    format!("{}/files/{subdir}/{filename}", config.public_base_url)
}

/// Resolve the stored filename from a brochure URL.
///
/// Only plain filenames are accepted; anything that could traverse out
/// of the brochures directory yields `None`.
pub fn filename_from_url(url: &str) -> Option<String> {
    let name = url.rsplit('/').next()?;
    if name.is_empty()
        || name.starts_with('.')
        || !name.ends_with(".pdf")
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return None;
    }
    Some(name.to_string())
}

/// Remove the brochure file referenced by `url`, logging instead of
/// failing: callers invoke this after the authoritative state change
/// already happened.
pub async fn remove_file_best_effort(config: &AppConfig, url: &str) {
    let Some(filename) = filename_from_url(url) else {
        tracing::warn!(url, "brochure URL does not resolve to a file; skipping cleanup");
        return;
    };
    let path = brochures_dir(config).join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(%filename, "removed stale brochure file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(%filename, "stale brochure file already gone");
        }
        Err(e) => tracing::warn!(%filename, error = %e, "failed to remove stale brochure file"),
    }
}

/// Render an informational brochure PDF for a product.
///
/// # Errors
///
/// Returns [`BrochureError::Render`] if the PDF writer fails.
pub fn render_brochure(record: &ProductRecord) -> Result<Vec<u8>, BrochureError> {
    let product = &record.product;

    let (doc, page, layer) = PdfDocument::new(
        &product.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| BrochureError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| BrochureError::Render(e.to_string()))?;

    let mut writer = PageWriter {
        doc: &doc,
        regular: &regular,
        bold: &bold,
        layer: doc.get_page(page).get_layer(layer),
        y: MARGIN_TOP_MM,
    };

    writer.line(&product.title, 18.0, true);
    writer.line(&format!("by {}", product.brand_or_formulator), 11.0, false);
    writer.line(&format!("Category: {}", record.category_name), 10.0, false);
    writer.gap(4.0);

    if product.is_free {
        writer.line("Price: free", 12.0, true);
    } else if product.original_price > product.price {
        writer.line(
            &format!("Price: {} (MRP {})", product.price, product.original_price),
            12.0,
            true,
        );
    } else {
        writer.line(&format!("Price: {}", product.price), 12.0, true);
    }
    writer.line(
        &format!(
            "Form: {}  |  Net quantity: {}  |  Shelf life: {}",
            product.form, product.net_quantity, product.shelf_life
        ),
        10.0,
        false,
    );
    writer.gap(6.0);

    writer.line("About this product", 13.0, true);
    writer.line(&product.description, 10.0, false);
    writer.gap(6.0);

    if !product.ingredients.is_empty() {
        writer.line("Ingredients", 13.0, true);
        for ingredient in &product.ingredients {
            writer.line(&format!("- {ingredient}"), 10.0, false);
        }
        writer.gap(6.0);
    }

    writer.line("Usage guide", 13.0, true);
    for step in &product.usage_guide.0 {
        writer.line(&format!("{}. {}", step.order, step.title), 11.0, true);
        if !step.description.is_empty() {
            writer.line(&step.description, 10.0, false);
        }
        for instruction in &step.steps {
            writer.line(&format!("   - {instruction}"), 10.0, false);
        }
    }

    if !product.precautions.is_empty() {
        writer.gap(6.0);
        writer.line("Precautions", 13.0, true);
        for precaution in &product.precautions {
            writer.line(&format!("- {precaution}"), 10.0, false);
        }
    }

    writer.gap(8.0);
    writer.line(
        &format!("Generated on {}", Utc::now().format("%Y-%m-%d")),
        8.0,
        false,
    );

    doc.save_to_bytes()
        .map_err(|e| BrochureError::Render(e.to_string()))
}

/// Cursor over the current page; starts a fresh page when a line would
/// cross the bottom margin.
struct PageWriter<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
}

impl PageWriter<'_> {
    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let font = if bold { self.bold } else { self.regular };
        for wrapped in wrap_text(text, max_chars_for(size)) {
            let line_height = size * 0.46 + 1.2;
            if self.y - line_height < MARGIN_BOTTOM_MM {
                let (page, layer) = self.doc.add_page(
                    Mm(PAGE_WIDTH_MM),
                    Mm(PAGE_HEIGHT_MM),
                    "content",
                );
                self.layer = self.doc.get_page(page).get_layer(layer);
                self.y = MARGIN_TOP_MM;
            }
            self.layer
                .use_text(wrapped, size, Mm(MARGIN_LEFT_MM), Mm(self.y), font);
            self.y -= line_height;
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

/// Approximate character budget for a line of Helvetica at `size` pt
/// across the content width. Average glyph width is taken as half an em.
fn max_chars_for(size: f32) -> usize {
    let char_width_mm = size * 0.352_778 * 0.5;
    let budget = CONTENT_WIDTH_MM / char_width_mm;
    budget as usize
}

/// Greedy word wrap. Words longer than the budget get a line of their own.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_url_takes_last_segment() {
        assert_eq!(
            filename_from_url("http://localhost:3000/files/brochures/tulsi-drops-1700000000000.pdf"),
            Some("tulsi-drops-1700000000000.pdf".to_string())
        );
    }

    #[test]
    fn filename_from_url_rejects_traversal_and_non_pdf() {
        assert_eq!(filename_from_url("http://x/files/brochures/"), None);
        assert_eq!(filename_from_url("http://x/files/brochures/..%2fetc"), None);
        assert_eq!(filename_from_url("http://x/files/brochures/.hidden.pdf"), None);
        assert_eq!(filename_from_url("http://x/files/brochures/logo.png"), None);
    }

    #[test]
    fn brochure_filename_is_slug_prefixed_pdf() {
        let name = brochure_filename("ashwagandha-tablets");
        assert!(name.starts_with("ashwagandha-tablets-"));
        assert!(name.ends_with(".pdf"));
        assert!(filename_from_url(&format!("http://x/files/brochures/{name}")).is_some());
    }

    #[test]
    fn wrap_text_respects_budget() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn wrap_text_handles_blank_input() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn max_chars_scales_down_with_size() {
        assert!(max_chars_for(18.0) < max_chars_for(10.0));
        assert!(max_chars_for(10.0) > 40);
    }
}
