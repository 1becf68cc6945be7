use serde::Deserialize;

use crate::error::{KichoError, Result};
use crate::models::{LineItem, TransactionFact};

/// Fields pulled out of one receipt image. Absent fields are unknown, never
/// zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub tax_amount: Option<i64>,
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ExtractedFields {
    /// Build the immutable transaction fact, or explain why the extraction
    /// is not bookable. A missing date falls back to `today`; a missing
    /// amount cannot.
    pub fn to_fact(&self, today: &str) -> Result<TransactionFact> {
        let amount = self
            .amount
            .ok_or_else(|| KichoError::ExternalService("extraction yielded no amount".to_string()))?;
        Ok(TransactionFact {
            date: self.date.clone().unwrap_or_else(|| today.to_string()),
            supplier: self.supplier.clone(),
            amount,
            tax_amount: self.tax_amount,
            line_items: self.items.clone(),
        })
    }
}

/// External OCR capability, one call per document.
pub trait OcrExtractor {
    fn extract(&self, bytes: &[u8], mime: &str) -> Result<ExtractedFields>;
}

/// Offline extractor for pre-extracted receipts: accepts the JSON shape an
/// OCR backend would produce. Image and PDF inputs need a real backend.
pub struct JsonReceiptExtractor;

impl OcrExtractor for JsonReceiptExtractor {
    fn extract(&self, bytes: &[u8], mime: &str) -> Result<ExtractedFields> {
        if mime != "application/json" {
            return Err(KichoError::ExternalService(format!(
                "no OCR backend configured for {mime}"
            )));
        }
        serde_json::from_slice(bytes)
            .map_err(|e| KichoError::ExternalService(format!("malformed receipt JSON: {e}")))
    }
}

pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
