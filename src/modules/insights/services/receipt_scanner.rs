use async_trait::async_trait;
use std::sync::Arc;

use super::gemini_client::{GeminiClient, GeminiPart};
use crate::core::{AppError, Result};
use crate::modules::transactions::models::ScannedReceipt;

/// Extracts transaction fields from a receipt image
#[async_trait]
pub trait ReceiptScanner: Send + Sync {
    async fn scan(&self, image: &[u8], mime_type: &str) -> Result<ScannedReceipt>;
}

/// Used when no extraction model is configured
pub struct UnavailableReceiptScanner;

#[async_trait]
impl ReceiptScanner for UnavailableReceiptScanner {
    async fn scan(&self, _image: &[u8], _mime_type: &str) -> Result<ScannedReceipt> {
        Err(AppError::transient("Receipt scanning is not configured"))
    }
}

const RECEIPT_PROMPT: &str = r#"Extract the transaction from this receipt image as one JSON object:
{
  "title": "string, merchant or short description",
  "amount": "number, positive total",
  "date": "string, YYYY-MM-DD",
  "description": "string, summary of items, at most 50 words",
  "category": "string",
  "paymentMethod": "one of CARD, BANK_TRANSFER, MOBILE_PAYMENT, AUTO_DEBIT, CASH, OTHER",
  "type": "EXPENSE"
}
Omit any field you are unsure of. If the image is not a receipt, return {}."#;

pub struct GeminiReceiptScanner {
    client: Arc<GeminiClient>,
}

impl GeminiReceiptScanner {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReceiptScanner for GeminiReceiptScanner {
    async fn scan(&self, image: &[u8], mime_type: &str) -> Result<ScannedReceipt> {
        let output = self
            .client
            .generate(vec![
                GeminiPart::text(RECEIPT_PROMPT),
                GeminiPart::inline(image, mime_type),
            ])
            .await?;

        ScannedReceipt::from_model_output(&output)
    }
}
