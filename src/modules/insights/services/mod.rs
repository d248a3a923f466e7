pub mod gemini_client;
pub mod insight_generator;
pub mod receipt_scanner;

pub use gemini_client::{GeminiClient, GeminiPart, DEFAULT_GEMINI_BASE_URL};
pub use insight_generator::{GeminiInsightGenerator, InsightGenerator, NoopInsightGenerator};
pub use receipt_scanner::{GeminiReceiptScanner, ReceiptScanner, UnavailableReceiptScanner};
