pub mod services;

pub use services::{
    GeminiClient, GeminiInsightGenerator, GeminiReceiptScanner, InsightGenerator,
    NoopInsightGenerator, ReceiptScanner, UnavailableReceiptScanner,
};
