mod report_controller;

pub use report_controller::{configure, GenerateReportQuery, GenerateReportResponse};
