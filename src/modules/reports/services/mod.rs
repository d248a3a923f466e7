pub mod report_aggregator;
pub mod report_job;
pub mod report_service;

pub use report_aggregator::ReportAggregator;
pub use report_job::{DueReportSchedules, RecordState, ReportJobRunner};
pub use report_service::{AdHocReport, ReportService, AD_HOC_REPORT_LABEL};
