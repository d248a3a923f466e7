pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    ReportFrequency, ReportHistoryEntry, ReportSetting, ReportStatus, ReportSummary,
    SpendingAggregates,
};
pub use repositories::{
    MySqlReportHistoryRepository, MySqlReportSettingRepository, ReportHistoryRepository,
    ReportSettingRepository,
};
pub use services::{AdHocReport, ReportAggregator, ReportJobRunner, ReportService};
