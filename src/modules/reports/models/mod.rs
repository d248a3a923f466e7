pub mod report_history;
pub mod report_setting;
pub mod report_summary;

pub use report_history::{ReportHistoryEntry, ReportStatus};
pub use report_setting::{
    ReportFrequency, ReportSetting, ScheduleAdvance, UpdateReportSettingRequest,
};
pub use report_summary::{CategorySpend, ReportSummary, SpendingAggregates, TOP_CATEGORY_LIMIT};

pub(crate) use report_history::ReportHistoryRow;
pub(crate) use report_setting::ReportSettingRow;
