pub mod report_history_repository;
pub mod report_setting_repository;

pub use report_history_repository::{MySqlReportHistoryRepository, ReportHistoryRepository};
pub use report_setting_repository::{
    MySqlReportSettingRepository, MySqlReportUnitOfWork, ReportSettingRepository,
    ReportUnitOfWork,
};
