pub mod batch;
pub mod calendar;
pub mod error;
pub mod money;
pub mod pagination;
pub mod recurrence;
pub mod unit_of_work;

pub use batch::{CycleSummary, KeysetCursor, PageSource, ScheduledJob};
pub use calendar::DateWindow;
pub use error::{AppError, FaultKind, Result};
pub use pagination::{Page, PageRequest};
pub use recurrence::{RecurrenceCalculator, RecurringInterval};
pub use unit_of_work::UnitOfWork;
