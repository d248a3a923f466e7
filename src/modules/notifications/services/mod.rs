pub mod email_dispatch;
pub mod report_mailer;

pub use email_dispatch::{EmailDispatch, EmailMessage, SmtpMailer};
pub use report_mailer::ReportMailer;
