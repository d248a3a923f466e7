pub mod services;

pub use services::{EmailDispatch, EmailMessage, ReportMailer, SmtpMailer};
