pub mod recipients;
pub mod sender;
pub mod template;

pub use recipients::{load_recipients, parse_recipients, Recipient};
pub use sender::{
    BulkReport, EmailSender, MailTransport, SendOutcome, SmtpMailTransport, SmtpSettings,
};
pub use template::render;
