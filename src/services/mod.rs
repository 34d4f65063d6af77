// Outbound integrations

pub mod sms;

pub use sms::{build_notifier, SmsError, SmsNotifier, SmsReceipt};
