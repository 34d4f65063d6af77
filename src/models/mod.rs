// Inbound webhook payload models

pub mod tekmetric;

pub use tekmetric::{classify, NeedsPartsEvent, UNKNOWN_ORDER};
