pub mod classify;

pub use classify::{classify, classify_payload, link_keys, Shape, UnknownReason};
