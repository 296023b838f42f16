#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

mod id;

pub mod journal_entry;
pub mod loan;
pub mod outbox;
pub mod owner;
pub mod primitives;
pub mod transfer;
