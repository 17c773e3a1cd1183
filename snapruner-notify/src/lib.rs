//! # snapruner-notify
//!
//! End-of-run notification delivery through the Apprise command-line
//! client. Delivery is best-effort by contract: the run outcome is decided
//! before the notifier runs, and nothing here may change it.

mod apprise;
pub mod error;

pub use apprise::AppriseNotifier;
pub use error::NotifyError;
