pub mod notifications;
pub mod system;
pub mod thresholds;

pub use notifications::{EmailNotifier, LogNotifier, Notifier, NotifyError};
pub use system::{AlertSystem, DeliveryOutcome};
pub use thresholds::{AlertEvent, ThresholdEvaluator, Thresholds};
