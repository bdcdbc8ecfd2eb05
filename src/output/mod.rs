// Output module
pub mod table;

pub use table::{DeliveryRow, MetricRow, OutputFormat};
