pub mod dashboard;
pub mod glucose;
pub mod treatment;

pub use dashboard::{DashboardSnapshot, DataSource};
pub use glucose::{CurrentGlucose, GlucoseRange, GlucoseReading, Trend, DIRECTION_NONE};
pub use treatment::TreatmentEvent;
