pub mod cohort;
pub mod course;
pub mod prediction;
pub mod table;

pub use cohort::*;
pub use course::{course_label, course_name, UNKNOWN_COURSE};
pub use prediction::*;
pub use table::{DataTable, FeatureRecord, Value};
