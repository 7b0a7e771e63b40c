//! Output generation for computed metrics.
//!
//! # Submodules
//!
//! - [`tables`]: Flat CSV files for outlet and county metrics
//! - [`json`]: Dated JSON snapshot of a whole run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── outlet_metrics.csv
//! └── county_metrics.csv
//!
//! json_output_dir/
//! └── 2025-05-06/
//!     └── metrics.json
//! ```

pub mod json;
pub mod tables;
