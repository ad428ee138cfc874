//! Grade extraction and aggregation.
//!
//! This module turns roster rows into numeric samples, groups them, and
//! computes per-group and overall summary statistics against the
//! passing/merit/distinction thresholds.

pub mod aggregate;
pub mod grade;
pub mod samples;
pub mod types;
pub mod utility;
