// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Testing utilities for DiskFlow
//!
//! Mock implementations of every capability trait the pipeline
//! consumes, plus small factories for entities and forecast records.
//! Used by the core crate's own test suites and available to any
//! downstream crate that needs a scriptable pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use diskflow_testing::{disks, violation_record, MockBehavior, MockEntitySource, MockForecastAnalyzer};
//!
//! let analyzer = MockForecastAnalyzer::completing_with(diskflow_testing::clean_record())
//!     .with_behavior("DISK-003", MockBehavior::Complete(violation_record(95.0, 3)))
//!     .with_behavior("DISK-007", MockBehavior::ErrorOnSubmit);
//! let source = MockEntitySource::with_disks(disks(25));
//! ```

mod analyzer;
mod checkpoint;
mod entities;
mod records;

pub use analyzer::{MockBehavior, MockForecastAnalyzer};
pub use checkpoint::FailingCheckpointStore;
pub use entities::{disk, disks, MockEntitySource};
pub use records::{clean_record, invalid_record, violation_record};
