//! Domain core for the essay markup and correction workflow.
//!
//! Pure logic only: shared ID/timestamp types, lookup-table enums,
//! coordinate transforms, competency palette, annotation validation, and
//! the correction state machine. No I/O, no persistence, no HTTP.

pub mod annotation;
pub mod competency;
pub mod correction;
pub mod error;
pub mod geometry;
pub mod status;
pub mod types;
