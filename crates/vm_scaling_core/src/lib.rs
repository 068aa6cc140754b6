//! Vendor-neutral orchestration for the VM scaling exercises.
//!
//! This crate owns the provisioning order, readiness waits, the resource
//! ledger and reverse-order teardown. Cloud and load-generator access goes
//! through the traits in [`ports`]; AWS SDK concerns live in
//! `vm_scaling_aws`.

pub mod autoscale;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod horizontal;
pub mod ledger;
pub mod loadgen;
pub mod model;
pub mod naming;
pub mod ports;
pub mod provision;
pub mod teardown;
pub mod wait;

pub use error::{CloudError, ConfigError, LoadGeneratorError, ScalingError};
pub use ports::Services;
