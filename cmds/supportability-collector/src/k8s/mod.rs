//! Kubernetes and Rancher management API access.

pub mod client;
pub mod mgmt;

pub use client::{Connection, ConnectionError};
pub use mgmt::{MgmtClient, MgmtError};
