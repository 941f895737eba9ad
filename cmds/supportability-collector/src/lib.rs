//! Support bundle collector for Rancher-managed Kubernetes clusters.
//!
//! Connects to the cluster hosting Rancher, snapshots a fixed catalog of
//! Kubernetes workloads and Rancher management resources into a staged
//! directory tree, packages the tree into a single `.tar.gz` bundle and
//! hands it to a [`shipper::Shipper`] for off-box storage.

pub mod archive;
pub mod collect;
pub mod config;
pub mod health;
pub mod k8s;
pub mod shipper;
pub mod staging;
