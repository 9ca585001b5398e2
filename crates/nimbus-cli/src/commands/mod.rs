//! Command implementations, one module per control-plane operation.
//!
//! Every command follows the same shape: bail out to the usage
//! collaborator on an empty argument list, parse flags against its
//! descriptor, validate the required combination, make exactly one
//! client call, and translate the outcome into an execution result.

pub mod deploy_application;
pub mod list_applications;
pub mod remove_cartridge_group;
pub mod undeploy_application;

#[cfg(test)]
pub(crate) mod testutil;
