//! Mizar - client-side proxy core for a distributed object runtime

mod core;
mod invoke;
mod utils;

pub mod binding;
pub mod consts;
pub mod error;
pub mod proxy;
pub mod runtime;
pub mod wire;

pub mod types {
  //! Core types of the Mizar reference model.

  pub use crate::core::Context;
  pub use crate::core::EncodingVersion;
  pub use crate::core::Endpoint;
  pub use crate::core::EndpointSelection;
  pub use crate::core::Identity;
  pub use crate::core::InvocationMode;
  pub use crate::core::OperationMode;
  pub use crate::core::Reference;
  pub use crate::core::Transport;
}
