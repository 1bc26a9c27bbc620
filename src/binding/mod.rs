//! Collaborator contracts binding proxies to transport machinery.
//!
//! The proxy core performs no I/O itself. Everything below the invocation
//! front-end is expressed as a contract:
//!
//! - [`RequestHandler`]: submits prepared requests over a connection.
//! - [`RequestHandlerFactory`]: produces handlers for a reference; installed
//!   once per runtime.
//! - [`Connection`]: opaque handle to an established connection.
//! - [`BatchRequestQueue`]: ordered holding pen for batch-mode requests.
//! - [`LocatorInfo`] / [`RouterInfo`]: canonical handles to resolution
//!   collaborators, compared by address in reference equality. The locator
//!   handle owns the resolution cache consulted against the reference's
//!   locator cache timeout.

mod batch;
mod connection;
mod handler;
mod locator;
mod router;

pub use self::batch::BatchRequestQueue;
pub use self::connection::Connection;
pub use self::handler::Completion;
pub use self::handler::Failure;
pub use self::handler::Reply;
pub use self::handler::RequestHandler;
pub use self::handler::RequestHandlerFactory;
pub use self::locator::LocatorInfo;
pub use self::router::RouterInfo;

pub use crate::invoke::OutgoingRequest;
