//! The invocation front-end.
//!
//! Every operation, built-in or generic, flows through one asynchronous
//! state machine ([`Outgoing`]): pre-flight validation, handler binding,
//! submission, failure classification, and the retry loop. The blocking
//! operation shapes are thin wrappers that run the same machine to
//! completion.
//!
//! Dropping the future of an asynchronous shape abandons the invocation:
//! a request that was never submitted is never sent, while the effect on a
//! request already on the wire is up to the transport, which surfaces a
//! best-effort cancel as
//! [`LocalException::InvocationCanceled`][crate::error::LocalException].

mod outgoing;
mod request;
mod retry;

pub use self::request::OutgoingRequest;

pub(crate) use self::outgoing::Outgoing;
pub(crate) use self::outgoing::handle_failure;
pub(crate) use self::retry::RetryPolicy;
