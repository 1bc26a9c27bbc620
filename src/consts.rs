//! Runtime configuration constants and default values.
//!
//! This module defines the wire names of the built-in operations, the
//! sentinel timeout values of the reference model, and the default tuning
//! parameters applied when a reference is created without explicit settings.

use std::time::Duration;

use crate::core::EncodingVersion;

// -----------------------------------------------------------------------------
// Built-in Operations
// -----------------------------------------------------------------------------

/// Wire name of the reachability probe operation.
pub const OP_PING: &str = "ice_ping";

/// Wire name of the type-membership test operation.
pub const OP_IS_A: &str = "ice_isA";

/// Wire name of the most-derived-type query operation.
pub const OP_ID: &str = "ice_id";

/// Wire name of the type-list query operation.
pub const OP_IDS: &str = "ice_ids";

/// Wire name reported by the generic invocation entry point.
pub const OP_INVOKE: &str = "ice_invoke";

/// Wire name of the batch flush operation.
pub const OP_FLUSH_BATCH_REQUESTS: &str = "ice_flushBatchRequests";

/// Wire name of the connection acquisition operation.
pub const OP_GET_CONNECTION: &str = "ice_getConnection";

/// Type id implemented by every remote object.
pub const OBJECT_TYPE_ID: &str = "::Ice::Object";

// -----------------------------------------------------------------------------
// Timeouts
// -----------------------------------------------------------------------------

/// Invocation timeout sentinel disabling the end-to-end bound.
pub const INVOCATION_TIMEOUT_INFINITE: i32 = -1;

/// Invocation timeout sentinel inheriting the bound connection's timeout.
pub const INVOCATION_TIMEOUT_CONNECTION: i32 = -2;

/// Connection timeout sentinel disabling transport-level bounds.
pub const CONNECTION_TIMEOUT_INFINITE: i32 = -1;

/// Locator cache timeout sentinel marking resolved entries as never stale.
pub const LOCATOR_CACHE_NEVER_EXPIRE: i32 = -1;

/// Transport-level timeout applied to endpoints parsed without `-t`.
pub const DEFAULT_ENDPOINT_TIMEOUT: i32 = 60_000;

// -----------------------------------------------------------------------------
// Reference Defaults
// -----------------------------------------------------------------------------

/// Encoding version applied to references created without `-e`.
pub const DEFAULT_ENCODING: EncodingVersion = EncodingVersion::V_1_1;

/// Default state of the connection-caching policy.
///
/// When `true` (default), the first request handler bound to a proxy is
/// reused for subsequent invocations on the same proxy.
pub const DEFAULT_CACHE_CONNECTION: bool = true;

/// Default state of the collocation-optimization policy.
pub const DEFAULT_COLLOCATION_OPTIMIZED: bool = true;

// -----------------------------------------------------------------------------
// Retry Behavior
// -----------------------------------------------------------------------------

/// Delays applied between invocation attempts.
///
/// One entry per permitted retry. The default grants a single immediate
/// retry, which is sufficient to transparently rebind after a graceful
/// server shutdown.
pub const DEFAULT_RETRY_INTERVALS: &[Duration] = &[Duration::ZERO];

// -----------------------------------------------------------------------------
// Memory Allocation
// -----------------------------------------------------------------------------

/// Initial capacity of a batch request queue.
pub const CAP_BATCH_QUEUE: usize = 8;

/// Initial capacity of the locator/router canonicalization tables.
pub const CAP_INFO_TABLE: usize = 4;
