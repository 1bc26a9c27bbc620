use parking_lot::Mutex;
use std::sync::Arc;

use crate::binding::Completion;
use crate::binding::RequestHandler;
use crate::consts::CAP_BATCH_QUEUE;
use crate::error::Error;
use crate::invoke::OutgoingRequest;

/// Queue collecting batch-mode requests until a flush.
///
/// Requests enqueue in submission order and drain in the same order. The
/// queue is created lazily by the owning reference on the first batch
/// invocation and cached on the proxy.
#[derive(Debug, Default)]
pub struct BatchRequestQueue {
  requests: Mutex<Vec<OutgoingRequest>>,
}

impl BatchRequestQueue {
  /// Creates an empty queue.
  pub fn new() -> Self {
    Self {
      requests: Mutex::new(Vec::with_capacity(CAP_BATCH_QUEUE)),
    }
  }

  /// Appends a request to the queue.
  pub fn enqueue(&self, request: OutgoingRequest) {
    self.requests.lock().push(request);
  }

  /// Returns the number of queued requests.
  pub fn len(&self) -> usize {
    self.requests.lock().len()
  }

  /// Returns `true` if no requests are queued.
  pub fn is_empty(&self) -> bool {
    self.requests.lock().is_empty()
  }

  /// Removes and returns all queued requests in submission order.
  pub fn drain(&self) -> Vec<OutgoingRequest> {
    std::mem::take(&mut *self.requests.lock())
  }

  /// Drains the queue and submits every request through `handler`.
  ///
  /// Flushing is not retried: a failure mid-flush leaves the already
  /// submitted requests on the wire, so repeating the flush could violate
  /// at-most-once for them. The failure propagates unchanged and the
  /// remaining requests are dropped with it.
  ///
  /// # Errors
  ///
  /// Returns the first submission failure.
  pub async fn flush(&self, handler: &Arc<dyn RequestHandler>) -> Result<(), Error> {
    for request in self.drain() {
      let _completion: Completion = handler
        .submit(request)
        .await
        .map_err(|failure| failure.exception)?;
    }

    Ok(())
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
