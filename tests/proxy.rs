use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use mizar::binding::Completion;
use mizar::binding::Connection;
use mizar::binding::Failure;
use mizar::binding::OutgoingRequest;
use mizar::binding::Reply;
use mizar::binding::RequestHandler;
use mizar::binding::RequestHandlerFactory;
use mizar::error::Error;
use mizar::error::LocalException;
use mizar::error::UnknownUserException;
use mizar::error::UsageError;
use mizar::proxy::Proxy;
use mizar::proxy::identity_eq;
use mizar::runtime::Runtime;
use mizar::runtime::RuntimeConfig;
use mizar::types::Endpoint;
use mizar::types::OperationMode;
use mizar::types::Transport;
use mizar::wire;

// -----------------------------------------------------------------------------
// Mock Transport
// -----------------------------------------------------------------------------

/// Scripted request handler: pops one outcome per submission and falls back
/// to a successful empty reply (or plain send for non-two-way requests).
struct MockHandler {
  host: &'static str,
  script: Mutex<VecDeque<Result<Completion, Failure>>>,
  submissions: Mutex<Vec<String>>,
  delay: Option<Duration>,
}

impl MockHandler {
  fn new(host: &'static str) -> Arc<Self> {
    Arc::new(Self {
      host,
      script: Mutex::new(VecDeque::new()),
      submissions: Mutex::new(Vec::new()),
      delay: None,
    })
  }

  fn slow(host: &'static str, delay: Duration) -> Arc<Self> {
    Arc::new(Self {
      host,
      script: Mutex::new(VecDeque::new()),
      submissions: Mutex::new(Vec::new()),
      delay: Some(delay),
    })
  }

  fn push(&self, outcome: Result<Completion, Failure>) {
    self.script.lock().push_back(outcome);
  }

  fn submissions(&self) -> Vec<String> {
    self.submissions.lock().clone()
  }
}

#[async_trait]
impl RequestHandler for MockHandler {
  fn update(
    self: Arc<Self>,
    previous: &Arc<dyn RequestHandler>,
    replacement: &Arc<dyn RequestHandler>,
  ) -> Arc<dyn RequestHandler> {
    let this: Arc<dyn RequestHandler> = self;

    if Arc::ptr_eq(&this, previous) {
      Arc::clone(replacement)
    } else {
      this
    }
  }

  async fn submit(&self, request: OutgoingRequest) -> Result<Completion, Failure> {
    self.submissions.lock().push(request.operation().to_owned());

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    if let Some(outcome) = self.script.lock().pop_front() {
      return outcome;
    }

    if request.proxy_mode().is_twoway() {
      Ok(Completion::Replied(Reply::new(
        true,
        wire::empty_encaps(request.encoding()),
      )))
    } else {
      Ok(Completion::Sent)
    }
  }

  fn connection(&self) -> Result<Arc<Connection>, LocalException> {
    Ok(Arc::new(Connection::new(Endpoint::new(
      Transport::Tcp,
      self.host,
      4061,
    ))))
  }
}

/// Hands out prepared handlers in order, then keeps repeating the last one.
struct MockFactory {
  handlers: Mutex<VecDeque<Arc<MockHandler>>>,
  last: Mutex<Option<Arc<MockHandler>>>,
  bindings: Mutex<u32>,
}

impl MockFactory {
  fn new(handlers: Vec<Arc<MockHandler>>) -> Arc<Self> {
    Arc::new(Self {
      handlers: Mutex::new(handlers.into()),
      last: Mutex::new(None),
      bindings: Mutex::new(0),
    })
  }

  fn bindings(&self) -> u32 {
    *self.bindings.lock()
  }
}

impl RequestHandlerFactory for MockFactory {
  fn request_handler(
    &self,
    _reference: &mizar::types::Reference,
    _proxy: &Proxy,
  ) -> Result<Arc<dyn RequestHandler>, Error> {
    *self.bindings.lock() += 1;

    if let Some(handler) = self.handlers.lock().pop_front() {
      *self.last.lock() = Some(Arc::clone(&handler));
      return Ok(handler);
    }

    let handler: Arc<MockHandler> = self
      .last
      .lock()
      .clone()
      .expect("mock factory has no handler");

    Ok(handler)
  }
}

fn runtime_with(handlers: Vec<Arc<MockHandler>>) -> (Runtime, Arc<MockFactory>) {
  let runtime: Runtime = Runtime::new(RuntimeConfig::default());
  let factory: Arc<MockFactory> = MockFactory::new(handlers);

  assert!(runtime.install_handler_factory(factory.clone()));

  (runtime, factory)
}

fn proxy_on(runtime: &Runtime, input: &str) -> Proxy {
  runtime.proxy_from_string(input).unwrap()
}

// -----------------------------------------------------------------------------
// Derivation & Identity
// -----------------------------------------------------------------------------

#[test]
fn derivation_with_current_value_returns_same_handle() {
  let runtime: Runtime = Runtime::new(RuntimeConfig::default());
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  assert!(proxy.with_secure(proxy.is_secure()).ptr_eq(&proxy));
  assert!(proxy.with_mode(proxy.mode()).ptr_eq(&proxy));
  assert!(
    proxy
      .with_invocation_timeout(proxy.invocation_timeout())
      .unwrap()
      .ptr_eq(&proxy),
  );
}

#[test]
fn identity_equality_ignores_facets() {
  let runtime: Runtime = Runtime::new(RuntimeConfig::default());
  let plain: Proxy = proxy_on(&runtime, "acc : tcp -h node1 -p 4061");
  let admin: Proxy = plain.with_facet("admin");

  assert!(identity_eq(Some(&plain), Some(&admin)));
  assert_ne!(plain, admin);
}

#[test]
fn string_round_trip_preserves_equality() {
  let runtime: Runtime = Runtime::new(RuntimeConfig::default());
  let proxy: Proxy = proxy_on(
    &runtime,
    "billing/account -o -s -P -c pool7 -i 250 -k trace=1 : ssl -h node2 -p 4062 -t 2500",
  );

  assert_eq!(proxy_on(&runtime, &proxy.to_string()), proxy);
}

// -----------------------------------------------------------------------------
// Mode Preconditions
// -----------------------------------------------------------------------------

#[test]
fn twoway_only_enforcement_distinguishes_call_sites() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let oneway: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061").as_oneway();

  assert!(matches!(
    oneway.is_a("::Demo::Greeter", None),
    Err(Error::Usage(UsageError::TwowayOnly { .. })),
  ));

  // The ping still dispatches: sent, no reply expected.
  oneway.ping(None).unwrap();
  assert_eq!(handler.submissions(), ["ice_ping"]);
}

// -----------------------------------------------------------------------------
// Built-in Operations
// -----------------------------------------------------------------------------

#[tokio::test]
async fn is_a_demarshals_reply() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  handler.push(Ok(Completion::Replied(Reply::new(
    true,
    wire::encaps(proxy.encoding(), |out| out.write_bool(true)),
  ))));

  assert!(proxy.is_a_async(mizar::consts::OBJECT_TYPE_ID, None).await.unwrap());
  assert_eq!(handler.submissions(), ["ice_isA"]);
}

#[tokio::test]
async fn id_and_ids_demarshal_replies() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  handler.push(Ok(Completion::Replied(Reply::new(
    true,
    wire::encaps(proxy.encoding(), |out| out.write_string("::Demo::Greeter")),
  ))));
  handler.push(Ok(Completion::Replied(Reply::new(
    true,
    wire::encaps(proxy.encoding(), |out| {
      out.write_string_seq(&["::Demo::Greeter".to_owned(), "::Ice::Object".to_owned()]);
    }),
  ))));

  assert_eq!(proxy.id_async(None).await.unwrap(), "::Demo::Greeter");
  assert_eq!(
    proxy.ids_async(None).await.unwrap(),
    ["::Demo::Greeter", "::Ice::Object"],
  );
}

#[tokio::test]
async fn user_exception_on_builtin_is_wrapped_as_unknown() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  handler.push(Ok(Completion::Replied(Reply::new(
    false,
    wire::encaps(proxy.encoding(), |out| out.write_string("::Demo::Oops")),
  ))));

  let result: Result<bool, Error> = proxy.is_a_async("::Demo::Greeter", None).await;

  assert_eq!(
    result,
    Err(UnknownUserException::new("::Demo::Oops").into()),
  );
}

#[tokio::test]
async fn invoke_passes_user_exceptions_through() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  let exception: Bytes = wire::encaps(proxy.encoding(), |out| out.write_string("::Demo::Oops"));
  handler.push(Ok(Completion::Replied(Reply::new(false, exception.clone()))));

  let (ok, out_encaps): (bool, Bytes) = proxy
    .invoke_async("transfer", OperationMode::Normal, &[], None)
    .await
    .unwrap();

  assert!(!ok);
  assert_eq!(out_encaps, exception);
}

#[tokio::test]
async fn invoke_on_oneway_returns_empty_encaps() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let oneway: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061").as_oneway();

  let (ok, out_encaps): (bool, Bytes) = oneway
    .invoke_async("notify", OperationMode::Normal, &[], None)
    .await
    .unwrap();

  assert!(ok);
  assert!(out_encaps.is_empty());
}

#[tokio::test]
async fn checked_facet_verifies_remotely() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  handler.push(Ok(Completion::Replied(Reply::new(
    true,
    wire::encaps(proxy.encoding(), |out| out.write_bool(true)),
  ))));

  let admin: Proxy = proxy
    .checked_facet_async("admin", "::Demo::Admin", None)
    .await
    .unwrap()
    .expect("facet verified");

  assert_eq!(admin.facet(), "admin");

  handler.push(Ok(Completion::Replied(Reply::new(
    true,
    wire::encaps(proxy.encoding(), |out| out.write_bool(false)),
  ))));

  assert!(
    proxy
      .checked_facet_async("other", "::Demo::Admin", None)
      .await
      .unwrap()
      .is_none(),
  );
}

// -----------------------------------------------------------------------------
// Retry Classification
// -----------------------------------------------------------------------------

#[tokio::test]
async fn graceful_close_retries_mutating_invoke_once() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  handler.push(Err(Failure::new(LocalException::CloseConnection, true)));

  let (ok, _): (bool, Bytes) = proxy
    .invoke_async("transfer", OperationMode::Normal, &[], None)
    .await
    .unwrap();

  assert!(ok);
  assert_eq!(handler.submissions(), ["transfer", "transfer"]);
}

#[tokio::test]
async fn non_retryable_mutating_failure_propagates_after_one_submission() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  handler.push(Err(Failure::new(LocalException::ConnectTimeout, true)));

  let result: Result<(bool, Bytes), Error> = proxy
    .invoke_async("transfer", OperationMode::Normal, &[], None)
    .await;

  assert_eq!(result, Err(LocalException::ConnectTimeout.into()));
  assert_eq!(handler.submissions(), ["transfer"]);
  assert!(proxy.cached_connection().is_none(), "handler must be cleared");
}

#[tokio::test]
async fn idempotent_failure_rebinds_through_factory() {
  let first: Arc<MockHandler> = MockHandler::new("node1");
  let second: Arc<MockHandler> = MockHandler::new("node2");
  let (runtime, factory) = runtime_with(vec![Arc::clone(&first), Arc::clone(&second)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  first.push(Err(Failure::new(LocalException::ConnectionLost, true)));

  let (ok, _): (bool, Bytes) = proxy
    .invoke_async("balance", OperationMode::Idempotent, &[], None)
    .await
    .unwrap();

  assert!(ok);
  assert_eq!(first.submissions(), ["balance"]);
  assert_eq!(second.submissions(), ["balance"]);
  assert_eq!(factory.bindings(), 2);
}

#[tokio::test]
async fn destroyed_runtime_rejects_new_invocations() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![handler]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  runtime.destroy();

  assert_eq!(
    proxy.ping_async(None).await,
    Err(LocalException::RuntimeDestroyed.into()),
  );
}

// -----------------------------------------------------------------------------
// Timeouts
// -----------------------------------------------------------------------------

#[tokio::test]
async fn invocation_timeout_bounds_the_attempt() {
  let handler: Arc<MockHandler> = MockHandler::slow("node1", Duration::from_secs(30));
  let (runtime, _factory) = runtime_with(vec![handler]);
  let proxy: Proxy = proxy_on(&runtime, "account -i 50 : tcp -h node1 -p 4061");

  let result: Result<(), Error> = proxy.ping_async(None).await;

  assert_eq!(result, Err(LocalException::InvocationTimeout.into()));
}

// -----------------------------------------------------------------------------
// Handler Cache
// -----------------------------------------------------------------------------

#[test]
fn first_writer_wins_under_concurrent_invocations() {
  let handlers: Vec<Arc<MockHandler>> =
    vec![MockHandler::new("node1"), MockHandler::new("node2")];
  let (runtime, _factory) = runtime_with(handlers.clone());
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  let threads: Vec<JoinHandle<()>> = (0..2)
    .map(|_| {
      let proxy: Proxy = proxy.clone();

      thread::spawn(move || proxy.ping(None).unwrap())
    })
    .collect();

  for handle in threads {
    handle.join().unwrap();
  }

  let counts: Vec<usize> = handlers
    .iter()
    .map(|handler| handler.submissions().len())
    .collect();

  // Exactly one handler is observable afterwards and served every request.
  assert_eq!(counts.iter().sum::<usize>(), 2);
  assert!(counts.contains(&0), "both invocations must share one handler");
}

#[tokio::test]
async fn connect_handler_resolution_updates_the_cache() {
  let pending: Arc<MockHandler> = MockHandler::new("pending");
  let resolved: Arc<MockHandler> = MockHandler::new("resolved");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&pending)]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  proxy.ping_async(None).await.unwrap();
  assert_eq!(proxy.cached_connection().unwrap().endpoint().host(), "pending");

  let previous: Arc<dyn RequestHandler> = pending;
  let replacement: Arc<dyn RequestHandler> = resolved;

  proxy.update_handler(&previous, &replacement);
  assert_eq!(proxy.cached_connection().unwrap().endpoint().host(), "resolved");

  // A stale notification leaves the resolved handler in place.
  proxy.update_handler(&previous, &previous);
  assert_eq!(proxy.cached_connection().unwrap().endpoint().host(), "resolved");
}

#[tokio::test]
async fn uncached_proxy_binds_every_invocation() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, factory) = runtime_with(vec![handler]);
  let proxy: Proxy = proxy_on(&runtime, "account -u : tcp -h node1 -p 4061");

  proxy.ping_async(None).await.unwrap();
  proxy.ping_async(None).await.unwrap();

  assert_eq!(factory.bindings(), 2);
  assert!(proxy.cached_connection().is_none());
}

#[tokio::test]
async fn get_connection_binds_and_caches() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![handler]);
  let proxy: Proxy = proxy_on(&runtime, "account : tcp -h node1 -p 4061");

  assert!(proxy.cached_connection().is_none());

  let connection: Arc<Connection> = proxy.get_connection_async().await.unwrap();

  assert_eq!(connection.endpoint().host(), "node1");
  assert!(proxy.cached_connection().is_some());
}

// -----------------------------------------------------------------------------
// Batching
// -----------------------------------------------------------------------------

#[tokio::test]
async fn batch_requests_flush_in_submission_order() {
  let handler: Arc<MockHandler> = MockHandler::new("node1");
  let (runtime, _factory) = runtime_with(vec![Arc::clone(&handler)]);
  let batch: Proxy = proxy_on(&runtime, "account -O : tcp -h node1 -p 4061");

  for operation in ["credit", "debit", "transfer"] {
    let (ok, _): (bool, Bytes) = batch
      .invoke_async(operation, OperationMode::Normal, &[], None)
      .await
      .unwrap();

    assert!(ok);
  }

  assert!(handler.submissions().is_empty(), "batch requests must queue");

  batch.flush_batch_requests_async().await.unwrap();

  assert_eq!(handler.submissions(), ["credit", "debit", "transfer"]);
}
