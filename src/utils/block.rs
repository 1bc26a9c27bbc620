use tokio::runtime::Builder;
use tokio::runtime::Handle;
use tokio::runtime::Runtime as TokioRuntime;
use tokio::task;

use crate::error::Error;
use crate::error::SystemException;

/// Runs an invocation future to completion on the calling thread.
///
/// The blocking operation shapes are thin wrappers over their asynchronous
/// counterparts. When an ambient multi-threaded runtime exists the future
/// runs on it; otherwise a throwaway current-thread runtime drives it.
///
/// Must not be called from a single-threaded async context.
pub(crate) fn wait<F, T>(future: F) -> Result<T, Error>
where
  F: Future<Output = Result<T, Error>>,
{
  match Handle::try_current() {
    Ok(handle) => task::block_in_place(move || handle.block_on(future)),
    Err(_) => {
      let runtime: TokioRuntime = Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|error| {
          Error::System(SystemException::new(format!(
            "failed to start invocation runtime: {error}",
          )))
        })?;

      runtime.block_on(future)
    }
  }
}
