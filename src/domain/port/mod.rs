use std::thread::{self, JoinHandle};

use crate::domain::config::FatalPolicy;
use crate::error::{Error, Result};

pub mod context;
pub mod destination_port;
pub mod handshake;
pub mod origin_port;

pub type WorkerHandle<T> = JoinHandle<Result<T>>;

/// Spawns a named worker thread.
///
/// A fatal error ends the whole process right inside the worker under
/// `FatalPolicy::Abort`. Any other failure is logged and handed to whoever joins the worker.
pub(crate) fn spawn_worker<T, F>(name: String, policy: FatalPolicy, body: F) -> Result<WorkerHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let label = name.clone();
    let handle = thread::Builder::new().name(name).spawn(move || {
        body().inspect_err(|e| {
            log::error!("{} - failed: {}", label, e);
            if e.is_fatal() && policy == FatalPolicy::Abort {
                log::error!("{} - fatal protocol violation, aborting", label);
                std::process::exit(1);
            }
        })
    })?;
    Ok(handle)
}

/// Joins a worker. Failures are appended to `failures` instead of being propagated.
pub(crate) fn join_worker<T>(name: &str, handle: WorkerHandle<T>, failures: &mut Vec<String>) -> Option<T> {
    match handle.join() {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            failures.push(format!("{}: {}", name, e));
            None
        }
        Err(_) => {
            let e = Error::WorkerPanicked(name.to_string());
            log::error!("{}", e);
            failures.push(e.to_string());
            None
        }
    }
}
