//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! Inside a Tokio runtime the sweeper is a task on that runtime. Anywhere
//! else it gets a dedicated thread driving a single-threaded runtime, so a
//! sweeping cache can be built from plain threads as well.

use std::sync::Weak;
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::{Builder, Handle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

// == Sweeper Handle ==
/// Where the sweep loop runs.
#[derive(Debug)]
enum Worker {
    /// Task on the caller's runtime
    Task(JoinHandle<()>),
    /// Dedicated thread with its own runtime
    Thread(thread::JoinHandle<()>),
}

impl Worker {
    fn is_finished(&self) -> bool {
        match self {
            Worker::Task(handle) => handle.is_finished(),
            Worker::Thread(handle) => handle.is_finished(),
        }
    }
}

/// Owned handle to a running sweeper.
///
/// Dropping the handle stops the sweeper. Stopping is cooperative: the
/// signal takes effect before the next scheduled wake, and a sweep that is
/// already running always completes.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    worker: Option<Worker>,
}

impl SweeperHandle {
    // == Stop ==
    /// Signals the sweeper to stop. Idempotent.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Returns true once `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Returns true once the sweep loop has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, Worker::is_finished)
    }

    /// Returns true if the sweeper runs on its own thread.
    pub fn is_dedicated(&self) -> bool {
        matches!(self.worker, Some(Worker::Thread(_)))
    }

    // == Shutdown ==
    /// Stops the sweeper and waits for the loop to exit.
    ///
    /// A dedicated sweeper thread is joined on Tokio's blocking pool.
    pub async fn shutdown(mut self) {
        self.stop();
        match self.worker.take() {
            Some(Worker::Task(handle)) => {
                let _ = handle.await;
            }
            Some(Worker::Thread(handle)) => {
                let _ = tokio::task::spawn_blocking(move || handle.join()).await;
            }
            None => {}
        }
    }

    /// Stops the sweeper and blocks until a dedicated sweeper thread exits.
    ///
    /// A sweeper running as a task on the caller's runtime is only signalled,
    /// since blocking on it from that runtime could deadlock.
    pub fn shutdown_blocking(mut self) {
        self.stop();
        if let Some(Worker::Thread(handle)) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns a background sweeper removing expired entries every `interval`.
///
/// The sweeper holds only a weak reference to the store, so it also exits
/// on its own once the store has been dropped.
///
/// # Arguments
/// * `store` - Weak reference to the shared entry store
/// * `interval` - Time between two sweeps
///
/// # Returns
/// A handle that stops the sweeper when told to or when dropped. If no
/// sweeper thread could be started the failure is logged and the returned
/// handle reports itself finished.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::<String>::new()));
/// let sweeper = spawn_sweeper(Arc::downgrade(&store), Duration::from_secs(1));
/// // Later, when the store is discarded:
/// sweeper.stop();
/// ```
pub fn spawn_sweeper<V>(store: Weak<RwLock<CacheStore<V>>>, interval: Duration) -> SweeperHandle
where
    V: Send + Sync + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = run_sweeper(store, interval, shutdown_rx);

    let worker = match Handle::try_current() {
        Ok(runtime) => Some(Worker::Task(runtime.spawn(sweep))),
        Err(_) => spawn_dedicated(sweep),
    };

    SweeperHandle {
        shutdown_tx,
        worker,
    }
}

/// Runs the sweep loop on a new thread with a single-threaded runtime.
fn spawn_dedicated<F>(sweep: F) -> Option<Worker>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("cache-sweeper".to_string())
        .spawn(move || {
            match Builder::new_current_thread().enable_time().build() {
                Ok(runtime) => runtime.block_on(sweep),
                Err(e) => warn!("Expiry sweeper disabled: failed to build runtime: {}", e),
            }
        });

    match spawned {
        Ok(handle) => Some(Worker::Thread(handle)),
        Err(e) => {
            warn!("Expiry sweeper disabled: failed to spawn thread: {}", e);
            None
        }
    }
}

// == Sweep Loop ==
async fn run_sweeper<V>(
    store: Weak<RwLock<CacheStore<V>>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    V: Send + Sync + 'static,
{
    info!("Starting expiry sweeper with interval of {:?}", interval);

    loop {
        tokio::select! {
            biased;

            // Fires on a stop signal or when the handle is gone
            _ = shutdown_rx.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let Some(shared) = store.upgrade() else {
            break;
        };

        // The write lock is released before the next await
        let removed = shared.write().cleanup_expired();

        if removed > 0 {
            info!("Expiry sweep: removed {} expired entries", removed);
        } else {
            debug!("Expiry sweep: no expired entries found");
        }
    }

    info!("Expiry sweeper stopped");
}
