//! One-time engine module initialization.
//!
//! Before any surface is provisioned, the external engine module must have
//! loaded its payload and installed its global diagnostics hook. [`Bootstrap`]
//! tracks that as an explicit flag instead of a load-time side effect:
//!
//! - [`Bootstrap::global`] is the process-wide instance hosts use.
//! - [`Bootstrap::new`] builds an isolated instance (tests, embedders that
//!   host several engine modules).
//! - [`initialize`](Bootstrap::initialize) is idempotent and serialized:
//!   concurrent callers wait for the first one, later calls return at once.
//! - A failed `initialize` leaves the instance uninitialized. Nothing retries
//!   on its own; the caller decides whether to call again.
//!
//! ```
//! use render_host::bootstrap::{Bootstrap, StaticModule};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let bootstrap = Bootstrap::new();
//! bootstrap.initialize(&StaticModule::new()).await.unwrap();
//! assert!(bootstrap.is_initialized());
//! # });
//! ```

use crate::config::LogLevel;
use crate::errors::BootstrapError;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use lazy_static::lazy_static;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

lazy_static! {
    static ref GLOBAL: Arc<Bootstrap> = Arc::new(Bootstrap::new());
}

/// The external engine module, seen from the host.
pub trait EngineModule {
    /// Load and instantiate the module payload.
    fn load(&self) -> LocalBoxFuture<'_, Result<(), BootstrapError>>;

    /// Install global hooks (logging, panic reporting). Called once, after a
    /// successful [`load`](EngineModule::load).
    fn global_start(&self) {}
}

/// An engine linked into the host binary: nothing to load, and its
/// diagnostics hook is the crate logger.
#[derive(Debug, Clone, Default)]
pub struct StaticModule {
    log_level: Option<LogLevel>,
}

impl StaticModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the crate logger at `level` during `global_start`.
    pub fn with_logging(level: LogLevel) -> Self {
        Self { log_level: Some(level) }
    }
}

impl EngineModule for StaticModule {
    fn load(&self) -> LocalBoxFuture<'_, Result<(), BootstrapError>> {
        future::ready(Ok(())).boxed_local()
    }

    fn global_start(&self) {
        if let Some(level) = self.log_level {
            init_logging(level);
        }
    }
}

/// Install the `env_logger` backend. `RUST_LOG` overrides `level`.
///
/// Returns `false` if a logger was already installed.
pub fn init_logging(level: LogLevel) -> bool {
    let filter = log::LevelFilter::from(level).to_string().to_lowercase();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_micros()
        .try_init()
        .is_ok()
}

/// Process-wide initialization state of the engine module.
#[derive(Debug, Default)]
pub struct Bootstrap {
    initialized: AtomicBool,
    init_lock: tokio::sync::Mutex<()>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance.
    pub fn global() -> Arc<Bootstrap> {
        GLOBAL.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Load `module` and run its global hook, once.
    pub async fn initialize<M>(&self, module: &M) -> Result<(), BootstrapError>
    where
        M: EngineModule + ?Sized,
    {
        if self.is_initialized() {
            debug!("Bootstrap: already initialized");
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        info!("Bootstrap: loading engine module");
        if let Err(e) = module.load().await {
            error!("Bootstrap: {}", e);
            return Err(e);
        }
        module.global_start();

        self.initialized.store(true, Ordering::Release);
        info!("Bootstrap: engine module ready");
        Ok(())
    }

    /// Forget a previous initialization.
    pub fn reset(&self) {
        self.initialized.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingModule {
        loads: Cell<u32>,
        starts: Cell<u32>,
        fail: bool,
    }

    impl EngineModule for CountingModule {
        fn load(&self) -> LocalBoxFuture<'_, Result<(), BootstrapError>> {
            async move {
                self.loads.set(self.loads.get() + 1);
                tokio::task::yield_now().await;
                if self.fail {
                    Err(BootstrapError::Instantiate("bad magic number".into()))
                } else {
                    Ok(())
                }
            }
            .boxed_local()
        }

        fn global_start(&self) {
            self.starts.set(self.starts.get() + 1);
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let bootstrap = Bootstrap::new();
        let module = CountingModule::default();

        bootstrap.initialize(&module).await.unwrap();
        bootstrap.initialize(&module).await.unwrap();

        assert!(bootstrap.is_initialized());
        assert_eq!(module.loads.get(), 1);
        assert_eq!(module.starts.get(), 1);
    }

    #[tokio::test]
    async fn concurrent_initialize_loads_once() {
        let bootstrap = Bootstrap::new();
        let module = CountingModule::default();

        let (a, b) = tokio::join!(bootstrap.initialize(&module), bootstrap.initialize(&module));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(module.loads.get(), 1);
    }

    #[tokio::test]
    async fn failure_leaves_state_uninitialized() {
        let bootstrap = Bootstrap::new();
        let module = CountingModule { fail: true, ..Default::default() };

        let err = bootstrap.initialize(&module).await.unwrap_err();
        assert_eq!(err, BootstrapError::Instantiate("bad magic number".into()));
        assert!(!bootstrap.is_initialized());
        assert_eq!(module.starts.get(), 0);
    }

    #[tokio::test]
    async fn reset_allows_reinitialization() {
        let bootstrap = Bootstrap::new();
        let module = CountingModule::default();

        bootstrap.initialize(&module).await.unwrap();
        bootstrap.reset();
        assert!(!bootstrap.is_initialized());

        bootstrap.initialize(&module).await.unwrap();
        assert_eq!(module.loads.get(), 2);
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(&Bootstrap::global(), &Bootstrap::global()));
    }
}
