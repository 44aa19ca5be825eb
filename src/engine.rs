//! Engine binding.
//!
//! [`bind`] turns a surface into an engine through whichever construction
//! protocol the engine module exposes, and wraps the result in an
//! [`EngineHandle`]. The two protocols collapse into one [`BindOutcome`]:
//!
//! ```text
//!  bind(surface, ctor)
//!      │
//!      ├─ Protocol::Synchronous  ──▶ BindOutcome::Immediate(handle | error)
//!      │
//!      └─ Protocol::Asynchronous ──▶ BindOutcome::Deferred(DeferredEngine)
//!                                        │
//!                                        │ resolve().await
//!                                        ▼
//!                          token pending   ──▶ Resolution::Live(handle)
//!                          token abandoned ──▶ engine disposed on arrival,
//!                                              Resolution::DisposedOnArrival
//! ```
//!
//! The deferred-dispose obligation lives in [`DeferredEngine::resolve`]: an
//! engine that arrives after its creation was abandoned is disposed before
//! anything else can see it.

mod binding;
mod handle;
mod pending;

pub use binding::{AsyncFactory, BindFuture, Binding, EngineConstructor, Protocol, SyncConstructor};
pub use handle::EngineHandle;
pub use pending::{CreationState, PendingCreation};

use crate::errors::BindingError;
use crate::render::RenderEngine;
use crate::surface::{DrawingSurface, SurfaceId};
use log::{debug, info, warn};

/// Outcome of [`bind`].
pub enum BindOutcome<E: RenderEngine> {
    Immediate(Result<EngineHandle<E>, BindingError>),
    Deferred(DeferredEngine<E>),
}

impl<E: RenderEngine> std::fmt::Debug for BindOutcome<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindOutcome::Immediate(result) => f.debug_tuple("Immediate").field(result).finish(),
            BindOutcome::Deferred(deferred) => f.debug_tuple("Deferred").field(deferred).finish(),
        }
    }
}

/// How a deferred creation ended.
pub enum Resolution<E: RenderEngine> {
    /// The engine arrived while its creation was still wanted.
    Live(EngineHandle<E>),
    /// The engine arrived after abandonment and has already been disposed.
    DisposedOnArrival,
    /// The factory rejected.
    Failed(BindingError),
}

impl<E: RenderEngine> std::fmt::Debug for Resolution<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Live(handle) => f.debug_tuple("Live").field(handle).finish(),
            Resolution::DisposedOnArrival => write!(f, "DisposedOnArrival"),
            Resolution::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

/// An engine that is still completing its asynchronous handshake.
pub struct DeferredEngine<E: RenderEngine> {
    surface: SurfaceId,
    token: PendingCreation,
    future: BindFuture<E>,
}

impl<E: RenderEngine> std::fmt::Debug for DeferredEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredEngine")
            .field("surface", &self.surface)
            .field("state", &self.token.state())
            .finish()
    }
}

impl<E: RenderEngine> DeferredEngine<E> {
    /// Token to abandon this creation with.
    pub fn token(&self) -> PendingCreation {
        self.token.clone()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    /// Wait for the handshake, then hand the engine out or dispose it,
    /// depending on the token.
    pub async fn resolve(self) -> Resolution<E> {
        let DeferredEngine { surface, token, future } = self;

        match future.await {
            Ok(engine) => {
                let mut handle = EngineHandle::new(engine, surface);
                if token.resolve() {
                    debug!("Surface[{}]: deferred engine arrived", surface);
                    Resolution::Live(handle)
                } else {
                    info!("Surface[{}]: engine arrived after unmount, disposing", surface);
                    handle.dispose();
                    Resolution::DisposedOnArrival
                }
            }
            Err(e) => {
                if token.is_abandoned() {
                    debug!("Surface[{}]: abandoned engine creation failed: {}", surface, e);
                } else {
                    token.resolve();
                    warn!("Surface[{}]: engine factory rejected: {}", surface, e);
                }
                Resolution::Failed(e)
            }
        }
    }
}

/// Start binding an engine to `surface`.
pub fn bind<S, K>(surface: S, constructor: &K) -> BindOutcome<K::Engine>
where
    S: DrawingSurface,
    K: EngineConstructor<S> + ?Sized,
{
    let id = surface.id();
    debug!("Surface[{}]: binding engine ({})", id, constructor.protocol());

    match constructor.construct(surface) {
        Binding::Immediate(result) => {
            BindOutcome::Immediate(result.map(|engine| EngineHandle::new(engine, id)))
        }
        Binding::Deferred(future) => BindOutcome::Deferred(DeferredEngine {
            surface: id,
            token: PendingCreation::new(),
            future,
        }),
    }
}
