//! Lifecycle coordinator.
//!
//! A [`Lifecycle`] owns one mount of a hosting component: one surface and at
//! most one engine handle. It is a state machine:
//!
//! ```text
//!  Idle ──mount──▶ Provisioning ──▶ Binding ──handle──▶ Ready ──unmount──┐
//!                                    │  │                                ▼
//!                                    │  └─bind error──▶ Failed ──unmount──▶ Disposing
//!                                    │                                       │
//!                         unmount while pending                              │
//!                                    ▼                                       ▼
//!                                Abandoned ──deferred handle arrives──▶ Disposed
//!                                            (disposed, never rendered)
//! ```
//!
//! Ordering within an instance: the surface is provisioned before binding
//! starts, and the first render happens only once the handle exists. On
//! unmount from `Ready` the handle is disposed before the surface is removed.
//! On unmount while the asynchronous handshake is pending the surface is
//! removed at once and the engine is disposed whenever it arrives.
//!
//! External code (engine render and dispose, surface setters and removal)
//! always runs with the instance state released, so an engine or host may
//! query the instance from inside those calls.
//!
//! Everything runs on one thread. The asynchronous continuation is spawned
//! with [`tokio::task::spawn_local`] and only holds a weak reference to the
//! instance, so [`mount`](Lifecycle::mount) must be called from inside a
//! [`tokio::task::LocalSet`] when the engine uses the asynchronous protocol.

use crate::bootstrap::Bootstrap;
use crate::config::SurfaceConfig;
use crate::engine::{self, BindOutcome, EngineConstructor, EngineHandle, PendingCreation, Protocol, Resolution};
use crate::errors::{BindingError, HostError};
use crate::events::{HostEvent, InstanceId};
use crate::render::RenderEngine;
use crate::surface::{Container, DrawingSurface, ProvisionedSurface, SurfaceId, SurfaceProvisioner};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

/// State of a mount instance.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not mounted yet
    #[default]
    Idle,
    /// Creating and attaching the surface
    Provisioning,
    /// Waiting for the engine handle
    Binding,
    /// Engine live, first frame requested
    Ready,
    /// Releasing the engine, then the surface
    Disposing,
    /// Everything released
    Disposed,
    /// Unmounted while the engine handshake was pending; the engine is
    /// disposed when it arrives
    Abandoned,
    /// Binding failed; no engine attached
    Failed(String),
}

impl LifecycleState {
    /// True for `Disposed` and `Failed`: no further mount work happens in
    /// either. A `Failed` instance still holds its surface until `unmount`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Disposed | LifecycleState::Failed(_))
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "Idle"),
            LifecycleState::Provisioning => write!(f, "Provisioning"),
            LifecycleState::Binding => write!(f, "Binding"),
            LifecycleState::Ready => write!(f, "Ready"),
            LifecycleState::Disposing => write!(f, "Disposing"),
            LifecycleState::Disposed => write!(f, "Disposed"),
            LifecycleState::Abandoned => write!(f, "Abandoned"),
            LifecycleState::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

/// What [`Lifecycle::mount`] produced.
#[derive(Debug)]
pub enum Mounted {
    /// The engine was constructed synchronously and has rendered.
    Ready,
    /// The engine is still completing its handshake.
    Pending(PendingBind),
}

impl Mounted {
    pub fn is_ready(&self) -> bool {
        matches!(self, Mounted::Ready)
    }

    /// Wait until the engine is ready, whatever the protocol.
    pub async fn ready(self) -> Result<(), HostError> {
        match self {
            Mounted::Ready => Ok(()),
            Mounted::Pending(pending) => pending.wait().await,
        }
    }
}

/// Completion of an asynchronous bind.
#[derive(Debug)]
pub struct PendingBind {
    instance: InstanceId,
    rx: oneshot::Receiver<Result<(), HostError>>,
}

impl PendingBind {
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Resolves when the handle is ready and has rendered, when binding
    /// fails, or with [`HostError::Abandoned`] when the instance was
    /// unmounted first.
    pub async fn wait(self) -> Result<(), HostError> {
        self.rx.await.unwrap_or(Err(HostError::Abandoned))
    }
}

struct Inner<S: DrawingSurface, E: RenderEngine> {
    id: InstanceId,
    state: LifecycleState,
    surface: Option<ProvisionedSurface<S>>,
    handle: Option<EngineHandle<E>>,
    pending: Option<PendingCreation>,
    events: broadcast::Sender<HostEvent>,
}

impl<S: DrawingSurface, E: RenderEngine> Inner<S, E> {
    fn emit(&self, event: HostEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn transition(&mut self, to: LifecycleState) {
        let from = std::mem::replace(&mut self.state, to.clone());
        debug!("Instance[{}]: {} -> {}", self.id, from, to);
        self.emit(HostEvent::StateChanged { instance: self.id, from, to });
    }

    fn fail(&mut self, err: &BindingError) {
        warn!("Instance[{}]: binding failed: {}", self.id, err);
        self.emit(HostEvent::BindFailed { instance: self.id, error: err.to_string() });
        self.transition(LifecycleState::Failed(err.to_string()));
    }
}

/// Move to `Ready`, draw the first frame and store the handle.
fn become_ready<S, E>(cell: &RefCell<Inner<S, E>>, mut handle: EngineHandle<E>, protocol: Protocol) -> Result<(), HostError>
where
    S: DrawingSurface,
    E: RenderEngine,
{
    let surface = handle.surface_id();
    let id = {
        let mut inner = cell.borrow_mut();
        inner.pending = None;
        inner.emit(HostEvent::EngineBound { instance: inner.id, surface, protocol });
        inner.transition(LifecycleState::Ready);
        inner.id
    };

    let rendered = handle.render();

    let mut inner = cell.borrow_mut();
    if inner.state != LifecycleState::Ready {
        // Unmounted from inside the first frame.
        drop(inner);
        if handle.dispose() {
            cell.borrow().emit(HostEvent::EngineDisposed { instance: id, surface, deferred: false });
        }
        return rendered;
    }
    match &rendered {
        Ok(()) => {
            inner.emit(HostEvent::FrameRendered { instance: id, frame: handle.frames_rendered() });
            info!("Instance[{}]: engine ready on surface {}", id, surface);
        }
        Err(e) => {
            error!("Instance[{}]: first frame failed: {}", id, e);
            inner.emit(HostEvent::RenderFailed { instance: id, error: e.to_string() });
        }
    }
    inner.handle = Some(handle);
    rendered
}

/// Coordinates one mount: surface, engine, first frame, teardown.
pub struct Lifecycle<S, K>
where
    S: DrawingSurface,
    K: EngineConstructor<S>,
{
    inner: Rc<RefCell<Inner<S, K::Engine>>>,
    provisioner: SurfaceProvisioner,
    constructor: Rc<K>,
    bootstrap: Arc<Bootstrap>,
}

impl<S, K> Lifecycle<S, K>
where
    S: DrawingSurface,
    K: EngineConstructor<S>,
{
    pub fn new(
        config: SurfaceConfig,
        constructor: Rc<K>,
        bootstrap: Arc<Bootstrap>,
        events: broadcast::Sender<HostEvent>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                id: InstanceId::new(),
                state: LifecycleState::Idle,
                surface: None,
                handle: None,
                pending: None,
                events,
            })),
            provisioner: SurfaceProvisioner::new(config),
            constructor,
            bootstrap,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.inner.borrow().id
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state.clone()
    }

    /// The provisioned surface, while attached.
    pub fn surface(&self) -> Option<S> {
        self.inner.borrow().surface.as_ref().map(|p| p.surface().clone())
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.inner.borrow().surface.as_ref().map(|p| p.id())
    }

    /// True while an engine handle is held and live.
    pub fn has_engine(&self) -> bool {
        self.inner.borrow().handle.as_ref().is_some_and(|h| h.is_live())
    }

    pub fn frames_rendered(&self) -> u64 {
        self.inner.borrow().handle.as_ref().map_or(0, |h| h.frames_rendered())
    }

    /// Run `f` against the live engine, if there is one.
    pub fn with_engine<R>(&self, f: impl FnOnce(&K::Engine) -> R) -> Option<R> {
        self.inner.borrow().handle.as_ref().and_then(|h| h.engine()).map(f)
    }

    /// Provision a surface in `container`, bind an engine and render once.
    ///
    /// Fails without side effects when the engine module is not initialized
    /// or there is no container. A synchronous bind failure leaves the
    /// instance `Failed` with the surface still attached until unmount.
    ///
    /// # Panics
    ///
    /// With an asynchronous constructor, panics if called outside a
    /// [`tokio::task::LocalSet`].
    pub fn mount<C>(&self, container: Option<&C>) -> Result<Mounted, HostError>
    where
        C: Container<Surface = S> + ?Sized,
    {
        let id = {
            let inner = self.inner.borrow();
            if inner.state != LifecycleState::Idle {
                return Err(HostError::InvalidState(inner.state.clone()));
            }
            inner.id
        };

        if !self.bootstrap.is_initialized() {
            error!("Instance[{}]: mount before the engine module was initialized", id);
            return Err(HostError::NotInitialized);
        }
        let Some(container) = container else {
            warn!("Instance[{}]: mount without a container", id);
            return Err(HostError::NoContainer);
        };

        self.inner.borrow_mut().transition(LifecycleState::Provisioning);
        let provisioned = self.provisioner.provision(container);

        let surface = {
            let mut inner = self.inner.borrow_mut();
            let config = self.provisioner.config();
            inner.emit(HostEvent::SurfaceProvisioned {
                instance: id,
                surface: provisioned.id(),
                backing: config.backing,
                display: config.display,
            });
            let surface = provisioned.surface().clone();
            inner.surface = Some(provisioned);

            inner.transition(LifecycleState::Binding);
            surface
        };

        match engine::bind(surface, self.constructor.as_ref()) {
            BindOutcome::Immediate(Ok(handle)) => {
                become_ready(&self.inner, handle, Protocol::Synchronous)?;
                Ok(Mounted::Ready)
            }
            BindOutcome::Immediate(Err(e)) => {
                self.inner.borrow_mut().fail(&e);
                Err(e.into())
            }
            BindOutcome::Deferred(deferred) => {
                let token = deferred.token();
                let events = {
                    let mut inner = self.inner.borrow_mut();
                    inner.pending = Some(token);
                    inner.events.clone()
                };
                let surface = deferred.surface_id();
                let weak = Rc::downgrade(&self.inner);
                let (tx, rx) = oneshot::channel();

                tokio::task::spawn_local(async move {
                    let resolution = deferred.resolve().await;
                    let result = complete_deferred(weak, resolution, id, surface, &events);
                    let _ = tx.send(result);
                });

                debug!("Instance[{}]: waiting for engine handshake", id);
                Ok(Mounted::Pending(PendingBind { instance: id, rx }))
            }
        }
    }

    /// Tear the instance down. Safe to call in any state; a no-op once
    /// nothing is left to release.
    pub fn unmount(&self) {
        let state = self.state();
        match state {
            LifecycleState::Ready => {
                let (handle, surface) = {
                    let mut inner = self.inner.borrow_mut();
                    inner.transition(LifecycleState::Disposing);
                    (inner.handle.take(), inner.surface.take())
                };
                if let Some(mut handle) = handle {
                    let surface = handle.surface_id();
                    if handle.dispose() {
                        self.emit(HostEvent::EngineDisposed { instance: self.id(), surface, deferred: false });
                    }
                }
                self.remove_surface(surface);
                self.inner.borrow_mut().transition(LifecycleState::Disposed);
            }
            LifecycleState::Binding => {
                let (token, surface) = {
                    let mut inner = self.inner.borrow_mut();
                    inner.transition(LifecycleState::Abandoned);
                    (inner.pending.take(), inner.surface.take())
                };
                if let Some(token) = token {
                    token.abandon();
                }
                self.remove_surface(surface);
                info!("Instance[{}]: unmounted during engine handshake", self.id());
            }
            LifecycleState::Failed(_) => {
                let surface = {
                    let mut inner = self.inner.borrow_mut();
                    inner.transition(LifecycleState::Disposing);
                    inner.surface.take()
                };
                self.remove_surface(surface);
                self.inner.borrow_mut().transition(LifecycleState::Disposed);
            }
            state => {
                debug!("Instance[{}]: unmount in state {} is a no-op", self.id(), state);
            }
        }
    }

    fn emit(&self, event: HostEvent) {
        self.inner.borrow().emit(event);
    }

    fn remove_surface(&self, provisioned: Option<ProvisionedSurface<S>>) {
        if let Some(provisioned) = provisioned {
            let surface = provisioned.id();
            self.provisioner.unprovision(provisioned);
            self.emit(HostEvent::SurfaceRemoved { instance: self.id(), surface });
        }
    }
}

impl<S, K> Drop for Lifecycle<S, K>
where
    S: DrawingSurface,
    K: EngineConstructor<S>,
{
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Apply the outcome of an asynchronous bind to the instance, if it still
/// exists.
fn complete_deferred<S, E>(
    weak: Weak<RefCell<Inner<S, E>>>,
    resolution: Resolution<E>,
    id: InstanceId,
    surface: SurfaceId,
    events: &broadcast::Sender<HostEvent>,
) -> Result<(), HostError>
where
    S: DrawingSurface,
    E: RenderEngine,
{
    let inner = weak.upgrade();

    match resolution {
        Resolution::Live(mut handle) => {
            let Some(inner) = inner else {
                // The token is abandoned before the instance goes away, so
                // this only happens if the instance leaked its state.
                handle.dispose();
                let _ = events.send(HostEvent::EngineDisposed { instance: id, surface, deferred: true });
                return Err(HostError::Abandoned);
            };
            become_ready(&inner, handle, Protocol::Asynchronous)
        }
        Resolution::DisposedOnArrival => {
            let _ = events.send(HostEvent::EngineDisposed { instance: id, surface, deferred: true });
            if let Some(inner) = inner {
                let mut inner = inner.borrow_mut();
                if inner.state == LifecycleState::Abandoned {
                    inner.transition(LifecycleState::Disposed);
                }
            }
            Err(HostError::Abandoned)
        }
        Resolution::Failed(e) => {
            if let Some(inner) = inner {
                let mut inner = inner.borrow_mut();
                inner.pending = None;
                match inner.state {
                    LifecycleState::Binding => inner.fail(&e),
                    // Nothing arrived, so nothing is left to dispose.
                    LifecycleState::Abandoned => inner.transition(LifecycleState::Disposed),
                    _ => {}
                }
            }
            Err(e.into())
        }
    }
}
