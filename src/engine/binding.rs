use crate::errors::BindingError;
use crate::render::RenderEngine;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;

/// Future produced by the asynchronous construction protocol.
pub type BindFuture<E> = LocalBoxFuture<'static, Result<E, BindingError>>;

/// How an engine comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// A direct constructor call returns the engine.
    Synchronous,
    /// A factory returns a future that resolves to the engine.
    Asynchronous,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Synchronous => write!(f, "sync"),
            Protocol::Asynchronous => write!(f, "async"),
        }
    }
}

/// Result of calling an engine constructor: available now, or later.
pub enum Binding<E> {
    Immediate(Result<E, BindingError>),
    Deferred(BindFuture<E>),
}

impl<E> Binding<E> {
    pub fn protocol(&self) -> Protocol {
        match self {
            Binding::Immediate(_) => Protocol::Synchronous,
            Binding::Deferred(_) => Protocol::Asynchronous,
        }
    }
}

impl<E> fmt::Debug for Binding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Immediate(Ok(_)) => write!(f, "Binding::Immediate(Ok(..))"),
            Binding::Immediate(Err(e)) => write!(f, "Binding::Immediate(Err({e:?}))"),
            Binding::Deferred(_) => write!(f, "Binding::Deferred(..)"),
        }
    }
}

/// The construction interface an external engine exposes for surfaces of
/// type `S`.
pub trait EngineConstructor<S> {
    type Engine: RenderEngine;

    fn protocol(&self) -> Protocol;

    /// Start constructing an engine bound to `surface`.
    fn construct(&self, surface: S) -> Binding<Self::Engine>;
}

/// Synchronous protocol: `ctor(surface)` returns the engine directly.
pub struct SyncConstructor<F> {
    ctor: F,
}

impl<F> SyncConstructor<F> {
    pub fn new(ctor: F) -> Self {
        Self { ctor }
    }
}

impl<S, E, F> EngineConstructor<S> for SyncConstructor<F>
where
    F: Fn(S) -> Result<E, BindingError>,
    E: RenderEngine,
{
    type Engine = E;

    fn protocol(&self) -> Protocol {
        Protocol::Synchronous
    }

    fn construct(&self, surface: S) -> Binding<E> {
        Binding::Immediate((self.ctor)(surface))
    }
}

/// Asynchronous protocol: `factory(surface)` returns a future that resolves
/// once the engine has finished its handshake.
pub struct AsyncFactory<F> {
    factory: F,
}

impl<F> AsyncFactory<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<S, E, F, Fut> EngineConstructor<S> for AsyncFactory<F>
where
    F: Fn(S) -> Fut,
    Fut: Future<Output = Result<E, BindingError>> + 'static,
    E: RenderEngine,
{
    type Engine = E;

    fn protocol(&self) -> Protocol {
        Protocol::Asynchronous
    }

    fn construct(&self, surface: S) -> Binding<E> {
        Binding::Deferred((self.factory)(surface).boxed_local())
    }
}
