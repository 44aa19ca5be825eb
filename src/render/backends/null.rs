use crate::engine::{AsyncFactory, EngineConstructor, SyncConstructor};
use crate::errors::BindingError;
use crate::render::backend::RenderEngine;
use crate::surface::{DrawingSurface, PixelSize};
use log::{debug, trace};
use std::time::Duration;

/// Null engine that does not draw anything.
///
/// It binds to a surface like a real engine would, remembers the backing
/// resolution it was created for and counts frames. Useful for headless
/// hosts, tests and wiring up a new host before a real engine exists.
pub struct NullEngine<S: DrawingSurface> {
    /// Surface the engine renders into.
    surface: S,
    /// Resolution of the render target, taken from the backing store at creation.
    target: PixelSize,
    /// Frame ID, bumped on every render.
    frame_id: u64,
}

impl<S: DrawingSurface> NullEngine<S> {
    /// Creates a null engine for `surface`.
    pub fn new(surface: S) -> Result<Self, BindingError> {
        let target = surface.backing_size();
        if target.is_empty() {
            return Err(BindingError::Construct(format!(
                "surface {} has an empty backing store ({target})",
                surface.id()
            )));
        }

        debug!("NullEngine: created for surface {} at {}", surface.id(), target);
        Ok(Self {
            surface,
            target,
            frame_id: 0,
        })
    }

    /// Synchronous constructor.
    pub fn constructor() -> impl EngineConstructor<S, Engine = NullEngine<S>> {
        SyncConstructor::new(Self::new)
    }

    /// Asynchronous factory whose handshake takes `delay`.
    pub fn factory(delay: Duration) -> impl EngineConstructor<S, Engine = NullEngine<S>> {
        AsyncFactory::new(move |surface: S| async move {
            tokio::time::sleep(delay).await;
            Self::new(surface)
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Resolution the engine draws at.
    pub fn target_size(&self) -> PixelSize {
        self.target
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }
}

impl<S: DrawingSurface> RenderEngine for NullEngine<S> {
    fn name(&self) -> &str {
        "NullEngine"
    }

    fn render(&mut self) -> anyhow::Result<()> {
        self.frame_id = self.frame_id.wrapping_add(1);
        trace!("NullEngine: frame {} at {}", self.frame_id, self.target);
        Ok(())
    }

    fn dispose(&mut self) {
        debug!("NullEngine: released surface {}", self.surface.id());
    }
}
