use crate::errors::HostError;
use crate::render::RenderEngine;
use crate::surface::SurfaceId;
use log::{debug, error, trace, warn};

/// Owning wrapper around a live engine.
///
/// The wrapper is the only path to [`RenderEngine::render`] and
/// [`RenderEngine::dispose`]. After [`dispose`](EngineHandle::dispose) the
/// engine is gone: further renders fail with [`HostError::Disposed`] and
/// further disposes do nothing. A handle dropped while still live disposes
/// its engine so no exit path leaks it.
pub struct EngineHandle<E: RenderEngine> {
    /// `None` once disposed
    engine: Option<E>,
    /// Surface the engine was created against; never changes
    surface: SurfaceId,
    /// Frames successfully rendered through this handle
    frames: u64,
}

impl<E: RenderEngine> std::fmt::Debug for EngineHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .field("surface", &self.surface)
            .field("frames", &self.frames)
            .finish()
    }
}

impl<E: RenderEngine> EngineHandle<E> {
    pub fn new(engine: E, surface: SurfaceId) -> Self {
        Self {
            engine: Some(engine),
            surface,
            frames: 0,
        }
    }

    pub fn is_live(&self) -> bool {
        self.engine.is_some()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Borrow the engine while it is live.
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Draw one frame.
    pub fn render(&mut self) -> Result<(), HostError> {
        let Some(engine) = self.engine.as_mut() else {
            error!("Surface[{}]: render requested on a disposed engine", self.surface);
            return Err(HostError::Disposed);
        };

        engine
            .render()
            .map_err(|e| HostError::Render(e.to_string()))?;

        self.frames += 1;
        trace!("Surface[{}]: frame {} rendered", self.surface, self.frames);
        Ok(())
    }

    /// Release the engine. Returns `true` if this call released it.
    pub fn dispose(&mut self) -> bool {
        match self.engine.take() {
            Some(mut engine) => {
                engine.dispose();
                debug!("Surface[{}]: engine '{}' disposed", self.surface, engine.name());
                true
            }
            None => {
                error!("Surface[{}]: engine disposed twice", self.surface);
                false
            }
        }
    }
}

impl<E: RenderEngine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            warn!("Surface[{}]: engine '{}' dropped while live, disposing", self.surface, engine.name());
            engine.dispose();
        }
    }
}
