//! Surface provisioning.
//!
//! The UI host is reached through two traits. A [`Container`] is a mounted
//! node that can create drawing surfaces and adopt them as children. A
//! [`DrawingSurface`] is a cheap, clonable reference to one drawing-target
//! element (a canvas on the web): the same element is shared by the
//! coordinator, which attaches and removes it, and the engine, which renders
//! into it.
//!
//! [`SurfaceProvisioner`] applies a [`SurfaceConfig`] to a fresh surface and
//! attaches it. The returned [`ProvisionedSurface`] is the only way to detach
//! it again, and detaching consumes it, so a surface is unprovisioned at most
//! once.

use crate::config::SurfaceConfig;
use log::debug;
use std::fmt;
use uuid::Uuid;

mod size;
pub mod headless;

pub use size::{device_pixel_ratio, LogicalSize, PixelSize};

/// A unique identifier for a provisioned surface.
///
/// Treat it as an opaque handle; the [`Uuid`] inside is an implementation
/// detail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    /// Create a new unique `SurfaceId` using a random UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a drawing-target element owned by the UI host.
///
/// Clones refer to the same element. Setters take `&self` because the element
/// lives on the host side.
pub trait DrawingSurface: Clone + 'static {
    fn id(&self) -> SurfaceId;

    /// Set the pixel grid the engine renders into.
    fn set_backing_size(&self, size: PixelSize);
    fn backing_size(&self) -> PixelSize;

    /// Set the size the element occupies in layout.
    fn set_display_size(&self, size: LogicalSize);
    fn display_size(&self) -> LogicalSize;

    /// True while the element is a child of a container.
    fn is_attached(&self) -> bool;

    /// Detach the element from its container. No-op when detached.
    fn remove(&self);
}

/// A mounted node that can host drawing surfaces.
pub trait Container {
    type Surface: DrawingSurface;

    /// Create a new, detached surface element.
    fn create_surface(&self) -> Self::Surface;

    /// Append `surface` as a child of this container.
    fn append(&self, surface: &Self::Surface);
}

/// A surface attached by a [`SurfaceProvisioner`].
#[derive(Debug)]
pub struct ProvisionedSurface<S: DrawingSurface> {
    surface: S,
}

impl<S: DrawingSurface> ProvisionedSurface<S> {
    pub fn id(&self) -> SurfaceId {
        self.surface.id()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// Creates surfaces with fixed sizes and attaches them to containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceProvisioner {
    config: SurfaceConfig,
}

impl SurfaceProvisioner {
    pub fn new(config: SurfaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Create a surface, size it and append it to `container`.
    pub fn provision<C>(&self, container: &C) -> ProvisionedSurface<C::Surface>
    where
        C: Container + ?Sized,
    {
        let surface = container.create_surface();
        surface.set_backing_size(self.config.backing);
        surface.set_display_size(self.config.display);
        container.append(&surface);

        debug!(
            "Surface[{}]: provisioned with backing {} displayed at {}",
            surface.id(),
            self.config.backing,
            self.config.display
        );

        ProvisionedSurface { surface }
    }

    /// Detach and discard a provisioned surface.
    pub fn unprovision<S: DrawingSurface>(&self, provisioned: ProvisionedSurface<S>) {
        let id = provisioned.id();
        provisioned.surface.remove();
        debug!("Surface[{}]: removed from container", id);
    }
}
