pub mod backend;

/// Engines shipped with the host.
pub mod backends {
    pub mod null;
}

pub use backend::RenderEngine;
