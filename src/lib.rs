pub mod bootstrap;
pub mod component;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod render;
pub mod surface;

#[cfg(test)]
mod testing;

pub use bootstrap::{Bootstrap, EngineModule, StaticModule};
pub use component::CanvasView;
pub use config::{HostConfig, SurfaceConfig};
pub use errors::{BindingError, BootstrapError, HostError};
pub use events::{HostEvent, InstanceId};
pub use lifecycle::{Lifecycle, LifecycleState, Mounted};
