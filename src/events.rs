//! Lifecycle events.
//!
//! Every mount instance reports what it does on a broadcast channel of
//! [`HostEvent`]s. Hosts use it for diagnostics and to react to an engine
//! becoming ready; tests use it to check ordering. Events are sent
//! best-effort: a channel without subscribers drops them.

use crate::engine::Protocol;
use crate::lifecycle::LifecycleState;
use crate::surface::{LogicalSize, PixelSize, SurfaceId};
use std::fmt;
use uuid::Uuid;

/// A unique identifier for one mount of a hosting component.
///
/// Remounting the component always produces a new `InstanceId`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    // ****************************************
    // ** Lifecycle
    /// The instance moved to a new state
    StateChanged { instance: InstanceId, from: LifecycleState, to: LifecycleState },

    // ****************************************
    // ** Surface
    /// A surface was created, sized and attached
    SurfaceProvisioned { instance: InstanceId, surface: SurfaceId, backing: PixelSize, display: LogicalSize },
    /// The surface was detached from its container
    SurfaceRemoved { instance: InstanceId, surface: SurfaceId },

    // ****************************************
    // ** Engine
    /// An engine handle is live and bound to the surface
    EngineBound { instance: InstanceId, surface: SurfaceId, protocol: Protocol },
    /// Binding failed; no engine is attached
    BindFailed { instance: InstanceId, error: String },
    /// A frame was drawn
    FrameRendered { instance: InstanceId, frame: u64 },
    /// Drawing a frame failed
    RenderFailed { instance: InstanceId, error: String },
    /// The engine was released. `deferred` is set when it arrived after unmount
    EngineDisposed { instance: InstanceId, surface: SurfaceId, deferred: bool },
}

impl HostEvent {
    /// Instance the event belongs to.
    pub fn instance(&self) -> InstanceId {
        match self {
            HostEvent::StateChanged { instance, .. }
            | HostEvent::SurfaceProvisioned { instance, .. }
            | HostEvent::SurfaceRemoved { instance, .. }
            | HostEvent::EngineBound { instance, .. }
            | HostEvent::BindFailed { instance, .. }
            | HostEvent::FrameRendered { instance, .. }
            | HostEvent::RenderFailed { instance, .. }
            | HostEvent::EngineDisposed { instance, .. } => *instance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique() {
        assert_ne!(InstanceId::new(), InstanceId::new());
    }

    #[test]
    fn instance_accessor_covers_variants() {
        let id = InstanceId::new();
        let surface = SurfaceId::new();
        let events = [
            HostEvent::StateChanged { instance: id, from: LifecycleState::Idle, to: LifecycleState::Provisioning },
            HostEvent::SurfaceRemoved { instance: id, surface },
            HostEvent::EngineDisposed { instance: id, surface, deferred: true },
            HostEvent::FrameRendered { instance: id, frame: 1 },
        ];
        assert!(events.iter().all(|e| e.instance() == id));
    }

    #[test]
    fn debug_names_variant() {
        let e = HostEvent::BindFailed { instance: InstanceId::new(), error: "no adapter".into() };
        assert!(format!("{e:?}").contains("BindFailed"));
    }
}
