//! Hosting component.
//!
//! [`CanvasView`] is what a UI tree embeds. Every mount creates a fresh
//! [`Lifecycle`] with its own surface and engine; unmount tears it down. The
//! component keeps the last instance around after unmount so hosts can
//! inspect how it ended, and replaces it on the next mount.

use crate::bootstrap::Bootstrap;
use crate::config::{validate_host, HostConfig};
use crate::engine::EngineConstructor;
use crate::errors::HostError;
use crate::events::{HostEvent, InstanceId};
use crate::lifecycle::{Lifecycle, LifecycleState, Mounted};
use crate::surface::{Container, DrawingSurface, LogicalSize, PixelSize};
use log::{debug, info};
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct CanvasView<S, K>
where
    S: DrawingSurface,
    K: EngineConstructor<S>,
{
    config: HostConfig,
    constructor: Rc<K>,
    bootstrap: Arc<Bootstrap>,
    events: broadcast::Sender<HostEvent>,
    current: Option<Lifecycle<S, K>>,
    mounts: usize,
}

impl<S, K> CanvasView<S, K>
where
    S: DrawingSurface,
    K: EngineConstructor<S>,
{
    /// A view with the default configuration, gated on the process-wide
    /// bootstrap.
    pub fn new(constructor: K) -> Result<Self, HostError> {
        Self::with_config(HostConfig::default(), constructor, Bootstrap::global())
    }

    /// A view with `config`, which is validated first since its fields can be
    /// set without the builder.
    pub fn with_config(config: HostConfig, constructor: K, bootstrap: Arc<Bootstrap>) -> Result<Self, HostError> {
        validate_host(&config)?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            config,
            constructor: Rc::new(constructor),
            bootstrap,
            events,
            current: None,
            mounts: 0,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn display_size(&self) -> LogicalSize {
        self.config.surface.display
    }

    pub fn backing_size(&self) -> PixelSize {
        self.config.surface.backing
    }

    /// Events of every instance this view creates.
    pub fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    /// Number of mounts that got past the precondition checks.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    /// The current (or last) instance.
    pub fn instance(&self) -> Option<&Lifecycle<S, K>> {
        self.current.as_ref()
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.current.as_ref().map(|lc| lc.id())
    }

    /// State of the current instance; `Idle` before the first mount.
    pub fn state(&self) -> LifecycleState {
        self.current.as_ref().map_or(LifecycleState::Idle, |lc| lc.state())
    }

    /// Mount into `container` with a new instance.
    ///
    /// Rejected with [`HostError::InvalidState`] while the previous instance
    /// is still live. An instance left `Abandoned` does not block a remount;
    /// its late engine is disposed on its own.
    pub fn mount<C>(&mut self, container: Option<&C>) -> Result<Mounted, HostError>
    where
        C: Container<Surface = S> + ?Sized,
    {
        if let Some(current) = &self.current {
            let state = current.state();
            if !(state.is_terminal() || state == LifecycleState::Abandoned) {
                return Err(HostError::InvalidState(state));
            }
        }

        let lifecycle = Lifecycle::new(
            self.config.surface,
            self.constructor.clone(),
            self.bootstrap.clone(),
            self.events.clone(),
        );
        debug!("CanvasView: mounting instance {}", lifecycle.id());

        let result = lifecycle.mount(container);
        if !matches!(result, Err(HostError::NotInitialized | HostError::NoContainer)) {
            self.mounts += 1;
        }
        // A failed precondition leaves the instance Idle; keep the previous
        // one so its end state stays visible.
        if lifecycle.state() != LifecycleState::Idle {
            self.current = Some(lifecycle);
        }
        result
    }

    /// Tear down the current instance, if any.
    pub fn unmount(&mut self) {
        if let Some(current) = &self.current {
            info!("CanvasView: unmounting instance {}", current.id());
            current.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{EngineModule, StaticModule};
    use crate::engine::SyncConstructor;
    use crate::errors::{BindingError, BootstrapError};
    use crate::render::backends::null::NullEngine;
    use crate::config::ConfigError;
    use crate::surface::headless::{HeadlessContainer, HeadlessSurface};
    use crate::testing::{initialized, recording_constructor, recording_factory, Journal};
    use futures::future::LocalBoxFuture;
    use futures::FutureExt;
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::task::LocalSet;

    struct BrokenModule;

    impl EngineModule for BrokenModule {
        fn load(&self) -> LocalBoxFuture<'_, Result<(), BootstrapError>> {
            async { Err(BootstrapError::Load("payload missing".into())) }.boxed_local()
        }
    }

    async fn ready_bootstrap() -> Arc<Bootstrap> {
        let bootstrap = Arc::new(Bootstrap::new());
        bootstrap.initialize(&StaticModule::new()).await.unwrap();
        bootstrap
    }

    fn null_view(bootstrap: Arc<Bootstrap>) -> CanvasView<HeadlessSurface, impl EngineConstructor<HeadlessSurface>> {
        CanvasView::with_config(HostConfig::default(), NullEngine::<HeadlessSurface>::constructor(), bootstrap).unwrap()
    }

    #[tokio::test]
    async fn remounting_creates_fresh_instances() {
        let container = HeadlessContainer::new();
        let mut view = null_view(ready_bootstrap().await);

        let mut instances = HashSet::new();
        let mut surfaces = HashSet::new();
        for _ in 0..3 {
            assert!(view.mount(Some(&container)).unwrap().is_ready());
            instances.insert(view.instance_id().unwrap());
            surfaces.insert(view.instance().unwrap().surface_id().unwrap());
            assert_eq!(container.len(), 1);

            view.unmount();
            assert_eq!(view.state(), LifecycleState::Disposed);
            assert!(container.is_empty());
        }

        assert_eq!(instances.len(), 3);
        assert_eq!(surfaces.len(), 3);
        assert_eq!(view.mount_count(), 3);
    }

    #[tokio::test]
    async fn failed_bootstrap_blocks_provisioning() {
        let bootstrap = Arc::new(Bootstrap::new());
        assert!(bootstrap.initialize(&BrokenModule).await.is_err());

        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let ctor = SyncConstructor::new(move |surface: HeadlessSurface| -> Result<NullEngine<HeadlessSurface>, BindingError> {
            c.set(c.get() + 1);
            NullEngine::new(surface)
        });
        let container = HeadlessContainer::new();
        let mut view = CanvasView::with_config(HostConfig::default(), ctor, bootstrap).unwrap();

        assert!(matches!(view.mount(Some(&container)), Err(HostError::NotInitialized)));
        assert!(container.is_empty());
        assert_eq!(calls.get(), 0);
        assert_eq!(view.state(), LifecycleState::Idle);
        assert_eq!(view.mount_count(), 0);
    }

    #[tokio::test]
    async fn mount_without_container_is_rejected() {
        let mut view = null_view(ready_bootstrap().await);
        assert!(matches!(view.mount::<HeadlessContainer>(None), Err(HostError::NoContainer)));
        assert!(view.instance().is_none());
    }

    #[tokio::test]
    async fn mount_while_live_is_rejected() {
        let container = HeadlessContainer::new();
        let mut view = null_view(ready_bootstrap().await);

        view.mount(Some(&container)).unwrap();
        let id = view.instance_id();
        assert!(matches!(view.mount(Some(&container)), Err(HostError::InvalidState(LifecycleState::Ready))));
        assert_eq!(view.instance_id(), id);
        assert_eq!(container.len(), 1);
    }

    #[tokio::test]
    async fn configured_sizes_reach_the_surface() {
        let config = HostConfig::builder().display_size(320, 240).backing_size(640, 480).build().unwrap();
        let container = HeadlessContainer::new();
        let mut view = CanvasView::with_config(
            config,
            NullEngine::<HeadlessSurface>::constructor(),
            ready_bootstrap().await,
        )
        .unwrap();

        view.mount(Some(&container)).unwrap();
        let surface = container.surfaces()[0].clone();
        assert_eq!(surface.display_size(), view.display_size());
        assert_eq!(surface.backing_size(), view.backing_size());
        assert_eq!(view.instance().unwrap().with_engine(|e| e.target_size()), Some(PixelSize::new(640, 480)));
    }

    #[tokio::test(start_paused = true)]
    async fn remount_after_abandoned_handshake() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let container = HeadlessContainer::new();
                let mut view = CanvasView::with_config(
                    HostConfig::default(),
                    NullEngine::<HeadlessSurface>::factory(Duration::from_millis(50)),
                    ready_bootstrap().await,
                )
                .unwrap();
                let mut events = view.subscribe_events();

                let Mounted::Pending(first) = view.mount(Some(&container)).unwrap() else {
                    panic!("expected pending mount");
                };
                view.unmount();
                assert_eq!(view.state(), LifecycleState::Abandoned);

                let second = view.mount(Some(&container)).unwrap();
                assert!(matches!(first.wait().await, Err(HostError::Abandoned)));
                second.ready().await.unwrap();

                assert_eq!(view.state(), LifecycleState::Ready);
                assert_eq!(container.len(), 1);
                assert_eq!(view.mount_count(), 2);

                let mut late = 0;
                while let Ok(event) = events.try_recv() {
                    if matches!(event, HostEvent::EngineDisposed { deferred: true, .. }) {
                        late += 1;
                    }
                }
                assert_eq!(late, 1);
            })
            .await;
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let config = HostConfig { event_capacity: 0, ..HostConfig::default() };
        let res = CanvasView::with_config(config, NullEngine::<HeadlessSurface>::constructor(), Arc::new(Bootstrap::new()));
        assert!(matches!(res, Err(HostError::Config(ConfigError::ZeroEventCapacity))));
    }

    #[test]
    fn every_sync_cycle_disposes_its_engine_once() {
        let journal = Journal::default();
        let container = HeadlessContainer::new();
        let mut view = CanvasView::with_config(HostConfig::default(), recording_constructor(&journal), initialized()).unwrap();

        for cycle in 1..=4 {
            view.mount(Some(&container)).unwrap();
            assert_eq!(journal.disposes(), cycle - 1);
            view.unmount();
            assert_eq!(journal.constructs(), cycle);
            assert_eq!(journal.disposes(), cycle);
        }
        drop(view);

        assert_eq!(journal.constructs(), 4);
        assert_eq!(journal.renders(), 4);
        assert_eq!(journal.disposes(), 4);
        assert!(container.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn every_async_cycle_disposes_its_engine_once() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let journal = Journal::default();
                let container = HeadlessContainer::new();
                let mut view = CanvasView::with_config(
                    HostConfig::default(),
                    recording_factory(&journal, Duration::from_millis(50)),
                    initialized(),
                )
                .unwrap();

                // Two completed handshakes around one abandoned mid-way.
                view.mount(Some(&container)).unwrap().ready().await.unwrap();
                view.unmount();

                let Mounted::Pending(abandoned) = view.mount(Some(&container)).unwrap() else {
                    panic!("expected pending mount");
                };
                tokio::time::sleep(Duration::from_millis(20)).await;
                view.unmount();
                assert!(container.is_empty());
                assert!(matches!(abandoned.wait().await, Err(HostError::Abandoned)));

                view.mount(Some(&container)).unwrap().ready().await.unwrap();
                view.unmount();

                assert_eq!(journal.constructs(), 3);
                assert_eq!(journal.disposes(), 3);
                assert_eq!(journal.renders(), 2);
                assert_eq!(view.mount_count(), 3);
                assert!(container.is_empty());
            })
            .await;
    }
}
