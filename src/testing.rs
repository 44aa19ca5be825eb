//! Recording engines shared by the unit tests.

use crate::bootstrap::{Bootstrap, StaticModule};
use crate::engine::{AsyncFactory, EngineConstructor, SyncConstructor};
use crate::errors::BindingError;
use crate::render::RenderEngine;
use crate::surface::headless::HeadlessSurface;
use crate::surface::{DrawingSurface, SurfaceId};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// What happened to recording engines, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Construct(SurfaceId),
    Render(SurfaceId),
    /// Surface id and whether it was still attached at dispose time
    Dispose(SurfaceId, bool),
}

#[derive(Default, Clone)]
pub(crate) struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    pub(crate) fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }
    fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| f(c)).count()
    }
    pub(crate) fn constructs(&self) -> usize {
        self.count(|c| matches!(c, Call::Construct(_)))
    }
    pub(crate) fn renders(&self) -> usize {
        self.count(|c| matches!(c, Call::Render(_)))
    }
    pub(crate) fn disposes(&self) -> usize {
        self.count(|c| matches!(c, Call::Dispose(..)))
    }
}

/// Callback run from inside `render` and `dispose`. Filled in after the
/// engine's owner exists.
pub(crate) type Hook = Rc<RefCell<Option<Box<dyn Fn()>>>>;

pub(crate) struct Recording {
    pub(crate) surface: HeadlessSurface,
    pub(crate) journal: Journal,
    pub(crate) fail_render: bool,
    pub(crate) hook: Option<Hook>,
}

impl Recording {
    pub(crate) fn new(surface: HeadlessSurface, journal: Journal) -> Self {
        journal.push(Call::Construct(surface.id()));
        Self { surface, journal, fail_render: false, hook: None }
    }

    fn run_hook(&self) {
        if let Some(hook) = &self.hook {
            if let Some(f) = hook.borrow().as_ref() {
                f();
            }
        }
    }
}

impl RenderEngine for Recording {
    fn name(&self) -> &str {
        "recording"
    }
    fn render(&mut self) -> anyhow::Result<()> {
        self.journal.push(Call::Render(self.surface.id()));
        self.run_hook();
        if self.fail_render {
            anyhow::bail!("context lost");
        }
        Ok(())
    }
    fn dispose(&mut self) {
        self.journal.push(Call::Dispose(self.surface.id(), self.surface.is_attached()));
        self.run_hook();
    }
}

pub(crate) fn recording_constructor(journal: &Journal) -> impl EngineConstructor<HeadlessSurface, Engine = Recording> {
    let journal = journal.clone();
    SyncConstructor::new(move |surface: HeadlessSurface| -> Result<Recording, BindingError> {
        Ok(Recording::new(surface, journal.clone()))
    })
}

pub(crate) fn recording_factory(
    journal: &Journal,
    delay: Duration,
) -> impl EngineConstructor<HeadlessSurface, Engine = Recording> {
    let journal = journal.clone();
    AsyncFactory::new(move |surface: HeadlessSurface| {
        let journal = journal.clone();
        async move {
            tokio::time::sleep(delay).await;
            Ok::<_, BindingError>(Recording::new(surface, journal))
        }
    })
}

/// A bootstrap that has already loaded the static module.
pub(crate) fn initialized() -> Arc<Bootstrap> {
    let bootstrap = Bootstrap::new();
    futures::executor::block_on(bootstrap.initialize(&StaticModule::new())).unwrap();
    Arc::new(bootstrap)
}
