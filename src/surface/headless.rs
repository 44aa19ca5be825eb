//! In-memory UI host.
//!
//! [`HeadlessContainer`] and [`HeadlessSurface`] behave like a DOM node and a
//! canvas element without a browser: surfaces keep their sizes, know whether
//! they are attached, and detach themselves from their parent on
//! [`remove`](DrawingSurface::remove). Used by tests, the demo and
//! server-side hosts.

use super::{Container, DrawingSurface, LogicalSize, PixelSize, SurfaceId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Size of a freshly created canvas before anything is configured.
const INITIAL_SIZE: (u32, u32) = (300, 150);

type Children = Rc<RefCell<Vec<HeadlessSurface>>>;

/// A container node holding surfaces in insertion order.
#[derive(Clone, Default)]
pub struct HeadlessContainer {
    children: Children,
}

impl HeadlessContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached surfaces.
    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    pub fn contains(&self, surface: &HeadlessSurface) -> bool {
        self.children.borrow().iter().any(|s| s.id == surface.id)
    }

    /// Snapshot of the attached surfaces.
    pub fn surfaces(&self) -> Vec<HeadlessSurface> {
        self.children.borrow().clone()
    }
}

impl fmt::Debug for HeadlessContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessContainer")
            .field("children", &self.len())
            .finish()
    }
}

impl Container for HeadlessContainer {
    type Surface = HeadlessSurface;

    fn create_surface(&self) -> HeadlessSurface {
        HeadlessSurface::new()
    }

    fn append(&self, surface: &HeadlessSurface) {
        // An element has a single parent; re-appending moves it.
        surface.remove();
        surface.state.borrow_mut().parent = Some(Rc::downgrade(&self.children));
        self.children.borrow_mut().push(surface.clone());
    }
}

struct SurfaceState {
    backing: PixelSize,
    display: LogicalSize,
    parent: Option<Weak<RefCell<Vec<HeadlessSurface>>>>,
}

/// A canvas-like element. Clones share state.
#[derive(Clone)]
pub struct HeadlessSurface {
    id: SurfaceId,
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        let (width, height) = INITIAL_SIZE;
        Self {
            id: SurfaceId::new(),
            state: Rc::new(RefCell::new(SurfaceState {
                backing: PixelSize::new(width, height),
                display: LogicalSize::new(width, height),
                parent: None,
            })),
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessSurface")
            .field("id", &self.id)
            .field("backing", &state.backing)
            .field("display", &state.display)
            .field("attached", &state.parent.is_some())
            .finish()
    }
}

impl DrawingSurface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn set_backing_size(&self, size: PixelSize) {
        self.state.borrow_mut().backing = size;
    }

    fn backing_size(&self) -> PixelSize {
        self.state.borrow().backing
    }

    fn set_display_size(&self, size: LogicalSize) {
        self.state.borrow_mut().display = size;
    }

    fn display_size(&self) -> LogicalSize {
        self.state.borrow().display
    }

    fn is_attached(&self) -> bool {
        self.state
            .borrow()
            .parent
            .as_ref()
            .is_some_and(|parent| parent.strong_count() > 0)
    }

    fn remove(&self) {
        let parent = self.state.borrow_mut().parent.take();
        if let Some(children) = parent.and_then(|p| p.upgrade()) {
            children.borrow_mut().retain(|s| s.id != self.id);
        }
    }
}
