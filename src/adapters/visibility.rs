//! Foreground/background signal adapter.

use core::cell::Cell;

use crate::app::ports::VisibilityPort;

/// Visibility flag set by the host.  Interior mutability lets a consumer
/// task flip it while the detection loop holds a shared reference.
#[derive(Debug)]
pub struct StaticVisibility {
    foreground: Cell<bool>,
}

impl StaticVisibility {
    pub fn new(foreground: bool) -> Self {
        Self {
            foreground: Cell::new(foreground),
        }
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.set(foreground);
    }
}

impl Default for StaticVisibility {
    fn default() -> Self {
        Self::new(true)
    }
}

impl VisibilityPort for StaticVisibility {
    fn is_foreground(&self) -> bool {
        self.foreground.get()
    }
}
