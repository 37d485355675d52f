//! Coroutine execution contexts.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::function::Function;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineStatus {
    Suspended,
    Running,
    Dead,
}

struct CoroutineInner {
    function: Function,
    status: Cell<CoroutineStatus>,
}

/// A cooperative sub-thread.
///
/// Resuming runs the body through [`CallContext::resume`], which marks the
/// nested context as [`ExecutionState::InCoroutine`]. Scheduling (yield) is
/// owned by the interpreter proper; here a body runs to completion.
///
/// [`CallContext::resume`]: crate::CallContext::resume
/// [`ExecutionState::InCoroutine`]: crate::ExecutionState::InCoroutine
#[derive(Clone)]
pub struct Coroutine(Rc<CoroutineInner>);

impl Coroutine {
    pub(crate) fn new(function: Function) -> Self {
        Self(Rc::new(CoroutineInner {
            function,
            status: Cell::new(CoroutineStatus::Suspended),
        }))
    }

    pub fn status(&self) -> CoroutineStatus {
        self.0.status.get()
    }

    pub fn function(&self) -> &Function {
        &self.0.function
    }

    pub(crate) fn set_status(&self, status: CoroutineStatus) {
        self.0.status.set(status);
    }
}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("function", &self.0.function.name())
            .field("status", &self.status())
            .finish()
    }
}
