//! Downstream consumers of forwarded changes.

use crate::change::ChangeEvent;
use tabulon_core::Result;

/// Receives every change a node forwards.
///
/// An error returned by a sink aborts processing of the current event and
/// is returned unchanged to the caller of `process`.
pub trait ChangeSink: Send {
    fn on_change(&mut self, event: &ChangeEvent) -> Result<()>;
}

impl<F> ChangeSink for F
where
    F: FnMut(&ChangeEvent) -> Result<()> + Send,
{
    #[inline]
    fn on_change(&mut self, event: &ChangeEvent) -> Result<()> {
        self(event)
    }
}

/// Boxed sink as stored by a topology.
pub type BoxedSink = Box<dyn ChangeSink>;
