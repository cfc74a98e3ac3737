use thiserror::Error;

/// Failure modes of the choreography core.
///
/// Everything else in this crate is either static data that was validated at
/// load time or application-level wiring, which reports through
/// [`anyhow::Error`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShowcaseError {
    /// A camera transition was requested before a rig was attached.
    ///
    /// The request is dropped, not retried; the caller is expected to attach
    /// the rig before issuing transitions.
    #[error("camera rig is not attached; transition dropped")]
    RigNotReady,

    /// A selection named a slide outside the catalog.
    #[error("slide index {index} is out of range ({len} items in showcase)")]
    OutOfRangeIndex { index: usize, len: usize },
}
