use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, WorldError>;

/// Failures surfaced by [`crate::world::World`].
///
/// Spheres leaving the domain are not errors; they are flagged and cleaned up
/// during the step.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A sphere or brick was requested by an index not currently present.
    #[error("requested {kind} {index} outside of range (len {len})")]
    OutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// Propagated I/O errors from save/load.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Propagated bincode encode/decode errors from save/load.
    #[error("world encoding failed: {0}")]
    Encode(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_kind_and_index() {
        let e = WorldError::OutOfRange { kind: "sphere", index: 3, len: 3 };
        let msg = e.to_string();
        assert!(msg.contains("sphere 3"));
        assert!(msg.contains("len 3"));
    }
}
