use std::fmt;

/// Fatal failure categories of an alignment run.
///
/// A boundary refinement miss is not listed here: it is a `None` occurrence
/// and the run goes on with a gapped fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsaError {
    /// Invalid or missing run configuration
    Configuration(String),
    /// Input data unreadable or malformed
    InputAccess {
        /// The file that could not be used
        path: String,
        /// A human-readable message explaining the error
        message: String,
    },
    /// Combined sequence length does not fit the coordinate width
    Capacity {
        /// Residues plus one separator per sequence
        required: u64,
        /// Largest addressable coordinate of the chosen width
        limit: u64,
        /// The chosen width in bits
        bits: u32,
    },
    /// The block aligner kept failing on one block
    BlockAlignment {
        /// Index of the block in chain order
        block: usize,
        /// Number of attempts made
        attempts: usize,
        /// The last failure
        reason: String,
    },
    /// Fragments that should share a column count do not
    Integrity(String),
}

impl fmt::Display for MsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsaError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            MsaError::InputAccess { path, message } => {
                write!(f, "Input error in {}: {}", path, message)
            }
            MsaError::Capacity {
                required,
                limit,
                bits,
            } => write!(
                f,
                "Capacity error: input needs {} coordinates but {}-bit coordinates address at most {}. Rerun with --width 64",
                required, bits, limit
            ),
            MsaError::BlockAlignment {
                block,
                attempts,
                reason,
            } => write!(
                f,
                "Block alignment failed for block {} after {} attempt(s): {}",
                block, attempts, reason
            ),
            MsaError::Integrity(msg) => write!(f, "Integrity fault: {}", msg),
        }
    }
}

impl std::error::Error for MsaError {}

impl MsaError {
    pub fn input(path: &str, message: impl Into<String>) -> Self {
        MsaError::InputAccess {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MsaError::input("seqs.fa", "no records");
        assert_eq!(format!("{}", err), "Input error in seqs.fa: no records");

        let err = MsaError::Capacity {
            required: 5_000_000_000,
            limit: u32::MAX as u64,
            bits: 32,
        };
        assert!(format!("{}", err).contains("--width 64"));

        let err = MsaError::BlockAlignment {
            block: 3,
            attempts: 2,
            reason: "exit status 1".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Block alignment failed for block 3 after 2 attempt(s): exit status 1"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = MsaError::Integrity("3 != 4".to_string()).into();
        let err = err.context("concatenating");
        assert_eq!(
            err.downcast_ref::<MsaError>(),
            Some(&MsaError::Integrity("3 != 4".to_string()))
        );
    }
}
