//! SolverError / CommError: unified error types for poisson-halo public APIs.
//!
//! Every fallible operation in the crate returns one of these, so liveness
//! and configuration failures surface as values instead of hangs or aborts.

use thiserror::Error;

/// Failures of the message-passing substrate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Point-to-point traffic requested on a communicator with no peers.
    #[error("rank {rank} has no peer {peer} (single-process communicator)")]
    NoPeer { rank: usize, peer: usize },
    /// Peer index outside the process group.
    #[error("peer {peer} out of range for a group of {size} ranks")]
    RankOutOfRange { peer: usize, size: usize },
    /// A message arrived with a different tag than the one expected.
    #[error("rank {rank} expected tag {expected:#06x} from {peer}, got {got:#06x}")]
    TagMismatch {
        rank: usize,
        peer: usize,
        expected: u16,
        got: u16,
    },
    /// Incoming message is larger than the receive buffer.
    #[error("message of {got} bytes from {peer} does not fit a {capacity}-byte buffer")]
    Truncated {
        peer: usize,
        got: usize,
        capacity: usize,
    },
    /// The partner never reached the matching call within the deadline.
    #[error("rank {rank} stalled in {op} with peer {peer} (tag {tag:#06x}); exchange ordering is not live")]
    Stalled {
        op: &'static str,
        rank: usize,
        peer: usize,
        tag: u16,
    },
    /// The channel to a peer was torn down.
    #[error("link {src} -> {dst} disconnected")]
    Disconnected { src: usize, dst: usize },
    /// The process-group runtime could not be started.
    #[error("communicator initialization failed: {0}")]
    InitFailed(String),
}

/// Unified error type for solver setup and iteration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// A process group needs at least one member.
    #[error("process count must be at least 1")]
    InvalidProcessCount,
    /// Integer division of the global extent left a process with nothing.
    #[error("axis {axis}: {global} interior points over {parts} processes leaves an empty local extent")]
    EmptyPartition {
        axis: usize,
        global: usize,
        parts: usize,
    },
    /// Rank not part of the process group.
    #[error("rank {rank} out of range for {size} processes")]
    RankOutOfRange { rank: usize, size: usize },
    /// Two buffers that must share a shape do not.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// `(row, col)` outside the padded grid.
    #[error("index ({row}, {col}) out of bounds for padded shape {shape:?}")]
    OutOfBounds {
        row: usize,
        col: usize,
        shape: (usize, usize),
    },
    /// Grid storage size overflows or the allocator refused it.
    #[error("cannot allocate storage for a {rows}x{cols} grid")]
    Allocation { rows: usize, cols: usize },
    /// A slice descriptor reaches past the end of its buffer.
    #[error("descriptor {0} exceeds buffer bounds")]
    InvalidDescriptor(String),
    /// Message-passing failure (includes liveness stalls).
    #[error(transparent)]
    Comm(#[from] CommError),
}
