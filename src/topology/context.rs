//! ProcessContext: who this process is within the group.
//!
//! Built once at startup and handed to every component explicitly.

use crate::algs::communicator::Communicator;
use crate::partitioning::Decomposition;
use crate::solver_error::SolverError;
use crate::topology::cartesian::ProcessTopology;

/// Position of a process on the Cartesian grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CartesianLayout {
    pub dims: [usize; 2],
    pub coords: [usize; 2],
}

/// Immutable identity of one process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcessContext {
    rank: usize,
    size: usize,
    layout: Option<CartesianLayout>,
}

impl ProcessContext {
    /// Rank that collects diagnostics and the assembled solution.
    pub const COORDINATOR: usize = 0;

    pub fn chain(rank: usize, size: usize) -> Result<Self, SolverError> {
        ProcessTopology::chain(size)?.coords(rank)?;
        Ok(Self {
            rank,
            size,
            layout: None,
        })
    }

    pub fn grid(rank: usize, topology: &ProcessTopology) -> Result<Self, SolverError> {
        let coords = topology.coords(rank)?;
        Ok(Self {
            rank,
            size: topology.size(),
            layout: Some(CartesianLayout {
                dims: topology.dims(),
                coords,
            }),
        })
    }

    /// Context for the calling process of `comm`.
    pub fn from_comm<C: Communicator>(
        comm: &C,
        decomposition: Decomposition,
    ) -> Result<Self, SolverError> {
        match decomposition {
            Decomposition::Chain => Self::chain(comm.rank(), comm.size()),
            Decomposition::Grid => Self::grid(comm.rank(), &ProcessTopology::grid(comm.size())?),
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn layout(&self) -> Option<&CartesianLayout> {
        self.layout.as_ref()
    }

    pub fn decomposition(&self) -> Decomposition {
        match self.layout {
            Some(_) => Decomposition::Grid,
            None => Decomposition::Chain,
        }
    }

    /// Process coordinates; a chain process sits at `[rank, 0]`.
    pub fn coords(&self) -> [usize; 2] {
        match self.layout {
            Some(l) => l.coords,
            None => [self.rank, 0],
        }
    }

    /// Process counts per axis; a chain is `[size, 1]`.
    pub fn dims(&self) -> [usize; 2] {
        match self.layout {
            Some(l) => l.dims,
            None => [self.size, 1],
        }
    }

    pub fn topology(&self) -> Result<ProcessTopology, SolverError> {
        ProcessTopology::new(self.dims())
    }

    #[inline]
    pub fn is_coordinator(&self) -> bool {
        self.rank == Self::COORDINATOR
    }
}
