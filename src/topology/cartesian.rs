//! Non-periodic Cartesian process topology.
//!
//! Ranks are laid out row-major over `dims = [d0, d1]`: rank `r` sits at
//! `[r / d1, r % d1]`. Axis 0 runs up/down (rows of the field), axis 1
//! left/right (columns). A chain is the special case `dims = [P, 1]`, where
//! "previous" is up and "next" is down.

use crate::partitioning::{Decomposition, Partition, dims_create};
use crate::solver_error::SolverError;

/// A side of a local block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Axis this direction moves along.
    #[inline]
    pub const fn axis(self) -> usize {
        match self {
            Direction::Up | Direction::Down => 0,
            Direction::Left | Direction::Right => 1,
        }
    }

    /// Lower-coordinate side of `axis`.
    #[inline]
    pub const fn previous(axis: usize) -> Self {
        if axis == 0 { Direction::Up } else { Direction::Left }
    }

    /// Higher-coordinate side of `axis`.
    #[inline]
    pub const fn next(axis: usize) -> Self {
        if axis == 0 { Direction::Down } else { Direction::Right }
    }
}

/// Neighbour ranks of one process; `None` means a domain edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub up: Option<usize>,
    pub down: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Neighbors {
    #[inline]
    pub fn get(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Chain predecessor.
    #[inline]
    pub fn previous(&self) -> Option<usize> {
        self.up
    }

    /// Chain successor.
    #[inline]
    pub fn next(&self) -> Option<usize> {
        self.down
    }

    pub fn count(&self) -> usize {
        Direction::ALL.iter().filter(|&&d| self.get(d).is_some()).count()
    }
}

/// Process arrangement shared by every rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcessTopology {
    dims: [usize; 2],
}

impl ProcessTopology {
    pub fn new(dims: [usize; 2]) -> Result<Self, SolverError> {
        if dims[0] == 0 || dims[1] == 0 {
            return Err(SolverError::InvalidProcessCount);
        }
        Ok(Self { dims })
    }

    /// Ranks `0..size` in a line.
    pub fn chain(size: usize) -> Result<Self, SolverError> {
        Self::new([size, 1])
    }

    /// Balanced 2D arrangement of `size` ranks.
    pub fn grid(size: usize) -> Result<Self, SolverError> {
        if size == 0 {
            return Err(SolverError::InvalidProcessCount);
        }
        Self::new(dims_create(size))
    }

    pub fn for_decomposition(decomposition: Decomposition, size: usize) -> Result<Self, SolverError> {
        match decomposition {
            Decomposition::Chain => Self::chain(size),
            Decomposition::Grid => Self::grid(size),
        }
    }

    pub fn from_partition(partition: &Partition) -> Result<Self, SolverError> {
        Self::new(partition.dims)
    }

    #[inline]
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    pub fn coords(&self, rank: usize) -> Result<[usize; 2], SolverError> {
        if rank >= self.size() {
            return Err(SolverError::RankOutOfRange {
                rank,
                size: self.size(),
            });
        }
        Ok([rank / self.dims[1], rank % self.dims[1]])
    }

    /// Rank at signed coordinates, `None` outside the (non-periodic) grid.
    pub fn rank_of(&self, coords: [isize; 2]) -> Option<usize> {
        let [c0, c1] = coords;
        if c0 < 0 || c1 < 0 {
            return None;
        }
        let (c0, c1) = (c0 as usize, c1 as usize);
        (c0 < self.dims[0] && c1 < self.dims[1]).then(|| c0 * self.dims[1] + c1)
    }

    /// `(source, dest)` for a shift of `disp` along `axis`: the ranks at
    /// `coord - disp` and `coord + disp`. Edges yield `None`.
    pub fn shift(
        &self,
        rank: usize,
        axis: usize,
        disp: isize,
    ) -> Result<(Option<usize>, Option<usize>), SolverError> {
        let c = self.coords(rank)?;
        let at = |delta: isize| {
            let mut sc = [c[0] as isize, c[1] as isize];
            sc[axis] += delta;
            self.rank_of(sc)
        };
        Ok((at(-disp), at(disp)))
    }

    pub fn neighbors(&self, rank: usize) -> Result<Neighbors, SolverError> {
        let (up, down) = self.shift(rank, 0, 1)?;
        let (left, right) = self.shift(rank, 1, 1)?;
        Ok(Neighbors {
            up,
            down,
            left,
            right,
        })
    }
}
