//! Ghost-cell synchronization between neighbouring blocks.
//!
//! [`HaloExchanger`] combines three things fixed at setup: the neighbour
//! ranks, the slice descriptors for each side of the local grid, and the
//! [`ExchangePlan`] ordering. [`HaloExchanger::exchange`] then walks the plan
//! with blocking sends and receives.
//!
//! Chain blocks exchange whole padded rows (`cols + 2` values). Grid blocks
//! exchange the interior row segment (`cols` values) up/down and the
//! interior column (`rows` values, strided by the pitch) left/right.

use crate::algs::communicator::{Communicator, tags};
use crate::algs::exchange_plan::{ExchangePlan, Step};
use crate::data::layout::HaloDescriptor;
use crate::data::local_grid::LocalGrid;
use crate::partitioning::Decomposition;
use crate::solver_error::SolverError;
use crate::topology::cartesian::{Direction, Neighbors};
use crate::topology::context::ProcessContext;

/// Which cells leave and which cells arrive on one side of the block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SideLayout {
    /// Interior boundary packed and sent towards this side.
    pub send: HaloDescriptor,
    /// Ghost cells filled from this side.
    pub recv: HaloDescriptor,
}

/// Descriptors for all four sides of a `rows × cols` padded block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HaloLayout {
    pub up: SideLayout,
    pub down: SideLayout,
    pub left: SideLayout,
    pub right: SideLayout,
}

impl HaloLayout {
    /// Full padded rows up/down; columns are never exchanged in a chain but
    /// are still described for completeness.
    pub fn chain(rows: usize, cols: usize) -> Self {
        let p = cols + 2;
        Self {
            up: SideLayout {
                send: HaloDescriptor::contiguous(p, p),
                recv: HaloDescriptor::contiguous(0, p),
            },
            down: SideLayout {
                send: HaloDescriptor::contiguous(rows * p, p),
                recv: HaloDescriptor::contiguous((rows + 1) * p, p),
            },
            ..Self::grid(rows, cols)
        }
    }

    /// Interior row segments up/down, strided interior columns left/right.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let p = cols + 2;
        Self {
            up: SideLayout {
                send: HaloDescriptor::contiguous(p + 1, cols),
                recv: HaloDescriptor::contiguous(1, cols),
            },
            down: SideLayout {
                send: HaloDescriptor::contiguous(rows * p + 1, cols),
                recv: HaloDescriptor::contiguous((rows + 1) * p + 1, cols),
            },
            left: SideLayout {
                send: HaloDescriptor::strided(p + 1, rows, p),
                recv: HaloDescriptor::strided(p, rows, p),
            },
            right: SideLayout {
                send: HaloDescriptor::strided(p + cols, rows, p),
                recv: HaloDescriptor::strided(p + cols + 1, rows, p),
            },
        }
    }

    pub fn side(&self, dir: Direction) -> &SideLayout {
        match dir {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }

    fn check(&self, len: usize) -> Result<(), SolverError> {
        for dir in Direction::ALL {
            let s = self.side(dir);
            s.send.check(len)?;
            s.recv.check(len)?;
        }
        Ok(())
    }
}

/// Per-process halo exchange, built once and reused every iteration.
#[derive(Clone, Debug)]
pub struct HaloExchanger {
    shape: (usize, usize),
    neighbors: Neighbors,
    layout: HaloLayout,
    plan: ExchangePlan,
}

impl HaloExchanger {
    /// Build the exchanger for the process described by `ctx`, owning a
    /// `local.0 × local.1` block.
    pub fn new(ctx: &ProcessContext, local: (usize, usize)) -> Result<Self, SolverError> {
        let topology = ctx.topology()?;
        let neighbors = topology.neighbors(ctx.rank())?;
        let (rows, cols) = local;
        let (layout, plan) = match ctx.decomposition() {
            Decomposition::Chain => (
                HaloLayout::chain(rows, cols),
                ExchangePlan::chain(&neighbors, ctx.rank()),
            ),
            Decomposition::Grid => (
                HaloLayout::grid(rows, cols),
                ExchangePlan::grid(&neighbors, ctx.coords()),
            ),
        };
        layout.check((rows + 2) * (cols + 2))?;
        log::debug!(
            "rank {}: neighbours {:?}, roles {:?}",
            ctx.rank(),
            neighbors,
            plan.phases.iter().map(|p| (p.axis, p.role)).collect::<Vec<_>>()
        );
        Ok(Self {
            shape: local,
            neighbors,
            layout,
            plan,
        })
    }

    #[inline]
    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    #[inline]
    pub fn plan(&self) -> &ExchangePlan {
        &self.plan
    }

    #[inline]
    pub fn layout(&self) -> &HaloLayout {
        &self.layout
    }

    /// Bring every ghost cell of `grid` in line with the neighbouring
    /// interiors. Sides without a neighbour are left untouched and keep the
    /// zero boundary condition.
    pub fn exchange<C: Communicator>(
        &self,
        grid: &mut LocalGrid,
        comm: &C,
    ) -> Result<(), SolverError> {
        if grid.shape() != self.shape {
            return Err(SolverError::ShapeMismatch {
                expected: self.shape,
                got: grid.shape(),
            });
        }
        for (axis, step) in self.plan.steps() {
            let tag = tags::HALO.offset(axis as u16).base();
            match step {
                Step::Send(dir) => {
                    let peer = self.peer(dir)?;
                    let values = self.layout.side(dir).send.pack(grid.as_slice());
                    log::trace!("rank {}: send {dir:?} -> {peer} ({} values)", comm.rank(), values.len());
                    comm.send_f64(peer, tag, &values)?;
                }
                Step::Recv(dir) => {
                    let peer = self.peer(dir)?;
                    let desc = self.layout.side(dir).recv;
                    let mut values = vec![0.0; desc.count];
                    let got = comm.recv_f64(peer, tag, &mut values)?;
                    if got != desc.count {
                        return Err(SolverError::ShapeMismatch {
                            expected: (desc.count, 1),
                            got: (got, 1),
                        });
                    }
                    log::trace!("rank {}: recv {dir:?} <- {peer}", comm.rank());
                    desc.unpack(grid.as_mut_slice(), &values);
                }
            }
        }
        Ok(())
    }

    fn peer(&self, dir: Direction) -> Result<usize, SolverError> {
        self.neighbors.get(dir).ok_or_else(|| {
            SolverError::InvalidDescriptor(format!("exchange step towards {dir:?} without a neighbour"))
        })
    }
}
