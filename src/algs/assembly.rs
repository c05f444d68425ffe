//! Reassembly of the distributed solution on the coordinator.
//!
//! Chain: every other rank sends its strip of padded rows (`n · (M + 2)`
//! values) point-to-point; the coordinator strips the ghost columns and
//! stacks the strips in rank order.
//!
//! Grid: every rank packs its `n × m` interior block and the blocks are
//! collected with a gather; the coordinator places each block at the global
//! offset given by its process coordinates.

use crate::algs::communicator::{Communicator, tags};
use crate::data::global_grid::GlobalGrid;
use crate::data::layout::BlockDescriptor;
use crate::data::local_grid::LocalGrid;
use crate::partitioning::{Decomposition, Partition};
use crate::solver_error::SolverError;
use crate::topology::cartesian::ProcessTopology;
use crate::topology::context::ProcessContext;

#[derive(Clone, Debug)]
pub struct ResultAssembler {
    partition: Partition,
    topology: ProcessTopology,
}

impl ResultAssembler {
    pub fn new(partition: Partition) -> Result<Self, SolverError> {
        Ok(Self {
            topology: ProcessTopology::from_partition(&partition)?,
            partition,
        })
    }

    /// Collective: every rank must call it. The coordinator gets
    /// `Some(global)`; every other rank gets `None`. Global points no process
    /// owns (division remainders) stay 0.
    pub fn assemble<C: Communicator>(
        &self,
        x: &LocalGrid,
        comm: &C,
    ) -> Result<Option<GlobalGrid>, SolverError> {
        if x.shape() != self.partition.local {
            return Err(SolverError::ShapeMismatch {
                expected: self.partition.local,
                got: x.shape(),
            });
        }
        if comm.size() != self.topology.size() {
            return Err(SolverError::RankOutOfRange {
                rank: comm.rank(),
                size: self.topology.size(),
            });
        }
        match self.partition.decomposition {
            Decomposition::Chain => self.gather_strips(x, comm),
            Decomposition::Grid => self.gather_blocks(x, comm),
        }
    }

    fn gather_strips<C: Communicator>(
        &self,
        x: &LocalGrid,
        comm: &C,
    ) -> Result<Option<GlobalGrid>, SolverError> {
        let (n, m) = self.partition.local;
        let (gn, gm) = self.partition.global;
        let p = x.pitch();
        let strip = &x.as_slice()[p..(n + 1) * p];
        let tag = tags::GATHER.base();
        let root = ProcessContext::COORDINATOR;

        if comm.rank() != root {
            comm.send_f64(root, tag, strip)?;
            return Ok(None);
        }

        let mut global = GlobalGrid::try_new(gn, gm)?;
        let interior = BlockDescriptor::new(1, n, m, p);
        let mut buf = vec![0.0; strip.len()];
        for rank in 0..comm.size() {
            let src: &[f64] = if rank == root {
                strip
            } else {
                let got = comm.recv_f64(rank, tag, &mut buf)?;
                if got != strip.len() {
                    return Err(SolverError::ShapeMismatch {
                        expected: (n, p),
                        got: (got / p, got % p),
                    });
                }
                &buf
            };
            let dst = BlockDescriptor::new(rank * n * gm, n, m, gm);
            dst.check(global.as_slice().len())?;
            interior.copy_to(src, &dst, global.as_mut_slice());
        }
        Ok(Some(global))
    }

    fn gather_blocks<C: Communicator>(
        &self,
        x: &LocalGrid,
        comm: &C,
    ) -> Result<Option<GlobalGrid>, SolverError> {
        let (n, m) = self.partition.local;
        let (gn, gm) = self.partition.global;
        let block = BlockDescriptor::new(x.pitch() + 1, n, m, x.pitch()).pack(x.as_slice());

        let Some(gathered) = comm.gather_f64(ProcessContext::COORDINATOR, &block)? else {
            return Ok(None);
        };

        let mut global = GlobalGrid::try_new(gn, gm)?;
        for rank in 0..comm.size() {
            let (r0, c0) = self.partition.global_origin(self.topology.coords(rank)?);
            let src = BlockDescriptor::new(rank * n * m, n, m, m);
            let dst = BlockDescriptor::new(r0 * gm + c0, n, m, gm);
            dst.check(global.as_slice().len())?;
            src.copy_to(&gathered, &dst, global.as_mut_slice());
        }
        Ok(Some(global))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, ThreadComm, run_world};

    #[test]
    fn single_process_copies_interior() {
        let part = Partition::new(2, 3, 1, Decomposition::Chain).unwrap();
        let x = LocalGrid::from_fn(2, 3, |i, j| (10 * i + j) as f64);
        let g = ResultAssembler::new(part)
            .unwrap()
            .assemble(&x, &NoComm)
            .unwrap()
            .unwrap();
        assert_eq!(g.as_slice(), &[11.0, 12.0, 13.0, 21.0, 22.0, 23.0]);
    }

    #[test]
    fn grid_blocks_land_at_their_coordinates() {
        let part = Partition::new(4, 4, 4, Decomposition::Grid).unwrap();
        let out = run_world(ThreadComm::world(4), |comm| {
            let x = LocalGrid::from_fn(2, 2, |_, _| comm.rank() as f64);
            ResultAssembler::new(part).unwrap().assemble(&x, &comm).unwrap()
        });
        assert!(out[1..].iter().all(Option::is_none));
        let g = out[0].as_ref().unwrap();
        #[rustfmt::skip]
        let want = [
            0.0, 0.0, 1.0, 1.0,
            0.0, 0.0, 1.0, 1.0,
            2.0, 2.0, 3.0, 3.0,
            2.0, 2.0, 3.0, 3.0,
        ];
        assert_eq!(g.as_slice(), &want);
    }

    #[test]
    fn short_strip_is_rejected() {
        let part = Partition::new(4, 2, 2, Decomposition::Chain).unwrap();
        let out = run_world(ThreadComm::world(2), |comm| {
            if comm.rank() == 0 {
                let x = LocalGrid::new(2, 2);
                ResultAssembler::new(part).unwrap().assemble(&x, &comm).map(|_| ())
            } else {
                // One padded row instead of the two the coordinator expects.
                comm.send_f64(0, tags::GATHER.base(), &[1.0; 4]).map_err(SolverError::from)
            }
        });
        assert!(out[1].is_ok());
        assert_eq!(
            out[0],
            Err(SolverError::ShapeMismatch {
                expected: (2, 4),
                got: (1, 0)
            })
        );
    }

    #[test]
    fn chain_remainder_rows_stay_zero() {
        let part = Partition::new(5, 2, 2, Decomposition::Chain).unwrap();
        let out = run_world(ThreadComm::world(2), |comm| {
            let x = LocalGrid::from_fn(2, 2, |i, _| (comm.rank() * 2 + i) as f64);
            ResultAssembler::new(part).unwrap().assemble(&x, &comm).unwrap()
        });
        let g = out[0].as_ref().unwrap();
        assert_eq!(g.rows(), 5);
        assert_eq!(
            g.as_slice(),
            &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 0.0, 0.0]
        );
    }
}
