//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Every call is **blocking**: `send` returns once the peer has taken the
//! message and `recv` once it has arrived. [`ThreadComm`] implements the send
//! as a rendezvous, so an exchange ordering that would deadlock under MPI's
//! synchronous mode also stalls here and is reported as
//! [`CommError::Stalled`] instead of hanging.
//!
//! Collectives (`all_reduce_sum`, `gather_f64`) have provided implementations
//! built on point-to-point traffic rooted at rank 0; backends with native
//! collectives override them.

use crate::solver_error::CommError;
use bytemuck::{cast_slice, cast_slice_mut};
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::{Duration, Instant};

/// Message tag with deterministic per-phase offsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    #[inline]
    pub const fn new(base: u16) -> Self {
        Self(base)
    }
    #[inline]
    pub const fn base(self) -> u16 {
        self.0
    }
    #[inline]
    pub const fn offset(self, k: u16) -> Self {
        Self(self.0.wrapping_add(k))
    }
}

/// Tags used by the solver phases. Axis offsets keep the column and row
/// halo phases apart.
pub mod tags {
    use super::CommTag;
    pub const HALO: CommTag = CommTag::new(0x0100);
    pub const REDUCE: CommTag = CommTag::new(0x0200);
    pub const GATHER: CommTag = CommTag::new(0x0300);
}

/// Blocking communication interface.
pub trait Communicator {
    /// This process's rank.
    fn rank(&self) -> usize;
    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Send `buf` to `peer`; returns once the peer has taken it.
    fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), CommError>;

    /// Receive from `peer` into `buf`; returns the number of bytes written.
    fn recv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Result<usize, CommError>;

    fn send_f64(&self, peer: usize, tag: u16, values: &[f64]) -> Result<(), CommError> {
        self.send(peer, tag, cast_slice(values))
    }

    fn recv_f64(&self, peer: usize, tag: u16, values: &mut [f64]) -> Result<usize, CommError> {
        let n = self.recv(peer, tag, cast_slice_mut(values))?;
        Ok(n / std::mem::size_of::<f64>())
    }

    /// Sum a scalar over all ranks. Every rank receives the identical total,
    /// computed once on rank 0 in rank order and broadcast.
    fn all_reduce_sum(&self, local: f64) -> Result<f64, CommError> {
        let tag = tags::REDUCE.base();
        if self.rank() == 0 {
            let mut total = local;
            for peer in 1..self.size() {
                let mut part = [0.0f64];
                self.recv_f64(peer, tag, &mut part)?;
                total += part[0];
            }
            for peer in 1..self.size() {
                self.send_f64(peer, tag, &[total])?;
            }
            Ok(total)
        } else {
            self.send_f64(0, tag, &[local])?;
            let mut total = [0.0f64];
            self.recv_f64(0, tag, &mut total)?;
            Ok(total[0])
        }
    }

    /// Gather equal-length contributions at `root`, concatenated in rank order.
    /// Non-root ranks get `None`.
    fn gather_f64(&self, root: usize, local: &[f64]) -> Result<Option<Vec<f64>>, CommError> {
        let tag = tags::GATHER.base();
        if self.rank() != root {
            self.send_f64(root, tag, local)?;
            return Ok(None);
        }
        let len = local.len();
        let mut out = vec![0.0; len * self.size()];
        for peer in 0..self.size() {
            let dst = &mut out[peer * len..(peer + 1) * len];
            if peer == root {
                dst.copy_from_slice(local);
            } else {
                self.recv_f64(peer, tag, dst)?;
            }
        }
        Ok(Some(out))
    }
}

/// Single-process communicator: rank 0 of 1, no peers.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn send(&self, peer: usize, _tag: u16, _buf: &[u8]) -> Result<(), CommError> {
        Err(CommError::NoPeer { rank: 0, peer })
    }
    fn recv(&self, peer: usize, _tag: u16, _buf: &mut [u8]) -> Result<usize, CommError> {
        Err(CommError::NoPeer { rank: 0, peer })
    }
}

// --- ThreadComm: in-process ranks, one thread each ---

struct Envelope {
    tag: u16,
    payload: Bytes,
}

/// Directed rendezvous channel `src -> dst`.
struct Link {
    tx: SyncSender<Envelope>,
    rx: Mutex<Receiver<Envelope>>,
}

struct Fabric {
    size: usize,
    deadline: Duration,
    links: DashMap<(usize, usize), Arc<Link>>,
}

/// In-process communicator: each rank is driven by its own thread.
///
/// Sends are rendezvous (zero-capacity channels): `send` completes only once
/// the peer is blocked in the matching `recv`. Both directions give up after
/// the fabric deadline with [`CommError::Stalled`].
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    fabric: Arc<Fabric>,
}

static_assertions::assert_impl_all!(ThreadComm: Send, Sync);

impl ThreadComm {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

    /// One communicator per rank, sharing a fabric.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        Self::world_with_deadline(size, Self::DEFAULT_DEADLINE)
    }

    pub fn world_with_deadline(size: usize, deadline: Duration) -> Vec<ThreadComm> {
        let fabric = Arc::new(Fabric {
            size,
            deadline,
            links: DashMap::new(),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                fabric: Arc::clone(&fabric),
            })
            .collect()
    }

    fn link(&self, src: usize, dst: usize) -> Arc<Link> {
        self.fabric
            .links
            .entry((src, dst))
            .or_insert_with(|| {
                let (tx, rx) = mpsc::sync_channel(0);
                Arc::new(Link {
                    tx,
                    rx: Mutex::new(rx),
                })
            })
            .clone()
    }

    fn check_peer(&self, peer: usize) -> Result<(), CommError> {
        if peer >= self.fabric.size {
            return Err(CommError::RankOutOfRange {
                peer,
                size: self.fabric.size,
            });
        }
        Ok(())
    }
}

/// Wait strategy of a sender polling for its receiver: a few yields, then
/// sleeps doubling up to [`Backoff::MAX_SLEEP`].
#[derive(Debug, Default)]
struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 8;
    const MAX_SLEEP: Duration = Duration::from_micros(200);

    /// Sleep for the current step, or `None` while still yielding.
    fn delay(&self) -> Option<Duration> {
        let over = self.step.checked_sub(Self::SPIN_LIMIT)?;
        Some(Duration::from_micros(1u64 << over.min(8)).min(Self::MAX_SLEEP))
    }

    fn snooze(&mut self) {
        match self.delay() {
            None => std::thread::yield_now(),
            Some(d) => std::thread::sleep(d),
        }
        self.step = self.step.saturating_add(1);
    }
}

impl std::fmt::Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("rank", &self.rank)
            .field("size", &self.fabric.size)
            .finish()
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.fabric.size
    }

    fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), CommError> {
        self.check_peer(peer)?;
        let link = self.link(self.rank, peer);
        let start = Instant::now();
        let mut backoff = Backoff::default();
        let mut env = Envelope {
            tag,
            payload: Bytes::copy_from_slice(buf),
        };
        loop {
            match link.tx.try_send(env) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => {
                    if start.elapsed() >= self.fabric.deadline {
                        return Err(CommError::Stalled {
                            op: "send",
                            rank: self.rank,
                            peer,
                            tag,
                        });
                    }
                    env = back;
                    backoff.snooze();
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(CommError::Disconnected {
                        src: self.rank,
                        dst: peer,
                    });
                }
            }
        }
    }

    fn recv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Result<usize, CommError> {
        self.check_peer(peer)?;
        let link = self.link(peer, self.rank);
        let env = {
            let rx = link.rx.lock();
            match rx.recv_timeout(self.fabric.deadline) {
                Ok(env) => env,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CommError::Stalled {
                        op: "recv",
                        rank: self.rank,
                        peer,
                        tag,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CommError::Disconnected {
                        src: peer,
                        dst: self.rank,
                    });
                }
            }
        };
        if env.tag != tag {
            return Err(CommError::TagMismatch {
                rank: self.rank,
                peer,
                expected: tag,
                got: env.tag,
            });
        }
        let n = env.payload.len();
        if n > buf.len() {
            return Err(CommError::Truncated {
                peer,
                got: n,
                capacity: buf.len(),
            });
        }
        buf[..n].copy_from_slice(&env.payload);
        Ok(n)
    }
}

/// Run `f` once per rank of a fresh [`ThreadComm`] world, each on its own
/// scoped thread, and collect the results in rank order.
///
/// A panic on any rank is re-raised on the caller.
pub fn run_world<F, R>(comms: Vec<ThreadComm>, f: F) -> Vec<R>
where
    F: Fn(ThreadComm) -> R + Sync,
    R: Send,
{
    std::thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(r) => r,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI world communicator. Dropping it finalizes MPI.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, CommError> {
            let universe = mpi::initialize()
                .ok_or_else(|| CommError::InitFailed("MPI already initialized".into()))?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }

        fn check_peer(&self, peer: usize) -> Result<(), CommError> {
            if peer >= self.size {
                return Err(CommError::RankOutOfRange {
                    peer,
                    size: self.size,
                });
            }
            Ok(())
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), CommError> {
            self.check_peer(peer)?;
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, tag as i32);
            Ok(())
        }

        fn recv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Result<usize, CommError> {
            self.check_peer(peer)?;
            let status = self
                .world
                .process_at_rank(peer as i32)
                .receive_into_with_tag(buf, tag as i32);
            Ok(status.count(u8::equivalent_datatype()) as usize)
        }

        fn all_reduce_sum(&self, local: f64) -> Result<f64, CommError> {
            let mut total = 0.0f64;
            self.world
                .all_reduce_into(&local, &mut total, SystemOperation::sum());
            Ok(total)
        }

        fn gather_f64(&self, root: usize, local: &[f64]) -> Result<Option<Vec<f64>>, CommError> {
            self.check_peer(root)?;
            let root_proc = self.world.process_at_rank(root as i32);
            if self.rank == root {
                let mut out = vec![0.0f64; local.len() * self.size];
                root_proc.gather_into_root(local, &mut out[..]);
                Ok(Some(out))
            } else {
                root_proc.gather_into(local);
                Ok(None)
            }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_roundtrip_two_ranks() {
        let out = run_world(ThreadComm::world(2), |comm| {
            if comm.rank() == 0 {
                comm.send(1, 7, &[1, 2, 3, 4]).map(|_| Vec::new())
            } else {
                let mut buf = [0u8; 4];
                comm.recv(0, 7, &mut buf).map(|_| buf.to_vec())
            }
        });
        assert_eq!(out[1].as_ref().unwrap(), &vec![1, 2, 3, 4]);
        assert!(out[0].is_ok());
    }

    #[test]
    fn tag_mismatch_is_reported() {
        let out = run_world(ThreadComm::world(2), |comm| {
            if comm.rank() == 0 {
                comm.send(1, 1, &[9]).map(|_| 0)
            } else {
                let mut buf = [0u8; 1];
                comm.recv(0, 2, &mut buf)
            }
        });
        assert!(matches!(
            out[1],
            Err(CommError::TagMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn unmatched_send_stalls() {
        let comms = ThreadComm::world_with_deadline(2, Duration::from_millis(50));
        let err = comms[0].send(1, 3, &[1]).unwrap_err();
        assert!(matches!(err, CommError::Stalled { op: "send", peer: 1, .. }));
    }

    #[test]
    fn backoff_yields_then_sleeps_with_a_cap() {
        let mut b = Backoff::default();
        for _ in 0..Backoff::SPIN_LIMIT {
            assert_eq!(b.delay(), None);
            b.step += 1;
        }
        assert_eq!(b.delay(), Some(Duration::from_micros(1)));
        b.step += 3;
        assert_eq!(b.delay(), Some(Duration::from_micros(8)));
        b.step = u32::MAX;
        assert_eq!(b.delay(), Some(Backoff::MAX_SLEEP));
    }

    #[test]
    fn send_waits_for_a_late_receiver() {
        let out = run_world(ThreadComm::world(2), |comm| {
            if comm.rank() == 0 {
                comm.send(1, 4, &[5]).map(|_| 0)
            } else {
                std::thread::sleep(Duration::from_millis(30));
                let mut buf = [0u8; 1];
                comm.recv(0, 4, &mut buf).map(|_| buf[0])
            }
        });
        assert_eq!(out, vec![Ok(0), Ok(5)]);
    }

    #[test]
    fn no_comm_has_no_peers() {
        let comm = NoComm;
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert!(comm.send(1, 0, &[]).is_err());
        assert_eq!(comm.all_reduce_sum(2.5).unwrap(), 2.5);
        assert_eq!(comm.gather_f64(0, &[1.0, 2.0]).unwrap(), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn tag_offsets() {
        let t = CommTag::new(0x10);
        assert_eq!(t.offset(2).base(), 0x12);
    }
}
