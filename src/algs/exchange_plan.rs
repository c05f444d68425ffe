//! Deadlock-free ordering of halo sends and receives along one axis.
//!
//! Every process classifies itself by which axis neighbours it has and by
//! the parity of its coordinate along the axis. Along any axis neighbouring
//! coordinates have opposite parity, so each communicating pair has one side
//! sending first while the other receives first, and blocking (rendezvous)
//! sends always find their receive.

use crate::topology::cartesian::{Direction, Neighbors};

/// One blocking operation of an exchange.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Pack the interior boundary facing `Direction` and send it there.
    Send(Direction),
    /// Receive from `Direction` into the ghost cells on that side.
    Recv(Direction),
}

/// Position of a process along one axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExchangeRole {
    /// No neighbour on either side.
    Isolated,
    /// First on the axis: send to next, then receive from next.
    NoPrevious,
    /// Last on the axis at an odd coordinate: receive from previous, then send.
    NoNext,
    /// Last on the axis at an even coordinate: send to previous, then receive.
    EvenNoNext,
    /// send next, send previous, receive previous, receive next.
    EvenInterior,
    /// receive previous, receive next, send next, send previous.
    OddInterior,
}

impl ExchangeRole {
    pub fn classify(has_previous: bool, has_next: bool, coord: usize) -> Self {
        let even = coord % 2 == 0;
        match (has_previous, has_next) {
            (false, false) => ExchangeRole::Isolated,
            (false, true) => ExchangeRole::NoPrevious,
            (true, false) if even => ExchangeRole::EvenNoNext,
            (true, false) => ExchangeRole::NoNext,
            (true, true) if even => ExchangeRole::EvenInterior,
            (true, true) => ExchangeRole::OddInterior,
        }
    }

    /// Ordered steps for this role along `axis`.
    pub fn steps(self, axis: usize) -> Vec<Step> {
        use Step::{Recv, Send};
        let prev = Direction::previous(axis);
        let next = Direction::next(axis);
        match self {
            ExchangeRole::Isolated => vec![],
            ExchangeRole::NoPrevious => vec![Send(next), Recv(next)],
            ExchangeRole::NoNext => vec![Recv(prev), Send(prev)],
            ExchangeRole::EvenNoNext => vec![Send(prev), Recv(prev)],
            ExchangeRole::EvenInterior => vec![Send(next), Send(prev), Recv(prev), Recv(next)],
            ExchangeRole::OddInterior => vec![Recv(prev), Recv(next), Send(next), Send(prev)],
        }
    }
}

/// The exchange along one axis for one process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisPlan {
    pub axis: usize,
    pub role: ExchangeRole,
    pub steps: Vec<Step>,
}

impl AxisPlan {
    pub fn new(axis: usize, neighbors: &Neighbors, coord: usize) -> Self {
        let role = ExchangeRole::classify(
            neighbors.get(Direction::previous(axis)).is_some(),
            neighbors.get(Direction::next(axis)).is_some(),
            coord,
        );
        Self {
            axis,
            role,
            steps: role.steps(axis),
        }
    }
}

/// Full per-iteration plan: axis phases in execution order.
///
/// A chain exchanges along axis 0 only; a grid exchanges columns (axis 1)
/// first, then rows (axis 0).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangePlan {
    pub phases: Vec<AxisPlan>,
}

impl ExchangePlan {
    pub fn chain(neighbors: &Neighbors, rank: usize) -> Self {
        Self {
            phases: vec![AxisPlan::new(0, neighbors, rank)],
        }
    }

    pub fn grid(neighbors: &Neighbors, coords: [usize; 2]) -> Self {
        Self {
            phases: vec![
                AxisPlan::new(1, neighbors, coords[1]),
                AxisPlan::new(0, neighbors, coords[0]),
            ],
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = (usize, Step)> + '_ {
        self.phases
            .iter()
            .flat_map(|p| p.steps.iter().map(move |&s| (p.axis, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cartesian::ProcessTopology;

    /// Run every process's plan against the others with rendezvous matching:
    /// a send completes only when the partner's current step is the
    /// matching receive. Returns false if the system gets stuck.
    fn rendezvous_terminates(plans: &[Vec<(usize, Step)>], topo: &ProcessTopology) -> bool {
        let nbrs: Vec<_> = (0..plans.len())
            .map(|r| topo.neighbors(r).unwrap())
            .collect();
        let opposite = |d: Direction| match d {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        };
        let mut pc = vec![0usize; plans.len()];
        loop {
            if pc.iter().zip(plans).all(|(&i, p)| i == p.len()) {
                return true;
            }
            let mut progressed = false;
            for r in 0..plans.len() {
                let Some(&(_, Step::Send(dir))) = plans[r].get(pc[r]) else {
                    continue;
                };
                let peer = nbrs[r].get(dir).expect("plan sends to a missing neighbour");
                if plans[peer].get(pc[peer]).map(|&(_, s)| s) == Some(Step::Recv(opposite(dir))) {
                    pc[r] += 1;
                    pc[peer] += 1;
                    progressed = true;
                }
            }
            if !progressed {
                return false;
            }
        }
    }

    #[test]
    fn chain_roles() {
        assert_eq!(ExchangeRole::classify(false, false, 0), ExchangeRole::Isolated);
        assert_eq!(ExchangeRole::classify(false, true, 0), ExchangeRole::NoPrevious);
        assert_eq!(ExchangeRole::classify(true, false, 3), ExchangeRole::NoNext);
        assert_eq!(ExchangeRole::classify(true, false, 2), ExchangeRole::EvenNoNext);
        assert_eq!(ExchangeRole::classify(true, true, 4), ExchangeRole::EvenInterior);
        assert_eq!(ExchangeRole::classify(true, true, 5), ExchangeRole::OddInterior);
    }

    #[test]
    fn first_never_receives_from_previous_last_never_sends_next() {
        for size in 1..=9 {
            let topo = ProcessTopology::chain(size).unwrap();
            let first = ExchangePlan::chain(&topo.neighbors(0).unwrap(), 0);
            assert!(!first.steps().any(|(_, s)| s == Step::Recv(Direction::Up)));
            let last = ExchangePlan::chain(&topo.neighbors(size - 1).unwrap(), size - 1);
            assert!(!last.steps().any(|(_, s)| s == Step::Send(Direction::Down)));
        }
    }

    #[test]
    fn chain_plans_are_live_for_any_size() {
        for size in 1..=9 {
            let topo = ProcessTopology::chain(size).unwrap();
            let plans: Vec<Vec<_>> = (0..size)
                .map(|r| ExchangePlan::chain(&topo.neighbors(r).unwrap(), r).steps().collect())
                .collect();
            assert!(rendezvous_terminates(&plans, &topo), "chain of {size} deadlocks");
        }
    }

    #[test]
    fn grid_plans_are_live_for_any_size() {
        for size in 1..=16 {
            let topo = ProcessTopology::grid(size).unwrap();
            let plans: Vec<Vec<_>> = (0..size)
                .map(|r| {
                    let c = topo.coords(r).unwrap();
                    ExchangePlan::grid(&topo.neighbors(r).unwrap(), c).steps().collect()
                })
                .collect();
            assert!(rendezvous_terminates(&plans, &topo), "grid of {size} deadlocks");
        }
    }

    #[test]
    fn grid_runs_columns_before_rows() {
        let topo = ProcessTopology::grid(4).unwrap();
        let plan = ExchangePlan::grid(&topo.neighbors(0).unwrap(), [0, 0]);
        let axes: Vec<_> = plan.phases.iter().map(|p| p.axis).collect();
        assert_eq!(axes, vec![1, 0]);
        assert_eq!(
            plan.steps().map(|(_, s)| s).collect::<Vec<_>>(),
            vec![
                Step::Send(Direction::Right),
                Step::Recv(Direction::Right),
                Step::Send(Direction::Down),
                Step::Recv(Direction::Down),
            ]
        );
    }
}
