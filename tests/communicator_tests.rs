use poisson_halo::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm, run_world};
use poisson_halo::solver_error::CommError;
use std::time::Duration;

#[test]
fn thread_round_trip() {
    let tag = CommTag(0x1000);
    let out = run_world(ThreadComm::world(2), |c| {
        if c.rank() == 0 {
            c.send(1, tag.base(), b"hello").unwrap();
            None
        } else {
            let mut buf = [0u8; 5];
            let n = c.recv(0, tag.base(), &mut buf).unwrap();
            Some(buf[..n].to_vec())
        }
    });
    assert_eq!(out[1].as_deref(), Some(&b"hello"[..]));
}

#[test]
fn fifo_order_per_link() {
    let tag = CommTag(0x1001);
    let out = run_world(ThreadComm::world(2), |c| {
        let mut got = Vec::new();
        if c.rank() == 0 {
            for i in 0..10u8 {
                c.send(1, tag.base(), &[i]).unwrap();
            }
        } else {
            for _ in 0..10 {
                let mut b = [0u8; 1];
                c.recv(0, tag.base(), &mut b).unwrap();
                got.push(b[0]);
            }
        }
        got
    });
    assert_eq!(out[1], (0u8..10u8).collect::<Vec<_>>());
}

#[test]
fn truncation_is_an_error() {
    let tag = CommTag(0x1002);
    let out = run_world(ThreadComm::world(2), |c| {
        if c.rank() == 0 {
            c.send(1, tag.base(), &[1, 2, 3, 4, 5, 6]).map(|_| 0)
        } else {
            let mut b = [0u8; 4];
            c.recv(0, tag.base(), &mut b)
        }
    });
    assert_eq!(
        out[1],
        Err(CommError::Truncated {
            peer: 0,
            got: 6,
            capacity: 4
        })
    );
}

#[test]
fn f64_payloads_keep_their_values() {
    let tag = CommTag(0x1003).offset(1);
    let out = run_world(ThreadComm::world(3), |c| {
        let mut buf = [0.0f64; 4];
        if c.rank() == 0 {
            c.send_f64(2, tag.base(), &[0.25, -1.5, 1e-300]).unwrap();
        } else if c.rank() == 2 {
            let n = c.recv_f64(0, tag.base(), &mut buf).unwrap();
            assert_eq!(n, 3);
        }
        buf
    });
    assert_eq!(out[2], [0.25, -1.5, 1e-300, 0.0]);
    assert_eq!(out[1], [0.0; 4]);
}

#[test]
fn all_reduce_is_identical_everywhere() {
    let out = run_world(ThreadComm::world(5), |c| {
        c.all_reduce_sum(0.1 * (c.rank() + 1) as f64).unwrap()
    });
    assert!(out.windows(2).all(|w| w[0].to_bits() == w[1].to_bits()));
    assert!((out[0] - 1.5).abs() < 1e-12);
}

#[test]
fn gather_concatenates_in_rank_order() {
    let out = run_world(ThreadComm::world(4), |c| {
        let r = c.rank() as f64;
        c.gather_f64(0, &[r, r + 0.5]).unwrap()
    });
    assert_eq!(
        out[0].as_deref(),
        Some(&[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5][..])
    );
    assert!(out[1..].iter().all(Option::is_none));
}

#[test]
fn gather_to_nonzero_root() {
    let out = run_world(ThreadComm::world(3), |c| {
        c.gather_f64(2, &[c.rank() as f64]).unwrap()
    });
    assert_eq!(out[2].as_deref(), Some(&[0.0, 1.0, 2.0][..]));
    assert!(out[0].is_none() && out[1].is_none());
}

#[test]
fn everyone_sending_first_stalls() {
    // Two ranks both sending before receiving can never rendezvous.
    let out = run_world(
        ThreadComm::world_with_deadline(2, Duration::from_millis(100)),
        |c| {
            let peer = 1 - c.rank();
            c.send_f64(peer, 7, &[1.0])?;
            let mut b = [0.0];
            c.recv_f64(peer, 7, &mut b)
        },
    );
    for (rank, r) in out.into_iter().enumerate() {
        assert!(
            matches!(r, Err(CommError::Stalled { op: "send", rank: r0, .. }) if r0 == rank),
            "rank {rank}: {r:?}"
        );
    }
}

#[test]
fn unknown_peer_is_rejected() {
    let comms = ThreadComm::world(2);
    assert_eq!(
        comms[0].send(5, 1, &[]),
        Err(CommError::RankOutOfRange { peer: 5, size: 2 })
    );
    assert!(matches!(
        NoComm.send(0, 1, &[]),
        Err(CommError::NoPeer { .. })
    ));
}
