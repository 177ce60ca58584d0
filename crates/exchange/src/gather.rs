//! The all-to-all spike gather.
//!
//! Ranks run as SPMD threads in one process; the collective is an allgather
//! over crossbeam channels. Each rank sends its sorted local ID list to
//! every peer and blocks until it holds one list per rank for the current
//! round. Ranks contribute disjoint ascending ID ranges, so concatenating
//! in rank order yields a globally sorted list.

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::{ExchangeError, Result};

/// The per-millisecond collective.
pub trait SpikeGather: Send {
    /// Gather every rank's `local` lists into `all`, rank order.
    fn allgather(&mut self, local: &[u32], all: &mut Vec<u32>) -> Result<()>;

    fn n_ranks(&self) -> usize;

    fn rank(&self) -> usize;
}

/// Single-rank run: the gather is the identity.
#[derive(Debug, Default)]
pub struct SingleRank;

impl SpikeGather for SingleRank {
    fn allgather(&mut self, local: &[u32], all: &mut Vec<u32>) -> Result<()> {
        all.clear();
        all.extend_from_slice(local);
        Ok(())
    }

    fn n_ranks(&self) -> usize {
        1
    }

    fn rank(&self) -> usize {
        0
    }
}

struct Message {
    rank: usize,
    round: u64,
    ids: Vec<u32>,
}

/// One endpoint of the multi-rank exchange fabric.
///
/// A fast rank can run at most one round ahead of a slow peer (it cannot
/// finish a round without the peer's contribution), so messages for a
/// future round are parked until that round starts.
pub struct ThreadedGather {
    rank: usize,
    round: u64,
    senders: Vec<Sender<Message>>,
    receiver: Receiver<Message>,
    parked: Vec<Message>,
}

impl ThreadedGather {
    /// Build a fully connected fabric; element r is moved to rank thread r.
    pub fn fabric(n_ranks: usize) -> Vec<ThreadedGather> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..n_ranks).map(|_| unbounded()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| ThreadedGather {
                rank,
                round: 0,
                senders: senders.clone(),
                receiver,
                parked: Vec::new(),
            })
            .collect()
    }
}

impl SpikeGather for ThreadedGather {
    fn allgather(&mut self, local: &[u32], all: &mut Vec<u32>) -> Result<()> {
        let n_ranks = self.senders.len();
        self.round += 1;

        for (r, sender) in self.senders.iter().enumerate() {
            if r != self.rank {
                sender
                    .send(Message {
                        rank: self.rank,
                        round: self.round,
                        ids: local.to_vec(),
                    })
                    .map_err(|_| ExchangeError::Disconnected)?;
            }
        }

        let mut slots: Vec<Option<Vec<u32>>> = (0..n_ranks).map(|_| None).collect();
        slots[self.rank] = Some(local.to_vec());
        let mut missing = n_ranks - 1;

        let mut parked = std::mem::take(&mut self.parked);
        for msg in parked.drain(..) {
            debug_assert_eq!(msg.round, self.round);
            slots[msg.rank] = Some(msg.ids);
            missing -= 1;
        }
        self.parked = parked;

        while missing > 0 {
            let msg = self.receiver.recv().map_err(|_| ExchangeError::Disconnected)?;
            if msg.round == self.round {
                slots[msg.rank] = Some(msg.ids);
                missing -= 1;
            } else {
                debug_assert_eq!(msg.round, self.round + 1);
                self.parked.push(msg);
            }
        }

        all.clear();
        for slot in slots {
            all.extend_from_slice(&slot.expect("all ranks accounted for"));
        }
        Ok(())
    }

    fn n_ranks(&self) -> usize {
        self.senders.len()
    }

    fn rank(&self) -> usize {
        self.rank
    }
}
