use std::{any::Any, num::NonZeroUsize, sync::Arc};

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::sync::Barrier;

use crate::{Concat, GatherErr, Result};

type Slot = Option<Box<dyn Any + Send>>;

/// The meeting point shared by every rank of a group, one slot per rank.
struct Rendezvous {
    barrier: Barrier,
    slots: Mutex<Vec<Slot>>,
}

impl Rendezvous {
    fn new(world_size: usize) -> Self {
        Self {
            barrier: Barrier::new(world_size),
            slots: Mutex::new((0..world_size).map(|_| None).collect()),
        }
    }
}

/// Creates a gather group of `world_size` ranks.
///
/// # Arguments
/// * `world_size` - The amount of workers taking part in every gather round.
///
/// # Returns
/// One `Gatherer` per rank, the i-th handle belongs to rank i.
pub fn group(world_size: NonZeroUsize) -> Vec<Gatherer> {
    let world_size = world_size.get();
    let rendezvous = Arc::new(Rendezvous::new(world_size));
    debug!(world_size = world_size; "created gather group");

    (0..world_size)
        .map(|rank| Gatherer {
            rank,
            world_size,
            rendezvous: Arc::clone(&rendezvous),
        })
        .collect()
}

/// A rank's handle on a gather group.
///
/// Every rank of the group must call `all_gather` the same amount of times. A rank that stops
/// calling it leaves the others waiting at their next call, there is no timeout.
pub struct Gatherer {
    rank: usize,
    world_size: usize,
    rendezvous: Arc<Rendezvous>,
}

impl Gatherer {
    /// Creates the handle of a single worker group, where gathering is the identity.
    pub fn solo() -> Self {
        Self {
            rank: 0,
            world_size: 1,
            rendezvous: Arc::new(Rendezvous::new(1)),
        }
    }

    /// The rank of this handle inside its group.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The amount of ranks in the group.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// Collects one value from every rank of the group.
    ///
    /// Waits until every rank has contributed its value, then joins all of them in ascending rank
    /// order. The result is the same on every rank and doesn't depend on the order in which the
    /// ranks arrived.
    ///
    /// # Arguments
    /// * `value` - This rank's contribution.
    ///
    /// # Returns
    /// The concatenation of every rank's value, or an error if they can't be joined.
    pub async fn all_gather<T>(&self, value: T) -> Result<T>
    where
        T: Concat + Clone + Send + 'static,
    {
        if self.world_size == 1 {
            return Ok(value);
        }

        self.rendezvous.slots.lock()[self.rank] = Some(Box::new(value));
        self.rendezvous.barrier.wait().await;

        let parts = self.read_slots::<T>();

        // No rank may deposit its next value before every rank has read this round.
        self.rendezvous.barrier.wait().await;
        self.rendezvous.slots.lock()[self.rank] = None;

        let parts = parts?;
        trace!(rank = self.rank, parts = parts.len(); "gather round complete");
        T::concat(parts)
    }

    fn read_slots<T>(&self) -> Result<Vec<T>>
    where
        T: Clone + 'static,
    {
        let slots = self.rendezvous.slots.lock();

        slots
            .iter()
            .enumerate()
            .map(|(rank, slot)| {
                slot.as_ref()
                    .and_then(|value| value.downcast_ref::<T>())
                    .cloned()
                    .ok_or(GatherErr::TypeMismatch { rank })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn solo_gather_is_the_identity() {
        let gatherer = Gatherer::solo();
        let gathered = gatherer.all_gather(vec![1, 2, 3]).await.unwrap();
        assert_eq!(gathered, [1, 2, 3]);
        assert_eq!(gatherer.rank(), 0);
        assert_eq!(gatherer.world_size(), 1);
    }

    #[test]
    fn group_hands_out_one_handle_per_rank() {
        let ranks = group(NonZeroUsize::new(3).unwrap());
        let ids: Vec<_> = ranks.iter().map(Gatherer::rank).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert!(ranks.iter().all(|g| g.world_size() == 3));
    }
}
