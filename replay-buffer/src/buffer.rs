//! Fixed-capacity ring storage with priority-weighted sampling.

use crate::experience::Experience;
use crate::telemetry::Telemetry;
use common::constants::replay::MIN_PRIORITY;
use rand::Rng;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::warn;

/// A batch drawn from the buffer, with importance-sampling weights.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Physical ring indices the samples came from (valid arguments to `update_priorities`).
    pub indices: Vec<usize>,
    /// The sampled experiences, cloned out of the ring.
    pub experiences: Vec<Experience>,
    /// Importance-sampling correction weights, one per sample, in `(0, 1]`.
    pub weights: Vec<f64>,
}

struct Slot {
    experience: UnsafeCell<Option<Experience>>,
    priority_bits: AtomicU64,
}

/// Prioritized, fixed-capacity, single-writer/multi-reader replay buffer.
///
/// `add` never blocks: it writes the new row, stores its priority, then publishes the
/// updated `(write_position, size)` with a release store so a reader's acquire load of
/// `size` always observes a fully-written row. Readers may still observe an index whose
/// slot has since been overwritten by wraparound; per the buffer's contract that stale
/// read is acceptable since experiences are ephemeral.
pub struct ReplayBuffer {
    capacity: usize,
    slots: Box<[Slot]>,
    next_write: AtomicUsize,
    size: AtomicUsize,
    max_priority_bits: AtomicU64,
    alpha: f64,
    beta_bits: AtomicU64,
    beta_increment: f64,
    telemetry: Telemetry,
}

// SAFETY: `Slot::experience` is only ever written by the single writer that owns `add`,
// and only read through `&self` by readers calling `sample`/`update_priorities`; no two
// writers exist by API contract, so there is no data race on the write side. Readers may
// observe a torn or stale row under concurrent wraparound, which is an accepted staleness,
// not a soundness issue, since `Experience` contains no invalid bit patterns to read.
unsafe impl Sync for ReplayBuffer {}

impl ReplayBuffer {
    /// Construct an empty buffer.
    #[must_use]
    pub fn new(capacity: usize, alpha: f64, beta: f64, beta_increment: f64) -> Self {
        let slots = (0..capacity.max(1))
            .map(|_| Slot {
                experience: UnsafeCell::new(None),
                priority_bits: AtomicU64::new(0.0f64.to_bits()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            capacity: capacity.max(1),
            slots,
            next_write: AtomicUsize::new(0),
            size: AtomicUsize::new(0),
            max_priority_bits: AtomicU64::new(MIN_PRIORITY.to_bits()),
            alpha,
            beta_bits: AtomicU64::new(beta.to_bits()),
            beta_increment,
            telemetry: Telemetry::new(),
        }
    }

    /// Current number of valid rows, `<= capacity`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// `true` when no rows have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ring capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Telemetry accessor.
    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Insert a transition. O(1); never blocks a concurrent `sample`/`update_priorities`.
    pub fn add(&self, experience: Experience) -> usize {
        let start = Instant::now();
        let idx = self.next_write.fetch_add(1, Ordering::Relaxed) % self.capacity;

        let raw_priority = experience.raw_priority();
        let current_max = f64::from_bits(self.max_priority_bits.load(Ordering::Acquire));
        let priority = raw_priority.max(current_max).max(MIN_PRIORITY);

        // SAFETY: single writer; see the `unsafe impl Sync` comment above.
        unsafe {
            *self.slots[idx].experience.get() = Some(experience);
        }
        self.slots[idx]
            .priority_bits
            .store(priority.to_bits(), Ordering::Release);

        self.store_max_priority(priority);
        let new_size = (self.size.load(Ordering::Relaxed) + 1).min(self.capacity);
        self.size.store(new_size, Ordering::Release);

        self.telemetry.record_add(start.elapsed().as_nanos() as u64);
        idx
    }

    fn store_max_priority(&self, candidate: f64) {
        let mut current = self.max_priority_bits.load(Ordering::Acquire);
        loop {
            let current_val = f64::from_bits(current);
            if candidate <= current_val {
                return;
            }
            match self.max_priority_bits.compare_exchange_weak(
                current,
                candidate.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Current priority stored at `idx` (raw, not raised to `alpha`).
    fn priority_at(&self, idx: usize) -> f64 {
        f64::from_bits(self.slots[idx].priority_bits.load(Ordering::Acquire))
    }

    /// Draw `batch_size` indices with probability proportional to `p^alpha`, returning
    /// importance-sampling weights normalized by the maximum weight within this batch.
    /// `beta` anneals toward `1.0` by `beta_increment` each call.
    pub fn sample(&self, batch_size: usize, rng: &mut impl Rng) -> Batch {
        let start = Instant::now();
        let n = self.len();
        if n == 0 || batch_size == 0 {
            return Batch {
                indices: Vec::new(),
                experiences: Vec::new(),
                weights: Vec::new(),
            };
        }

        let beta = self.anneal_beta();

        let weighted: Vec<(usize, f64)> = (0..n)
            .map(|i| (i, self.priority_at(i).powf(self.alpha)))
            .collect();
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();

        let mut indices = Vec::with_capacity(batch_size);
        let mut probs = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let draw: f64 = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = weighted[n - 1].0;
            let mut chosen_prob = weighted[n - 1].1 / total;
            for &(idx, w) in &weighted {
                acc += w;
                if acc >= draw {
                    chosen = idx;
                    chosen_prob = w / total;
                    break;
                }
            }
            indices.push(chosen);
            probs.push(chosen_prob.max(f64::MIN_POSITIVE));
        }

        let raw_weights: Vec<f64> = probs
            .iter()
            .map(|&p| (n as f64 * p).powf(-beta))
            .collect();
        let max_weight = raw_weights.iter().cloned().fold(f64::MIN, f64::max).max(f64::MIN_POSITIVE);
        let weights: Vec<f64> = raw_weights.iter().map(|w| w / max_weight).collect();

        let experiences: Vec<Experience> = indices
            .iter()
            // SAFETY: single writer; a concurrent overwrite only changes the value read,
            // never produces an invalid bit pattern for `Experience`.
            .map(|&idx| unsafe { (*self.slots[idx].experience.get()).clone() }.unwrap_or_else(|| {
                panic!("sampled index {idx} had no experience; buffer invariant violated")
            }))
            .collect();

        for &idx in &indices {
            self.telemetry.record_venue(experiences_venue(&experiences, &indices, idx));
        }

        self.telemetry.record_sample(start.elapsed().as_nanos() as u64);
        Batch {
            indices,
            experiences,
            weights,
        }
    }

    fn anneal_beta(&self) -> f64 {
        let mut current = self.beta_bits.load(Ordering::Acquire);
        loop {
            let current_val = f64::from_bits(current);
            let next = (current_val + self.beta_increment).min(1.0);
            match self.beta_bits.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current_val,
                Err(actual) => current = actual,
            }
        }
    }

    /// Overwrite the priorities at `indices` with `max(priorities[i], MIN_PRIORITY)`.
    pub fn update_priorities(&self, indices: &[usize], priorities: &[f64]) {
        for (&idx, &p) in indices.iter().zip(priorities.iter()) {
            if idx >= self.capacity {
                warn!(idx, capacity = self.capacity, "update_priorities given an out-of-range index, ignoring");
                continue;
            }
            let floored = p.max(MIN_PRIORITY);
            self.slots[idx]
                .priority_bits
                .store(floored.to_bits(), Ordering::Release);
            self.store_max_priority(floored);
        }
    }
}

fn experiences_venue(experiences: &[Experience], indices: &[usize], idx: usize) -> u8 {
    indices
        .iter()
        .position(|&i| i == idx)
        .and_then(|pos| experiences.get(pos))
        .map_or(0, |e| e.metadata.venue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::ExperienceMetadata;
    use common::Ts;
    use rand::SeedableRng;

    fn exp(reward: f64) -> Experience {
        Experience {
            state: vec![0.0],
            action: 0,
            reward,
            next_state: vec![0.0],
            done: false,
            ts: Ts::from_nanos(0),
            metadata: ExperienceMetadata {
                venue: 0,
                expected_latency_us: 100.0,
                actual_latency_us: 100.0,
                fill_success: true,
                market_impact_bps: 0.0,
                opportunity_cost: 0.0,
            },
        }
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let buf = ReplayBuffer::new(4, 0.6, 0.4, 0.001);
        for i in 0..10 {
            buf.add(exp(i as f64));
        }
        assert_eq!(buf.len(), 4);
        assert!(buf.len() <= buf.capacity());
    }

    #[test]
    fn sampled_indices_are_in_range_and_weights_bounded() {
        let buf = ReplayBuffer::new(8, 0.6, 0.4, 0.001);
        for i in 0..8 {
            buf.add(exp(i as f64));
        }
        let mut rng = rand::rngs::mock::StepRng::new(0, 1 << 40);
        let batch = buf.sample(5, &mut rng);
        for &idx in &batch.indices {
            assert!(idx < buf.len());
        }
        for &w in &batch.weights {
            assert!(w > 0.0 && w <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn higher_reward_is_sampled_more_often() {
        let buf = ReplayBuffer::new(3, 0.6, 0.4, 0.0);
        buf.add(exp(0.0));
        buf.add(exp(1.0));
        buf.add(exp(10.0));

        let mut rng = rand::rngs::StdRng::seed_from_u64(123);
        let mut counts = [0usize; 3];
        for _ in 0..1_000 {
            let batch = buf.sample(1, &mut rng);
            counts[batch.indices[0]] += 1;
        }
        assert!(counts[2] > counts[0]);
    }

    #[test]
    fn update_priorities_floors_at_min_priority() {
        let buf = ReplayBuffer::new(2, 0.6, 0.4, 0.0);
        buf.add(exp(1.0));
        buf.update_priorities(&[0], &[0.0]);
        assert!(buf.priority_at(0) >= MIN_PRIORITY);
    }
}
