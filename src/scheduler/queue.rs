//! Queue-mode ordering used to break ties between forwarding candidates

use crate::config::QueueMode;
use crate::core::{Message, SimTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Put `messages` in send-queue order.
///
/// Random mode reshuffles with a seed taken from the current whole second, so
/// every router sees the same permutation within one tick.
pub fn arrange(mode: QueueMode, messages: &mut [&Message], now: SimTime) {
    match mode {
        QueueMode::Random => {
            let mut rng = StdRng::seed_from_u64(now.max(0.0) as u64);
            messages.shuffle(&mut rng);
        }
        QueueMode::Fifo => {
            messages.sort_by(|a, b| a.received_at.total_cmp(&b.received_at));
        }
    }
}
