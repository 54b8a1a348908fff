//! Delivery predictability table (PRoPHET)
//!
//! `P(a,b) = P(a,b)_old + (1 - P(a,b)_old) * P_INIT` on every encounter,
//! `P(a,c) += (1 - P(a,c)) * P(a,b) * P(b,c) * BETA` transitively, and every
//! score decays by `GAMMA^k` where `k` is the number of elapsed time units.

use crate::config::PredictabilityConfig;
use crate::core::{HostId, SimTime};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PredictabilityTable {
    config: PredictabilityConfig,
    preds: HashMap<HostId, f64>,
    last_aged: SimTime,
}

impl PredictabilityTable {
    pub fn new(config: PredictabilityConfig) -> Self {
        Self {
            config,
            preds: HashMap::new(),
            last_aged: 0.0,
        }
    }

    pub fn config(&self) -> &PredictabilityConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.preds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    pub fn last_aged(&self) -> SimTime {
        self.last_aged
    }

    fn time_units(&self, now: SimTime) -> f64 {
        (now - self.last_aged) / f64::from(self.config.seconds_per_time_unit)
    }

    /// Age every entry up to `now`
    pub fn age(&mut self, now: SimTime) {
        let elapsed = self.time_units(now);
        if elapsed == 0.0 {
            return;
        }

        let mult = self.config.aging_decay.powf(elapsed);
        for score in self.preds.values_mut() {
            *score *= mult;
        }
        self.last_aged = now;
    }

    /// Aged score for `host`, or 0 when it was never met
    pub fn score_for(&mut self, host: HostId, now: SimTime) -> f64 {
        self.age(now);
        self.preds.get(&host).copied().unwrap_or(0.0)
    }

    /// Score `host` would have after aging to `now`, without committing the aging.
    ///
    /// This is what peers read during an encounter.
    pub fn peek(&self, host: HostId, now: SimTime) -> f64 {
        let stored = self.preds.get(&host).copied().unwrap_or(0.0);
        let elapsed = self.time_units(now);
        if elapsed == 0.0 {
            stored
        } else {
            stored * self.config.aging_decay.powf(elapsed)
        }
    }

    /// All scores aged to `now`, ordered by host
    pub fn entries_at(&self, now: SimTime) -> Vec<(HostId, f64)> {
        let elapsed = self.time_units(now);
        let mult = if elapsed == 0.0 {
            1.0
        } else {
            self.config.aging_decay.powf(elapsed)
        };

        let mut entries: Vec<_> = self
            .preds
            .iter()
            .map(|(host, score)| (*host, score * mult))
            .collect();
        entries.sort_by_key(|(host, _)| *host);
        entries
    }

    /// Direct update for a host just met
    pub fn encounter(&mut self, peer: HostId, now: SimTime) -> f64 {
        let old = self.score_for(peer, now);
        let new = old + (1.0 - old) * self.config.p_init;
        self.preds.insert(peer, new);
        new
    }

    /// Transitive update through `peer`, whose table is `peer_preds`
    pub fn transitive(
        &mut self,
        me: HostId,
        peer: HostId,
        peer_preds: &PredictabilityTable,
        now: SimTime,
    ) {
        let p_peer = self.score_for(peer, now);

        for (third, p_third) in peer_preds.entries_at(now) {
            if third == me {
                continue;
            }
            let old = self.score_for(third, now);
            let new = old + (1.0 - old) * p_peer * p_third * self.config.beta;
            self.preds.insert(third, new);
        }
    }

    /// Full contact-up update: direct, then transitive
    pub fn on_contact_up(
        &mut self,
        me: HostId,
        peer: HostId,
        peer_preds: Option<&PredictabilityTable>,
        now: SimTime,
    ) {
        let score = self.encounter(peer, now);
        if let Some(peer_preds) = peer_preds {
            self.transitive(me, peer, peer_preds, now);
        }
        tracing::debug!("{} predictability for {} is now {:.4}", me, peer, score);
    }

    /// Human-readable summary, aged to `now`
    pub fn routing_info(&mut self, now: SimTime) -> String {
        self.age(now);
        let entries = self.entries_at(now);
        let mut info = format!("{} delivery prediction(s)", entries.len());
        for (host, score) in entries {
            info.push_str(&format!("\n{} : {:.6}", host, score));
        }
        info
    }
}
