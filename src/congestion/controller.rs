//! AIMD transfer-quota controller
//!
//! Smooths the drop/replication ratio observed over each contact into a
//! congestion value (CV) and adjusts the per-contact quota from it.

use crate::config::CongestionConfig;
use crate::congestion::types::{CongestionSample, CongestionStatus, CongestionStep, ContactCounters};
use crate::core::{Message, SimTime};

/// Quota handed to the first contact of a fresh node
pub const INITIAL_QUOTA: u32 = 1;

/// Replications implied by the hops already travelled by held replicas
pub fn hop_credit<'a>(messages: impl IntoIterator<Item = &'a Message>) -> u64 {
    messages
        .into_iter()
        .filter(|m| m.hop_count > 0)
        .map(|m| u64::from(m.hop_count - 1))
        .sum()
}

#[derive(Debug, Clone)]
pub struct CongestionController {
    config: CongestionConfig,
    cv: f64,
    quota: u32,
    counters: ContactCounters,
    samples: Vec<CongestionSample>,
    drop_ratios: Vec<f64>,
}

impl CongestionController {
    pub fn new(config: CongestionConfig) -> Self {
        Self {
            config,
            cv: 0.0,
            quota: INITIAL_QUOTA,
            counters: ContactCounters::default(),
            samples: Vec::new(),
            drop_ratios: Vec::new(),
        }
    }

    pub fn cv(&self) -> f64 {
        self.cv
    }

    /// Quota the next contact will be granted
    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn counters(&self) -> ContactCounters {
        self.counters
    }

    pub fn record_drop(&mut self) {
        self.counters.drops += 1;
    }

    pub fn record_replication(&mut self) {
        self.counters.replications += 1;
    }

    /// Congestion values in teardown order
    pub fn samples(&self) -> &[CongestionSample] {
        &self.samples
    }

    /// Raw drop/replication ratios, only for windows that replicated something
    pub fn drop_ratios(&self) -> &[f64] {
        &self.drop_ratios
    }

    /// Recompute CV and quota at teardown of a contact with a peer.
    ///
    /// Only the local counters are reset; the peer resets its own at its own
    /// teardown, so whichever side is torn down second sees zeroed counters.
    pub fn on_contact_down(
        &mut self,
        peer: ContactCounters,
        hop_credit: u64,
        now: SimTime,
    ) -> CongestionStep {
        let drops = self.counters.drops + peer.drops;
        let reps = self.counters.replications + peer.replications + hop_credit;
        self.counters = ContactCounters::default();

        let previous_cv = self.cv;
        let previous_quota = self.quota;

        let (ratio, new_cv) = if reps == 0 {
            (None, self.cv)
        } else {
            let ratio = drops as f64 / reps as f64;
            self.drop_ratios.push(ratio);
            let alpha = self.config.alpha_cv;
            (Some(ratio), alpha * ratio + (1.0 - alpha) * self.cv)
        };

        self.quota = self.next_quota(new_cv);
        self.cv = new_cv;
        self.samples.push(CongestionSample {
            value: new_cv,
            time: now,
        });

        CongestionStep {
            ratio,
            previous_cv,
            cv: new_cv,
            previous_quota,
            quota: self.quota,
        }
    }

    fn next_quota(&self, new_cv: f64) -> u32 {
        if new_cv <= self.cv {
            self.quota.saturating_add(self.config.additive_increase)
        } else {
            (f64::from(self.quota) * self.config.multiplicative_decrease).ceil() as u32
        }
    }

    pub fn status(&self) -> CongestionStatus {
        CongestionStatus {
            cv: self.cv,
            quota: self.quota,
            pending_drops: self.counters.drops,
            pending_replications: self.counters.replications,
            samples: self.samples.len(),
        }
    }

    #[cfg(test)]
    fn with_state(config: CongestionConfig, cv: f64, quota: u32) -> Self {
        Self {
            cv,
            quota,
            ..Self::new(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HostId;

    #[test]
    fn test_initial_state() {
        let controller = CongestionController::new(CongestionConfig::default());
        assert_eq!(controller.cv(), 0.0);
        assert_eq!(controller.quota(), 1);
        assert!(controller.samples().is_empty());
    }

    #[test]
    fn test_additive_increase_when_cv_falls() {
        // alpha = 1 makes newCV equal the observed ratio
        let config = CongestionConfig {
            alpha_cv: 1.0,
            ..Default::default()
        };
        let mut controller = CongestionController::with_state(config, 0.2, 3);

        // 1 drop out of 10 replications -> ratio 0.1
        let step = controller.on_contact_down(ContactCounters::new(1, 10), 0, 5.0);

        assert_eq!(step.ratio, Some(0.1));
        assert!(step.increased());
        assert_eq!(controller.quota(), 4);
        assert_eq!(controller.cv(), 0.1);
    }

    #[test]
    fn test_multiplicative_decrease_when_cv_rises() {
        let config = CongestionConfig {
            alpha_cv: 1.0,
            ..Default::default()
        };
        let mut controller = CongestionController::with_state(config, 0.2, 5);

        let step = controller.on_contact_down(ContactCounters::new(5, 10), 0, 5.0);

        assert_eq!(step.ratio, Some(0.5));
        assert!(!step.increased());
        // ceil(5 * 0.2) = 1
        assert_eq!(controller.quota(), 1);
    }

    #[test]
    fn test_quota_never_reaches_zero() {
        let config = CongestionConfig {
            alpha_cv: 1.0,
            multiplicative_decrease: 0.01,
            ..Default::default()
        };
        let mut controller = CongestionController::with_state(config, 0.0, 1);

        for i in 0..5 {
            controller.record_drop();
            controller.record_replication();
            controller.on_contact_down(ContactCounters::new(i, 1), 0, i as f64);
            assert!(controller.quota() >= 1);
        }
    }

    #[test]
    fn test_no_replications_carries_cv_forward() {
        let mut controller =
            CongestionController::with_state(CongestionConfig::default(), 0.37, 2);
        controller.record_drop();

        let step = controller.on_contact_down(ContactCounters::new(4, 0), 0, 12.0);

        assert_eq!(step.ratio, None);
        assert_eq!(controller.cv().to_bits(), 0.37f64.to_bits());
        assert!(controller.drop_ratios().is_empty());
        // unchanged CV counts as improvement
        assert_eq!(controller.quota(), 3);
        assert_eq!(controller.samples().len(), 1);
        assert_eq!(controller.samples()[0].time, 12.0);
    }

    #[test]
    fn test_counters_reset_locally_only() {
        let mut controller = CongestionController::new(CongestionConfig::default());
        controller.record_drop();
        controller.record_replication();
        controller.record_replication();

        let peer = ContactCounters::new(1, 2);
        let step = controller.on_contact_down(peer, 0, 1.0);

        // (1 + 1) / (2 + 2)
        assert_eq!(step.ratio, Some(0.5));
        assert_eq!(controller.counters(), ContactCounters::default());
    }

    #[test]
    fn test_smoothing() {
        let mut controller = CongestionController::with_state(CongestionConfig::default(), 0.5, 2);

        controller.on_contact_down(ContactCounters::new(1, 4), 0, 1.0);

        let expected = 0.9 * 0.25 + 0.1 * 0.5;
        assert!((controller.cv() - expected).abs() < 1e-12);
        assert_eq!(controller.drop_ratios(), &[0.25]);
    }

    #[test]
    fn test_hop_credit() {
        let messages = vec![
            Message::new("a", HostId(0), HostId(1), 10, 0.0),
            Message::new("b", HostId(0), HostId(1), 10, 0.0).with_hops(1),
            Message::new("c", HostId(0), HostId(1), 10, 0.0).with_hops(4),
        ];
        assert_eq!(hop_credit(&messages), 3);
    }

    #[test]
    fn test_status_display() {
        let controller = CongestionController::new(CongestionConfig::default());
        let status = controller.status().to_string();
        assert!(status.contains("quota 1"));
    }
}
