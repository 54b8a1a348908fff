use crate::core::{HostId, SimTime};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    Connect(HostId, HostId),
    Disconnect(HostId, HostId),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub time: SimTime,
    pub event: SimEvent,
}

impl ScheduledEvent {
    pub fn connect(time: SimTime, a: HostId, b: HostId) -> Self {
        Self {
            time,
            event: SimEvent::Connect(a, b),
        }
    }

    pub fn disconnect(time: SimTime, a: HostId, b: HostId) -> Self {
        Self {
            time,
            event: SimEvent::Disconnect(a, b),
        }
    }

    pub fn tick(time: SimTime) -> Self {
        Self {
            time,
            event: SimEvent::Tick,
        }
    }
}

/// Sort events by time, keeping insertion order among equal timestamps
pub fn order_events(events: &mut [ScheduledEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_stable() {
        let mut events = vec![
            ScheduledEvent::tick(5.0),
            ScheduledEvent::connect(1.0, HostId(0), HostId(1)),
            ScheduledEvent::tick(1.0),
        ];
        order_events(&mut events);

        assert_eq!(events[0].event, SimEvent::Connect(HostId(0), HostId(1)));
        assert_eq!(events[1].event, SimEvent::Tick);
        assert_eq!(events[2].time, 5.0);
    }
}
