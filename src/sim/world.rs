//! Single-threaded contact world
//!
//! Hosts own a router each; links carry at most one transfer, which completes
//! on the first tick after it started. Events are applied in timestamp order
//! and never concurrently.

use crate::buffer::{Eviction, MemoryStore, MessageStore};
use crate::core::{AdmissionResult, ConnectionId, Contact, HostId, Message, PeerView, SimTime};
use crate::metrics::recorder;
use crate::report::{write_reports, OccupancySampler, ReportResult, RouterDiagnostics};
use crate::routing::{ForwardingPolicy, PeerHandle, Reception, Router};
use crate::sim::error::{SimError, SimResult};
use crate::sim::event::{order_events, ScheduledEvent, SimEvent};
use crate::sim::link::{LinkState, SimLink};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Counters kept by the world itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub contacts: u64,
    pub transfers_completed: u64,
    pub deliveries: u64,
    pub receptions_refused: u64,
    pub transfers_dropped_on_disconnect: u64,
}

pub struct World<P> {
    routers: Vec<Option<Router<P, MemoryStore>>>,
    index: BTreeMap<HostId, usize>,
    links: BTreeMap<ConnectionId, LinkState>,
    next_connection: u64,
    now: SimTime,
    sampler: OccupancySampler,
    stats: WorldStats,
}

impl<P: ForwardingPolicy + 'static> World<P> {
    pub fn new(routers: Vec<Router<P, MemoryStore>>) -> Self {
        let index = routers
            .iter()
            .enumerate()
            .map(|(i, r)| (r.host(), i))
            .collect();
        Self {
            routers: routers.into_iter().map(Some).collect(),
            index,
            links: BTreeMap::new(),
            next_connection: 1,
            now: 0.0,
            sampler: OccupancySampler::default(),
            stats: WorldStats::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: OccupancySampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn stats(&self) -> &WorldStats {
        &self.stats
    }

    pub fn sampler(&self) -> &OccupancySampler {
        &self.sampler
    }

    pub fn hosts(&self) -> impl Iterator<Item = HostId> + '_ {
        self.index.keys().copied()
    }

    pub fn router(&self, host: HostId) -> Option<&Router<P, MemoryStore>> {
        let idx = *self.index.get(&host)?;
        self.routers.get(idx)?.as_ref()
    }

    pub fn router_mut(&mut self, host: HostId) -> Option<&mut Router<P, MemoryStore>> {
        let idx = *self.index.get(&host)?;
        self.routers.get_mut(idx)?.as_mut()
    }

    pub fn connection_between(&self, a: HostId, b: HostId) -> Option<ConnectionId> {
        self.links.values().find(|l| l.joins(a, b)).map(|l| l.id)
    }

    pub fn link(&self, id: ConnectionId) -> Option<&LinkState> {
        self.links.get(&id)
    }

    /// Originate a message at its source host
    pub fn create_message(&mut self, message: Message) -> SimResult<AdmissionResult<Eviction>> {
        let from = message.from;
        let router = self.router_mut(from).ok_or(SimError::UnknownHost(from))?;
        Ok(router.create_message(message))
    }

    /// Apply a batch of events in timestamp order
    pub fn run(&mut self, mut events: Vec<ScheduledEvent>) -> SimResult<()> {
        order_events(&mut events);
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, scheduled: ScheduledEvent) -> SimResult<()> {
        if scheduled.time < self.now {
            return Err(SimError::TimeReversed {
                event: scheduled.time,
                now: self.now,
            });
        }
        self.now = scheduled.time;

        match scheduled.event {
            SimEvent::Connect(a, b) => self.connect(a, b).map(|_| ()),
            SimEvent::Disconnect(a, b) => self.disconnect(a, b),
            SimEvent::Tick => {
                self.tick();
                Ok(())
            }
        }
    }

    fn slot(&self, host: HostId) -> SimResult<usize> {
        self.index.get(&host).copied().ok_or(SimError::UnknownHost(host))
    }

    /// Bring a contact up and run both routers' contact-up handling
    pub fn connect(&mut self, a: HostId, b: HostId) -> SimResult<ConnectionId> {
        if a == b {
            return Err(SimError::SelfContact(a));
        }
        self.slot(a)?;
        self.slot(b)?;
        if self.connection_between(a, b).is_some() {
            return Err(SimError::AlreadyConnected(a, b));
        }

        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        self.links.insert(id, LinkState::new(id, a, b));
        self.stats.contacts += 1;
        tracing::debug!("{} up between {} and {} at {:.1}", id, a, b, self.now);

        for host in [a, b] {
            let now = self.now;
            self.with_router(host, |router, contacts| {
                router.on_contact_up(id, contacts, now);
            })?;
        }
        Ok(id)
    }

    /// Tear a contact down; an unfinished transfer on it is lost
    pub fn disconnect(&mut self, a: HostId, b: HostId) -> SimResult<()> {
        let id = self
            .connection_between(a, b)
            .ok_or(SimError::NotConnected(a, b))?;

        if let Some(link) = self.links.get_mut(&id) {
            link.up = false;
            if let Some(t) = link.transfer.take() {
                tracing::debug!(
                    "{} down with {} in flight, transfer lost",
                    id,
                    t.in_flight.message_id
                );
                self.stats.transfers_dropped_on_disconnect += 1;
            }
        }

        let busy = self.busy_hosts();
        for (host, other) in [(a, b), (b, a)] {
            let mine = self.slot(host)?;
            let theirs = self.slot(other)?;
            let Some(mut router) = self.routers[mine].take() else {
                continue;
            };
            if let Some(peer) = self.routers[theirs].as_ref() {
                let view = peer.as_peer(busy.contains(&other));
                router.on_contact_down(id, &view, self.now);
            }
            self.routers[mine] = Some(router);
        }

        self.links.remove(&id);
        Ok(())
    }

    /// Complete finished transfers, let every router try one new transfer,
    /// then sample buffer occupancy
    pub fn tick(&mut self) {
        self.complete_transfers();

        let hosts: Vec<HostId> = self.index.keys().copied().collect();
        let now = self.now;
        for host in hosts {
            if let Err(e) = self.with_router(host, |router, contacts| {
                router.update(contacts, now);
            }) {
                tracing::warn!("Skipped update for {} at {:.1}: {}", host, now, e);
            }
        }

        let occupancy: Vec<(HostId, f64)> = self
            .routers
            .iter()
            .flatten()
            .map(|r| (r.host(), r.store().occupancy()))
            .collect();
        for (host, pct) in &occupancy {
            recorder::set_buffer_occupancy(*host, *pct);
        }
        self.sampler.observe(now, occupancy);
    }

    fn complete_transfers(&mut self) {
        let now = self.now;
        let done: Vec<ConnectionId> = self
            .links
            .values()
            .filter(|l| l.transfer.as_ref().map(|t| t.started_at < now).unwrap_or(false))
            .map(|l| l.id)
            .collect();

        for id in done {
            let Some(transfer) = self.links.get_mut(&id).and_then(|l| l.transfer.take()) else {
                continue;
            };
            let from = transfer.in_flight.from;
            if let Some(sender) = self.router_mut(from) {
                sender.on_transfer_done(id);
            }

            let Some(receiver) = self.router_mut(transfer.to) else {
                continue;
            };
            let outcome = receiver.receive_message(transfer.message.replicate(now), now);
            self.stats.transfers_completed += 1;
            match outcome {
                Ok(Reception::Delivered { .. }) => self.stats.deliveries += 1,
                Ok(Reception::Stored { .. }) => {}
                Err(e) => {
                    tracing::debug!(
                        "{} refused {} from {}: {}",
                        transfer.to,
                        transfer.in_flight.message_id,
                        from,
                        e
                    );
                    self.stats.receptions_refused += 1;
                }
            }
        }
    }

    fn busy_hosts(&self) -> HashSet<HostId> {
        self.links
            .values()
            .filter(|l| l.is_busy())
            .flat_map(|l| [l.a, l.b])
            .collect()
    }

    /// Run `f` on `host`'s router with every live contact it has
    fn with_router<F>(&mut self, host: HostId, f: F) -> SimResult<()>
    where
        F: FnOnce(&mut Router<P, MemoryStore>, &mut [Contact<'_>]),
    {
        let idx = self.slot(host)?;
        let Some(mut router) = self.routers[idx].take() else {
            return Err(SimError::UnknownHost(host));
        };

        let busy = self.busy_hosts();
        let now = self.now;
        {
            let routers = &self.routers;
            let index = &self.index;

            let handles: Vec<(ConnectionId, PeerHandle<'_, P, MemoryStore>)> = self
                .links
                .values()
                .filter(|l| l.up && l.touches(host))
                .filter_map(move |l| {
                    let other = l.other_end(host);
                    let peer = routers.get(*index.get(&other)?)?.as_ref()?;
                    Some((l.id, peer.as_peer(busy.contains(&other))))
                })
                .collect();

            let mut links: Vec<SimLink<'_>> = self
                .links
                .values_mut()
                .filter(|l| handles.iter().any(|(id, _)| *id == l.id))
                .zip(handles.iter())
                .map(|(state, (_, peer))| SimLink::new(state, peer as &dyn PeerView, now))
                .collect();

            let mut contacts: Vec<Contact<'_>> = links
                .iter_mut()
                .zip(handles.iter())
                .map(|(link, (_, peer))| Contact::new(link, peer))
                .collect();

            f(&mut router, &mut contacts);
        }

        self.routers[idx] = Some(router);
        Ok(())
    }

    pub fn diagnostics(&self) -> Vec<RouterDiagnostics> {
        self.routers
            .iter()
            .flatten()
            .map(|r| r.diagnostics(self.now))
            .collect()
    }

    pub fn write_reports(&self, dir: impl AsRef<Path>) -> ReportResult<()> {
        write_reports(dir, &self.diagnostics(), &self.sampler, self.now)
    }
}
