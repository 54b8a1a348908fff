//! Shared world builders for the integration tests

#![allow(dead_code)]

use dtnflow::config::{ProphetConfig, RouterConfig};
use dtnflow::core::{HostId, Message};
use dtnflow::routing::{EpidemicPolicy, EpidemicRouter, ProphetPolicy, ProphetRouter};
use dtnflow::sim::World;
use dtnflow::MemoryStore;

pub const A: HostId = HostId(0);
pub const B: HostId = HostId(1);
pub const C: HostId = HostId(2);
pub const D: HostId = HostId(3);

pub fn epidemic_world(hosts: u32, capacity: u64, config: RouterConfig) -> World<EpidemicPolicy> {
    let routers = (0..hosts)
        .map(|i| EpidemicRouter::epidemic(HostId(i), config, MemoryStore::new(capacity)).unwrap())
        .collect();
    World::new(routers)
}

pub fn prophet_world(hosts: u32, capacity: u64, seconds_per_time_unit: u32) -> World<ProphetPolicy> {
    let config = ProphetConfig::new(seconds_per_time_unit)
        .with_router(RouterConfig::default().with_send_queue(dtnflow::config::QueueMode::Fifo));
    let routers = (0..hosts)
        .map(|i| ProphetRouter::prophet(HostId(i), config, MemoryStore::new(capacity)).unwrap())
        .collect();
    World::new(routers)
}

pub fn message(id: &str, from: HostId, to: HostId, size: u64, at: f64) -> Message {
    Message::new(id, from, to, size, at)
}
