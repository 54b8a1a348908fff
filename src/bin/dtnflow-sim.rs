use anyhow::{bail, Context};
use dtnflow::config::RouterSettings;
use dtnflow::core::{HostId, Message};
use dtnflow::metrics::{start_metrics_server, MetricsConfig};
use dtnflow::routing::{EpidemicRouter, ForwardingPolicy, ProphetRouter};
use dtnflow::sim::{ScheduledEvent, World};
use dtnflow::report::OccupancySampler;
use dtnflow::MemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Options {
    router: String,
    settings: Option<PathBuf>,
    hosts: u32,
    duration: u32,
    seed: u64,
    buffer: u64,
    metrics: Option<SocketAddr>,
    report_dir: Option<PathBuf>,
    occupancy_interval: Option<f64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            router: "epidemic".to_string(),
            settings: None,
            hosts: 8,
            duration: 7200,
            seed: 42,
            buffer: 5_000_000,
            metrics: None,
            report_dir: None,
            occupancy_interval: None,
        }
    }
}

impl Options {
    fn from_args() -> anyhow::Result<Self> {
        let mut opts = Options::default();
        let mut args = std::env::args().skip(1);

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .with_context(|| format!("missing value for {}", flag))
            };
            match flag.as_str() {
                "--router" => opts.router = value()?,
                "--settings" => opts.settings = Some(PathBuf::from(value()?)),
                "--hosts" => opts.hosts = value()?.parse().context("--hosts")?,
                "--duration" => opts.duration = value()?.parse().context("--duration")?,
                "--seed" => opts.seed = value()?.parse().context("--seed")?,
                "--buffer" => opts.buffer = value()?.parse().context("--buffer")?,
                "--metrics" => opts.metrics = Some(value()?.parse().context("--metrics")?),
                "--report-dir" => opts.report_dir = Some(PathBuf::from(value()?)),
                "--occupancy-interval" => {
                    opts.occupancy_interval =
                        Some(value()?.parse().context("--occupancy-interval")?)
                }
                other => bail!("unknown argument: {}", other),
            }
        }

        if opts.hosts < 2 {
            bail!("need at least two hosts");
        }
        if matches!(opts.occupancy_interval, Some(i) if !(i > 0.0)) {
            bail!("--occupancy-interval must be positive");
        }
        Ok(opts)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let opts = Options::from_args()?;

    let settings = match &opts.settings {
        Some(path) => RouterSettings::from_path(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => RouterSettings::default(),
    };

    // the command line wins over the settings document
    let interval = match opts.occupancy_interval {
        Some(interval) => interval,
        None => settings.occupancy_interval()?,
    };
    let sampler = OccupancySampler::new(interval);

    if let Some(addr) = opts.metrics {
        start_metrics_server(MetricsConfig::with_addr(addr))?;
        tracing::info!("Metrics exported on http://{}/metrics", addr);
    }

    match opts.router.as_str() {
        "epidemic" => {
            let config = settings.epidemic()?;
            let routers = (0..opts.hosts)
                .map(|i| EpidemicRouter::epidemic(HostId(i), config, MemoryStore::new(opts.buffer)))
                .collect::<Result<Vec<_>, _>>()?;
            run(World::new(routers).with_sampler(sampler), &opts)
        }
        "prophet" => {
            let config = settings.prophet()?;
            let routers = (0..opts.hosts)
                .map(|i| ProphetRouter::prophet(HostId(i), config, MemoryStore::new(opts.buffer)))
                .collect::<Result<Vec<_>, _>>()?;
            run(World::new(routers).with_sampler(sampler), &opts)
        }
        other => bail!("unknown router type: {} (expected epidemic or prophet)", other),
    }
}

/// Random pairwise contacts, one message every 30 seconds, one tick per second
fn run<P: ForwardingPolicy + 'static>(mut world: World<P>, opts: &Options) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut active: Vec<(f64, HostId, HostId)> = Vec::new();
    let mut created = 0u64;

    tracing::info!(
        "Running {} hosts for {}s with {} routing (seed {})",
        opts.hosts,
        opts.duration,
        opts.router,
        opts.seed
    );

    for second in 0..=opts.duration {
        let now = second as f64;

        let (ended, still): (Vec<_>, Vec<_>) = active.into_iter().partition(|(end, _, _)| *end <= now);
        active = still;
        for (_, a, b) in ended {
            world.apply(ScheduledEvent::disconnect(now, a, b))?;
        }

        if rng.gen_bool(0.1) {
            let a = HostId(rng.gen_range(0..opts.hosts));
            let b = HostId(rng.gen_range(0..opts.hosts));
            if a != b && world.connection_between(a, b).is_none() {
                world.apply(ScheduledEvent::connect(now, a, b))?;
                active.push((now + rng.gen_range(5.0..60.0), a, b));
            }
        }

        if second % 30 == 0 {
            let from = HostId(rng.gen_range(0..opts.hosts));
            let mut to = HostId(rng.gen_range(0..opts.hosts));
            if to == from {
                to = HostId((from.0 + 1) % opts.hosts);
            }
            let size = rng.gen_range(50_000..500_000);
            let message = Message::new(format!("M{}", created), from, to, size, now).with_ttl(6.0 * 3600.0);
            created += 1;
            if let Err(e) = world.create_message(message)? {
                tracing::debug!("{} could not originate a message: {}", from, e);
            }
        }

        world.apply(ScheduledEvent::tick(now))?;
    }

    for (_, a, b) in active {
        world.apply(ScheduledEvent::disconnect(world.now(), a, b))?;
    }

    summarize(&mut world, created);

    if let Some(dir) = &opts.report_dir {
        world.write_reports(dir)?;
        tracing::info!("Reports written to {}", dir.display());
    } else {
        println!("{}", dtnflow::report::to_json(&world.diagnostics(), world.now())?);
    }
    Ok(())
}

fn summarize<P: ForwardingPolicy + 'static>(world: &mut World<P>, created: u64) {
    let stats = world.stats().clone();
    tracing::info!(
        "{} contacts, {} transfers completed, {} deliveries of {} messages created",
        stats.contacts,
        stats.transfers_completed,
        stats.deliveries,
        created
    );

    let now = world.now();
    let hosts: Vec<HostId> = world.hosts().collect();
    for host in hosts {
        if let Some(router) = world.router_mut(host) {
            tracing::info!("{}", router.routing_info(now));
        }
    }
}
