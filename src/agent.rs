use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use anyhow::{Result, anyhow};
use clap::{ArgMatches, value_t, values_t};
use crossbeam_channel::bounded;
use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;
use oracle_api::Client;
use crate::args::opt;
use crate::capture::{self, Queue, Source, Work};
use crate::classify::Classify;
use crate::store::{self, Store};

pub fn agent(args: &ArgMatches) -> Result<()> {
    let device     = value_t!(args, "device",     String)?;
    let oracle     = value_t!(args, "oracle-url", String)?;
    let path       = value_t!(args, "store",      String)?;
    let ports_path = value_t!(args, "ports",      String)?;
    let batch_size = value_t!(args, "batch-size", usize)?;
    let queue_size = value_t!(args, "queue-size", usize)?;
    let keep       = values_t!(args, "keep",      String)?;
    let timeout    = opt(args.value_of("timeout"))?.unwrap_or(30u64);

    let cfg = capture::Config {
        device:      device,
        interval:    Duration::from_millis(100),
        buffer_size: 10_000_000,
        snaplen:     65_535,
        promisc:     true,
    };

    info!("bootstrapping");

    let mut store = Store::open(&path)?;
    store.init()?;

    if store.ports_empty()? {
        info!("known ports table empty, seeding from {}", ports_path);
        store.seed_ports(&store::load(&ports_path)?)?;
    }

    let ports = store.known_ports()?;
    if ports.is_empty() {
        return Err(anyhow!("no known ports available"));
    }

    store.truncate_except(&keep)?;

    let client = Client::new(&oracle, Duration::from_secs(timeout))?;

    let (tx, rx) = bounded(queue_size);

    let queue = Arc::new(Queue::new(batch_size, tx.clone()));
    queue.reset();

    let mut classify = Classify::new(client, store)?;
    classify.reset();

    let shutdown = Arc::new(AtomicBool::new(false));
    register(SIGTERM, shutdown.clone())?;
    register(SIGINT,  shutdown.clone())?;

    let mut source = Source::new(cfg, Arc::new(ports), queue, shutdown.clone());

    info!("running");

    let producer = thread::spawn(move || source.poll());
    let consumer = thread::spawn(move || classify.run(rx));

    while !shutdown.load(Ordering::Acquire) {
        if producer.is_finished() || consumer.is_finished() {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    // stop the producer first so its drained remainder reaches the
    // consumer ahead of the shutdown sentinel
    shutdown.store(true, Ordering::Release);
    let produced = join(producer, "producer");

    tx.send(Work::Shutdown).ok();
    let consumed = join(consumer, "consumer");

    info!("stopped");

    produced.and(consumed)
}

fn join(handle: thread::JoinHandle<Result<()>>, name: &str) -> Result<()> {
    match handle.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("{} failed: {:?}", name, e);
            Err(e)
        }
        Err(_)     => {
            error!("{} panicked", name);
            Err(anyhow!("{} panicked", name))
        }
    }
}
