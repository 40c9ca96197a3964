use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

use monthwise_events::{EventBus, Subscription};
use monthwise_invoicing::InvoiceEvent;

use crate::idempotency::SeenEventStore;
use crate::processing::processor::RevenueEventProcessor;
use crate::revenue_store::RevenueStore;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Revenue worker loop.
///
/// - Subscribes to the invoice event bus
/// - Drives the processor for each delivered event
/// - Supports graceful shutdown
/// - Absorbs every processing failure: the bus outlives anything an event does
#[derive(Debug)]
pub struct RevenueWorker;

impl RevenueWorker {
    /// Spawn a worker thread that processes events from the bus subscription.
    ///
    /// The processor is already idempotent, so at-least-once delivery from
    /// the bus is safe here.
    pub fn spawn<B, S, E>(
        name: &'static str,
        bus: B,
        processor: Arc<RevenueEventProcessor<S, E>>,
    ) -> WorkerHandle
    where
        B: EventBus<InvoiceEvent> + Send + Sync + 'static,
        S: RevenueStore + Send + Sync + 'static,
        E: SeenEventStore + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<InvoiceEvent> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, processor))
            .expect("failed to spawn revenue worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop<S, E>(
    name: &'static str,
    sub: Subscription<InvoiceEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    processor: Arc<RevenueEventProcessor<S, E>>,
) where
    S: RevenueStore,
    E: SeenEventStore,
{
    // The processor is async (store calls, period locks); the worker owns a
    // small current-thread runtime to drive it from this blocking loop.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("failed to build revenue worker runtime");

    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(event) => match rt.block_on(processor.process(&event)) {
                Ok(_) => {}
                Err(err) => {
                    // Loud but contained: an invariant violation is a data
                    // bug to alert on, never a reason to stop consuming.
                    error!(worker = name, error = %err, "revenue processing invariant failure");
                }
            },
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                warn!(worker = name, "event bus disconnected; stopping worker");
                break;
            }
        }
    }
}
