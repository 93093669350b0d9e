//! Periodic recomputation of the dashboard clocks

use crate::{
    clock::{compute_display, Clock, ClockDisplay},
    location::Location,
    settings::Settings,
    store::LocationStore,
};
use anyhow::anyhow;
use log::{error, info, trace, warn};
use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc, RwLock,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// One card on the dashboard
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub location: Location,
    pub display: ClockDisplay,
}

/// Everything needed to draw the dashboard at one instant
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub cards: Vec<Card>,
    pub settings: Settings,
}

/// Messages from the ticker handle to its worker thread
enum Signal {
    /// Run a cycle now instead of waiting for the next period
    Refresh,
    Stop,
}

/// Recomputes display strings for every saved location on a fixed interval,
/// while running. The ticker only ever reads the store.
pub struct ClockTicker {
    clock: Arc<dyn Clock>,
    worker: Option<Worker>,
}

struct Worker {
    signal: Sender<Signal>,
    handle: JoinHandle<()>,
}

impl ClockTicker {
    pub const INTERVAL: Duration = Duration::from_millis(1000);

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start ticking. The first cycle runs immediately, then once per
    /// [Self::INTERVAL]. The sink is only called when the frame differs from
    /// the last one it was given. If already running, the old cycle is
    /// stopped first.
    pub fn start<F>(&mut self, store: Arc<RwLock<LocationStore>>, mut sink: F)
    where
        F: 'static + Send + FnMut(&Frame),
    {
        self.stop();
        info!("Starting clock ticker");

        let (signal, receiver) = mpsc::channel();
        let clock = Arc::clone(&self.clock);
        let handle = thread::spawn(move || {
            let mut last_frame: Option<Frame> = None;
            loop {
                trace!("Running clock tick");
                match build_frame(&*clock, &store) {
                    Ok(frame) => {
                        if last_frame.as_ref() != Some(&frame) {
                            sink(&frame);
                            last_frame = Some(frame);
                        }
                    }
                    Err(err) => error!("Error computing clocks: {err:?}"),
                }

                match receiver.recv_timeout(Self::INTERVAL) {
                    Ok(Signal::Refresh) | Err(RecvTimeoutError::Timeout) => {}
                    Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => {
                        break;
                    }
                }
            }
            info!("Clock ticker stopped");
        });
        self.worker = Some(Worker { signal, handle });
    }

    /// Recompute right away, e.g. after the list or settings changed. Does
    /// nothing if stopped.
    pub fn refresh(&self) {
        if let Some(worker) = &self.worker {
            // Failure means the thread is gone, which stop() will deal with
            let _ = worker.signal.send(Signal::Refresh);
        }
    }

    /// Stop ticking and wait for the cycle to finish. Safe to call when not
    /// running.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.signal.send(Signal::Stop);
            if worker.handle.join().is_err() {
                warn!("Clock ticker thread panicked");
            }
        }
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Compute every card from the latest state of the store
fn build_frame(
    clock: &dyn Clock,
    store: &RwLock<LocationStore>,
) -> anyhow::Result<Frame> {
    let now = clock.now();
    // Stringify the error to dump the lifetime
    let store = store.read().map_err(|err| anyhow!("{err}"))?;
    let settings = store.settings();
    let cards = store
        .locations()
        .iter()
        .map(|location| Card {
            location: location.clone(),
            display: compute_display(location, now, settings.date_format),
        })
        .collect();
    Ok(Frame { cards, settings })
}
