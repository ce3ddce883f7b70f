use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::session::ViewerSession;

/// Images warmed on each side of the current index.
pub const WINDOW_RADIUS: usize = 2;

/// Upper bound on the gap between warm cycles while loading is enabled.
/// Navigation wakes the thread immediately, so this only matters when
/// something else (a rescan, an external file change) moved the target.
const ACTIVE_CYCLE: Duration = Duration::from_millis(200);
/// Poll interval while loading is disabled.
const IDLE_POLL: Duration = Duration::from_millis(100);

struct Flags {
    stop: bool,
    enabled: bool,
    kicked: bool,
}

/// Wake/stop channel between the UI and the prefetch thread. Navigation
/// never waits on the prefetcher; it only flips a flag and notifies.
pub struct PrefetchSignal {
    state: Mutex<Flags>,
    cond: Condvar,
}

impl PrefetchSignal {
    fn new() -> Self {
        Self {
            state: Mutex::new(Flags {
                stop: false,
                enabled: false,
                kicked: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Request an immediate warm cycle (called after navigation).
    pub fn wake(&self) {
        self.state.lock().unwrap().kicked = true;
        self.cond.notify_all();
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut flags = self.state.lock().unwrap();
        flags.enabled = enabled;
        flags.kicked = true;
        drop(flags);
        self.cond.notify_all();
    }

    fn request_stop(&self) {
        self.state.lock().unwrap().stop = true;
        self.cond.notify_all();
    }

    fn stopping(&self) -> bool {
        self.state.lock().unwrap().stop
    }
}

/// The background warm loop as a structured thread: spawned with the
/// session it serves, joined on shutdown so no cached handle can be
/// created after teardown begins.
pub struct Prefetcher {
    handle: Option<JoinHandle<()>>,
    signal: Arc<PrefetchSignal>,
}

impl Prefetcher {
    pub fn spawn(session: Arc<ViewerSession>) -> Self {
        let signal = Arc::new(PrefetchSignal::new());
        let thread_signal = Arc::clone(&signal);
        let handle = thread::spawn(move || run(&session, &thread_signal));
        Self {
            handle: Some(handle),
            signal,
        }
    }

    pub fn signal(&self) -> Arc<PrefetchSignal> {
        Arc::clone(&self.signal)
    }

    /// Signal stop and wait for the loop to exit. Call before dropping the
    /// session.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.signal.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(session: &ViewerSession, signal: &PrefetchSignal) {
    log::debug!("prefetch thread started");
    loop {
        let enabled = {
            let mut flags = signal.state.lock().unwrap();
            if !flags.stop && !flags.kicked {
                let timeout = if flags.enabled { ACTIVE_CYCLE } else { IDLE_POLL };
                flags = signal.cond.wait_timeout(flags, timeout).unwrap().0;
            }
            if flags.stop {
                break;
            }
            flags.kicked = false;
            flags.enabled
        };

        if enabled {
            warm_cycle(session, signal);
            session.cache().evict_excess();
        }
    }
    log::debug!("prefetch thread stopped");
}

/// Warm `[index - RADIUS, index + RADIUS]` against the current snapshot.
/// The snapshot is taken once per cycle; a concurrent file-set replacement
/// self-corrects on the next cycle.
fn warm_cycle(session: &ViewerSession, signal: &PrefetchSignal) {
    let files = session.files_snapshot();
    let len = files.len();
    if len == 0 {
        return;
    }

    let center = session.current_index() as i64;
    let radius = WINDOW_RADIUS as i64;
    for delta in -radius..=radius {
        if signal.stopping() {
            return;
        }
        let index = wrap_index(center + delta, len);
        if let Some(path) = files.get(index) {
            session.cache().put_if_absent(path);
        }
    }
}

/// Euclidean modulo of a possibly-negative index into a non-empty set.
pub fn wrap_index(index: i64, len: usize) -> usize {
    let n = len as i64;
    ((index % n + n) % n) as usize
}
