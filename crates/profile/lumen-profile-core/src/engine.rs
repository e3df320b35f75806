//! The render loop: one dedicated thread ticking the composer at a fixed
//! interval.
//!
//! The composer sits behind a mutex that the tick thread acquires only at
//! tick boundaries. Editors and hosts grab the same lock between ticks, so a
//! structural mutation is visible atomically to the next frame and never
//! observed mid-traversal. Stopping joins the thread after the current tick
//! finishes; there is no mid-tick cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::composer::{Composer, FrameReport};
use crate::error::ProfileError;

/// Delta-time source for the tick loop.
pub trait Clock: Send {
    /// Seconds elapsed since the previous call.
    fn delta(&mut self) -> f32;
}

/// Wall-clock deltas.
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

pub struct ProfileEngine {
    composer: Arc<Mutex<Composer>>,
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProfileEngine {
    pub fn new(composer: Composer, interval: Duration) -> Self {
        Self {
            composer: Arc::new(Mutex::new(composer)),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Shared handle to the composer. Hold the lock briefly; the tick thread
    /// waits on it at the next tick boundary.
    pub fn composer(&self) -> Arc<Mutex<Composer>> {
        Arc::clone(&self.composer)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the loop on the system clock, logging element errors and
    /// discarding frame reports.
    pub fn start(&mut self) -> Result<(), ProfileError> {
        self.start_with(SystemClock::new(), |_report| {})
    }

    /// Start the loop with a custom clock and per-frame sink. The sink runs
    /// on the tick thread after the composer lock is released.
    pub fn start_with<C, F>(&mut self, mut clock: C, mut on_frame: F) -> Result<(), ProfileError>
    where
        C: Clock + 'static,
        F: FnMut(FrameReport) + Send + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ProfileError::AlreadyRunning);
        }
        let composer = Arc::clone(&self.composer);
        let running = Arc::clone(&self.running);
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("lumen-render".into())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    let tick_started = Instant::now();
                    let dt = clock.delta().max(0.0);
                    let report = match composer.lock() {
                        Ok(mut guard) => guard.tick(dt),
                        Err(_) => {
                            log::error!("composer lock poisoned; render loop exiting");
                            running.store(false, Ordering::SeqCst);
                            break;
                        }
                    };
                    for err in &report.errors {
                        log::error!(
                            "element '{}' ({:?}) failed this frame: {}",
                            err.name,
                            err.element,
                            err.error
                        );
                    }
                    on_frame(report);

                    let elapsed = tick_started.elapsed();
                    if elapsed < interval {
                        thread::sleep(interval - elapsed);
                    }
                }
            })
            .map_err(|_| ProfileError::ThreadSpawn);

        match handle {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Halt the loop after the in-flight tick completes and join the thread.
    pub fn stop(&mut self) -> Result<(), ProfileError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ProfileError::NotRunning);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("render thread panicked before shutdown");
            }
        }
        Ok(())
    }
}

impl Drop for ProfileEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
