//! Delivery sinks.
//!
//! The dispatch policy hands confirmed alert events to a sink. `InlineSink`
//! delivers synchronously (tests, demo); `AlertWorker` moves delivery onto a
//! background thread behind a bounded queue so a slow SMS gateway can never
//! stall frame processing. Either way delivery failures are logged and
//! dropped; nothing flows back into the perception loop.

use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;

use crate::alert::transport::{AlertTransport, SoundTransport};
use crate::alert::AlertEvent;

/// Consumes alert events for external delivery. `submit` must never block.
pub trait AlertSink: Send {
    fn submit(&mut self, event: AlertEvent);
}

fn deliver(alert: &mut dyn AlertTransport, sound: &mut dyn SoundTransport, event: &AlertEvent) {
    if let Err(e) = alert.send_alert(event) {
        log::error!("alert delivery failed via {}: {}", alert.name(), e);
    }
    if let Err(e) = sound.play_alarm() {
        log::error!("alarm playback failed via {}: {}", sound.name(), e);
    }
}

/// Synchronous sink. Errors are caught and logged here; callers see nothing.
pub struct InlineSink {
    alert: Box<dyn AlertTransport>,
    sound: Box<dyn SoundTransport>,
}

impl InlineSink {
    pub fn new(alert: Box<dyn AlertTransport>, sound: Box<dyn SoundTransport>) -> Self {
        Self { alert, sound }
    }
}

impl AlertSink for InlineSink {
    fn submit(&mut self, event: AlertEvent) {
        deliver(self.alert.as_mut(), self.sound.as_mut(), &event);
    }
}

/// Background delivery worker.
///
/// Jobs carry the already-captured event payload only; the worker never
/// touches episode or buffer state. A full queue drops the newest job with
/// a warning rather than blocking the submitting tick. Shutdown is channel
/// disconnect: dropping the handle drops the sender, the worker drains
/// whatever is queued, and `recv` then errors out of the loop.
pub struct AlertWorker {
    tx: Option<SyncSender<AlertEvent>>,
    join: Option<JoinHandle<()>>,
}

impl AlertWorker {
    pub fn spawn(
        mut alert: Box<dyn AlertTransport>,
        mut sound: Box<dyn SoundTransport>,
        queue_depth: usize,
    ) -> Self {
        let (tx, rx) = mpsc::sync_channel::<AlertEvent>(queue_depth.max(1));
        let join = std::thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                deliver(alert.as_mut(), sound.as_mut(), &event);
            }
        });
        Self {
            tx: Some(tx),
            join: Some(join),
        }
    }
}

impl AlertSink for AlertWorker {
    fn submit(&mut self, event: AlertEvent) {
        let Some(tx) = &self.tx else { return };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("alert queue full, dropping alert for {}", event.label);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::error!("alert worker gone, dropping alert");
            }
        }
    }
}

impl Drop for AlertWorker {
    fn drop(&mut self) {
        // The sender must be gone before the join, or a full queue would
        // leave the worker parked in recv forever.
        drop(self.tx.take());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}
