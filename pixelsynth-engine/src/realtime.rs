//! Lock-free split between the control thread and the audio thread.
//!
//! ```text
//!   control thread                         audio thread
//!  ┌──────────────────┐  Command (Box)   ┌──────────────────┐
//!  │ SynthController  │ ───────────────▶ │ SynthProcessor   │
//!  │  parse/validate  │  retired (Box)   │  install + render│
//!  │  apply_message   │ ◀─────────────── │                  │
//!  │  free old state  │  ColumnEvent     │                  │
//!  │                  │ ◀─────────────── │                  │
//!  └──────────────────┘                  └──────────────────┘
//! ```
//!
//! All three channels are bounded SPSC rings (`ringbuf`). The controller does
//! every allocation: it builds each new snapshot, and it frees the snapshots
//! the processor hands back. The processor only moves boxes around, so the
//! render callback never allocates, frees, locks, or blocks.
//!
//! Capacity invariant: the controller drains the retired ring before every
//! push, so at most `commands + 1` boxes can be waiting to be retired. The
//! retired ring is sized accordingly and a push to it cannot fail.

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, trace, warn};

use crate::error::ControlError;
use crate::graph::BlockRenderer;
use crate::message::Message;
use crate::notify::ColumnEvent;
use crate::snapshot::{apply_message, Snapshot};
use crate::synth::Synth;

/// Default depth of the control → audio command ring.
pub const DEFAULT_COMMAND_CAPACITY: usize = 32;

/// Default depth of the audio → control notification ring.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Work item for the audio thread.
#[derive(Debug)]
pub enum Command {
    /// Replace the current snapshot, optionally restarting playback.
    Install { snapshot: Box<Snapshot>, reset: bool },
}

/// Build a connected controller/processor pair with default capacities.
pub fn split_default() -> (SynthController, SynthProcessor) {
    split(DEFAULT_COMMAND_CAPACITY, DEFAULT_EVENT_CAPACITY)
}

/// Build a connected controller/processor pair.
pub fn split(command_capacity: usize, event_capacity: usize) -> (SynthController, SynthProcessor) {
    let command_capacity = command_capacity.max(1);
    let (cmd_tx, cmd_rx) = HeapRb::<Command>::new(command_capacity).split();
    let (old_tx, old_rx) = HeapRb::<Box<Snapshot>>::new(command_capacity + 1).split();
    let (evt_tx, evt_rx) = HeapRb::<ColumnEvent>::new(event_capacity.max(1)).split();

    let controller = SynthController { current: None, commands: cmd_tx, retired: old_rx, events: evt_rx };
    let processor = SynthProcessor { synth: Synth::new(), commands: cmd_rx, retired: old_tx, events: evt_tx };
    (controller, processor)
}

/// Control-thread half: validates messages and publishes snapshots.
pub struct SynthController {
    /// Last snapshot published; `params`/`pixels` are applied on top of it.
    current: Option<Snapshot>,
    commands: HeapProd<Command>,
    retired: HeapCons<Box<Snapshot>>,
    events: HeapCons<ColumnEvent>,
}

impl SynthController {
    /// Apply a message and publish the resulting snapshot.
    ///
    /// `Ok(false)` when the message was ignored (`params`/`pixels` before any
    /// `config`). On `QueueFull` nothing changes and the message can be retried.
    pub fn post(&mut self, message: Message) -> Result<bool, ControlError> {
        self.collect_garbage();
        let kind = message.kind();
        let Some(transition) = apply_message(self.current.as_ref(), message) else {
            debug!(kind, "message ignored: no config received yet");
            return Ok(false);
        };
        let command = Command::Install { snapshot: Box::new(transition.snapshot.clone()), reset: transition.reset };
        if self.commands.try_push(command).is_err() {
            warn!(kind, "command queue full, message dropped");
            return Err(ControlError::QueueFull);
        }
        let snap = &transition.snapshot;
        debug!(
            kind,
            reset = transition.reset,
            width = snap.width(),
            samples_per_column = snap.samples_per_column(),
            "snapshot published"
        );
        self.current = Some(transition.snapshot);
        Ok(true)
    }

    /// Parse a JSON message and [`post`](Self::post) it.
    pub fn post_json(&mut self, text: &str) -> Result<bool, ControlError> {
        let message = Message::from_json(text).map_err(|e| {
            warn!("rejected control message: {e}");
            ControlError::from(e)
        })?;
        self.post(message)
    }

    /// Next pending column notification, if any.
    pub fn pop_event(&mut self) -> Option<ColumnEvent> {
        self.events.try_pop()
    }

    /// Drain every pending column notification.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ColumnEvent> + '_ {
        std::iter::from_fn(move || self.events.try_pop())
    }

    /// Free snapshots the audio thread has replaced. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let mut n = 0;
        while let Some(old) = self.retired.try_pop() {
            drop(old);
            n += 1;
        }
        if n > 0 {
            trace!(freed = n, "retired snapshots released");
        }
        n
    }

    /// Has a `config` been published?
    pub fn is_configured(&self) -> bool {
        self.current.is_some()
    }

    /// The snapshot most recently published (not necessarily installed yet).
    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }
}

/// Audio-thread half: installs snapshots between blocks and renders.
pub struct SynthProcessor {
    synth: Synth,
    commands: HeapCons<Command>,
    retired: HeapProd<Box<Snapshot>>,
    events: HeapProd<ColumnEvent>,
}

impl SynthProcessor {
    /// Install every pending snapshot; the newest wins. Called at block start.
    #[inline]
    fn apply_pending(&mut self) {
        while let Some(Command::Install { snapshot, reset }) = self.commands.try_pop() {
            if let Some(old) = self.synth.install(snapshot, reset) {
                if let Err(old) = self.retired.try_push(old) {
                    // unreachable per the capacity invariant; never free on this thread
                    std::mem::forget(old);
                }
            }
        }
    }

    /// Engine state, for inspection.
    pub fn synth(&self) -> &Synth {
        &self.synth
    }
}

impl BlockRenderer for SynthProcessor {
    fn render_block(&mut self, outputs: &mut [&mut [f32]]) {
        self.apply_pending();
        self.synth.render_planar(outputs, &mut self.events);
    }

    fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        self.apply_pending();
        self.synth.render_interleaved(out, channels, &mut self.events);
    }
}
