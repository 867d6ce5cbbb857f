use std::sync::mpsc::{channel, Receiver, Sender};

use mavlink::common::MavMessage;

// ---------------------------------------------------------------------------
// Frame transport and inbound queue
// ---------------------------------------------------------------------------

/// Bidirectional MAVLink frame transport.
///
/// Implementations own the I/O side: outbound frames are fire-and-forget
/// (a failed send marks the connection closed, the simulation keeps
/// running), inbound frames are pushed into every registered handler from
/// whatever thread the transport reads on.
pub trait MessageRelay {
    fn add_message_handler(&mut self, handler: InboundHandle);
    fn enqueue_message(&mut self, msg: MavMessage);
    fn connection_open(&self) -> bool;
}

/// Multi-producer single-consumer queue of inbound frames. The transport's
/// reader thread pushes through cloned [`InboundHandle`]s; the simulation
/// thread pops everything at the top of each tick.
#[derive(Debug)]
pub struct MessageQueue {
    tx: Sender<MavMessage>,
    rx: Receiver<MavMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// A cloneable push-side handle for the transport.
    pub fn handle(&self) -> InboundHandle {
        InboundHandle {
            tx: self.tx.clone(),
        }
    }

    /// Pop the next queued frame, if any. Never blocks.
    pub fn try_pop(&mut self) -> Option<MavMessage> {
        self.rx.try_recv().ok()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe push side of a [`MessageQueue`].
#[derive(Debug, Clone)]
pub struct InboundHandle {
    tx: Sender<MavMessage>,
}

impl InboundHandle {
    /// Enqueue a frame. Frames pushed after the queue is gone are dropped.
    pub fn push(&self, msg: MavMessage) {
        let _ = self.tx.send(msg);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
