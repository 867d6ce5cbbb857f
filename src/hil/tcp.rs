use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};
use mavlink::common::MavMessage;
use mavlink::error::MessageReadError;
use mavlink::{MavConnection, MavHeader, MavlinkVersion};

use crate::hil::relay::{InboundHandle, MessageRelay};
use crate::hil::{COMPONENT_ID, SYSTEM_ID};

// ---------------------------------------------------------------------------
// TCP MAVLink relay
// ---------------------------------------------------------------------------

type Connection = Arc<Box<dyn MavConnection<MavMessage> + Send + Sync>>;

/// MAVLink v2 transport for the autopilot link. A reader thread feeds every
/// registered handler; sends go out directly with the simulator's system
/// and component ids. The first I/O error in either direction marks the
/// connection closed for good.
pub struct TcpRelay {
    conn: Connection,
    open: Arc<AtomicBool>,
    handlers: Arc<Mutex<Vec<InboundHandle>>>,
    sequence: u8,
}

impl TcpRelay {
    /// Bind the given mavlink address (e.g. `tcpin:0.0.0.0:4560`) and block
    /// until the autopilot connects.
    pub fn listen(address: &str) -> io::Result<Self> {
        let mut conn = mavlink::connect::<MavMessage>(address)?;
        conn.set_protocol_version(MavlinkVersion::V2);

        let conn: Connection = Arc::new(conn);
        let open = Arc::new(AtomicBool::new(true));
        let handlers: Arc<Mutex<Vec<InboundHandle>>> = Arc::new(Mutex::new(Vec::new()));

        let reader_conn = Arc::clone(&conn);
        let reader_open = Arc::clone(&open);
        let reader_handlers = Arc::clone(&handlers);
        thread::Builder::new()
            .name("mavlink-rx".into())
            .spawn(move || loop {
                match reader_conn.recv() {
                    Ok((_header, msg)) => {
                        for handler in reader_handlers.lock().unwrap().iter() {
                            handler.push(msg.clone());
                        }
                    }
                    // malformed frames are dropped, the stream continues
                    Err(MessageReadError::Parse(e)) => debug!("dropping frame: {:?}", e),
                    Err(MessageReadError::Io(e)) => {
                        warn!("autopilot link read failed: {}", e);
                        reader_open.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            })?;

        Ok(Self {
            conn,
            open,
            handlers,
            sequence: 0,
        })
    }
}

impl MessageRelay for TcpRelay {
    fn add_message_handler(&mut self, handler: InboundHandle) {
        self.handlers.lock().unwrap().push(handler);
    }

    fn enqueue_message(&mut self, msg: MavMessage) {
        let header = MavHeader {
            system_id: SYSTEM_ID,
            component_id: COMPONENT_ID,
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);
        if let Err(e) = self.conn.send(&header, &msg) {
            warn!("autopilot link send failed: {:?}", e);
            self.open.store(false, Ordering::SeqCst);
        }
    }

    fn connection_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
