use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kisstnc_frame::{Ax25Frame, FrameConfig, FrameError, FrameReader, FrameWriter, EXIT_KISS};
use kisstnc_transport::{Link, TransportError};
#[cfg(unix)]
use kisstnc_transport::SerialPort;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::state::SessionState;
use crate::tnc::{
    command_delay, data_frame_delay, TncCommand, CONFIGURE_SEQUENCE, KISS_ON, RESET_COMMAND,
};

/// A session on a tty serial port.
#[cfg(unix)]
pub type SerialSession = Session<SerialPort>;

/// Counters for one session, across reconnects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// AX.25 frames delivered to the inbound queue.
    pub frames_received: u64,
    /// KISS data frames written to the TNC.
    pub frames_sent: u64,
    /// Partial frames dropped for exceeding the accumulator capacity.
    pub overflows: u64,
    /// Complete frames dropped by the AX.25 parser.
    pub parse_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    frames_received: AtomicU64,
    frames_sent: AtomicU64,
    overflows: AtomicU64,
    parse_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
        }
    }
}

struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// A connection to a TNC in KISS mode.
///
/// All writes go through `&mut self`, so a configuration command, a data frame
/// and its pacing delay never interleave with another write. Inbound bytes are
/// drained by a single reader thread that owns the stream decoder and hands
/// parsed frames over a bounded channel, in arrival order.
///
/// Dropping the session disconnects it.
pub struct Session<L: Link> {
    config: SessionConfig,
    state: Arc<Mutex<SessionState>>,
    counters: Arc<Counters>,
    writer: Option<FrameWriter<L>>,
    frames: Option<Receiver<Ax25Frame>>,
    reader: Option<ReaderHandle>,
}

impl<L: Link> Session<L> {
    /// Create a disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(SessionState::Disconnected)),
            counters: Arc::new(Counters::default()),
            writer: None,
            frames: None,
            reader: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state. A link failure seen by the reader thread shows up here as `Disconnected`.
    pub fn state(&self) -> SessionState {
        load_state(&self.state)
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    /// Open the link, configure the TNC and switch it into KISS mode.
    ///
    /// Any failure aborts the sequence and leaves the session `Disconnected`.
    pub fn connect(&mut self) -> Result<()> {
        let state = self.state();
        if state != SessionState::Disconnected {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state,
            });
        }

        // A reader that died on its own still holds its half of the link.
        self.release();
        self.set_state(SessionState::Connecting);
        info!(path = ?self.config.serial.path, "connecting to TNC");

        match self.open_and_configure() {
            Ok(()) => {
                info!(path = ?self.config.serial.path, "TNC in KISS mode");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "connect failed");
                self.release();
                self.set_state(SessionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Leave KISS mode and reset the TNC. The link stays open, in `Configured`.
    pub fn reset(&mut self) -> Result<()> {
        let state = self.state();
        if !matches!(state, SessionState::Configured | SessionState::Active) {
            return Err(SessionError::InvalidState {
                operation: "reset",
                state,
            });
        }

        if let Err(err) = self.write_reset() {
            warn!(error = %err, "reset failed; session disconnected");
            self.release();
            self.set_state(SessionState::Disconnected);
            return Err(err);
        }
        self.set_state(SessionState::Configured);
        info!("TNC left KISS mode");
        Ok(())
    }

    /// Reset the TNC if it is reachable, then release the link.
    ///
    /// Always ends `Disconnected`; calling it again is a no-op.
    pub fn disconnect(&mut self) {
        let state = self.state();
        if matches!(state, SessionState::Configured | SessionState::Active) {
            if let Err(err) = self.write_reset() {
                warn!(error = %err, "reset during disconnect failed");
            }
        }

        let had_link = self.release();
        self.set_state(SessionState::Disconnected);
        if had_link {
            info!(path = ?self.config.serial.path, "disconnected from TNC");
        }
    }

    /// Send `payload` (an AX.25 frame without FCS) as one KISS data frame.
    ///
    /// A write failure is a link failure: the session disconnects.
    pub fn send_data(&mut self, payload: &[u8]) -> Result<()> {
        let state = self.state();
        if state != SessionState::Active {
            return Err(SessionError::InvalidState {
                operation: "send data",
                state,
            });
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SessionError::Disconnected("no open link".to_string()))?;

        match writer.send(payload) {
            Ok(wire_len) => {
                self.counters.frames_sent.fetch_add(1, Ordering::Relaxed);
                debug!(payload_len = payload.len(), wire_len, "data frame sent");
                if self.config.pace_data_frames {
                    thread::sleep(data_frame_delay(payload.len()));
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "write to TNC failed; session disconnected");
                self.release();
                self.set_state(SessionState::Disconnected);
                Err(err.into())
            }
        }
    }

    /// Send an AX.25 frame.
    pub fn send_frame(&mut self, frame: &Ax25Frame) -> Result<()> {
        self.send_data(&frame.to_bytes())
    }

    /// Block until the next received frame.
    pub fn recv(&self) -> Result<Ax25Frame> {
        self.frames()?.recv().map_err(|_| reader_gone())
    }

    /// Wait up to `timeout` for the next received frame.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Ax25Frame>> {
        match self.frames()?.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(reader_gone()),
        }
    }

    /// Take a received frame if one is queued.
    pub fn try_recv(&self) -> Result<Option<Ax25Frame>> {
        match self.frames()?.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(reader_gone()),
        }
    }

    fn frames(&self) -> Result<&Receiver<Ax25Frame>> {
        self.frames
            .as_ref()
            .ok_or_else(|| SessionError::InvalidState {
                operation: "receive",
                state: self.state(),
            })
    }

    fn open_and_configure(&mut self) -> Result<()> {
        let link = L::open(&self.config.serial)?;
        let write_link = link.try_clone()?;
        let frame_config = FrameConfig {
            read_timeout: Some(self.config.effective_read_timeout()),
            write_timeout: self.config.effective_write_timeout(),
            ..self.config.frame.clone()
        };

        let per_byte = self.config.command_delay_per_byte;
        let mut writer = FrameWriter::with_config_link(write_link, frame_config.clone())?;
        for command in &CONFIGURE_SEQUENCE {
            send_command(&mut writer, command, per_byte)?;
        }
        self.set_state(SessionState::Configured);
        send_command(&mut writer, &KISS_ON, per_byte)?;
        self.writer = Some(writer);

        let reader = FrameReader::with_config_link(link, frame_config)?;
        // The reader may downgrade this as soon as it starts.
        self.set_state(SessionState::Active);
        self.spawn_reader(reader)
    }

    fn spawn_reader(&mut self, reader: FrameReader<L>) -> Result<()> {
        let (tx, rx) = mpsc::sync_channel(self.config.frame_queue.max(1));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let stop = Arc::clone(&stop);
            let state = Arc::clone(&self.state);
            let counters = Arc::clone(&self.counters);
            thread::Builder::new()
                .name("kisstnc-reader".to_string())
                .spawn(move || run_reader(reader, &tx, &stop, &state, &counters))
                .map_err(TransportError::from)?
        };

        self.frames = Some(rx);
        self.reader = Some(ReaderHandle { stop, thread });
        Ok(())
    }

    fn write_reset(&mut self) -> Result<()> {
        let per_byte = self.config.command_delay_per_byte;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SessionError::Disconnected("no open link".to_string()))?;
        writer.write_raw(&EXIT_KISS)?;
        send_command(writer, &RESET_COMMAND, per_byte)
    }

    /// Stop the reader and close both halves of the link. Returns whether anything was open.
    fn release(&mut self) -> bool {
        let had_link = self.writer.is_some() || self.reader.is_some();
        if let Some(reader) = self.reader.take() {
            reader.stop.store(true, Ordering::Release);
            // Unblocks a reader waiting on a full queue.
            self.frames = None;
            if reader.thread.join().is_err() {
                warn!("reader thread panicked");
            }
        }
        self.frames = None;
        self.writer = None;
        had_link
    }

    fn set_state(&self, state: SessionState) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard != state {
            debug!(from = %*guard, to = %state, "session state");
            *guard = state;
        }
    }
}

impl<L: Link> Drop for Session<L> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<L: Link> fmt::Debug for Session<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.config.serial.path)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

fn send_command<L: Link>(
    writer: &mut FrameWriter<L>,
    command: &TncCommand,
    per_byte: Duration,
) -> Result<()> {
    writer
        .write_raw(&command.envelope())
        .map_err(|source| SessionError::ConfigurationFailed {
            command: command.text,
            source,
        })?;
    debug!(command = command.text, description = command.description, "TNC command sent");
    let delay = command_delay(command.text, per_byte);
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    Ok(())
}

fn run_reader<L: Link>(
    mut reader: FrameReader<L>,
    frames: &SyncSender<Ax25Frame>,
    stop: &AtomicBool,
    state: &Mutex<SessionState>,
    counters: &Counters,
) {
    debug!("reader thread started");
    while !stop.load(Ordering::Acquire) {
        match reader.read_frame() {
            Ok(frame) => {
                counters.frames_received.fetch_add(1, Ordering::Relaxed);
                debug!(
                    source = %frame.source,
                    destination = %frame.destination,
                    info_len = frame.info.len(),
                    "frame received"
                );
                if frames.send(frame).is_err() {
                    break;
                }
            }
            Err(err) if err.is_read_timeout() => {}
            Err(FrameError::AccumulatorOverflow { .. }) => {
                counters.overflows.fetch_add(1, Ordering::Relaxed);
            }
            Err(FrameError::Parse(_)) => {
                counters.parse_failures.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                if !stop.load(Ordering::Acquire) {
                    warn!(error = %err, "TNC link failed; session disconnected");
                    *state.lock().unwrap_or_else(PoisonError::into_inner) =
                        SessionState::Disconnected;
                }
                break;
            }
        }
    }
    debug!("reader thread stopped");
}

fn load_state(state: &Mutex<SessionState>) -> SessionState {
    *state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reader_gone() -> SessionError {
    SessionError::Disconnected("reader stopped".to_string())
}
