//! The acquisition loop and the handle other threads use to steer it.
//!
//! The loop owns the decoder, the counters, the mode and any open recording
//! sink. Other threads talk to it through [`AcquisitionHandle`]: mode changes
//! travel as commands and are answered once applied, counters and mode come
//! back as a [`Status`] snapshot.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info, trace, warn};
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use spectrolink_decode::{DecoderEvent, Frame, FrameDecoder, DEFAULT_SAMPLE_COUNT};

use crate::display::DisplaySink;
use crate::error::{AcquireError, RecordError};
use crate::mode::{Mode, ModeRequest};
use crate::playback::Playback;
use crate::recorder::{CsvRecorder, RecordingSink};
use crate::source::{ByteSource, ReadOutcome};

#[derive(Debug, Clone, Copy)]
pub struct AcquisitionConfig {
    /// Samples per frame; fixed for the lifetime of the acquisition.
    pub sample_count: NonZeroUsize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_count: NonZeroUsize::new(DEFAULT_SAMPLE_COUNT).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub mode: Mode,
    /// Complete frames since the last recording started.
    pub received: u64,
    /// Discarded frames since the last recording started.
    pub wasted: u64,
}

type SinkOpener = Box<dyn FnOnce() -> Result<Box<dyn RecordingSink>, RecordError> + Send>;
type Reply = Sender<Result<(), AcquireError>>;

enum Command {
    StartRecording { open: SinkOpener, reply: Reply },
    StopRecording(Reply),
    StartPlayback(Reply),
    StopPlayback(Reply),
}

pub struct AcquisitionHandle {
    tx_cmd: Sender<Command>,
    status: Arc<RwLock<Status>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl AcquisitionHandle {
    /// Starts the loop on its own thread, reading from `source` until shutdown.
    pub fn spawn<S, D>(
        source: S,
        display: D,
        config: AcquisitionConfig,
    ) -> Result<Self, AcquireError>
    where
        S: ByteSource + Send + 'static,
        D: DisplaySink + 'static,
    {
        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let status = Arc::new(RwLock::new(Status::default()));
        let stop = Arc::new(AtomicBool::new(false));

        let acquisition = AcquisitionLoop {
            source,
            display,
            decoder: FrameDecoder::new(config.sample_count),
            mode: Mode::Idle,
            recorder: None,
            received: 0,
            wasted: 0,
            commands: rx_cmd,
            status: status.clone(),
            stop: stop.clone(),
        };
        let thread = std::thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || acquisition.run())
            .map_err(AcquireError::Spawn)?;

        Ok(Self {
            tx_cmd,
            status,
            stop,
            thread: Some(thread),
        })
    }

    pub fn status(&self) -> Status {
        *self.status.read()
    }

    /// Resets the counters and starts appending frames to the sink `open` returns.
    ///
    /// `open` runs on the acquisition thread and only once the loop is known to
    /// be idle, so a rejected request never touches the destination.
    pub fn start_recording<F>(&self, open: F) -> Result<(), AcquireError>
    where
        F: FnOnce() -> Result<Box<dyn RecordingSink>, RecordError> + Send + 'static,
    {
        self.request(|reply| Command::StartRecording {
            open: Box::new(open),
            reply,
        })
    }

    pub fn start_recording_csv(&self, path: impl Into<PathBuf>) -> Result<(), AcquireError> {
        let path = path.into();
        self.start_recording(move || {
            CsvRecorder::create(&path).map(|rec| Box::new(rec) as Box<dyn RecordingSink>)
        })
    }

    pub fn stop_recording(&self) -> Result<(), AcquireError> {
        self.request(Command::StopRecording)
    }

    /// Loads a saved record for review and stops decoding live bytes meanwhile.
    pub fn start_playback(&self, path: impl AsRef<Path>) -> Result<Playback, AcquireError> {
        let playback = Playback::load(path)?;
        self.request(Command::StartPlayback)?;
        Ok(playback)
    }

    pub fn stop_playback(&self) -> Result<(), AcquireError> {
        self.request(Command::StopPlayback)
    }

    /// Stops the loop, closing any open recording, and returns the final status.
    pub fn shutdown(mut self) -> Result<Status, AcquireError> {
        self.stop_and_join()?;
        Ok(self.status())
    }

    fn request(&self, make: impl FnOnce(Reply) -> Command) -> Result<(), AcquireError> {
        let (reply, answer) = bounded(1);
        self.tx_cmd
            .send(make(reply))
            .map_err(|_| AcquireError::Disconnected)?;
        answer.recv().map_err(|_| AcquireError::Disconnected)?
    }

    fn stop_and_join(&mut self) -> Result<(), AcquireError> {
        self.stop.store(true, Ordering::Relaxed);
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| AcquireError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop_and_join() {
            error!("acquisition shutdown: {e}");
        }
    }
}

struct AcquisitionLoop<S, D> {
    source: S,
    display: D,
    decoder: FrameDecoder,
    mode: Mode,
    recorder: Option<Box<dyn RecordingSink>>,
    received: u64,
    wasted: u64,
    commands: Receiver<Command>,
    status: Arc<RwLock<Status>>,
    stop: Arc<AtomicBool>,
}

impl<S: ByteSource, D: DisplaySink> AcquisitionLoop<S, D> {
    fn run(mut self) {
        info!(
            "acquisition started, {} samples per frame",
            self.decoder.sample_count()
        );
        while !self.stop.load(Ordering::Relaxed) {
            let outcome = self.source.read_byte();
            if self.mode.decodes() {
                match outcome {
                    ReadOutcome::Byte(byte) => {
                        if let Some(event) = self.decoder.feed(byte) {
                            self.on_event(event);
                        }
                    }
                    ReadOutcome::Timeout => self.decoder.timeout(),
                }
            }
            while let Ok(cmd) = self.commands.try_recv() {
                self.on_command(cmd);
            }
        }
        if self.mode == Mode::Recording {
            if let Err(e) = self.finish_recording() {
                error!("closing recording on shutdown: {e}");
            }
            self.publish();
        } else {
            self.report_waste();
        }
        info!(
            "acquisition stopped: {} received, {} wasted",
            self.received, self.wasted
        );
    }

    fn on_event(&mut self, event: DecoderEvent) {
        match event {
            DecoderEvent::CompleteFrame(frame) => {
                self.received += 1;
                trace!("frame {} complete", self.received);
                self.record(&frame);
                self.display.on_frame(&frame);
            }
            DecoderEvent::DiscardedFrame { kind, len } => {
                self.wasted += 1;
                debug!(
                    "discarded {kind:?} frame of {len} samples, expected {}",
                    self.decoder.sample_count()
                );
            }
        }
        self.publish();
    }

    fn record(&mut self, frame: &Frame) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        if let Err(e) = recorder.append(frame) {
            error!("recording failed, back to idle: {e}");
            self.recorder = None;
            self.transition(ModeRequest::StopRecording).ok();
        }
    }

    fn on_command(&mut self, cmd: Command) {
        let (reply, result) = match cmd {
            Command::StartRecording { open, reply } => (reply, self.begin_recording(open)),
            Command::StopRecording(reply) => (reply, self.finish_recording()),
            Command::StartPlayback(reply) => {
                (reply, self.transition(ModeRequest::StartPlayback))
            }
            Command::StopPlayback(reply) => {
                (reply, self.transition(ModeRequest::StopPlayback))
            }
        };
        if let Err(e) = &result {
            warn!("{e}");
        }
        self.publish();
        let _ = reply.send(result);
    }

    fn begin_recording(&mut self, open: SinkOpener) -> Result<(), AcquireError> {
        let next = self.mode.apply(ModeRequest::StartRecording)?;
        let sink = open()?;
        self.recorder = Some(sink);
        self.received = 0;
        self.wasted = 0;
        self.mode = next;
        info!("mode -> {next}");
        Ok(())
    }

    fn finish_recording(&mut self) -> Result<(), AcquireError> {
        self.transition(ModeRequest::StopRecording)?;
        self.report_waste();
        match self.recorder.take() {
            Some(mut recorder) => recorder.close().map_err(AcquireError::from),
            None => Ok(()),
        }
    }

    fn report_waste(&self) {
        if let Some(summary) = waste_summary(self.received, self.wasted) {
            warn!("{summary}");
        }
    }

    fn transition(&mut self, request: ModeRequest) -> Result<(), AcquireError> {
        self.mode = self.mode.apply(request)?;
        info!("mode -> {}", self.mode);
        Ok(())
    }

    fn publish(&self) {
        *self.status.write() = Status {
            mode: self.mode,
            received: self.received,
            wasted: self.wasted,
        };
    }
}

fn waste_summary(received: u64, wasted: u64) -> Option<String> {
    (wasted > 0).then(|| {
        let total = received + wasted;
        format!(
            "{wasted} of {total} frames discarded ({:.1}%)",
            wasted as f64 * 100.0 / total as f64
        )
    })
}
