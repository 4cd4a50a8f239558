//! Realtime click output on the default cpal device.
//!
//! The cpal stream lives on its own thread for its whole life (streams are
//! not `Send` on every platform). The control side talks to it through a
//! command channel, and clicks reach the audio callback through an `rtrb`
//! ring buffer so the callback never locks or allocates.

use std::{
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use super::{
    renderer::{ClickCommand, ClickRenderer, MAX_PENDING},
    ClickOutput, OutputState,
};
use crate::{
    clock::{Clock, StreamClock},
    error::{ClickError, Result},
    sequencing::ScheduledEvent,
    MAX_BLOCK_SIZE,
};

/// Messages for the stream thread
#[derive(Debug, Clone, Copy)]
enum StreamCommand {
    Play,
    Pause,
    Close,
}

/// Handles to an open stream
struct StreamLink {
    commands: Sender<StreamCommand>,
    clicks: Producer<ClickCommand>,
    sample_rate: u32,
    thread: Option<JoinHandle<()>>,
}

/// Click output on the system's default output device.
///
/// The device is opened lazily by [`ClickOutput::ensure_output_ready`]. If
/// that fails the output stays [`OutputState::Unavailable`] and a later call
/// tries again.
pub struct CpalOutput {
    clock: StreamClock,
    /// `f32` bits, read by the audio callback every buffer
    gain: Arc<AtomicU32>,
    dropped: Arc<AtomicU64>,
    link: Option<StreamLink>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self {
            clock: StreamClock::new(),
            gain: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            dropped: Arc::new(AtomicU64::new(0)),
            link: None,
        }
    }

    /// The clock this output's stream drives. Give it to the metronome.
    pub fn clock(&self) -> StreamClock {
        self.clock.clone()
    }

    /// Sample rate of the open stream.
    pub fn sample_rate(&self) -> Option<u32> {
        self.link.as_ref().map(|link| link.sample_rate)
    }

    /// Clicks lost to a full queue.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Pause the stream. The clock stops until the output is resumed.
    pub fn suspend(&mut self) {
        if let Some(link) = &self.link {
            let _ = link.commands.send(StreamCommand::Pause);
        }
    }

    fn open(&mut self) -> Result<StreamLink> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let (producer, consumer) = RingBuffer::new(MAX_PENDING);

        let stream = StreamThread {
            clock: self.clock.clone(),
            gain: Arc::clone(&self.gain),
            dropped: Arc::clone(&self.dropped),
            clicks: consumer,
        };

        let thread = thread::Builder::new()
            .name("saavy-click-stream".into())
            .spawn(move || stream.run(ready_tx, command_rx))
            .map_err(|e| ClickError::Device(e.to_string()))?;

        let sample_rate = match ready_rx.recv() {
            Ok(Ok(sample_rate)) => sample_rate,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(ClickError::Device("stream thread exited".into()));
            }
        };

        Ok(StreamLink {
            commands: command_tx,
            clicks: producer,
            sample_rate,
            thread: Some(thread),
        })
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickOutput for CpalOutput {
    fn ensure_output_ready(&mut self) -> bool {
        if self.link.is_some() {
            return true;
        }
        match self.open() {
            Ok(link) => {
                self.link = Some(link);
                true
            }
            Err(e) => {
                warn!("click output unavailable: {e}");
                false
            }
        }
    }

    fn output_state(&self) -> OutputState {
        match &self.link {
            None => OutputState::Unavailable,
            Some(_) if self.clock.is_suspended() => OutputState::Suspended,
            Some(_) => OutputState::Running,
        }
    }

    fn resume_output(&mut self) {
        if let Some(link) = &self.link {
            let _ = link.commands.send(StreamCommand::Play);
        }
    }

    fn render_event(&mut self, event: &ScheduledEvent) {
        let Some(link) = &mut self.link else {
            return;
        };
        let command = ClickCommand::at_time(event.time, f64::from(link.sample_rate), event.accent);
        if link.clicks.push(command).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn set_output_gain(&mut self, gain: f32) {
        self.gain.store(gain.to_bits(), Ordering::Relaxed);
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        if let Some(mut link) = self.link.take() {
            let _ = link.commands.send(StreamCommand::Close);
            if let Some(thread) = link.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

/// Everything the stream thread owns
struct StreamThread {
    clock: StreamClock,
    gain: Arc<AtomicU32>,
    dropped: Arc<AtomicU64>,
    clicks: Consumer<ClickCommand>,
}

impl StreamThread {
    fn run(self, ready: Sender<Result<u32>>, commands: Receiver<StreamCommand>) {
        let clock = self.clock.clone();
        let stream = match self.build() {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(clock.sample_rate()));

        while let Ok(command) = commands.recv() {
            match command {
                StreamCommand::Play => match stream.play() {
                    Ok(()) => clock.set_suspended(false),
                    Err(e) => error!("failed to resume output stream: {e}"),
                },
                StreamCommand::Pause => match stream.pause() {
                    Ok(()) => clock.set_suspended(true),
                    Err(e) => error!("failed to pause output stream: {e}"),
                },
                StreamCommand::Close => break,
            }
        }
        info!("click output closed");
    }

    fn build(self) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(ClickError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| ClickError::Device(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = usize::from(config.channels()).max(1);
        info!("click output: {sample_rate} Hz, {channels} channels");

        let Self {
            clock,
            gain,
            dropped,
            mut clicks,
        } = self;

        clock.set_sample_rate(sample_rate);
        let callback_clock = clock.clone();
        let mut renderer = ClickRenderer::new(sample_rate as f32);
        let mut block = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    while let Ok(command) = clicks.pop() {
                        if !renderer.queue(command) {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    renderer.set_gain(f32::from_bits(gain.load(Ordering::Relaxed)));

                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;
                    while frames_written < total_frames {
                        let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let mono = &mut block[..frames];
                        renderer.render(mono);

                        // Mono to all channels
                        let out_off = frames_written * channels;
                        for (i, &s) in mono.iter().enumerate() {
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }
                        frames_written += frames;
                    }

                    callback_clock.advance_frames(total_frames as u64);
                },
                |err| error!("output stream error: {err}"),
                None,
            )
            .map_err(|e| ClickError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| ClickError::Device(e.to_string()))?;
        clock.set_suspended(false);

        Ok(stream)
    }
}
