use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::decoding::{DecodeStats, Decoded, Decoder, ParseError};
use crate::models::{ConfigRecord, ControllerState, SampleRecord, StateInterval};
use crate::segmentation::Segmenter;
use crate::signal::LowPassFilter;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Latest derived state, published after every line.
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot {
    pub latest_sample: Option<SampleRecord>,
    pub config: Option<Arc<ConfigRecord>>,
    pub current_state: Option<ControllerState>,
    pub filtered_light: Option<f64>,
    pub filtered_battery: Option<f64>,
    pub last_message: Option<String>,
    pub stats: DecodeStats,
}

/// Per-line notifications for consumers that keep their own history.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Sample(SampleRecord),
    Config(Arc<ConfigRecord>),
    Message(String),
    Interval(StateInterval),
    Rejected { line: u64, error: ParseError },
}

/// Decoder, segmenter and channel filters driven one line at a time.
#[derive(Debug)]
pub struct LineProcessor {
    decoder: Decoder,
    segmenter: Segmenter,
    light: LowPassFilter,
    battery: LowPassFilter,
    snapshot: LiveSnapshot,
}

impl LineProcessor {
    pub fn new(decoder: Decoder, segmenter: Segmenter, alpha: f64) -> Result<Self> {
        Ok(Self {
            decoder,
            segmenter,
            light: LowPassFilter::new(alpha)?,
            battery: LowPassFilter::new(alpha)?,
            snapshot: LiveSnapshot::default(),
        })
    }

    /// Feed one line, returning the events it produced in order.
    pub fn handle(&mut self, line: &str) -> Vec<LiveEvent> {
        let mut events = Vec::new();

        match self.decoder.feed(line) {
            Decoded::Sample(sample) => {
                if let Some(interval) = self.segmenter.push(&sample) {
                    events.push(LiveEvent::Interval(interval));
                }
                self.snapshot.filtered_light = Some(self.light.push(f64::from(sample.light_sensor)));
                self.snapshot.filtered_battery =
                    Some(self.battery.push(f64::from(sample.battery_sensor)));
                self.snapshot.current_state = self.segmenter.current_state().cloned();
                self.snapshot.latest_sample = Some(sample.clone());
                events.push(LiveEvent::Sample(sample));
            }
            Decoded::Config(config) => {
                self.snapshot.config = Some(Arc::clone(&config));
                events.push(LiveEvent::Config(config));
            }
            Decoded::Message(text) => {
                self.snapshot.last_message = Some(text.clone());
                events.push(LiveEvent::Message(text));
            }
            Decoded::Blank => {}
            Decoded::Rejected(error) => events.push(LiveEvent::Rejected {
                line: self.decoder.stats().lines,
                error,
            }),
        }

        self.snapshot.stats = self.decoder.stats().clone();
        events
    }

    pub fn snapshot(&self) -> &LiveSnapshot {
        &self.snapshot
    }

    /// End of stream: the trailing interval (if opted in) and final counters.
    pub fn finish(self) -> (Option<StateInterval>, DecodeStats) {
        let stats = self.decoder.stats().clone();
        (self.segmenter.finish(), stats)
    }
}

/// Read newline-terminated lines and forward them in order. Returns the
/// number of lines forwarded.
pub async fn read_lines<R>(
    mut reader: R,
    lines_tx: mpsc::Sender<String>,
    cancel_token: CancellationToken,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut forwarded = 0;

    loop {
        buf.clear();
        let read = tokio::select! {
            result = reader.read_until(b'\n', &mut buf) => {
                result.context("line source read failed")?
            }
            _ = cancel_token.cancelled() => {
                log_info!("line reader shutting down");
                break;
            }
        };

        if read == 0 {
            log_info!("line source reached end of stream after {forwarded} lines");
            break;
        }

        let line = String::from_utf8_lossy(&buf).into_owned();
        if lines_tx.send(line).await.is_err() {
            log_warn!("line processor is gone; stopping reader");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

/// Forward events while someone holds the receiver. Once it is dropped the
/// sender is released and later events are discarded.
fn forward(events_tx: &mut Option<mpsc::UnboundedSender<LiveEvent>>, event: LiveEvent) {
    let closed = match events_tx {
        Some(tx) => tx.send(event).is_err(),
        None => false,
    };
    if closed {
        log_info!("event receiver dropped; snapshot only from now on");
        *events_tx = None;
    }
}

/// Consume lines until the reader hangs up or the session is cancelled.
/// Events are only produced when `events_tx` is set; the snapshot is always
/// published.
pub async fn process_lines(
    mut processor: LineProcessor,
    mut lines_rx: mpsc::Receiver<String>,
    snapshot_tx: watch::Sender<LiveSnapshot>,
    mut events_tx: Option<mpsc::UnboundedSender<LiveEvent>>,
    cancel_token: CancellationToken,
) -> (Option<StateInterval>, DecodeStats) {
    loop {
        tokio::select! {
            maybe_line = lines_rx.recv() => {
                let Some(line) = maybe_line else {
                    break;
                };
                for event in processor.handle(&line) {
                    forward(&mut events_tx, event);
                }
                snapshot_tx.send_replace(processor.snapshot().clone());
            }
            _ = cancel_token.cancelled() => {
                log_info!("line processor shutting down");
                break;
            }
        }
    }

    let (trailing, stats) = processor.finish();
    if let Some(interval) = &trailing {
        forward(&mut events_tx, LiveEvent::Interval(interval.clone()));
    }
    (trailing, stats)
}
