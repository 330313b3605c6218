use anyhow::{Context, Result};
use log::info;
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::decoding::{ConfigState, DecodeStats, Decoder};
use crate::models::StateInterval;
use crate::segmentation::Segmenter;
use crate::settings::Settings;

use super::loop_worker::{process_lines, read_lines, LineProcessor, LiveEvent, LiveSnapshot};

const LINE_CHANNEL_CAPACITY: usize = 256;

/// Final counters of a finished session.
#[derive(Debug, Clone)]
pub struct LiveSummary {
    pub session_id: String,
    pub lines_read: u64,
    pub stats: DecodeStats,
    /// Only set when trailing intervals are enabled in settings.
    pub trailing: Option<StateInterval>,
}

/// A running telemetry session over any line source.
///
/// A reader task frames lines and hands them to a processing task over a
/// channel, so lines are decoded strictly in arrival order. The latest state
/// is always available as a snapshot; per-line events only exist for
/// sessions started with `start_with_events`.
pub struct LiveSession {
    id: String,
    reader_handle: Option<JoinHandle<Result<u64>>>,
    processor_handle: Option<JoinHandle<(Option<StateInterval>, DecodeStats)>>,
    cancel_token: CancellationToken,
    snapshot_rx: watch::Receiver<LiveSnapshot>,
    config: ConfigState,
}

impl LiveSession {
    /// Spawn the reader and processor tasks, publishing snapshots only.
    /// Must run inside a tokio runtime.
    pub fn start<R>(reader: R, settings: &Settings) -> Result<Self>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        Self::spawn(reader, settings, None)
    }

    /// Like `start`, also returning the per-line event stream. Events queue
    /// until read, so the receiver must be drained or dropped.
    pub fn start_with_events<R>(
        reader: R,
        settings: &Settings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<LiveEvent>)>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Self::spawn(reader, settings, Some(events_tx))?;
        Ok((session, events_rx))
    }

    fn spawn<R>(
        reader: R,
        settings: &Settings,
        events_tx: Option<mpsc::UnboundedSender<LiveEvent>>,
    ) -> Result<Self>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        settings.validate()?;

        let id = Uuid::new_v4().to_string();
        let config = ConfigState::new();
        let decoder = Decoder::with_config_state(settings.profile, config.clone()).with_wall_clock();
        let processor = LineProcessor::new(
            decoder,
            Segmenter::new(settings.segmentation()),
            settings.filter_alpha,
        )?;

        let cancel_token = CancellationToken::new();
        let (lines_tx, lines_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(LiveSnapshot::default());
        let with_events = events_tx.is_some();

        let reader_handle = tokio::spawn(read_lines(reader, lines_tx, cancel_token.clone()));
        let processor_handle = tokio::spawn(process_lines(
            processor,
            lines_rx,
            snapshot_tx,
            events_tx,
            cancel_token.clone(),
        ));

        info!(
            "live session {id} started (profile {}, events {})",
            settings.profile.as_str(),
            if with_events { "on" } else { "off" }
        );

        Ok(Self {
            id,
            reader_handle: Some(reader_handle),
            processor_handle: Some(processor_handle),
            cancel_token,
            snapshot_rx,
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified after every processed line.
    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn config_state(&self) -> &ConfigState {
        &self.config
    }

    /// Run until the line source reaches end of stream.
    pub async fn wait(mut self) -> Result<LiveSummary> {
        self.join().await
    }

    /// Cancel both tasks and wait for them to exit.
    pub async fn stop(mut self) -> Result<LiveSummary> {
        self.cancel_token.cancel();
        self.join().await
    }

    async fn join(&mut self) -> Result<LiveSummary> {
        let lines_read = match self.reader_handle.take() {
            Some(handle) => handle.await.context("line reader task failed to join")??,
            None => 0,
        };

        let (trailing, stats) = match self.processor_handle.take() {
            Some(handle) => handle
                .await
                .context("line processor task failed to join")?,
            None => (None, DecodeStats::default()),
        };

        info!(
            "live session {} finished: {} lines, {} samples, {} rejected",
            self.id,
            lines_read,
            stats.samples,
            stats.rejected()
        );

        Ok(LiveSummary {
            session_id: self.id.clone(),
            lines_read,
            stats,
            trailing,
        })
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoding::DecodeProfile;
    use crate::models::{ControllerState, Timestamp};
    use std::io::Cursor;
    use tokio::io::{AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_session_decodes_in_order() {
        let input = b"C:200,200,5,3,100,50,50,40,10\r\n\
1,0,0,1,100,700,0,1,0\r\n\
Faking day\r\n\
2,1,3,0,300,700,0,1,0\r\n\
2,1,3,0,300,700,0,1\r\n\
3,1,0,0,300,700,0,0,0\r\n"
            .to_vec();

        let (session, mut events) =
            LiveSession::start_with_events(BufReader::new(Cursor::new(input)), &Settings::default())
                .unwrap();

        let summary = session.wait().await.unwrap();
        assert_eq!(summary.lines_read, 6);
        assert_eq!(summary.stats.samples, 3);
        assert_eq!(summary.stats.messages, 2);
        assert!(summary.trailing.is_none());

        let mut kinds = Vec::new();
        while let Some(event) = events.recv().await {
            kinds.push(match event {
                LiveEvent::Config(_) => "config",
                LiveEvent::Sample(sample) => {
                    assert!(matches!(sample.timestamp, Timestamp::Wall(_)));
                    "sample"
                }
                LiveEvent::Message(_) => "message",
                LiveEvent::Interval(_) => "interval",
                LiveEvent::Rejected { .. } => "rejected",
            });
        }
        assert_eq!(
            kinds,
            vec![
                "config", "sample", "message", "interval", "sample", "message", "interval",
                "sample"
            ]
        );
    }

    #[tokio::test]
    async fn test_snapshot_only_session_over_long_stream() {
        let mut input = String::new();
        for i in 0..5_000 {
            let state = if i % 2 == 0 { 1 } else { 0 };
            input.push_str(&format!("{state},0,0,0,100,700,0,1,0\n"));
        }

        let session = LiveSession::start(
            BufReader::new(Cursor::new(input.into_bytes())),
            &Settings::default(),
        )
        .unwrap();
        let updates = session.subscribe();

        let summary = session.wait().await.unwrap();
        assert_eq!(summary.lines_read, 5_000);
        assert_eq!(summary.stats.samples, 5_000);

        let last = updates.borrow();
        assert_eq!(last.stats.lines, 5_000);
        assert_eq!(last.current_state, Some(ControllerState::Calculate));
    }

    #[tokio::test]
    async fn test_snapshot_and_stop() {
        let (mut client, server) = tokio::io::duplex(256);
        let settings = Settings {
            profile: DecodeProfile::Pic,
            emit_trailing_interval: true,
            ..Settings::default()
        };
        let session = LiveSession::start(BufReader::new(server), &settings).unwrap();
        let mut updates = session.subscribe();

        client
            .write_all(b"C:200,200,5,3,100,50,50,40,10\n1,1,2,0,300,700,1,0,0\n")
            .await
            .unwrap();

        loop {
            updates.changed().await.unwrap();
            if updates.borrow().latest_sample.is_some() {
                break;
            }
        }

        let snapshot = session.snapshot();
        assert_eq!(snapshot.current_state, Some(ControllerState::Sleep));
        assert_eq!(snapshot.filtered_light, Some(300.0));
        assert_eq!(
            snapshot.latest_sample.unwrap().day_count_text(),
            "2/3"
        );
        assert_eq!(session.config_state().current().unwrap().day_threshold, 200);

        let summary = session.stop().await.unwrap();
        assert_eq!(summary.stats.samples, 1);
        assert_eq!(
            summary.trailing.map(|interval| interval.state),
            Some(ControllerState::Sleep)
        );
        drop(client);
    }
}
