//! Result aggregation - the single consumer of worker progress events

use log::{info, warn};
use std::collections::HashSet;
use tokio::sync::mpsc;

use super::types::{DownloadResult, ProgressEvent};
use crate::error::DownloadError;

/// Callback invoked once per object, serially, in arrival order
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(&ProgressEvent) + Send);

pub(crate) struct ResultAggregator<'a> {
    result: DownloadResult,
    callback: Option<ProgressCallback<'a>>,
    reported: HashSet<String>,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(callback: Option<ProgressCallback<'a>>) -> Self {
        Self {
            result: DownloadResult::default(),
            callback,
            reported: HashSet::new(),
        }
    }

    pub fn record(&mut self, mut event: ProgressEvent) {
        self.result.total_files += 1;
        self.reported.insert(event.key.clone());

        if let Some(callback) = self.callback.as_mut() {
            callback(&event);
        }

        match event.error.take() {
            Some(error) => {
                self.result.failed_files += 1;
                self.result.errors.push(error);
            }
            None => {
                self.result.successful_files += 1;
                self.result.total_bytes += event.bytes_downloaded;
            }
        }
    }

    /// Consume events until every sender has been dropped.
    pub async fn drain(&mut self, mut events: mpsc::Receiver<ProgressEvent>) {
        while let Some(event) = events.recv().await {
            self.record(event);
        }
    }

    /// Record a failure for every key no worker reported (a worker task died).
    pub fn record_unreported(&mut self, keys: &[String]) {
        if self.result.total_files >= keys.len() {
            return;
        }
        for key in keys {
            if !self.reported.contains(key) {
                warn!("download_aggregate: no outcome reported for {}", key);
                self.record(ProgressEvent::failed(
                    key.as_str(),
                    0,
                    DownloadError::Aborted { key: key.clone() },
                ));
            }
        }
    }

    pub fn finish(self) -> DownloadResult {
        info!(
            "download_aggregate: total={} ok={} failed={} bytes={}",
            self.result.total_files,
            self.result.successful_files,
            self.result.failed_files,
            self.result.total_bytes
        );
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(key: &str) -> ProgressEvent {
        ProgressEvent::failed(
            key,
            20,
            DownloadError::Cancelled {
                key: key.to_string(),
            },
        )
    }

    #[test]
    fn counts_successes_failures_and_bytes() {
        let mut aggregator = ResultAggregator::new(None);
        aggregator.record(ProgressEvent::completed("d/a.txt", 10, 10));
        aggregator.record(failure("d/b.txt"));
        aggregator.record(ProgressEvent::completed("d/empty/", 0, 0));

        let result = aggregator.finish();
        assert_eq!(result.total_files, 3);
        assert_eq!(result.successful_files, 2);
        assert_eq!(result.failed_files, 1);
        assert_eq!(result.total_bytes, 10);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn callback_sees_every_event_with_its_error() {
        let mut seen = Vec::new();
        let mut callback = |event: &ProgressEvent| {
            seen.push((event.key.clone(), event.completed, event.error.is_some()));
        };

        let mut aggregator = ResultAggregator::new(Some(&mut callback));
        aggregator.record(ProgressEvent::completed("a", 1, 1));
        aggregator.record(failure("b"));
        drop(aggregator);

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), true, false),
                ("b".to_string(), false, true)
            ]
        );
    }

    #[tokio::test]
    async fn drain_stops_when_all_senders_are_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let second = tx.clone();
        tx.send(ProgressEvent::completed("a", 5, 5)).await.unwrap();
        second.send(ProgressEvent::completed("b", 7, 7)).await.unwrap();
        drop(tx);
        drop(second);

        let mut aggregator = ResultAggregator::new(None);
        aggregator.drain(rx).await;
        let result = aggregator.finish();
        assert_eq!(result.total_files, 2);
        assert_eq!(result.total_bytes, 12);
    }

    #[test]
    fn unreported_keys_become_failures() {
        let mut aggregator = ResultAggregator::new(None);
        aggregator.record(ProgressEvent::completed("a", 3, 3));
        aggregator.record_unreported(&["a".to_string(), "b".to_string()]);

        let result = aggregator.finish();
        assert_eq!(result.total_files, 2);
        assert_eq!(result.failed_files, 1);
        assert_eq!(result.errors[0].kind(), "aborted");
    }
}
