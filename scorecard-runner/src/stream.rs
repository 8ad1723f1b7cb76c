//! The receiving end of a run.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use scorecard_core::CheckResult;
use tokio::sync::mpsc;

/// Results of one run, in completion order.
///
/// Yields exactly [`ResultStream::expected`] items and then `None`; the end
/// of the stream is the signal that the run is complete. Dropping the stream
/// early aborts the checks still running.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<CheckResult>,
    expected: usize,
}

impl ResultStream {
    pub(crate) fn new(rx: mpsc::Receiver<CheckResult>, expected: usize) -> Self {
        Self { rx, expected }
    }

    /// Number of results the run will emit before closing.
    pub fn expected(&self) -> usize {
        self.expected
    }

    pub async fn next(&mut self) -> Option<CheckResult> {
        self.rx.recv().await
    }

    /// Drain the stream to completion.
    pub async fn collect_all(mut self) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(self.expected);
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }
}

impl Stream for ResultStream {
    type Item = CheckResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.expected))
    }
}
