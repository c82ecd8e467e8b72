use crate::core::value::FieldValues;
use crate::error::SubmissionError;
use crate::submit::sink::SubmissionSink;
use log::{info, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCompletion {
    pub attempt: u64,
    pub result: Result<(), SubmissionError>,
}

/// Hands snapshots to the sink, inline or on a worker thread.
pub struct SubmissionCoordinator {
    sink: Arc<dyn SubmissionSink>,
    completion_tx: Sender<SubmissionCompletion>,
    completion_rx: Receiver<SubmissionCompletion>,
}

impl SubmissionCoordinator {
    pub fn new(sink: Arc<dyn SubmissionSink>) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel::<SubmissionCompletion>();
        Self {
            sink,
            completion_tx,
            completion_rx,
        }
    }

    pub fn from_sink(sink: impl SubmissionSink + 'static) -> Self {
        Self::new(Arc::new(sink))
    }

    pub fn submit(&self, values: &FieldValues) -> Result<(), SubmissionError> {
        deliver(self.sink.as_ref(), values)
    }

    pub fn spawn(&self, attempt: u64, values: FieldValues) {
        let sink = Arc::clone(&self.sink);
        let completion_tx = self.completion_tx.clone();
        std::thread::spawn(move || {
            let result = deliver(sink.as_ref(), &values);
            let _ = completion_tx.send(SubmissionCompletion { attempt, result });
        });
    }

    pub fn drain_ready(&self) -> Vec<SubmissionCompletion> {
        let mut out = Vec::<SubmissionCompletion>::new();
        loop {
            match self.completion_rx.try_recv() {
                Ok(completion) => out.push(completion),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    pub fn wait_next(&self, timeout: Duration) -> Option<SubmissionCompletion> {
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn deliver(sink: &dyn SubmissionSink, values: &FieldValues) -> Result<(), SubmissionError> {
    let result = catch_unwind(AssertUnwindSafe(|| sink.deliver(values)))
        .unwrap_or(Err(SubmissionError::WorkerLost));
    match &result {
        Ok(()) => info!("submission delivered ({} fields)", values.len()),
        Err(err) => warn!("submission failed: {err}"),
    }
    result
}
