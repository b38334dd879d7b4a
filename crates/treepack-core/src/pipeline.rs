//! Bounded producer to sink pipeline for archive writing.
//!
//! Exactly one sink thread owns the encoder. Producers hand it prepared
//! entries through a bounded channel and block once `capacity` entries are
//! in flight.

use std::panic;
use std::thread;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use log::debug;

use crate::ArchiveError;
use crate::Result;
use crate::codec::EntryEncoder;
use crate::codec::PreparedEntry;

enum Message {
    Entry(PreparedEntry),
    Seal,
}

/// Handle to a sink thread that appends entries to an encoder.
///
/// Dropping the pipeline without calling [`SinkPipeline::finish`] aborts
/// it: the encoder is discarded without writing the end-of-archive data.
pub struct SinkPipeline<E: EntryEncoder> {
    sender: Option<Sender<Message>>,
    handle: Option<JoinHandle<Result<E::Output>>>,
}

impl<E> SinkPipeline<E>
where
    E: EntryEncoder + Send + 'static,
    E::Output: Send + 'static,
{
    /// Spawns the sink thread owning `encoder`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn spawn(encoder: E, capacity: usize) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
        let handle = thread::Builder::new()
            .name("treepack-sink".to_string())
            .spawn(move || run_sink(encoder, &receiver))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Hands one entry to the sink, blocking while the channel is full.
    ///
    /// # Errors
    ///
    /// If the sink already stopped, returns the error it stopped with.
    pub fn send(&mut self, entry: PreparedEntry) -> Result<()> {
        let Some(sender) = &self.sender else {
            return Err(sink_gone());
        };
        if sender.send(Message::Entry(entry)).is_ok() {
            return Ok(());
        }
        // The receiver only disconnects when the sink returned early.
        self.sender = None;
        match self.join() {
            Err(e) => Err(e),
            Ok(_) => Err(sink_gone()),
        }
    }

    /// Seals the channel, waits for the sink to drain it and returns the
    /// finished encoder output.
    ///
    /// # Errors
    ///
    /// Returns the first error hit by the sink while appending or
    /// finalizing.
    pub fn finish(mut self) -> Result<E::Output> {
        if let Some(sender) = self.sender.take() {
            // A failed send means the sink already exited; join reports why.
            let _ = sender.send(Message::Seal);
        }
        self.join()
    }

    fn join(&mut self) -> Result<E::Output> {
        let handle = self.handle.take().ok_or_else(sink_gone)?;
        match handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<E: EntryEncoder> Drop for SinkPipeline<E> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_sink<E: EntryEncoder>(mut encoder: E, receiver: &Receiver<Message>) -> Result<E::Output> {
    let mut appended = 0usize;
    for message in receiver {
        match message {
            Message::Entry(entry) => {
                encoder.append(&entry)?;
                appended += 1;
            }
            Message::Seal => {
                debug!("sealing archive after {appended} entries");
                return encoder.finish();
            }
        }
    }
    debug!("archive sink aborted after {appended} entries");
    Err(ArchiveError::Io(std::io::Error::new(
        std::io::ErrorKind::Interrupted,
        "archive writer aborted before completion",
    )))
}

fn sink_gone() -> ArchiveError {
    ArchiveError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "archive sink stopped",
    ))
}
