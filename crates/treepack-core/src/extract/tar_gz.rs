//! Parallel extraction of tar.gz archives.
//!
//! The gzip stream can only be read sequentially, so one parser thread owns
//! it and turns each entry into a job with its content buffered. Jobs cross
//! a bounded channel into the worker pool, which materializes them in any
//! order.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::panic;
use std::path::Path;
use std::thread;

use crossbeam_channel::Sender;
use flate2::read::GzDecoder;
use log::debug;
use rayon::prelude::*;

use super::Materializer;
use crate::ArchiveError;
use crate::Result;
use crate::codec::tar::TarDecoder;
use crate::pool::WorkerPool;
use crate::report::ExtractionReport;
use crate::types::DestDir;
use crate::types::EntryHeader;
use crate::types::EntryKind;

/// Upper bound for buffer preallocation from untrusted header sizes.
const MAX_PREALLOCATION: usize = 1024 * 1024;

struct TarJob {
    header: EntryHeader,
    data: Vec<u8>,
}

impl TarJob {
    fn materialize(&self, materializer: &Materializer<'_>) -> Result<()> {
        match self.header.kind {
            EntryKind::Directory => materializer.directory(&self.header),
            EntryKind::File => materializer.file(&self.header, &mut self.data.as_slice()),
        }
    }
}

pub(crate) fn extract_tar_gz(
    archive_path: &Path,
    dest: &DestDir,
    pool: &WorkerPool,
    channel_capacity: usize,
    restore_ownership: bool,
) -> Result<ExtractionReport> {
    let file = File::open(archive_path).map_err(|e| ArchiveError::from_open(archive_path, e))?;
    let decoder = TarDecoder::new(GzDecoder::new(BufReader::new(file)));
    let materializer = Materializer::new(dest, restore_ownership);
    let (sender, receiver) = crossbeam_channel::bounded::<TarJob>(channel_capacity.max(1));

    thread::scope(|scope| {
        let parser = scope.spawn(move || parse_jobs(decoder, &sender));

        // Dropping the receiver on failure makes the parser's next send fail.
        let written = pool.install(|| {
            receiver
                .into_iter()
                .par_bridge()
                .try_for_each(|job| job.materialize(&materializer))
        });
        let parsed = match parser.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        };
        written.and(parsed)
    })?;

    materializer.finish()
}

fn parse_jobs<R: Read>(mut decoder: TarDecoder<R>, sender: &Sender<TarJob>) -> Result<()> {
    let mut parsed = 0usize;
    for item in decoder.entries()? {
        let (header, mut body) = item?;
        let capacity = usize::try_from(header.size)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOCATION);
        let mut data = Vec::with_capacity(capacity);
        body.read_to_end(&mut data).map_err(|e| {
            ArchiveError::InvalidArchive(format!("failed to read {}: {e}", header.name))
        })?;

        if sender.send(TarJob { header, data }).is_err() {
            debug!("extraction stopped after {parsed} entries");
            return Ok(());
        }
        parsed += 1;
    }
    debug!("parsed {parsed} TAR entries");
    Ok(())
}
