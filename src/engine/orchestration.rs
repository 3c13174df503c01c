//! Module focusing on the way the input lines are orchestrated between worker threads

use std::{num::NonZeroUsize, panic};

use tracing::{debug, info_span};

use crate::{
    cipher::Cipher,
    domain::{AccountRecord, CustomerRecord},
    engine::logic::{IngestionStats, Worker},
    report::ErrorSink,
    storage::Repository,
};

/// The lines handed to a single worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkPair<'a> {
    pub(crate) index: usize,
    pub(crate) accounts: &'a [String],
    pub(crate) customers: &'a [String],
}

///
/// Splits `items` into at most `parts` contiguous chunks of `ceil(len / parts)` items each. The last
/// chunk may be shorter. Yields `parts` chunks in any case; trailing ones are empty when there are
/// fewer items than parts.
///
pub(crate) fn partition<T>(items: &[T], parts: NonZeroUsize) -> Vec<&[T]> {
    let parts = parts.get();
    let chunk_size = items.len().div_ceil(parts);

    (0..parts)
        .map(|i| {
            let start = (i * chunk_size).min(items.len());
            let end = (start + chunk_size).min(items.len());
            &items[start..end]
        })
        .collect()
}

///
/// Pairs the i-th account chunk with the i-th customer chunk. Pairs where both chunks are empty
/// are dropped since they would give a worker nothing to do.
///
pub(crate) fn chunk_pairs<'a>(
    accounts: &'a [String],
    customers: &'a [String],
    parts: NonZeroUsize,
) -> Vec<ChunkPair<'a>> {
    partition(accounts, parts)
        .into_iter()
        .zip(partition(customers, parts))
        .enumerate()
        .filter(|(_, (a, c))| !a.is_empty() || !c.is_empty())
        .map(|(index, (accounts, customers))| ChunkPair {
            index,
            accounts,
            customers,
        })
        .collect()
}

///
/// Runs one worker thread per chunk pair and blocks until all of them are done. Each worker
/// appends its error entries to `sink` once, after its whole pair is processed. The returned
/// stats are the sum over all workers.
///
/// A panic in a worker is re-raised on the calling thread once all workers have finished.
///
pub(crate) fn run_workers<C, A, U>(
    worker: &Worker<'_, C, A, U>,
    pairs: Vec<ChunkPair<'_>>,
    sink: &ErrorSink,
) -> IngestionStats
where
    C: Cipher,
    A: Repository<AccountRecord>,
    U: Repository<CustomerRecord>,
{
    std::thread::scope(|s| {
        let handles: Vec<_> = pairs
            .into_iter()
            .map(|pair| {
                s.spawn(move || {
                    let _span = info_span!("worker", index = pair.index).entered();
                    debug!(
                        accounts = pair.accounts.len(),
                        customers = pair.customers.len(),
                        "worker started"
                    );

                    let report = worker.process_chunk(pair.accounts, pair.customers);
                    sink.append(report.errors);

                    debug!(stats = ?report.stats, "worker finished");
                    report.stats
                })
            })
            .collect();

        let mut total = IngestionStats::default();
        for handle in handles {
            total += handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload));
        }
        total
    })
}
