use std::collections::HashSet;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use riserva_core::{DataType, RiservaError, normalize_symbol};

/// Normalize raw symbols: trim, uppercase, drop blanks and duplicates.
///
/// First-seen order is preserved.
#[must_use]
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    raw.iter()
        .filter_map(|s| normalize_symbol(s.as_ref()))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// De-duplicate data types keeping first-seen order.
#[must_use]
pub fn dedup_data_types(raw: &[DataType]) -> Vec<DataType> {
    let mut seen: HashSet<DataType> = HashSet::with_capacity(raw.len());
    raw.iter().copied().filter(|dt| seen.insert(*dt)).collect()
}

/// Partition `symbols` into consecutive chunks of at most `size` symbols.
///
/// A `size` of zero is treated as one.
#[must_use]
pub fn chunk_symbols(symbols: &[String], size: usize) -> Vec<Vec<String>> {
    symbols.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

/// Drive every task to completion, abandoning whatever is still pending once
/// `deadline` elapses.
///
/// The output is index-aligned with the input: `Some(output)` for tasks that
/// settled in time, `None` for abandoned ones. Without a deadline every slot is
/// `Some`.
pub async fn join_until_deadline<I, F, T>(tasks: I, deadline: Option<Duration>) -> Vec<Option<T>>
where
    I: IntoIterator<Item = F>,
    F: std::future::Future<Output = T>,
{
    let mut pending: FuturesUnordered<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(i, fut)| async move { (i, fut.await) })
        .collect();
    let mut settled: Vec<Option<T>> = (0..pending.len()).map(|_| None).collect();

    let drain = async {
        while let Some((i, out)) = pending.next().await {
            settled[i] = Some(out);
        }
    };
    match deadline {
        Some(d) => {
            let _ = tokio::time::timeout(d, drain).await;
        }
        None => drain.await,
    }
    settled
}

/// Collapse the errors of an exhausted provider chain into one `RiservaError`.
///
/// Rules:
/// - If there are no errors → `EmptyProviderChain(data_type)`.
/// - If all errors are `ProviderTimeout` → `AllProvidersTimedOut(data_type)`.
/// - If all errors are `NotFound` → `NotFound(what)`.
/// - Else → `AllProvidersFailed(errors)`.
pub fn collapse_errors(
    data_type: DataType,
    errors: Vec<RiservaError>,
    not_found_what: String,
) -> RiservaError {
    if errors.is_empty() {
        return RiservaError::EmptyProviderChain {
            data_type: data_type.to_string(),
        };
    }
    if errors
        .iter()
        .all(|e| matches!(e, RiservaError::ProviderTimeout { .. }))
    {
        return RiservaError::AllProvidersTimedOut {
            data_type: data_type.to_string(),
        };
    }
    if errors
        .iter()
        .all(|e| matches!(e, RiservaError::NotFound { .. }))
    {
        return RiservaError::not_found(not_found_what);
    }
    RiservaError::AllProvidersFailed(errors)
}
