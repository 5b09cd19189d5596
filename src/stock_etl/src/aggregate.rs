//! Combines per-symbol outcomes into one run-stamped [`Dataset`].

use thiserror::Error;

use crate::{
    fetcher::FetchFailed,
    models::{
        dataset::{Dataset, DatasetRow, RunTimestamp},
        symbol_history::SymbolHistory,
    },
};

/// The result of fetching one symbol, kept in symbol-list order.
pub type SymbolOutcome = Result<SymbolHistory, FetchFailed>;

/// No symbol produced any rows. Fatal for a run.
#[derive(Debug, Error)]
#[error("no data fetched: all {attempted} symbols failed")]
pub struct EmptyDataset {
    pub attempted: usize,
    pub failures: Vec<FetchFailed>,
}

/// Which symbols made it into the dataset and which did not.
#[derive(Debug, Default)]
pub struct AggregateSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<FetchFailed>,
}

pub fn combine(
    outcomes: Vec<SymbolOutcome>,
    timestamp: RunTimestamp,
    include_extrema: bool,
) -> Result<Dataset, EmptyDataset> {
    combine_with_summary(outcomes, timestamp, include_extrema).map(|(dataset, _)| dataset)
}

/// Flattens the successful histories, in input order, into dataset rows.
///
/// Every row gets the same `timestamp`. Extrema are attached only when
/// `include_extrema` is set, so the column set is uniform across the dataset.
pub fn combine_with_summary(
    outcomes: Vec<SymbolOutcome>,
    timestamp: RunTimestamp,
    include_extrema: bool,
) -> Result<(Dataset, AggregateSummary), EmptyDataset> {
    let attempted = outcomes.len();
    let mut summary = AggregateSummary::default();
    let mut rows = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(history) => {
                let extrema = if include_extrema {
                    history.extrema.extrema().copied()
                } else {
                    None
                };
                rows.extend(history.bars.into_iter().map(|bar| DatasetRow {
                    ticker: history.symbol.clone(),
                    bar,
                    extrema,
                    timestamp,
                }));
                summary.succeeded.push(history.symbol);
            }
            Err(failure) => summary.failed.push(failure),
        }
    }

    if rows.is_empty() {
        return Err(EmptyDataset {
            attempted,
            failures: summary.failed,
        });
    }

    Ok((Dataset::new(timestamp, include_extrema, rows), summary))
}
