//! Reply Reducers
//!
//! A reducer turns the ordered array of per-shard replies into the single
//! reply the client sees. Reducers are registered per command as plain data
//! and invoked exactly once per logical request by the scatter-gather
//! engine.
//!
//! All reducers tolerate an empty reply set and individual `Nil`/`Error`
//! entries; partial failure is the normal case and a reducer that can build
//! a partial answer from the surviving shards does so instead of failing
//! the whole request.
//!
//! ## Submodules
//! - **`request`**: Parsed client search request threaded through one call.
//! - **`search`**: The bounded top-K merge of ranked per-shard result pages.

pub mod request;
pub mod search;

pub use request::SearchRequest;

use std::collections::HashSet;

use crate::error::CoordinatorError;
use crate::protocol::Reply;

/// The reducer algorithms available to command handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Concatenates every reply positionally into one array, shard order
    /// preserved.
    Chain,
    /// Merges array-of-string replies into one duplicate-free array.
    DedupUnion,
    /// Merges N arrays column-wise, taking the first non-nil element of
    /// each column.
    ParallelMerge,
    /// Returns the first reply verbatim.
    PassThrough,
    /// Expects "OK" from every shard; surfaces the first error instead.
    AllOk,
    /// Bounded top-K merge of ranked search result pages.
    TopK,
}

impl Reducer {
    /// Runs the reducer over the collected replies. `request` carries the
    /// per-call search context and is only consulted by [`Reducer::TopK`].
    pub fn reduce(self, replies: Vec<Reply>, request: Option<&SearchRequest>) -> Reply {
        match self {
            Reducer::Chain => chain(replies),
            Reducer::DedupUnion => dedup_union(replies),
            Reducer::ParallelMerge => parallel_merge(replies),
            Reducer::PassThrough => pass_through(replies),
            Reducer::AllOk => all_ok(replies),
            Reducer::TopK => match request {
                Some(req) => search::merge_search_results(&replies, req),
                None => CoordinatorError::Reduction(
                    "search reducer invoked without a request".to_string(),
                )
                .to_reply(),
            },
        }
    }
}

fn chain(replies: Vec<Reply>) -> Reply {
    Reply::Array(replies)
}

fn pass_through(mut replies: Vec<Reply>) -> Reply {
    if replies.is_empty() {
        Reply::Nil
    } else {
        replies.swap_remove(0)
    }
}

fn all_ok(replies: Vec<Reply>) -> Reply {
    if replies.is_empty() {
        return Reply::Error("Could not distribute command".to_string());
    }
    for reply in &replies {
        if reply.is_error() {
            return reply.clone();
        }
    }
    Reply::Status("OK".to_string())
}

/// Set-merges string arrays from every shard. If no shard produced an array
/// at all, the first observed error is surfaced; empty arrays still count as
/// a successful (empty) answer.
fn dedup_union(replies: Vec<Reply>) -> Reply {
    let mut seen: HashSet<String> = HashSet::new();
    let mut first_error: Option<Reply> = None;
    let mut arrays = 0usize;

    for reply in &replies {
        match reply {
            Reply::Array(items) => {
                arrays += 1;
                for item in items {
                    if let Some(s) = item.as_str() {
                        if !s.is_empty() {
                            seen.insert(s.to_string());
                        }
                    }
                }
            }
            Reply::Error(_) if first_error.is_none() => {
                first_error = Some(reply.clone());
            }
            _ => {}
        }
    }

    if seen.is_empty() {
        if arrays > 0 {
            return Reply::Array(vec![]);
        }
        return first_error
            .unwrap_or_else(|| Reply::Error("Could not perform query".to_string()));
    }

    Reply::Array(seen.into_iter().map(Reply::Str).collect())
}

/// Column-wise merge of N arrays of possibly unequal length: each output
/// column takes the first non-nil element across the arrays (falling back to
/// nil when every still-valid array holds nil there), and the merge stops
/// once every array is exhausted past the current column.
fn parallel_merge(replies: Vec<Reply>) -> Reply {
    let arrays: Vec<&[Reply]> = replies.iter().filter_map(Reply::as_array).collect();

    let mut merged: Vec<Reply> = Vec::new();
    let mut column = 0usize;
    loop {
        let mut candidates = arrays.iter().filter(|a| a.len() > column).peekable();
        if candidates.peek().is_none() {
            break;
        }

        let mut picked: Option<Reply> = None;
        let mut last_valid: Option<Reply> = None;
        for array in candidates {
            let element = &array[column];
            if !element.is_nil() {
                picked = Some(element.clone());
                break;
            }
            last_valid = Some(element.clone());
        }
        merged.push(picked.or(last_valid).unwrap_or(Reply::Nil));
        column += 1;
    }

    if merged.is_empty() {
        return Reply::Error("Could not process replies".to_string());
    }
    Reply::Array(merged)
}
