//! Bounded Top-K Search Merge
//!
//! Merges per-shard ranked result pages into one globally ranked page
//! honoring the request's offset and limit. Each shard reply starts with the
//! shard's total match count followed by fixed-size records whose layout
//! depends on the requested optional fields.
//!
//! The merge holds at most `offset + limit` candidates in a min-oriented
//! bounded heap whose root is the worst-ranked candidate held so far. Shard
//! streams arrive pre-sorted best-to-worst, so the moment one candidate of a
//! stream fails to beat the heap's worst, the rest of that stream can be
//! skipped without changing the output.

use std::cmp::Ordering;

use crate::protocol::Reply;

use super::request::SearchRequest;

/// One candidate row from a shard's reply. Lives only inside a single
/// reducer invocation.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub score: f64,
    pub sort_key: Option<String>,
    /// Numeric value of `sort_key` when it has the `#<float>` form.
    pub sort_key_num: Option<f64>,
    pub fields: Reply,
    pub payload: Reply,
}

/// Field offsets within one record of a shard reply. Derived once per reply
/// from the request flags.
#[derive(Debug, Clone, Copy)]
struct RecordLayout {
    step: usize,
    score_offset: usize,
    payload_offset: Option<usize>,
    sort_key_offset: Option<usize>,
    fields_offset: Option<usize>,
}

impl RecordLayout {
    fn for_request(req: &SearchRequest) -> Self {
        // base: id, score, fields
        let mut step = 3;
        let score_offset = 1;
        let mut fields_offset = 2;
        let mut payload_offset = None;
        let mut sort_key_offset = None;

        if req.with_payload {
            step += 1;
            payload_offset = Some(2);
            fields_offset = 3;
        }
        if req.with_sort_by || req.with_sorting_keys {
            step += 1;
            sort_key_offset = Some(fields_offset);
            fields_offset += 1;
        }
        let fields_offset = if req.no_content {
            step -= 1;
            None
        } else {
            Some(fields_offset)
        };

        Self { step, score_offset, payload_offset, sort_key_offset, fields_offset }
    }

    fn max_offset(&self) -> usize {
        let mut max = self.score_offset;
        for off in [self.payload_offset, self.sort_key_offset, self.fields_offset]
            .into_iter()
            .flatten()
        {
            max = max.max(off);
        }
        max
    }
}

/// Parses one record starting at `base`. Returns `None` for malformed rows,
/// which ends consumption of that shard's reply.
fn parse_result(arr: &[Reply], base: usize, layout: &RecordLayout) -> Option<SearchResult> {
    if base + layout.max_offset() >= arr.len() {
        return None;
    }

    let raw_id = arr[base].as_str()?;
    // strip the shard tag we injected while routing
    let id = match raw_id.find('{') {
        Some(brace) if raw_id[brace..].contains('}') => raw_id[..brace].to_string(),
        _ => raw_id.to_string(),
    };

    let score = arr[base + layout.score_offset].as_double().unwrap_or(0.0);

    let payload = layout
        .payload_offset
        .map(|off| arr[base + off].clone())
        .unwrap_or(Reply::Nil);
    let fields = layout
        .fields_offset
        .map(|off| arr[base + off].clone())
        .unwrap_or(Reply::Nil);

    let sort_key = layout
        .sort_key_offset
        .and_then(|off| arr[base + off].as_str())
        .map(str::to_string);
    let sort_key_num = sort_key.as_deref().and_then(|k| {
        k.strip_prefix('#').and_then(|num| num.parse::<f64>().ok())
    });

    Some(SearchResult { id, score, sort_key, sort_key_num, fields, payload })
}

/// Ranks two candidates; `Greater` means `a` is better (appears earlier in
/// the merged page).
///
/// With SORTBY and both sort keys present the keys are compared numerically
/// when both parsed as numbers and as strings otherwise, larger winning,
/// with ties broken by reverse id comparison; the ascending flag inverts the
/// whole outcome. In every other case candidates compare by score, larger
/// winning, ties again broken by reverse id comparison.
pub fn cmp_rank(a: &SearchResult, b: &SearchResult, req: &SearchRequest) -> Ordering {
    if req.with_sort_by {
        if let (Some(key_a), Some(key_b)) = (a.sort_key.as_deref(), b.sort_key.as_deref()) {
            let mut ord = match (a.sort_key_num, b.sort_key_num) {
                (Some(na), Some(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal),
                _ => key_a.cmp(key_b),
            };
            if ord == Ordering::Equal {
                ord = a.id.cmp(&b.id);
            }
            return if req.sort_ascending { ord.reverse() } else { ord };
        }
    }

    match a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.id.cmp(&b.id),
        ord => ord,
    }
}

/// Bounded min-oriented heap of candidates; the root is always the worst
/// candidate held, so filling up discards globally worst-ranked rows first.
/// Eviction simply drops the displaced row; there is no manual slot
/// bookkeeping.
struct ResultHeap<'r> {
    items: Vec<SearchResult>,
    capacity: usize,
    req: &'r SearchRequest,
}

impl<'r> ResultHeap<'r> {
    fn new(capacity: usize, req: &'r SearchRequest) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            req,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn worst(&self) -> Option<&SearchResult> {
        self.items.first()
    }

    fn push(&mut self, result: SearchResult) {
        self.items.push(result);
        let mut i = self.items.len() - 1;
        while i > 0 {
            let parent = (i - 1) / 2;
            if cmp_rank(&self.items[i], &self.items[parent], self.req) == Ordering::Less {
                self.items.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    /// Replaces the worst-ranked candidate with a better one.
    fn replace_worst(&mut self, result: SearchResult) {
        self.items[0] = result;
        let mut i = 0;
        loop {
            let mut least = i;
            for child in [2 * i + 1, 2 * i + 2] {
                if child < self.items.len()
                    && cmp_rank(&self.items[child], &self.items[least], self.req)
                        == Ordering::Less
                {
                    least = child;
                }
            }
            if least == i {
                break;
            }
            self.items.swap(i, least);
            i = least;
        }
    }

    /// Drains into descending rank order (best first).
    fn into_sorted(self) -> Vec<SearchResult> {
        let req = self.req;
        let mut items = self.items;
        items.sort_by(|a, b| cmp_rank(b, a, req));
        items
    }
}

/// The top-K merge reducer.
pub fn merge_search_results(replies: &[Reply], req: &SearchRequest) -> Reply {
    // no replies at all means the whole dispatch timed out
    if replies.is_empty() {
        return Reply::Error("Could not send query to cluster".to_string());
    }

    let layout = RecordLayout::for_request(req);
    let bound = req.bound();
    let mut heap = ResultHeap::new(bound, req);
    let mut total: i64 = 0;
    let mut last_error: Option<Reply> = None;

    for reply in replies {
        if reply.is_error() {
            last_error = Some(reply.clone());
            continue;
        }
        let Some(arr) = reply.as_array() else {
            continue;
        };
        if arr.is_empty() {
            continue;
        }

        // first element is always the shard's reported total match count
        total += arr[0].as_int().unwrap_or(0);

        let mut base = 1;
        while base < arr.len() {
            let Some(result) = parse_result(arr, base, &layout) else {
                break;
            };

            if !heap.is_full() {
                heap.push(result);
            } else if bound == 0 {
                break;
            } else {
                let beats_worst = heap
                    .worst()
                    .map(|worst| cmp_rank(&result, worst, req) == Ordering::Greater)
                    .unwrap_or(false);
                if beats_worst {
                    heap.replace_worst(result);
                } else {
                    // this shard's stream is pre-sorted, nothing further
                    // from it can rank higher
                    break;
                }
            }
            base += layout.step;
        }
    }

    // Zero matches with at least one shard error means nothing usable
    // arrived; surface the error. If some shards produced results we prefer
    // the partial answer over the error.
    if total == 0 {
        if let Some(err) = last_error {
            return err;
        }
    }

    let ranked = heap.into_sorted();
    let offset = req.offset.max(0) as usize;

    let mut out: Vec<Reply> = Vec::new();
    out.push(Reply::Int(total));
    for result in ranked.into_iter().take(bound).skip(offset) {
        out.push(Reply::Str(result.id));
        if req.with_scores {
            out.push(Reply::Double(result.score));
        }
        if req.with_payload {
            out.push(result.payload);
        }
        if req.with_sorting_keys && req.with_sort_by {
            out.push(match result.sort_key {
                Some(key) => Reply::Str(key),
                None => Reply::Nil,
            });
        }
        if !req.no_content {
            out.push(result.fields);
        }
    }
    Reply::Array(out)
}
