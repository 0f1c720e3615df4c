//! Client search request context.
//!
//! One `SearchRequest` is parsed per search call from the original argument
//! list, threaded through the scatter-gather engine as the call's private
//! context, and dropped after the reducer runs.

/// Default page size applied when the request carries no LIMIT clause.
const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub offset: i64,
    pub limit: i64,
    /// Whether the user asked for scores. Internally the shard command
    /// always carries WITHSCORES; this flag controls output projection only.
    pub with_scores: bool,
    pub with_payload: bool,
    pub with_sort_by: bool,
    pub sort_ascending: bool,
    pub with_sorting_keys: bool,
    pub no_content: bool,
}

impl SearchRequest {
    /// Parses a search command argument list (`FT.SEARCH {index} {query}
    /// ...`). Returns `None` when the request is too short to be a search.
    pub fn parse(args: &[String]) -> Option<Self> {
        if args.len() < 3 {
            return None;
        }

        let mut req = SearchRequest {
            query: args[2].clone(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            with_scores: arg_exists(args, "WITHSCORES", 3),
            with_payload: arg_exists(args, "WITHPAYLOADS", 3),
            with_sort_by: false,
            sort_ascending: true,
            with_sorting_keys: arg_exists(args, "WITHSORTKEYS", 3),
            no_content: arg_exists(args, "NOCONTENT", 3),
        };

        // SORTBY {field} [ASC|DESC]
        if let Some(sort_by) = arg_index(args, "SORTBY") {
            if sort_by > 2 {
                req.with_sort_by = true;
                if let Some(dir) = args.get(sort_by + 2) {
                    if dir.eq_ignore_ascii_case("DESC") {
                        req.sort_ascending = false;
                    }
                }
            }
        }

        // RETURN 0 suppresses content just like NOCONTENT
        if !req.no_content {
            if let Some(ret) = arg_index_from(args, "RETURN", 3) {
                let count = args
                    .get(ret + 1)
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(-1);
                if count <= 0 {
                    req.no_content = true;
                }
            }
        }

        // LIMIT {offset} {limit}
        if let Some(limit_pos) = arg_index(args, "LIMIT") {
            if let (Some(offset), Some(limit)) = (
                args.get(limit_pos + 1).and_then(|v| v.parse::<i64>().ok()),
                args.get(limit_pos + 2).and_then(|v| v.parse::<i64>().ok()),
            ) {
                req.offset = offset;
                req.limit = limit;
            }
        }
        if req.limit <= 0 {
            req.limit = DEFAULT_LIMIT;
        }
        if req.offset <= 0 {
            req.offset = 0;
        }

        Some(req)
    }

    /// Upper bound of candidates the merge has to hold: offset + limit.
    pub fn bound(&self) -> usize {
        (self.offset + self.limit).max(0) as usize
    }
}

/// Case-insensitive position of `name` anywhere in the argument list.
pub fn arg_index(args: &[String], name: &str) -> Option<usize> {
    args.iter().position(|a| a.eq_ignore_ascii_case(name))
}

/// Case-insensitive position of `name`, searching from `from` onward.
pub fn arg_index_from(args: &[String], name: &str, from: usize) -> Option<usize> {
    args.iter()
        .skip(from)
        .position(|a| a.eq_ignore_ascii_case(name))
        .map(|p| p + from)
}

fn arg_exists(args: &[String], name: &str, from: usize) -> bool {
    arg_index_from(args, name, from).is_some()
}
