//! WIQL (Work Item Query Language) construction for `workitems-recent`.

use crate::error::UsageError;
use crate::options::{bounded_top, parse_option_args};

pub const RECENT_USAGE: &str =
    "workitems-recent [top] [--tag=<tag>] [--type=<work-item-type>] [--state=<state>]";

const RECENT_DEFAULT_TOP: u32 = 10;
const RECENT_MAX_TOP: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemFilters {
    pub tag: Option<String>,
    pub work_item_type: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentArgs {
    pub top: u32,
    pub filters: WorkItemFilters,
}

/// Escape a string literal for WIQL by doubling single quotes.
pub fn escape_wiql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// `SELECT [System.Id] FROM WorkItems [WHERE ...] ORDER BY [System.ChangedDate] DESC`
///
/// Clauses are always emitted in the order type, state, tag.
pub fn build_recent_work_items_wiql(filters: &WorkItemFilters) -> String {
    let mut clauses = Vec::new();

    if let Some(work_item_type) = &filters.work_item_type {
        clauses.push(format!(
            "[System.WorkItemType] = '{}'",
            escape_wiql_literal(work_item_type)
        ));
    }
    if let Some(state) = &filters.state {
        clauses.push(format!("[System.State] = '{}'", escape_wiql_literal(state)));
    }
    if let Some(tag) = &filters.tag {
        clauses.push(format!(
            "[System.Tags] CONTAINS '{}'",
            escape_wiql_literal(tag)
        ));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    format!("SELECT [System.Id] FROM WorkItems{where_clause} ORDER BY [System.ChangedDate] DESC")
}

pub fn parse_work_items_recent_args<S: AsRef<str>>(args: &[S]) -> Result<RecentArgs, UsageError> {
    let parsed = parse_option_args(args);
    parsed
        .ensure_allowed(&["top", "tag", "type", "state"], "workitems-recent")
        .map_err(|e| e.with_usage(RECENT_USAGE))?;
    parsed
        .ensure_max_positionals(1)
        .map_err(|e| e.with_usage(RECENT_USAGE))?;

    let top_candidate = parsed
        .text("top")
        .or_else(|| parsed.positionals.first().map(String::as_str));
    let top = bounded_top(top_candidate, RECENT_DEFAULT_TOP, RECENT_MAX_TOP);

    let filter = |key: &str| parsed.non_empty_text(key).map(str::to_string);

    Ok(RecentArgs {
        top,
        filters: WorkItemFilters {
            tag: filter("tag"),
            work_item_type: filter("type"),
            state: filter("state"),
        },
    })
}
