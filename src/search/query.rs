//! Translation of a validated request into the engine query body.

use serde_json::{json, Value};

use crate::error::ApiError;

use super::SearchParams;

/// Temporal aggregation targets get a date histogram; everything else gets
/// term buckets.
pub(crate) fn is_date_field(field: &str) -> bool {
    field.ends_with("Date") || field.ends_with("date")
}

/// The query body sent to Elasticsearch. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineQuery {
    body: Value,
}

impl EngineQuery {
    /// Translate a validated request into an engine query.
    ///
    /// Pure over its input: identical requests produce identical bodies.
    pub fn build(params: &SearchParams) -> Result<Self, ApiError> {
        validate_clause(&params.search)?;

        let query = if params.search.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({ "query_string": { "query": params.search } })
        };

        let body = match &params.count {
            Some(field) => {
                let aggregation = if is_date_field(field) {
                    json!({
                        "date_histogram": {
                            "field": field,
                            "calendar_interval": "day"
                        }
                    })
                } else {
                    json!({ "terms": { "field": field } })
                };

                json!({
                    "query": query,
                    "size": 0,
                    "aggs": { "count": aggregation }
                })
            }
            None => json!({
                "query": query,
                "from": params.skip,
                "size": params.limit,
                "track_total_hits": true
            }),
        };

        Ok(Self { body })
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Lexical checks over the clause before it is shipped to the engine.
///
/// Field names are not checked: scene metadata is an open bag, so the set of
/// queryable fields is not known statically.
fn validate_clause(clause: &str) -> Result<(), ApiError> {
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut range_start: Option<usize> = None;

    for (i, c) in clause.char_indices() {
        if in_quotes {
            if c == '"' {
                in_quotes = false;
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(query_error("unbalanced parentheses", clause));
                }
            }
            '[' => {
                if range_start.is_some() {
                    return Err(query_error("nested range brackets", clause));
                }
                range_start = Some(i);
            }
            ']' => {
                let start = range_start
                    .take()
                    .ok_or_else(|| query_error("unbalanced range brackets", clause))?;
                if !clause[start + 1..i].contains(" TO ") {
                    return Err(query_error(
                        "malformed range, expected [<from> TO <to>]",
                        clause,
                    ));
                }
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(query_error("unbalanced quotes", clause));
    }
    if depth != 0 {
        return Err(query_error("unbalanced parentheses", clause));
    }
    if range_start.is_some() {
        return Err(query_error("unbalanced range brackets", clause));
    }

    Ok(())
}

fn query_error(reason: &str, clause: &str) -> ApiError {
    ApiError::QueryBuild(format!("Cannot parse search clause ({}): {}", reason, clause))
}
