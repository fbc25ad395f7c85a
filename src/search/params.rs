//! Request parameter validation.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::GeoPoint;

/// Grammar for the containment token: an optional leading ` AND `
/// conjunction, the literal `contains:`, then signed decimal longitude and
/// latitude separated by a comma.
fn contains_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\sAND\s)?contains:(-?\d+(?:\.\d*)?),(-?\d+(?:\.\d*)?)").unwrap()
    })
}

/// A validated search request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Engine query clause, with any containment token already replaced by
    /// its bounding-box ranges.
    pub search: String,
    /// Result offset (hit-listing mode).
    pub skip: u64,
    /// Result page size sent to the engine.
    pub limit: u64,
    /// Aggregation target field; present iff count mode is active.
    pub count: Option<String>,
    /// Point extracted from a `contains:` token.
    pub containment: Option<GeoPoint>,
    /// The limit the caller asked for, kept while `limit` holds the
    /// inflated containment ceiling.
    pub user_limit: Option<u64>,
}

impl SearchParams {
    /// Validate raw query parameters into a typed request.
    ///
    /// Fails on the first offending parameter; nothing is coerced silently.
    pub fn from_raw(raw: &HashMap<String, String>, config: &Config) -> Result<Self, ApiError> {
        for name in raw.keys() {
            if !matches!(name.as_str(), "search" | "skip" | "limit" | "count") {
                return Err(ApiError::Validation(format!(
                    "Unknown parameter: {}",
                    name
                )));
            }
        }

        let search = raw.get("search").cloned().unwrap_or_default();

        let skip = match raw.get("skip") {
            Some(value) => value.parse::<u64>().map_err(|_| {
                ApiError::Validation(format!(
                    "skip must be a non-negative integer, got '{}'",
                    value
                ))
            })?,
            None => 0,
        };

        let limit = match raw.get("limit") {
            Some(value) => {
                let limit = value.parse::<u64>().map_err(|_| {
                    ApiError::Validation(format!(
                        "limit must be a positive integer, got '{}'",
                        value
                    ))
                })?;
                if limit == 0 {
                    return Err(ApiError::Validation(
                        "limit must be a positive integer, got '0'".to_string(),
                    ));
                }
                if limit > config.max_limit {
                    return Err(ApiError::Validation(format!(
                        "limit cannot exceed {}",
                        config.max_limit
                    )));
                }
                limit
            }
            None => config.default_limit,
        };

        let count = match raw.get("count") {
            Some(field) if field.is_empty() => {
                return Err(ApiError::Validation(
                    "count requires a field to aggregate on".to_string(),
                ));
            }
            Some(field) => Some(field.clone()),
            None => None,
        };

        let (search, containment, user_limit, limit, skip) =
            match extract_containment(&search)? {
                Some((rewritten, point)) => {
                    // The coarse bounding-box filter can leave false
                    // positives anywhere in the candidate set, so the engine
                    // call fetches everything from offset 0 and the caller's
                    // limit is applied after the exact filter.
                    (
                        rewritten,
                        Some(point),
                        Some(limit),
                        config.containment_limit,
                        0,
                    )
                }
                None => (search, None, None, limit, skip),
            };

        Ok(Self {
            search,
            skip,
            limit,
            count,
            containment,
            user_limit,
        })
    }
}

/// Detect and strip a containment token, rewriting the clause with the
/// coarse bounding-box ranges.
///
/// Any footprint enclosing the point must have its upper-left latitude at or
/// above it, its lower-right latitude at or below it, its lower-left
/// longitude at or west of it and its upper-right longitude at or east of
/// it, so the rewritten ranges never drop a true match. Footprints whose
/// bounding box overlaps the point without truly containing it survive; the
/// exact filter removes them after the engine call.
fn extract_containment(search: &str) -> Result<Option<(String, GeoPoint)>, ApiError> {
    let pattern = contains_pattern();

    let Some(caps) = pattern.captures(search) else {
        if search.contains("contains:") {
            return Err(ApiError::Validation(
                "Invalid contains filter, expected contains:<lon>,<lat>".to_string(),
            ));
        }
        return Ok(None);
    };

    let lon: f64 = caps[2].parse().map_err(|_| {
        ApiError::Validation("Invalid longitude in contains filter".to_string())
    })?;
    let lat: f64 = caps[3].parse().map_err(|_| {
        ApiError::Validation("Invalid latitude in contains filter".to_string())
    })?;

    let replacement = format!(
        "${{1}}upperLeftCornerLatitude:[{lat} TO 1000] AND \
         lowerRightCornerLatitude:[-1000 TO {lat}] AND \
         lowerLeftCornerLongitude:[-1000 TO {lon}] AND \
         upperRightCornerLongitude:[{lon} TO 1000]"
    );
    let rewritten = pattern.replace(search, replacement.as_str()).into_owned();

    if rewritten.contains("contains:") {
        return Err(ApiError::Validation(
            "At most one contains filter is supported".to_string(),
        ));
    }

    Ok(Some((rewritten, GeoPoint::new(lon, lat))))
}
