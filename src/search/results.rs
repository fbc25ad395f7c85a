//! Engine result parsing, exact containment filtering, and response
//! assembly.

use chrono::DateTime;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::error::ApiError;
use crate::footprint;
use crate::models::SceneRecord;

use super::query::is_date_field;
use super::SearchParams;

/// Parsed engine response. Consumed exactly once by the assembler.
#[derive(Debug)]
pub enum ResultSet {
    /// Hit-listing mode: matched records plus the engine's total.
    Hits {
        total: u64,
        records: Vec<SceneRecord>,
    },
    /// Count mode with a categorical target.
    TermBuckets(Vec<TermBucket>),
    /// Count mode with a temporal target.
    DateBuckets(Vec<DateBucket>),
}

#[derive(Debug)]
pub struct TermBucket {
    pub term: Value,
    pub count: u64,
}

#[derive(Debug)]
pub struct DateBucket {
    /// Bucket key, epoch milliseconds.
    pub time: i64,
    pub count: u64,
}

impl ResultSet {
    /// Parse the raw engine response for the mode the request ran in.
    pub fn parse(raw: Value, params: &SearchParams) -> Result<Self, ApiError> {
        match &params.count {
            None => {
                let total = raw["hits"]["total"]["value"]
                    .as_u64()
                    .ok_or_else(|| malformed("hits.total.value"))?;
                let hits = raw["hits"]["hits"]
                    .as_array()
                    .ok_or_else(|| malformed("hits.hits"))?;

                let records = hits
                    .iter()
                    .map(|hit| {
                        serde_json::from_value::<SceneRecord>(hit["_source"].clone()).map_err(
                            |e| {
                                ApiError::EngineResponse(format!(
                                    "undecodable scene document: {}",
                                    e
                                ))
                            },
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ResultSet::Hits { total, records })
            }
            Some(field) => {
                let buckets = raw["aggregations"]["count"]["buckets"]
                    .as_array()
                    .ok_or_else(|| malformed("aggregations.count.buckets"))?;

                if is_date_field(field) {
                    let entries = buckets
                        .iter()
                        .map(|bucket| {
                            let time = bucket["key"]
                                .as_i64()
                                .ok_or_else(|| malformed("date bucket key"))?;
                            let count = bucket["doc_count"]
                                .as_u64()
                                .ok_or_else(|| malformed("bucket doc_count"))?;
                            Ok(DateBucket { time, count })
                        })
                        .collect::<Result<Vec<_>, ApiError>>()?;
                    Ok(ResultSet::DateBuckets(entries))
                } else {
                    let entries = buckets
                        .iter()
                        .map(|bucket| {
                            let count = bucket["doc_count"]
                                .as_u64()
                                .ok_or_else(|| malformed("bucket doc_count"))?;
                            Ok(TermBucket {
                                term: bucket["key"].clone(),
                                count,
                            })
                        })
                        .collect::<Result<Vec<_>, ApiError>>()?;
                    Ok(ResultSet::TermBuckets(entries))
                }
            }
        }
    }
}

fn malformed(path: &str) -> ApiError {
    ApiError::EngineResponse(format!("missing or malformed {}", path))
}

/// Public response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub meta: Meta,
    pub results: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub credit: String,
    pub license: String,
    pub website: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<PageMeta>,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub skip: u64,
    pub limit: u64,
    pub total: u64,
}

/// Shape a result set into the public envelope.
///
/// When a containment point is present the exact filter runs here and the
/// pagination block is recomputed from the filtered set: the engine total
/// counts coarse candidates, not true matches.
pub fn assemble(
    result_set: ResultSet,
    params: &SearchParams,
    config: &Config,
) -> Result<ApiResponse, ApiError> {
    let meta = |page: Option<PageMeta>| Meta {
        credit: config.attribution.credit.clone(),
        license: config.attribution.license.clone(),
        website: config.attribution.website.clone(),
        results: page,
    };

    match result_set {
        ResultSet::Hits { total, records } => {
            if records.is_empty() {
                return Err(ApiError::NotFound("No matches found!".to_string()));
            }

            let (records, page) = match params.containment {
                Some(point) => {
                    let matched: Vec<SceneRecord> = records
                        .into_iter()
                        .filter(|record| footprint::footprint_contains(record, point))
                        .collect();
                    if matched.is_empty() {
                        return Err(ApiError::NotFound("No matches found!".to_string()));
                    }

                    let user_limit = params.user_limit.unwrap_or(params.limit);
                    let page = PageMeta {
                        skip: params.skip,
                        limit: user_limit,
                        total: matched.len() as u64,
                    };
                    let truncated: Vec<SceneRecord> =
                        matched.into_iter().take(user_limit as usize).collect();
                    (truncated, page)
                }
                None => {
                    let page = PageMeta {
                        skip: params.skip,
                        limit: params.limit,
                        total,
                    };
                    (records, page)
                }
            };

            let results = records
                .iter()
                .map(|record| serve_record(record, &config.strip_fields))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ApiResponse {
                meta: meta(Some(page)),
                results,
            })
        }
        ResultSet::TermBuckets(buckets) => {
            if buckets.is_empty() {
                return Err(ApiError::NotFound("Nothing to count".to_string()));
            }

            let results = buckets
                .into_iter()
                .map(|bucket| json!({ "term": bucket.term, "count": bucket.count }))
                .collect();

            Ok(ApiResponse {
                meta: meta(None),
                results,
            })
        }
        ResultSet::DateBuckets(buckets) => {
            if buckets.is_empty() {
                return Err(ApiError::NotFound("Nothing to count".to_string()));
            }

            let results = buckets
                .into_iter()
                .map(|bucket| {
                    let day = DateTime::from_timestamp_millis(bucket.time)
                        .ok_or_else(|| malformed("date bucket key"))?;
                    Ok(json!({
                        "time": day.format("%Y%m%d").to_string(),
                        "count": bucket.count
                    }))
                })
                .collect::<Result<Vec<_>, ApiError>>()?;

            Ok(ApiResponse {
                meta: meta(None),
                results,
            })
        }
    }
}

/// Rebuild a record for serving, keeping only permitted fields.
///
/// The stripped set is applied by constructing a fresh output map, never by
/// deleting from the stored record.
fn serve_record(record: &SceneRecord, strip_fields: &[String]) -> Result<Value, ApiError> {
    let full = serde_json::to_value(record)
        .map_err(|e| ApiError::EngineResponse(format!("unserializable scene document: {}", e)))?;

    let Value::Object(fields) = full else {
        return Err(ApiError::EngineResponse(
            "unserializable scene document".to_string(),
        ));
    };

    let kept: Map<String, Value> = fields
        .into_iter()
        .filter(|(name, _)| !strip_fields.iter().any(|stripped| stripped == name))
        .collect();

    Ok(Value::Object(kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn params() -> SearchParams {
        SearchParams {
            search: String::new(),
            skip: 0,
            limit: 1,
            count: None,
            containment: None,
            user_limit: None,
        }
    }

    /// Axis-aligned unit footprint shifted by `offset` degrees east.
    fn scene(offset: f64) -> SceneRecord {
        SceneRecord {
            upper_left_corner_latitude: 1.0,
            upper_left_corner_longitude: offset,
            upper_right_corner_latitude: 1.0,
            upper_right_corner_longitude: offset + 1.0,
            lower_left_corner_latitude: 0.0,
            lower_left_corner_longitude: offset,
            lower_right_corner_latitude: 0.0,
            lower_right_corner_longitude: offset + 1.0,
            metadata: Map::new(),
        }
    }

    #[test]
    fn test_parse_hits() {
        let raw = json!({
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "hits": [
                    { "_source": {
                        "upperLeftCornerLatitude": 1.0,
                        "upperLeftCornerLongitude": 0.0,
                        "upperRightCornerLatitude": 1.0,
                        "upperRightCornerLongitude": 1.0,
                        "lowerLeftCornerLatitude": 0.0,
                        "lowerLeftCornerLongitude": 0.0,
                        "lowerRightCornerLatitude": 0.0,
                        "lowerRightCornerLongitude": 1.0,
                        "sceneID": "LC80330322014139LGN00"
                    } }
                ]
            }
        });

        let ResultSet::Hits { total, records } = ResultSet::parse(raw, &params()).unwrap()
        else {
            panic!("expected hits");
        };
        assert_eq!(total, 42);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata["sceneID"], "LC80330322014139LGN00");
    }

    #[test]
    fn test_parse_term_buckets() {
        let mut request = params();
        request.count = Some("path".to_string());

        let raw = json!({
            "hits": { "total": { "value": 9 }, "hits": [] },
            "aggregations": {
                "count": { "buckets": [ { "key": 33, "doc_count": 9 } ] }
            }
        });

        let ResultSet::TermBuckets(buckets) = ResultSet::parse(raw, &request).unwrap() else {
            panic!("expected term buckets");
        };
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 9);
    }

    #[test]
    fn test_zero_hits_is_not_found() {
        let raw = json!({ "hits": { "total": { "value": 0 }, "hits": [] } });
        let result_set = ResultSet::parse(raw, &params()).unwrap();
        let err = assemble(result_set, &params(), &Config::default()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "No matches found!");
    }

    #[test]
    fn test_total_reflects_exact_filter_not_engine_total() {
        let mut request = params();
        request.containment = Some(GeoPoint::new(0.5, 0.5));
        request.limit = Config::default().containment_limit;
        request.user_limit = Some(1);

        // Three coarse candidates, engine total 50; only the first two truly
        // contain the point.
        let result_set = ResultSet::Hits {
            total: 50,
            records: vec![scene(0.0), scene(-0.2), scene(10.0)],
        };

        let response = assemble(result_set, &request, &Config::default()).unwrap();
        let page = response.meta.results.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.limit, 1);
        assert_eq!(response.results.len(), 1);
    }

    #[test]
    fn test_filtered_to_zero_is_not_found() {
        let mut request = params();
        request.containment = Some(GeoPoint::new(50.0, 50.0));
        request.user_limit = Some(1);

        let result_set = ResultSet::Hits {
            total: 3,
            records: vec![scene(0.0)],
        };

        let err = assemble(result_set, &request, &Config::default()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_passthrough_without_containment() {
        let mut request = params();
        request.skip = 4;
        request.limit = 2;

        let result_set = ResultSet::Hits {
            total: 37,
            records: vec![scene(0.0), scene(5.0)],
        };

        let response = assemble(result_set, &request, &Config::default()).unwrap();
        let page = response.meta.results.unwrap();
        assert_eq!((page.skip, page.limit, page.total), (4, 2, 37));
        assert_eq!(response.results.len(), 2);
    }

    #[test]
    fn test_strip_fields() {
        let mut record = scene(0.0);
        record
            .metadata
            .insert("sceneID".to_string(), json!("LC80330322014139LGN00"));
        record
            .metadata
            .insert("ingestPath".to_string(), json!("/mnt/scenes/033"));

        let config = Config {
            strip_fields: vec!["ingestPath".to_string()],
            ..Config::default()
        };

        let result_set = ResultSet::Hits {
            total: 1,
            records: vec![record],
        };

        let response = assemble(result_set, &params(), &config).unwrap();
        let served = &response.results[0];
        assert!(served.get("ingestPath").is_none());
        assert_eq!(served["sceneID"], "LC80330322014139LGN00");
        assert_eq!(served["upperLeftCornerLatitude"], 1.0);
    }

    #[test]
    fn test_date_buckets_formatted() {
        let mut request = params();
        request.count = Some("acquisitionDate".to_string());

        // 2014-01-15T00:00:00Z
        let result_set = ResultSet::DateBuckets(vec![DateBucket {
            time: 1_389_744_000_000,
            count: 12,
        }]);

        let response = assemble(result_set, &request, &Config::default()).unwrap();
        assert!(response.meta.results.is_none());
        assert_eq!(response.results[0], json!({ "time": "20140115", "count": 12 }));
    }

    #[test]
    fn test_empty_buckets_is_not_found() {
        let mut request = params();
        request.count = Some("path".to_string());

        let err =
            assemble(ResultSet::TermBuckets(Vec::new()), &request, &Config::default())
                .unwrap_err();
        assert_eq!(err.to_string(), "Nothing to count");
    }
}
