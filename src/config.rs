//! Runtime configuration for the search pipeline.

/// Attribution block reported in every response envelope.
#[derive(Debug, Clone)]
pub struct Attribution {
    pub credit: String,
    pub license: String,
    pub website: String,
}

/// Configuration consumed by the search pipeline.
///
/// Built once at startup and passed into the pipeline through
/// [`crate::search::SearchContext`]; the pipeline reads no process-wide
/// state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page size applied when the caller omits `limit`.
    pub default_limit: u64,
    /// Upper bound accepted for the `limit` parameter.
    pub max_limit: u64,
    /// Internal result ceiling used while a containment filter is active.
    /// The coarse bounding-box query can return false positives anywhere in
    /// the candidate set, so the engine call must fetch everything.
    pub containment_limit: u64,
    /// Internal-only fields removed from served records.
    pub strip_fields: Vec<String>,
    /// Attribution fields for the `meta` block.
    pub attribution: Attribution,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_limit: 1,
            max_limit: 100,
            containment_limit: 1_000_000_000,
            strip_fields: Vec::new(),
            attribution: Attribution {
                credit: "Astro Digital".to_string(),
                license: "http://creativecommons.org/publicdomain/zero/1.0/legalcode"
                    .to_string(),
                website: "https://api.astrodigital.com/v1".to_string(),
            },
        }
    }
}
