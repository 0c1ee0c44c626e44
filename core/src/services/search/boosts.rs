//! Post-fusion additive boosts: path-prefix affinity and recency
//! (spec §4.4, §9 path-prefix comparison rules).

use chrono::{DateTime, Utc};

pub const PATH_EXACT_BOOST: f64 = 0.12;
pub const PATH_ANCESTOR_BOOST: f64 = 0.06;
pub const RECENCY_BOOST_MAX: f64 = 0.10;
pub const RECENCY_WINDOW_DAYS: f64 = 30.0;

/// `+0.12` for an exact scope match against `path_prefix`, `+0.06` if
/// `path_prefix` is a descendant of `scope`, else `0`. Trailing slashes are
/// trimmed before comparison; a bare `/` is a universal ancestor of any path
/// starting with `/`.
pub fn path_boost(scope: Option<&str>, path_prefix: Option<&str>) -> f64 {
    let (Some(scope), Some(path_prefix)) = (scope, path_prefix) else {
        return 0.0;
    };
    let scope = scope.trim_end_matches('/');
    let path_prefix = path_prefix.trim_end_matches('/');

    if scope == path_prefix {
        return PATH_EXACT_BOOST;
    }
    if scope.is_empty() && path_prefix.starts_with('/') {
        return PATH_ANCESTOR_BOOST;
    }
    if path_prefix.starts_with(&format!("{scope}/")) {
        return PATH_ANCESTOR_BOOST;
    }
    0.0
}

/// Linear decay over 30 days: `(1 - age_days/30) * 0.10`, clamped to
/// `[0, 0.10]`. Absent `updated_at` contributes nothing.
pub fn recency_boost(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(updated_at) = updated_at else {
        return 0.0;
    };
    let age_days = (now - updated_at).num_seconds() as f64 / 86_400.0;
    let raw = (1.0 - age_days / RECENCY_WINDOW_DAYS) * RECENCY_BOOST_MAX;
    raw.clamp(0.0, RECENCY_BOOST_MAX)
}
