use std::collections::BTreeMap;

use serde::Serialize;

use crate::store::GroupCount;

/// Label used for placed records with no sector or company recorded.
pub const UNSPECIFIED: &str = "Sin especificar";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankedCount {
    pub key: String,
    pub count: i64,
}

/// Turns raw group-by rows into a ranking.
///
/// Absent keys are labelled [`UNSPECIFIED`] and merged with any row already carrying that
/// label. Ordered by count descending, ties by key ascending.
pub fn rank_counts(groups: Vec<GroupCount>) -> Vec<RankedCount> {
    let mut merged: BTreeMap<String, i64> = BTreeMap::new();
    for group in groups {
        let key = group.key.unwrap_or_else(|| UNSPECIFIED.to_string());
        *merged.entry(key).or_insert(0) += group.count;
    }

    let mut ranked: Vec<RankedCount> = merged
        .into_iter()
        .map(|(key, count)| RankedCount { key, count })
        .collect();
    // Stable: equal counts keep the map's ascending key order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
