//! Rare-location collapsing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Catch-all category for rare, missing and unknown locations.
pub const OTHER_LOCATION: &str = "other";

/// Location → location mapping learned once over the full training corpus.
///
/// Locations seen at least `min_support` times map to themselves; everything
/// else maps to [`OTHER_LOCATION`]. The map is never rebuilt at inference:
/// the schema's `location_*` columns carry its surviving values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMap {
    min_support: usize,
    frequent: BTreeSet<String>,
    n_collapsed: usize,
}

impl LocationMap {
    /// Count every location and keep the ones with at least `min_support` rows.
    pub fn collapse_rare<'a, I>(locations: I, min_support: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for location in locations {
            *counts.entry(location).or_default() += 1;
        }

        let (frequent, rare): (Vec<_>, Vec<_>) = counts
            .into_iter()
            .partition(|(_, count)| *count >= min_support);

        Self {
            min_support,
            frequent: frequent
                .into_iter()
                .map(|(location, _)| location.to_string())
                .collect(),
            n_collapsed: rare
                .iter()
                .filter(|(location, _)| *location != OTHER_LOCATION)
                .count(),
        }
    }

    /// The location a record should carry after collapsing.
    pub fn resolve<'a>(&self, location: &'a str) -> &'a str {
        if self.frequent.contains(location) {
            location
        } else {
            OTHER_LOCATION
        }
    }

    pub fn min_support(&self) -> usize {
        self.min_support
    }

    /// Surviving locations in ascending order.
    pub fn frequent(&self) -> impl Iterator<Item = &str> {
        self.frequent.iter().map(String::as_str)
    }

    /// Number of distinct locations folded into [`OTHER_LOCATION`].
    pub fn n_collapsed(&self) -> usize {
        self.n_collapsed
    }
}

/// Build the rare-location map for a corpus.
pub fn collapse_rare_locations<'a, I>(locations: I, min_support: usize) -> LocationMap
where
    I: IntoIterator<Item = &'a str>,
{
    LocationMap::collapse_rare(locations, min_support)
}
