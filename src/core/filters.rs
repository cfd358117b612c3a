use std::collections::BTreeSet;

use crate::models::{FilterState, Profile, ANY};

/// Check a category value against an acceptance set
///
/// An empty set accepts nothing; a set containing `ANY` accepts everything.
#[inline]
pub fn accepts(allowed: &BTreeSet<String>, value: &str) -> bool {
    allowed.contains(ANY) || allowed.contains(value)
}

/// Check if a profile satisfies the user's filters
///
/// `distance_km` is the distance between the user and the candidate, or
/// `None` when either position is unknown. Unknown distances pass.
#[inline]
pub fn passes_filter(
    profile: &Profile,
    filter: &FilterState,
    distance_km: Option<f64>,
) -> bool {
    // Check age range (inclusive)
    if profile.age < filter.min_age || profile.age > filter.max_age {
        return false;
    }

    if !accepts(&filter.energy_levels, &profile.energy_level) {
        return false;
    }

    if !accepts(&filter.breeds, &profile.breed) {
        return false;
    }

    if !accepts(&filter.sizes, &profile.size) {
        return false;
    }

    match distance_km {
        Some(d) => d <= filter.max_distance_km,
        None => true,
    }
}
