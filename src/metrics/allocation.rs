//! Coverage allocation: how much of an outlet's cadence each covered county receives.
//!
//! The rollup only ever asks an [`Allocation`] for an outlet's county weights,
//! so a population- or locality-weighted scheme can replace [`EqualSplit`]
//! without touching the aggregation.

use crate::models::{CountyFips, Outlet};

/// Maps an outlet to `(county, weight)` pairs.
///
/// Implementations must return weights summing to `1.0` for an outlet with
/// at least one county, and an empty vector for an outlet with none.
pub trait Allocation {
    fn allocate(&self, outlet: &Outlet) -> Vec<(CountyFips, f64)>;
}

/// Every covered county receives `1/n` of the outlet.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualSplit;

impl Allocation for EqualSplit {
    fn allocate(&self, outlet: &Outlet) -> Vec<(CountyFips, f64)> {
        let n = outlet.counties_fips.len();
        if n == 0 {
            return Vec::new();
        }
        let share = 1.0 / n as f64;
        outlet
            .counties_fips
            .iter()
            .map(|fips| (fips.clone(), share))
            .collect()
    }
}
