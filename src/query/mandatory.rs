use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Offer, SearchError};
use crate::query::request::SearchQuery;

/// requiredDays 与 offer 时长的比较口径
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DurationPolicy {
    /// number_days == required_days
    #[default]
    Exact,
    /// number_days >= required_days
    AtLeast,
}

impl FromStr for DurationPolicy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(DurationPolicy::Exact),
            "at-least" => Ok(DurationPolicy::AtLeast),
            other => Err(SearchError::invalid(format!("unknown duration policy '{}'", other))),
        }
    }
}

impl fmt::Display for DurationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationPolicy::Exact => f.write_str("exact"),
            DurationPolicy::AtLeast => f.write_str("at-least"),
        }
    }
}

/// 必选过滤：时间窗包含 + 时长匹配。区域收窄由 store 的桶/位图完成。
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MandatoryFilter {
    pub window_start: u64,
    pub window_end: u64,
    pub required_days: u64,
    pub policy: DurationPolicy,
}

impl MandatoryFilter {
    pub fn new(window_start: u64, window_end: u64, required_days: u64, policy: DurationPolicy) -> Self {
        Self {
            window_start,
            window_end,
            required_days,
            policy,
        }
    }

    pub fn for_query(query: &SearchQuery, policy: DurationPolicy) -> Self {
        Self::new(query.window_start, query.window_end, query.required_days, policy)
    }

    #[inline]
    pub fn days_ok(&self, number_days: u64) -> bool {
        match self.policy {
            DurationPolicy::Exact => number_days == self.required_days,
            DurationPolicy::AtLeast => number_days >= self.required_days,
        }
    }

    #[inline]
    pub fn window_ok(&self, offer: &Offer) -> bool {
        offer.start_date >= self.window_start && offer.end_date <= self.window_end
    }

    #[inline]
    pub fn matches(&self, offer: &Offer) -> bool {
        self.window_ok(offer) && self.days_ok(offer.number_days())
    }

    pub fn apply<'a, I>(&self, bucket: I) -> Vec<&'a Offer>
    where
        I: IntoIterator<Item = &'a Offer>,
    {
        bucket.into_iter().filter(|o| self.matches(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::OfferSpec;
    use crate::core::MILLIS_PER_DAY;

    #[test]
    fn keeps_offers_inside_window_with_exact_duration() {
        let inside = OfferSpec { id: 1, start: MILLIS_PER_DAY, days: 2, ..Default::default() }.build();
        let too_long = OfferSpec { id: 2, start: MILLIS_PER_DAY, days: 3, ..Default::default() }.build();
        let too_early = OfferSpec { id: 3, start: 0, days: 2, ..Default::default() }.build();
        let overruns = OfferSpec { id: 4, start: 4 * MILLIS_PER_DAY, days: 2, ..Default::default() }.build();

        let f = MandatoryFilter::new(MILLIS_PER_DAY, 5 * MILLIS_PER_DAY, 2, DurationPolicy::Exact);
        let bucket = [inside.clone(), too_long, too_early, overruns];
        let kept = f.apply(bucket.iter());
        assert_eq!(kept, vec![&inside]);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let o = OfferSpec { start: 0, days: 1, ..Default::default() }.build();
        let f = MandatoryFilter::new(0, MILLIS_PER_DAY, 1, DurationPolicy::Exact);
        assert!(f.matches(&o));
    }

    #[test]
    fn at_least_policy_accepts_longer_offers() {
        let o = OfferSpec { days: 3, ..Default::default() }.build();
        let exact = MandatoryFilter::new(0, 10 * MILLIS_PER_DAY, 2, DurationPolicy::Exact);
        let at_least = MandatoryFilter::new(0, 10 * MILLIS_PER_DAY, 2, DurationPolicy::AtLeast);
        assert!(!exact.matches(&o));
        assert!(at_least.matches(&o));
    }
}
