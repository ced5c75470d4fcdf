//! Age banding for beneficiary reports.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    /// 0–5
    EarlyChildhood,
    /// 6–12
    Childhood,
    /// 13–17
    Adolescence,
    /// 18–29
    Youth,
    /// 30–59
    Adulthood,
    /// 60 and over
    Elderly,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        Self::EarlyChildhood,
        Self::Childhood,
        Self::Adolescence,
        Self::Youth,
        Self::Adulthood,
        Self::Elderly,
    ];

    pub fn for_age(years: u32) -> Self {
        match years {
            0..=5 => Self::EarlyChildhood,
            6..=12 => Self::Childhood,
            13..=17 => Self::Adolescence,
            18..=29 => Self::Youth,
            30..=59 => Self::Adulthood,
            _ => Self::Elderly,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::EarlyChildhood => "0-5",
            Self::Childhood => "6-12",
            Self::Adolescence => "13-17",
            Self::Youth => "18-29",
            Self::Adulthood => "30-59",
            Self::Elderly => "60+",
        }
    }
}

/// Completed years between `birth` and `today`. `None` when `birth` is after
/// `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Head counts per age band. Records with no birth date, or one in the
/// future, land in `unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeDistribution {
    pub buckets: BTreeMap<AgeBucket, usize>,
    pub unknown: usize,
}

impl AgeDistribution {
    pub fn count(&self, bucket: AgeBucket) -> usize {
        self.buckets.get(&bucket).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.buckets.values().sum::<usize>() + self.unknown
    }
}

pub fn bucket_counts<I>(birth_dates: I, today: NaiveDate) -> AgeDistribution
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let mut dist = AgeDistribution::default();
    for birth in birth_dates {
        match birth.and_then(|b| age_on(b, today)) {
            Some(years) => *dist.buckets.entry(AgeBucket::for_age(years)).or_insert(0) += 1,
            None => dist.unknown += 1,
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn age_counts_completed_years() {
        let today = date("2024-06-15");
        assert_eq!(age_on(date("2000-06-15"), today), Some(24));
        assert_eq!(age_on(date("2000-06-16"), today), Some(23));
        assert_eq!(age_on(date("2024-06-15"), today), Some(0));
        assert_eq!(age_on(date("2024-06-16"), today), None);
    }

    #[test]
    fn leap_day_birthday() {
        assert_eq!(age_on(date("2000-02-29"), date("2023-02-28")), Some(22));
        assert_eq!(age_on(date("2000-02-29"), date("2023-03-01")), Some(23));
    }

    #[test]
    fn band_edges() {
        assert_eq!(AgeBucket::for_age(5), AgeBucket::EarlyChildhood);
        assert_eq!(AgeBucket::for_age(6), AgeBucket::Childhood);
        assert_eq!(AgeBucket::for_age(17), AgeBucket::Adolescence);
        assert_eq!(AgeBucket::for_age(18), AgeBucket::Youth);
        assert_eq!(AgeBucket::for_age(59), AgeBucket::Adulthood);
        assert_eq!(AgeBucket::for_age(60), AgeBucket::Elderly);
    }

    #[test]
    fn distribution_counts_unknowns() {
        let today = date("2024-06-15");
        let dist = bucket_counts(
            [
                Some(date("2020-01-01")),
                Some(date("1950-01-01")),
                Some(date("1951-01-01")),
                None,
                Some(date("2030-01-01")),
            ],
            today,
        );
        assert_eq!(dist.count(AgeBucket::EarlyChildhood), 1);
        assert_eq!(dist.count(AgeBucket::Elderly), 2);
        assert_eq!(dist.count(AgeBucket::Youth), 0);
        assert_eq!(dist.unknown, 2);
        assert_eq!(dist.total(), 5);
    }
}
