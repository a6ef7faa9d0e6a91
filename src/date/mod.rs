//! Best-effort date extraction from free text
//!
//! Three recogniser families (numeric, month-name, bare year) each propose
//! weighted candidates. Range groupers pair candidates separated by a dash or
//! `to`. When a single date is wanted, candidates vote: a candidate scores its
//! own weight plus one for every range that contains it.

mod ranges;
mod recognizers;

pub use ranges::find_ranges;
pub use recognizers::find_dates;

use std::cmp::Ordering;
use std::fmt;

/// Largest boost a position bias can add to a candidate's score
const MAX_POSITION_BIAS: f64 = 0.1;

/// A calendar date; `day` and `month` are zero when unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    pub day: u32,
    pub month: u32,
    /// Signed year, negative for BC
    pub year: i64,
}

impl Date {
    pub fn new(day: u32, month: u32, year: i64) -> Self {
        Self { day, month, year }
    }

    /// Decodes the integer form `YYYYMMDD` (negative for BC)
    pub fn from_yyyymmdd(n: i64) -> Option<Self> {
        let magnitude = n.unsigned_abs();
        let day = (magnitude % 100) as u32;
        let month = ((magnitude / 100) % 100) as u32;
        let year = i64::try_from(magnitude / 10_000).ok()?;
        if day > 31 || month > 12 {
            return None;
        }
        Some(Self {
            day,
            month,
            year: if n < 0 { -year } else { year },
        })
    }

    /// Renders as `YYYYMMDD`, zero padded, with a leading `-` for BC years
    pub fn yyyymmdd(&self) -> String {
        let sign = if self.year < 0 { "-" } else { "" };
        format!(
            "{}{:04}{:02}{:02}",
            sign,
            self.year.abs(),
            self.month,
            self.day
        )
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.yyyymmdd())
    }
}

/// A date candidate and the byte span it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub date: Date,
    pub start: usize,
    pub end: usize,
    pub weight: f64,
}

/// Two candidates read as a span; `to` is absent for open ranges (`1950–`)
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMatch {
    pub from: DateMatch,
    pub to: Option<DateMatch>,
    pub start: usize,
    pub end: usize,
    pub weight: f64,
}

impl RangeMatch {
    /// Whether `m` lies entirely inside this range's span
    pub fn contains(&self, m: &DateMatch) -> bool {
        self.start <= m.start && m.end <= self.end
    }
}

/// Which end of the text to favour when voting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Favor {
    Start,
    End,
}

/// The best single date in `text`, or `None` when nothing was recognised
///
/// # Examples
///
/// ```
/// use wikipediabase::date::{best_date, Date};
///
/// let date = best_date("He was born on August 19, 1946 in Hope.", None).unwrap();
/// assert_eq!(date, Date::new(19, 8, 1946));
/// ```
pub fn best_date(text: &str, favor: Option<Favor>) -> Option<Date> {
    let candidates = find_dates(text);
    let ranges = find_ranges(text, &candidates);

    let scored: Vec<(f64, &DateMatch)> = candidates
        .iter()
        .map(|c| (score(c, &ranges, text.len(), favor), c))
        .collect();

    scored
        .into_iter()
        .max_by(|(sa, a), (sb, b)| {
            sa.partial_cmp(sb)
                .unwrap_or(Ordering::Equal)
                // Earlier position wins ties, so it must compare as greater.
                .then_with(|| b.start.cmp(&a.start))
        })
        .map(|(_, c)| c.date)
}

/// The heaviest range in `text`
pub fn best_range(text: &str) -> Option<RangeMatch> {
    let candidates = find_dates(text);
    find_ranges(text, &candidates).into_iter().max_by(|a, b| {
        a.weight
            .partial_cmp(&b.weight)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.start.cmp(&a.start))
    })
}

/// Every range recognised in `text`, in position order
pub fn ranges_in(text: &str) -> Vec<RangeMatch> {
    let candidates = find_dates(text);
    find_ranges(text, &candidates)
}

fn score(candidate: &DateMatch, ranges: &[RangeMatch], len: usize, favor: Option<Favor>) -> f64 {
    let containing = ranges.iter().filter(|r| r.contains(candidate)).count() as f64;
    candidate.weight + containing + position_bias(candidate.start, len, favor)
}

fn position_bias(offset: usize, len: usize, favor: Option<Favor>) -> f64 {
    if len == 0 {
        return 0.0;
    }
    let relative = offset as f64 / len as f64;
    match favor {
        Some(Favor::Start) => MAX_POSITION_BIAS * (1.0 - relative),
        Some(Favor::End) => MAX_POSITION_BIAS * relative,
        None => 0.0,
    }
}
