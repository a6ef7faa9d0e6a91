use crate::date::{Date, DateMatch};
use regex::{Captures, Regex};
use std::sync::LazyLock;

const NUMERIC_WEIGHT: f64 = 0.8;
const FULL_NAMED_WEIGHT: f64 = 1.0;
const MONTH_YEAR_WEIGHT: f64 = 0.9;
const ERA_YEAR_WEIGHT: f64 = 0.6;
const BARE_YEAR_WEIGHT: f64 = 0.1;

/// Month names, longest alternatives first so `march` wins over `mar`
const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("sept", 9),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const NUMERIC_SEPARATORS: &[&str] = &["-", "/", ".", "|"];

const ERA: &str = r"BCE|BC|AD|CE";

fn month_alternation() -> String {
    MONTHS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join("|")
}

fn build(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid date regex")
}

static DAY_MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    build(&format!(
        r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<month>{})\.?,?\s+(?P<year>\d{{1,4}})(?:\s*(?P<era>{}))?\b",
        month_alternation(),
        ERA
    ))
});

static MONTH_DAY_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    build(&format!(
        r"(?i)\b(?P<month>{})\.?\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<year>\d{{1,4}})(?:\s*(?P<era>{}))?\b",
        month_alternation(),
        ERA
    ))
});

static MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    build(&format!(
        r"(?i)\b(?P<month>{})\.?,?\s+(?P<year>\d{{3,4}})(?:\s*(?P<era>{}))?\b",
        month_alternation(),
        ERA
    ))
});

/// `(year-first, pattern)` pairs, one per separator
static NUMERIC_RES: LazyLock<Vec<(bool, Regex)>> = LazyLock::new(|| {
    let mut res = Vec::new();
    for sep in NUMERIC_SEPARATORS {
        let sep = regex::escape(sep);
        res.push((
            true,
            build(&format!(r"\b(\d{{4}}){sep}(\d{{1,2}}){sep}(\d{{1,2}})\b")),
        ));
        res.push((
            false,
            build(&format!(r"\b(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{4}})\b")),
        ));
    }
    res.push((true, build(r"\b(\d{4})(\d{2})(\d{2})\b")));
    res
});

static ERA_SUFFIX_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| build(&format!(r"(?i)\b(?P<year>\d{{1,4}})\s*(?P<era>{})\b", ERA)));

static ERA_PREFIX_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| build(r"(?i)\b(?P<era>AD|CE)\s+(?P<year>\d{1,4})\b"));

static BARE_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| build(r"\b(?P<year>\d{4})\b"));

/// `7–2 BC`: both years take the trailing era
pub(crate) static ERA_YEAR_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build(&format!(
        r"(?i)\b(?P<from>\d{{1,4}})\s*(?:-|–|—|to)\s*(?P<to>\d{{1,4}})\s*(?P<era>{})\b",
        ERA
    ))
});

/// Every single-date candidate in `text`, ordered by position
///
/// Candidates from different recognisers may overlap; voting sorts them out.
pub fn find_dates(text: &str) -> Vec<DateMatch> {
    let mut found = Vec::new();

    named_dates(text, &DAY_MONTH_YEAR_RE, FULL_NAMED_WEIGHT, &mut found);
    named_dates(text, &MONTH_DAY_YEAR_RE, FULL_NAMED_WEIGHT, &mut found);
    named_dates(text, &MONTH_YEAR_RE, MONTH_YEAR_WEIGHT, &mut found);
    numeric_dates(text, &mut found);
    era_years(text, &mut found);
    era_range_midpoints(text, &mut found);
    bare_years(text, &mut found);

    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    found.dedup_by(|a, b| a.start == b.start && a.end == b.end && a.date == b.date);
    found
}

fn named_dates(text: &str, re: &Regex, weight: f64, out: &mut Vec<DateMatch>) {
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(month) = caps.name("month").and_then(|m| month_number(m.as_str())) else {
            continue;
        };
        let day = caps
            .name("day")
            .and_then(|d| d.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        let Some(year) = signed_year(&caps) else { continue };

        if day > 0 && !on_calendar(day, month, year) {
            continue;
        }

        out.push(DateMatch {
            date: Date::new(day, month, year),
            start: whole.start(),
            end: whole.end(),
            weight,
        });
    }
}

/// Whether a day exists in the proleptic Gregorian calendar
fn on_calendar(day: u32, month: u32, year: i64) -> bool {
    i32::try_from(year)
        .ok()
        .and_then(|y| chrono::NaiveDate::from_ymd_opt(y, month, day))
        .is_some()
}

fn numeric_dates(text: &str, out: &mut Vec<DateMatch>) {
    for (year_first, re) in NUMERIC_RES.iter() {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let parts: Vec<i64> = (1..=3)
                .filter_map(|i| caps.get(i).and_then(|m| m.as_str().parse().ok()))
                .collect();
            if parts.len() != 3 {
                continue;
            }

            let mut push = |day: i64, month: i64, year: i64| {
                if (1..=31).contains(&day)
                    && (1..=12).contains(&month)
                    && on_calendar(day as u32, month as u32, year)
                {
                    out.push(DateMatch {
                        date: Date::new(day as u32, month as u32, year),
                        start: whole.start(),
                        end: whole.end(),
                        weight: NUMERIC_WEIGHT,
                    });
                }
            };

            if *year_first {
                push(parts[2], parts[1], parts[0]);
            } else {
                // DMY and MDY are indistinguishable here; propose both.
                push(parts[0], parts[1], parts[2]);
                if parts[0] != parts[1] {
                    push(parts[1], parts[0], parts[2]);
                }
            }
        }
    }
}

fn era_years(text: &str, out: &mut Vec<DateMatch>) {
    for re in [&*ERA_SUFFIX_YEAR_RE, &*ERA_PREFIX_YEAR_RE] {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(year) = signed_year(&caps) else { continue };
            out.push(DateMatch {
                date: Date::new(0, 0, year),
                start: whole.start(),
                end: whole.end(),
                weight: ERA_YEAR_WEIGHT,
            });
        }
    }
}

/// A year range with a shared era votes for its midpoint as a point date
fn era_range_midpoints(text: &str, out: &mut Vec<DateMatch>) {
    for caps in ERA_YEAR_RANGE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some((from, to)) = era_year_pair(&caps) else { continue };
        out.push(DateMatch {
            date: Date::new(0, 0, (from + to) / 2),
            start: whole.start(),
            end: whole.end(),
            weight: ERA_YEAR_WEIGHT,
        });
    }
}

fn bare_years(text: &str, out: &mut Vec<DateMatch>) {
    for caps in BARE_YEAR_RE.captures_iter(text) {
        let Some(year) = caps.name("year") else { continue };
        let Ok(value) = year.as_str().parse::<i64>() else { continue };
        out.push(DateMatch {
            date: Date::new(0, 0, value),
            start: year.start(),
            end: year.end(),
            weight: BARE_YEAR_WEIGHT,
        });
    }
}

/// Signed `(from, to)` years of an era range match
pub(crate) fn era_year_pair(caps: &Captures<'_>) -> Option<(i64, i64)> {
    let from: i64 = caps.name("from")?.as_str().parse().ok()?;
    let to: i64 = caps.name("to")?.as_str().parse().ok()?;
    let sign = era_sign(caps.name("era").map(|m| m.as_str()));
    Some((from * sign, to * sign))
}

fn signed_year(caps: &Captures<'_>) -> Option<i64> {
    let year: i64 = caps.name("year")?.as_str().parse().ok()?;
    Some(year * era_sign(caps.name("era").map(|m| m.as_str())))
}

fn era_sign(era: Option<&str>) -> i64 {
    match era.map(|e| e.to_ascii_uppercase()) {
        Some(e) if e.starts_with("BC") => -1,
        _ => 1,
    }
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == lower)
        .map(|(_, n)| *n)
}
