use crate::date::recognizers::{era_year_pair, ERA_YEAR_RANGE_RE};
use crate::date::{Date, DateMatch, RangeMatch};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Separators that join two dates into a range, with their grouper weight
static SEPARATORS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"^\s*[-–—]\s*$").expect("valid dash regex"), 1.0),
        (
            Regex::new(r"(?i)^\s*(?:to|until|till|through)\s*$").expect("valid word regex"),
            0.9,
        ),
    ]
});

/// A dash with nothing after it but an optional `present` before the clause ends
static TRAILING_HYPHEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[-–—]\s*(?:present\s*)?(?:[)\];,]|$)").expect("valid trailing regex")
});

const TRAILING_WEIGHT: f64 = 0.7;
const ERA_RANGE_WEIGHT: f64 = 0.6;

/// Groups single-date candidates into ranges
///
/// A range spans two candidates separated only by a dash or a word like `to`,
/// or one candidate followed by a trailing dash (an open range). Its weight is
/// `min(left, right) * grouper`. Overlapping ranges are resolved in favour of
/// the heavier one, so a bare year inside a full date cannot start a second
/// range over the same text.
pub fn find_ranges(text: &str, candidates: &[DateMatch]) -> Vec<RangeMatch> {
    let mut ranges = Vec::new();

    for left in candidates {
        let rest = &text[left.end..];

        for right in candidates.iter().filter(|r| r.start >= left.end) {
            let gap = &text[left.end..right.start];
            if let Some((_, grouper)) = SEPARATORS.iter().find(|(re, _)| re.is_match(gap)) {
                ranges.push(RangeMatch {
                    from: left.clone(),
                    to: Some(right.clone()),
                    start: left.start,
                    end: right.end,
                    weight: left.weight.min(right.weight) * grouper,
                });
            }
        }

        if let Some(trailing) = TRAILING_HYPHEN_RE.find(rest) {
            let dash_end = rest[..trailing.end()]
                .rfind(['-', '–', '—'])
                .map(|i| i + rest[i..].chars().next().map_or(1, char::len_utf8))
                .unwrap_or(0);
            ranges.push(RangeMatch {
                from: left.clone(),
                to: None,
                start: left.start,
                end: left.end + dash_end,
                weight: left.weight * TRAILING_WEIGHT,
            });
        }
    }

    for caps in ERA_YEAR_RANGE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some((from, to)) = era_year_pair(&caps) else { continue };
        let endpoint = |year: i64| DateMatch {
            date: Date::new(0, 0, year),
            start: whole.start(),
            end: whole.end(),
            weight: ERA_RANGE_WEIGHT,
        };
        ranges.push(RangeMatch {
            from: endpoint(from),
            to: Some(endpoint(to)),
            start: whole.start(),
            end: whole.end(),
            weight: ERA_RANGE_WEIGHT,
        });
    }

    select_non_overlapping(ranges)
}

fn select_non_overlapping(mut ranges: Vec<RangeMatch>) -> Vec<RangeMatch> {
    ranges.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(Ordering::Equal)
            .then(a.start.cmp(&b.start))
            .then(b.end.cmp(&a.end))
    });

    let mut kept: Vec<RangeMatch> = Vec::new();
    for range in ranges {
        if kept
            .iter()
            .all(|k| range.end <= k.start || k.end <= range.start)
        {
            kept.push(range);
        }
    }

    kept.sort_by_key(|r| r.start);
    kept
}
