//! Input normalization for planner commands.
//!
//! Provides O(1) validation sets and synonym maps so users can type
//! natural values for priority tiers, goal types and times. Three-tier
//! resolution: exact match → synonym lookup → error with suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::model::{GoalType, Priority};

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_TIERS: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["80", "60", "20"].into_iter().collect());

pub static VALID_GOAL_TYPES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["annual", "quarterly"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static TIER_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("p80", "80"),
        ("80%", "80"),
        ("high", "80"),
        ("critical", "80"),
        ("deep", "80"),
        ("p60", "60"),
        ("60%", "60"),
        ("medium", "60"),
        ("normal", "60"),
        ("admin", "60"),
        ("p20", "20"),
        ("20%", "20"),
        ("low", "20"),
        ("minor", "20"),
        ("personal", "20"),
    ]
    .into_iter()
    .collect()
});

pub static GOAL_TYPE_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("year", "annual"),
        ("yearly", "annual"),
        ("annually", "annual"),
        ("y", "annual"),
        ("quarter", "quarterly"),
        ("q", "quarterly"),
        ("qtr", "quarterly"),
    ]
    .into_iter()
    .collect()
});

/// Normalize a priority tier via exact match or synonym lookup.
///
/// Returns the tier, or an error with the original input and an optional
/// suggestion.
pub fn normalize_priority(input: &str) -> std::result::Result<Priority, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    let canonical = if VALID_TIERS.contains(lower.as_str()) {
        Some(lower.as_str())
    } else {
        TIER_SYNONYMS.get(lower.as_str()).copied()
    };

    match canonical {
        Some("80") => Ok(Priority::P80),
        Some("60") => Ok(Priority::P60),
        Some("20") => Ok(Priority::P20),
        _ => {
            let suggestion = find_closest_match(&lower, &VALID_TIERS, &TIER_SYNONYMS);
            Err((input.to_string(), suggestion))
        }
    }
}

/// Parse a priority tier, mapping failures to `Error::InvalidArgument`.
pub fn parse_priority(input: &str) -> Result<Priority> {
    input.parse::<Priority>().map_err(Error::InvalidArgument)
}

/// Normalize a goal type via exact match or synonym lookup.
pub fn normalize_goal_type(input: &str) -> std::result::Result<GoalType, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    let canonical = if VALID_GOAL_TYPES.contains(lower.as_str()) {
        Some(lower.as_str())
    } else {
        GOAL_TYPE_SYNONYMS.get(lower.as_str()).copied()
    };

    match canonical {
        Some(t) => Ok(GoalType::from_str_or_default(t)),
        None => {
            let suggestion = find_closest_match(&lower, &VALID_GOAL_TYPES, &GOAL_TYPE_SYNONYMS);
            Err((input.to_string(), suggestion))
        }
    }
}

/// Parse a goal type, mapping failures to `Error::InvalidArgument`.
pub fn parse_goal_type(input: &str) -> Result<GoalType> {
    normalize_goal_type(input).map_err(|(input, suggestion)| {
        Error::InvalidArgument(match suggestion {
            Some(s) => format!("Invalid goal type '{input}'. Did you mean '{s}'?"),
            None => format!("Invalid goal type '{input}'"),
        })
    })
}

/// Parse a quarter: "2", "q2" or "Q2".
pub fn parse_quarter(input: &str) -> Result<u8> {
    let lower = input.trim().to_lowercase();
    let digits = lower.strip_prefix('q').unwrap_or(&lower);
    match digits.parse::<u8>() {
        Ok(q @ 1..=4) => Ok(q),
        _ => Err(Error::InvalidArgument(format!(
            "Invalid quarter '{input}': expected 1-4 or Q1-Q4"
        ))),
    }
}

/// Validate and zero-pad a 24-hour clock time.
///
/// Accepts "9:05" or "09:05" and returns "09:05". Padding matters: block
/// activity relies on lexicographic comparison of these strings.
pub fn normalize_clock_time(input: &str) -> Result<String> {
    let invalid = || Error::InvalidArgument(format!("Invalid time '{input}': expected HH:MM"));

    let (h, m) = input.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = h.parse().map_err(|_| invalid())?;
    let minutes: u32 = m.parse().map_err(|_| invalid())?;

    if m.len() != 2 || hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(format!("{hours:02}:{minutes:02}"))
}

/// Minutes since midnight for an "HH:MM" string, `None` if malformed.
#[must_use]
pub fn clock_minutes(time: &str) -> Option<i64> {
    let (h, m) = time.split_once(':')?;
    let hours: i64 = h.parse().ok()?;
    let minutes: i64 = m.parse().ok()?;
    Some(hours * 60 + minutes)
}

/// Validate an ISO calendar date ("YYYY-MM-DD").
pub fn parse_date(input: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidArgument(format!("Invalid date '{input}': expected YYYY-MM-DD")))
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 2 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_priority() {
        assert_eq!(normalize_priority("80"), Ok(Priority::P80));
        assert_eq!(normalize_priority("P60"), Ok(Priority::P60));
        assert_eq!(normalize_priority("low"), Ok(Priority::P20));
        assert_eq!(normalize_priority(" high "), Ok(Priority::P80));
        assert!(normalize_priority("nonsense").is_err());
    }

    #[test]
    fn test_priority_suggestion() {
        let (_, suggestion) = normalize_priority("hihg").unwrap_err();
        assert_eq!(suggestion.as_deref(), Some("80"));
    }

    #[test]
    fn test_normalize_goal_type() {
        assert_eq!(normalize_goal_type("annual"), Ok(GoalType::Annual));
        assert_eq!(normalize_goal_type("Q"), Ok(GoalType::Quarterly));
        assert_eq!(normalize_goal_type("yearly"), Ok(GoalType::Annual));
        assert!(parse_goal_type("weekly").is_err());
    }

    #[test]
    fn test_parse_quarter() {
        assert_eq!(parse_quarter("2").unwrap(), 2);
        assert_eq!(parse_quarter("Q4").unwrap(), 4);
        assert!(parse_quarter("5").is_err());
        assert!(parse_quarter("0").is_err());
    }

    #[test]
    fn test_normalize_clock_time_pads() {
        assert_eq!(normalize_clock_time("9:05").unwrap(), "09:05");
        assert_eq!(normalize_clock_time("17:00").unwrap(), "17:00");
        assert!(normalize_clock_time("24:00").is_err());
        assert!(normalize_clock_time("9:5").is_err());
        assert!(normalize_clock_time("noon").is_err());
    }

    #[test]
    fn test_clock_minutes() {
        assert_eq!(clock_minutes("09:30"), Some(570));
        assert_eq!(clock_minutes("00:00"), Some(0));
        assert_eq!(clock_minutes("bad"), None);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
