//! Version parsing, comparison, and range matching.
//!
//! Versions are split into parts on `.`, `-`, `_`, `+` and on every
//! digit/letter boundary, so `1.0a1` parses as `[1, 0, "a", 1]`. Parts
//! compare as follows:
//! - numeric parts compare as numbers and rank above any text part
//! - well-known qualifiers have a defined ladder:
//!   `dev < alpha < beta < milestone < rc < snapshot < release < sp`
//!   where the release rank also covers `ga` and `final`
//! - unknown text parts compare lexicographically and rank below `dev`
//! - a missing part counts as the release rank, so `1.0` equals `1.0.0`
//!   and sorts above `1.0-rc`

use std::cmp::Ordering;
use std::fmt;

/// A parsed version with comparable parts.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Part {
    Numeric(u64),
    Known(Rank),
    Other(String),
}

/// Ladder of well-known qualifiers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum Rank {
    Dev,
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            parts: split_parts(version),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Whether this version's leading parts equal `prefix`'s parts.
    ///
    /// Used by prefix selectors: `1.2.+` accepts any version starting with
    /// the parts `[1, 2]`.
    pub fn starts_with(&self, prefix: &Version) -> bool {
        if prefix.parts.len() > self.parts.len() {
            return false;
        }
        self.parts[..prefix.parts.len()] == prefix.parts[..]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let ord = match (self.parts.get(i), other.parts.get(i)) {
                (Some(a), Some(b)) => cmp_parts(a, b),
                (Some(a), None) => cmp_parts(a, &Part::Known(Rank::Release)),
                (None, Some(b)) => cmp_parts(&Part::Known(Rank::Release), b),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn cmp_parts(a: &Part, b: &Part) -> Ordering {
    use Part::*;
    match (a, b) {
        (Numeric(a), Numeric(b)) => a.cmp(b),
        (Numeric(n), Known(r)) => cmp_numeric_rank(*n, *r),
        (Known(r), Numeric(n)) => cmp_numeric_rank(*n, *r).reverse(),
        (Numeric(_), Other(_)) => Ordering::Greater,
        (Other(_), Numeric(_)) => Ordering::Less,
        (Known(a), Known(b)) => a.cmp(b),
        (Known(_), Other(_)) => Ordering::Greater,
        (Other(_), Known(_)) => Ordering::Less,
        (Other(a), Other(b)) => a.cmp(b),
    }
}

// A zero padding part ranks equal to release so `1.0` == `1.0.0`; any other
// number beats every qualifier.
fn cmp_numeric_rank(n: u64, r: Rank) -> Ordering {
    if n == 0 {
        Rank::Release.cmp(&r)
    } else {
        Ordering::Greater
    }
}

fn split_parts(version: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut token = String::new();
    let mut prev_digit: Option<bool> = None;

    for ch in version.chars() {
        if matches!(ch, '.' | '-' | '_' | '+') {
            flush(&mut token, &mut parts);
            prev_digit = None;
            continue;
        }
        let digit = ch.is_ascii_digit();
        if prev_digit.is_some_and(|p| p != digit) {
            flush(&mut token, &mut parts);
        }
        token.push(ch);
        prev_digit = Some(digit);
    }
    flush(&mut token, &mut parts);
    parts
}

fn flush(token: &mut String, parts: &mut Vec<Part>) {
    if token.is_empty() {
        return;
    }
    parts.push(classify(token));
    token.clear();
}

fn classify(token: &str) -> Part {
    if let Ok(n) = token.parse::<u64>() {
        return Part::Numeric(n);
    }
    let rank = match token.to_ascii_lowercase().as_str() {
        "dev" => Rank::Dev,
        "alpha" | "a" => Rank::Alpha,
        "beta" | "b" => Rank::Beta,
        "milestone" | "m" => Rank::Milestone,
        "rc" | "cr" => Rank::Rc,
        "snapshot" => Rank::Snapshot,
        "ga" | "final" | "release" => Rank::Release,
        "sp" => Rank::Sp,
        _ => return Part::Other(token.to_ascii_lowercase()),
    };
    Part::Known(rank)
}

/// A bracketed version range: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, `[1.0]`.
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a range expression. Returns `None` for anything that is not
    /// bracket notation.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        let open = s.strip_prefix('[').map(|r| (r, true));
        let open = open.or_else(|| s.strip_prefix('(').map(|r| (r, false)));
        let (rest, lower_inclusive) = open?;
        let inner = rest
            .strip_suffix(']')
            .map(|i| (i, true))
            .or_else(|| rest.strip_suffix(')').map(|i| (i, false)));
        let (inner, upper_inclusive) = inner?;

        match inner.split_once(',') {
            Some((lo, hi)) => Some(Self {
                lower: bound(lo, lower_inclusive),
                upper: bound(hi, upper_inclusive),
            }),
            // Exact pin: [1.0]
            None => {
                let v = Version::parse(inner.trim());
                Some(Self {
                    lower: Some(Bound {
                        version: v.clone(),
                        inclusive: true,
                    }),
                    upper: Some(Bound {
                        version: v,
                        inclusive: true,
                    }),
                })
            }
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            let ord = version.cmp(&lower.version);
            if ord == Ordering::Less || (!lower.inclusive && ord == Ordering::Equal) {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            let ord = version.cmp(&upper.version);
            if ord == Ordering::Greater || (!upper.inclusive && ord == Ordering::Equal) {
                return false;
            }
        }
        true
    }
}

fn bound(text: &str, inclusive: bool) -> Option<Bound> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Bound {
        version: Version::parse(text),
        inclusive,
    })
}
