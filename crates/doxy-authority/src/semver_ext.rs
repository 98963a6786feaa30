//! Coercion of sloppy version strings into comparable `semver` types.
//!
//! The authority data and the project's own dependency declarations use the
//! ecosystem's loose conventions (`"18"`, `"^18.0.0"`, `">=16.13.0 <19.0.0"`)
//! rather than strict semver. This module is the single place that turns
//! those strings into something `semver::Version`/`semver::VersionReq` can
//! compare, so every other component treats versions as already-canonical.

use semver::{Comparator, Op, Version, VersionReq};

/// Coerces a possibly-sloppy version string (`"18"`, `"18.2"`, `"v18.2.0"`,
/// `"^18.0.0"`) into a concrete [`Version`], taking the lowest version the
/// string could mean.
///
/// Returns `None` if the string contains no recognizable numeric version at
/// all (e.g. a dist-tag like `"latest"`).
pub fn coerce_version(raw: &str) -> Option<Version> {
    let trimmed = strip_range_prefix(raw.trim());
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }
    // Pad "18" -> "18.0.0", "18.2" -> "18.2.0".
    let parts: Vec<&str> = trimmed.split('.').collect();
    let mut nums = Vec::with_capacity(3);
    for part in parts.iter().take(3) {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            break;
        }
        nums.push(digits);
    }
    if nums.is_empty() {
        return None;
    }
    while nums.len() < 3 {
        nums.push("0".to_string());
    }
    Version::parse(&nums.join(".")).ok()
}

fn strip_range_prefix(s: &str) -> &str {
    s.trim_start_matches(['^', '~', '=', '>', '<']).trim_start_matches('v').trim()
}

/// A half-open version interval `[min, max)` used for `availableIn` and for
/// signature `since`/`until` pairs. `max` absent means unbounded above.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Version,
    pub max_exclusive: Option<Version>,
}

impl VersionRange {
    pub fn contains(&self, v: &Version) -> bool {
        v >= &self.min && self.max_exclusive.as_ref().map_or(true, |max| v < max)
    }

    pub fn min_version(&self) -> &Version {
        &self.min
    }

    /// Parses ecosystem-style range strings: `">=18.0.0"`, `">=16.13.0,
    /// <19.0.0"`, a bare `"18.0.0"` (treated as an exact lower bound, open
    /// above), or a caret range `"^18.0.0"` (treated as `[18.0.0, 19.0.0)`
    /// for the purposes of availability windows — authority data expresses
    /// open-ended availability with `removedIn` instead, but declared
    /// project ranges (manifest `declaredRange`) commonly arrive as caret
    /// ranges and must still coerce to a concrete representative version).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut min = None;
        let mut max_exclusive = None;
        for clause in raw.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            if let Some(rest) = clause.strip_prefix(">=") {
                min = coerce_version(rest);
            } else if let Some(rest) = clause.strip_prefix('<') {
                max_exclusive = coerce_version(rest.trim_start_matches('='));
            } else if let Some(rest) = clause.strip_prefix('>') {
                // Exclusive lower bound: approximate with the same version,
                // comparisons below still order correctly for our purposes.
                min = coerce_version(rest);
            } else if let Some(rest) = clause.strip_prefix('^') {
                let v = coerce_version(rest)?;
                max_exclusive = Some(next_breaking(&v));
                min = Some(v);
            } else if let Some(rest) = clause.strip_prefix('~') {
                let v = coerce_version(rest)?;
                max_exclusive = Some(Version::new(v.major, v.minor + 1, 0));
                min = Some(v);
            } else {
                min = coerce_version(clause);
            }
        }
        min.map(|min| Self { min, max_exclusive })
    }
}

fn next_breaking(v: &Version) -> Version {
    if v.major > 0 {
        Version::new(v.major + 1, 0, 0)
    } else if v.minor > 0 {
        Version::new(0, v.minor + 1, 0)
    } else {
        Version::new(0, 0, v.patch + 1)
    }
}

/// Resolves a project's `declaredRange` (a manifest semver range, used when
/// no lockfile pins an exact version) to a single representative concrete
/// version: the lowest version satisfying the range, matching npm/cargo
/// convention of resolving to the minimal-compatible version absent a lock.
pub fn representative_version(req: &str) -> Option<Version> {
    if let Ok(parsed) = VersionReq::parse(req) {
        if let Some(comparator) = parsed.comparators.first() {
            return comparator_floor(comparator);
        }
    }
    coerce_version(req)
}

fn comparator_floor(c: &Comparator) -> Option<Version> {
    let patch = c.patch.unwrap_or(0);
    let minor = c.minor.unwrap_or(0);
    let mut v = Version::new(c.major, minor, patch);
    if matches!(c.op, Op::Greater) {
        v.patch += 1;
    }
    Some(v)
}
