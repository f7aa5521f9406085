//! Helm-style semver constraints.
//!
//! Supports the constraint grammar chart subscriptions use in practice:
//!
//! - comparators `=`, `!=`, `>`, `>=`, `<`, `<=`
//! - caret (`^1.2.3`) and tilde (`~1.2.3`) ranges
//! - wildcards (`1.2.x`, `1.*`, `*`) and partial versions (`1.2`)
//! - AND via commas or whitespace, OR via `||`
//!
//! Prerelease versions only satisfy a constraint group when one of its
//! comparators names a prerelease of the same `MAJOR.MINOR.PATCH`.

use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Parsed chart version: MAJOR.MINOR.PATCH with optional prerelease and
/// build metadata. A leading `v` is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl ChartVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let partial = PartialVersion::parse(input).ok()?;
        match (partial.major, partial.minor, partial.patch) {
            (Some(major), Some(minor), Some(patch)) => Some(Self {
                major,
                minor,
                patch,
                pre: partial.pre,
            }),
            _ => None,
        }
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl Ord for ChartVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple()
            .cmp(&other.triple())
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => cmp_prerelease(a, b),
            })
    }
}

impl PartialOrd for ChartVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ChartVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// Dot-separated identifiers; numeric ones compare numerically and sort
/// before alphanumeric ones.
fn cmp_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Version with optional (wildcard) components, as written in constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartialVersion {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Option<String>,
}

impl PartialVersion {
    fn parse(input: &str) -> Result<Self, ConstraintError> {
        let raw = input.trim();
        let raw = raw.strip_prefix('v').unwrap_or(raw);
        if raw.is_empty() {
            return Err(ConstraintError::new(input, "missing version"));
        }
        let raw = raw.split_once('+').map_or(raw, |(v, _build)| v);
        let (numbers, pre) = match raw.split_once('-') {
            Some((_, p)) if p.is_empty() => {
                return Err(ConstraintError::new(input, "empty prerelease"));
            }
            Some((v, p)) => (v, Some(p.to_string())),
            None => (raw, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() > 3 {
            return Err(ConstraintError::new(input, "too many version components"));
        }
        let mut components = [None; 3];
        let mut wildcard_seen = false;
        for (slot, part) in components.iter_mut().zip(parts.iter()) {
            if matches!(*part, "x" | "X" | "*") {
                wildcard_seen = true;
                continue;
            }
            if wildcard_seen {
                return Err(ConstraintError::new(
                    input,
                    "numeric component after wildcard",
                ));
            }
            let value = part
                .parse::<u64>()
                .map_err(|_| ConstraintError::new(input, "version component is not a number"))?;
            *slot = Some(value);
        }
        if pre.is_some() && components.iter().any(Option::is_none) {
            return Err(ConstraintError::new(
                input,
                "prerelease requires a full MAJOR.MINOR.PATCH version",
            ));
        }

        Ok(Self {
            major: components[0],
            minor: components[1],
            patch: components[2],
            pre,
        })
    }

    fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    /// Lowest version the partial stands for (`1.2` -> `1.2.0`).
    fn floor(&self) -> ChartVersion {
        ChartVersion {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
        }
    }

    /// First version past the wildcard range (`1.2` -> `1.3.0`, `1` -> `2.0.0`).
    /// `None` when every component is a wildcard.
    fn wildcard_ceiling(&self, input: &str) -> Result<Option<ChartVersion>, ConstraintError> {
        let ceiling = match (self.major, self.minor, self.patch) {
            (None, _, _) => return Ok(None),
            (Some(major), None, _) => ChartVersion::new(next(input, major)?, 0, 0),
            (Some(major), Some(minor), None) => ChartVersion::new(major, next(input, minor)?, 0),
            (Some(major), Some(minor), Some(patch)) => {
                ChartVersion::new(major, minor, next(input, patch)?)
            }
        };
        Ok(Some(ceiling))
    }
}

/// `component + 1`, rejecting components already at the top of the range.
fn next(input: &str, component: u64) -> Result<u64, ConstraintError> {
    component
        .checked_add(1)
        .ok_or_else(|| ConstraintError::new(input, "version component out of range"))
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Constraint parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {input:?}: {reason}")]
pub struct ConstraintError {
    pub input: String,
    pub reason: String,
}

impl ConstraintError {
    fn new(input: &str, reason: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: ChartVersion,
}

impl Comparator {
    fn new(op: Op, version: ChartVersion) -> Self {
        Self { op, version }
    }

    fn matches(&self, v: &ChartVersion) -> bool {
        let ord = v.cmp(&self.version);
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
        }
    }
}

/// Parsed version constraint: an OR of AND-groups of comparators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionConstraint {
    /// Empty means any (non-prerelease) version.
    any_of: Vec<Vec<Comparator>>,
}

const OPERATORS: [&str; 8] = [">=", "<=", "!=", "=", ">", "<", "^", "~"];

impl VersionConstraint {
    /// Constraint matching every released version.
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse a constraint. An empty or blank string is [`VersionConstraint::any`].
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        if input.trim().is_empty() {
            return Ok(Self::any());
        }
        let mut any_of = Vec::new();
        for group in input.split("||") {
            any_of.push(parse_group(input, group)?);
        }
        Ok(Self { any_of })
    }

    pub fn matches(&self, version: &ChartVersion) -> bool {
        if self.any_of.is_empty() {
            return version.pre.is_none();
        }
        self.any_of.iter().any(|group| {
            let pre_allowed = version.pre.is_none()
                || group.iter().any(|c| {
                    c.version.pre.is_some() && c.version.triple() == version.triple()
                });
            pre_allowed && group.iter().all(|c| c.matches(version))
        })
    }
}

impl std::str::FromStr for VersionConstraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_group(input: &str, group: &str) -> Result<Vec<Comparator>, ConstraintError> {
    let mut comparators = Vec::new();
    let mut terms = 0usize;
    let mut pending_op: Option<&str> = None;

    for token in group
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if OPERATORS.contains(&token) {
            if pending_op.is_some() {
                return Err(ConstraintError::new(input, "two operators in a row"));
            }
            pending_op = Some(token);
            continue;
        }
        let term = match pending_op.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };
        comparators.extend(parse_term(input, &term)?);
        terms += 1;
    }

    if pending_op.is_some() {
        return Err(ConstraintError::new(input, "operator without a version"));
    }
    if terms == 0 {
        return Err(ConstraintError::new(input, "empty constraint group"));
    }
    Ok(comparators)
}

fn split_operator(term: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = term.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", term)
}

fn parse_term(input: &str, term: &str) -> Result<Vec<Comparator>, ConstraintError> {
    let (op, rest) = split_operator(term);
    let partial = PartialVersion::parse(rest).map_err(|e| ConstraintError::new(input, &e.reason))?;
    let floor = partial.floor();

    let comparators = match op {
        "" | "=" if partial.is_full() => vec![Comparator::new(Op::Eq, floor)],
        "" | "=" => match partial.wildcard_ceiling(input)? {
            Some(ceiling) => vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, ceiling),
            ],
            None => Vec::new(),
        },
        "!=" => {
            if !partial.is_full() {
                return Err(ConstraintError::new(input, "!= requires a full version"));
            }
            vec![Comparator::new(Op::Ne, floor)]
        }
        ">" => {
            if partial.is_full() {
                vec![Comparator::new(Op::Gt, floor)]
            } else {
                let ceiling = partial
                    .wildcard_ceiling(input)?
                    .ok_or_else(|| ConstraintError::new(input, "> requires a version"))?;
                vec![Comparator::new(Op::Ge, ceiling)]
            }
        }
        ">=" => vec![Comparator::new(Op::Ge, floor)],
        "<" => vec![Comparator::new(Op::Lt, floor)],
        "<=" => {
            if partial.is_full() {
                vec![Comparator::new(Op::Le, floor)]
            } else {
                match partial.wildcard_ceiling(input)? {
                    Some(ceiling) => vec![Comparator::new(Op::Lt, ceiling)],
                    None => Vec::new(),
                }
            }
        }
        "~" => {
            let ceiling = match (partial.major, partial.minor) {
                (Some(major), Some(minor)) => ChartVersion::new(major, next(input, minor)?, 0),
                (Some(major), None) => ChartVersion::new(next(input, major)?, 0, 0),
                (None, _) => return Err(ConstraintError::new(input, "~ requires a version")),
            };
            vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, ceiling),
            ]
        }
        "^" => {
            let ceiling = match (partial.major, partial.minor, partial.patch) {
                (None, _, _) => return Err(ConstraintError::new(input, "^ requires a version")),
                (Some(major), _, _) if major > 0 => ChartVersion::new(next(input, major)?, 0, 0),
                (Some(0), None, _) => ChartVersion::new(1, 0, 0),
                (Some(0), Some(minor), _) if minor > 0 => {
                    ChartVersion::new(0, next(input, minor)?, 0)
                }
                (Some(0), Some(0), None) => ChartVersion::new(0, 1, 0),
                (Some(0), Some(0), Some(patch)) => ChartVersion::new(0, 0, next(input, patch)?),
                _ => return Err(ConstraintError::new(input, "unsupported caret range")),
            };
            vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, ceiling),
            ]
        }
        other => {
            return Err(ConstraintError::new(
                input,
                &format!("unsupported operator {other:?}"),
            ))
        }
    };
    Ok(comparators)
}

/// Pick the highest version in `versions` satisfying `constraint`.
///
/// Entries that do not parse as versions are ignored; registries routinely
/// carry non-semver tags. Returns the entry as written (e.g. keeping a
/// leading `v`).
pub fn latest_satisfying<'a, I>(versions: I, constraint: &VersionConstraint) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(|raw| ChartVersion::parse(raw).map(|v| (v, raw)))
        .filter(|(v, _)| constraint.matches(v))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ChartVersion {
        ChartVersion::parse(s).expect("valid version")
    }

    fn allows(constraint: &str, version: &str) -> bool {
        VersionConstraint::parse(constraint)
            .expect("valid constraint")
            .matches(&v(version))
    }

    #[test]
    fn versions_order_with_prereleases() {
        assert!(v("1.2.3") < v("1.2.4"));
        assert!(v("1.2.3-rc.1") < v("1.2.3"));
        assert!(v("1.2.3-rc.2") < v("1.2.3-rc.10"));
        assert!(v("1.2.3-alpha") < v("1.2.3-beta"));
        assert_eq!(v("v1.2.3"), v("1.2.3"));
        assert_eq!(v("1.2.3+build.7"), v("1.2.3"));
    }

    #[test]
    fn partial_versions_are_not_chart_versions() {
        assert!(ChartVersion::parse("1.2").is_none());
        assert!(ChartVersion::parse("latest").is_none());
        assert!(ChartVersion::parse("").is_none());
    }

    #[test]
    fn caret_ranges() {
        assert!(allows("^1.0.0", "1.2.3"));
        assert!(!allows("^1.0.0", "2.0.0"));
        assert!(!allows("^1.0.0", "0.9.9"));
        assert!(allows("^0.2.3", "0.2.9"));
        assert!(!allows("^0.2.3", "0.3.0"));
        assert!(allows("^0.0.3", "0.0.3"));
        assert!(!allows("^0.0.3", "0.0.4"));
        assert!(allows("^1.2", "1.9.0"));
    }

    #[test]
    fn tilde_ranges() {
        assert!(allows("~1.2.3", "1.2.9"));
        assert!(!allows("~1.2.3", "1.3.0"));
        assert!(allows("~1", "1.9.9"));
        assert!(!allows("~1", "2.0.0"));
    }

    #[test]
    fn wildcards_and_partials() {
        assert!(allows("1.2.x", "1.2.7"));
        assert!(!allows("1.2.x", "1.3.0"));
        assert!(allows("1.*", "1.9.0"));
        assert!(allows("*", "42.0.0"));
        assert!(allows("1.2", "1.2.5"));
        assert!(allows("1.2.3", "1.2.3"));
        assert!(!allows("1.2.3", "1.2.4"));
    }

    #[test]
    fn comparators_and_ranges() {
        assert!(allows(">= 1.2, < 2", "1.5.0"));
        assert!(!allows(">= 1.2, < 2", "2.0.0"));
        assert!(allows(">1.2", "1.3.0"));
        assert!(!allows(">1.2", "1.2.9"));
        assert!(allows("<=1.2", "1.2.9"));
        assert!(!allows("<=1.2", "1.3.0"));
        assert!(allows("!=1.2.3", "1.2.4"));
        assert!(!allows("!=1.2.3", "1.2.3"));
        assert!(allows(">=1.0.0 <1.1.0 || >=2.0.0", "2.5.0"));
        assert!(!allows(">=1.0.0 <1.1.0 || >=2.0.0", "1.5.0"));
    }

    #[test]
    fn prereleases_need_explicit_opt_in() {
        assert!(!allows("^1.0.0", "1.5.0-rc.1"));
        assert!(!allows("", "1.5.0-rc.1"));
        assert!(allows(">=1.5.0-rc.0", "1.5.0-rc.1"));
        assert!(!allows(">=1.5.0-rc.0", "1.6.0-rc.1"));
    }

    #[test]
    fn malformed_constraints_are_rejected() {
        for bad in ["not-a-version", ">=", "^", "1.2.3.4", "1.x.3", ">= >= 1", "1.0 - 2.0", "||"] {
            assert!(
                VersionConstraint::parse(bad).is_err(),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn ceilings_past_the_largest_component_are_rejected() {
        let max = u64::MAX;
        for bad in [
            format!("^{max}.0.0"),
            format!("~1.{max}"),
            format!("{max}.x"),
            format!("<=1.{max}"),
            format!("^0.0.{max}"),
            format!(">{max}"),
        ] {
            let err = VersionConstraint::parse(&bad).unwrap_err();
            assert!(
                err.reason.contains("out of range"),
                "unexpected error for {bad:?}: {err}"
            );
        }
        // Full versions at the top of the range still parse.
        assert!(allows(&format!(">={max}.0.0"), &format!("{max}.0.0")));
    }

    #[test]
    fn latest_satisfying_picks_highest_match_and_keeps_spelling() {
        let versions = ["1.0.0", "v1.2.3", "1.10.0", "2.0.0", "nightly", "1.11.0-rc.1"];
        let constraint = VersionConstraint::parse("^1.0.0").expect("constraint");
        assert_eq!(
            latest_satisfying(versions, &constraint),
            Some("1.10.0".to_string())
        );

        let tight = VersionConstraint::parse("~1.2.0").expect("constraint");
        assert_eq!(latest_satisfying(versions, &tight), Some("v1.2.3".to_string()));

        let none = VersionConstraint::parse(">=3.0.0").expect("constraint");
        assert_eq!(latest_satisfying(versions, &none), None);

        assert_eq!(
            latest_satisfying(versions, &VersionConstraint::any()),
            Some("2.0.0".to_string())
        );
    }
}
