//! Version grammar: parsing, canonical display and ordering.
//!
//! Accepted shape (case-insensitive, `.`/`-`/`_` allowed before optional parts):
//!
//! ```text
//! [N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]
//! ```
//!
//! Ordering follows the package-index rules: dev-only releases sort before
//! pre-releases, pre-releases before the final release, post releases after it,
//! and a local segment sorts after the same public version without one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)^
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>a|b|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?P<post>[-_.]?post[-_.]?(?P<post_n>[0-9]+)?)?
        (?P<dev>[-_.]?dev[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        $",
    )
    .expect("version regex should compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid version")]
pub struct VersionParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn as_str(self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::Rc => "rc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreRelease {
    pub kind: PreKind,
    pub number: u64,
}

/// One dot-separated part of a local version label.
///
/// Variant order matters: alphanumeric parts sort before numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LocalSegment {
    Alpha(String),
    Numeric(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Alpha(s) => f.write_str(s),
            LocalSegment::Numeric(n) => write!(f, "{n}"),
        }
    }
}

/// A parsed version. Equality and ordering are semantic (`1.0 == 1.0.0`).
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

impl Version {
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<PreRelease> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> &[LocalSegment] {
        &self.local
    }

    pub fn is_local(&self) -> bool {
        !self.local.is_empty()
    }

    /// Epoch, release and pre-release only: the part a post marker extends.
    pub fn base(&self) -> Version {
        Version {
            epoch: self.epoch,
            release: self.release.clone(),
            pre: self.pre,
            post: None,
            dev: None,
            local: Vec::new(),
        }
    }

    /// The version without its local label.
    pub fn public(&self) -> Version {
        Version {
            local: Vec::new(),
            ..self.clone()
        }
    }

    fn pre_key(&self) -> PreKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some(pre), _, _) => PreKey::Pre(pre),
            (None, _, _) => PreKey::Final,
        }
    }

    fn dev_key(&self) -> DevKey {
        match self.dev {
            Some(n) => DevKey::Dev(n),
            None => DevKey::Release,
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreRelease),
    Final,
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Release,
}

fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| cmp_release(&self.release, &other.release))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

fn parse_number(
    raw: Option<regex::Match<'_>>,
    input: &str,
) -> Result<Option<u64>, VersionParseError> {
    raw.map(|m| {
        m.as_str()
            .parse::<u64>()
            .map_err(|_| VersionParseError(input.to_string()))
    })
    .transpose()
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let caps = VERSION_RE
            .captures(input)
            .ok_or_else(|| VersionParseError(input.to_string()))?;

        let epoch = parse_number(caps.name("epoch"), input)?.unwrap_or(0);
        let release = caps["release"]
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionParseError(input.to_string()))?;

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let kind = match label.as_str().to_ascii_lowercase().as_str() {
                    "a" => PreKind::Alpha,
                    "b" => PreKind::Beta,
                    _ => PreKind::Rc,
                };
                let number = parse_number(caps.name("pre_n"), input)?.unwrap_or(0);
                Some(PreRelease { kind, number })
            }
            None => None,
        };

        let post = match caps.name("post") {
            Some(_) => Some(parse_number(caps.name("post_n"), input)?.unwrap_or(0)),
            None => None,
        };
        let dev = match caps.name("dev") {
            Some(_) => Some(parse_number(caps.name("dev_n"), input)?.unwrap_or(0)),
            None => None,
        };

        let local = caps
            .name("local")
            .map(|m| {
                m.as_str()
                    .split(['.', '-', '_'])
                    .map(|part| match part.parse::<u64>() {
                        Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => {
                            LocalSegment::Numeric(n)
                        }
                        _ => LocalSegment::Alpha(part.to_ascii_lowercase()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if let Some(pre) = self.pre {
            write!(f, "{}{}", pre.kind.as_str(), pre.number)?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().expect("valid version")
    }

    #[test]
    fn parses_and_normalizes_common_forms() {
        assert_eq!(v("1.0").to_string(), "1.0");
        assert_eq!(v("1.0-RC1").to_string(), "1.0rc1");
        assert_eq!(v("2!1.0.post").to_string(), "2!1.0.post0");
        assert_eq!(v("0.0.post0.dev1").to_string(), "0.0.post0.dev1");
        assert_eq!(v("1.0.dev").to_string(), "1.0.dev0");
        assert_eq!(v("1.0+G1A2B3C.Dirty").to_string(), "1.0+g1a2b3c.dirty");
    }

    #[test]
    fn exposes_segments() {
        let parsed = v("3.2b4.post5.dev6+abc.7");
        assert_eq!(parsed.release(), &[3, 2]);
        assert_eq!(
            parsed.pre(),
            Some(PreRelease {
                kind: PreKind::Beta,
                number: 4
            })
        );
        assert_eq!(parsed.post(), Some(5));
        assert_eq!(parsed.dev(), Some(6));
        assert_eq!(
            parsed.local(),
            &[
                LocalSegment::Alpha("abc".to_string()),
                LocalSegment::Numeric(7)
            ]
        );
        assert_eq!(parsed.base().to_string(), "3.2b4");
        assert_eq!(parsed.public().to_string(), "3.2b4.post5.dev6");
    }

    #[test]
    fn rejects_non_versions() {
        for bad in ["", "v1.0", "foo", "1.0+", "1..0", "1.0 beta", "demoapp", "1.0+dirty+x"] {
            assert!(bad.parse::<Version>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn orders_development_chain() {
        let chain = [
            "1.0.dev0",
            "1.0a1",
            "1.0b2",
            "1.0rc1",
            "1.0",
            "1.0+dirty",
            "1.0.post0.dev1",
            "1.0.post0.dev1+g1234567",
            "1.0.post0.dev1+g1234567.dirty",
            "1.0.post0.dev2",
            "1.0.post0",
            "1.0.post1",
            "1.1.dev0",
            "1.1",
        ];
        for pair in chain.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn numeric_local_parts_sort_after_alpha() {
        assert!(v("1.0+abc") < v("1.0+1"));
        assert!(v("1.0+abc") < v("1.0+abc.0"));
    }
}
