//! Digital twin model identifier parsing and validation.
//!
//! An identifier names exactly one interface document:
//! `dtmi:<segment>(:<segment>)*;<version>`. Segments are ASCII, start with a
//! letter (or underscores followed by an alphanumeric, the system-model
//! form), and continue with letters, digits and underscores. The version is
//! a positive decimal with no leading zero and at most nine digits. Identity
//! is the exact string as written; only repository paths fold case.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

/// Scheme every identifier starts with; doubles as the root directory of the
/// repository path layout.
pub const SCHEME: &str = "dtmi";

const SEGMENT_PATTERN: &str = r"^(?:_+[A-Za-z0-9]|[A-Za-z])[A-Za-z0-9_]*$";

/// Versions carry at most nine decimal digits, so every valid version fits
/// in a `u32`.
const MAX_VERSION_DIGITS: usize = 9;

#[allow(clippy::expect_used)] // pattern is a constant, exercised by every test
fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| Regex::new(SEGMENT_PATTERN).expect("segment pattern compiles"))
}

/// Reason a candidate identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtmiParseError {
    /// The input was empty.
    #[error("identifier is empty")]
    Empty,
    /// The input contained a byte outside the ASCII range.
    #[error("identifier contains non-ASCII characters")]
    NonAscii,
    /// The input did not start with the lowercase `dtmi:` scheme.
    #[error("identifier must start with `dtmi:`")]
    MissingScheme,
    /// A path segment violated the segment grammar.
    #[error("invalid segment `{segment}`")]
    InvalidSegment { segment: String },
    /// No `;<version>` suffix was present.
    #[error("identifier is missing a `;<version>` suffix")]
    MissingVersion,
    /// The version suffix was not a positive decimal of at most nine digits
    /// without a leading zero.
    #[error("invalid version `{version}`")]
    InvalidVersion { version: String },
}

/// A validated digital twin model identifier.
///
/// Equality, ordering and hashing all follow the exact identifier string,
/// and [`Borrow<str>`] is implemented over it, so maps keyed by `Dtmi` can
/// be queried with plain string keys:
///
/// ```
/// use std::collections::BTreeMap;
/// use dmr_dtmi::Dtmi;
///
/// let id: Dtmi = "dtmi:com:example:Thermostat;1".parse()?;
/// let mut models = BTreeMap::new();
/// models.insert(id, "{...}");
/// assert!(models.contains_key("dtmi:com:example:Thermostat;1"));
/// # Ok::<(), dmr_dtmi::DtmiParseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dtmi {
    value: String,
    /// Byte offset of the `;` separating the path from the version.
    version_offset: usize,
    version: u32,
}

impl Dtmi {
    /// Validates `input` and returns the parsed identifier.
    pub fn parse(input: &str) -> Result<Self, DtmiParseError> {
        let (version_offset, version) = validate(input)?;
        Ok(Self {
            value: input.to_owned(),
            version_offset,
            version,
        })
    }

    /// True when `input` is a well-formed identifier. Purely syntactic.
    pub fn is_valid(input: &str) -> bool {
        validate(input).is_ok()
    }

    /// The identifier exactly as written.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Path segments between the scheme and the version, case preserved.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.value[SCHEME.len() + 1..self.version_offset].split(':')
    }

    /// The version suffix as a number.
    pub fn version(&self) -> u32 {
        self.version
    }
}

fn validate(input: &str) -> Result<(usize, u32), DtmiParseError> {
    if input.is_empty() {
        return Err(DtmiParseError::Empty);
    }
    if !input.is_ascii() {
        return Err(DtmiParseError::NonAscii);
    }
    let Some(body) = input.strip_prefix("dtmi:") else {
        return Err(DtmiParseError::MissingScheme);
    };
    let Some((path, version)) = body.rsplit_once(';') else {
        return Err(DtmiParseError::MissingVersion);
    };
    for segment in path.split(':') {
        if !segment_regex().is_match(segment) {
            return Err(DtmiParseError::InvalidSegment {
                segment: segment.to_owned(),
            });
        }
    }
    let well_formed = (1..=MAX_VERSION_DIGITS).contains(&version.len())
        && matches!(version.as_bytes().first(), Some(b'1'..=b'9'))
        && version.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(DtmiParseError::InvalidVersion {
            version: version.to_owned(),
        });
    }
    let parsed = version
        .parse::<u32>()
        .map_err(|_| DtmiParseError::InvalidVersion {
            version: version.to_owned(),
        })?;
    let version_offset = SCHEME.len() + 1 + path.len();
    Ok((version_offset, parsed))
}

impl fmt::Display for Dtmi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Dtmi {
    type Err = DtmiParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Dtmi {
    type Error = DtmiParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

// Identity is the canonical string alone; the remaining fields are derived
// from it. Keeping these impls manual preserves the `Borrow<str>` contract
// that hashing and ordering agree with `str`.
impl PartialEq for Dtmi {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Dtmi {}

impl PartialOrd for Dtmi {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dtmi {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Dtmi {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Borrow<str> for Dtmi {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for Dtmi {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl Serialize for Dtmi {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for Dtmi {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
