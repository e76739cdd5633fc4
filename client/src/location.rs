//! Repository locations: a remote base URL or a local directory.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::ResolverError;

/// Azure's public device models repository.
pub const DEFAULT_REPOSITORY: &str = "https://devicemodels.azure.com";

/// Where a repository lives. Chosen at client construction and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    /// Repository served over HTTP(S) under a base URL.
    Remote(Url),
    /// Repository rooted at a local directory.
    Local(PathBuf),
}

impl RepositoryLocation {
    /// Remote repository under `base`.
    pub fn remote(base: Url) -> Self {
        Self::Remote(base)
    }

    /// Local repository rooted at `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local(root.into())
    }

    /// Location of the public Azure device models repository.
    pub fn public_models() -> Self {
        #[allow(clippy::expect_used)] // constant endpoint, exercised by tests
        let base = Url::parse(DEFAULT_REPOSITORY).expect("default repository URL parses");
        Self::Remote(base)
    }

    /// True for repositories reached over the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(base) => f.write_str(base.as_str()),
            Self::Local(root) => write!(f, "{}", root.display()),
        }
    }
}

/// Splits a leading URI scheme off `input`, when one is present.
fn split_scheme(input: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = input.split_once(':')?;
    let mut chars = scheme.chars();
    let leading = chars.next()?;
    if leading.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        Some((scheme, rest))
    } else {
        None
    }
}

/// True when the first path component reads like a hostname: it ends in a
/// dot followed by an alphabetic top-level domain of 2 to 63 characters.
fn looks_like_hostname(input: &str) -> bool {
    let head = match input.find('/') {
        Some(idx) => &input[..idx],
        None => input,
    };
    match head.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty()
                && (2..=63).contains(&tld.len())
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> ResolverError {
    ResolverError::InvalidLocation {
        input: input.to_owned(),
        reason: reason.into(),
    }
}

impl FromStr for RepositoryLocation {
    type Err = ResolverError;

    /// Infers the location kind from a plain string.
    ///
    /// `http://` and `https://` URLs are remote; `file://` URIs, absolute
    /// paths, `./`- or `../`-prefixed relative paths and drive-letter paths
    /// (`C:/models`) are local; a scheme-less string whose first component
    /// reads like a hostname (`devicemodels.azure.com`) is remote with
    /// `https://` assumed. Anything else is rejected rather than guessed.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid(input, "location is empty"));
        }
        if let Some((scheme, _)) = split_scheme(trimmed) {
            return match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => {
                    let base = Url::parse(trimmed).map_err(|err| invalid(input, err.to_string()))?;
                    Ok(Self::Remote(base))
                }
                "file" => {
                    let uri = Url::parse(trimmed).map_err(|err| invalid(input, err.to_string()))?;
                    let root = uri
                        .to_file_path()
                        .map_err(|()| invalid(input, "file URI does not name a directory"))?;
                    Ok(Self::Local(root))
                }
                _ if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(trimmed))),
                other => Err(invalid(input, format!("unsupported scheme `{other}`"))),
            };
        }
        if trimmed.starts_with('/')
            || trimmed.starts_with("./")
            || trimmed.starts_with("../")
            || trimmed == "."
            || trimmed == ".."
        {
            return Ok(Self::Local(PathBuf::from(trimmed)));
        }
        if looks_like_hostname(trimmed) {
            let assumed = format!("https://{trimmed}");
            let base = Url::parse(&assumed).map_err(|err| invalid(input, err.to_string()))?;
            return Ok(Self::Remote(base));
        }
        Err(invalid(
            input,
            "cannot tell a URL from a directory; use a full URL, a `file://` URI or a `./` path",
        ))
    }
}
