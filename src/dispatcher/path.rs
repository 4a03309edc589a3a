//! Request-path normalisation and the application mount prefix.

use std::borrow::Cow;
use std::fmt;

/// Fixed path prefix the whole application is served under, e.g. `/blog`.
///
/// Always stored without a trailing slash; the empty prefix means the application
/// lives at the server root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MountPrefix(String);

impl MountPrefix {
    /// Normalise a configured prefix: surrounding whitespace and trailing slashes are
    /// dropped and a leading slash is added when missing. `""` and `"/"` both mean
    /// "no prefix".
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Self::default();
        }
        if trimmed.starts_with('/') {
            Self(trimmed.to_owned())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    /// Derive the prefix from the path of the entry script, the way a front
    /// controller deployed under a sub-directory computes it:
    /// `/blog/app.cgi` gives `/blog`, `/app.cgi` gives no prefix.
    #[must_use]
    pub fn from_script_name(script_name: &str) -> Self {
        match script_name.rsplit_once('/') {
            Some((dir, _)) => Self::new(dir),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove the prefix from `path` when it is followed by `/` or ends the path.
    /// `/blogger` is left alone under `/blog`.
    #[must_use]
    pub fn strip<'a>(&self, path: &'a str) -> &'a str {
        if self.0.is_empty() {
            return path;
        }
        // Only whole segments come off, unlike a bare `starts_with` strip which
        // would turn `/blogger` into `ger`. Keep it that way.
        match path.strip_prefix(self.0.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        }
    }

    /// Prefix an application-relative path, e.g. for a `Location` header.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + path.len() + 1);
        out.push_str(&self.0);
        if !path.starts_with('/') {
            out.push('/');
        }
        out.push_str(path);
        out
    }
}

impl fmt::Display for MountPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path component of a request target: query string and fragment removed.
///
/// Absolute-form targets (`http://host/path?q`) are parsed with `url`. The path is
/// not percent-decoded.
#[must_use]
pub fn path_component(raw_target: &str) -> Cow<'_, str> {
    if !raw_target.starts_with('/') && raw_target.contains("://") {
        if let Ok(url) = url::Url::parse(raw_target) {
            return Cow::Owned(url.path().to_owned());
        }
    }
    let end = raw_target.find(['?', '#']).unwrap_or(raw_target.len());
    Cow::Borrowed(&raw_target[..end])
}

/// Normalise a raw request target into the path the route table is matched against.
///
/// 1. keep the path component only;
/// 2. strip the mount prefix;
/// 3. an empty result becomes `/`;
/// 4. otherwise exactly one trailing `/` is removed (the root stays `/`).
#[must_use]
pub fn normalize_path(raw_target: &str, prefix: &MountPrefix) -> String {
    let path = path_component(raw_target);
    let path = prefix.strip(&path);
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }
    path.strip_suffix('/').unwrap_or(path).to_owned()
}
