use crate::config::{LinkResolution, ScopeMode};
use crate::error::{Result, SweepError};
use url::Url;

/// Parse user input into a seed URL, prepending `http://` when no scheme is given.
pub fn parse_seed(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SweepError::InvalidInput("Please enter a URL".to_string()));
    }

    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        trimmed
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    });
    let candidate = if has_scheme {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| SweepError::InvalidInput(format!("'{}': {}", trimmed, e)))?;
    if url.host_str().is_none() {
        return Err(SweepError::InvalidInput(format!("'{}' has no host", trimmed)));
    }

    Ok(url)
}

/// The part of the web a sweep is allowed to mirror. Immutable for a sweep.
#[derive(Debug, Clone)]
pub struct Scope {
    seed: Url,
    root: Url,
    mode: ScopeMode,
}

impl Scope {
    pub fn new(seed: Url, mode: ScopeMode) -> Self {
        let mut root = seed.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        Self { seed, root, mode }
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// The raw prefix every in-scope URL is compared against.
    pub fn prefix(&self) -> &str {
        self.seed.as_str()
    }

    /// Scheme, host and port of the seed.
    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn is_seed(&self, url: &str) -> bool {
        url == self.seed.as_str()
    }

    pub fn contains(&self, url: &Url) -> bool {
        match self.mode {
            ScopeMode::Prefix => url.as_str().starts_with(self.prefix()),
            ScopeMode::Strict => {
                url.scheme() == self.seed.scheme()
                    && url.host_str() == self.seed.host_str()
                    && url.port_or_known_default() == self.seed.port_or_known_default()
                    && path_within(url.path(), self.seed.path())
            }
        }
    }

    /// Resolve an anchor href to an absolute, fragment-free URL.
    ///
    /// Returns `None` for in-page fragments and non-navigational schemes.
    pub fn resolve_anchor(&self, page: &Url, href: &str, resolution: LinkResolution) -> Option<Url> {
        let base = match resolution {
            LinkResolution::SiteRoot => &self.root,
            LinkResolution::Page => page,
        };
        resolve_href(base, href)
    }
}

/// Resolve `href` against `base`, dropping the fragment.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn path_within(path: &str, base: &str) -> bool {
    if base.ends_with('/') {
        path.starts_with(base)
    } else {
        path == base
            || path
                .strip_prefix(base)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
