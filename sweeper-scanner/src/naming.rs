use crate::config::AssetNaming;
use url::Url;

pub const PAGE_EXTENSION: &str = ".html";
pub const SEED_PAGE_NAME: &str = "index.html";
pub const ASSETS_DIR: &str = "assets";

const ASSET_HASH_LEN: usize = 12;
/// Upper bound on the segment part of an asset name. Filesystems commonly cap
/// a name at 255 bytes.
const MAX_SEGMENT_LEN: usize = 100;
/// Longer suffixes are not treated as an extension when truncating.
const MAX_EXTENSION_LEN: usize = 16;

/// Local filename for a page. The seed is always `index.html`; every other
/// page is the MD5 of its URL string.
pub fn name_for(url: &str, is_seed: bool) -> String {
    if is_seed {
        SEED_PAGE_NAME.to_string()
    } else {
        format!("{:x}{}", md5::compute(url.as_bytes()), PAGE_EXTENSION)
    }
}

/// Local filename for an embedded resource, or `None` when the URL has no
/// usable final path segment.
pub fn asset_name_for(url: &Url, naming: AssetNaming) -> Option<String> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(sanitize_segment)
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .map(truncate_segment)?;

    match naming {
        AssetNaming::Segment => Some(segment),
        AssetNaming::Hashed => {
            let digest = format!("{:x}", md5::compute(url.as_str().as_bytes()));
            Some(format!("{}-{}", &digest[..ASSET_HASH_LEN], segment))
        }
    }
}

/// Path of an asset relative to the output root, as written into pages.
pub fn asset_href(name: &str) -> String {
    format!("{}/{}", ASSETS_DIR, name)
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Shorten a sanitized (ASCII) segment to `MAX_SEGMENT_LEN` bytes, keeping a
/// short extension intact.
fn truncate_segment(segment: String) -> String {
    if segment.len() <= MAX_SEGMENT_LEN {
        return segment;
    }
    let extension = segment
        .rfind('.')
        .filter(|&dot| dot > 0 && segment.len() - dot <= MAX_EXTENSION_LEN)
        .map(|dot| &segment[dot..])
        .unwrap_or("");
    let stem_len = MAX_SEGMENT_LEN - extension.len();
    format!("{}{}", &segment[..stem_len], extension)
}
