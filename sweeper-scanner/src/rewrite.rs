use crate::config::LinkResolution;
use crate::html::replace_attribute_values;
use crate::naming::name_for;
use crate::scope::Scope;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid CSS"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenPage {
    pub html: String,
    /// Absolute in-scope URLs, deduplicated, in document order.
    pub links: Vec<String>,
}

/// Point in-scope anchors at their local filenames and collect them for the
/// frontier. Out-of-scope anchors are left exactly as they were.
pub fn rewrite_links(
    html: &str,
    page: &Url,
    scope: &Scope,
    resolution: LinkResolution,
) -> RewrittenPage {
    let mut replacements = HashMap::new();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in anchor_hrefs(html) {
        let Some(absolute) = scope.resolve_anchor(page, &href, resolution) else {
            continue;
        };
        if !scope.contains(&absolute) {
            continue;
        }

        let absolute = absolute.to_string();
        let local = name_for(&absolute, scope.is_seed(&absolute));
        replacements.insert(href, local);
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }

    RewrittenPage {
        html: replace_attribute_values(html, "a", "href", &replacements),
        links,
    }
}

fn anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect()
}
