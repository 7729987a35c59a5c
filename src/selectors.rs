//! Data-driven selector fallback chains and DOM snapshot queries.
//!
//! The target site's markup drifts; every structural lookup is an ordered
//! chain of strategies tried most-specific-first, and the first strategy
//! that yields a plausible, non-empty result wins. Chains are plain lists
//! so each strategy stays independently testable. All queries run on HTML
//! source snapshots, never on live DOM handles.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::site;

/// How to locate seller links on a follow-list page.
#[derive(Debug, Clone, Copy)]
pub enum LinkStrategy {
    /// Select anchors directly.
    Css(&'static str),
    /// Select inner elements (e.g. username labels) and walk up to the
    /// closest enclosing anchor.
    AncestorLinkOf(&'static str),
}

impl LinkStrategy {
    pub fn describe(&self) -> &'static str {
        match self {
            LinkStrategy::Css(s) => s,
            LinkStrategy::AncestorLinkOf(s) => s,
        }
    }
}

/// Ordered from the dedicated follow-list structure down to a bare
/// profile-path substring match.
pub const FOLLOW_LINK_STRATEGIES: &[LinkStrategy] = &[
    LinkStrategy::Css("div.followed-users__body > div > div > a"),
    LinkStrategy::Css(".followed-users__body a[href*='/member/']"),
    LinkStrategy::AncestorLinkOf("[data-testid='profile-username']"),
    LinkStrategy::Css("a[href*='/member/']"),
    LinkStrategy::Css(".web_ui__Cell a"),
];

/// Username label inside a seller link; also used to count name elements
/// when verifying the end-of-list phrase.
pub const USERNAME_SELECTOR: &str = "[data-testid='profile-username']";

const USERNAME_FALLBACK_SELECTORS: &[&str] =
    &[".user-name", ".username", "[data-testid='username']"];

/// Item elements on a shop page, verified-working query first.
pub const ITEM_SELECTORS: &[&str] = &[
    ".feed-grid__item",
    ".item-box",
    "[data-testid='item']",
    ".catalog-item",
    ".product-item",
];

/// The shop page's explicit "no items" marker. Scoped variant first, bare
/// component class as fallback.
pub const EMPTY_STATE_SELECTORS: &[&str] = &[
    ".profile__items-wrapper .web_ui__EmptyState__empty-state",
    ".web_ui__EmptyState__empty-state",
];

/// A seller link captured from a follow-list page.
#[derive(Debug, Clone)]
pub struct LinkSnapshot {
    pub href: String,
    /// Username from a dedicated label inside the link, when present.
    pub username: Option<String>,
    /// All text lines of the link, for the last-resort username heuristic.
    pub text_lines: Vec<String>,
}

/// An item element captured from a shop page.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub text_lines: Vec<String>,
}

/// Everything the paginator needs from one follow-list page snapshot.
#[derive(Debug)]
pub struct FollowPageScan {
    /// Count of username label elements on the page. The page owner's own
    /// name renders as one of these, hence the `<= 1` terminal check.
    pub username_elements: usize,
    pub links: Vec<LinkSnapshot>,
    pub matched_strategy: Option<&'static str>,
}

impl FollowPageScan {
    pub fn scan(source: &str) -> Self {
        let html = Html::parse_document(source);

        let username_elements = count_matches(&html, USERNAME_SELECTOR);
        let (links, matched_strategy) = discover_links(&html);

        Self {
            username_elements,
            links,
            matched_strategy,
        }
    }
}

/// Everything the classifier needs from one shop page snapshot.
#[derive(Debug)]
pub struct ShopPageScan {
    pub empty_state: bool,
    pub items: Vec<ItemSnapshot>,
    pub matched_selector: Option<&'static str>,
}

impl ShopPageScan {
    pub fn scan(source: &str) -> Self {
        let html = Html::parse_document(source);

        let empty_state = EMPTY_STATE_SELECTORS
            .iter()
            .any(|s| count_matches(&html, s) > 0);

        let mut items = Vec::new();
        let mut matched_selector = None;
        for selector_str in ITEM_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            let found: Vec<ItemSnapshot> = html
                .select(&selector)
                .map(|el| ItemSnapshot {
                    text_lines: text_lines(el),
                })
                .collect();
            if !found.is_empty() {
                debug!(
                    "item selector '{}' matched {} element(s)",
                    selector_str,
                    found.len()
                );
                items = found;
                matched_selector = Some(*selector_str);
                break;
            }
        }

        Self {
            empty_state,
            items,
            matched_selector,
        }
    }
}

fn count_matches(html: &Html, selector_str: &str) -> usize {
    match Selector::parse(selector_str) {
        Ok(selector) => html.select(&selector).count(),
        Err(_) => 0,
    }
}

/// Run the strategy chain; first strategy with at least one plausible
/// seller link wins.
fn discover_links(html: &Html) -> (Vec<LinkSnapshot>, Option<&'static str>) {
    for strategy in FOLLOW_LINK_STRATEGIES {
        let anchors = match strategy {
            LinkStrategy::Css(selector_str) => {
                let Ok(selector) = Selector::parse(selector_str) else {
                    continue;
                };
                html.select(&selector).collect::<Vec<_>>()
            }
            LinkStrategy::AncestorLinkOf(selector_str) => {
                let Ok(selector) = Selector::parse(selector_str) else {
                    continue;
                };
                let mut seen = Vec::new();
                let mut anchors = Vec::new();
                for inner in html.select(&selector) {
                    if let Some(anchor) = enclosing_anchor(inner) {
                        if !seen.contains(&anchor.id()) {
                            seen.push(anchor.id());
                            anchors.push(anchor);
                        }
                    }
                }
                anchors
            }
        };

        let links: Vec<LinkSnapshot> = anchors
            .into_iter()
            .filter_map(snapshot_link)
            .filter(|l| is_plausible_seller_link(&l.href))
            .collect();

        if !links.is_empty() {
            debug!(
                "link strategy '{}' yielded {} seller link(s)",
                strategy.describe(),
                links.len()
            );
            return (links, Some(strategy.describe()));
        }
    }

    (Vec::new(), None)
}

/// A seller link must resolve to a numeric profile id and must not be the
/// "general" pseudo-route.
fn is_plausible_seller_link(href: &str) -> bool {
    site::seller_id_from_url(href).is_some() && !href.contains("/general/")
}

fn enclosing_anchor(inner: ElementRef) -> Option<ElementRef> {
    let mut node = inner.parent();
    while let Some(n) = node {
        if let Some(el) = ElementRef::wrap(n) {
            if el.value().name() == "a" {
                return Some(el);
            }
        }
        node = n.parent();
    }
    None
}

fn snapshot_link(anchor: ElementRef) -> Option<LinkSnapshot> {
    let href = anchor.value().attr("href")?.to_string();

    let mut username = select_text(anchor, USERNAME_SELECTOR);
    if username.is_none() {
        for fallback in USERNAME_FALLBACK_SELECTORS {
            username = select_text(anchor, fallback);
            if username.is_some() {
                break;
            }
        }
    }

    Some(LinkSnapshot {
        href,
        username,
        text_lines: text_lines(anchor),
    })
}

fn select_text(scope: ElementRef, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    scope
        .select(&selector)
        .map(|el| site::clean_text(&el.text().collect::<Vec<_>>().join(" ")))
        .find(|t| !t.is_empty())
}

/// Element text as trimmed, non-empty lines (one per text node).
fn text_lines(el: ElementRef) -> Vec<String> {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
