//! Target-site URL algebra and text heuristics.
//!
//! The monitor touches exactly two page types: the paginated follow-list of
//! an admin account (`/member/general/following/<id>?page=N`) and a seller's
//! shop page (`/member/<id>`). Everything here is pure string work so it can
//! be tested without a browser.

use regex::Regex;
use url::Url;

/// Localized "follows nobody" phrases that mark the end of a follow-list.
/// Matched against the lowercased page source.
pub const NO_FOLLOWING_PHRASES: &[&str] = &[
    "doesn't follow anyone yet",
    "volgt nog niemand",
    "ne suit personne",
    "没有关注任何人",
    "no sigue a nadie",
];

/// Lines that show up inside follow-list link text but are never usernames:
/// review-count boilerplate and rating words.
const NOISE_PHRASES: &[&str] = &[
    "nog geen reviews",
    "no reviews",
    "reviews",
    "heel goed",
    "very good",
    "good",
    "excellent",
];

/// Rating phrases that disqualify a line from being an item title.
const RATING_PHRASES: &[&str] = &["heel goed", "very good", "good", "excellent", "fair"];

const CURRENCY_MARKERS: &[char] = &['€', '$', '£'];

/// Extract a seller id from a profile URL like `https://host/member/12345`.
pub fn seller_id_from_url(url: &str) -> Option<String> {
    let re = Regex::new(r"/member/(\d+)").unwrap();
    re.captures(url).map(|c| c[1].to_string())
}

/// Extract the admin account id from a follow-list URL like
/// `https://host/member/general/following/12345?page=1`.
pub fn admin_id_from_follow_url(url: &str) -> Option<String> {
    let re = Regex::new(r"/following/(\d+)").unwrap();
    re.captures(url).map(|c| c[1].to_string())
}

/// Validate that a raw string is a usable follow-list URL for the configured
/// host. Returns a human-readable reason on failure.
pub fn validate_follow_list_url(raw: &str, expected_host: &str) -> std::result::Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("not a valid URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err("URL must use http or https".to_string());
    }

    let host = url.host_str().unwrap_or_default();
    if !host.ends_with(expected_host) {
        return Err(format!("URL host must be {expected_host}"));
    }

    if !url.path().contains("/member/") {
        return Err("URL must reference a member path".to_string());
    }

    if admin_id_from_follow_url(raw).is_none() {
        return Err("URL must reference a numeric follow-list (/following/<id>)".to_string());
    }

    Ok(())
}

/// Derive a seller's shop URL from their profile URL. Same identifier,
/// canonical `/member/<id>` route. Falls back to the input when no id can
/// be resolved.
pub fn shop_url(profile_url: &str) -> String {
    match (seller_id_from_url(profile_url), profile_url.split("/member/").next()) {
        (Some(id), Some(base)) if !base.is_empty() => format!("{base}/member/{id}"),
        _ => profile_url.to_string(),
    }
}

/// Current page number of a paginated URL; defaults to 1.
pub fn page_number(url: &str) -> u32 {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
        })
        .unwrap_or(1)
}

/// Compute the next page's URL by incrementing the `page` query parameter.
/// Returns the input unchanged when the URL cannot be parsed, which callers
/// use as the stop signal.
pub fn next_page_url(current: &str) -> String {
    let Ok(mut url) = Url::parse(current) else {
        return current.to_string();
    };

    let next = page_number(current) + 1;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &others {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("page", &next.to_string());
    }

    url.to_string()
}

/// Resolve a possibly-relative href against the page it was found on.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    Url::parse(base).ok()?.join(href).ok().map(String::from)
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(text: &str) -> String {
    let re = Regex::new(r"\s+").unwrap();
    re.replace_all(text.trim(), " ").into_owned()
}

/// First localized terminal phrase present in the lowercased page source.
pub fn find_no_following_phrase(source_lower: &str) -> Option<&'static str> {
    NO_FOLLOWING_PHRASES
        .iter()
        .copied()
        .find(|p| source_lower.contains(p))
}

/// True for link-text lines that cannot be a username.
pub fn is_noise_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    NOISE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Pick the best username candidate from a link's text lines.
pub fn username_from_lines(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .map(|l| clean_text(l))
        .find(|l| !l.is_empty() && !is_noise_line(l))
}

/// Pick an item title from an item element's text lines: the first line that
/// is non-numeric, carries no currency marker, is not a rating phrase, has
/// no dot separators, and is longer than one character. Falls back to the
/// first line.
pub fn pick_item_title(lines: &[String]) -> Option<String> {
    let cleaned: Vec<String> = lines
        .iter()
        .map(|l| clean_text(l))
        .filter(|l| !l.is_empty())
        .collect();

    let title = cleaned.iter().find(|line| {
        let lower = line.to_lowercase();
        !line.chars().all(|c| c.is_ascii_digit())
            && !line.contains(CURRENCY_MARKERS)
            && !RATING_PHRASES.iter().any(|r| lower.contains(r))
            && !line.contains('·')
            && !line.contains('•')
            && line.chars().count() > 1
    });

    title.cloned().or_else(|| cleaned.first().cloned())
}

/// Free-text `<number> item(s)` count from the lowercased page source.
/// Informational only; the classifier never bases its decision on it.
pub fn text_item_count(source_lower: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+)\s+items?").unwrap();
    re.captures(source_lower)
        .and_then(|c| c[1].parse().ok())
}
