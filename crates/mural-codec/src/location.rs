//! Reading and writing share tokens in page addresses.
//!
//! Tokens live in the URL fragment as a query-style parameter named
//! [`PARAM`]. A token in the main query string is still read, but writing
//! always normalizes it into the fragment.
//!
//! The fragment may carry a route before its parameters (`#/edit?diagram=…`);
//! the route is preserved on write.
//!
//! These are pure functions over a caller-owned [`Url`]; nothing here
//! performs network I/O.

use url::{Url, form_urlencoded};

/// Name of the URL parameter carrying the share token.
pub const PARAM: &str = "diagram";

/// Returns the share token in `url`, looking at the fragment parameters
/// first and the query string second. Empty values count as absent.
///
/// # Examples
///
/// ```
/// # use url::Url;
/// # use mural_codec::location::read_token;
/// let url = Url::parse("https://example.com/?diagram=old#diagram=v1.d.new").unwrap();
/// assert_eq!(read_token(&url).as_deref(), Some("v1.d.new"));
/// ```
pub fn read_token(url: &Url) -> Option<String> {
    let from_fragment = url
        .fragment()
        .and_then(|fragment| find_param(split_fragment(fragment).1));
    from_fragment.or_else(|| url.query().and_then(find_param))
}

/// Writes `token` into the fragment, replacing any previous value, and
/// removes any copy from the query string.
pub fn write_token(url: &mut Url, token: &str) {
    remove_from_query(url);

    let fragment = url.fragment().unwrap_or_default().to_string();
    let (route, params) = split_fragment(&fragment);
    let mut pairs = parse_without_param(params);
    pairs.push((PARAM.to_string(), token.to_string()));
    set_fragment(url, route, &pairs);
}

/// Removes the token from both the fragment and the query string.
pub fn clear_token(url: &mut Url) {
    remove_from_query(url);

    let Some(fragment) = url.fragment().map(str::to_string) else {
        return;
    };
    let (route, params) = split_fragment(&fragment);
    let pairs = parse_without_param(params);
    set_fragment(url, route, &pairs);
}

/// Splits a fragment into its optional route and its parameter string.
///
/// A fragment without `?` is all parameters, unless it has no `=` at all,
/// in which case it is a bare route.
fn split_fragment(fragment: &str) -> (Option<&str>, &str) {
    match fragment.split_once('?') {
        Some((route, params)) => (Some(route), params),
        None if fragment.contains('=') || fragment.is_empty() => (None, fragment),
        None => (Some(fragment), ""),
    }
}

fn find_param(params: &str) -> Option<String> {
    form_urlencoded::parse(params.as_bytes())
        .find(|(key, value)| key == PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn parse_without_param(params: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(params.as_bytes())
        .filter(|(key, _)| key != PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn set_fragment(url: &mut Url, route: Option<&str>, pairs: &[(String, String)]) {
    let params = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    let fragment = match (route, params.is_empty()) {
        (Some(route), false) => format!("{route}?{params}"),
        (Some(route), true) => route.to_string(),
        (None, _) => params,
    };

    if fragment.is_empty() {
        url.set_fragment(None);
    } else {
        url.set_fragment(Some(&fragment));
    }
}

fn is_token_segment(segment: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(key, _)| key == PARAM)
}

/// Drops `diagram` segments from the raw query. Other segments are kept
/// byte for byte.
fn remove_from_query(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };
    if !query.split('&').any(is_token_segment) {
        return;
    }

    let kept = query
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_token_segment(segment))
        .collect::<Vec<_>>()
        .join("&");
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&kept));
    }
}
