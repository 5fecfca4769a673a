use std::sync::OnceLock;

use regex_lite::Regex;

use crate::constants::DEFAULT_POPULAR_LIMIT;
use crate::data_types::QuerySpec;

static PRICE_RANGE: OnceLock<Regex> = OnceLock::new();
static PRICE_BOUND: OnceLock<Regex> = OnceLock::new();

fn price_range() -> &'static Regex {
    PRICE_RANGE.get_or_init(|| {
        Regex::new(r"^(\d+(?:[.,]\d+)?)-(\d+(?:[.,]\d+)?)$").expect("valid price range regex")
    })
}

fn price_bound() -> &'static Regex {
    PRICE_BOUND.get_or_init(|| {
        Regex::new(r"^(<=|>=|<|>)(\d+(?:[.,]\d+)?)$").expect("valid price bound regex")
    })
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Turns `/search` arguments into a [`QuerySpec`].
///
/// `#vegan` dietary tag, `@main_dishes` category, `<200` / `>100` / `100-200`
/// price bounds (always inclusive); everything else is search text.
pub fn parse_search_args(args: &str) -> QuerySpec {
    let mut spec = QuerySpec::new();
    let mut text: Vec<&str> = Vec::new();
    let mut tags: Vec<String> = Vec::new();

    for token in args.split_whitespace() {
        if let Some(tag) = token.strip_prefix('#').filter(|t| !t.is_empty()) {
            tags.push(tag.to_lowercase());
        } else if let Some(category) = token.strip_prefix('@').filter(|c| !c.is_empty()) {
            spec.category = Some(category.replace('_', " "));
        } else if let Some(caps) = price_range().captures(token) {
            match (parse_price(&caps[1]), parse_price(&caps[2])) {
                (Some(min), Some(max)) => {
                    spec.min_price = Some(min);
                    spec.max_price = Some(max);
                }
                _ => text.push(token),
            }
        } else if let Some(caps) = price_bound().captures(token) {
            match parse_price(&caps[2]) {
                Some(bound) if caps[1].starts_with('<') => spec.max_price = Some(bound),
                Some(bound) => spec.min_price = Some(bound),
                None => text.push(token),
            }
        } else {
            text.push(token);
        }
    }

    if !text.is_empty() {
        spec.text_query = Some(text.join(" "));
    }
    if !tags.is_empty() {
        spec.dietary_tags = Some(tags);
    }

    spec
}

/// `/popular` argument: empty means the default limit, `None` means unparseable.
pub fn parse_popular_limit(args: &str) -> Option<i64> {
    let args = args.trim();
    if args.is_empty() {
        return Some(DEFAULT_POPULAR_LIMIT);
    }
    args.parse::<i64>().ok()
}
