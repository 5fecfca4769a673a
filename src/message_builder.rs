use rand::Rng;
use teloxide::utils::markdown;

use crate::constants::{DEFAULT_CURRENCY, MAX_ENTRIES_IN_MSG, MAX_MSG_CHARS, MAX_SUBTITLE_CHARS};
use crate::data_types::{MenuEntry, MenuItem, QuerySpec};
use crate::errors::MenuError;

const EMOJIS: [&str; 7] = ["🍜", "🥢", "🍛", "🌶️", "🥭", "🍤", "🥗"];

// room kept free for the "... and N more" line
const TAIL_RESERVE_CHARS: usize = 100;

/// What kind of listing is rendered; popularity listings show order counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListingKind {
    Search,
    Popular,
    FullMenu,
}

/// Renders entries as a Telegram MarkdownV2 message, grouped by menu and category.
///
/// Stops at [`MAX_ENTRIES_IN_MSG`] entries or when the next entry would push the
/// message past [`MAX_MSG_CHARS`], whichever comes first.
pub fn build_entries_msg(
    restaurant_name: &str,
    subtitle: &str,
    entries: &[MenuEntry],
    kind: ListingKind,
) -> String {
    let mut msg = String::new();

    let rand_emoji = EMOJIS[rand::thread_rng().gen_range(0..EMOJIS.len())];
    msg += &format!(
        "{} {} {}\n",
        rand_emoji,
        markdown::bold(&markdown::escape(restaurant_name)),
        rand_emoji
    );
    if !subtitle.is_empty() {
        let subtitle: String = subtitle.chars().take(MAX_SUBTITLE_CHARS).collect();
        msg += &format!("{}\n", markdown::italic(&markdown::escape(&subtitle)));
    }

    if entries.is_empty() {
        msg += &format!("\n{}\n", markdown::bold("no dishes found"));
        return msg;
    }

    let mut used = msg.chars().count();
    let mut shown = 0;
    let mut current_group: Option<(&str, &str)> = None;
    for (rank, entry) in entries.iter().take(MAX_ENTRIES_IN_MSG).enumerate() {
        let group = (entry.menu_name.as_str(), entry.category_name.as_str());

        let mut chunk = String::new();
        if current_group != Some(group) {
            chunk += &format!(
                "\n{}\n",
                markdown::bold(&markdown::escape(&format!("{} · {}", group.0, group.1)))
            );
        }
        chunk += &item_lines(&entry.item, kind, rank + 1);

        let chunk_len = chunk.chars().count();
        if used + chunk_len + TAIL_RESERVE_CHARS > MAX_MSG_CHARS {
            break;
        }
        msg += &chunk;
        used += chunk_len;
        shown += 1;
        current_group = Some(group);
    }

    if entries.len() > shown {
        msg += &format!(
            "\n{}\n",
            markdown::italic(&markdown::escape(&format!(
                "... and {} more, narrow down with /search",
                entries.len() - shown
            )))
        );
    }

    msg
}

fn item_lines(item: &MenuItem, kind: ListingKind, rank: usize) -> String {
    let mut lines = String::new();

    let name = markdown::underline(&markdown::escape(item.name()));
    if kind == ListingKind::Popular {
        lines += &format!(" {}\\. {}\n", rank, name);
    } else {
        lines += &format!(" • {}\n", name);
    }

    if !item.description().is_empty() {
        lines += &format!("     {}\n", markdown::escape(item.description()));
    }
    if !item.dietary_info().is_empty() {
        let tags: Vec<String> = item
            .dietary_info()
            .iter()
            .map(|tag| markdown::italic(&markdown::escape(tag)))
            .collect();
        lines += &format!("     \\+ {}\n", tags.join(", "));
    }
    if !item.allergens().is_empty() {
        lines += &format!(
            "    ℹ️ {}\n",
            markdown::escape(&item.allergens().join(", "))
        );
    }
    if let Some(level) = item.spicy_level().filter(|l| *l > 0) {
        lines += &format!("    {}\n", "🌶".repeat(level as usize));
    }

    let mut price_line = format_price(item.price());
    if kind == ListingKind::Popular {
        price_line += &format!("  ({} orders)", item.order_count());
    }
    lines += &format!("   {}\n", markdown::escape(&price_line));

    lines
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0} {}", price, DEFAULT_CURRENCY)
    } else {
        format!("{:.2} {}", price, DEFAULT_CURRENCY)
    }
}

/// Short human readable summary of a search, used as listing subtitle.
pub fn describe_query(spec: &QuerySpec) -> String {
    if spec.is_unconstrained() {
        return "all dishes".to_string();
    }
    let mut parts = Vec::new();

    if let Some(text) = spec.text_query.as_deref().filter(|t| !t.is_empty()) {
        parts.push(format!("\"{}\"", text));
    }
    if let Some(category) = &spec.category {
        parts.push(format!("in {}", category));
    }
    if let Some(tags) = &spec.dietary_tags {
        parts.extend(tags.iter().map(|tag| format!("#{}", tag)));
    }
    match (spec.min_price, spec.max_price) {
        (Some(min), Some(max)) => parts.push(format!("{}-{} {}", min, max, DEFAULT_CURRENCY)),
        (Some(min), None) => parts.push(format!(">= {} {}", min, DEFAULT_CURRENCY)),
        (None, Some(max)) => parts.push(format!("<= {} {}", max, DEFAULT_CURRENCY)),
        (None, None) => {}
    }

    parts.join(" · ")
}

pub fn build_error_msg(err: &MenuError) -> String {
    let text = match err {
        MenuError::InvalidArgument(reason) => format!("That didn't work: {}", reason),
        MenuError::DataUnavailable(_) => {
            "The menu is not reachable right now, please try again later.".to_string()
        }
        other => format!("Something went wrong: {}", other),
    };
    markdown::escape(&text)
}
