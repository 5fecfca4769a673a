use crate::data_types::{Menu, MenuEntry};
use crate::engine::flattener::flatten;
use crate::errors::MenuError;

/// Top `limit` visible items by `order_count`, highest first.
///
/// Uses a stable sort, so items with equal counts keep flattener order.
/// A negative limit is a caller error and is never clamped.
pub fn rank_popular(menus: &[Menu], limit: i64) -> Result<Vec<MenuEntry>, MenuError> {
    let limit = check_limit(limit)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut entries: Vec<MenuEntry> = flatten(menus).collect();
    entries.sort_by(|a, b| b.item.order_count().cmp(&a.item.order_count()));
    entries.truncate(limit);

    Ok(entries)
}

pub fn check_limit(limit: i64) -> Result<usize, MenuError> {
    if limit < 0 {
        return Err(MenuError::InvalidArgument(format!(
            "limit must not be negative, got {}",
            limit
        )));
    }
    Ok(usize::try_from(limit).unwrap_or(usize::MAX))
}
