use crate::data_types::{Menu, MenuCategory, MenuEntry};

/// Walks a restaurant's menus and yields every visible item.
///
/// Visible means: menu active, category active and item available.
/// Menus keep input order, categories are ordered by `sort_order` (stable,
/// so ties keep input order), items keep document order.
pub fn flatten(menus: &[Menu]) -> impl Iterator<Item = MenuEntry> + '_ {
    menus
        .iter()
        .filter(|menu| menu.is_active)
        .flat_map(|menu| {
            let mut categories: Vec<&MenuCategory> =
                menu.categories.iter().filter(|c| c.is_active).collect();
            categories.sort_by_key(|c| c.sort_order);

            categories.into_iter().flat_map(move |category| {
                category
                    .items
                    .iter()
                    .filter(|item| item.is_available())
                    .map(move |item| MenuEntry {
                        menu_id: menu.id.clone(),
                        menu_name: menu.name.clone(),
                        category_id: category.id.clone(),
                        category_name: category.name.clone(),
                        item: item.clone(),
                    })
            })
        })
}
