use crate::data_types::{MenuEntry, QuerySpec};

/// A [`QuerySpec`] prepared for matching many entries: text criteria are
/// lowercased once instead of per item.
#[derive(Debug, Clone)]
pub struct ItemFilter<'q> {
    text: Option<String>,
    category: Option<String>,
    dietary_tags: &'q [String],
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl<'q> ItemFilter<'q> {
    pub fn new(spec: &'q QuerySpec) -> Self {
        ItemFilter {
            text: spec
                .text_query
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase),
            category: spec.category.as_deref().map(str::to_lowercase),
            dietary_tags: spec.dietary_tags.as_deref().unwrap_or_default(),
            min_price: spec.min_price,
            max_price: spec.max_price,
        }
    }

    pub fn matches(&self, entry: &MenuEntry) -> bool {
        self.matches_text(entry)
            && self.matches_category(entry)
            && self.matches_dietary(entry)
            && self.matches_price(entry)
    }

    fn matches_text(&self, entry: &MenuEntry) -> bool {
        match &self.text {
            None => true,
            Some(needle) => {
                entry.item.name().to_lowercase().contains(needle)
                    || entry.item.description().to_lowercase().contains(needle)
            }
        }
    }

    fn matches_category(&self, entry: &MenuEntry) -> bool {
        match &self.category {
            None => true,
            Some(category) => entry.category_name.to_lowercase() == *category,
        }
    }

    // any-match: one shared tag is enough
    fn matches_dietary(&self, entry: &MenuEntry) -> bool {
        self.dietary_tags.is_empty()
            || self
                .dietary_tags
                .iter()
                .any(|tag| entry.item.dietary_info().contains(tag))
    }

    fn matches_price(&self, entry: &MenuEntry) -> bool {
        let price = entry.item.price();
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }
}

pub fn matches(entry: &MenuEntry, spec: &QuerySpec) -> bool {
    ItemFilter::new(spec).matches(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::MenuItem;

    fn entry(category: &str, item: MenuItem) -> MenuEntry {
        MenuEntry {
            menu_id: "m1".into(),
            menu_name: "Main".into(),
            category_id: "c1".into(),
            category_name: category.into(),
            item,
        }
    }

    fn pad_thai() -> MenuEntry {
        entry(
            "Mains",
            MenuItem::builder("i1", "Pad Thai")
                .description("Stir-fried rice noodles with Tamarind sauce")
                .price(180.0)
                .dietary_info(["gluten-free", "dairy-free"])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn empty_spec_matches_everything() {
        assert!(matches(&pad_thai(), &QuerySpec::new()));
        assert!(matches(&pad_thai(), &QuerySpec::new().text("")));
        assert!(matches(
            &pad_thai(),
            &QuerySpec::new().dietary(Vec::<String>::new())
        ));
    }

    #[test]
    fn text_matches_name_or_description_case_insensitive() {
        assert!(matches(&pad_thai(), &QuerySpec::new().text("PAD")));
        assert!(matches(&pad_thai(), &QuerySpec::new().text("tamarind")));
        assert!(!matches(&pad_thai(), &QuerySpec::new().text("curry")));
    }

    #[test]
    fn category_is_case_insensitive_exact() {
        assert!(matches(&pad_thai(), &QuerySpec::new().category("mains")));
        assert!(!matches(&pad_thai(), &QuerySpec::new().category("main")));
    }

    #[test]
    fn dietary_tags_use_any_match() {
        let spec = QuerySpec::new().dietary(["vegan", "gluten-free"]);
        assert!(matches(&pad_thai(), &spec));

        let spec = QuerySpec::new().dietary(["vegan"]);
        assert!(!matches(&pad_thai(), &spec));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        assert!(matches(&pad_thai(), &QuerySpec::new().min_price(180.0)));
        assert!(matches(&pad_thai(), &QuerySpec::new().max_price(180.0)));
        assert!(!matches(&pad_thai(), &QuerySpec::new().min_price(180.5)));
        assert!(!matches(&pad_thai(), &QuerySpec::new().max_price(179.99)));
    }

    #[test]
    fn zero_is_a_real_bound() {
        let free_water = entry(
            "Drinks",
            MenuItem::builder("w", "Water").price(0.0).build().unwrap(),
        );
        assert!(matches(&free_water, &QuerySpec::new().max_price(0.0)));
        assert!(!matches(&pad_thai(), &QuerySpec::new().max_price(0.0)));
    }

    #[test]
    fn inverted_price_range_matches_nothing() {
        let spec = QuerySpec::new().min_price(200.0).max_price(100.0);
        assert!(!matches(&pad_thai(), &spec));
    }

    #[test]
    fn criteria_are_combined_with_and() {
        let spec = QuerySpec::new()
            .text("noodles")
            .category("Mains")
            .max_price(150.0);
        assert!(!matches(&pad_thai(), &spec));

        let spec = QuerySpec::new()
            .text("noodles")
            .category("Mains")
            .max_price(200.0);
        assert!(matches(&pad_thai(), &spec));
    }
}
