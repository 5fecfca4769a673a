use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_CURRENCY;
use crate::errors::MenuError;

pub const MAX_SPICY_LEVEL: u8 = 5;

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// A sellable dish.
///
/// Fields are private so `price` and `spicy_level` can only be set through
/// [`MenuItemBuilder`] (or deserialization, which goes through the same checks).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "MenuItemDoc")]
pub struct MenuItem {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    description: String,
    price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    allergens: Vec<String>,
    dietary_info: Vec<String>,
    is_available: bool,
    #[serde(rename = "preparationTime", skip_serializing_if = "Option::is_none")]
    preparation_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spicy_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    calories: Option<u32>,
    order_count: u64,
}

impl MenuItem {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> MenuItemBuilder {
        MenuItemBuilder::new(id, name)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn price(&self) -> f64 {
        self.price
    }
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
    pub fn allergens(&self) -> &[String] {
        &self.allergens
    }
    pub fn dietary_info(&self) -> &[String] {
        &self.dietary_info
    }
    pub fn is_available(&self) -> bool {
        self.is_available
    }
    pub fn preparation_time_minutes(&self) -> Option<u32> {
        self.preparation_time_minutes
    }
    pub fn spicy_level(&self) -> Option<u8> {
        self.spicy_level
    }
    pub fn calories(&self) -> Option<u32> {
        self.calories
    }
    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    /// Returns a copy with `update` applied, re-running construction checks.
    pub fn apply(&self, update: &ItemUpdate) -> Result<MenuItem, MenuError> {
        let mut builder = MenuItemBuilder::from(self.clone());
        if let Some(name) = &update.name {
            builder = builder.name(name.clone());
        }
        if let Some(description) = &update.description {
            builder = builder.description(description.clone());
        }
        if let Some(price) = update.price {
            builder = builder.price(price);
        }
        if let Some(image) = &update.image {
            builder = builder.image(image.clone());
        }
        if let Some(allergens) = &update.allergens {
            builder = builder.allergens(allergens.clone());
        }
        if let Some(dietary_info) = &update.dietary_info {
            builder = builder.dietary_info(dietary_info.clone());
        }
        if let Some(available) = update.is_available {
            builder = builder.available(available);
        }
        if let Some(minutes) = update.preparation_time_minutes {
            builder = builder.preparation_time_minutes(minutes);
        }
        if let Some(level) = update.spicy_level {
            builder = builder.spicy_level(level);
        }
        if let Some(calories) = update.calories {
            builder = builder.calories(calories);
        }
        builder.build()
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub(crate) fn add_orders(&mut self, quantity: u64) {
        self.order_count = self.order_count.saturating_add(quantity);
    }
}

#[derive(Debug, Clone)]
pub struct MenuItemBuilder {
    item: MenuItem,
}

impl MenuItemBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        MenuItemBuilder {
            item: MenuItem {
                id: id.into(),
                name: name.into(),
                description: String::new(),
                price: 0.0,
                image: None,
                allergens: Vec::new(),
                dietary_info: Vec::new(),
                is_available: true,
                preparation_time_minutes: None,
                spicy_level: None,
                calories: None,
                order_count: 0,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.item.name = name.into();
        self
    }
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.item.description = description.into();
        self
    }
    pub fn price(mut self, price: f64) -> Self {
        self.item.price = price;
        self
    }
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.item.image = Some(image.into());
        self
    }
    pub fn allergens<I, T>(mut self, allergens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.item.allergens = dedup_tags(allergens);
        self
    }
    pub fn dietary_info<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.item.dietary_info = dedup_tags(tags);
        self
    }
    pub fn available(mut self, available: bool) -> Self {
        self.item.is_available = available;
        self
    }
    pub fn preparation_time_minutes(mut self, minutes: u32) -> Self {
        self.item.preparation_time_minutes = Some(minutes);
        self
    }
    pub fn spicy_level(mut self, level: u8) -> Self {
        self.item.spicy_level = Some(level);
        self
    }
    pub fn calories(mut self, calories: u32) -> Self {
        self.item.calories = Some(calories);
        self
    }
    pub fn order_count(mut self, order_count: u64) -> Self {
        self.item.order_count = order_count;
        self
    }

    pub fn build(self) -> Result<MenuItem, MenuError> {
        let item = self.item;

        if item.name.trim().is_empty() {
            return Err(MenuError::InvalidItem("item name must not be empty".into()));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(MenuError::InvalidItem(format!(
                "'{}': price must be a non-negative number, got {}",
                item.name, item.price
            )));
        }
        if let Some(level) = item.spicy_level {
            if level > MAX_SPICY_LEVEL {
                return Err(MenuError::InvalidItem(format!(
                    "'{}': spicy level must be within 0..={}, got {}",
                    item.name, MAX_SPICY_LEVEL, level
                )));
            }
        }

        Ok(item)
    }
}

impl From<MenuItem> for MenuItemBuilder {
    fn from(item: MenuItem) -> Self {
        MenuItemBuilder { item }
    }
}

// tags are a set, but document order is kept for display
fn dedup_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.into();
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

// wire shape of an item as stored by the menu API (mongo document)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuItemDoc {
    #[serde(rename = "_id", alias = "id", default)]
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: f64,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    allergens: Option<Vec<String>>,
    #[serde(default)]
    dietary_info: Option<Vec<String>>,
    #[serde(default = "default_true")]
    is_available: bool,
    #[serde(default, alias = "preparationTimeMinutes")]
    preparation_time: Option<u32>,
    #[serde(default)]
    spicy_level: Option<u8>,
    #[serde(default)]
    calories: Option<u32>,
    #[serde(default)]
    order_count: Option<u64>,
}

impl TryFrom<MenuItemDoc> for MenuItem {
    type Error = MenuError;

    fn try_from(doc: MenuItemDoc) -> Result<Self, Self::Error> {
        let mut builder = MenuItemBuilder::new(doc.id, doc.name)
            .description(doc.description.unwrap_or_default())
            .price(doc.price)
            .allergens(doc.allergens.unwrap_or_default())
            .dietary_info(doc.dietary_info.unwrap_or_default())
            .available(doc.is_available)
            .order_count(doc.order_count.unwrap_or_default());

        if let Some(image) = doc.image {
            builder = builder.image(image);
        }
        if let Some(minutes) = doc.preparation_time {
            builder = builder.preparation_time_minutes(minutes);
        }
        if let Some(level) = doc.spicy_level {
            builder = builder.spicy_level(level);
        }
        if let Some(calories) = doc.calories {
            builder = builder.calories(calories);
        }

        builder.build()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl MenuCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sort_order: i32) -> Self {
        MenuCategory {
            id: id.into(),
            name: name.into(),
            description: None,
            sort_order,
            is_active: true,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<MenuItem>) -> Self {
        self.items = items;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(
        rename = "restaurant",
        alias = "restaurantId",
        deserialize_with = "restaurant_ref"
    )]
    pub restaurant_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<MenuCategory>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_languages: Vec<String>,
}

impl Menu {
    pub fn new(
        id: impl Into<String>,
        restaurant_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Menu {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            name: name.into(),
            description: None,
            categories: Vec::new(),
            is_active: true,
            currency: default_currency(),
            valid_from: None,
            valid_until: None,
            available_languages: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<MenuCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn category(&self, category_id: &str) -> Option<&MenuCategory> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn category_mut(&mut self, category_id: &str) -> Option<&mut MenuCategory> {
        self.categories.iter_mut().find(|c| c.id == category_id)
    }
}

// the API returns the restaurant either as a plain id or populated as an object
fn restaurant_ref<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RestaurantRef {
        Id(String),
        Populated {
            #[serde(rename = "_id", alias = "id")]
            id: String,
        },
    }

    Ok(match RestaurantRef::deserialize(deserializer)? {
        RestaurantRef::Id(id) => id,
        RestaurantRef::Populated { id } => id,
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// One visible item together with the menu and category it was found in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    pub menu_id: String,
    pub menu_name: String,
    pub category_id: String,
    pub category_name: String,
    pub item: MenuItem,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub allergens: Option<Vec<String>>,
    pub dietary_info: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub preparation_time_minutes: Option<u32>,
    pub spicy_level: Option<u8>,
    pub calories: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_negative_price() {
        let err = MenuItem::builder("i1", "Soup").price(-1.0).build().unwrap_err();
        assert!(matches!(err, MenuError::InvalidItem(_)));
    }

    #[test]
    fn builder_rejects_nan_price_and_hot_spice() {
        assert!(MenuItem::builder("i1", "Soup").price(f64::NAN).build().is_err());
        assert!(MenuItem::builder("i1", "Soup")
            .spicy_level(6)
            .build()
            .is_err());
        assert!(MenuItem::builder("i1", "Soup")
            .spicy_level(5)
            .build()
            .is_ok());
    }

    #[test]
    fn builder_dedups_tags_keeping_order() {
        let item = MenuItem::builder("i1", "Salad")
            .dietary_info(["vegan", "gluten-free", "vegan"])
            .build()
            .unwrap();
        assert_eq!(item.dietary_info(), ["vegan", "gluten-free"]);
    }

    #[test]
    fn apply_revalidates() {
        let item = MenuItem::builder("i1", "Curry").price(100.0).build().unwrap();
        let update = ItemUpdate {
            price: Some(-5.0),
            ..Default::default()
        };
        assert!(item.apply(&update).is_err());

        let update = ItemUpdate {
            price: Some(90.0),
            is_available: Some(false),
            ..Default::default()
        };
        let updated = item.apply(&update).unwrap();
        assert_eq!(updated.price(), 90.0);
        assert!(!updated.is_available());
        assert_eq!(updated.name(), "Curry");
    }

    #[test]
    fn deserializes_api_document_with_defaults() {
        let json = r#"{
            "_id": "m1",
            "restaurant": {"_id": "r1", "name": "Bangkok Street Food", "address": "x"},
            "name": "Main Menu",
            "categories": [{
                "_id": "c1",
                "name": "Appetizers",
                "sortOrder": 1,
                "items": [{
                    "_id": "i1",
                    "name": "Spring Rolls",
                    "description": "Fresh",
                    "price": 120,
                    "dietaryInfo": ["vegan"],
                    "preparationTime": 10,
                    "orderCount": 45
                }]
            }]
        }"#;

        let menu: Menu = serde_json::from_str(json).unwrap();
        assert_eq!(menu.restaurant_id, "r1");
        assert!(menu.is_active);
        assert_eq!(menu.currency, "THB");

        let category = &menu.categories[0];
        assert!(category.is_active);
        let item = &category.items[0];
        assert!(item.is_available());
        assert_eq!(item.preparation_time_minutes(), Some(10));
        assert_eq!(item.order_count(), 45);
        assert!(item.allergens().is_empty());
    }

    #[test]
    fn deserialization_enforces_item_invariants() {
        let json = r#"{"_id": "i1", "name": "Bad", "price": 10, "spicyLevel": 9}"#;
        assert!(serde_json::from_str::<MenuItem>(json).is_err());

        let json = r#"{"_id": "i1", "name": "Bad", "price": -3}"#;
        assert!(serde_json::from_str::<MenuItem>(json).is_err());
    }

    #[test]
    fn serializes_in_api_shape() {
        let item = MenuItem::builder("i1", "Tea")
            .price(40.0)
            .preparation_time_minutes(3)
            .build()
            .unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["_id"], "i1");
        assert_eq!(value["preparationTime"], 3);
        assert_eq!(value["isAvailable"], true);
        assert!(value.get("spicyLevel").is_none());

        let back: MenuItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }
}
