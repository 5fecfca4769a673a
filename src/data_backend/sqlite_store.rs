use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::constants::SQLITE_BUSY_TIMEOUT_SECS;
use crate::data_backend::MenuStore;
use crate::data_types::{
    CategoryUpdate, ItemUpdate, Menu, MenuCategory, MenuItem, MenuUpdate, Restaurant,
};
use crate::errors::MenuError;

/// Menus persisted as json documents in SQLite, one row per menu.
///
/// Serves as the offline cache for [`CachedMenuStore`](super::CachedMenuStore)
/// and as the write side for menu management. A connection is opened per
/// operation; async callers go through [`SqliteMenuStore::blocking`].
#[derive(Debug, Clone)]
pub struct SqliteMenuStore {
    db_path: PathBuf,
}

impl SqliteMenuStore {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, MenuError> {
        let store = SqliteMenuStore {
            db_path: db_path.into(),
        };
        store.check_or_create_tables()?;
        Ok(store)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))?;
        Ok(conn)
    }

    fn check_or_create_tables(&self) -> rusqlite::Result<()> {
        let conn = self.connect()?;

        conn.execute_batch(
            "create table if not exists restaurants (
                restaurant_id text primary key,
                name text not null,
                address text not null default '',
                is_active integer not null default 1
            );

            create table if not exists menus (
                menu_id text primary key,
                restaurant_id text not null,
                name text not null,
                json_text text not null,
                updated_at text not null,
                unique (restaurant_id, name)
            );",
        )
    }

    /// Runs `f` on the blocking pool so the runtime isn't stalled by SQLite.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, MenuError>
    where
        F: FnOnce(&SqliteMenuStore) -> Result<T, MenuError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store)).await?
    }

    pub fn upsert_restaurants(&self, restaurants: &[Restaurant]) -> Result<(), MenuError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "replace into restaurants (restaurant_id, name, address, is_active)
                    values (?1, ?2, ?3, ?4)",
            )?;
            for restaurant in restaurants {
                stmt.execute(params![
                    restaurant.id,
                    restaurant.name,
                    restaurant.address,
                    restaurant.is_active
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_restaurants(&self) -> Result<Vec<Restaurant>, MenuError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare_cached(
            "select restaurant_id, name, address, is_active from restaurants order by name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Restaurant {
                id: row.get(0)?,
                name: row.get(1)?,
                address: row.get(2)?,
                is_active: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn load_menus(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare_cached(
            "select json_text from menus where restaurant_id = ?1 order by rowid",
        )?;

        let docs = stmt
            .query_map(params![restaurant_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        docs.iter()
            .map(|json| serde_json::from_str(json).map_err(MenuError::from))
            .collect()
    }

    /// Swaps a restaurant's cached menus for `menus` in one transaction.
    pub fn replace_restaurant_menus(
        &self,
        restaurant_id: &str,
        menus: &[Menu],
    ) -> Result<(), MenuError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(
            "delete from menus where restaurant_id = ?1",
            params![restaurant_id],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "insert into menus (menu_id, restaurant_id, name, json_text, updated_at)
                    values (?1, ?2, ?3, ?4, ?5)",
            )?;
            let updated_at = timestamp();
            for menu in menus {
                stmt.execute(params![
                    menu.id,
                    restaurant_id,
                    menu.name,
                    serde_json::to_string(menu)?,
                    updated_at
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    pub fn get_menu(&self, menu_id: &str) -> Result<Menu, MenuError> {
        read_menu(&self.connect()?, menu_id)
    }

    pub fn create_menu(&self, mut menu: Menu) -> Result<Menu, MenuError> {
        if menu.id.is_empty() {
            menu.id = new_id();
        }
        for category in &mut menu.categories {
            assign_ids(category);
        }

        let conn = self.connect()?;
        if menu_name_taken(&conn, &menu.restaurant_id, &menu.name, None)? {
            return Err(MenuError::DuplicateName(format!(
                "menu '{}' already exists for restaurant {}",
                menu.name, menu.restaurant_id
            )));
        }

        conn.execute(
            "insert into menus (menu_id, restaurant_id, name, json_text, updated_at)
                values (?1, ?2, ?3, ?4, ?5)",
            params![
                menu.id,
                menu.restaurant_id,
                menu.name,
                serde_json::to_string(&menu)?,
                timestamp()
            ],
        )?;

        log::info!("created menu '{}' ({})", menu.name, menu.id);
        Ok(menu)
    }

    pub fn update_menu(&self, menu_id: &str, update: &MenuUpdate) -> Result<Menu, MenuError> {
        self.modify_menu(menu_id, |conn, menu| {
            if let Some(name) = &update.name {
                if menu_name_taken(conn, &menu.restaurant_id, name, Some(menu.id.as_str()))? {
                    return Err(MenuError::DuplicateName(format!(
                        "menu '{}' already exists for restaurant {}",
                        name, menu.restaurant_id
                    )));
                }
                menu.name = name.clone();
            }
            if let Some(description) = &update.description {
                menu.description = Some(description.clone());
            }
            if let Some(is_active) = update.is_active {
                menu.is_active = is_active;
            }
            if let Some(currency) = &update.currency {
                menu.currency = currency.clone();
            }
            Ok(menu.clone())
        })
    }

    pub fn remove_menu(&self, menu_id: &str) -> Result<(), MenuError> {
        let conn = self.connect()?;
        let removed = conn.execute("delete from menus where menu_id = ?1", params![menu_id])?;
        if removed == 0 {
            return Err(not_found("menu", menu_id));
        }
        Ok(())
    }

    pub fn add_category(
        &self,
        menu_id: &str,
        mut category: MenuCategory,
    ) -> Result<Menu, MenuError> {
        assign_ids(&mut category);

        self.modify_menu(menu_id, move |_, menu| {
            if menu.categories.iter().any(|c| c.name == category.name) {
                return Err(MenuError::DuplicateName(format!(
                    "category '{}' already exists in menu '{}'",
                    category.name, menu.name
                )));
            }
            menu.categories.push(category);
            Ok(menu.clone())
        })
    }

    pub fn update_category(
        &self,
        menu_id: &str,
        category_id: &str,
        update: &CategoryUpdate,
    ) -> Result<Menu, MenuError> {
        self.modify_menu(menu_id, |_, menu| {
            if let Some(name) = &update.name {
                if menu
                    .categories
                    .iter()
                    .any(|c| c.id != category_id && &c.name == name)
                {
                    return Err(MenuError::DuplicateName(format!(
                        "category '{}' already exists in menu '{}'",
                        name, menu.name
                    )));
                }
            }

            let category = menu
                .category_mut(category_id)
                .ok_or_else(|| not_found("category", category_id))?;
            if let Some(name) = &update.name {
                category.name = name.clone();
            }
            if let Some(description) = &update.description {
                category.description = Some(description.clone());
            }
            if let Some(sort_order) = update.sort_order {
                category.sort_order = sort_order;
            }
            if let Some(is_active) = update.is_active {
                category.is_active = is_active;
            }
            Ok(menu.clone())
        })
    }

    pub fn remove_category(&self, menu_id: &str, category_id: &str) -> Result<Menu, MenuError> {
        self.modify_menu(menu_id, |_, menu| {
            let before = menu.categories.len();
            menu.categories.retain(|c| c.id != category_id);
            if menu.categories.len() == before {
                return Err(not_found("category", category_id));
            }
            Ok(menu.clone())
        })
    }

    pub fn add_item(
        &self,
        menu_id: &str,
        category_id: &str,
        mut item: MenuItem,
    ) -> Result<Menu, MenuError> {
        if item.id().is_empty() {
            item.set_id(new_id());
        }

        self.modify_menu(menu_id, move |_, menu| {
            let category = menu
                .category_mut(category_id)
                .ok_or_else(|| not_found("category", category_id))?;
            if category.items.iter().any(|i| i.name() == item.name()) {
                return Err(MenuError::DuplicateName(format!(
                    "item '{}' already exists in category '{}'",
                    item.name(),
                    category.name
                )));
            }
            category.items.push(item);
            Ok(menu.clone())
        })
    }

    pub fn update_item(
        &self,
        menu_id: &str,
        category_id: &str,
        item_id: &str,
        update: &ItemUpdate,
    ) -> Result<Menu, MenuError> {
        self.modify_menu(menu_id, |_, menu| {
            let category = menu
                .category_mut(category_id)
                .ok_or_else(|| not_found("category", category_id))?;

            let pos = category
                .items
                .iter()
                .position(|i| i.id() == item_id)
                .ok_or_else(|| not_found("item", item_id))?;

            if let Some(name) = &update.name {
                if category
                    .items
                    .iter()
                    .any(|i| i.id() != item_id && i.name() == name)
                {
                    return Err(MenuError::DuplicateName(format!(
                        "item '{}' already exists in category '{}'",
                        name, category.name
                    )));
                }
            }

            let updated = category.items[pos].apply(update)?;
            category.items[pos] = updated;

            Ok(menu.clone())
        })
    }

    pub fn remove_item(
        &self,
        menu_id: &str,
        category_id: &str,
        item_id: &str,
    ) -> Result<Menu, MenuError> {
        self.modify_menu(menu_id, |_, menu| {
            let category = menu
                .category_mut(category_id)
                .ok_or_else(|| not_found("category", category_id))?;
            let before = category.items.len();
            category.items.retain(|i| i.id() != item_id);
            if category.items.len() == before {
                return Err(not_found("item", item_id));
            }
            Ok(menu.clone())
        })
    }

    /// Adds `quantity` orders to an item; this is what popularity ranks on.
    pub fn record_order(
        &self,
        menu_id: &str,
        category_id: &str,
        item_id: &str,
        quantity: u64,
    ) -> Result<MenuItem, MenuError> {
        self.modify_menu(menu_id, |_, menu| {
            let item = menu
                .category_mut(category_id)
                .ok_or_else(|| not_found("category", category_id))?
                .items
                .iter_mut()
                .find(|i| i.id() == item_id)
                .ok_or_else(|| not_found("item", item_id))?;
            item.add_orders(quantity);
            Ok(item.clone())
        })
    }

    // read-modify-write of one menu document inside a transaction
    fn modify_menu<T, F>(&self, menu_id: &str, f: F) -> Result<T, MenuError>
    where
        F: FnOnce(&Connection, &mut Menu) -> Result<T, MenuError>,
    {
        let mut conn = self.connect()?;
        // take the write lock up front, a deferred read lock can't wait for it
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut menu = read_menu(&tx, menu_id)?;
        let out = f(&tx, &mut menu)?;

        tx.execute(
            "update menus set name = ?2, json_text = ?3, updated_at = ?4 where menu_id = ?1",
            params![
                menu_id,
                menu.name,
                serde_json::to_string(&menu)?,
                timestamp()
            ],
        )?;
        tx.commit()?;

        Ok(out)
    }
}

#[async_trait]
impl MenuStore for SqliteMenuStore {
    async fn menus_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Menu>, MenuError> {
        let restaurant_id = restaurant_id.to_string();
        self.blocking(move |store| store.load_menus(&restaurant_id))
            .await
    }
}

fn read_menu(conn: &Connection, menu_id: &str) -> Result<Menu, MenuError> {
    let json: Option<String> = conn
        .query_row(
            "select json_text from menus where menu_id = ?1",
            params![menu_id],
            |row| row.get(0),
        )
        .optional()?;

    match json {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Err(not_found("menu", menu_id)),
    }
}

fn menu_name_taken(
    conn: &Connection,
    restaurant_id: &str,
    name: &str,
    except_menu_id: Option<&str>,
) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "select count(*) from menus
            where restaurant_id = ?1 and name = ?2 and menu_id != ?3",
        params![restaurant_id, name, except_menu_id.unwrap_or_default()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn assign_ids(category: &mut MenuCategory) {
    if category.id.is_empty() {
        category.id = new_id();
    }
    for item in &mut category.items {
        if item.id().is_empty() {
            item.set_id(new_id());
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn not_found(kind: &str, id: &str) -> MenuError {
    MenuError::NotFound(format!("{} {}", kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rank_popular;
    use tempfile::TempDir;

    fn store() -> (TempDir, SqliteMenuStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteMenuStore::open(dir.path().join("menus.sqlite")).unwrap();
        (dir, store)
    }

    fn item(name: &str, price: f64) -> MenuItem {
        MenuItem::builder("", name).price(price).build().unwrap()
    }

    fn seeded() -> (TempDir, SqliteMenuStore, Menu) {
        let (dir, store) = store();
        let menu = store
            .create_menu(
                Menu::new("", "r1", "Main").with_categories(vec![MenuCategory::new(
                    "", "Mains", 1,
                )
                .with_items(vec![item("Pad Thai", 180.0), item("Green Curry", 200.0)])]),
            )
            .unwrap();
        (dir, store, menu)
    }

    #[test]
    fn create_menu_assigns_ids_and_rejects_duplicate_names() {
        let (_dir, store, menu) = seeded();
        assert!(!menu.id.is_empty());
        assert!(!menu.categories[0].id.is_empty());
        assert!(menu.categories[0].items.iter().all(|i| !i.id().is_empty()));

        let err = store.create_menu(Menu::new("", "r1", "Main")).unwrap_err();
        assert!(matches!(err, MenuError::DuplicateName(_)));

        // same name for another restaurant is fine
        assert!(store.create_menu(Menu::new("", "r2", "Main")).is_ok());
    }

    #[test]
    fn load_menus_keeps_insertion_order() {
        let (_dir, store) = store();
        store.create_menu(Menu::new("m-b", "r1", "Drinks")).unwrap();
        store.create_menu(Menu::new("m-a", "r1", "Food")).unwrap();

        let names: Vec<String> = store
            .load_menus("r1")
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Drinks", "Food"]);

        // updating a menu must not move it to the end
        store
            .update_menu(
                "m-b",
                &MenuUpdate {
                    description: Some("cold stuff".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let names: Vec<String> = store
            .load_menus("r1")
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Drinks", "Food"]);
    }

    #[test]
    fn renaming_menu_checks_uniqueness() {
        let (_dir, store) = store();
        store.create_menu(Menu::new("m1", "r1", "Lunch")).unwrap();
        store.create_menu(Menu::new("m2", "r1", "Dinner")).unwrap();

        let rename = MenuUpdate {
            name: Some("Lunch".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_menu("m2", &rename),
            Err(MenuError::DuplicateName(_))
        ));
        // renaming to its own name is not a conflict
        assert!(store.update_menu("m1", &rename).is_ok());
    }

    #[test]
    fn category_management() {
        let (_dir, store, menu) = seeded();

        let err = store
            .add_category(&menu.id, MenuCategory::new("", "Mains", 2))
            .unwrap_err();
        assert!(matches!(err, MenuError::DuplicateName(_)));

        let menu = store
            .add_category(&menu.id, MenuCategory::new("", "Desserts", 3))
            .unwrap();
        let desserts_id = menu.categories[1].id.clone();

        let menu = store
            .update_category(
                &menu.id,
                &desserts_id,
                &CategoryUpdate {
                    is_active: Some(false),
                    sort_order: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        let desserts = menu.category(&desserts_id).unwrap();
        assert!(!desserts.is_active);
        assert_eq!(desserts.sort_order, 0);

        let rename = CategoryUpdate {
            name: Some("Mains".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_category(&menu.id, &desserts_id, &rename),
            Err(MenuError::DuplicateName(_))
        ));

        let menu = store.remove_category(&menu.id, &desserts_id).unwrap();
        assert_eq!(menu.categories.len(), 1);
        assert!(matches!(
            store.remove_category(&menu.id, &desserts_id),
            Err(MenuError::NotFound(_))
        ));
    }

    #[test]
    fn item_management() {
        let (_dir, store, menu) = seeded();
        let category_id = menu.categories[0].id.clone();

        let err = store
            .add_item(&menu.id, &category_id, item("Pad Thai", 1.0))
            .unwrap_err();
        assert!(matches!(err, MenuError::DuplicateName(_)));

        let menu = store
            .add_item(&menu.id, &category_id, item("Massaman", 220.0))
            .unwrap();
        let massaman_id = menu.categories[0].items[2].id().to_string();

        let bad = ItemUpdate {
            spicy_level: Some(7),
            ..Default::default()
        };
        assert!(matches!(
            store.update_item(&menu.id, &category_id, &massaman_id, &bad),
            Err(MenuError::InvalidItem(_))
        ));

        let sold_out = ItemUpdate {
            is_available: Some(false),
            ..Default::default()
        };
        let menu = store
            .update_item(&menu.id, &category_id, &massaman_id, &sold_out)
            .unwrap();
        assert!(!menu.categories[0].items[2].is_available());

        let menu = store
            .remove_item(&menu.id, &category_id, &massaman_id)
            .unwrap();
        assert_eq!(menu.categories[0].items.len(), 2);

        assert!(matches!(
            store.add_item("missing", &category_id, item("X", 1.0)),
            Err(MenuError::NotFound(_))
        ));
    }

    #[test]
    fn renaming_unknown_item_is_not_found() {
        let (_dir, store, menu) = seeded();
        let category_id = menu.categories[0].id.clone();

        // "Pad Thai" exists, but the item to rename doesn't
        let rename = ItemUpdate {
            name: Some("Pad Thai".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_item(&menu.id, &category_id, "no-such-item", &rename),
            Err(MenuError::NotFound(_))
        ));

        let curry_id = menu.categories[0].items[1].id().to_string();
        assert!(matches!(
            store.update_item(&menu.id, &category_id, &curry_id, &rename),
            Err(MenuError::DuplicateName(_))
        ));
    }

    #[tokio::test]
    async fn get_and_remove_menu() {
        let (_dir, store, menu) = seeded();
        store.create_menu(Menu::new("", "r1", "Drinks")).unwrap();

        let fetched = store.get_menu(&menu.id).unwrap();
        assert_eq!(fetched, menu);
        assert!(matches!(
            store.get_menu("missing"),
            Err(MenuError::NotFound(_))
        ));

        store.remove_menu(&menu.id).unwrap();
        let names: Vec<String> = store
            .menus_by_restaurant("r1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Drinks"]);

        assert!(matches!(
            store.remove_menu(&menu.id),
            Err(MenuError::NotFound(_))
        ));
        assert!(matches!(
            store.get_menu(&menu.id),
            Err(MenuError::NotFound(_))
        ));
    }

    #[test]
    fn recorded_orders_change_popularity() {
        let (_dir, store, menu) = seeded();
        let category_id = menu.categories[0].id.clone();
        let curry_id = menu.categories[0].items[1].id().to_string();

        let curry = store
            .record_order(&menu.id, &category_id, &curry_id, 3)
            .unwrap();
        assert_eq!(curry.order_count(), 3);

        let top = rank_popular(&store.load_menus("r1").unwrap(), 1).unwrap();
        assert_eq!(top[0].item.name(), "Green Curry");
    }

    #[test]
    fn replace_restaurant_menus_swaps_snapshot() {
        let (_dir, store, _menu) = seeded();
        store.create_menu(Menu::new("other", "r2", "Other")).unwrap();

        store
            .replace_restaurant_menus("r1", &[Menu::new("fresh", "r1", "Brunch")])
            .unwrap();

        let menus = store.load_menus("r1").unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].name, "Brunch");
        assert_eq!(store.load_menus("r2").unwrap().len(), 1);
    }

    #[test]
    fn restaurants_roundtrip() {
        let (_dir, store) = store();
        let restaurants = vec![
            Restaurant {
                id: "r2".into(),
                name: "Italian Corner".into(),
                address: "Silom".into(),
                is_active: true,
            },
            Restaurant {
                id: "r1".into(),
                name: "Bangkok Street Food".into(),
                address: "Sukhumvit".into(),
                is_active: true,
            },
        ];
        store.upsert_restaurants(&restaurants).unwrap();
        store.upsert_restaurants(&restaurants[..1]).unwrap();

        let loaded = store.get_restaurants().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "r1");
    }

    #[tokio::test]
    async fn serves_as_menu_store() {
        let (_dir, store, _menu) = seeded();
        let menus = store.menus_by_restaurant("r1").await.unwrap();
        assert_eq!(menus[0].categories[0].items.len(), 2);
        assert!(store.menus_by_restaurant("nobody").await.unwrap().is_empty());
    }
}
