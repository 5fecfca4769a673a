pub mod menu_data_types;
pub mod query_data_types;

pub use menu_data_types::{
    CategoryUpdate, ItemUpdate, Menu, MenuCategory, MenuEntry, MenuItem, MenuItemBuilder,
    MenuUpdate, Restaurant,
};
pub use query_data_types::QuerySpec;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "search the menu\n  e.g. /search curry #vegan <200 @mains")]
    Search(String),
    #[command(description = "most ordered dishes, e.g. /popular 5")]
    Popular(String),
    #[command(description = "full menu")]
    Menu,
    #[command(description = "pick another restaurant\n")]
    Restaurant,
    #[command(description = "show this help")]
    Help,
    #[command(hide)]
    Start,
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub enum RestaurantKeyboardAction {
    Register,
    Update,
}

impl RestaurantKeyboardAction {
    pub fn callback_prefix(&self) -> &'static str {
        match self {
            RestaurantKeyboardAction::Register => "r_regist",
            RestaurantKeyboardAction::Update => "r_upd",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationEntry {
    pub chat_id: i64,
    pub restaurant_id: String,
}
