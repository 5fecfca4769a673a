use std::{env, sync::Arc};

use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
    utils::{command::BotCommands, markdown},
};
use teloxide_core::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::{
    data_types::{Command, HandlerResult, Restaurant, RestaurantKeyboardAction},
    db_operations::RegistrationDb,
};

pub fn logger_init(module_path: &str, verbose: bool) {
    let debug_requested = verbose
        || env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default()
            == "debug";

    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module(
            module_path,
            if debug_requested {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

pub fn make_restaurant_keyboard(
    restaurants: &[Restaurant],
    action: RestaurantKeyboardAction,
) -> InlineKeyboardMarkup {
    let mut keyboard = Vec::new();

    for restaurant in restaurants.iter().filter(|r| r.is_active) {
        keyboard.push([InlineKeyboardButton::callback(
            &restaurant.name,
            format!("{}:{}", action.callback_prefix(), restaurant.id),
        )]);
    }
    InlineKeyboardMarkup::new(keyboard)
}

pub fn make_commands_keyrow() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new("/popular"), KeyboardButton::new("/menu")],
        vec![
            KeyboardButton::new("/restaurant"),
            KeyboardButton::new("/help"),
        ],
    ];
    KeyboardMarkup::new(keyboard).resize_keyboard()
}

/// Restaurant a chat has picked, if any.
///
/// A registration pointing at a restaurant that vanished from the list still
/// works; the id is used as display name.
pub fn registered_restaurant(
    db: &RegistrationDb,
    restaurants: &[Restaurant],
    chat_id: i64,
) -> rusqlite::Result<Option<Restaurant>> {
    let Some(registration) = db.get_registration(chat_id)? else {
        return Ok(None);
    };

    Ok(Some(
        restaurants
            .iter()
            .find(|r| r.id == registration.restaurant_id)
            .cloned()
            .unwrap_or_else(|| Restaurant {
                id: registration.restaurant_id.clone(),
                name: registration.restaurant_id,
                address: String::new(),
                is_active: true,
            }),
    ))
}

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    restaurants: Arc<Vec<Restaurant>>,
    db: RegistrationDb,
) -> HandlerResult {
    if let Some(q_data) = q.data {
        // acknowledge callback query to remove the loading alert
        bot.answer_callback_query(q.id).await?;

        if let Some(message) = q.message {
            let id = message.id();
            let chat = message.chat();

            let Some((cmd, arg)) = q_data.split_once(':') else {
                log::warn!("Malformed callback data: {}", q_data);
                return Ok(());
            };

            let Some(restaurant) = restaurants.iter().find(|r| r.id == arg) else {
                bot.send_message(chat.id, "This restaurant is not available anymore.")
                    .await?;
                return Ok(());
            };

            db.set_restaurant(chat.id.0, &restaurant.id)?;
            log::info!("{} 📌 to {}", chat.id.0, restaurant.name);

            // replace restaurant selection message with selected restaurant
            bot.edit_message_text(
                chat.id,
                id,
                format!(
                    "Restaurant: {}",
                    markdown::bold(&markdown::escape(&restaurant.name))
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;

            match cmd {
                "r_regist" => {
                    bot.send_message(chat.id, Command::descriptions().to_string())
                        .reply_markup(make_commands_keyrow())
                        .await?;
                }
                "r_upd" => {
                    bot.send_message(chat.id, "Try /popular or just send a dish name.")
                        .await?;
                }
                _ => log::warn!("Unknown callback query command: {}", cmd),
            }
        }
    }

    Ok(())
}
