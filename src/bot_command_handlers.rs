use std::{sync::Arc, time::Instant};
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands};

use crate::{
    constants::NO_DB_MSG,
    data_types::{Command, HandlerResult, QuerySpec, Restaurant, RestaurantKeyboardAction},
    db_operations::RegistrationDb,
    engine::SharedEngine,
    message_builder::{build_entries_msg, build_error_msg, describe_query, ListingKind},
    query_parser::{parse_popular_limit, parse_search_args},
    shared_main::{make_restaurant_keyboard, registered_restaurant},
};

pub async fn start(bot: Bot, msg: Message, restaurants: Arc<Vec<Restaurant>>) -> HandlerResult {
    let keyboard = make_restaurant_keyboard(&restaurants, RestaurantKeyboardAction::Register);
    bot.send_message(msg.chat.id, "Pick a restaurant:")
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

pub async fn change_restaurant(
    bot: Bot,
    msg: Message,
    restaurants: Arc<Vec<Restaurant>>,
) -> HandlerResult {
    let keyboard = make_restaurant_keyboard(&restaurants, RestaurantKeyboardAction::Update);
    bot.send_message(msg.chat.id, "Pick another restaurant:")
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

pub async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

pub async fn search_cmd(
    bot: Bot,
    msg: Message,
    args: String,
    engine: SharedEngine,
    db: RegistrationDb,
    restaurants: Arc<Vec<Restaurant>>,
) -> HandlerResult {
    let spec = parse_search_args(&args);
    send_listing(&bot, &msg, &engine, &db, &restaurants, spec, ListingKind::Search).await
}

pub async fn menu_cmd(
    bot: Bot,
    msg: Message,
    engine: SharedEngine,
    db: RegistrationDb,
    restaurants: Arc<Vec<Restaurant>>,
) -> HandlerResult {
    send_listing(
        &bot,
        &msg,
        &engine,
        &db,
        &restaurants,
        QuerySpec::new(),
        ListingKind::FullMenu,
    )
    .await
}

/// Plain text messages are treated as a search.
pub async fn text_search(
    bot: Bot,
    msg: Message,
    text: String,
    engine: SharedEngine,
    db: RegistrationDb,
    restaurants: Arc<Vec<Restaurant>>,
) -> HandlerResult {
    if text.starts_with('/') {
        bot.send_message(msg.chat.id, "Unknown command, see /help")
            .await?;
        return Ok(());
    }
    let spec = parse_search_args(&text);
    send_listing(&bot, &msg, &engine, &db, &restaurants, spec, ListingKind::Search).await
}

pub async fn popular_cmd(
    bot: Bot,
    msg: Message,
    args: String,
    engine: SharedEngine,
    db: RegistrationDb,
    restaurants: Arc<Vec<Restaurant>>,
) -> HandlerResult {
    let Some(restaurant) = registered_restaurant(&db, &restaurants, msg.chat.id.0)? else {
        bot.send_message(msg.chat.id, NO_DB_MSG).await?;
        return Ok(());
    };

    let Some(limit) = parse_popular_limit(&args) else {
        bot.send_message(msg.chat.id, "Usage: /popular [count], e.g. /popular 5")
            .await?;
        return Ok(());
    };

    let now = Instant::now();
    let text = match engine.get_popular_items(&restaurant.id, limit).await {
        Ok(entries) => build_entries_msg(
            &restaurant.name,
            &format!("top {}", entries.len()),
            &entries,
            ListingKind::Popular,
        ),
        Err(e) => {
            log::warn!("popular items for {} failed: {}", restaurant.id, e);
            build_error_msg(&e)
        }
    };
    log::debug!("Build popular msg: {:.2?}", now.elapsed());

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    Ok(())
}

async fn send_listing(
    bot: &Bot,
    msg: &Message,
    engine: &SharedEngine,
    db: &RegistrationDb,
    restaurants: &[Restaurant],
    spec: QuerySpec,
    kind: ListingKind,
) -> HandlerResult {
    // chats without a registration (fresh chat or wiped db) get sent to the picker
    let Some(restaurant) = registered_restaurant(db, restaurants, msg.chat.id.0)? else {
        bot.send_message(msg.chat.id, NO_DB_MSG).await?;
        return Ok(());
    };

    let now = Instant::now();
    let text = match engine.search_menu_items(&restaurant.id, &spec).await {
        Ok(entries) => {
            let subtitle = match kind {
                ListingKind::FullMenu => String::new(),
                _ => describe_query(&spec),
            };
            build_entries_msg(&restaurant.name, &subtitle, &entries, kind)
        }
        Err(e) => {
            log::warn!("search in {} failed: {}", restaurant.id, e);
            build_error_msg(&e)
        }
    };
    log::debug!("Build {:?} msg: {:.2?}", kind, now.elapsed());
    let now = Instant::now();

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    log::debug!("Send {:?} msg: {:.2?}", kind, now.elapsed());

    Ok(())
}
