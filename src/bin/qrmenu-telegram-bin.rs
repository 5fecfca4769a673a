use qrmenu_telegram_rs::bot_command_handlers::{
    change_restaurant, help, menu_cmd, popular_cmd, search_cmd, start, text_search,
};
use qrmenu_telegram_rs::constants::{DEFAULT_DB, DEFAULT_REFRESH_MINUTES, TASK_SCHED_TARGET};
use qrmenu_telegram_rs::data_backend::{
    demo_data::demo_store, CachedMenuStore, MenuStore, RemoteMenuStore, SqliteMenuStore,
};
use qrmenu_telegram_rs::data_types::{Command, HandlerResult, Restaurant};
use qrmenu_telegram_rs::db_operations::RegistrationDb;
use qrmenu_telegram_rs::engine::{MenuSearchEngine, SharedEngine};
use qrmenu_telegram_rs::shared_main::{callback_handler, logger_init};
use qrmenu_telegram_rs::task_scheduler_funcs::start_menu_refresh_job;

use anyhow::{bail, Result};
use clap::Parser;
use log::log_enabled;
use std::{path::PathBuf, sync::Arc};
use teloxide::{dispatching::UpdateHandler, prelude::*};
use tokio_cron_scheduler::JobScheduler;

/// Telegram bot to browse and search restaurant menus.
/// {n}Without a menu API the bundled demo restaurants are served.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The telegram bot token to be used
    #[arg(short, long, env = "TELOXIDE_TOKEN")]
    token: String,
    /// Base URL of the menu REST API{n}Example: <http://127.0.0.1:3000/api>
    #[arg(long, env = "QRMENU_API_URL")]
    api_url: Option<String>,
    /// SQLite file for chat registrations and the offline menu cache
    #[arg(long, env = "QRMENU_DB", default_value = DEFAULT_DB)]
    db: PathBuf,
    /// Minutes between menu cache refreshes
    #[arg(long, default_value_t = DEFAULT_REFRESH_MINUTES)]
    refresh_minutes: u64,
    /// Enable verbose logging (mostly performance metrics)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    //// Args setup
    let args = Args::parse();

    logger_init(module_path!(), args.verbose);
    log::info!("Starting bot...");

    if !(log_enabled!(log::Level::Debug) || log_enabled!(log::Level::Trace)) {
        log::info!("Enable verbose logging for performance metrics");
    }

    //// DB setup
    let registrations = RegistrationDb::open(&args.db)?;
    log::info!("{} chats registered", registrations.count_registrations()?);
    let sched = JobScheduler::new().await?;

    let (restaurants, store): (Vec<Restaurant>, Arc<dyn MenuStore>) = match &args.api_url {
        Some(api_url) => {
            let remote = RemoteMenuStore::new(api_url)?;
            let cache = SqliteMenuStore::open(&args.db)?;
            let restaurants = load_restaurants(&remote, &cache).await?;

            let cached = Arc::new(CachedMenuStore::new(remote, cache));
            let restaurant_ids: Vec<String> = restaurants.iter().map(|r| r.id.clone()).collect();

            // always update cache on startup
            log::info!(target: TASK_SCHED_TARGET, "Updating menu cache...");
            cached.refresh(&restaurant_ids).await;

            start_menu_refresh_job(
                &sched,
                Arc::clone(&cached),
                restaurant_ids,
                args.refresh_minutes,
            )
            .await?;

            let store: Arc<dyn MenuStore> = cached;
            (restaurants, store)
        }
        None => {
            log::warn!("No menu API configured, serving demo restaurants");
            let (restaurants, demo) = demo_store()?;
            let store: Arc<dyn MenuStore> = Arc::new(demo);
            (restaurants, store)
        }
    };
    log::info!("Serving {} restaurants", restaurants.len());

    log::info!("Starting task scheduler...");
    sched.start().await?;

    let engine: SharedEngine = MenuSearchEngine::new(store);
    let bot = Bot::new(args.token);

    let command_handler_deps = dptree::deps![Arc::new(restaurants), registrations, engine];
    Dispatcher::builder(bot, schema())
        .dependencies(command_handler_deps)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Restaurant list from the API, mirrored into SQLite; the mirror is used when the API is down.
async fn load_restaurants(
    remote: &RemoteMenuStore,
    cache: &SqliteMenuStore,
) -> Result<Vec<Restaurant>> {
    let restaurants = match remote.get_restaurants().await {
        Ok(restaurants) => {
            cache.upsert_restaurants(&restaurants)?;
            restaurants
        }
        Err(e) => {
            log::error!("Fetching restaurants failed: {}, using cached list", e);
            cache.get_restaurants()?
        }
    };

    let active: Vec<Restaurant> = restaurants.into_iter().filter(|r| r.is_active).collect();
    if active.is_empty() {
        bail!("no restaurants available, neither from the API nor from the cache");
    }
    Ok(active)
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(dptree::case![Command::Start].endpoint(start))
        .branch(dptree::case![Command::Search(args)].endpoint(search_cmd))
        .branch(dptree::case![Command::Popular(args)].endpoint(popular_cmd))
        .branch(dptree::case![Command::Menu].endpoint(menu_cmd))
        .branch(dptree::case![Command::Restaurant].endpoint(change_restaurant))
        .branch(dptree::case![Command::Help].endpoint(help));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(Message::filter_text().endpoint(text_search))
        .branch(dptree::endpoint(invalid_msg));

    let callback_query_handler = Update::filter_callback_query().endpoint(callback_handler);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_query_handler)
}

async fn invalid_msg(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Send a dish name or a command, see /help")
        .await?;
    Ok(())
}
