pub mod bot_command_handlers;
pub mod constants;
pub mod data_backend;
pub mod data_types;
pub mod db_operations;
pub mod engine;
pub mod errors;
pub mod message_builder;
pub mod query_parser;
pub mod shared_main;
pub mod task_scheduler_funcs;
