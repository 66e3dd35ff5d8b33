pub mod account_items;
pub mod ai_client;
pub mod analysis_cache;
pub mod chat_assistant;
pub mod chat_payload;
pub mod clock;
pub mod local_stores;
pub mod media_insight;
pub mod portfolio_import;
