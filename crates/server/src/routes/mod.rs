use axum::Router;

use crate::AppState;

pub mod account;
pub mod assistant;
pub mod background_removal;
pub mod color_palettes;
pub mod health;
pub mod links;
pub mod media_insights;
pub mod nylon_fabric_designs;
pub mod portfolio;

#[cfg(test)]
mod tests;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router(state))
        .merge(portfolio::router(state))
        .merge(links::router(state))
        .merge(background_removal::router(state))
        .merge(color_palettes::router(state))
        .merge(nylon_fabric_designs::router(state))
        .merge(account::router(state))
        .merge(assistant::router(state))
        .merge(media_insights::router(state))
}
