pub mod essay;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /essays/{origin}/{id}/annotations            list, create, clear_all
/// /essays/{origin}/{id}/annotations/{ann_id}   delete
/// /essays/{origin}/{id}/corrections/{slot}     get, atomic save
/// /essays/{origin}/{id}/status                 derived essay state + grade
/// /essays/{origin}/{id}/render                 request render, check status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/essays", essay::router())
}
