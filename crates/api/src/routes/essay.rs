//! Route definitions for the essay markup and correction workflow.
//!
//! All routes are scoped by `{origin}/{id}`: the origin tag and essay id
//! together identify the essay.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{annotation, correction, render};
use crate::state::AppState;

/// Essay-scoped routes, nested under `/essays`.
///
/// ```text
/// GET    /{origin}/{id}/annotations            list_annotations
/// POST   /{origin}/{id}/annotations            create_annotation
/// DELETE /{origin}/{id}/annotations            clear_annotations
/// DELETE /{origin}/{id}/annotations/{ann_id}   delete_annotation
/// GET    /{origin}/{id}/corrections/{slot}     get_correction
/// PUT    /{origin}/{id}/corrections/{slot}     save_correction
/// GET    /{origin}/{id}/status                 essay_status
/// POST   /{origin}/{id}/render                 request_render
/// GET    /{origin}/{id}/render                 check_render
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{origin}/{id}/annotations",
            get(annotation::list_annotations)
                .post(annotation::create_annotation)
                .delete(annotation::clear_annotations),
        )
        .route(
            "/{origin}/{id}/annotations/{ann_id}",
            delete(annotation::delete_annotation),
        )
        .route(
            "/{origin}/{id}/corrections/{slot}",
            get(correction::get_correction).put(correction::save_correction),
        )
        .route("/{origin}/{id}/status", get(correction::essay_status))
        .route(
            "/{origin}/{id}/render",
            get(render::check_render).post(render::request_render),
        )
}
