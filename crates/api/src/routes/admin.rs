//! Route definitions for `/admin`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admin_vehicles, auth, csv_import, photos};
use crate::state::AppState;

/// Routes mounted at `/admin`. Everything except `/login` requires the
/// `x-admin-token` header.
///
/// ```text
/// POST   /login                                   -> login (public)
/// GET    /vehicles                                -> list
/// POST   /vehicles                                -> create
/// POST   /vehicles/import-csv?dry_run=            -> import_csv (multipart `file`)
/// GET    /vehicles/csv-template                   -> csv_template
/// GET    /vehicles/{id}                           -> get_by_id
/// PATCH  /vehicles/{id}                           -> update
/// DELETE /vehicles/{id}                           -> delete
/// POST   /vehicles/{id}/photos                    -> upload (multipart `files`)
/// DELETE /vehicles/{id}/photos/{photo_id}         -> delete photo
/// POST   /vehicles/{id}/photos/{photo_id}/primary -> make_primary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route(
            "/vehicles",
            get(admin_vehicles::list).post(admin_vehicles::create),
        )
        .route(
            "/vehicles/import-csv",
            post(csv_import::import_csv)
                .layer(DefaultBodyLimit::max(csv_import::IMPORT_BODY_LIMIT)),
        )
        .route("/vehicles/csv-template", get(csv_import::csv_template))
        .route(
            "/vehicles/{id}",
            get(admin_vehicles::get_by_id)
                .patch(admin_vehicles::update)
                .delete(admin_vehicles::delete),
        )
        .route(
            "/vehicles/{id}/photos",
            post(photos::upload).layer(DefaultBodyLimit::max(photos::UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/vehicles/{id}/photos/{photo_id}",
            axum::routing::delete(photos::delete),
        )
        .route(
            "/vehicles/{id}/photos/{photo_id}/primary",
            post(photos::make_primary),
        )
}
