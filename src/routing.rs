//! Application router configuration.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState, Error, endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, export_report_endpoint,
        list_expenses_endpoint,
    },
    logging::logging_middleware,
    register_user::register_user,
};

/// Return a router with all the app's routes.
///
/// The expense routes read the signed-in user from an `Extension<UserID>`,
/// which the authentication layer of the embedding server must insert.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE_REPORT, get(export_report_endpoint))
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state);

    add_tracing_layer(router)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
