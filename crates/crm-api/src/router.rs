//! Wires one model's handlers into an `axum::Router`, mounted by the caller
//! under whatever path prefix it chooses (the original nailed the prefix to
//! `Model.__route__`; here the caller decides, e.g. via `.nest()`).
//!
//! Route registration order doesn't matter for `/fields` vs `/:id` the way
//! it did for the FastAPI original — axum's router matches static segments
//! ahead of dynamic params regardless of declaration order.

use crate::handlers::{create, default_values, delete, fields, get, many2many, search, update};
use crate::state::CrudState;
use axum::routing::{delete as delete_method, get as get_method, post, put};
use axum::Router;
use crm_orm::Model;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn crud_router<M: Model>(state: CrudState<M>) -> Router {
    Router::new()
        .route("/fields", get_method(fields::fields::<M>))
        .route("/search", post(search::search::<M>))
        .route("/search_many2many", get_method(many2many::search_many2many::<M>))
        .route("/default_values", post(default_values::default_values::<M>))
        .route("/bulk", delete_method(delete::delete_bulk::<M>))
        .route("/", post(create::create::<M>))
        .route(
            "/:id",
            post(get::get::<M>).put(update::update::<M>).delete(delete::delete::<M>),
        )
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
            ),
        )
        .with_state(state)
}
