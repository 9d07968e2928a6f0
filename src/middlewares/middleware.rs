// src/middlewares/middleware.rs

use crate::middlewares::logging;
use axum::{middleware, Router};

// Applies the application's global middleware stack to a router.
// Layers are applied from the outside in.
pub fn stack(router: Router) -> Router {
    router.layer(middleware::from_fn(logging::handler))
}
