//! Route modules, one per resource, merged into a single `AppState` router.

pub mod health;
pub mod hyperedge;
pub mod intake;
pub mod matching;
pub mod research;
pub mod signal;
pub mod worldmodel;

use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::state::AppState;

#[cfg(feature = "openapi")]
async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::openapi::ApiDoc::openapi())
}

/// Builds the full router: the nine domain routes (spec §9) plus health
/// probes, merged against one `AppState`, with the OpenAPI document and
/// Swagger UI layered on when their features are enabled.
pub fn create_api_router() -> Router<AppState> {
    let mut router = Router::new()
        .merge(health::create_router())
        .merge(research::create_router())
        .merge(worldmodel::create_router())
        .merge(matching::create_router())
        .merge(hyperedge::create_router())
        .merge(intake::create_router())
        .merge(signal::create_router());

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/openapi.json", crate::openapi::ApiDoc::openapi()),
        );
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds_without_panicking() {
        let _: Router<AppState> = create_api_router();
    }
}
