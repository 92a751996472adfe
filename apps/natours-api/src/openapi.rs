//! OpenAPI documentation

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Natours API",
        version = "0.1.0",
        description = "Tours, users, reviews and bookings",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    nest(
        (path = "/api/v1/tours", api = domain_tours::handlers::ApiDoc),
        (path = "/api/v1/users", api = domain_users::handlers::ApiDoc),
        (path = "/api/v1/reviews", api = domain_reviews::handlers::ApiDoc),
        (path = "/api/v1/bookings", api = domain_bookings::handlers::ApiDoc)
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// JWT bearer scheme referenced by the protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
