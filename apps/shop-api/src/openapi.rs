//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the Shop API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop API",
        version = "0.1.0",
        description = "Conversational hybrid product search over the catalog",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_assistant::ApiDoc)
    ),
    tags(
        (name = "assistant", description = "Shopping assistant chat and query synthesis")
    )
)]
pub struct ApiDoc;
