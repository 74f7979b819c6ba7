use crate::api::handlers::auth;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(auth::authenticate),
    tags(
        (name = "forward-auth", description = "Reverse proxy authentication subrequests")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::openapi;

    #[test]
    fn documents_forward_auth_path() {
        let doc = openapi();
        assert!(doc.paths.paths.contains_key("/{path}"));
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
    }
}
