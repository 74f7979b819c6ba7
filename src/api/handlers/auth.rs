use crate::{
    api::{
        handlers::{client_address, ensure_host},
        AppState,
    },
    forward_auth::{Decision, Verdict},
};
use axum::{
    extract::Extension,
    http::{header::WWW_AUTHENTICATE, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Forward-auth subrequest from the reverse proxy.
#[utoipa::path(
    get,
    path = "/{path}",
    params(
        ("path" = String, Path, description = "Any path, every path runs the same check")
    ),
    responses(
        (status = 200, description = "Authenticated, identity in Remote-User, Remote-Groups, Remote-Name and Remote-Email"),
        (status = 401, description = "Not authenticated, carries a Basic challenge"),
        (status = 500, description = "Identity provider unreachable or out of contract"),
    ),
    tag = "forward-auth",
)]
#[instrument(skip_all, fields(client = client_address(&headers)))]
pub async fn authenticate(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    mut headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let client = client_address(&headers).to_string();
    debug!("User {} connected", client);

    ensure_host(&mut headers, &uri);

    let inbound: Vec<Cookie<'static>> = jar.iter().cloned().collect();

    let Verdict {
        decision,
        headers: identity,
        cookies,
    } = state.forward_auth.decide(&headers, inbound).await;

    let jar = cookies
        .into_iter()
        .fold(CookieJar::new(), |jar, cookie| jar.add(cookie));

    match decision {
        Decision::Allow => {
            info!(client = %client, decision = decision.label(), "Access granted");
            (StatusCode::OK, identity, jar).into_response()
        }

        Decision::Deny => {
            info!(client = %client, decision = decision.label(), "Access denied");
            (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, state.challenge.clone())],
                jar,
            )
                .into_response()
        }

        Decision::Error(ref err) => {
            error!(
                client = %client,
                decision = decision.label(),
                kind = err.kind(),
                endpoint = %err.endpoint(),
                "Identity provider failure: {}",
                err
            );
            (StatusCode::INTERNAL_SERVER_ERROR, jar).into_response()
        }
    }
}
