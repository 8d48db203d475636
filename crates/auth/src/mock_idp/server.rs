//! Mock IdP server.
//!
//! Simulates the Google and Apple authorization endpoints. Google answers
//! with a query-string redirect, Apple with an auto-submitting `form_post`.

use std::net::SocketAddr;

use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use signup_core::auth::OidcProvider;
use signup_core::forms::deserialize_optional_string;
use tokio::net::TcpListener;

use super::templates::{render, FormPostPage, LoginPage};
use crate::providers::MockProvider;

#[derive(Deserialize)]
struct AuthorizeQuery {
    state: String,
    redirect_uri: String,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    name: Option<String>,
    state: String,
    redirect_uri: String,
    provider: OidcProvider,
    /// Present when the "Cancel" button was used.
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    cancel: Option<String>,
}

/// Mock IdP server that simulates OIDC authorization endpoints.
pub struct MockIdpServer {
    port: u16,
}

impl MockIdpServer {
    /// Create a new Mock IdP server.
    ///
    /// # Arguments
    /// * `port` - The port to listen on (typically 3001)
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Routes:
    /// - `GET /{provider}/authorize` - login page
    /// - `POST /authorize/submit` - form submission handler
    pub fn router() -> Router {
        Router::new()
            .route("/{provider}/authorize", get(authorize))
            .route("/authorize/submit", post(authorize_submit))
    }

    /// Run the Mock IdP server until the listener fails.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        tracing::info!("Mock IdP server listening on http://{}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, Self::router()).await
    }
}

async fn authorize(
    Path(provider): Path<OidcProvider>,
    Query(params): Query<AuthorizeQuery>,
) -> Response {
    render(LoginPage {
        provider,
        provider_name: provider.label(),
        state: &params.state,
        redirect_uri: &params.redirect_uri,
    })
}

async fn authorize_submit(Form(form): Form<LoginForm>) -> Response {
    let mut fields: Vec<(&str, String)> = vec![("state", form.state.clone())];

    if form.cancel.is_some() {
        fields.push(("error", "access_denied".to_string()));
        fields.push((
            "error_description",
            "The user cancelled the sign-in".to_string(),
        ));
    } else {
        let email = form
            .email
            .clone()
            .unwrap_or_else(|| "dev@example.com".to_string());
        let code = MockProvider::encode_code(
            form.provider,
            &format!("mock-{}-{}", form.provider, email),
            Some(&email),
            form.name.as_deref(),
        );
        fields.push(("code", code));

        // Apple only sends the name in the form body, as a JSON blob.
        if form.provider == OidcProvider::Apple {
            if let Some(name) = form.name.as_deref() {
                let (first, last) = name.split_once(' ').unwrap_or((name, ""));
                fields.push((
                    "user",
                    serde_json::json!({ "name": { "firstName": first, "lastName": last } })
                        .to_string(),
                ));
            }
        }
    }

    match form.provider {
        OidcProvider::Apple => render(FormPostPage {
            redirect_uri: &form.redirect_uri,
            fields: &fields,
        }),
        OidcProvider::Google => {
            let query = fields
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            Redirect::to(&format!("{}?{}", form.redirect_uri, query)).into_response()
        }
    }
}
