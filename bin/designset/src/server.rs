//! HTTP server: JSON render API, previews and static design-set files.

use std::{fmt::Write, path::Path, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{self, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use designset_core::Settings;
use designset_render::{
    DesignSet, FetchOptions, RenderError, RenderRequest, Renderer, archive, discover_local,
    filters::escape_html, load_static,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    settings: Settings,
    renderer: Renderer,
    fetch: FetchOptions,
}

impl AppState {
    /// Build state from settings.
    pub fn new(settings: Settings) -> designset_render::Result<Self> {
        let renderer = Renderer::from_settings(&settings.render)?;
        let fetch = FetchOptions::from(&settings.remote);
        Ok(Self {
            inner: Arc::new(Shared {
                settings,
                renderer,
                fetch,
            }),
        })
    }

    /// Loaded settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    fn root(&self) -> &Path {
        &self.inner.settings.designsets.root
    }

    fn renderer(&self) -> &Renderer {
        &self.inner.renderer
    }

    fn local_design_sets(&self) -> Vec<String> {
        discover_local(self.root(), &self.inner.settings.designsets.prefix)
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(
            "/api/render",
            post(render_handler).fallback(method_not_allowed),
        )
        .route("/designsets/{designset}/{*path}", get(static_handler))
        .route("/preview/{designset}/{template}", get(preview_handler))
        .route("/context/{designset}", get(context_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render API request body.
#[derive(Debug, Default, Deserialize)]
pub struct RenderPayload {
    /// Local design-set folder; defaults to the first one found.
    pub designset: Option<String>,
    /// Template file name under `standard/html/`.
    pub template: Option<String>,
    /// Data deep-merged over the page context.
    pub data: Option<Value>,
    /// Remote archive URL; when present `designset` is ignored.
    pub cdar_url: Option<String>,
    /// Inline stylesheets and scripts. Defaults to on for archives.
    pub inline: Option<bool>,
}

/// Render API response body.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    /// Rendered page.
    Ok { page: String },
    /// Failure with its HTTP status code.
    Fail { reason: String, reason_code: u16 },
}

/// A failed API call, sent as the `fail` envelope.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    reason: String,
}

impl ApiFailure {
    fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

impl From<RenderError> for ApiFailure {
    fn from(err: RenderError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), reason = %self.reason, "render request failed");
        } else {
            warn!(status = self.status.as_u16(), reason = %self.reason, "render request rejected");
        }

        let body = ApiResponse::Fail {
            reason: self.reason,
            reason_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

async fn method_not_allowed() -> ApiFailure {
    ApiFailure::new(StatusCode::METHOD_NOT_ALLOWED, "use the POST method")
}

async fn render_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiFailure> {
    let payload: RenderPayload = serde_json::from_slice(&body).map_err(|e| {
        ApiFailure::new(StatusCode::BAD_REQUEST, format!("invalid JSON request: {e}"))
    })?;

    let template = payload
        .template
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| RenderError::validation("parameter \"template\" is required"))?;

    let overrides = match payload.data {
        None | Some(Value::Null) => Value::Null,
        Some(data @ Value::Object(_)) => data,
        Some(_) => {
            return Err(RenderError::validation("parameter \"data\" must be an object").into());
        }
    };

    let remote_url = payload.cdar_url.filter(|url| !url.trim().is_empty());
    let request = RenderRequest::new(template)
        .with_overrides(overrides)
        .with_inline_assets(payload.inline.unwrap_or(remote_url.is_some()));

    let page = match remote_url {
        Some(url) => {
            info!(url = %url, template = %request.template, "render request for remote archive");
            let bytes = archive::fetch(&url, &state.inner.fetch)
                .await
                .map_err(|e| RenderError::from(e).remote())?;
            run_blocking(move || {
                let files =
                    archive::expand(&bytes).map_err(|e| RenderError::from(e).remote())?;
                let design_set = DesignSet::from_archive(files);
                state.renderer().render_archive(&design_set, &request)
            })
            .await?
        }
        None => {
            let name = match payload.designset.filter(|n| !n.is_empty()) {
                Some(name) => name,
                None => state.local_design_sets().into_iter().next().ok_or_else(|| {
                    RenderError::validation(
                        "no design set found: include \"designset\" in the request \
                         or add a designset folder",
                    )
                })?,
            };
            info!(designset = %name, template = %request.template, "render request");
            run_blocking(move || {
                let design_set = DesignSet::open_local(state.root(), &name)?;
                state.renderer().render(&design_set, &request)
            })
            .await?
        }
    };

    Ok(Json(ApiResponse::Ok { page }))
}

async fn run_blocking<T, F>(work: F) -> Result<T, ApiFailure>
where
    F: FnOnce() -> designset_render::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(ApiFailure::from),
        Err(e) => Err(ApiFailure::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("render task failed: {e}"),
        )),
    }
}

fn join_error(err: &tokio::task::JoinError) -> Response {
    error!(error = %err, "render task failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("render task failed: {err}"),
    )
        .into_response()
}

fn plain_error(err: &RenderError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string()).into_response()
}

async fn static_handler(
    State(state): State<AppState>,
    extract::Path((designset, path)): extract::Path<(String, String)>,
) -> Response {
    let asset = DesignSet::open_local(state.root(), &designset)
        .and_then(|design_set| load_static(&design_set, &path));

    match asset {
        Ok(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        Err(e) => plain_error(&e),
    }
}

async fn preview_handler(
    State(state): State<AppState>,
    extract::Path((designset, template)): extract::Path<(String, String)>,
) -> Response {
    let request = RenderRequest::new(template);
    let result = tokio::task::spawn_blocking(move || {
        let design_set = DesignSet::open_local(state.root(), &designset)?;
        state.renderer().render(&design_set, &request)
    })
    .await;

    match result {
        Ok(Ok(page)) => Html(page).into_response(),
        Ok(Err(e)) => plain_error(&e),
        Err(e) => join_error(&e),
    }
}

async fn context_handler(
    State(state): State<AppState>,
    extract::Path(designset): extract::Path<String>,
) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let design_set = DesignSet::open_local(state.root(), &designset)?;
        state.renderer().build_context(&design_set, Value::Null)
    })
    .await;

    match result {
        Ok(Ok(context)) => Json(context).into_response(),
        Ok(Err(e)) => plain_error(&e),
        Err(e) => join_error(&e),
    }
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n\
         <head><meta charset=\"UTF-8\"><title>Design sets</title></head>\n\
         <body>\n<h1>Design sets</h1>\n",
    );

    let names = state.local_design_sets();
    if names.is_empty() {
        page.push_str("<p>No design sets found.</p>\n");
    }

    for name in names {
        let name_html = escape_html(&name);
        let _ = writeln!(page, "<h2>{name_html}</h2>\n<ul>");
        if let Ok(design_set) = DesignSet::open_local(state.root(), &name) {
            for template in design_set.templates() {
                let template_html = escape_html(&template);
                let _ = writeln!(
                    page,
                    "<li><a href=\"/preview/{name_html}/{template_html}\">{template_html}</a> \
                     (<a href=\"/context/{name_html}\">context</a>)</li>"
                );
            }
        }
        page.push_str("</ul>\n");
    }

    page.push_str("</body>\n</html>\n");
    Html(page)
}
