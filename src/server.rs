//! # Server Configuration
//!
//! Router assembly, shared state and the serve loop for the outreach CRM API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{self, auth, colleges, dashboard, interactions, tasks, team_members};
use crate::repositories::SessionRepository;
use crate::telemetry::{TRACE_ID_HEADER, trace_id_middleware};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in));

    let protected_api = Router::new()
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
        .route(
            "/colleges",
            get(colleges::list_colleges).post(colleges::create_college),
        )
        .route(
            "/colleges/{id}",
            get(colleges::get_college)
                .patch(colleges::update_college)
                .delete(colleges::delete_college),
        )
        .route("/colleges/{id}/status", put(colleges::update_college_status))
        .route(
            "/colleges/{id}/interactions",
            get(interactions::list_interactions).post(interactions::create_interaction),
        )
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/{id}/toggle", post(tasks::toggle_task))
        .route(
            "/team-members",
            get(team_members::list_team_members).post(team_members::create_team_member),
        )
        .route(
            "/team-members/{id}",
            patch(team_members::update_team_member)
                .delete(team_members::delete_team_member),
        )
        .route("/dashboard", get(dashboard::dashboard))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.cors_allowed_origins);

    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .nest("/api/v1", public_api.merge(protected_api))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };

    app.layer(from_fn(trace_id_middleware))
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers([HeaderName::from_static(TRACE_ID_HEADER)]),
    )
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("Invalid server address")?;

    let state = AppState {
        config: Arc::new(config),
        db,
    };

    let sweeper = tokio::spawn(sweep_expired_sessions(state.db.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, profile = %state.config.profile, "CRM API listening");

    let app = create_app(state);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    result.context("Server terminated unexpectedly")
}

async fn sweep_expired_sessions(db: DatabaseConnection) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        if let Err(err) = SessionRepository::new(&db).purge_expired(Utc::now()).await {
            tracing::warn!(error = %err, "Session sweep failed");
        }
    }
}

pub(crate) async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Session token from sign-in or sign-up"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::readyz,
        crate::handlers::auth::sign_up,
        crate::handlers::auth::sign_in,
        crate::handlers::auth::sign_out,
        crate::handlers::auth::me,
        crate::handlers::colleges::list_colleges,
        crate::handlers::colleges::create_college,
        crate::handlers::colleges::get_college,
        crate::handlers::colleges::update_college,
        crate::handlers::colleges::update_college_status,
        crate::handlers::colleges::delete_college,
        crate::handlers::interactions::list_interactions,
        crate::handlers::interactions::create_interaction,
        crate::handlers::tasks::list_tasks,
        crate::handlers::tasks::create_task,
        crate::handlers::tasks::update_task,
        crate::handlers::tasks::toggle_task,
        crate::handlers::tasks::delete_task,
        crate::handlers::team_members::list_team_members,
        crate::handlers::team_members::create_team_member,
        crate::handlers::team_members::update_team_member,
        crate::handlers::team_members::delete_team_member,
        crate::handlers::dashboard::dashboard,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::handlers::types::ResponseMeta,
            crate::models::college::CollegeStatus,
            crate::models::interaction_log::ContactMethod,
            crate::models::task::TaskPriority,
            crate::models::task::TaskStatus,
            crate::models::team_member::TeamRole,
            crate::models::team_member::MemberStatus,
            crate::repositories::task::TaskTab,
            crate::stats::CollegeStats,
            crate::stats::TaskStats,
            crate::stats::TeamStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sign-up, sign-in and sessions"),
        (name = "colleges", description = "College records and status reviews"),
        (name = "interactions", description = "Interaction logs per college"),
        (name = "tasks", description = "Follow-up tasks"),
        (name = "team", description = "Team members"),
        (name = "dashboard", description = "Aggregate statistics"),
    ),
    info(
        title = "Outreach CRM API",
        description = "API for tracking outreach to colleges",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
