//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{AssetStore, LogNotifier, PgStore},
    config::Config,
    error::ApiError,
    web::{
        assignments::list_assignments_handler,
        middleware::require_identity,
        papers::{
            assigned_papers_handler, author_papers_handler, papers_by_status_handler,
            public_papers_handler, review_decision_handler, submit_paper_handler,
            update_status_handler,
        },
        state::AppState,
        users::{create_section_head_handler, create_user_handler, get_users_handler},
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use peer_review_core::{
    assignment::AssignmentManager, lifecycle::LifecycleEngine, views::ViewComposer,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Adapters & Workflow Engines ---
    let assets = AssetStore::new(config.assets_dir.clone());
    assets.ensure_dir().await?;

    let store: Arc<dyn peer_review_core::ports::WorkflowStore> = store;
    let notifier = Arc::new(LogNotifier);
    let assignments = AssignmentManager::new(store.clone(), notifier);
    let lifecycle = LifecycleEngine::new(store.clone(), assignments.clone());
    let views = ViewComposer::new(store.clone());

    // --- 4. Build the Shared AppState ---
    let app_state = AppState {
        config: config.clone(),
        store,
        lifecycle,
        assignments,
        views,
        assets,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, HeaderName::from_static("x-user-id")]);

    // --- 5. Create the Web Router ---
    // Public routes (no identity header required)
    let public_routes = Router::new()
        .route("/papers", get(public_papers_handler))
        .route("/users", post(create_user_handler));

    // Protected routes (identity header required)
    let protected_routes = Router::new()
        .route("/papers", post(submit_paper_handler))
        .route("/papers/{paper_id}/status", put(update_status_handler))
        .route("/papers/{paper_id}/decision", put(review_decision_handler))
        .route("/papers/status", get(papers_by_status_handler))
        .route("/papers/assigned", get(assigned_papers_handler))
        .route("/papers/author", get(author_papers_handler))
        .route("/assignments", get(list_assignments_handler))
        .route("/users/section-heads", post(create_section_head_handler))
        .route("/users", get(get_users_handler))
        .layer(axum_middleware::from_fn(require_identity));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/assets", ServeDir::new(&config.assets_dir))
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
