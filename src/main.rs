use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    extract::{Multipart, Path, Query, State, WebSocketUpgrade},
    http::{Response, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use clap::Parser;
use dial::FallbackPolicy;
use draft::{server::Pacing, store::DraftStore};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use units::UnitDatabase;

mod dial;
mod draft;
mod units;

type Res<T> = Result<T, String>;

fn err<T, S: ToString>(message: S) -> Res<T> {
    Err(message.to_string())
}

#[derive(clap::Parser, Debug)]
#[command(about = "Unit catalog, combat dial and draft server.")]
struct Args {
    /// Directory of static files served for any unmatched path.
    content: PathBuf,
    /// Directory holding the cached catalog and saved drafts.
    data: PathBuf,
    port: u16,

    #[arg(
        long,
        env = "DIALDRAFT_API_BASE_URL",
        default_value = "https://api.agilityinsolutions.com"
    )]
    api_base_url: String,

    #[arg(long, default_value_t = 1000)]
    booster_delay_ms: u64,

    #[arg(long, default_value_t = 800)]
    pick_delay_ms: u64,

    #[arg(long, default_value = "debug")]
    log_level: tracing::Level,

    /// Never download the catalog, use whatever is cached.
    #[arg(long)]
    offline: bool,
}

#[derive(serde::Serialize)]
struct Resp {
    message: String,
    success: bool,
}

impl Resp {
    fn axum<S: ToString>(message: S, status: StatusCode) -> Response<String> {
        match serde_json::ser::to_string(&Self {
            message: message.to_string(),
            success: status == StatusCode::OK,
        }) {
            Ok(body) => Self::with_status(body, status),
            Err(e) => Self::with_status(
                format!("Failed to JSON encode response: {e}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }

    fn with_status(body: String, status: StatusCode) -> Response<String> {
        let mut resp = Response::new(body);
        *resp.status_mut() = status;
        resp
    }

    fn json<T: serde::Serialize>(value: &T) -> Response<String> {
        match serde_json::ser::to_string(value) {
            Ok(body) => {
                let mut resp = Self::with_status(body, StatusCode::OK);
                resp.headers_mut().insert(
                    axum::http::header::CONTENT_TYPE,
                    axum::http::HeaderValue::from_static("application/json"),
                );
                resp
            }
            Err(e) => Self::e500(format!("Failed to JSON encode response: {e}")),
        }
    }

    fn ok<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::OK)
    }

    fn e404<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::NOT_FOUND)
    }

    fn e500<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn e422<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::UNPROCESSABLE_ENTITY)
    }
}

struct AppState {
    units: UnitDatabase,
    drafts: Arc<DraftStore>,
    pacing: Pacing,
    policy: FallbackPolicy,
}

type AppHandle = State<Arc<AppState>>;

async fn ws_handler(ws: WebSocketUpgrade, State(state): AppHandle) -> impl IntoResponse {
    let drafts = state.drafts.clone();
    let pacing = state.pacing.clone();
    ws.on_upgrade(move |socket| draft::server::run_session(socket, drafts, pacing))
}

async fn units_handler(
    State(state): AppHandle,
    Query(query): Query<units::handlers::UnitQuery>,
) -> Response<String> {
    units::handlers::handle_search(&state.units, query)
}

async fn unit_handler(State(state): AppHandle, Path(id): Path<String>) -> Response<String> {
    units::handlers::handle_get(&state.units, &id)
}

async fn collection_import_handler(data: Multipart) -> Response<String> {
    units::handlers::handle_collection_import(data).await
}

async fn collection_export_handler(
    Json(collection): Json<units::collection::Collection>,
) -> Response<String> {
    units::handlers::handle_collection_export(collection)
}

async fn dial_handler(
    State(state): AppHandle,
    Json(request): Json<dial::handlers::DialRequest>,
) -> Response<String> {
    dial::handlers::handle_dial_request(&state.units, state.policy, request)
}

async fn list_drafts_handler(State(state): AppHandle) -> Response<String> {
    draft::handlers::handle_list(&state.drafts).await
}

async fn create_draft_handler(
    State(state): AppHandle,
    Json(request): Json<draft::DraftRequest>,
) -> Response<String> {
    draft::handlers::handle_create(&state.drafts, request).await
}

async fn delete_draft_handler(State(state): AppHandle, Path(id): Path<String>) -> Response<String> {
    draft::handlers::handle_delete(&state.drafts, &id).await
}

async fn regenerate_draft_handler(
    State(state): AppHandle,
    Path(id): Path<String>,
) -> Response<String> {
    draft::handlers::handle_regenerate(&state.drafts, &id).await
}

async fn draft_config_handler(State(state): AppHandle, Path(id): Path<String>) -> Response<String> {
    draft::handlers::handle_config_export(&state.drafts, &id).await
}

async fn config_export_handler(
    Json(request): Json<draft::handlers::ConfigExportRequest>,
) -> Response<String> {
    draft::handlers::handle_working_config_export(request)
}

async fn config_import_handler(data: Multipart) -> Response<String> {
    draft::handlers::handle_config_import(data).await
}

async fn load_unit_database(args: &Args) -> Res<UnitDatabase> {
    let units = units::catalog::load_units(&args.data, &args.api_base_url, args.offline).await?;
    tracing::debug!("Inserting catalog data to unit database.");
    let mut database = UnitDatabase::new();
    for unit in units {
        database.add(unit);
    }
    tracing::debug!(
        "Succesfully populated unit database with {} units.",
        database.size()
    );
    Ok(database)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let units = match load_unit_database(&args).await {
        Ok(db) => db,
        Err(e) => panic!("Failed to load unit catalog: {e}"),
    };

    let drafts = match DraftStore::load(&args.data).await {
        Ok(store) => store,
        Err(e) => panic!("Failed to load saved drafts: {e}"),
    };

    let state = AppState {
        units,
        drafts: Arc::new(drafts),
        pacing: Pacing {
            booster_delay: Duration::from_millis(args.booster_delay_ms),
            pick_delay: Duration::from_millis(args.pick_delay_ms),
        },
        policy: FallbackPolicy::default(),
    };

    let app = Router::new()
        .fallback_service(ServeDir::new(&args.content).append_index_html_on_directories(true))
        .route("/ws", get(ws_handler))
        .route("/api/units", get(units_handler))
        .route("/api/units/:id", get(unit_handler))
        .route("/api/dial", post(dial_handler))
        .route("/api/collection/import", post(collection_import_handler))
        .route("/api/collection/export", post(collection_export_handler))
        .route(
            "/api/drafts",
            get(list_drafts_handler).post(create_draft_handler),
        )
        .route("/api/drafts/:id", delete(delete_draft_handler))
        .route("/api/drafts/:id/regenerate", post(regenerate_draft_handler))
        .route("/api/drafts/:id/config", get(draft_config_handler))
        .route("/api/drafts/config", post(config_export_handler))
        .route("/api/drafts/config/import", post(config_import_handler))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .unwrap_or_else(|e| panic!("Failed to open port {}: {e}", args.port));

    tracing::info!("Listening on port {}.", args.port);
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Closed due to error: {e}");
    }
}
