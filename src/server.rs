//! REST API for hashvdb.
//!
//! Provides an HTTP server with JSON endpoints over one session store. The
//! store lives as long as the server process; export it before shutting down
//! to keep anything.
//!
//! ## Endpoints
//!
//! - `POST /entries` - Vectorize and add texts
//! - `GET /entries` - List all entries
//! - `POST /search` - Rank entries against query texts
//! - `POST /delete` - Delete entries by ID
//! - `POST /clear` - Delete all entries
//! - `GET /export` - Export entries as a JSON array
//! - `POST /import` - Replace entries with an exported JSON array
//! - `POST /embed` - Embed a text without storing it
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer};
//! use hashvdb::server::{self, SessionState};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let state = web::Data::new(SessionState::new());
//!     HttpServer::new(move || App::new().app_data(state.clone()).configure(server::config))
//!         .bind("0.0.0.0:7878")?
//!         .run()
//!         .await
//! }
//! ```

use crate::config::ServerConfig;
use crate::embedding::{embed, embedding_preview, EMBEDDING_DIM};
use crate::entry::Entry;
use crate::search::SearchResult;
use crate::store::EntryStore;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Largest accepted `/import` body.
const IMPORT_LIMIT: usize = 10 * 1024 * 1024;

/// Shared state: the session's entry store.
#[derive(Debug, Default)]
pub struct SessionState {
    store: Mutex<EntryStore>,
}

impl SessionState {
    pub fn new() -> SessionState {
        SessionState { store: Mutex::new(EntryStore::new()) }
    }

    /// Starts the session from an existing store.
    pub fn with_store(store: EntryStore) -> SessionState {
        SessionState { store: Mutex::new(store) }
    }
}

// --- Request structs ---

#[derive(Deserialize)]
struct AddRequest {
    texts: Vec<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    queries: Vec<String>,
}

#[derive(Deserialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedRequest {
    text: String,
}

// --- Response structs ---

#[derive(Serialize)]
struct AddResponse {
    added: usize,
    results: Vec<AddResult>,
}

#[derive(Serialize)]
struct AddResult {
    id: Option<String>,
    status: String,
    message: String,
}

#[derive(Serialize)]
struct ListResponse<'a> {
    count: usize,
    entries: &'a [Entry],
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResultGroup>,
}

#[derive(Serialize)]
struct SearchResultGroup {
    query: String,
    matches: Vec<SearchResult>,
    message: String,
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: usize,
    results: Vec<DeleteResult>,
}

#[derive(Serialize)]
struct DeleteResult {
    id: String,
    status: String,
    message: String,
}

#[derive(Serialize)]
struct ClearResponse {
    cleared: usize,
}

#[derive(Serialize)]
struct ImportResponse {
    imported: usize,
}

#[derive(Serialize)]
struct EmbedResponse {
    dimension: usize,
    preview: String,
    embedding: Vec<f64>,
}

// --- Handlers ---

async fn add_handler(state: web::Data<SessionState>, body: web::Json<AddRequest>) -> impl Responder {
    let mut store = state.store.lock();

    let mut results = Vec::new();
    let mut added = 0;

    for text in &body.texts {
        match store.add_text(text) {
            Ok(entry) => {
                added += 1;
                results.push(AddResult {
                    id: Some(entry.id.clone()),
                    status: "ok".to_string(),
                    message: "Entry vectorized and added".to_string(),
                });
            }
            Err(e) => {
                results.push(AddResult {
                    id: None,
                    status: "error".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    HttpResponse::Ok().json(AddResponse { added, results })
}

async fn list_handler(state: web::Data<SessionState>) -> impl Responder {
    let store = state.store.lock();
    HttpResponse::Ok().json(ListResponse { count: store.count(), entries: store.list() })
}

async fn search_handler(state: web::Data<SessionState>, body: web::Json<SearchRequest>) -> impl Responder {
    let store = state.store.lock();

    let mut results = Vec::new();

    for query in &body.queries {
        let group = match store.search(query) {
            Ok(matches) => {
                let message = if matches.is_empty() {
                    "No results".to_string()
                } else {
                    "Search Success".to_string()
                };
                SearchResultGroup { query: query.clone(), matches, message }
            }
            Err(e) => SearchResultGroup {
                query: query.clone(),
                matches: Vec::new(),
                message: e.to_string(),
            },
        };
        results.push(group);
    }

    HttpResponse::Ok().json(SearchResponse { results })
}

async fn delete_handler(state: web::Data<SessionState>, body: web::Json<DeleteRequest>) -> impl Responder {
    let mut store = state.store.lock();

    let mut results = Vec::new();
    let mut deleted = 0;

    for id in &body.ids {
        if store.delete_by_id(id) {
            deleted += 1;
            results.push(DeleteResult {
                id: id.clone(),
                status: "Success".to_string(),
                message: "Entry deleted".to_string(),
            });
        } else {
            results.push(DeleteResult {
                id: id.clone(),
                status: "Failed".to_string(),
                message: "ID not found".to_string(),
            });
        }
    }

    HttpResponse::Ok().json(DeleteResponse { deleted, results })
}

async fn clear_handler(state: web::Data<SessionState>) -> impl Responder {
    let mut store = state.store.lock();
    let cleared = store.count();
    store.clear();

    HttpResponse::Ok().json(ClearResponse { cleared })
}

async fn export_handler(state: web::Data<SessionState>) -> impl Responder {
    let store = state.store.lock();

    match store.serialize() {
        Ok(json) => HttpResponse::Ok().content_type("application/json").body(json),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({"error": e.to_string()})),
    }
}

async fn import_handler(state: web::Data<SessionState>, body: String) -> impl Responder {
    let mut store = state.store.lock();

    match store.deserialize(&body) {
        Ok(imported) => HttpResponse::Ok().json(ImportResponse { imported }),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({"error": e.to_string()})),
    }
}

async fn embed_handler(body: web::Json<EmbedRequest>) -> impl Responder {
    let embedding = embed(&body.text);

    HttpResponse::Ok().json(EmbedResponse {
        dimension: EMBEDDING_DIM,
        preview: embedding_preview(&embedding),
        embedding: embedding.into_inner(),
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(IMPORT_LIMIT))
       .service(web::resource("/entries")
           .route(web::post().to(add_handler))
           .route(web::get().to(list_handler)))
       .service(web::resource("/search").route(web::post().to(search_handler)))
       .service(web::resource("/delete").route(web::post().to(delete_handler)))
       .service(web::resource("/clear").route(web::post().to(clear_handler)))
       .service(web::resource("/export").route(web::get().to(export_handler)))
       .service(web::resource("/import").route(web::post().to(import_handler)))
       .service(web::resource("/embed").route(web::post().to(embed_handler)));
}

/// Runs the session server until it is stopped.
pub async fn run(server_config: ServerConfig, state: SessionState) -> std::io::Result<()> {
    let state = web::Data::new(state);
    let address = server_config.address();

    info!(%address, "starting session server");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(config))
        .bind(&address)
        .inspect_err(|e| warn!(%address, error = %e, "bind failed"))?
        .run()
        .await
}
