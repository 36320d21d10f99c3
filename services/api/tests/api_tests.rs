//! Integration tests for the plantita HTTP API.
//!
//! The router runs against the in-memory store and a scripted vision model,
//! so every test is hermetic.

use api_lib::{
    adapters::InMemoryStore,
    config::Config,
    web::{build_router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use plantita_core::{
    domain::{Diagnosis, NewDiagnosis, NewPlant, Plant},
    ports::{InferenceService, PlantStore, PortError, PortResult},
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
const FICUS_REPLY: &str = "**Especie detectada:** Ficus lyrata\n\n**Diagnóstico:**\nManchas marrones por exceso de riego.\n\n**Sugerencias de cuidado:**\nDejar secar el sustrato entre riegos.";

/// Test helper: a vision model that always answers the same way.
struct ScriptedVision {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedVision {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl InferenceService for ScriptedVision {
    async fn describe_image(&self, _: &str, _: &str, _: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(PortError::Unavailable)
    }
}

/// Test helper: a store whose writes always fail.
struct ReadOnlyStore {
    inner: InMemoryStore,
    write_attempts: AtomicUsize,
}

#[async_trait]
impl PlantStore for ReadOnlyStore {
    async fn list_plants_for_user(&self, user_id: &str) -> PortResult<Vec<Plant>> {
        self.inner.list_plants_for_user(user_id).await
    }

    async fn get_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Plant> {
        self.inner.get_plant(plant_id, user_id).await
    }

    async fn create_plant(&self, _: NewPlant) -> PortResult<Plant> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(PortError::Unavailable("connection refused".to_string()))
    }

    async fn rename_plant(&self, _: Uuid, _: &str, _: &str) -> PortResult<Plant> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(PortError::Unavailable("connection refused".to_string()))
    }

    async fn create_diagnosis(&self, _: NewDiagnosis) -> PortResult<Diagnosis> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(PortError::Unavailable("connection refused".to_string()))
    }

    async fn list_diagnoses_for_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Vec<Diagnosis>> {
        self.inner.list_diagnoses_for_plant(plant_id, user_id).await
    }

    async fn list_diagnoses_for_user(&self, user_id: &str) -> PortResult<Vec<Diagnosis>> {
        self.inner.list_diagnoses_for_user(user_id).await
    }
}

/// Test helper: an in-memory store that counts every write it receives.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlantStore for CountingStore {
    async fn list_plants_for_user(&self, user_id: &str) -> PortResult<Vec<Plant>> {
        self.inner.list_plants_for_user(user_id).await
    }

    async fn get_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Plant> {
        self.inner.get_plant(plant_id, user_id).await
    }

    async fn create_plant(&self, plant: NewPlant) -> PortResult<Plant> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_plant(plant).await
    }

    async fn rename_plant(&self, plant_id: Uuid, user_id: &str, name: &str) -> PortResult<Plant> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.rename_plant(plant_id, user_id, name).await
    }

    async fn create_diagnosis(&self, diagnosis: NewDiagnosis) -> PortResult<Diagnosis> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_diagnosis(diagnosis).await
    }

    async fn list_diagnoses_for_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Vec<Diagnosis>> {
        self.inner.list_diagnoses_for_plant(plant_id, user_id).await
    }

    async fn list_diagnoses_for_user(&self, user_id: &str) -> PortResult<Vec<Diagnosis>> {
        self.inner.list_diagnoses_for_user(user_id).await
    }
}

/// Test helper: build the router with default config.
fn setup_app(store: Arc<dyn PlantStore>, vision: Arc<dyn InferenceService>) -> Router {
    let config = Config::from_lookup(|_| None).expect("default config is valid");
    build_router(Arc::new(AppState::new(Arc::new(config), store, vision)))
}

fn json_request(method: &str, uri: &str, user_id: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::empty()).unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn seed_plant(store: &InMemoryStore, user_id: &str, species: Option<&str>) -> Plant {
    store
        .create_plant(NewPlant {
            user_id: user_id.to_string(),
            name: Some("Ficus del balcón".to_string()),
            species: species.map(str::to_string),
            description: None,
            image_url: Some("https://example.com/ficus.jpg".to_string()),
        })
        .await
        .unwrap()
}

// =============================================================================
// POST /api/diagnose
// =============================================================================

#[tokio::test]
async fn test_missing_image_is_bad_request() {
    let vision = ScriptedVision::replying(FICUS_REPLY);
    let app = setup_app(Arc::new(InMemoryStore::new()), vision.clone());

    let request = json_request("POST", "/api/diagnose", None, json!({ "userInput": "hojas secas" }));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Falta la imagen");
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_anonymous_diagnosis_is_not_saved() {
    let store = Arc::new(CountingStore::default());
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userInput": "manchas marrones" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["diagnosis"], FICUS_REPLY);
    assert_eq!(body["detectedSpecies"], "Ficus lyrata");
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["groupingSuggestions"], json!([]));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_new_species_is_saved_as_a_new_plant() {
    let store = Arc::new(InMemoryStore::new());
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userInput": "manchas", "userId": "user_ana" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["groupingSuggestions"], json!([]));

    let plants = store.list_plants_for_user("user_ana").await.unwrap();
    assert_eq!(plants.len(), 1);
    assert_eq!(plants[0].species.as_deref(), Some("Ficus lyrata"));
    assert_eq!(plants[0].image_url.as_deref(), Some(IMAGE));

    // The new plant shows up in the history with its diagnosis.
    let response = app.oneshot(get_request("/api/plants", Some("user_ana"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = extract_json(response.into_body()).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["species"], "Ficus lyrata");
    assert_eq!(history[0]["diagnoses"][0]["diagnosisText"], FICUS_REPLY);
    assert_eq!(
        history[0]["diagnoses"][0]["careSuggestions"],
        "Dejar secar el sustrato entre riegos."
    );
}

#[tokio::test]
async fn test_matching_species_returns_suggestions_without_saving() {
    let store = Arc::new(InMemoryStore::new());
    let existing = seed_plant(&store, "user_ana", Some("FICUS LYRÁTA")).await;
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userId": "user_ana" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let suggestions = body["groupingSuggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["id"], existing.id.to_string());
    assert_eq!(suggestions[0]["name"], "Ficus del balcón");
    assert_eq!(suggestions[0]["species"], "FICUS LYRÁTA");
    assert_eq!(suggestions[0]["imageUrl"], "https://example.com/ficus.jpg");

    assert_eq!(store.list_plants_for_user("user_ana").await.unwrap().len(), 1);
    assert!(store.list_diagnoses_for_user("user_ana").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_plant_receives_the_diagnosis() {
    let store = Arc::new(InMemoryStore::new());
    let target = seed_plant(&store, "user_ana", Some("Ficus lyrata")).await;
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userId": "user_ana", "plantId": target.id }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["groupingSuggestions"], json!([]));
    assert_eq!(store.list_plants_for_user("user_ana").await.unwrap().len(), 1);

    let uri = format!("/api/plants/{}", target.id);
    let response = app.oneshot(get_request(&uri, Some("user_ana"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = extract_json(response.into_body()).await;
    assert_eq!(detail["diagnoses"].as_array().unwrap().len(), 1);
    assert_eq!(detail["diagnoses"][0]["diagnosisText"], FICUS_REPLY);
}

#[tokio::test]
async fn test_other_users_plant_id_is_not_written() {
    let store = Arc::new(CountingStore::default());
    let foreign = seed_plant(&store.inner, "user_bruno", Some("Ficus lyrata")).await;
    let writes_before = store.writes();
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userId": "user_ana", "plantId": foreign.id }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["diagnosis"], FICUS_REPLY);
    assert_eq!(store.writes(), writes_before);
    assert!(store.list_diagnoses_for_user("user_ana").await.unwrap().is_empty());
    assert!(store.list_diagnoses_for_user("user_bruno").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_inference_failure_is_a_server_error() {
    let store = Arc::new(InMemoryStore::new());
    let app = setup_app(store.clone(), ScriptedVision::failing("model overloaded"));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userId": "user_ana" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Error al procesar la imagen con IA");
    assert!(body["details"].as_str().unwrap().contains("model overloaded"));
    assert!(store.list_plants_for_user("user_ana").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_still_returns_the_diagnosis() {
    let store = Arc::new(ReadOnlyStore {
        inner: InMemoryStore::new(),
        write_attempts: AtomicUsize::new(0),
    });
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));

    let request = json_request(
        "POST",
        "/api/diagnose",
        None,
        json!({ "base64Image": IMAGE, "userId": "user_ana" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["diagnosis"], FICUS_REPLY);
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(store.write_attempts.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Plant history
// =============================================================================

#[tokio::test]
async fn test_plant_routes_require_identity() {
    let app = setup_app(Arc::new(InMemoryStore::new()), ScriptedVision::replying(FICUS_REPLY));

    let response = app.oneshot(get_request("/api/plants", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_other_users_plant_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let plant = seed_plant(&store, "user_ana", Some("Pothos")).await;
    let app = setup_app(store, ScriptedVision::replying(FICUS_REPLY));

    let uri = format!("/api/plants/{}", plant.id);
    let response = app.oneshot(get_request(&uri, Some("user_bruno"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_plant() {
    let store = Arc::new(InMemoryStore::new());
    let plant = seed_plant(&store, "user_ana", Some("Pothos")).await;
    let app = setup_app(store.clone(), ScriptedVision::replying(FICUS_REPLY));
    let uri = format!("/api/plants/{}", plant.id);

    let blank = json_request("PATCH", &uri, Some("user_ana"), json!({ "name": "   " }));
    let response = app.clone().oneshot(blank).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let rename = json_request("PATCH", &uri, Some("user_ana"), json!({ "name": "  Potus  " }));
    let response = app.oneshot(rename).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "Potus");

    let stored = store.get_plant(plant.id, "user_ana").await.unwrap();
    assert_eq!(stored.name.as_deref(), Some("Potus"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_app(Arc::new(InMemoryStore::new()), ScriptedVision::replying(FICUS_REPLY));

    let response = app
        .oneshot(get_request("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["paths"]["/api/diagnose"].is_object());
    assert!(body["paths"]["/api/plants/{id}"].is_object());
}
