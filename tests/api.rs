use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use quebella_api::{
    auth::{jwt::TokenVerifier, rate_limit::AuthThrottle},
    build_router,
    config::Config,
    db::MemoryStore,
    services::{
        identity::{AuthSession, IdentityProvider},
        llm::{GenerationOptions, TextGenerator},
        object_store::ObjectStore,
        reflection::ReflectionWriter,
        ProviderError,
    },
    AppState,
};

const JWT_SECRET: &str = "test-jwt-secret-with-at-least-32-characters";
const CRON_SECRET: &str = "cron-test-secret";
const REFLECTION_TEXT: &str = "Two days, one quiet rhythm of care.";

fn mint_token(user_id: Uuid, email: &str) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "email": email,
        "aud": "authenticated",
        "role": "authenticated",
        "exp": (Utc::now() + ChronoDuration::hours(1)).timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

#[derive(Default)]
struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, Uuid)>>,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _full_name: Option<&str>,
    ) -> Result<AuthSession, ProviderError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(ProviderError::Rejected("User already registered".into()));
        }
        let id = Uuid::new_v4();
        accounts.insert(email.to_string(), (password.to_string(), id));
        Ok(AuthSession {
            access_token: mint_token(id, email),
            user_id: id,
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ProviderError> {
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((stored, id)) if stored == password => Ok(AuthSession {
                access_token: mint_token(*id, email),
                user_id: *id,
                email: email.to_string(),
            }),
            _ => Err(ProviderError::Unauthorized("Invalid login credentials".into())),
        }
    }
}

#[derive(Default)]
struct FakeObjects {
    uploads: Mutex<Vec<(String, usize, String)>>,
}

#[async_trait]
impl ObjectStore for FakeObjects {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len(), content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/audio-journal/{}", path)
    }
}

#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn generate(
        &self,
        _system: &str,
        _prompt: &str,
        _options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(REFLECTION_TEXT.to_string())
    }
}

struct TestApp {
    router: Router,
    objects: Arc<FakeObjects>,
    generator: Arc<CountingGenerator>,
}

struct TestUser {
    id: Uuid,
    token: String,
    invite_code: String,
}

fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORE_BACKEND", "memory"),
        ("SUPABASE_URL", "https://project.supabase.test"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service-role"),
        ("SUPABASE_JWT_SECRET", JWT_SECRET),
        ("CRON_SECRET", CRON_SECRET),
        ("MAX_AUDIO_BYTES", "1024"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

impl TestApp {
    fn new() -> Self {
        let config = Arc::new(test_config());
        let objects = Arc::new(FakeObjects::default());
        let generator = Arc::new(CountingGenerator::default());

        let state = AppState {
            store: Arc::new(MemoryStore::new()),
            identity: Arc::new(FakeIdentity::default()),
            objects: objects.clone(),
            reflections: ReflectionWriter::new(
                generator.clone(),
                GenerationOptions::default(),
                Duration::from_secs(5),
            ),
            tokens: TokenVerifier::from_config(&config),
            auth_throttle: AuthThrottle::from_config(&config),
            config,
        };

        Self {
            router: build_router(state),
            objects,
            generator,
        }
    }

    async fn send(&self, mut req: Request<Body>) -> (StatusCode, Value) {
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    async fn register(&self, email: &str, name: &str) -> TestUser {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "email": email, "password": "secret123", "full_name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["access_token"].as_str().unwrap().to_string(),
            invite_code: body["user"]["invite_code"].as_str().unwrap().to_string(),
        }
    }

    async fn couple(&self) -> (TestUser, TestUser) {
        let a = self.register("alex@example.com", "Alex").await;
        let b = self.register("blair@example.com", "Blair").await;
        let (status, body) = self
            .call(
                Method::POST,
                "/api/invite-partner",
                Some(a.token.as_str()),
                Some(json!({ "invite_code": b.invite_code })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "invite failed: {}", body);
        (a, b)
    }

    async fn write_entry(&self, user: &TestUser, date: NaiveDate, content: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/journal-entries",
                Some(user.token.as_str()),
                Some(json!({ "content": content, "date": date })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "entry failed: {}", body);
        body
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = app.call(Method::GET, "/api/readyz", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 401);

    let (status, _) = app
        .call(Method::GET, "/api/profile", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = TestApp::new();
    let user = app.register("Sam@Example.com", "Sam").await;
    assert_eq!(user.invite_code.len(), 8);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "sam@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.to_string());

    let (status, _) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "sam@example.com", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            Method::PATCH,
            "/api/profile",
            Some(user.token.as_str()),
            Some(json!({ "allow_read_receipts": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allow_read_receipts"], false);
    assert_eq!(body["full_name"], "Sam");
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = TestApp::new();
    let (status, _) = app
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "email": "nope", "password": "1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invite_partner_errors() {
    let app = TestApp::new();
    let a = app.register("a@example.com", "A").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/invite-partner",
            Some(a.token.as_str()),
            Some(json!({ "invite_code": a.invite_code })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/invite-partner",
            Some(a.token.as_str()),
            Some(json!({ "invite_code": "NOSUCHCD" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let b = app.register("b@example.com", "B").await;
    let c = app.register("c@example.com", "C").await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/invite-partner",
            Some(a.token.as_str()),
            Some(json!({ "invite_code": b.invite_code.to_lowercase() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/invite-partner",
            Some(c.token.as_str()),
            Some(json!({ "invite_code": a.invite_code })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_journal_visibility_and_ownership() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    let stranger = app.register("s@example.com", "S").await;

    let entry = app.write_entry(&a, day(1), "Morning walk together").await;
    assert_eq!(entry["shared_with"], json!([b.id.to_string()]));
    let entry_id = entry["id"].as_str().unwrap().to_string();

    // Same day again replaces the entry.
    let replaced = app.write_entry(&a, day(1), "Evening walk instead").await;
    assert_eq!(replaced["id"], entry["id"]);

    let (_, partner_view) = app
        .call(Method::GET, "/api/journal-entries", Some(b.token.as_str()), None)
        .await;
    assert_eq!(partner_view.as_array().unwrap().len(), 1);
    assert_eq!(partner_view[0]["content"], "Evening walk instead");

    let (_, stranger_view) = app
        .call(Method::GET, "/api/journal-entries", Some(stranger.token.as_str()), None)
        .await;
    assert!(stranger_view.as_array().unwrap().is_empty());

    let uri = format!("/api/journal-entries/{}", entry_id);
    let (status, _) = app
        .call(Method::PUT, &uri, Some(b.token.as_str()), Some(json!({ "content": "hijack" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(Method::PUT, &uri, Some(a.token.as_str()), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(Method::PUT, &uri, Some(a.token.as_str()), Some(json!({ "mood": "calm" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mood"], "calm");
    assert_eq!(body["content"], "Evening walk instead");

    let (status, _) = app.call(Method::DELETE, &uri, Some(b.token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::DELETE, &uri, Some(a.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blank_entry_rejected() {
    let app = TestApp::new();
    let a = app.register("a@example.com", "A").await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/journal-entries",
            Some(a.token.as_str()),
            Some(json!({ "content": "   ", "date": day(1) })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_read_receipts() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    let entry = app.write_entry(&a, day(2), "Quiet day").await;
    let logs_uri = format!("/api/access-logs/{}", entry["id"].as_str().unwrap());

    app.call(Method::GET, "/api/journal-entries", Some(b.token.as_str()), None)
        .await;

    let (status, logs) = app.call(Method::GET, &logs_uri, Some(a.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["accessed_by"], b.id.to_string());
    assert_eq!(logs[0]["entry_type"], "journal");

    // Only the owner sees receipts.
    let (_, foreign) = app.call(Method::GET, &logs_uri, Some(b.token.as_str()), None).await;
    assert!(foreign.as_array().unwrap().is_empty());

    // Opting out stops new receipts.
    app.call(
        Method::PATCH,
        "/api/profile",
        Some(b.token.as_str()),
        Some(json!({ "allow_read_receipts": false })),
    )
    .await;
    app.call(Method::GET, "/api/journal-entries", Some(b.token.as_str()), None)
        .await;
    let (_, logs) = app.call(Method::GET, &logs_uri, Some(a.token.as_str()), None).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_reflection_once_per_day() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    let uri = format!("/api/generate-reflection?reflection_date={}", day(3));

    app.write_entry(&a, day(3), "Cooked dinner for us").await;
    let (status, _) = app.call(Method::POST, &uri, Some(a.token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "partner entry missing");

    app.write_entry(&b, day(3), "Loved the dinner").await;
    let (status, first) = app.call(Method::POST, &uri, Some(a.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["reflection"], REFLECTION_TEXT);
    assert_eq!(first["created"], true);

    let (status, second) = app.call(Method::POST, &uri, Some(b.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["reflection"], first["reflection"]);
    assert_eq!(app.generator.calls.load(Ordering::SeqCst), 1);

    let (_, stats) = app
        .call(Method::GET, "/api/statistics", Some(a.token.as_str()), None)
        .await;
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["partner_entries"], 1);
    assert_eq!(stats["total_reflections"], 1);
    assert_eq!(stats["shared_days"], 1);
    assert_eq!(stats["longest_streak"], 1);
}

#[tokio::test]
async fn test_generate_reflection_requires_partner() {
    let app = TestApp::new();
    let solo = app.register("solo@example.com", "Solo").await;
    app.write_entry(&solo, day(4), "Just me").await;
    let uri = format!("/api/generate-reflection?reflection_date={}", day(4));
    let (status, _) = app.call(Method::POST, &uri, Some(solo.token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_backfill_reflection_checks_membership() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    let outsider = app.register("o@example.com", "O").await;
    app.write_entry(&a, day(5), "A's day").await;
    app.write_entry(&b, day(5), "B's day").await;

    let body = json!({ "date": day(5), "user_id": a.id, "partner_id": b.id });
    let (status, _) = app
        .call(
            Method::POST,
            "/api/backfill-reflection",
            Some(outsider.token.as_str()),
            Some(body.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .call(Method::POST, "/api/backfill-reflection", Some(b.token.as_str()), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["created"], true);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/backfill-reflection",
            Some(a.token.as_str()),
            Some(json!({ "date": day(5), "user_id": a.id, "partner_id": outsider.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calendar_month() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    app.write_entry(&a, day(6), "Park").await;
    app.write_entry(&b, day(6), "Picnic").await;
    app.call(
        Method::POST,
        "/api/mood-entries",
        Some(b.token.as_str()),
        Some(json!({ "mood": "happy", "date": day(6) })),
    )
    .await;
    let uri = format!("/api/generate-reflection?reflection_date={}", day(6));
    app.call(Method::POST, &uri, Some(a.token.as_str()), None).await;

    let (status, days) = app
        .call(Method::GET, "/api/calendar/2024/5", Some(a.token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 31);

    let sixth = &days[5];
    assert_eq!(sixth["date"], "2024-05-06");
    assert_eq!(sixth["user_entry"]["content"], "Park");
    assert_eq!(sixth["partner_entry"]["content"], "Picnic");
    assert_eq!(sixth["partner_mood"]["mood"], "happy");
    assert!(sixth["user_mood"].is_null());
    assert_eq!(sixth["shared_reflection"]["reflection"], REFLECTION_TEXT);
    assert!(days[6]["user_entry"].is_null());

    let (status, _) = app
        .call(Method::GET, "/api/calendar/2024/13", Some(a.token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cron_sweep() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    let yesterday = Utc::now().date_naive() - ChronoDuration::days(1);
    app.write_entry(&a, yesterday, "Long day at work").await;
    app.write_entry(&b, yesterday, "Missed you today").await;

    let (status, _) = app
        .call(Method::POST, "/api/cron/generate-reflections", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = |secret: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/cron/generate-reflections")
            .header("cron-secret", secret)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = app.send(req("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(req(CRON_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eligible_pairs"], 1);
    assert_eq!(body["created"], 1);
    assert_eq!(body["date"], yesterday.to_string());

    let (_, again) = app.send(req(CRON_SECRET)).await;
    assert_eq!(again["created"], 0);
    assert_eq!(again["already_present"], 1);
}

fn multipart_request(
    token: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let boundary = "quebella-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: {c}\r\n\r\n",
            b = boundary,
            f = filename,
            c = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/upload-audio")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_audio() {
    let app = TestApp::new();
    let user = app.register("voice@example.com", "Voice").await;

    let (status, body) = app
        .send(multipart_request(&user.token, "memo.webm", "audio/webm", b"fake-audio"))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with(&format!("{}/", user.id)));
    assert!(filename.ends_with(".webm"));
    assert_eq!(
        body["audio_url"],
        format!("https://storage.test/audio-journal/{}", filename)
    );
    assert_eq!(app.objects.uploads.lock().unwrap().len(), 1);

    let (status, _) = app
        .send(multipart_request(&user.token, "notes.txt", "text/plain", b"hello"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_big = vec![0u8; 2048];
    let (status, _) = app
        .send(multipart_request(&user.token, "long.mp3", "audio/mpeg", &too_big))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.objects.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_private_notes() {
    let app = TestApp::new();
    let (a, b) = app.couple().await;
    let entry = app.write_entry(&a, day(7), "Hard conversation").await;
    let entry_id = entry["id"].as_str().unwrap();

    for text in ["Ask about this later", "Bring flowers"] {
        let (status, _) = app
            .call(
                Method::POST,
                "/api/private-notes",
                Some(b.token.as_str()),
                Some(json!({
                    "entry_id": entry_id,
                    "entry_type": "journal",
                    "note_content": text
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let uri = format!("/api/private-notes/{}?entry_type=journal", entry_id);
    let (_, note) = app.call(Method::GET, &uri, Some(b.token.as_str()), None).await;
    assert_eq!(note["note_content"], "Bring flowers");

    let (status, hidden) = app.call(Method::GET, &uri, Some(a.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(hidden.is_null());
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = TestApp::new();
    let body = json!({ "email": "nobody@example.com", "password": "whatever" });
    for _ in 0..5 {
        let (status, _) = app
            .call(Method::POST, "/api/login", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _) = app
        .call(Method::POST, "/api/login", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
