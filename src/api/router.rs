//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. `Extension<ApiContext>` → 2. CORS → 3. Timeout → 4. Audit logger
//! → 5. Auth validator → 6. Role gate (per route group)

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware::{audit, auth};
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Gates are added with `route_layer` so unmatched paths fall through
    // to the 404 fallback instead of answering 401.
    // Layers run bottom (outermost) to top: auth before role.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/register", post(endpoints::auth::register))
        .route("/login", post(endpoints::auth::login))
        .route("/services", get(endpoints::catalog::services))
        .route("/doctors", get(endpoints::catalog::doctors))
        .route(
            "/doctors/:id/booked-times",
            get(endpoints::catalog::booked_times),
        )
        .with_state(ctx.clone());

    let account = Router::new()
        .route(
            "/profile",
            get(endpoints::profile::get).put(endpoints::profile::update),
        )
        .with_state(ctx.clone())
        .route_layer(from_fn(auth::require_auth));

    let patient = Router::new()
        .route("/appointments", post(endpoints::appointments::book))
        .route(
            "/patient/appointments",
            get(endpoints::appointments::list_for_patient),
        )
        .route(
            "/patient/appointments/:id",
            put(endpoints::appointments::cancel_for_patient),
        )
        .with_state(ctx.clone())
        .route_layer(from_fn(auth::require_patient))
        .route_layer(from_fn(auth::require_auth));

    let doctor = Router::new()
        .route(
            "/doctor/appointments",
            get(endpoints::appointments::list_for_doctor),
        )
        .route(
            "/doctor/appointments/:id",
            put(endpoints::appointments::update_for_doctor),
        )
        .with_state(ctx.clone())
        .route_layer(from_fn(auth::require_doctor))
        .route_layer(from_fn(auth::require_auth));

    let admin = Router::new()
        .route(
            "/admin/appointments",
            get(endpoints::appointments::list_all),
        )
        .route(
            "/admin/appointments/:id",
            put(endpoints::appointments::update_for_admin),
        )
        .route(
            "/admin/services",
            get(endpoints::admin::list_services).post(endpoints::admin::create_service),
        )
        .route(
            "/admin/services/:id",
            put(endpoints::admin::update_service).delete(endpoints::admin::delete_service),
        )
        .route(
            "/admin/doctors",
            get(endpoints::admin::list_doctors).post(endpoints::admin::create_doctor),
        )
        .route(
            "/admin/doctors/:id",
            put(endpoints::admin::update_doctor).delete(endpoints::admin::delete_doctor),
        )
        .with_state(ctx.clone())
        .route_layer(from_fn(auth::require_admin))
        .route_layer(from_fn(auth::require_auth));

    let request_timeout = ctx.core.config.request_timeout;

    Router::new()
        .nest(
            "/api",
            public.merge(account).merge(patient).merge(doctor).merge(admin),
        )
        .fallback(|| async { ApiError::NotFound("Route not found".into()) })
        .layer(from_fn(audit::log_access))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        // Extension must be outermost so middleware can extract ApiContext
        .layer(Extension(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::db::repository;
    use crate::models::{DoctorDetails, NewUser, Role, Slot};

    struct TestApp {
        app: Router,
        core: Arc<CoreState>,
        _tmp: tempfile::TempDir,
    }

    /// Router backed by a fresh, seeded database in a temp directory.
    fn test_app() -> TestApp {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(ServerConfig::for_tests(
            tmp.path().join("clinic.db"),
        )));
        core.initialize().unwrap();
        TestApp {
            app: api_router(core.clone()),
            core,
            _tmp: tmp,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(t) = token {
                builder = builder.header("Authorization", format!("Bearer {t}"));
            }
            let req = match body {
                Some(json) => builder
                    .header("Content-Type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(req).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        /// Insert an account directly and mint its credential.
        fn account(&self, email: &str, role: Role) -> (i64, String) {
            let conn = self.core.open_db().unwrap();
            let id = repository::insert_user(
                &conn,
                &NewUser {
                    email: email.into(),
                    password_hash: "unused".into(),
                    full_name: format!("User {email}"),
                    phone: None,
                    role,
                },
            )
            .unwrap();
            let user = repository::get_user(&conn, id).unwrap().unwrap();
            (id, self.core.issue_token(&user).unwrap())
        }

        /// Doctor account plus doctor record. Returns (doctor_id, token).
        fn doctor(&self, email: &str) -> (i64, String) {
            let (user_id, token) = self.account(email, Role::Doctor);
            let conn = self.core.open_db().unwrap();
            let doctor_id = repository::insert_doctor(
                &conn,
                user_id,
                &DoctorDetails {
                    specialization: "Therapist".into(),
                    experience_years: Some(5),
                    description: None,
                },
            )
            .unwrap();
            (doctor_id, token)
        }

        async fn register(&self, email: &str) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/register",
                    None,
                    Some(json!({"email": email, "password": "secret1", "fullName": "Pat"})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["token"].as_str().unwrap().to_string()
        }

        async fn book(&self, token: &str, doctor_id: i64, time: &str) -> (StatusCode, Value) {
            self.send(
                "POST",
                "/api/appointments",
                Some(token),
                Some(json!({
                    "doctorId": doctor_id,
                    "serviceId": 1,
                    "appointmentDate": tomorrow(),
                    "appointmentTime": time,
                })),
            )
            .await
        }
    }

    fn tomorrow() -> String {
        (chrono::Local::now().date_naive() + chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string()
    }

    // ── Public routes ──────────────────────────────────────

    #[tokio::test]
    async fn health_is_public_and_tagged_with_request_id() {
        let t = test_app();
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let t = test_app();
        let (status, body) = t.send("GET", "/api/nonexistent", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn seeded_services_are_listed() {
        let t = test_app();
        let (status, body) = t.send("GET", "/api/services", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);
        assert!(body[0]["durationMinutes"].as_i64().unwrap() > 0);
    }

    // ── Register / login / book ────────────────────────────

    #[tokio::test]
    async fn register_login_book_and_conflict() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");

        let registration = json!({
            "email": "p@test.com",
            "password": "secret1",
            "fullName": "Pat Patient",
        });
        let (status, body) = t
            .send("POST", "/api/register", None, Some(registration.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "patient");

        let (status, body) = t.send("POST", "/api/register", None, Some(registration)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (status, body) = t
            .send(
                "POST",
                "/api/login",
                None,
                Some(json!({"email": "p@test.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = t.book(&token, doctor_id, "10:00").await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_i64().unwrap() > 0);

        let (status, body) = t.book(&token, doctor_id, "10:00").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "SLOT_CONFLICT");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_login() {
        let t = test_app();
        t.register("p@test.com").await;
        let (status, body) = t
            .send(
                "POST",
                "/api/login",
                None,
                Some(json!({"email": "p@test.com", "password": "nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_LOGIN");
    }

    #[tokio::test]
    async fn register_with_missing_fields_is_rejected() {
        let t = test_app();
        let (status, _) = t
            .send("POST", "/api/register", None, Some(json!({"email": "x@test.com"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let t = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = t.app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn booking_unknown_doctor_is_404() {
        let t = test_app();
        let token = t.register("p@test.com").await;
        let (status, _) = t.book(&token, 9_999, "10:00").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn booking_with_bad_time_is_400() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let token = t.register("p@test.com").await;
        let (status, body) = t.book(&token, doctor_id, "10am").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn booking_accepts_ids_sent_as_form_strings() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let token = t.register("p@test.com").await;

        let (status, body) = t
            .send(
                "POST",
                "/api/appointments",
                Some(&token),
                Some(json!({
                    "doctorId": doctor_id.to_string(),
                    "serviceId": "1",
                    "appointmentDate": tomorrow(),
                    "appointmentTime": "11:00",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_i64().unwrap() > 0);

        let (status, body) = t
            .send(
                "POST",
                "/api/appointments",
                Some(&token),
                Some(json!({
                    "doctorId": "first",
                    "serviceId": "1",
                    "appointmentDate": tomorrow(),
                    "appointmentTime": "12:00",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn admin_doctor_form_accepts_experience_as_string() {
        let t = test_app();
        let (_, admin) = t.account("admin@test.com", Role::Admin);

        let (status, body) = t
            .send(
                "POST",
                "/api/admin/doctors",
                Some(&admin),
                Some(json!({
                    "fullName": "Dr. Form",
                    "email": "form@test.com",
                    "password": "secret1",
                    "specialization": "Surgeon",
                    "experience": "5",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let doctor_id = body["doctorId"].as_i64().unwrap();

        let (_, doctors) = t.send("GET", "/api/admin/doctors", Some(&admin), None).await;
        let created = doctors
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["id"] == doctor_id)
            .unwrap();
        assert_eq!(created["experienceYears"], 5);
    }

    // ── Authentication and roles ───────────────────────────

    #[tokio::test]
    async fn missing_header_is_auth_required() {
        let t = test_app();
        let (status, body) = t.send("GET", "/api/patient/appointments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_token() {
        let t = test_app();
        let (status, body) = t
            .send("GET", "/api/profile", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn patient_is_forbidden_from_admin_routes() {
        let t = test_app();
        let token = t.register("p@test.com").await;
        let (status, body) = t
            .send("GET", "/api/admin/appointments", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn doctor_cannot_book() {
        let t = test_app();
        let (doctor_id, token) = t.doctor("doc@test.com");
        let (status, _) = t.book(&token, doctor_id, "10:00").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // ── Lifecycle over HTTP ────────────────────────────────

    #[tokio::test]
    async fn cancel_then_rebook_same_slot() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let first = t.register("p@test.com").await;
        let second = t.register("q@test.com").await;

        let (_, body) = t.book(&first, doctor_id, "11:00").await;
        let id = body["id"].as_i64().unwrap();

        let uri = format!("/api/doctors/{doctor_id}/booked-times?date={}", tomorrow());
        let (_, times) = t.send("GET", &uri, None, None).await;
        assert_eq!(times["bookedTimes"], json!(["11:00"]));

        let (status, _) = t
            .send("PUT", &format!("/api/patient/appointments/{id}"), Some(&first), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, times) = t.send("GET", &uri, None, None).await;
        assert_eq!(times["bookedTimes"], json!([]));

        let (status, _) = t.book(&second, doctor_id, "11:00").await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn patient_cannot_cancel_someone_elses_appointment() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let owner = t.register("p@test.com").await;
        let intruder = t.register("q@test.com").await;

        let (_, body) = t.book(&owner, doctor_id, "12:00").await;
        let id = body["id"].as_i64().unwrap();

        let (status, _) = t
            .send("PUT", &format!("/api/patient/appointments/{id}"), Some(&intruder), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn doctor_confirms_and_completes_then_cannot_cancel() {
        let t = test_app();
        let (doctor_id, doctor_token) = t.doctor("doc@test.com");
        let patient = t.register("p@test.com").await;

        let (_, body) = t.book(&patient, doctor_id, "09:30").await;
        let id = body["id"].as_i64().unwrap();
        let uri = format!("/api/doctor/appointments/{id}");

        let (status, list) = t
            .send("GET", "/api/doctor/appointments", Some(&doctor_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["patientName"], "Pat");

        for next in ["confirmed", "completed"] {
            let (status, _) = t
                .send("PUT", &uri, Some(&doctor_token), Some(json!({"status": next})))
                .await;
            assert_eq!(status, StatusCode::OK, "transition to {next}");
        }

        let (status, body) = t
            .send("PUT", &uri, Some(&doctor_token), Some(json!({"status": "canceled"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn unknown_status_value_is_bad_request() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let (_, admin) = t.account("admin@test.com", Role::Admin);
        let patient = t.register("p@test.com").await;
        let (_, body) = t.book(&patient, doctor_id, "09:00").await;
        let id = body["id"].as_i64().unwrap();

        let (status, body) = t
            .send(
                "PUT",
                &format!("/api/admin/appointments/{id}"),
                Some(&admin),
                Some(json!({"status": "teleported"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    // ── Profile ────────────────────────────────────────────

    #[tokio::test]
    async fn profile_read_and_update() {
        let t = test_app();
        let token = t.register("p@test.com").await;

        let (status, body) = t.send("GET", "/api/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "p@test.com");
        assert!(body.get("passwordHash").is_none());

        let (status, body) = t
            .send("PUT", "/api/profile", Some(&token), Some(json!({"fullName": "New Name"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], json!(["fullName"]));

        let (status, _) = t.send("PUT", "/api/profile", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = t
            .send(
                "PUT",
                "/api/profile",
                Some(&token),
                Some(json!({"currentPassword": "wrong", "newPassword": "x2"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_LOGIN");
    }

    #[tokio::test]
    async fn profile_email_must_stay_unique() {
        let t = test_app();
        t.register("taken@test.com").await;
        let token = t.register("p@test.com").await;

        let (status, _) = t
            .send(
                "PUT",
                "/api/profile",
                Some(&token),
                Some(json!({"email": "taken@test.com"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ── Admin catalog ──────────────────────────────────────

    #[tokio::test]
    async fn admin_manages_services() {
        let t = test_app();
        let (_, admin) = t.account("admin@test.com", Role::Admin);

        let (status, body) = t
            .send(
                "POST",
                "/api/admin/services",
                Some(&admin),
                Some(json!({"name": "Implant", "price": 50000.0, "duration": 120})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        let (status, _) = t
            .send(
                "PUT",
                &format!("/api/admin/services/{id}"),
                Some(&admin),
                Some(json!({"name": "Implant", "price": 0, "duration": 120})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = t
            .send("DELETE", &format!("/api/admin/services/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t
            .send("DELETE", &format!("/api/admin/services/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn service_in_use_cannot_be_deleted() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let (_, admin) = t.account("admin@test.com", Role::Admin);
        let patient = t.register("p@test.com").await;
        t.book(&patient, doctor_id, "15:00").await;

        let (status, _) = t
            .send("DELETE", "/api/admin/services/1", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_creates_doctor_who_can_log_in() {
        let t = test_app();
        let (_, admin) = t.account("admin@test.com", Role::Admin);

        let new_doctor = json!({
            "fullName": "Dr. Who",
            "email": "who@test.com",
            "password": "tardis",
            "specialization": "Orthodontist",
            "experience": 12,
        });
        let (status, body) = t
            .send("POST", "/api/admin/doctors", Some(&admin), Some(new_doctor.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let doctor_id = body["doctorId"].as_i64().unwrap();

        let (status, _) = t
            .send("POST", "/api/admin/doctors", Some(&admin), Some(new_doctor))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, cards) = t.send("GET", "/api/doctors", None, None).await;
        assert!(cards
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["id"] == doctor_id && c["fullName"] == "Dr. Who"));

        let (status, body) = t
            .send(
                "POST",
                "/api/login",
                None,
                Some(json!({"email": "who@test.com", "password": "tardis"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "doctor");

        let (status, _) = t
            .send("DELETE", &format!("/api/admin/doctors/{doctor_id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn doctor_with_appointments_cannot_be_deleted() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");
        let (_, admin) = t.account("admin@test.com", Role::Admin);
        let patient = t.register("p@test.com").await;
        t.book(&patient, doctor_id, "16:00").await;

        let (status, _) = t
            .send("DELETE", &format!("/api/admin/doctors/{doctor_id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// Issue `DELETE uri` while another connection holds the write lock
    /// with an uncommitted booking for the doctor and service.
    async fn delete_during_booking(
        t: &TestApp,
        uri: &str,
        doctor_id: i64,
        service_id: i64,
    ) -> (StatusCode, Value) {
        let (patient_id, _) = t.account("racer@test.com", Role::Patient);
        let (_, admin) = t.account("admin@test.com", Role::Admin);

        let mut conn = t.core.open_db().unwrap();
        let tx = conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .unwrap();
        let slot = Slot {
            doctor_id,
            date: chrono::NaiveDate::from_ymd_opt(2030, 5, 17).unwrap(),
            time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        repository::insert_appointment(&tx, patient_id, service_id, &slot).unwrap();

        let req = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("Authorization", format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap();
        let pending = tokio::spawn(t.app.clone().oneshot(req));

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        tx.commit().unwrap();

        let response = pending.await.unwrap().unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn doctor_delete_waits_for_concurrent_booking() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");

        let (status, body) =
            delete_during_booking(&t, &format!("/api/admin/doctors/{doctor_id}"), doctor_id, 1)
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn service_delete_waits_for_concurrent_booking() {
        let t = test_app();
        let (doctor_id, _) = t.doctor("doc@test.com");

        let (status, body) =
            delete_during_booking(&t, "/api/admin/services/2", doctor_id, 2).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn deleting_missing_service_is_404() {
        let t = test_app();
        let (_, admin) = t.account("admin@test.com", Role::Admin);
        let (status, _) = t
            .send("DELETE", "/api/admin/services/9999", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
