use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use homelink_accounts::{
    DeviceBindingService, InMemoryVerificationStore, NotificationDispatcher, PushError,
    PushSender, RegistrationService, SubscriptionLedger, VerificationStore,
    DEFAULT_VERIFICATION_TTL,
};
use homelink_auth::{Argon2Hasher, AuthError, JwtTokenIssuer, SocialProvider, TokenVerifier};
use homelink_config::DatabaseConfig;
use homelink_database::initialize_database;
use homelink_gateway::{build_router, GatewayState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

/// Social verifier that knows exactly one valid access token.
struct SingleTokenVerifier;

#[async_trait]
impl TokenVerifier for SingleTokenVerifier {
    async fn exchange(
        &self,
        access_token: &str,
        _provider: SocialProvider,
    ) -> Result<Option<String>, AuthError> {
        Ok((access_token == "valid-naver-token").then(|| "naver-subject-1".to_string()))
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, device_token: &str, title: &str, _body: &str) -> Result<(), PushError> {
        self.sent
            .lock()
            .await
            .push((device_token.to_string(), title.to_string()));
        Ok(())
    }
}

struct TestContext {
    _temp_dir: TempDir,
    verifications: Arc<InMemoryVerificationStore>,
    push: Arc<RecordingSender>,
    state: GatewayState,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("gateway.sqlite").display()),
            max_connections: 5,
        };
        let pool = initialize_database(&config).await?;

        let verifications = Arc::new(InMemoryVerificationStore::new());
        let push = Arc::new(RecordingSender::default());

        let registration = RegistrationService::new(
            pool.clone(),
            verifications.clone(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(JwtTokenIssuer::new("gateway-secret", "homelink", "homelink-app")),
            Arc::new(SingleTokenVerifier),
        );
        let state = GatewayState::new(
            registration,
            DeviceBindingService::new(pool.clone()),
            SubscriptionLedger::new(pool.clone()),
            NotificationDispatcher::new(pool, push.clone()),
        );

        Ok(Self {
            _temp_dir: temp_dir,
            verifications,
            push,
            state,
        })
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn verify_phone(&self, phone: &str) -> TestResult {
        self.verifications
            .mark_verified(phone, DEFAULT_VERIFICATION_TTL)
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    async fn signup(&self, login_id: &str, phone: &str) -> TestResult<String> {
        self.verify_phone(phone).await?;
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users/signup",
                None,
                Some(local_signup(login_id, phone)),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        Ok(body["data"]["token"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no token in {body}"))?
            .to_string())
    }
}

fn local_signup(login_id: &str, phone: &str) -> Value {
    json!({
        "loginId": login_id,
        "password": "homelink1!",
        "phoneNumber": phone,
        "displayName": "Tester",
        "gender": 1,
        "autoLogin": true
    })
}

#[tokio::test]
async fn health_check_reports_ok() -> TestResult {
    let ctx = TestContext::new().await?;
    let (status, body) = ctx.send(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn signup_without_verification_is_conflict() -> TestResult {
    let ctx = TestContext::new().await?;
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/signup",
            None,
            Some(local_signup("alice01", "01012345678")),
        )
        .await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "status": 409, "message": "phone number is not verified" }));
    Ok(())
}

#[tokio::test]
async fn signup_then_profile_round_trip() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.signup("alice01", "01012345678").await?;

    let (status, body) = ctx
        .send(Method::GET, "/api/users/me", Some(&token), None)
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["loginId"], "alice01");
    assert_eq!(body["data"]["provider"], "local");
    assert_eq!(body["data"]["gender"], 1);
    assert_eq!(body["data"]["hasDeviceToken"], false);
    assert!(body["data"].get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_login_id_is_conflict() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.signup("alice01", "01012345678").await?;
    ctx.verify_phone("01099998888").await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/signup",
            None,
            Some(local_signup("alice01", "01099998888")),
        )
        .await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "id already exists");
    Ok(())
}

#[tokio::test]
async fn non_boolean_auto_login_is_bad_request() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.verify_phone("01012345678").await?;

    let mut payload = local_signup("alice01", "01012345678");
    payload["autoLogin"] = json!("yes");
    let (status, body) = ctx
        .send(Method::POST, "/api/users/signup", None, Some(payload))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    Ok(())
}

#[tokio::test]
async fn social_signup_with_stale_token_is_unauthorized() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.verify_phone("01022223333").await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/signup/social",
            None,
            Some(json!({
                "phoneNumber": "01022223333",
                "displayName": "Naver User",
                "provider": "naver",
                "accessToken": "expired-token"
            })),
        )
        .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "token expired, retry");
    Ok(())
}

#[tokio::test]
async fn login_issues_a_fresh_session() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.signup("alice01", "01012345678").await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "loginId": "alice01", "password": "homelink1!" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "loginId": "alice01", "password": "wrong-pass1!" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn authenticated_routes_require_a_bearer_token() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx.send(Method::GET, "/api/subscriptions", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "missing authorization header");

    let (status, _) = ctx
        .send(Method::GET, "/api/subscriptions", Some("not-a-token"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn device_binding_moves_between_owners() -> TestResult {
    let ctx = TestContext::new().await?;
    let first = ctx.signup("ownera1", "01010000001").await?;
    let second = ctx.signup("ownerb1", "01010000002").await?;
    let payload = json!({ "deviceId": "HL-1234", "label": "Living room" });

    for token in [&first, &second] {
        let (status, body) = ctx
            .send(Method::POST, "/api/devices", Some(token), Some(payload.clone()))
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deviceId"], "HL-1234");
    }
    Ok(())
}

#[tokio::test]
async fn subscription_state_follows_subscribe_calls() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.signup("subscr1", "01012340000").await?;

    let (status, body) = ctx
        .send(Method::GET, "/api/subscriptions", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "subscribeState": false, "startDate": null, "endDate": null })
    );

    let (_, first) = ctx
        .send(Method::POST, "/api/subscriptions", Some(&token), None)
        .await?;
    let (status, second) = ctx
        .send(Method::POST, "/api/subscriptions", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["startDate"], second["data"]["startDate"]);
    assert_ne!(first["data"]["endDate"], second["data"]["endDate"]);

    let (_, state) = ctx
        .send(Method::GET, "/api/subscriptions", Some(&token), None)
        .await?;
    assert_eq!(state["data"]["subscribeState"], true);
    assert_eq!(state["data"]["endDate"], second["data"]["endDate"]);
    Ok(())
}

#[tokio::test]
async fn push_requires_a_stored_device_token() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.signup("pusher1", "01011112222").await?;
    let message = json!({ "title": "Filter", "body": "Replace soon" });

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/notifications/push",
            Some(&token),
            Some(message.clone()),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "no device token on file");
    assert!(ctx.push.sent.lock().await.is_empty());

    let (status, _) = ctx
        .send(
            Method::PUT,
            "/api/users/me/device-token",
            Some(&token),
            Some(json!({ "deviceToken": "fcm-token-1" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(Method::POST, "/api/notifications/push", Some(&token), Some(message))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], true);
    assert_eq!(
        ctx.push.sent.lock().await.as_slice(),
        &[("fcm-token-1".to_string(), "Filter".to_string())]
    );
    Ok(())
}
