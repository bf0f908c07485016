use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::users::signup_local,
        crate::routes::users::signup_social,
        crate::routes::users::login,
        crate::routes::users::get_current_user,
        crate::routes::users::update_device_token,
        crate::routes::devices::bind_device,
        crate::routes::subscriptions::get_subscription,
        crate::routes::subscriptions::subscribe,
        crate::routes::notifications::push_to_self
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::users::LocalSignupBody,
            crate::routes::users::SocialSignupBody,
            crate::routes::users::LoginBody,
            crate::routes::users::DeviceTokenBody,
            crate::routes::users::SessionResponse,
            crate::routes::users::ProfileResponse,
            crate::routes::users::DeviceTokenUpdatedResponse,
            crate::routes::devices::BindDeviceBody,
            crate::routes::devices::DeviceResponse,
            crate::routes::subscriptions::SubscriptionResponse,
            crate::routes::notifications::PushBody,
            crate::routes::notifications::PushSentResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Users", description = "Signup, login and profile. Success bodies are wrapped as {\"status\", \"data\"}"),
        (name = "Devices", description = "Binding home units to identities"),
        (name = "Subscriptions", description = "Entitlement windows"),
        (name = "Notifications", description = "Push delivery to the caller's device")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}
