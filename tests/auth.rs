use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use dotenv::dotenv;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use todoserve::auth::{AuthMiddleware, TokenService};
use todoserve::routes;

const TEST_SECRET: &str = "integration-test-secret";

async fn connect() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

async fn test_app(
    pool: PgPool,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(web::Data::new(TokenService::new(TEST_SECRET, 30)))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

async fn cleanup(pool: &PgPool, email: &str) {
    let _ = sqlx::query(
        "DELETE FROM tasks WHERE owner_id IN (SELECT id FROM accounts WHERE email = $1)",
    )
    .bind(email)
    .execute(pool)
    .await;
    let _ = sqlx::query("DELETE FROM accounts WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let pool = connect().await;
    let email = "auth_flow@example.com";
    cleanup(&pool, email).await;

    let app = test_app(pool.clone()).await;

    // Register
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Flow User",
            "email": email,
            "password": "Password123!",
            "phone": "555-0100"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(status, 201, "registration failed: {:?}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["phone"], "555-0100");
    assert!(body["data"].get("password_hash").is_none());
    let account_id: Uuid = serde_json::from_value(body["data"]["id"].clone()).unwrap();

    // Duplicate registration fails
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Flow User",
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "User with this email already exists");

    // Login with wrong password
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": "WrongPassword1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid credentials");

    // Login with unknown email
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No Email found");

    // Successful login
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let set_cookie = resp
        .headers()
        .get(actix_web::http::header::SET_COOKIE)
        .expect("login should set a cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("access_token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"].get("password_hash").is_none());

    // The token's embedded identity is the account id
    let claims = TokenService::new(TEST_SECRET, 30).verify(&token).unwrap();
    assert_eq!(claims.sub, account_id);

    // The token grants access to a protected route
    let req = test::TestRequest::get()
        .uri("/api/user/me")
        .append_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], email);

    cleanup(&pool, email).await;
}

#[actix_rt::test]
async fn test_register_admin_role_is_coerced_to_user() {
    let pool = connect().await;
    let email = "sneaky_admin@example.com";
    cleanup(&pool, email).await;

    let app = test_app(pool.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Sneaky",
            "email": email,
            "password": "Password123!",
            "role": "admin"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["role"], "user");

    // And the stored row agrees
    let stored_role: String =
        sqlx::query_scalar("SELECT role::text FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored_role, "user");

    cleanup(&pool, email).await;
}

#[actix_rt::test]
async fn test_unauthenticated_requests_rejected() {
    let pool = connect().await;
    let app = test_app(pool).await;

    // No token at all
    let req = test::TestRequest::get().uri("/api/user/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not authorized to access this route");

    // Garbage token: same generic message, no hint at the cause
    let req = test::TestRequest::get()
        .uri("/api/user/me")
        .append_header(("Authorization", "Bearer not-a-real-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not authorized to access this route");

    // Token signed with a different secret
    let forged = TokenService::new("some-other-secret", 30)
        .issue(Uuid::new_v4())
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/user/me")
        .append_header(("Authorization", format!("Bearer {}", forged)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not authorized to access this route");
}

#[actix_rt::test]
async fn test_cookie_token_is_accepted() {
    let pool = connect().await;
    let email = "cookie_user@example.com";
    cleanup(&pool, email).await;

    let app = test_app(pool.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Cookie User",
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/user/me")
        .cookie(actix_web::cookie::Cookie::new("access_token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], email);

    cleanup(&pool, email).await;
}

#[actix_rt::test]
async fn test_update_password_flow() {
    let pool = connect().await;
    let email = "pw_change@example.com";
    cleanup(&pool, email).await;

    let app = test_app(pool.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Password Changer",
            "email": email,
            "password": "OldPassword1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Wrong current password
    let req = test::TestRequest::put()
        .uri("/api/auth/updatepassword")
        .append_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "currentPassword": "NotTheOldPassword",
            "newPassword": "NewPassword1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Current password is incorrect");

    // Correct current password
    let req = test::TestRequest::put()
        .uri("/api/auth/updatepassword")
        .append_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "currentPassword": "OldPassword1",
            "newPassword": "NewPassword1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(!body["data"]["token"].as_str().unwrap().is_empty());

    // Old password no longer works, new one does
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": "OldPassword1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": "NewPassword1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // The pre-change token stays valid (no revocation)
    let req = test::TestRequest::get()
        .uri("/api/user/me")
        .append_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    cleanup(&pool, email).await;
}

#[actix_rt::test]
async fn test_token_for_deleted_account_rejected() {
    let pool = connect().await;
    let email = "ghost@example.com";
    cleanup(&pool, email).await;

    let app = test_app(pool.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Ghost",
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Remove the account out from under the still-valid token
    cleanup(&pool, email).await;

    let req = test::TestRequest::get()
        .uri("/api/user/me")
        .append_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not authorized to access this route");
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let pool = connect().await;
    let app = test_app(pool).await;

    let test_cases = vec![
        (
            json!({ "email": "t@example.com", "password": "Password123!" }),
            400,
            "missing name",
        ),
        (
            json!({ "name": "T", "password": "Password123!" }),
            400,
            "missing email",
        ),
        (
            json!({ "name": "T", "email": "t@example.com" }),
            400,
            "missing password",
        ),
        (
            json!({ "name": "T", "email": "invalid-email", "password": "Password123!" }),
            422,
            "invalid email format",
        ),
        (
            json!({ "name": "", "email": "t@example.com", "password": "Password123!" }),
            422,
            "empty name",
        ),
        (
            json!({ "name": "T", "email": "t@example.com", "password": "123" }),
            422,
            "password too short",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status().as_u16(),
            expected_status,
            "case failed: {}",
            description
        );
    }
}
