pub mod auth;
pub mod health;
pub mod todos;
pub mod users;

use actix_web::web;

/// Wires the `/api` scope. Route registration order matters in the `/user`
/// scope: the literal paths (`/me`, `/details`, `/all`) must come before the
/// `/{id}` matchers.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::update_password)
            .service(auth::reset_password),
    )
    .service(
        web::scope("/user")
            .service(users::me)
            .service(users::update_details)
            .service(users::list_accounts)
            .service(users::create_account)
            .service(users::get_account)
            .service(users::delete_account),
    )
    .service(
        web::scope("/todo")
            .service(todos::list_tasks)
            .service(todos::create_task)
            .service(todos::set_status)
            .service(todos::get_task)
            .service(todos::update_task)
            .service(todos::delete_task),
    );
}
