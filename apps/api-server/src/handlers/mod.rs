//! HTTP handlers.

pub mod auth;
pub mod health;
pub mod posts;

use actix_web::web;

/// Wire up all routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/admin/posts")
                    .route("", web::post().to(posts::create))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_published))
                    .route("/{identifier}", web::get().to(posts::show)),
            ),
    );
}
