use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::session::SessionManager;
use crate::cache::RedisCache;
use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::repository::{BookStore, RoleStore, UserStore};
use crate::routes::{admin, auth, books, health_check, password_reset, roles};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    cache: RedisCache,
    email_client: EmailClient,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let users = web::Data::new(UserStore::new(connection.clone()));
    let role_store = web::Data::new(RoleStore::new(connection.clone()));
    let book_store = web::Data::new(BookStore::new(connection));
    let cache = web::Data::new(cache);
    let session = web::Data::new(SessionManager::new(settings.jwt.clone()));
    let jwt_config = web::Data::new(settings.jwt);
    let email_client = web::Data::new(email_client);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(users.clone())
            .app_data(role_store.clone())
            .app_data(book_store.clone())
            .app_data(cache.clone())
            .app_data(session.clone())
            .app_data(jwt_config.clone())
            .app_data(email_client.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(auth::register))
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/refresh", web::post().to(auth::refresh))
            .route("/auth/logout", web::post().to(auth::logout))
            .route(
                "/auth/password/forgot",
                web::post().to(password_reset::forgot_password),
            )
            .route(
                "/auth/password/reset",
                web::post().to(password_reset::reset_password),
            )

            // Protected routes (require JWT authentication)
            .service(
                web::scope("")
                    .wrap(JwtMiddleware::new(
                        session.clone(),
                        users.clone(),
                        role_store.clone(),
                    ))
                    .route("/auth/me", web::get().to(auth::get_current_user))
                    .route("/books", web::get().to(books::list_books))
                    .route("/books", web::post().to(books::create_book))
                    .route("/books/{id}", web::get().to(books::get_book))
                    .route("/books/{id}", web::put().to(books::update_book))
                    .route("/books/{id}", web::delete().to(books::delete_book))
                    .route("/admin/users", web::get().to(admin::list_users))
                    .route(
                        "/admin/users/{id}/role",
                        web::put().to(admin::update_user_role),
                    )
                    .route("/admin/users/{id}", web::delete().to(admin::delete_user))
                    .route("/roles", web::get().to(roles::list_roles))
                    .route("/roles", web::post().to(roles::create_role))
                    .route("/roles/{id}", web::put().to(roles::update_role_name))
                    .route("/roles/{id}", web::delete().to(roles::delete_role)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
