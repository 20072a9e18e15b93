use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::SessionService;
use crate::configuration::Settings;
use crate::logger::LoggerMiddleware;
use crate::middleware::{CorsMiddleware, JwtMiddleware};
use crate::routes::{
    create_asset, create_category, create_financial_asset, delete_asset, get_asset, health_check,
    list_assets, list_categories, list_financial_assets, login, logout, me, refresh, signup,
    update_asset,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    session: SessionService,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let base_path = settings.application.base_path();
    let allowed_origins = settings.application.allowed_origins();
    let verifier = session.verifier();

    let connection = web::Data::new(connection);
    let session = web::Data::new(session);
    let application = web::Data::new(settings.application);
    let auth = web::Data::new(settings.auth);

    let server = HttpServer::new(move || {
        let health_path = format!("{}/health", base_path);

        App::new()
            // Global middleware
            .wrap(CorsMiddleware::new(allowed_origins.clone()))
            .wrap(LoggerMiddleware::new(health_path.clone()))
            .wrap(Logger::default().exclude(health_path))

            // Shared state
            .app_data(connection.clone())
            .app_data(session.clone())
            .app_data(application.clone())
            .app_data(auth.clone())

            .service(
                web::scope(&base_path)
                    // Public routes
                    .route("/health", web::get().to(health_check))
                    .service(
                        web::scope("/users")
                            .route("/signup", web::post().to(signup))
                            .route("/login", web::post().to(login))
                            .route("/refresh", web::post().to(refresh))
                            .route("/logout", web::post().to(logout))
                            .service(
                                web::resource("/me")
                                    .wrap(JwtMiddleware::new(verifier.clone()))
                                    .route(web::get().to(me)),
                            ),
                    )
                    .service(
                        web::resource("/financial-assets")
                            .guard(guard::Get())
                            .route(web::get().to(list_financial_assets)),
                    )
                    .service(
                        web::resource("/financial-assets")
                            .guard(guard::Post())
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::post().to(create_financial_asset)),
                    )
                    .service(
                        web::resource("/categories")
                            .guard(guard::Get())
                            .route(web::get().to(list_categories)),
                    )
                    .service(
                        web::resource("/categories")
                            .guard(guard::Post())
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::post().to(create_category)),
                    )
                    // Protected routes (require JWT authentication)
                    .service(
                        web::scope("/assets")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route("", web::post().to(create_asset))
                            .route("", web::get().to(list_assets))
                            .route("/{id}", web::get().to(get_asset))
                            .route("/{id}", web::put().to(update_asset))
                            .route("/{id}", web::delete().to(delete_asset)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
