use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;

use crate::authentication::{JwtSecret, reject_anonymous_users};
use crate::configuration::{DatabaseSettings, Settings};
use crate::mailer::Mailer;
use crate::routes::{
    ApiError, create_newsletter, delete_newsletter, delete_subscriber, get_analytics,
    get_newsletter, health_check, list_newsletters, list_subscribers, send_newsletter, subscribe,
    unsubscribe, update_newsletter, update_subscriber,
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let mailer = config.mailer()?;
        let connection_pool = get_connection_pool(&config.database);

        let address = format!("{}:{}", config.app.host, config.app.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, connection_pool, mailer, config.app.jwt_secret)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    mailer: Mailer,
    jwt_secret: SecretString,
) -> Result<Server, anyhow::Error> {
    let db_pool = web::Data::new(db_pool);
    let mailer = web::Data::new(mailer);
    let jwt_secret = web::Data::new(JwtSecret(jwt_secret));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::ValidationError(format!("Invalid request body: {err}")).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                ApiError::ValidationError(format!("Invalid query string: {err}")).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                ApiError::ValidationError(format!("Invalid path: {err}")).into()
            }))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/newsletters")
                    .route("/subscribe", web::post().to(subscribe))
                    .route("/unsubscribe", web::post().to(unsubscribe))
                    .service(
                        web::scope("")
                            .wrap(from_fn(reject_anonymous_users))
                            .route("/subscribers", web::get().to(list_subscribers))
                            .route("/subscribers/{id}", web::put().to(update_subscriber))
                            .route("/subscribers/{id}", web::delete().to(delete_subscriber))
                            .route("/analytics", web::get().to(get_analytics))
                            .route("", web::get().to(list_newsletters))
                            .route("", web::post().to(create_newsletter))
                            .route("/{id}", web::get().to(get_newsletter))
                            .route("/{id}", web::put().to(update_newsletter))
                            .route("/{id}", web::delete().to(delete_newsletter))
                            .route("/{id}/send", web::post().to(send_newsletter)),
                    ),
            )
            .app_data(db_pool.clone())
            .app_data(mailer.clone())
            .app_data(jwt_secret.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_pool(db_config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_config.connect_options())
}
