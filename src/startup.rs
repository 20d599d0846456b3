use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings, StoreBackend};
use crate::dispatch::Dispatcher;
use crate::email_client::EmailClient;
use crate::routes::{
    handle_list_subscriptions, handle_status, handle_trigger_dispatch, health_check, AdminApiKey,
};
use crate::scheduler::run_dispatch_schedule;
use crate::store::{InMemorySubscriptionStore, PostgresSubscriptionStore, SubscriptionStore};
use crate::weather_client::WeatherClient;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    /// Builds the application with the store backend selected in `config.store`.
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let store = build_store(&config);

        Self::build_with_store(config, store).await
    }

    pub async fn build_with_store(
        config: Settings,
        store: Arc<dyn SubscriptionStore>,
    ) -> Result<Self, std::io::Error> {
        let dispatcher = Arc::new(build_dispatcher(&config, store.clone())?);
        let schedule_interval = config
            .dispatch
            .get_schedule_interval()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

        if let Some(every) = schedule_interval {
            tokio::spawn(run_dispatch_schedule(dispatcher.clone(), every));
        }

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            dispatcher,
            store,
            AdminApiKey(config.application.admin_api_key.clone()),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn build_store(config: &Settings) -> Arc<dyn SubscriptionStore> {
    match config.store.backend {
        StoreBackend::Postgres => Arc::new(PostgresSubscriptionStore::new(
            get_connection_db_pool(&config.database),
        )),
        StoreBackend::InMemory => {
            tracing::warn!("Using the in-memory subscription store, nothing will be persisted");
            Arc::new(InMemorySubscriptionStore::new())
        }
    }
}

fn build_dispatcher(
    config: &Settings,
    store: Arc<dyn SubscriptionStore>,
) -> Result<Dispatcher, std::io::Error> {
    let invalid_config = |err: String| std::io::Error::new(std::io::ErrorKind::InvalidInput, err);
    let client_error = |err: reqwest::Error| std::io::Error::new(std::io::ErrorKind::Other, err);

    let policy = config.dispatch.get_policy().map_err(invalid_config)?;
    let sender_email = config.get_email_client_sender().map_err(invalid_config)?;
    let email_client = EmailClient::new(
        config.email_client.base_url.clone(),
        sender_email,
        config.email_client.api_key.clone(),
        config.email_client.unsubscribe_base_url.clone(),
        Some(config.email_client.get_timeout()),
    )
    .map_err(client_error)?;
    let weather_client = WeatherClient::new(
        config.weather_client.base_url.clone(),
        config.weather_client.api_key.clone(),
        Some(config.weather_client.get_timeout()),
    )
    .map_err(client_error)?;

    Ok(Dispatcher::new(
        store,
        Arc::new(weather_client),
        Arc::new(email_client),
        policy,
    ))
}

pub fn run(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn SubscriptionStore>,
    admin_api_key: AdminApiKey,
) -> Result<Server, std::io::Error> {
    let dispatcher = web::Data::from(dispatcher);
    let store: web::Data<dyn SubscriptionStore> = web::Data::from(store);
    let admin_api_key = web::Data::new(admin_api_key);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/admin/dispatch", web::post().to(handle_trigger_dispatch))
            .route("/admin/status", web::get().to(handle_status))
            .route("/admin/subscriptions", web::get().to(handle_list_subscriptions))
            .app_data(dispatcher.clone())
            .app_data(store.clone())
            .app_data(admin_api_key.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
