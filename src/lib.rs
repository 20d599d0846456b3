pub mod config;
pub mod dispatch;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod weather_client;
