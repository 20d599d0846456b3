use weather_guard::config::get_configuration;
use weather_guard::startup::Application;
use weather_guard::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(
        String::from("weather_guard"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let address = config.get_address();
    let application = Application::build(config).await?;

    tracing::info!("Server listening on {}", address);

    application.run_until_stop().await
}
