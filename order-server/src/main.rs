use order_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    dotenv::dotenv().ok();

    let config = Config::from_env();
    order_server::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("Order server starting...");

    // 2. Initialize application state (store + notifier + core components)
    let state = ServerState::initialize(&config);

    // 3. Run the HTTP server until shutdown
    let server = Server::with_state(config, state);
    server.run().await
}
