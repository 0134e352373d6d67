use clap::Parser;

use yt_mux_server_lib::config::ServerConfig;
use yt_mux_server_lib::tracing_setup::init_tracing;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    if let Err(e) = init_tracing(config.log_level.as_tracing_level()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = yt_mux_server_lib::run(config).await {
        tracing::error!(error = %e, "server failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
