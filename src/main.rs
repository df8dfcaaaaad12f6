use env_logger::{Builder, WriteStyle};
use log::error;
use mobilealerts::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging depends on the config, so errors here go to stderr.
    let config = AppConfig::new().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        AppConfig::default()
    });

    Builder::new()
        .filter_level(config.get_log_level())
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    if let Err(e) = mobilealerts::run(config).await {
        error!("Application error: {}", e);
        return Err(e);
    }
    Ok(())
}
