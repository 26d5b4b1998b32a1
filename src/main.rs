use garcon::access_log::AccessLog;
use garcon::config::Config;
use garcon::server::{self, ServerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let (access_log, _writer) = AccessLog::stdout();
    let ctx = ServerContext::from_config(&cfg, access_log);

    println!(
        "Garçon! Serving content from {} on http://localhost:{}/",
        cfg.root.display(),
        cfg.port
    );

    tokio::select! {
        res = server::listener::run(&cfg, ctx) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
