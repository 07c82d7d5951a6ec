use std::env;

use tokio::net::TcpListener;

use wp_feed::client::{self, Client};
use wp_feed_proxy::{cli, router, Settings};

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "wp_feed_proxy=info,wp_feed=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse(env::args().collect());

    setup_logging();

    let client = Client::new(client::Config {
        base_url: args.backend,
        timeout: args.timeout,
    })?;

    let router = router(
        client,
        Settings {
            site: args.site,
            per_page: args.per_page,
            events_per_page: args.events_per_page,
        },
    );

    let listener = TcpListener::bind(args.address).await?;
    log::info!("Listening at http://{}", args.address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutting down"),
        Err(err) => {
            log::error!("Failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}
