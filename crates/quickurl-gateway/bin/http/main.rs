mod cli;

use crate::cli::{GeneratorArg, StorageBackendArg, CLI};
use clap::Parser;
use jiff::SignedDuration;
use quickurl_core::UrlStore;
use quickurl_gateway::{App, AppState};
use quickurl_generator::{Generator, GeneratorError, RandomGenerator, SeqGenerator};
use quickurl_shortener::{Shortener, ShortenerService, ShortenerSettings, Sweeper};
use quickurl_storage::{InMemoryStore, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::try_parse()?;
    quickurl_telemetry::init(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %config.storage,
        generator = %config.generator,
        "starting quickurl gateway"
    );

    let shortener = match config.storage {
        StorageBackendArg::InMemory => build_shortener(InMemoryStore::new(), &config)?,
        StorageBackendArg::Sqlite => {
            let store = SqliteStore::connect(&config.sqlite_url).await?;
            build_shortener(store, &config)?
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = Sweeper::new(
        shortener.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    )
    .spawn(shutdown.clone());

    let state = AppState::new(shortener, config.public_base_url);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    sweeper.await?;
    info!("gateway stopped");

    Ok(())
}

fn build_shortener<S: UrlStore>(
    store: S,
    config: &CLI,
) -> Result<Arc<dyn Shortener>, GeneratorError> {
    let shortener = match config.generator {
        GeneratorArg::Random => {
            let generator = RandomGenerator::with_length(usize::from(config.token_length));
            assemble(store, generator, config)
        }
        GeneratorArg::Seq => {
            info!(generator_prefix = %config.generator_prefix, "using sequential tokens");
            let generator = SeqGenerator::new(config.generator_prefix.clone())?;
            assemble(store, generator, config)
        }
    };

    Ok(shortener)
}

fn assemble<S: UrlStore, G: Generator>(
    store: S,
    generator: G,
    config: &CLI,
) -> Arc<dyn Shortener> {
    let settings = ShortenerSettings::builder()
        .default_ttl(SignedDuration::from_secs(config.default_ttl_secs))
        .build();

    Arc::new(ShortenerService::new(store, generator).with_settings(settings))
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickurl_shortener::ShortenParams;

    fn seq_config(prefix: &str) -> CLI {
        CLI::try_parse_from(["gateway", "--generator", "seq", "--generator-prefix", prefix])
            .unwrap()
    }

    #[tokio::test]
    async fn seq_generator_uses_prefix() {
        let shortener = build_shortener(InMemoryStore::new(), &seq_config("node")).unwrap();

        let record = shortener
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();
        assert_eq!(record.token.as_str(), "node000000");
    }

    #[test]
    fn rejects_prefixes_that_cannot_form_tokens() {
        assert!(matches!(
            build_shortener(InMemoryStore::new(), &seq_config("has space")),
            Err(GeneratorError::InvalidPrefix(_))
        ));

        let long = "x".repeat(SeqGenerator::MAX_PREFIX_LEN + 1);
        assert!(matches!(
            build_shortener(InMemoryStore::new(), &seq_config(&long)),
            Err(GeneratorError::PrefixTooLong { .. })
        ));
    }
}
