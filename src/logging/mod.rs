/*!
 * Logging Module
 * Centralized logging configuration and utilities
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::AppConfig;
use self::config::LogSettings;

/// Initialize the logging system.
///
/// The returned guards flush the non-blocking writers and must be held for
/// the lifetime of the process.
pub fn init(app: &AppConfig) -> Vec<WorkerGuard> {
    let settings = LogSettings::from_env(app);

    if let Err(e) = std::fs::create_dir_all(&settings.dir) {
        eprintln!("cannot create log directory {}: {}", settings.dir.display(), e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&settings.dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&settings.dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.filter_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if settings.json {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = settings.error_file.then(|| {
            fmt::layer()
                .json()
                .with_writer(error_writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::ERROR)
        });

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber.with(file_layer).with(console_layer).try_init()
    };

    if let Err(e) = installed {
        eprintln!("logging already initialized: {}", e);
    }

    tracing::info!(
        environment = %app.environment,
        level = %settings.level,
        dir = %settings.dir.display(),
        "Logging initialized"
    );

    vec![file_guard, error_guard, console_guard]
}
