#![deny(unused_crate_dependencies)]

//! Logging initialization for the exporter.
//!
//! Output is plain text by default and JSON when the `--json` flag is set.
//! The filter directive comes from the `--log-level` flag; `RUST_LOG` style
//! directives are also accepted.
//!
//! Integration with sentry for catching errors and react on them immediately
//! <https://docs.sentry.io/platforms/rust/>

use std::{backtrace::Backtrace, str::FromStr};

use sentry::{types::Dsn, ClientInitGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SENTRY_URL_VAR: &str = "COSMOS_EXPORTER_SENTRY_URL";

fn get_sentry_url() -> Option<Dsn> {
    if let Ok(sentry_url) = std::env::var(SENTRY_URL_VAR) {
        if let Ok(sentry_url) = Dsn::from_str(sentry_url.as_str()) {
            return Some(sentry_url);
        }
    }
    None
}

/// Initialize logging with tracing and set up log format.
///
/// If the sentry URL is provided via an environment variable, this function
/// will also initialize sentry. Returns a sentry client guard that must be
/// kept alive for the process lifetime.
#[must_use]
pub fn init(log_level: &str, json: bool) -> Option<ClientInitGuard> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let timer = tracing_subscriber::fmt::time::UtcTime::rfc_3339();
        // must be set before sentry hook for sentry to function
        install_pretty_panic_hook();

        tracing_subscriber::registry()
            .with(
                fmt::Layer::default()
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(timer)
                    .json(),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::Layer::default())
            .with(filter)
            .init();
    }

    get_sentry_url().map(|sentry_url| {
        let options = sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        };

        sentry::init((sentry_url, options))
    })
}

/// Format panics like tracing::error
fn install_pretty_panic_hook() {
    // This hook does not use the previous one set because it leads to 2 logs:
    // the first is the default panic log and the second is from this code. To avoid this situation,
    // hook must be installed first
    std::panic::set_hook(Box::new(move |panic_info| {
        let backtrace = Backtrace::capture();
        let timestamp = chrono::Utc::now();
        let panic_message = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else {
            "Panic occurred without additional info"
        };

        let panic_location = panic_info
            .location()
            .map(|val| val.to_string())
            .unwrap_or_else(|| "Unknown location".to_owned());

        let backtrace_str = format!("{}", backtrace);
        let timestamp_str = format!("{}", timestamp.format("%Y-%m-%dT%H:%M:%S%.fZ"));

        println!(
            "{}",
            serde_json::json!({
                "timestamp": timestamp_str,
                "level": "CRITICAL",
                "fields": {
                    "message": panic_message,
                    "location": panic_location,
                    "backtrace": backtrace_str,
                }
            })
        );
    }));
}
