use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Map the verbosity flags to a log filter.
///
/// Targets match by prefix, `pricewatch` covers the catalog and query crates too.
fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,pricewatch=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,pricewatch=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,pricewatch=info",
        Verbosity::Verbose(2) => "off,pricewatch=debug",
        // Also show the http stack
        Verbosity::Verbose(3) => "debug,pricewatch=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// Initialize the logger or update its filter.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        // Start wide open, the actual level is set below
        let (filter, reload_handle) =
            tracing_subscriber::reload::Layer::new(EnvFilter::new("trace"));
        let log_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(log_layer).init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_filter(Verbosity::Quiet), "off,pricewatch=error");
        assert_eq!(log_filter(Verbosity::default()), "off,pricewatch=warn");
        assert_eq!(log_filter(Verbosity::Verbose(2)), "off,pricewatch=debug");
        assert_eq!(log_filter(Verbosity::Verbose(9)), "trace");
    }

    #[test]
    fn every_filter_parses() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Verbose(0),
            Verbosity::Verbose(1),
            Verbosity::Verbose(2),
            Verbosity::Verbose(3),
            Verbosity::Verbose(4),
        ] {
            assert!(EnvFilter::try_new(log_filter(verbosity)).is_ok());
        }
    }
}
