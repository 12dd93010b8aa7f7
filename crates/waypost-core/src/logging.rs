//! Tracing setup for applications embedding the router.
//!
//! [`setup_logging`] installs a global subscriber configured from
//! [`Settings`]; [`navigation_span`] is the span every navigation attempt
//! runs in.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter comes from
/// `settings.log_level` (e.g. "info", "waypost_navigation=trace"), falling back
/// to `info` when that does not parse. Debug mode logs in a pretty format,
/// anything else as JSON lines. Only the first call installs a subscriber.
pub fn setup_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if settings.debug {
        builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        builder.json().try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Creates a tracing span for one navigation attempt.
///
/// The pipeline enters this span while running guards so that every event
/// emitted during the attempt carries the navigation id and its target.
///
/// # Examples
///
/// ```
/// use waypost_core::logging::navigation_span;
///
/// let span = navigation_span(7, "/users/42");
/// let _guard = span.enter();
/// tracing::info!("running guards");
/// ```
pub fn navigation_span(id: u64, to: &str) -> tracing::Span {
    tracing::info_span!("navigation", id, to)
}
