use crate::Environment;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// color-eyre hook for binaries: source locations shown, env hints hidden.
///
/// Call first thing in `main()`; a second install is ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is unset
fn default_directives(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info,sea_orm=warn,sqlx=warn"
    } else {
        "debug,sqlx=warn,hyper=info,h2=info,handlebars=info"
    }
}

/// Install the global subscriber.
///
/// Production writes flattened JSON lines; development writes pretty
/// multi-line events. Both carry [`tracing_error::ErrorLayer`] so `eyre`
/// reports include span traces. Only the first call has an effect.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));

    let (json, pretty) = if environment.is_production() {
        let json = fmt::layer().json().with_target(false).flatten_event(true);
        (Some(json), None)
    } else {
        let pretty = fmt::layer().with_target(true).with_file(false).with_line_number(false).pretty();
        (None, Some(pretty))
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(environment = ?environment, "Tracing initialized");
    }
}
