use anyhow::Result;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Default directive when `--log` is not given. Store failures surface as warnings.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Install the global subscriber, writing compact lines to stderr so command
/// output on stdout stays clean. `RUST_LOG` directives layer on top.
pub fn init_tracing(filter: Option<String>) -> Result<()> {
    let filter = filter.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let directive: Directive = filter.parse()?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        assert!(init_tracing(Some("studyplan=loud".into())).is_err());
    }

    #[test]
    fn repeated_initialisation_is_harmless() {
        init_tracing(Some("debug".into())).unwrap();
        init_tracing(None).unwrap();
    }
}
