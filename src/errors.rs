use color_eyre::Result;

/// Installs the eyre report handler, then replaces its panic hook: readable
/// backtraces while developing, a crash report file in release builds.
pub fn init_errors() -> Result<()> {
    color_eyre::install()?;

    #[cfg(debug_assertions)]
    {
        better_panic::Settings::auto()
            .most_recent_first(false)
            .lineno_suffix(true)
            .install();
    }

    #[cfg(not(debug_assertions))]
    {
        human_panic::setup_panic!();
    }

    Ok(())
}
