use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::{fs::OpenOptions, path::Path};

/// Installs the global logger. With a file, records go there so the
/// alternate screen is never written over; otherwise they go to stderr.
pub(crate) fn init(log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("installing logger")?;
    Ok(())
}
