use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Write extended attributes to an AppleDouble `._` file.
#[derive(Parser)]
#[command(name = "mkdouble", version, about)]
struct Cli {
    /// Attribute with a UTF-8 value, as NAME=VALUE. May be repeated.
    #[arg(short, long = "attr", value_name = "NAME=VALUE")]
    attrs: Vec<String>,

    /// Attribute whose value is read from a file, as NAME=PATH. May be repeated.
    #[arg(short = 'f', long = "attr-file", value_name = "NAME=PATH")]
    attr_files: Vec<String>,

    /// Write the `._` file next to this file.
    #[arg(long = "for", value_name = "PATH", conflicts_with = "output")]
    target: Option<PathBuf>,

    /// Output path. Writes to stdout if neither this nor --for is given.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Default log level, overridden by RUST_LOG.
    #[arg(long, default_value_t = Level::WARN, env = "MKDOUBLE_LOG_LEVEL")]
    log_level: Level,
}

fn split_pair(arg: &str) -> Result<(String, &str)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {arg:?}"))?;
    Ok((name.to_owned(), value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(cli.log_level).into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let mut attributes = BTreeMap::<String, Vec<u8>>::new();
    for arg in &cli.attrs {
        let (name, value) = split_pair(arg)?;
        if attributes.insert(name, value.as_bytes().to_vec()).is_some() {
            bail!("attribute given more than once: {arg:?}");
        }
    }
    for arg in &cli.attr_files {
        let (name, path) = split_pair(arg)?;
        let value = fs::read(path).with_context(|| format!("Reading value from {path}"))?;
        if attributes.insert(name, value).is_some() {
            bail!("attribute given more than once: {arg:?}");
        }
    }

    let file = xattr_file::create(&attributes).context("Encoding attributes")?;

    let output = match (cli.output, cli.target) {
        (Some(output), _) => Some(output),
        (None, Some(target)) => Some(
            xattr_file::sidecar_path(&target)
                .with_context(|| format!("{} has no file name", target.display()))?,
        ),
        (None, None) => None,
    };

    match output {
        Some(path) => {
            fs::write(&path, &file).with_context(|| format!("Writing {}", path.display()))?;
            info!(
                path = %path.display(),
                attributes = attributes.len(),
                bytes = file.len(),
                "Wrote AppleDouble file"
            );
        }
        None => io::stdout()
            .lock()
            .write_all(&file)
            .context("Writing to stdout")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn splits_on_first_equals() {
        let (name, value) = split_pair("user.note=a=b").unwrap();
        assert_eq!(name, "user.note");
        assert_eq!(value, "a=b");

        assert!(split_pair("no-value").is_err());
    }
}
