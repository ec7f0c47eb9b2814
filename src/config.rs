use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket_name: String,
    pub bucket_region: String,
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_url: String,
    pub static_dir: PathBuf,
    pub rate_limit_per_second: u32,
    pub rate_limit_burst: u32,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Check-in image gallery API")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket holding the images (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Bucket region (overrides BUCKET_REGION)
    #[arg(long)]
    pub bucket_region: Option<String>,

    /// Public base URL images are served from (overrides R2_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Directory with the front-end bundle (overrides STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::resolve(args, |name| env::var(name).ok())
    }

    /// Merge CLI args over values looked up with `lookup`.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => bail!("environment variable {} is not set", name),
            }
        };
        let number = |name: &str, default: u32| -> Result<u32> {
            match lookup(name) {
                Some(value) => value
                    .parse::<u32>()
                    .with_context(|| format!("parsing {} value `{}`", name, value)),
                None => Ok(default),
            }
        };

        let env_port = match lookup("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            None => 8080,
        };

        let bucket_name = match args.bucket_name {
            Some(name) => name,
            None => required("BUCKET_NAME")?,
        };
        let public_url = match args.public_url {
            Some(url) => url,
            None => required("R2_PUBLIC_URL")?,
        };
        let static_dir = match args
            .static_dir
            .or_else(|| lookup("STATIC_DIR").map(PathBuf::from))
        {
            Some(dir) => dir,
            None => default_static_dir()?,
        };

        let cfg = Self {
            host: args
                .host
                .or_else(|| lookup("HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            bucket_name,
            bucket_region: args
                .bucket_region
                .or_else(|| lookup("BUCKET_REGION"))
                .unwrap_or_else(|| "auto".into()),
            account_id: required("R2_ACCOUNT_ID")?,
            access_key_id: required("R2_ACCESS_KEY_ID")?,
            secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            public_url,
            static_dir,
            rate_limit_per_second: number("RATE_LIMIT_PER_SECOND", 1)?,
            rate_limit_burst: number("RATE_LIMIT_BURST", 3)?,
        };

        if cfg.rate_limit_per_second == 0 || cfg.rate_limit_burst == 0 {
            bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be positive");
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `dist` next to the running executable.
fn default_static_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("locating executable")?;
    Ok(exe
        .parent()
        .map(|dir| dir.join("dist"))
        .unwrap_or_else(|| PathBuf::from("dist")))
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bucket_name", &self.bucket_name)
            .field("bucket_region", &self.bucket_region)
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("public_url", &self.public_url)
            .field("static_dir", &self.static_dir)
            .field("rate_limit_per_second", &self.rate_limit_per_second)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .finish()
    }
}
