use log::{info, warn};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/*-------------------------------------------------------------------------------------------------
  Configuration Defaults
-------------------------------------------------------------------------------------------------*/

pub const DEFAULT_AWS_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";
pub const DEFAULT_GCP_URL: &str = "https://www.gstatic.com/ipranges/cloud.json";
pub const DEFAULT_AZURE_DETAILS_URL: &str =
    "https://www.microsoft.com/en-us/download/details.aspx?id=56519";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/*-------------------------------------------------------------------------------------------------
  Config Builder
-------------------------------------------------------------------------------------------------*/

/// A builder for [Config]. Provides a setter for each value and a [ConfigBuilder::build] method.
///
/// ```
/// let config = cloudipranges::ConfigBuilder::default()
///     .cache_dir("/tmp/cloudipranges")
///     .cache_ttl(60 * 60) // 1 hour
///     .io_timeout(5000) // 5 seconds
///     .retry_count(4)
///     .build();
/// ```
///
/// [ConfigBuilder::new] sources values from `CLOUDIPRANGES_*` environment variables when set and
/// uses the defaults otherwise; [ConfigBuilder::default] ignores the environment.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    aws_url: String,
    gcp_url: String,
    azure_details_url: String,
    user_agent: String,
    cache_dir: PathBuf,
    cache_ttl: u64,
    io_timeout: u64,
    fetch_timeout: u64,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            aws_url: DEFAULT_AWS_URL.to_string(),
            gcp_url: DEFAULT_GCP_URL.to_string(),
            azure_details_url: DEFAULT_AZURE_DETAILS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_dir: dirs::cache_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(env::temp_dir)
                .join("cloudipranges"), // ${XDG_CACHE_HOME}/cloudipranges
            cache_ttl: 60 * 60, // 1 hour
            io_timeout: 5000,   // 5 seconds
            fetch_timeout: 15000, // 15 seconds
            retry_count: 4,
            retry_initial_delay: 200, // 200 ms
            retry_backoff_factor: 2,
        }
    }
}

impl ConfigBuilder {
    /// Create a new [ConfigBuilder] reading initial values from environment variables when set:
    /// - `CLOUDIPRANGES_AWS_URL`
    /// - `CLOUDIPRANGES_GCP_URL`
    /// - `CLOUDIPRANGES_AZURE_DETAILS_URL`
    /// - `CLOUDIPRANGES_USER_AGENT`
    /// - `CLOUDIPRANGES_CACHE_DIR`
    /// - `CLOUDIPRANGES_CACHE_TTL`
    /// - `CLOUDIPRANGES_IO_TIMEOUT`
    /// - `CLOUDIPRANGES_FETCH_TIMEOUT`
    /// - `CLOUDIPRANGES_RETRY_COUNT`
    /// - `CLOUDIPRANGES_RETRY_INITIAL_DELAY`
    /// - `CLOUDIPRANGES_RETRY_BACKOFF_FACTOR`
    pub fn new() -> Self {
        let default = ConfigBuilder::default();

        Self {
            aws_url: get_env_var("CLOUDIPRANGES_AWS_URL", default.aws_url),
            gcp_url: get_env_var("CLOUDIPRANGES_GCP_URL", default.gcp_url),
            azure_details_url: get_env_var(
                "CLOUDIPRANGES_AZURE_DETAILS_URL",
                default.azure_details_url,
            ),
            user_agent: get_env_var("CLOUDIPRANGES_USER_AGENT", default.user_agent),
            cache_dir: get_env_var("CLOUDIPRANGES_CACHE_DIR", default.cache_dir),
            cache_ttl: get_env_var("CLOUDIPRANGES_CACHE_TTL", default.cache_ttl),
            io_timeout: get_env_var("CLOUDIPRANGES_IO_TIMEOUT", default.io_timeout),
            fetch_timeout: get_env_var("CLOUDIPRANGES_FETCH_TIMEOUT", default.fetch_timeout),
            retry_count: get_env_var("CLOUDIPRANGES_RETRY_COUNT", default.retry_count),
            retry_initial_delay: get_env_var(
                "CLOUDIPRANGES_RETRY_INITIAL_DELAY",
                default.retry_initial_delay,
            ),
            retry_backoff_factor: get_env_var(
                "CLOUDIPRANGES_RETRY_BACKOFF_FACTOR",
                default.retry_backoff_factor,
            ),
        }
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// URL of the AWS `ip-ranges.json` document.
    pub fn aws_url(&mut self, url: &str) -> &mut Self {
        self.aws_url = url.to_string();
        self
    }

    /// URL of the Google Cloud `cloud.json` document.
    pub fn gcp_url(&mut self, url: &str) -> &mut Self {
        self.gcp_url = url.to_string();
        self
    }

    /// URL of the Microsoft download page that links to the current Azure service tags file.
    pub fn azure_details_url(&mut self, url: &str) -> &mut Self {
        self.azure_details_url = url.to_string();
        self
    }

    pub fn user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Directory used by [crate::FileCache].
    pub fn cache_dir<P: AsRef<Path>>(&mut self, cache_dir: P) -> &mut Self {
        self.cache_dir = cache_dir.as_ref().to_path_buf();
        self
    }

    /// Time (in seconds) a cached provider entry stays fresh; defaults to `3600`.
    pub fn cache_ttl(&mut self, cache_ttl: u64) -> &mut Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Upper bound (in milliseconds) for each cache operation and each HTTP request; also the
    /// budget for the HTTP retry loop. Defaults to `5000`.
    pub fn io_timeout(&mut self, io_timeout: u64) -> &mut Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Upper bound (in milliseconds) for one complete provider fetch, including every HTTP
    /// request and retry it makes; defaults to `15000`. A fetch that runs longer is treated as
    /// failed.
    pub fn fetch_timeout(&mut self, fetch_timeout: u64) -> &mut Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn retry_count(&mut self, retry_count: u32) -> &mut Self {
        self.retry_count = retry_count;
        self
    }

    /// The delay between attempts is `retry_initial_delay * (retry_backoff_factor ^ attempt)`.
    pub fn retry_initial_delay(&mut self, retry_initial_delay: u64) -> &mut Self {
        self.retry_initial_delay = retry_initial_delay;
        self
    }

    pub fn retry_backoff_factor(&mut self, retry_backoff_factor: u64) -> &mut Self {
        self.retry_backoff_factor = retry_backoff_factor;
        self
    }

    /*-------------------------------------------------------------------------
      Build Method
    -------------------------------------------------------------------------*/

    pub fn build(&self) -> Config {
        Config {
            aws_url: self.aws_url.clone(),
            gcp_url: self.gcp_url.clone(),
            azure_details_url: self.azure_details_url.clone(),
            user_agent: self.user_agent.clone(),
            cache_dir: self.cache_dir.clone(),
            cache_ttl: self.cache_ttl,
            io_timeout: self.io_timeout,
            fetch_timeout: self.fetch_timeout,
            retry_count: self.retry_count,
            retry_initial_delay: self.retry_initial_delay,
            retry_backoff_factor: self.retry_backoff_factor,
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Config
-------------------------------------------------------------------------------------------------*/

/// Settings shared by the provider fetchers, the caches, and the registry.
#[derive(Debug, Clone)]
pub struct Config {
    aws_url: String,
    gcp_url: String,
    azure_details_url: String,
    user_agent: String,
    cache_dir: PathBuf,
    cache_ttl: u64,
    io_timeout: u64,
    fetch_timeout: u64,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::default().build()
    }
}

impl Config {
    pub fn new() -> Self {
        ConfigBuilder::new().build()
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    pub fn aws_url(&self) -> &str {
        &self.aws_url
    }

    pub fn gcp_url(&self) -> &str {
        &self.gcp_url
    }

    pub fn azure_details_url(&self) -> &str {
        &self.azure_details_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// ```
    /// let config = cloudipranges::Config::default();
    /// assert_eq!(config.cache_ttl().as_secs(), 3600);
    /// ```
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// ```
    /// let config = cloudipranges::Config::default();
    /// assert_eq!(config.io_timeout().as_millis(), 5000);
    /// ```
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout)
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_initial_delay(&self) -> u64 {
        self.retry_initial_delay
    }

    pub fn retry_backoff_factor(&self) -> u64 {
        self.retry_backoff_factor
    }
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

/// Get and parse an environment variable value or return a default value.
fn get_env_var<T: std::str::FromStr>(env_var: &str, default: T) -> T {
    env::var(env_var)
        .ok()
        .and_then(|value| {
            value
                .parse::<T>()
                .inspect(|_| info!("Using {}: {}", env_var, value))
                .inspect_err(|_| warn!("Invalid {}: {}", env_var, value))
                .ok()
        })
        .unwrap_or(default)
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
