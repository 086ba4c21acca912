use crate::core::config::Config;
use crate::core::errors::{Error, Result};
use crate::core::provider::ProviderId;
use log::{error, info};
use std::{thread, time};

/*-------------------------------------------------------------------------------------------------
  Blocking HTTP Client
-------------------------------------------------------------------------------------------------*/

/// Blocking HTTP GET with a simple exponential-backoff retry, shared by the provider fetchers.
///
/// The underlying `reqwest` client is built per request so the fetchers can run on any blocking
/// thread, including tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    user_agent: String,
    timeout: time::Duration,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
}

impl HttpClient {
    pub fn new(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent().to_string(),
            timeout: config.io_timeout(),
            retry_count: config.retry_count(),
            retry_initial_delay: config.retry_initial_delay(),
            retry_backoff_factor: config.retry_backoff_factor(),
        }
    }

    /// GET `url` and return the response body; non-success statuses are errors.
    pub fn get_text(&self, provider: ProviderId, url: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()?;

        let start_time = time::Instant::now();

        let mut attempt: u32 = 0;
        loop {
            info!("Get {provider} IP ranges; Attempt {attempt}: GET {url}");
            let text: Result<String> = client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.text())
                .map_err(Error::from);

            match text {
                Ok(text) => {
                    info!("Get {provider} IP ranges; Attempt {attempt}: Ok");
                    break Ok(text);
                }
                Err(error) => {
                    error!("Get {provider} IP ranges; Attempt {attempt}: FAILED: {error}");

                    let delay = time::Duration::from_millis(
                        self.retry_initial_delay
                            .saturating_mul(self.retry_backoff_factor.saturating_pow(attempt)),
                    );

                    attempt += 1;

                    if (start_time.elapsed() + delay < self.timeout) && (attempt < self.retry_count)
                    {
                        thread::sleep(delay);
                        continue;
                    } else {
                        break Err(Error::fetch(provider, error));
                    }
                }
            }
        }
    }
}
