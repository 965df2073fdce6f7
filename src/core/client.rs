use crate::core::errors::{Error, Result};
use crate::core::range_index::RangeIndex;
use log::{info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::{thread, time};

/*-------------------------------------------------------------------------------------------------
  Simple Interface
-------------------------------------------------------------------------------------------------*/

/// _**Simple library interface**_ retrieves the IPtoASN dataset using the default client
/// configuration and builds a [RangeIndex] you can [resolve](RangeIndex::resolve) addresses
/// against.
///
/// ```no_run
/// let index = ip2asn::get_index()?;
/// println!("{}", index.resolve("1.1.1.1"));
/// # Ok::<(), ip2asn::Error>(())
/// ```
pub fn get_index() -> Result<RangeIndex> {
    Client::new().get_index()
}

/*-------------------------------------------------------------------------------------------------
  Client Builder
-------------------------------------------------------------------------------------------------*/

/// A builder for the [Client] struct that allows you to customize the client configuration.
///
/// ```
/// let client = ip2asn::ClientBuilder::new()
///     .url("https://iptoasn.com/data/ip2asn-v4.tsv.gz")
///     .cache_file("/tmp/ip2asn-v4.tsv.gz")
///     .cache_time(60 * 60) // 1 hour
///     .retry_count(4)
///     .retry_initial_delay(200) // 200 ms
///     .retry_backoff_factor(2)
///     .retry_timeout(30_000) // 30 seconds
///     .build();
/// ```
///
/// The [ClientBuilder::new] method sources configuration values from environment variables
/// when set and uses default values otherwise. [ClientBuilder::default] ignores the
/// environment.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    url: String,
    user_agent: String,
    cache_file: PathBuf,
    cache_time: u64,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
    retry_timeout: u64,
}

/*--------------------------------------------------------------------------------------
  Client Builder Implementation
--------------------------------------------------------------------------------------*/

impl Default for ClientBuilder {
    /// Create a new [ClientBuilder] with default configuration values.
    ///
    /// ```
    /// let client = ip2asn::ClientBuilder::default().build();
    ///
    /// assert_eq!(client.url(), "https://iptoasn.com/data/ip2asn-v4.tsv.gz");
    /// assert_eq!(client.cache_time(), 86400);
    /// assert_eq!(client.retry_count(), 4);
    /// assert_eq!(client.retry_initial_delay(), 200);
    /// assert_eq!(client.retry_backoff_factor(), 2);
    /// assert_eq!(client.retry_timeout(), 30000);
    /// ```
    fn default() -> Self {
        Self {
            url: "https://iptoasn.com/data/ip2asn-v4.tsv.gz".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            cache_file: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ip2asn")
                .join("ip2asn-v4.tsv.gz"), // ${CACHE_DIR}/ip2asn/ip2asn-v4.tsv.gz
            cache_time: 24 * 60 * 60, // 24 hours
            retry_count: 4,
            retry_initial_delay: 200, // 200 ms
            retry_backoff_factor: 2,
            retry_timeout: 30_000, // 30 seconds
        }
    }
}

impl ClientBuilder {
    /// Create a new [ClientBuilder] reading initial configuration values from environment
    /// variables when set and default values when they are not set.
    ///
    /// The environment variables used to set the initial configuration values are:
    /// - `IP2ASN_URL`
    /// - `IP2ASN_CACHE_FILE`
    /// - `IP2ASN_CACHE_TIME`
    /// - `IP2ASN_RETRY_COUNT`
    /// - `IP2ASN_RETRY_INITIAL_DELAY`
    /// - `IP2ASN_RETRY_BACKOFF_FACTOR`
    /// - `IP2ASN_RETRY_TIMEOUT`
    pub fn new() -> Self {
        let default = ClientBuilder::default();

        Self {
            url: get_env_var("IP2ASN_URL", default.url),
            user_agent: default.user_agent,
            cache_file: get_env_var("IP2ASN_CACHE_FILE", default.cache_file),
            cache_time: get_env_var("IP2ASN_CACHE_TIME", default.cache_time),
            retry_count: get_env_var("IP2ASN_RETRY_COUNT", default.retry_count),
            retry_initial_delay: get_env_var(
                "IP2ASN_RETRY_INITIAL_DELAY",
                default.retry_initial_delay,
            ),
            retry_backoff_factor: get_env_var(
                "IP2ASN_RETRY_BACKOFF_FACTOR",
                default.retry_backoff_factor,
            ),
            retry_timeout: get_env_var("IP2ASN_RETRY_TIMEOUT", default.retry_timeout),
        }
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// Set the URL used to download the dataset; defaults to
    /// `https://iptoasn.com/data/ip2asn-v4.tsv.gz`.
    pub fn url<'s>(&'s mut self, url: &str) -> &'s mut Self {
        self.url = url.to_string();
        self
    }

    /// Set the `User-Agent` header sent with download requests; defaults to `Mozilla/5.0`.
    /// The IPtoASN host rejects requests without a browser-like user agent.
    pub fn user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Set the file path used to cache the gzip-compressed dataset; defaults to
    /// `${CACHE_DIR}/ip2asn/ip2asn-v4.tsv.gz`.
    pub fn cache_file<P: AsRef<Path>>(&mut self, cache_file: P) -> &mut Self {
        self.cache_file = cache_file.as_ref().to_path_buf();
        self
    }

    /// Set the cache-time duration - the amount of time (in seconds) the locally cached
    /// dataset is considered fresh; defaults to 24 hours (`86400` seconds).
    pub fn cache_time(&mut self, cache_time: u64) -> &mut Self {
        self.cache_time = cache_time;
        self
    }

    /// Set the number of attempts to download the dataset; defaults to `4`.
    pub fn retry_count(&mut self, retry_count: u32) -> &mut Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the initial delay (in milliseconds) between download attempts; defaults to
    /// `200` milliseconds.
    ///
    /// The delay between attempts is `retry_initial_delay * (retry_backoff_factor ^ attempt)`.
    pub fn retry_initial_delay(&mut self, retry_initial_delay: u64) -> &mut Self {
        self.retry_initial_delay = retry_initial_delay;
        self
    }

    /// Set the factor used to increase the delay between download attempts; defaults to `2`.
    pub fn retry_backoff_factor(&mut self, retry_backoff_factor: u64) -> &mut Self {
        self.retry_backoff_factor = retry_backoff_factor;
        self
    }

    /// Set the maximum time (in milliseconds) to keep retrying the download; defaults to
    /// `30000` milliseconds (30 seconds).
    pub fn retry_timeout(&mut self, retry_timeout: u64) -> &mut Self {
        self.retry_timeout = retry_timeout;
        self
    }

    /*-------------------------------------------------------------------------
      Build Method
    -------------------------------------------------------------------------*/

    pub fn build(&self) -> Client {
        Client {
            url: self.url.clone(),
            user_agent: self.user_agent.clone(),
            cache_file: self.cache_file.clone(),
            cache_time: self.cache_time,
            retry_count: self.retry_count,
            retry_initial_delay: self.retry_initial_delay,
            retry_backoff_factor: self.retry_backoff_factor,
            retry_timeout: self.retry_timeout,
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Client
-------------------------------------------------------------------------------------------------*/

/// A client for retrieving the IPtoASN dataset from the cache file, when available and fresh,
/// or from the URL when the cache is stale or unavailable. Downloads are retried with an
/// exponential backoff, and a stale cache is used when every attempt fails.
///
/// ```no_run
/// let client = ip2asn::Client::new();
/// let index = client.get_index()?;
/// # Ok::<(), ip2asn::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    user_agent: String,
    cache_file: PathBuf,
    cache_time: u64,
    retry_count: u32,
    retry_initial_delay: u64,
    retry_backoff_factor: u64,
    retry_timeout: u64,
}

/*--------------------------------------------------------------------------------------
  Client Implementation
--------------------------------------------------------------------------------------*/

impl Default for Client {
    /// Create a new [Client] with default configuration values.
    fn default() -> Self {
        ClientBuilder::default().build()
    }
}

impl Client {
    pub fn new() -> Self {
        ClientBuilder::new().build()
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Get the URL used to download the dataset.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get the file path used to cache the dataset.
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Get the cache-time duration in seconds.
    pub fn cache_time(&self) -> u64 {
        self.cache_time
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

    pub fn retry_timeout(&self) -> u64 {
        self.retry_timeout
    }

    /*-------------------------------------------------------------------------
      Get Index
    -------------------------------------------------------------------------*/

    /// Retrieves the dataset and builds a new [RangeIndex]. Uses the locally cached dataset
    /// when available and fresh; downloads it when the cache is stale or unavailable.
    pub fn get_index(&self) -> Result<RangeIndex> {
        let data = self.get_dataset()?;
        RangeIndex::from_gzip_tsv(data.as_slice())
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    /// Get the compressed dataset from the cache file or URL.
    fn get_dataset(&self) -> Result<Vec<u8>> {
        info!("Cache time {} seconds", self.cache_time);
        info!("Cache file path: {:?}", &self.cache_file);

        // Check if cache file exists
        let cache_exists = fs::metadata(&self.cache_file).is_ok();
        if cache_exists {
            info!("Cache file exists");
        } else {
            info!("Cache file not found");
        };

        // Check if cache file is fresh
        let cache_is_fresh = cache_exists
            && fs::metadata(&self.cache_file)?
                .modified()?
                .elapsed()?
                .as_secs()
                <= self.cache_time;
        if cache_is_fresh {
            info!("Cache file is fresh");
        } else {
            info!("Cache file is stale; refresh cache");
        };

        // Fresh cached dataset
        if cache_is_fresh {
            let fresh_cached_dataset = self.get_dataset_from_file();
            if fresh_cached_dataset.is_ok() {
                return fresh_cached_dataset;
            }
        };

        // Fresh URL dataset
        let fresh_url_dataset = self.get_dataset_from_url();
        if let Ok(fresh_url_dataset) = fresh_url_dataset {
            let _ = self.cache_dataset_to_file(&fresh_url_dataset);
            return Ok(fresh_url_dataset);
        };
        let url_result = fresh_url_dataset;

        // Stale cached dataset
        if cache_exists && !cache_is_fresh {
            let stale_cached_dataset = self.get_dataset_from_file();
            if stale_cached_dataset.is_ok() {
                warn!("Using stale cached dataset: {:?}", &self.cache_file);
                return stale_cached_dataset;
            }
        };

        // Return result (Err) downloading the dataset from the URL
        url_result
    }

    /// Download the dataset from the URL.
    fn get_dataset_from_url(&self) -> Result<Vec<u8>> {
        let start_time = time::Instant::now();
        let max_elapsed_time = time::Duration::from_millis(self.retry_timeout);

        let http_client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(max_elapsed_time)
            .build()?;

        let mut attempt: u32 = 0;
        loop {
            info!("Get dataset from URL; Attempt {}: GET {}", attempt, self.url);
            let dataset: Result<Vec<u8>> = http_client
                .get(&self.url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes())
                .map(|bytes| bytes.to_vec())
                .map_err(Error::from)
                .and_then(validate_gzip);

            match dataset {
                Ok(dataset) => {
                    info!("Get dataset from URL; Attempt {}: Ok", attempt);
                    break Ok(dataset);
                }
                Err(error) => {
                    log::error!(
                        "Get dataset from URL; Attempt {}: FAILED: {}",
                        attempt,
                        error
                    );

                    let delay = time::Duration::from_millis(
                        self.retry_initial_delay
                            .saturating_mul(self.retry_backoff_factor.saturating_pow(attempt)),
                    );

                    attempt += 1;

                    if (start_time.elapsed() + delay < max_elapsed_time)
                        && (attempt < self.retry_count)
                    {
                        thread::sleep(delay);
                        continue;
                    } else {
                        break Err(error);
                    }
                }
            }
        }
    }

    /// Write the compressed dataset to the cache file.
    fn cache_dataset_to_file(&self, dataset: &[u8]) -> Result<()> {
        // Ensure parent directories exist
        self.cache_file.parent().map(fs::create_dir_all);

        fs::write(&self.cache_file, dataset)
            .inspect(|_| info!("Successfully cached dataset to: {:?}", &self.cache_file))
            .map_err(Error::from)
            .inspect_err(|error| {
                log::error!(
                    "Failed to cache dataset to `{:?}`: {}",
                    &self.cache_file,
                    error
                )
            })
    }

    /// Read the compressed dataset from the cache file.
    fn get_dataset_from_file(&self) -> Result<Vec<u8>> {
        fs::read(&self.cache_file)
            .map_err(Error::from)
            .and_then(validate_gzip)
            .inspect(|_| info!("Successfully read dataset from: {:?}", &self.cache_file))
            .inspect_err(|error| {
                log::error!(
                    "Failed to read dataset from `{:?}`: {}",
                    &self.cache_file,
                    error
                )
            })
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

/// Validate a buffer starts with the gzip magic bytes.
fn validate_gzip(data: Vec<u8>) -> Result<Vec<u8>> {
    if data.starts_with(&[0x1f, 0x8b]) {
        Ok(data)
    } else {
        Err("Invalid gzip data".into())
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::log_error;
    use crate::core::tsv::tests::{gzip, TEST_TSV};
    use env::VarError;
    use test_log::test;

    /// Client that can never reach its URL.
    fn offline_client(cache_file: &Path) -> Client {
        ClientBuilder::default()
            .url("http://127.0.0.1:9/ip2asn-v4.tsv.gz")
            .cache_file(cache_file)
            .retry_count(1)
            .retry_initial_delay(1)
            .retry_timeout(2000)
            .build()
    }

    /*-------------------------------------------------------------------------
      Test Environment Variable Configuration
    -------------------------------------------------------------------------*/

    #[test]
    fn test_environment_variable_configuration() {
        let test_env_vars = [
            ("IP2ASN_URL", "https://my-ip2asn.com/ip2asn-v4.tsv.gz"),
            (
                "IP2ASN_CACHE_FILE",
                "./scratch/test_environment_variable_configuration.tsv.gz",
            ),
            ("IP2ASN_CACHE_TIME", "60"),
            ("IP2ASN_RETRY_COUNT", "2"),
            ("IP2ASN_RETRY_INITIAL_DELAY", "100"),
            ("IP2ASN_RETRY_BACKOFF_FACTOR", "3"),
            ("IP2ASN_RETRY_TIMEOUT", "1000"),
        ];

        let default = Client::default();

        // Store environment variable values
        let stored_env_vars: Vec<(String, std::result::Result<String, VarError>)> = test_env_vars
            .iter()
            .map(|(env_var, _)| (env_var.to_string(), env::var(env_var)))
            .collect();

        // Unset all environment variables
        test_env_vars.iter().for_each(|(env_var, _)| {
            env::remove_var(env_var);
        });

        // Test default cases
        let new = Client::new();
        assert_eq!(new.url(), default.url());
        assert_eq!(new.cache_file(), default.cache_file());
        assert_eq!(new.cache_time(), default.cache_time());
        assert_eq!(new.retry_count(), default.retry_count());
        assert_eq!(new.retry_initial_delay(), default.retry_initial_delay());
        assert_eq!(new.retry_backoff_factor(), default.retry_backoff_factor());
        assert_eq!(new.retry_timeout(), default.retry_timeout());

        // Set all environment variables
        for (env_var, value) in test_env_vars.iter() {
            env::set_var(env_var, value);
        }

        // Test environment variable configuration
        let env_config = Client::new();
        assert_eq!(env_config.url(), "https://my-ip2asn.com/ip2asn-v4.tsv.gz");
        assert_eq!(
            env_config.cache_file(),
            PathBuf::from("./scratch/test_environment_variable_configuration.tsv.gz")
        );
        assert_eq!(env_config.cache_time(), 60);
        assert_eq!(env_config.retry_count(), 2);
        assert_eq!(env_config.retry_initial_delay(), 100);
        assert_eq!(env_config.retry_backoff_factor(), 3);
        assert_eq!(env_config.retry_timeout(), 1000);

        // Invalid values fall back to the defaults
        env::set_var("IP2ASN_CACHE_TIME", "one day");
        assert_eq!(Client::new().cache_time(), default.cache_time());

        // Reset environment variables
        for (env_var, value) in stored_env_vars {
            match value {
                Ok(value) => env::set_var(env_var, value),
                Err(VarError::NotPresent) => env::remove_var(env_var),
                Err(VarError::NotUnicode(value)) => env::set_var(env_var, value),
            }
        }
    }

    /*-------------------------------------------------------------------------
      Test Getter and Setter Methods
    -------------------------------------------------------------------------*/

    #[test]
    fn test_getter_and_setter_methods() {
        let client = ClientBuilder::default()
            .url("https://my-ip2asn.com/ip2asn-v4.tsv.gz")
            .user_agent("ip2asn-test")
            .cache_file("./scratch/test_getter_and_setter_methods.tsv.gz")
            .cache_time(60)
            .retry_count(2)
            .retry_initial_delay(100)
            .retry_backoff_factor(3)
            .retry_timeout(1000)
            .build();

        assert_eq!(client.url(), "https://my-ip2asn.com/ip2asn-v4.tsv.gz");
        assert_eq!(client.user_agent(), "ip2asn-test");
        assert_eq!(
            client.cache_file(),
            PathBuf::from("./scratch/test_getter_and_setter_methods.tsv.gz")
        );
        assert_eq!(client.cache_time(), 60);
        assert_eq!(client.retry_count(), 2);
        assert_eq!(client.retry_initial_delay(), 100);
        assert_eq!(client.retry_backoff_factor(), 3);
        assert_eq!(client.retry_timeout(), 1000);
    }

    /*-------------------------------------------------------------------------
      Test Dataset Retrieval Methods
    -------------------------------------------------------------------------*/

    #[test]
    fn test_cache_dataset_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(&dir.path().join("nested").join("ip2asn-v4.tsv.gz"));

        let result = client
            .cache_dataset_to_file(&gzip(TEST_TSV.as_bytes()))
            .inspect_err(log_error);
        assert!(result.is_ok());
        assert!(client.cache_file().exists());
    }

    #[test]
    fn test_get_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(&dir.path().join("ip2asn-v4.tsv.gz"));
        client
            .cache_dataset_to_file(&gzip(TEST_TSV.as_bytes()))
            .unwrap();

        let dataset = client.get_dataset_from_file().inspect_err(log_error);
        assert!(dataset.is_ok());
    }

    #[test]
    fn test_get_dataset_from_file_rejects_non_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(&dir.path().join("ip2asn-v4.tsv.gz"));
        fs::write(client.cache_file(), TEST_TSV).unwrap();

        assert!(client.get_dataset_from_file().is_err());
    }

    #[test]
    fn test_get_index_from_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(&dir.path().join("ip2asn-v4.tsv.gz"));
        client
            .cache_dataset_to_file(&gzip(TEST_TSV.as_bytes()))
            .unwrap();

        let index = client.get_index().inspect_err(log_error).unwrap();
        assert_eq!(index.len(), 5);
        assert!(index.resolve("1.1.1.1").is_found());
    }

    #[test]
    fn test_get_index_without_cache_or_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(&dir.path().join("ip2asn-v4.tsv.gz"));

        assert!(client.get_index().is_err());
        assert!(!client.cache_file().exists());
    }

    /*-------------------------------------------------------------------------
      Test Validation
    -------------------------------------------------------------------------*/

    #[test]
    fn test_validate_gzip() {
        assert!(validate_gzip(gzip(b"")).is_ok());
        assert!(validate_gzip(TEST_TSV.as_bytes().to_vec()).is_err());
        assert!(validate_gzip(Vec::new()).is_err());
    }
}
