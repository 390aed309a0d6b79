use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use alumni_api::{AlumniApiClient, UniversityId};

use crate::ads::DEFAULT_AD_EVERY;
use crate::debounce::DEFAULT_SEARCH_DEBOUNCE;

/// Engine tuning, independent of where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub page_size: u32,
    /// How often an idle first page is refreshed in the background.
    pub refresh_interval: Duration,
    pub search_debounce: Duration,
    /// An ad follows every `ad_every`-th post. Zero disables ads.
    pub ad_every: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            refresh_interval: Duration::from_secs(30),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            ad_every: DEFAULT_AD_EVERY,
        }
    }
}

impl FeedSettings {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    pub fn with_ad_every(mut self, every: usize) -> Self {
        self.ad_every = every;
        self
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub university_id: Option<UniversityId>,
    pub settings: FeedSettings,
}

impl FeedConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = FeedSettings::default();

        Ok(Self {
            api_url: env::var("ALUMNI_API_URL").context("ALUMNI_API_URL must be set")?,
            api_token: env::var("ALUMNI_API_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout: Duration::from_secs(
                env::var("FEED_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .context("FEED_REQUEST_TIMEOUT_SECS must be a valid number")?,
            ),
            university_id: env::var("FEED_UNIVERSITY_ID")
                .ok()
                .filter(|u| !u.is_empty())
                .map(UniversityId::new),
            settings: FeedSettings {
                page_size: env::var("FEED_PAGE_SIZE")
                    .unwrap_or_else(|_| defaults.page_size.to_string())
                    .parse::<u32>()
                    .context("FEED_PAGE_SIZE must be a valid number")?
                    .max(1),
                refresh_interval: Duration::from_secs(
                    env::var("FEED_REFRESH_INTERVAL_SECS")
                        .unwrap_or_else(|_| defaults.refresh_interval.as_secs().to_string())
                        .parse()
                        .context("FEED_REFRESH_INTERVAL_SECS must be a valid number")?,
                ),
                search_debounce: Duration::from_millis(
                    env::var("FEED_SEARCH_DEBOUNCE_MS")
                        .unwrap_or_else(|_| (defaults.search_debounce.as_millis() as u64).to_string())
                        .parse()
                        .context("FEED_SEARCH_DEBOUNCE_MS must be a valid number")?,
                ),
                ad_every: env::var("FEED_AD_EVERY")
                    .unwrap_or_else(|_| defaults.ad_every.to_string())
                    .parse()
                    .context("FEED_AD_EVERY must be a valid number")?,
            },
        })
    }

    /// Build the REST client this configuration points at.
    pub fn api_client(&self) -> Result<AlumniApiClient> {
        let client = AlumniApiClient::with_timeout(&self.api_url, self.request_timeout)
            .context("Failed to build HTTP client")?;
        Ok(match &self.api_token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }
}
