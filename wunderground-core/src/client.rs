use chrono::NaiveDate;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};

use crate::{
    Error, ResponseBody, ResponseCache, ResponseFormat, Result,
    error::truncate_body,
    uri::{DEFAULT_BASE_URL, Settings, Tail, build_uri, history_feature},
};

pub const DEFAULT_LANG: &str = "EN";

/// Features that take nothing but a query and map onto one generic fetch.
pub const SIMPLE_FEATURES: &[&str] = &[
    "alerts",
    "almanac",
    "astronomy",
    "conditions",
    "forecast",
    "forecast_10_day",
    "geolookup",
    "hourly",
    "hourly_10_day",
    "planner",
    "rawtide",
    "satellite",
    "tide",
    "webcams",
    "yesterday",
];

const CURRENT_HURRICANE: &str = "currenthurricane";

type FeatureFetch = for<'a> fn(&'a Client, &'static str) -> FeatureRequest<'a>;

fn simple_fetch<'a>(client: &'a Client, name: &'static str) -> FeatureRequest<'a> {
    FeatureRequest { client, name }
}

/// A resolved simple feature, ready to be fetched for any query.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRequest<'a> {
    client: &'a Client,
    name: &'static str,
}

impl FeatureRequest<'_> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn get(&self, query: impl fmt::Display, use_cache: bool) -> Result<ResponseBody> {
        self.client.get(&[self.name], query, &Settings::new(), use_cache).await
    }
}

/// Configures and validates a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: String,
    format: String,
    lang: String,
    base_url: String,
    cache: Option<Arc<dyn ResponseCache>>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// `json` or `xml`; anything else fails in [`ClientBuilder::build`].
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Share a cache with the client. The caller keeps ownership.
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bound each request. Without it a request may wait indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client> {
        let format = ResponseFormat::try_from(self.format.as_str())?;

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("cannot build HTTP client: {e}")))?;

        let features: HashMap<&'static str, FeatureFetch> =
            SIMPLE_FEATURES.iter().map(|name| (*name, simple_fetch as FeatureFetch)).collect();

        Ok(Client {
            api_key: self.api_key,
            format,
            lang: self.lang,
            base_url: self.base_url,
            cache: self.cache,
            http,
            features,
        })
    }
}

/// Weather Underground API client.
///
/// Requests are cached under their URI when a cache is attached and the
/// call asks for it. Errors reported by the API are never cached.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    format: ResponseFormat,
    lang: String,
    base_url: String,
    cache: Option<Arc<dyn ResponseCache>>,
    http: reqwest::Client,
    features: HashMap<&'static str, FeatureFetch>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("format", &self.format)
            .field("lang", &self.lang)
            .field("base_url", &self.base_url)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// JSON responses, English, no cache.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            format: ResponseFormat::default().as_str().to_string(),
            lang: DEFAULT_LANG.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache: None,
            timeout: None,
        }
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Resolve a simple feature by name.
    pub fn feature(&self, name: &str) -> Result<FeatureRequest<'_>> {
        let (name, fetch) = self
            .features
            .get_key_value(name)
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))?;
        Ok(fetch(self, *name))
    }

    /// Fetch one or more features for a query in a single request.
    pub async fn get<S: AsRef<str>>(
        &self,
        features: &[S],
        query: impl fmt::Display,
        settings: &Settings,
        use_cache: bool,
    ) -> Result<ResponseBody> {
        let uri = self.uri(features, settings, &Tail::query(query));
        self.fetch(&uri, use_cache).await
    }

    /// Information about currently active hurricanes; takes no query.
    pub async fn current_hurricane(&self, use_cache: bool) -> Result<ResponseBody> {
        let uri = self.uri(&[CURRENT_HURRICANE], &Settings::new(), &Tail::VIEW);
        self.fetch(&uri, use_cache).await
    }

    /// Observations for a location on a past day.
    pub async fn history(
        &self,
        query: impl fmt::Display,
        date: NaiveDate,
        use_cache: bool,
    ) -> Result<ResponseBody> {
        self.get(&[history_feature(date)], query, &Settings::new(), use_cache).await
    }

    /// Current conditions, optionally including personal weather stations.
    pub async fn conditions(
        &self,
        query: impl fmt::Display,
        use_pws: bool,
        use_cache: bool,
    ) -> Result<ResponseBody> {
        let settings = Settings::new().with("pws", u8::from(use_pws));
        self.get(&["conditions"], query, &settings, use_cache).await
    }

    pub async fn forecast(
        &self,
        query: impl fmt::Display,
        use_bestfct: bool,
        use_cache: bool,
    ) -> Result<ResponseBody> {
        let settings = Settings::new().with("bestfct", u8::from(use_bestfct));
        self.get(&["forecast"], query, &settings, use_cache).await
    }

    pub async fn forecast10day(
        &self,
        query: impl fmt::Display,
        use_bestfct: bool,
        use_cache: bool,
    ) -> Result<ResponseBody> {
        let settings = Settings::new().with("bestfct", u8::from(use_bestfct));
        self.get(&["forecast10day"], query, &settings, use_cache).await
    }

    fn uri<S: AsRef<str>>(&self, features: &[S], settings: &Settings, tail: &Tail) -> String {
        let defaults = Settings::new().with("lang", &self.lang);
        let settings = settings.merged_over(&defaults);
        build_uri(&self.base_url, &self.api_key, features, &settings, tail, self.format)
    }

    async fn fetch(&self, uri: &str, use_cache: bool) -> Result<ResponseBody> {
        let cache = self.cache.as_ref().filter(|_| use_cache);

        if let Some(cache) = cache {
            if let Some(hit) = cache.get(uri).await {
                debug!(uri, "cache hit");
                return Ok(hit);
            }
            debug!(uri, "cache miss");
        }

        let body = self.request(uri).await?;

        if let Some(cache) = cache {
            cache.set(uri, body.clone()).await;
            debug!(uri, "cached response");
        }

        Ok(body)
    }

    #[instrument(skip(self), fields(format = %self.format))]
    async fn request(&self, uri: &str) -> Result<ResponseBody> {
        debug!("requesting {uri}");

        let res = self.http.get(uri).send().await?;
        let status = res.status();
        let body = res.text().await?;

        let parsed = ResponseBody::parse(self.format, &body).inspect_err(|e| {
            if let Error::Api(description) = e {
                warn!(%description, "API reported an error");
            }
        });

        match parsed {
            Err(Error::Api(description)) => Err(Error::Api(description)),
            _ if !status.is_success() => {
                Err(Error::Status { status, body: truncate_body(&body) })
            }
            other => other,
        }
    }
}
