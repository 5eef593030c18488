use std::collections::HashSet;
use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::DictionaryError;

const DEFAULT_BASE_URL: &str = "https://wordsapiv1.p.rapidapi.com/words/";

/// Answers whether a word is a real word.
#[async_trait]
pub trait WordLookup: Send + Sync {
    /// # Errors
    ///
    /// Returns `DictionaryError` when the lookup could not be completed.
    async fn word_exists(&self, word: &str) -> Result<bool, DictionaryError>;
}

#[derive(Clone, Debug)]
pub struct DictionaryConfig {
    pub base_url: Url,
    pub api_key: String,
    pub api_host: String,
}

impl DictionaryConfig {
    /// Read `LINGUA_DICTIONARY_KEY`, `LINGUA_DICTIONARY_URL` and
    /// `LINGUA_DICTIONARY_HOST`. Returns `None` without a key.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("LINGUA_DICTIONARY_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let raw_url =
            env::var("LINGUA_DICTIONARY_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let base_url = match Url::parse(&raw_url) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(%err, url = %raw_url, "ignoring invalid dictionary url");
                return None;
            }
        };
        let api_host = env::var("LINGUA_DICTIONARY_HOST")
            .ok()
            .or_else(|| base_url.host_str().map(str::to_owned))
            .unwrap_or_default();
        Some(Self {
            base_url,
            api_key,
            api_host,
        })
    }

    /// `{base_url}/{word}`, with the word percent-encoded as one segment.
    ///
    /// # Errors
    ///
    /// Returns `DictionaryError::InvalidUrl` for base URLs that cannot carry
    /// a path, such as `mailto:` URLs.
    pub fn word_url(&self, word: &str) -> Result<Url, DictionaryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DictionaryError::InvalidUrl)?
            .pop_if_empty()
            .push(word);
        Ok(url)
    }
}

/// Word lookups against a RapidAPI-style HTTP dictionary.
#[derive(Clone)]
pub struct HttpDictionary {
    client: Client,
    config: Option<DictionaryConfig>,
}

impl HttpDictionary {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(DictionaryConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<DictionaryConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl WordLookup for HttpDictionary {
    async fn word_exists(&self, word: &str) -> Result<bool, DictionaryError> {
        let config = self.config.as_ref().ok_or(DictionaryError::Disabled)?;
        let url = config.word_url(word)?;

        let response = self
            .client
            .get(url)
            .header("X-RapidAPI-Key", &config.api_key)
            .header("X-RapidAPI-Host", &config.api_host)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(DictionaryError::HttpStatus(status))
        }
    }
}

/// Fixed word list, matched case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct WordListDictionary {
    words: HashSet<String>,
}

impl WordListDictionary {
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[async_trait]
impl WordLookup for WordListDictionary {
    async fn word_exists(&self, word: &str) -> Result<bool, DictionaryError> {
        Ok(self.words.contains(&word.trim().to_lowercase()))
    }
}
