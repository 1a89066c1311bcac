use std::collections::HashSet;

use anyhow::Result;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::Error as _;
use thiserror::Error;

use crate::config::Config;
use crate::http_client::init_http_client;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("http {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid request: {0}")]
    InvalidArgument(String),
}

/// One creature as fetched for a round. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureRecord {
    pub id: u32,
    pub name: String,
    pub image_url: Option<String>,
}

/// Known creature names in catalog order, unique within one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameCatalog {
    names: Vec<String>,
}

impl NameCatalog {
    /// Keeps the first occurrence of each name and drops later duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The two read-only lookups a game session needs from the remote catalog.
pub trait CatalogSource: Send + Sync {
    fn fetch_by_id(&self, id: u32) -> Result<CreatureRecord, FetchError>;

    fn fetch_name_catalog(&self, limit: u32) -> Result<NameCatalog, FetchError>;
}

#[derive(Debug, Clone)]
pub struct PokeApi {
    base_url: String,
    client: Client,
}

impl PokeApi {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = init_http_client(config.http_timeout())?;
        Ok(Self::new(config.api_base.clone(), client.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(resp.text()?)
    }
}

impl CatalogSource for PokeApi {
    fn fetch_by_id(&self, id: u32) -> Result<CreatureRecord, FetchError> {
        if id == 0 {
            return Err(FetchError::InvalidArgument("creature id must be positive".into()));
        }
        let url = format!("{}/pokemon/{id}", self.base_url);
        let body = self.get_body(&url)?;
        parse_creature_json(&body)
    }

    fn fetch_name_catalog(&self, limit: u32) -> Result<NameCatalog, FetchError> {
        if limit == 0 {
            return Err(FetchError::InvalidArgument("catalog limit must be positive".into()));
        }
        let url = format!("{}/pokemon?limit={limit}", self.base_url);
        let body = self.get_body(&url)?;
        parse_name_catalog_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sprites: Option<Sprites>,
}

#[derive(Debug, Deserialize)]
struct Sprites {
    #[serde(default)]
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PokemonListResponse {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

pub fn parse_creature_json(raw: &str) -> Result<CreatureRecord, FetchError> {
    let data: PokemonResponse = serde_json::from_str(raw.trim())?;
    let name = data.name.trim();
    if name.is_empty() {
        return Err(serde_json::Error::custom("record has no name").into());
    }
    let image_url = data
        .sprites
        .and_then(|s| s.front_default)
        .filter(|url| !url.trim().is_empty());

    Ok(CreatureRecord {
        id: data.id,
        name: name.to_string(),
        image_url,
    })
}

pub fn parse_name_catalog_json(raw: &str) -> Result<NameCatalog, FetchError> {
    let data: PokemonListResponse = serde_json::from_str(raw.trim())?;
    Ok(NameCatalog::new(
        data.results
            .into_iter()
            .map(|entry| entry.name)
            .filter(|name| !name.trim().is_empty()),
    ))
}
