use image::DynamicImage;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants::constants;

/// Errors from the movie catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// The catalog answered `Response: "False"`.
  #[error("Movie not found")]
  NotFound,

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("catalog returned status {0}")]
  Status(u16),

  #[error("parse error: {0}")]
  Parse(String),

  #[error("image decode error: {0}")]
  Image(#[from] image::ImageError),
}

impl CatalogError {
  /// Single-line message shown in place of the pane's content.
  pub fn user_message(&self) -> String {
    match self {
      CatalogError::NotFound => "Movie not found".to_string(),
      _ => "Something went wrong while fetching movies".to_string(),
    }
  }
}

/// A single entry from a catalog search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultItem {
  pub id: String,
  pub title: String,
  pub year: String,
  pub poster_url: String,
}

/// Full catalog record for one title.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
  pub id: String,
  pub title: String,
  pub year: String,
  pub genre: String,
  /// Raw runtime string, e.g. `"142 min"` or `"N/A"`.
  pub runtime: String,
  pub plot: String,
  pub actors: String,
  pub director: String,
  pub poster_url: String,
  pub released: String,
  pub catalog_rating: Option<f64>,
}

impl MovieDetail {
  /// Leading integer of `runtime` (`"142 min"` -> 142).
  pub fn runtime_minutes(&self) -> Option<u32> {
    parse_runtime_minutes(&self.runtime)
  }
}

// --- Wire format ---

#[derive(Deserialize)]
struct Envelope {
  #[serde(rename = "Response")]
  response: Option<String>,
  #[serde(rename = "Error")]
  error: Option<String>,
}

#[derive(Deserialize)]
struct SearchBody {
  #[serde(rename = "Search", default)]
  search: Vec<SearchItemBody>,
}

#[derive(Deserialize)]
struct SearchItemBody {
  #[serde(rename = "Title")]
  title: String,
  #[serde(rename = "Year", default)]
  year: String,
  #[serde(rename = "Poster", default)]
  poster: String,
  #[serde(rename = "imdbID")]
  imdb_id: String,
}

#[derive(Deserialize)]
struct DetailBody {
  #[serde(rename = "imdbID", default)]
  imdb_id: String,
  #[serde(rename = "Title")]
  title: String,
  #[serde(rename = "Year", default)]
  year: String,
  #[serde(rename = "Genre", default)]
  genre: String,
  #[serde(rename = "Runtime", default)]
  runtime: String,
  #[serde(rename = "Plot", default)]
  plot: String,
  #[serde(rename = "Actors", default)]
  actors: String,
  #[serde(rename = "Director", default)]
  director: String,
  #[serde(rename = "Poster", default)]
  poster: String,
  #[serde(rename = "Released", default)]
  released: String,
  #[serde(rename = "imdbRating", default)]
  imdb_rating: String,
}

/// Parse the leading integer of a runtime string like `"142 min"`.
pub fn parse_runtime_minutes(raw: &str) -> Option<u32> {
  raw.split_whitespace().next().and_then(|n| n.parse().ok())
}

/// Parse a numeric rating string; `"N/A"` and friends yield `None`.
pub fn parse_rating(raw: &str) -> Option<f64> {
  raw.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

/// Whether a poster field points at an actual image.
pub fn has_poster(url: &str) -> bool {
  let url = url.trim();
  !url.is_empty() && url != "N/A"
}

/// Reject `Response: "False"` bodies before looking at the HTTP status.
fn check_envelope(body: &str) -> Result<(), CatalogError> {
  if let Ok(envelope) = serde_json::from_str::<Envelope>(body)
    && envelope.response.as_deref() == Some("False")
  {
    debug!(reason = envelope.error.as_deref().unwrap_or(""), "catalog: not found");
    return Err(CatalogError::NotFound);
  }
  Ok(())
}

/// The not-found envelope wins over the HTTP status; any other non-2xx is a status error.
fn classify(status: StatusCode, body: &str) -> Result<(), CatalogError> {
  check_envelope(body)?;
  if !status.is_success() {
    return Err(CatalogError::Status(status.as_u16()));
  }
  Ok(())
}

pub fn parse_search_body(body: &str) -> Result<Vec<SearchResultItem>, CatalogError> {
  check_envelope(body)?;
  let parsed: SearchBody = serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;
  Ok(
    parsed
      .search
      .into_iter()
      .map(|item| SearchResultItem { id: item.imdb_id, title: item.title, year: item.year, poster_url: item.poster })
      .collect(),
  )
}

/// Parse a detail body. `id` fills in when the body omits `imdbID`.
pub fn parse_detail_body(id: &str, body: &str) -> Result<MovieDetail, CatalogError> {
  check_envelope(body)?;
  let d: DetailBody = serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;
  Ok(MovieDetail {
    id: if d.imdb_id.is_empty() { id.to_string() } else { d.imdb_id },
    title: d.title,
    year: d.year,
    genre: d.genre,
    runtime: d.runtime,
    plot: d.plot,
    actors: d.actors,
    director: d.director,
    poster_url: d.poster,
    released: d.released,
    catalog_rating: parse_rating(&d.imdb_rating),
  })
}

// --- Catalog trait ---

/// The remote movie catalog. Implemented over HTTP by [`OmdbClient`] and by fakes in tests.
pub trait Catalog: Send + Sync + 'static {
  fn search(&self, query: &str) -> impl Future<Output = Result<Vec<SearchResultItem>, CatalogError>> + Send;

  fn detail(&self, id: &str) -> impl Future<Output = Result<MovieDetail, CatalogError>> + Send;

  fn poster(&self, url: &str) -> impl Future<Output = Result<DynamicImage, CatalogError>> + Send;
}

/// OMDb HTTP client.
#[derive(Clone)]
pub struct OmdbClient {
  http: Client,
  api_key: String,
  base_url: Url,
}

impl OmdbClient {
  pub fn new(api_key: String, base_url: &str) -> Result<Self, CatalogError> {
    let base_url = Url::parse(base_url).map_err(|e| CatalogError::Parse(format!("invalid base URL: {}", e)))?;
    let http = Client::builder().connect_timeout(Duration::from_secs(constants().connect_timeout_secs)).build()?;
    Ok(Self { http, api_key, base_url })
  }

  fn endpoint(&self, params: &[(&str, &str)]) -> Result<Url, CatalogError> {
    let mut all = vec![("apikey", self.api_key.as_str())];
    all.extend_from_slice(params);
    Url::parse_with_params(self.base_url.as_str(), &all).map_err(|e| CatalogError::Parse(e.to_string()))
  }

  async fn get_body(&self, url: Url) -> Result<String, CatalogError> {
    let resp = self.http.get(url).send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    classify(status, &body)?;
    Ok(body)
  }
}

impl Catalog for OmdbClient {
  async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, CatalogError> {
    let url = self.endpoint(&[("s", query)])?;
    debug!(query = %query, "catalog: search request");
    let body = self.get_body(url).await?;
    parse_search_body(&body)
  }

  async fn detail(&self, id: &str) -> Result<MovieDetail, CatalogError> {
    let url = self.endpoint(&[("i", id)])?;
    debug!(id = %id, "catalog: detail request");
    let body = self.get_body(url).await?;
    parse_detail_body(id, &body)
  }

  async fn poster(&self, url: &str) -> Result<DynamicImage, CatalogError> {
    let resp = self.http.get(url).send().await?;
    if !resp.status().is_success() {
      return Err(CatalogError::Status(resp.status().as_u16()));
    }
    let bytes = resp.bytes().await?;
    Ok(image::load_from_memory(&bytes)?)
  }
}
