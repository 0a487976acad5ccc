// ABOUTME: Keyword image search and download for slide illustrations
// ABOUTME: Queries the Pixabay API and validates downloaded image bytes

use crate::assets::{AssetArena, AssetHandle, AssetKind};
use crate::errors::{Result, VocabError};
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const PIXABAY_API_URL: &str = "https://pixabay.com/api/";

/// Finds an illustrative image for a search query
pub trait ImageRetriever {
    /// Returns None when the search succeeds but has no results
    fn retrieve(&self, query: &str, arena: &mut AssetArena) -> Result<Option<AssetHandle>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "webformatURL")]
    web_format_url: String,
}

/// Image search backed by the Pixabay REST API
pub struct PixabaySearch {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl PixabaySearch {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    fn first_image_url(&self, query: &str) -> Result<Option<String>> {
        let url = format!(
            "{}?key={}&q={}&image_type=photo&per_page=3&safesearch=true",
            PIXABAY_API_URL, self.api_key, query
        );
        debug!("Searching images for query '{}'", query);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(VocabError::ImageSearchError(format!(
                "Image search returned HTTP {} for query '{}'",
                response.status(),
                query
            )));
        }

        let body: SearchResponse = response.json()?;
        Ok(body.hits.into_iter().next().map(|hit| hit.web_format_url))
    }
}

impl ImageRetriever for PixabaySearch {
    fn retrieve(&self, query: &str, arena: &mut AssetArena) -> Result<Option<AssetHandle>> {
        let image_url = match self.first_image_url(query)? {
            Some(url) => url,
            None => {
                info!("No image results for query '{}'", query);
                return Ok(None);
            }
        };
        let handle = download_image(&self.client, &image_url, arena)?;
        Ok(Some(handle))
    }
}

/// Used when no image API key is configured; every lookup misses
pub struct DisabledImageSearch;

impl ImageRetriever for DisabledImageSearch {
    fn retrieve(&self, _query: &str, _arena: &mut AssetArena) -> Result<Option<AssetHandle>> {
        Ok(None)
    }
}

/// Download an image into the arena, rejecting bytes that do not decode
pub fn download_image(
    client: &reqwest::blocking::Client,
    url: &str,
    arena: &mut AssetArena,
) -> Result<AssetHandle> {
    debug!("Downloading image from {}", url);
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(VocabError::ImageSearchError(format!(
            "Image download returned HTTP {}",
            response.status()
        )));
    }

    let bytes = response.bytes()?;
    image::load_from_memory(&bytes).map_err(|e| {
        VocabError::ImageSearchError(format!("Downloaded file is not a valid image: {}", e))
    })?;

    let extension = image_extension_from_url(url);
    let path = arena.transient_path(url, extension);
    std::fs::write(&path, &bytes)?;
    info!("Downloaded {} byte image to {:?}", bytes.len(), path);
    Ok(arena.register(path, AssetKind::Image, true))
}

fn image_extension_from_url(url: &str) -> &'static str {
    let path_extension = Url::parse(url).ok().and_then(|u| {
        Path::new(u.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    });
    match path_extension.as_deref() {
        Some("png") => "png",
        Some("jpeg") => "jpeg",
        Some("gif") => "gif",
        _ => "jpg",
    }
}

/// Build a URL-ready search query from translated vocabulary text
pub fn derive_image_query(target_text: &str) -> String {
    target_text
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}
