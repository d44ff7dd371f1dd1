//! Typed client for the PokéAPI REST endpoints the app consumes: the
//! paginated listing, the per-Pokémon detail document and the species
//! document carrying flavor text. Plain request/response, no retries.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{BasicInfo, Pokemon};
use crate::typechart::PokemonType;
use crate::utils::sanitize_flavor_text;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("species document has no flavor text entries")]
    MissingFlavorText,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    height: u32,
    weight: u32,
    types: Vec<TypeSlot>,
    species: NamedResource,
    sprites: SpriteSet,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Debug, Deserialize)]
struct SpriteSet {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeciesResponse {
    flavor_text_entries: Vec<FlavorTextEntry>,
}

#[derive(Debug, Deserialize)]
struct FlavorTextEntry {
    flavor_text: String,
    language: NamedResource,
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    pub fn new(base: impl Into<String>) -> Self {
        Client {
            http: reqwest::Client::new(),
            base: base.into(),
        }
    }

    /// Fetch one page of the listing endpoint and turn each well-formed
    /// `{name, url}` entry into a skeleton record.
    pub async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Vec<Pokemon>, ApiError> {
        let url = format!(
            "{}/pokemon/?limit={}&offset={}",
            self.base, limit, offset
        );
        let page: PageResponse = self.get_json(&url).await?;
        Ok(page
            .results
            .into_iter()
            .map(|entry| Pokemon::new(entry.name, entry.url))
            .collect())
    }

    /// Fetch the detail document behind a record's detail URL.
    pub async fn fetch_basic_info(&self, detail_url: &str) -> Result<BasicInfo, ApiError> {
        let response: PokemonResponse = self.get_json(detail_url).await?;
        Ok(convert_basic_info(response))
    }

    /// Fetch the species document and pick out a sanitized flavor text,
    /// preferring English and falling back to the first entry.
    pub async fn fetch_flavor_text(&self, species_url: &str) -> Result<String, ApiError> {
        let response: SpeciesResponse = self.get_json(species_url).await?;
        select_flavor_text(&response.flavor_text_entries).ok_or(ApiError::MissingFlavorText)
    }

    /// Fetch raw bytes, used for sprite images.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

fn convert_basic_info(response: PokemonResponse) -> BasicInfo {
    let mut types = Vec::with_capacity(response.types.len());
    for slot in response.types {
        match slot.type_info.name.parse::<PokemonType>() {
            Ok(t) => types.push(t),
            // The API grows type names (e.g. "stellar") faster than the
            // effectiveness table; leave those slots out.
            Err(err) => warn!(%err, id = response.id, "skipping type slot"),
        }
    }
    BasicInfo {
        id: response.id,
        height: response.height,
        weight: response.weight,
        types,
        sprite_url: response.sprites.front_default,
        species_url: response.species.url,
    }
}

fn select_flavor_text(entries: &[FlavorTextEntry]) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.language.name == "en")
        .or_else(|| entries.first())
        .map(|entry| sanitize_flavor_text(&entry.flavor_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_response_parses_listing_shape() {
        let body = r#"{
            "count": 1302,
            "next": "https://pokeapi.co/api/v2/pokemon/?offset=2&limit=2",
            "previous": null,
            "results": [
                {"name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/"},
                {"name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/"}
            ]
        }"#;
        let page: PageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].name, "bulbasaur");
        assert_eq!(page.results[1].url, "https://pokeapi.co/api/v2/pokemon/2/");
    }

    #[test]
    fn detail_response_converts_to_basic_info() {
        let body = r#"{
            "id": 6,
            "name": "charizard",
            "height": 17,
            "weight": 905,
            "types": [
                {"slot": 1, "type": {"name": "fire", "url": "https://pokeapi.co/api/v2/type/10/"}},
                {"slot": 2, "type": {"name": "flying", "url": "https://pokeapi.co/api/v2/type/3/"}}
            ],
            "species": {"name": "charizard", "url": "https://pokeapi.co/api/v2/pokemon-species/6/"},
            "sprites": {"front_default": "https://sprites.example/6.png", "front_shiny": null}
        }"#;
        let response: PokemonResponse = serde_json::from_str(body).unwrap();
        let info = convert_basic_info(response);

        assert_eq!(info.id, 6);
        assert_eq!(info.height, 17);
        assert_eq!(info.weight, 905);
        assert_eq!(info.types, vec![PokemonType::Fire, PokemonType::Flying]);
        assert_eq!(info.sprite_url.as_deref(), Some("https://sprites.example/6.png"));
        assert_eq!(
            info.species_url,
            "https://pokeapi.co/api/v2/pokemon-species/6/"
        );
    }

    #[test]
    fn unknown_type_slots_are_skipped() {
        let body = r#"{
            "id": 999,
            "height": 1,
            "weight": 1,
            "types": [
                {"type": {"name": "stellar", "url": "https://pokeapi.co/api/v2/type/99/"}},
                {"type": {"name": "ghost", "url": "https://pokeapi.co/api/v2/type/8/"}}
            ],
            "species": {"name": "x", "url": "https://pokeapi.co/api/v2/pokemon-species/999/"},
            "sprites": {"front_default": null}
        }"#;
        let response: PokemonResponse = serde_json::from_str(body).unwrap();
        let info = convert_basic_info(response);
        assert_eq!(info.types, vec![PokemonType::Ghost]);
        assert_eq!(info.sprite_url, None);
    }

    fn entry(language: &str, text: &str) -> FlavorTextEntry {
        FlavorTextEntry {
            flavor_text: text.to_string(),
            language: NamedResource {
                name: language.to_string(),
                url: String::new(),
            },
        }
    }

    #[test]
    fn flavor_text_prefers_english() {
        let entries = vec![
            entry("fr", "Une graine étrange."),
            entry("en", "A strange seed was\nplanted on its back."),
        ];
        assert_eq!(
            select_flavor_text(&entries).unwrap(),
            "A strange seed was planted on its back."
        );
    }

    #[test]
    fn flavor_text_falls_back_to_first_entry() {
        let entries = vec![entry("ja", "ふしぎなタネ"), entry("de", "Ein Samen.")];
        // Non-letter characters are sanitized away entirely here.
        assert_eq!(select_flavor_text(&entries).unwrap(), "");

        let entries = vec![entry("de", "Ein Samen."), entry("ja", "x")];
        assert_eq!(select_flavor_text(&entries).unwrap(), "Ein Samen.");
    }

    #[test]
    fn flavor_text_missing_when_no_entries() {
        assert_eq!(select_flavor_text(&[]), None);
    }

    #[test]
    fn species_response_parses_flavor_entries() {
        let body = r#"{
            "flavor_text_entries": [
                {
                    "flavor_text": "When several of\nthese POKéMON\ngather, their\felectricity could\nbuild and cause\nlightning storms.",
                    "language": {"name": "en", "url": "https://pokeapi.co/api/v2/language/9/"},
                    "version": {"name": "red", "url": "https://pokeapi.co/api/v2/version/1/"}
                }
            ]
        }"#;
        let response: SpeciesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            select_flavor_text(&response.flavor_text_entries).unwrap(),
            "When several of these POKéMON gather, their electricity could build and cause lightning storms."
        );
    }
}
