//! PokeAPI client: transport seam, wire types and URL helpers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::CatalogConfig;
use crate::error::FetchError;
use crate::state::CatalogReference;

pub const API_BASE: &str = "https://pokeapi.co/api/v2";
const SPRITE_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other";

/// Raw GET transport. Implementations return the body of a 2xx response.
#[async_trait]
pub trait HttpSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// reqwest-backed transport used by the binary.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pokedex/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSource for HttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ApiResource {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    count: usize,
    results: Vec<CatalogReference>,
}

/// One page of the collection endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexPage {
    pub count: usize,
    pub references: Vec<CatalogReference>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PokemonRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u16,
    #[serde(default)]
    pub weight: u16,
    #[serde(default)]
    pub types: Vec<PokemonTypeSlot>,
    #[serde(default)]
    pub stats: Vec<PokemonStatSlot>,
    #[serde(default)]
    pub moves: Vec<PokemonMoveSlot>,
    pub location_area_encounters: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PokemonTypeSlot {
    #[serde(rename = "type")]
    pub type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PokemonStatSlot {
    pub base_stat: u16,
    pub stat: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PokemonMoveSlot {
    #[serde(rename = "move")]
    pub move_info: NamedResource,
    #[serde(default)]
    pub version_group_details: Vec<VersionGroupDetail>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct VersionGroupDetail {
    pub level_learned_at: Option<u16>,
    pub move_learn_method: Option<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SpeciesRecord {
    #[serde(default)]
    pub names: Vec<LocalizedName>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
    pub habitat: Option<NamedResource>,
    pub shape: Option<NamedResource>,
    #[serde(default)]
    pub egg_groups: Vec<NamedResource>,
    #[serde(default)]
    pub capture_rate: u8,
    #[serde(default)]
    pub varieties: Vec<SpeciesVariety>,
    #[serde(default)]
    pub is_baby: bool,
    #[serde(default)]
    pub is_mythical: bool,
    #[serde(default)]
    pub is_legendary: bool,
    pub evolution_chain: Option<ApiResource>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LocalizedName {
    pub name: String,
    pub language: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SpeciesVariety {
    pub pokemon: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct EncounterRecord {
    pub location_area: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct EvolutionChainResponse {
    chain: ChainLink,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct EvolutionDetail {
    pub min_level: Option<u16>,
    pub trigger: Option<NamedResource>,
    pub item: Option<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MoveRecord {
    pub power: Option<u16>,
    pub pp: Option<u16>,
    pub accuracy: Option<u16>,
    pub target: Option<NamedResource>,
}

// ============================================================================
// Client
// ============================================================================

/// Typed access to the endpoints the catalog needs.
///
/// Every call is bounded by the configured request timeout and returns
/// `FetchError::Aborted` as soon as `cancel` fires.
#[derive(Clone)]
pub struct PokeApi {
    source: Arc<dyn HttpSource>,
    base: String,
    timeout: Duration,
}

impl PokeApi {
    pub fn new(source: Arc<dyn HttpSource>, config: &CatalogConfig) -> Self {
        Self {
            source,
            base: config.api_base().to_string(),
            timeout: config.request_timeout(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn index_page(
        &self,
        offset: usize,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<IndexPage, FetchError> {
        let url = index_url(&self.base, offset, limit);
        let response: IndexResponse = self.get_json(&url, cancel).await?;
        Ok(IndexPage {
            count: response.count,
            references: response.results,
        })
    }

    pub(crate) async fn pokemon(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PokemonRecord, FetchError> {
        self.get_json(url, cancel).await
    }

    pub(crate) async fn pokemon_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<PokemonRecord, FetchError> {
        let url = format!("{}/pokemon/{name}", self.base);
        self.get_json(&url, cancel).await
    }

    pub(crate) async fn species(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<SpeciesRecord, FetchError> {
        self.get_json(url, cancel).await
    }

    pub(crate) async fn encounters(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EncounterRecord>, FetchError> {
        self.get_json(url, cancel).await
    }

    pub(crate) async fn evolution_chain(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ChainLink, FetchError> {
        let response: EvolutionChainResponse = self.get_json(url, cancel).await?;
        Ok(response.chain)
    }

    pub(crate) async fn move_detail(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<MoveRecord, FetchError> {
        self.get_json(url, cancel).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Aborted);
        }
        let fetch = tokio::time::timeout(self.timeout, self.source.get(url));
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Aborted),
            result = fetch => match result {
                Ok(result) => result?,
                Err(_) => return Err(FetchError::Timeout(self.timeout)),
            },
        };
        serde_json::from_slice(&bytes).map_err(|err| FetchError::Decode(format!("{url}: {err}")))
    }
}

// ============================================================================
// URL helpers
// ============================================================================

pub fn index_url(base: &str, offset: usize, limit: usize) -> String {
    format!("{base}/pokemon?limit={limit}&offset={offset}")
}

/// Species URL for a primary record URL (`.../pokemon/25/` to
/// `.../pokemon-species/25/`).
pub fn species_url(pokemon_url: &str) -> String {
    match pokemon_url.rfind("/pokemon/") {
        Some(pos) => format!(
            "{}/pokemon-species/{}",
            &pokemon_url[..pos],
            &pokemon_url[pos + "/pokemon/".len()..]
        ),
        None => pokemon_url.to_string(),
    }
}

/// Trailing numeric path segment of a resource URL.
pub fn reference_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

pub fn home_sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE}/home/{id}.png")
}

pub fn artwork_sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE}/official-artwork/{id}.png")
}
