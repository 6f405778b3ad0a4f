//! In-memory PokeAPI fixtures for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use pokedex::api::{index_url, HttpSource};
use pokedex::catalog::Catalog;
use pokedex::config::CatalogConfig;
use pokedex::error::FetchError;
use pokedex::state::CatalogReference;

pub const BASE: &str = "http://fixture.test/api/v2";

#[derive(Default)]
pub struct FixtureSource {
    responses: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, url: impl Into<String>, body: Value) {
        self.responses.lock().unwrap().insert(url.into(), body);
    }

    /// Requests to `url` answer with HTTP 503.
    pub fn fail(&self, url: impl Into<String>) {
        self.failing.lock().unwrap().insert(url.into());
    }

    pub fn heal(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    /// Requests to `url` never complete.
    pub fn hang(&self, url: impl Into<String>) {
        self.hanging.lock().unwrap().insert(url.into());
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }

    /// Register a minimal resolvable Pokemon: primary record, species and one
    /// encounter area.
    pub fn add_pokemon(&self, id: u32, name: &str) -> CatalogReference {
        self.insert(pokemon_url(id), pokemon_json(id, name, &[]));
        self.insert(species_url(id), species_json(name, None));
        self.insert(
            encounters_url(id),
            json!([{ "location_area": { "name": "viridian-forest-area", "url": "" } }]),
        );
        reference(id, name)
    }

    pub fn add_index(&self, offset: usize, limit: usize, references: &[CatalogReference]) {
        self.insert(index_url(BASE, offset, limit), index_json(references));
    }
}

#[async_trait]
impl HttpSource for FixtureSource {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let hanging = self.hanging.lock().unwrap().contains(url);
        if hanging {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(url) {
            return Err(FetchError::Status {
                status: 503,
                url: url.to_string(),
            });
        }
        let body = self.responses.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(serde_json::to_vec(&body).unwrap()),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

pub fn config() -> CatalogConfig {
    CatalogConfig {
        api_base: BASE.to_string(),
        request_timeout_secs: 5,
        ..CatalogConfig::default()
    }
}

pub fn catalog(source: &Arc<FixtureSource>) -> Catalog {
    Catalog::new(source.clone(), config())
}

pub fn reference(id: u32, name: &str) -> CatalogReference {
    CatalogReference {
        name: name.to_string(),
        url: pokemon_url(id),
    }
}

pub fn pokemon_url(id: u32) -> String {
    format!("{BASE}/pokemon/{id}/")
}

pub fn species_url(id: u32) -> String {
    format!("{BASE}/pokemon-species/{id}/")
}

pub fn encounters_url(id: u32) -> String {
    format!("{BASE}/pokemon/{id}/encounters")
}

pub fn move_url(id: u32) -> String {
    format!("{BASE}/move/{id}/")
}

pub fn chain_url(id: u32) -> String {
    format!("{BASE}/evolution-chain/{id}/")
}

pub fn pokemon_json(id: u32, name: &str, moves: &[(u32, &str)]) -> Value {
    let moves: Vec<Value> = moves
        .iter()
        .map(|(move_id, move_name)| {
            json!({
                "move": { "name": move_name, "url": move_url(*move_id) },
                "version_group_details": [
                    { "level_learned_at": 1, "move_learn_method": { "name": "level-up", "url": "" } }
                ]
            })
        })
        .collect();
    json!({
        "id": id,
        "name": name,
        "height": 4,
        "weight": 60,
        "types": [{ "type": { "name": "electric", "url": "" } }],
        "stats": [
            { "base_stat": 35, "stat": { "name": "hp", "url": "" } },
            { "base_stat": 55, "stat": { "name": "attack", "url": "" } },
            { "base_stat": 90, "stat": { "name": "speed", "url": "" } }
        ],
        "moves": moves,
        "location_area_encounters": encounters_url(id)
    })
}

pub fn species_json(name: &str, chain: Option<String>) -> Value {
    let chain = chain.map(|url| json!({ "url": url }));
    json!({
        "names": [
            { "name": "ピカチュウ", "language": { "name": "ja", "url": "" } },
            { "name": "Pikachu", "language": { "name": "roomaji", "url": "" } }
        ],
        "flavor_text_entries": [
            { "flavor_text": "When several of\nthese POKéMON\u{000C}gather", "language": { "name": "en", "url": "" } }
        ],
        "habitat": { "name": "forest", "url": "" },
        "shape": null,
        "egg_groups": [{ "name": "ground", "url": "" }, { "name": "fairy", "url": "" }],
        "capture_rate": 190,
        "varieties": [{ "pokemon": { "name": name, "url": "" } }],
        "is_baby": false,
        "is_mythical": false,
        "is_legendary": false,
        "evolution_chain": chain
    })
}

pub fn move_json(power: Option<u16>, pp: u16, accuracy: Option<u16>) -> Value {
    json!({
        "power": power,
        "pp": pp,
        "accuracy": accuracy,
        "target": { "name": "selected-pokemon", "url": "" }
    })
}

pub fn index_json(references: &[CatalogReference]) -> Value {
    json!({
        "count": references.len(),
        "results": references
    })
}
