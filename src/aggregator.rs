//! Catalog aggregator: one reference in, one fully resolved entry out

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{
    artwork_sprite_url, home_sprite_url, reference_id, species_url, ApiResource, ChainLink,
    EncounterRecord, FlavorTextEntry, LocalizedName, MoveRecord, PokeApi, PokemonMoveSlot,
    PokemonRecord, PokemonStatSlot, SpeciesRecord,
};
use crate::config::CatalogConfig;
use crate::error::{FetchError, ResolutionFailure};
use crate::state::{BaseStats, CatalogEntry, CatalogReference, EvolutionStep, MoveSummary};

const UNKNOWN: &str = "Unknown";
const DESCRIPTION_LANGUAGE: &str = "en";
const JAPANESE_LANGUAGE: &str = "ja";
const ROMAJI_LANGUAGE: &str = "roomaji";

/// Entries resolved from a set of references.
#[derive(Debug, Default)]
pub struct ResolvedSet {
    /// `(position in the input, entry)` in completion order
    pub resolved: Vec<(usize, CatalogEntry)>,
    pub failed: usize,
    pub aborted: usize,
}

impl ResolvedSet {
    /// Entries in the order they finished.
    pub fn into_completion_order(self) -> Vec<CatalogEntry> {
        self.resolved.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Entries in the order of the input references.
    pub fn into_input_order(mut self) -> Vec<CatalogEntry> {
        self.resolved.sort_by_key(|(position, _)| *position);
        self.into_completion_order()
    }
}

#[derive(Clone)]
pub struct Aggregator {
    api: PokeApi,
    move_details: bool,
    move_permits: usize,
    resolve_permits: usize,
}

impl Aggregator {
    pub fn new(api: PokeApi, config: &CatalogConfig) -> Self {
        Self {
            api,
            move_details: !config.skip_move_details,
            move_permits: config.move_permits(),
            resolve_permits: config.resolve_permits(),
        }
    }

    pub fn api(&self) -> &PokeApi {
        &self.api
    }

    /// Resolve one reference. A failure means the reference is skipped; no
    /// partially populated entry is ever produced.
    pub async fn resolve(
        &self,
        reference: &CatalogReference,
        cancel: &CancellationToken,
    ) -> Result<CatalogEntry, ResolutionFailure> {
        let name = reference.name.as_str();
        let species_url = species_url(&reference.url);
        let (pokemon, species) = tokio::join!(
            self.api.pokemon(&reference.url, cancel),
            self.api.species(&species_url, cancel),
        );
        let pokemon = pokemon.map_err(|err| ResolutionFailure::primary(name, err))?;
        let species = species.map_err(|err| ResolutionFailure::primary(name, err))?;

        // Encounters are required: their failure cuts off the optional fan-outs.
        let subresources = cancel.child_token();
        let encounters = async {
            let result = self
                .api
                .encounters(&pokemon.location_area_encounters, cancel)
                .await;
            if result.is_err() {
                subresources.cancel();
            }
            result
        };
        let (locations, evolutions, moves) = tokio::join!(
            encounters,
            self.evolutions(name, species.evolution_chain.as_ref(), &subresources),
            self.moves(&pokemon.moves, &subresources),
        );
        let locations =
            locations.map_err(|err| ResolutionFailure::subresource(name, "encounters", err))?;
        if cancel.is_cancelled() {
            return Err(ResolutionFailure::Aborted {
                name: name.to_string(),
            });
        }

        Ok(build_entry(pokemon, species, &locations, evolutions, moves))
    }

    /// Resolve every reference concurrently. Failures are logged and counted,
    /// never propagated to siblings.
    pub async fn resolve_all(
        &self,
        references: Vec<CatalogReference>,
        cancel: &CancellationToken,
    ) -> ResolvedSet {
        let semaphore = Arc::new(Semaphore::new(self.resolve_permits));
        let mut join_set = JoinSet::new();
        for (position, reference) in references.into_iter().enumerate() {
            let aggregator = self.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => aggregator.resolve(&reference, &cancel).await,
                    Err(_) => Err(ResolutionFailure::Unexpected {
                        name: reference.name.clone(),
                        reason: "resolve semaphore closed".to_string(),
                    }),
                };
                (position, result)
            });
        }

        let mut set = ResolvedSet::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((position, Ok(entry))) => set.resolved.push((position, entry)),
                Ok((_, Err(failure))) if failure.is_aborted() => {
                    debug!(error = %failure, "resolution aborted");
                    set.aborted += 1;
                }
                Ok((_, Err(failure))) => {
                    warn!(error = %failure, "dropping unresolved entry");
                    set.failed += 1;
                }
                Err(err) => {
                    warn!(error = %err, "resolution task failed");
                    set.failed += 1;
                }
            }
        }
        set
    }

    async fn evolutions(
        &self,
        name: &str,
        chain: Option<&ApiResource>,
        cancel: &CancellationToken,
    ) -> Vec<EvolutionStep> {
        let Some(chain) = chain else {
            return Vec::new();
        };
        let root = match self.api.evolution_chain(&chain.url, cancel).await {
            Ok(root) => root,
            Err(err) => {
                if !err.is_aborted() {
                    debug!(name = %name, error = %err, "evolution chain unavailable");
                }
                return Vec::new();
            }
        };

        let stages = linear_chain(&root);
        let lookups = futures::future::join_all(
            stages
                .iter()
                .map(|stage| self.api.pokemon_by_name(&stage.species_name, cancel)),
        )
        .await;

        let mut steps = Vec::with_capacity(stages.len());
        for (stage, lookup) in stages.into_iter().zip(lookups) {
            let id = match lookup {
                Ok(record) => Some(record.id),
                Err(_) => stage.species_id,
            };
            let Some(id) = id else {
                break;
            };
            steps.push(stage.into_step(home_sprite_url(id)));
        }
        steps
    }

    async fn moves(&self, slots: &[PokemonMoveSlot], cancel: &CancellationToken) -> Vec<MoveSummary> {
        let summaries: Vec<MoveSummary> = slots.iter().map(move_summary).collect();
        if !self.move_details || summaries.is_empty() {
            return summaries;
        }
        if cancel.is_cancelled() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.move_permits));
        let mut join_set = JoinSet::new();
        for (position, slot) in slots.iter().enumerate() {
            let api = self.api.clone();
            let url = slot.move_info.url.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (position, Err(FetchError::Aborted));
                };
                (position, api.move_detail(&url, &cancel).await)
            });
        }

        let mut details: Vec<Option<MoveRecord>> = (0..summaries.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((position, Ok(record))) => details[position] = Some(record),
                Ok((position, Err(err))) => {
                    if !err.is_aborted() {
                        debug!(move_name = %summaries[position].name, error = %err, "dropping move");
                    }
                }
                Err(err) => warn!(error = %err, "move detail task failed"),
            }
        }

        summaries
            .into_iter()
            .zip(details)
            .filter_map(|(summary, detail)| detail.map(|detail| with_move_detail(summary, detail)))
            .collect()
    }
}

/// One node of an evolution chain, before its sprite id is known.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ChainStage {
    pub species_name: String,
    pub species_id: Option<u32>,
    pub min_level: Option<u16>,
    pub trigger_name: Option<String>,
    pub item: Option<String>,
}

impl ChainStage {
    fn into_step(self, image: String) -> EvolutionStep {
        EvolutionStep {
            species_name: self.species_name,
            min_level: self.min_level,
            trigger_name: self.trigger_name,
            item: self.item,
            image,
        }
    }
}

/// Root-to-leaf walk following the first child of every node. Branching
/// chains are flattened to their first branch.
pub(crate) fn linear_chain(root: &ChainLink) -> Vec<ChainStage> {
    let mut stages = Vec::new();
    let mut node = Some(root);
    while let Some(link) = node {
        let details = link.evolution_details.first();
        stages.push(ChainStage {
            species_name: link.species.name.clone(),
            species_id: reference_id(&link.species.url),
            min_level: details.and_then(|detail| detail.min_level),
            trigger_name: details
                .and_then(|detail| detail.trigger.as_ref())
                .map(|trigger| trigger.name.clone()),
            item: details
                .and_then(|detail| detail.item.as_ref())
                .map(|item| item.name.clone()),
        });
        node = link.evolves_to.first();
    }
    stages
}

fn build_entry(
    pokemon: PokemonRecord,
    species: SpeciesRecord,
    locations: &[EncounterRecord],
    evolutions: Vec<EvolutionStep>,
    moves: Vec<MoveSummary>,
) -> CatalogEntry {
    let id = pokemon.id;
    CatalogEntry {
        id,
        name: pokemon.name,
        image: home_sprite_url(id),
        fallback_image: artwork_sprite_url(id),
        types: pokemon
            .types
            .into_iter()
            .map(|slot| slot.type_info.name)
            .collect(),
        description: description(&species.flavor_text_entries),
        habitat: species
            .habitat
            .map(|habitat| title_case(&habitat.name))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        shape: species
            .shape
            .map(|shape| title_case(&shape.name))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        egg_groups: species
            .egg_groups
            .iter()
            .map(|group| title_case(&group.name))
            .collect::<Vec<_>>()
            .join(", "),
        height: pokemon.height,
        weight: pokemon.weight,
        capture_rate: species.capture_rate,
        location: location_summary(locations),
        varieties: species
            .varieties
            .iter()
            .map(|variety| variety.pokemon.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        japanese_name: localized_name(&species.names, JAPANESE_LANGUAGE),
        romaji_name: localized_name(&species.names, ROMAJI_LANGUAGE),
        is_baby: species.is_baby,
        is_mythical: species.is_mythical,
        is_legendary: species.is_legendary,
        stats: base_stats(&pokemon.stats),
        evolutions,
        total_moves: pokemon.moves.len(),
        moves,
    }
}

fn move_summary(slot: &PokemonMoveSlot) -> MoveSummary {
    let first = slot.version_group_details.first();
    MoveSummary {
        name: title_case(&slot.move_info.name),
        level_learned_at: first.and_then(|detail| detail.level_learned_at),
        learn_method: first
            .and_then(|detail| detail.move_learn_method.as_ref())
            .map(|method| method.name.clone()),
        target: None,
        power: None,
        pp: None,
        accuracy: None,
    }
}

fn with_move_detail(summary: MoveSummary, detail: MoveRecord) -> MoveSummary {
    MoveSummary {
        target: detail.target.map(|target| target.name),
        power: detail.power,
        pp: detail.pp,
        accuracy: detail.accuracy,
        ..summary
    }
}

fn base_stats(slots: &[PokemonStatSlot]) -> BaseStats {
    let mut stats = BaseStats::default();
    for slot in slots {
        let value = Some(slot.base_stat);
        match slot.stat.name.as_str() {
            "hp" => stats.hp = value,
            "attack" => stats.attack = value,
            "defense" => stats.defense = value,
            "special-attack" => stats.special_attack = value,
            "special-defense" => stats.special_defense = value,
            "speed" => stats.speed = value,
            _ => {}
        }
    }
    stats
}

fn location_summary(locations: &[EncounterRecord]) -> String {
    locations
        .iter()
        .map(|encounter| title_case(&encounter.location_area.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn localized_name(names: &[LocalizedName], language: &str) -> String {
    names
        .iter()
        .find(|entry| entry.language.name == language)
        .map(|entry| entry.name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn description(entries: &[FlavorTextEntry]) -> String {
    entries
        .iter()
        .find(|entry| entry.language.name == DESCRIPTION_LANGUAGE)
        .map(|entry| sanitize_text(&entry.flavor_text))
        .unwrap_or_default()
}

fn sanitize_text(text: &str) -> String {
    text.replace('\n', " ").replace('\u{000C}', " ")
}

/// `"rocky-helmet-cave"` to `"Rocky Helmet Cave"`.
pub fn title_case(slug: &str) -> String {
    slug.split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
