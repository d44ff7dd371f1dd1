//! In-memory Pokémon records and the append-only session store.

use crate::typechart::PokemonType;

/// A single Pokédex entry. Created with just a name and detail URL when the
/// listing loads; the remaining fields are filled in place when their
/// fetches resolve and are never fetched twice.
#[derive(Debug, Clone, Default)]
pub struct Pokemon {
    pub name: String,
    pub detail_url: String,
    pub id: Option<u32>,
    pub height: Option<u32>,
    pub weight: Option<u32>,
    pub types: Vec<PokemonType>,
    pub sprite_url: Option<String>,
    pub species_url: Option<String>,
    pub flavor_text: Option<String>,
}

/// Payload of a per-record detail fetch.
#[derive(Debug, Clone)]
pub struct BasicInfo {
    pub id: u32,
    pub height: u32,
    pub weight: u32,
    pub types: Vec<PokemonType>,
    pub sprite_url: Option<String>,
    pub species_url: String,
}

impl Pokemon {
    pub fn new(name: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Pokemon {
            name: name.into(),
            detail_url: detail_url.into(),
            ..Pokemon::default()
        }
    }

    /// Whether the detail fetch has already populated this record.
    pub fn is_detailed(&self) -> bool {
        self.id.is_some()
    }

    /// Populate detail fields in place. Returns false (and changes nothing)
    /// if the record is already detailed.
    pub fn apply_basic_info(&mut self, info: BasicInfo) -> bool {
        if self.is_detailed() {
            return false;
        }
        self.id = Some(info.id);
        self.height = Some(info.height);
        self.weight = Some(info.weight);
        self.types = info.types;
        self.sprite_url = info.sprite_url;
        self.species_url = Some(info.species_url);
        true
    }

    /// Populate the flavor text. Returns false if it was already set.
    pub fn apply_flavor_text(&mut self, text: String) -> bool {
        if self.flavor_text.is_some() {
            return false;
        }
        self.flavor_text = Some(text);
        true
    }
}

/// Ordered, append-only collection of the session's Pokémon records.
#[derive(Debug, Default)]
pub struct PokemonStore {
    entries: Vec<Pokemon>,
}

impl PokemonStore {
    pub fn new() -> Self {
        PokemonStore::default()
    }

    /// Append a record. Malformed records (empty name or detail URL) and
    /// names already present are silently dropped, so re-adding a page is
    /// idempotent. Returns whether the record was stored.
    pub fn add(&mut self, pokemon: Pokemon) -> bool {
        if pokemon.name.is_empty() || pokemon.detail_url.is_empty() {
            return false;
        }
        if self.find_by_name(&pokemon.name).is_some() {
            return false;
        }
        self.entries.push(pokemon);
        true
    }

    pub fn get(&self, index: usize) -> Option<&Pokemon> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pokemon> {
        self.entries.get_mut(index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Pokemon> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pokemon> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typechart::PokemonType;
    use pretty_assertions::assert_eq;

    fn sample_info() -> BasicInfo {
        BasicInfo {
            id: 25,
            height: 4,
            weight: 60,
            types: vec![PokemonType::Electric],
            sprite_url: Some("https://sprites.example/25.png".to_string()),
            species_url: "https://pokeapi.example/pokemon-species/25/".to_string(),
        }
    }

    #[test]
    fn add_rejects_malformed_records() {
        let mut store = PokemonStore::new();
        assert!(!store.add(Pokemon::new("", "https://pokeapi.example/pokemon/1/")));
        assert!(!store.add(Pokemon::new("bulbasaur", "")));
        assert!(store.is_empty());
    }

    #[test]
    fn add_skips_duplicate_names() {
        let mut store = PokemonStore::new();
        assert!(store.add(Pokemon::new("pikachu", "https://pokeapi.example/pokemon/25/")));
        assert!(!store.add(Pokemon::new("pikachu", "https://pokeapi.example/pokemon/25/")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn records_are_queryable_by_name_in_insertion_order() {
        let mut store = PokemonStore::new();
        store.add(Pokemon::new("bulbasaur", "https://pokeapi.example/pokemon/1/"));
        store.add(Pokemon::new("ivysaur", "https://pokeapi.example/pokemon/2/"));

        assert_eq!(store.get(0).unwrap().name, "bulbasaur");
        assert_eq!(store.get(1).unwrap().name, "ivysaur");
        assert!(store.find_by_name("ivysaur").is_some());
        assert!(store.find_by_name("mew").is_none());
    }

    #[test]
    fn basic_info_is_applied_at_most_once() {
        let mut pokemon = Pokemon::new("pikachu", "https://pokeapi.example/pokemon/25/");
        assert!(!pokemon.is_detailed());
        assert!(pokemon.apply_basic_info(sample_info()));
        assert!(pokemon.is_detailed());

        let mut second = sample_info();
        second.height = 999;
        assert!(!pokemon.apply_basic_info(second));
        assert_eq!(pokemon.height, Some(4));
    }

    #[test]
    fn flavor_text_is_applied_at_most_once() {
        let mut pokemon = Pokemon::new("pikachu", "https://pokeapi.example/pokemon/25/");
        assert!(pokemon.apply_flavor_text("A mouse.".to_string()));
        assert!(!pokemon.apply_flavor_text("Rewritten.".to_string()));
        assert_eq!(pokemon.flavor_text.as_deref(), Some("A mouse."));
    }
}
