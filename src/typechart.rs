//! Static type-effectiveness table and weakness resolution.
//!
//! The table maps each of the 18 types to the attack types it is weak
//! against and the attack types it resists. Values are fixed at compile
//! time; there is no runtime lookup against the API.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown type name `{0}`")]
pub struct UnknownTypeError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dark,
    Dragon,
    Steel,
    Fairy,
}

use PokemonType::*;

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        Normal, Fire, Water, Grass, Electric, Ice, Fighting, Poison, Ground,
        Flying, Psychic, Bug, Rock, Ghost, Dark, Dragon, Steel, Fairy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Normal => "normal",
            Fire => "fire",
            Water => "water",
            Grass => "grass",
            Electric => "electric",
            Ice => "ice",
            Fighting => "fighting",
            Poison => "poison",
            Ground => "ground",
            Flying => "flying",
            Psychic => "psychic",
            Bug => "bug",
            Rock => "rock",
            Ghost => "ghost",
            Dark => "dark",
            Dragon => "dragon",
            Steel => "steel",
            Fairy => "fairy",
        }
    }

    /// Attack types this defending type takes increased damage from.
    pub fn weak_against(self) -> &'static [PokemonType] {
        match self {
            Normal => &[Fighting],
            Fire => &[Ground, Rock, Water],
            Water => &[Grass, Electric],
            Grass => &[Flying, Poison, Bug, Fire, Ice],
            Electric => &[Ground],
            Ice => &[Fighting, Rock, Steel, Fire],
            Fighting => &[Flying, Psychic, Fairy],
            Poison => &[Ground, Psychic],
            Ground => &[Water, Grass, Ice],
            Flying => &[Rock, Electric, Ice],
            Psychic => &[Bug, Ghost, Dark],
            Bug => &[Flying, Rock, Fire],
            Rock => &[Fighting, Ground, Steel, Water, Grass],
            Ghost => &[Ghost, Dark],
            Dark => &[Fighting, Bug, Fairy],
            Dragon => &[Ice, Dragon, Fairy],
            Steel => &[Fighting, Ground, Fire],
            Fairy => &[Poison, Steel],
        }
    }

    /// Attack types this defending type resists or is immune to.
    pub fn strong_against(self) -> &'static [PokemonType] {
        match self {
            Normal => &[Ghost],
            Fire => &[Bug, Steel, Fire, Grass, Ice, Fairy],
            Water => &[Steel, Fire, Water, Ice],
            Grass => &[Ground, Water, Grass, Electric],
            Electric => &[Flying, Steel, Electric],
            Ice => &[Ice],
            Fighting => &[Rock, Bug, Dark],
            Poison => &[Fighting, Poison, Bug, Grass, Fairy],
            Ground => &[Poison, Rock, Electric],
            Flying => &[Fighting, Bug, Grass, Ground],
            Psychic => &[Fighting, Psychic],
            Bug => &[Fighting, Ground, Grass],
            Rock => &[Normal, Flying, Poison, Fire],
            Ghost => &[Poison, Bug, Normal, Fighting],
            Dark => &[Ghost, Dark, Psychic],
            Dragon => &[Fire, Water, Grass, Electric],
            Steel => &[
                Normal, Flying, Rock, Bug, Steel, Grass, Psychic, Ice, Dragon,
                Fairy, Poison,
            ],
            Fairy => &[Fighting, Bug, Dark, Dragon],
        }
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PokemonType {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PokemonType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownTypeError(s.to_string()))
    }
}

/// Resolve the effective weaknesses of a type combination.
///
/// The weak-against and strong-against sets of every type are concatenated
/// in type order, then the weak list is filtered: an entry survives if no
/// type in the combination resists it and if it is the first occurrence of
/// that entry. Order follows first occurrence in the combined weak list.
///
/// Double and quadruple weakness is intentionally not modeled; a weakness
/// either survives nullification or it does not.
pub fn effective_weaknesses(types: &[PokemonType]) -> Vec<PokemonType> {
    let mut weak: Vec<PokemonType> = Vec::new();
    let mut strong: Vec<PokemonType> = Vec::new();
    for t in types {
        weak.extend_from_slice(t.weak_against());
        strong.extend_from_slice(t.strong_against());
    }

    weak.iter()
        .enumerate()
        .filter(|(index, candidate)| {
            let nullified = strong.contains(candidate);
            let first_occurrence =
                weak.iter().position(|w| w == *candidate) == Some(*index);
            !nullified && first_occurrence
        })
        .map(|(_, candidate)| *candidate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_names_round_trip() {
        for t in PokemonType::ALL {
            assert_eq!(t.name().parse::<PokemonType>(), Ok(t));
        }
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let err = "stellar".parse::<PokemonType>().unwrap_err();
        assert_eq!(err, UnknownTypeError("stellar".to_string()));
    }

    #[test]
    fn single_type_keeps_its_full_weak_set() {
        assert_eq!(effective_weaknesses(&[Normal]), vec![Fighting]);
        assert_eq!(effective_weaknesses(&[Electric]), vec![Ground]);
    }

    #[test]
    fn second_type_nullifies_resisted_weaknesses() {
        // Fire/Flying: fire's ground weakness is nullified by flying, the
        // shared ice weakness is nullified by fire, rock is deduplicated.
        assert_eq!(
            effective_weaknesses(&[Fire, Flying]),
            vec![Rock, Water, Electric]
        );

        // Water/Ground: only grass survives; electric is resisted by
        // ground, water and ice by water, the duplicate grass is dropped.
        assert_eq!(effective_weaknesses(&[Water, Ground]), vec![Grass]);
    }

    #[test]
    fn order_follows_first_occurrence() {
        // Grass/Poison: grass contributes flying/fire/ice, poison appends
        // psychic; poison and bug are resisted, ground is resisted by grass.
        assert_eq!(
            effective_weaknesses(&[Grass, Poison]),
            vec![Flying, Fire, Ice, Psychic]
        );
    }

    #[test]
    fn empty_type_list_has_no_weaknesses() {
        assert_eq!(effective_weaknesses(&[]), Vec::<PokemonType>::new());
    }

    #[test]
    fn all_pairs_respect_nullification_and_dedup() {
        for a in PokemonType::ALL {
            for b in PokemonType::ALL {
                let result = effective_weaknesses(&[a, b]);

                let mut strong: Vec<PokemonType> = Vec::new();
                strong.extend_from_slice(a.strong_against());
                strong.extend_from_slice(b.strong_against());

                for (i, w) in result.iter().enumerate() {
                    assert!(
                        !strong.contains(w),
                        "{a}/{b}: {w} survives despite being resisted"
                    );
                    assert!(
                        !result[..i].contains(w),
                        "{a}/{b}: {w} appears twice"
                    );
                    assert!(
                        a.weak_against().contains(w) || b.weak_against().contains(w),
                        "{a}/{b}: {w} is not a weakness of either type"
                    );
                }
            }
        }
    }
}
