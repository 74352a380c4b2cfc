//! Procedural scene synthesis.
//!
//! Composes a scene from fixed theme tables. The output depends only on the
//! origin scene, the chosen key and the generation sequence, so a given edge
//! traversal can always be reproduced.

use adventure_core::determinism::{DeterministicRng, SeededRng, pick};
use sha2::{Digest, Sha256};

use super::draft::{ChoiceDraft, SceneDraft};
use super::scene::{ChoiceKey, Scene, StatDelta};

const LOCATIONS: &[(&str, &str)] = &[
    ("Hollow", "a fog-choked hollow"),
    ("Ruins", "the crumbling ruins of a watchtower"),
    ("Marsh", "a marsh where lanterns drift over black water"),
    ("Crossroads", "a crossroads marked by a leaning stone"),
    ("Grotto", "a grotto dripping with luminous moss"),
    ("Orchard", "an orchard of silver-barked trees"),
    ("Causeway", "a narrow causeway above a roaring gorge"),
    ("Library", "a sunken library with drowned shelves"),
];

const ADJECTIVES: &[&str] = &[
    "Whispering",
    "Forgotten",
    "Ashen",
    "Gilded",
    "Restless",
    "Hollow",
    "Starlit",
    "Thorned",
];

const CREATURES: &[&str] = &[
    "a hooded wanderer",
    "a wolf with ember eyes",
    "a swarm of paper moths",
    "a stone golem half sunk in earth",
    "a laughing fox spirit",
    "a knight in rusted armour",
    "a blind oracle",
    "a coil of shadow",
];

const OBJECTS: &[&str] = &[
    "a tarnished compass",
    "a sealed letter",
    "a cracked hourglass",
    "a bone flute",
    "a lantern of blue glass",
    "a map stitched from leather",
    "a silver key",
    "a pouch of strange seeds",
];

const APPROACHES: &[&str] = &["Confront", "Follow", "Bargain with", "Study"];

const COLORS: &[&str] = &[
    "#2d5016", "#1a1a2e", "#4a148c", "#006064", "#3e2723", "#263238", "#4a7c59", "#5d4037",
];

/// Fixed outcomes a procedural choice may carry: `(health, gold, xp, grants item)`.
const DELTAS: &[(i32, i32, i32, bool)] = &[
    (-10, 0, 10, false),
    (0, 10, 5, false),
    (-20, 25, 15, false),
    (5, 0, 5, false),
    (-5, 0, 10, true),
    (0, -5, 20, false),
];

/// Derives the RNG seed for the edge `(origin_id, key)` at `sequence`.
#[must_use]
pub fn seed_for(origin_id: &str, key: ChoiceKey, sequence: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(origin_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(sequence.to_be_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

fn delta(rng: &mut dyn DeterministicRng, object: &str) -> StatDelta {
    let &(health, gold, xp, grants_item) = pick(rng, DELTAS);
    StatDelta {
        health,
        gold,
        xp,
        item: grants_item.then(|| strip_article(object).to_owned()),
    }
}

fn strip_article(phrase: &str) -> &str {
    phrase
        .strip_prefix("a ")
        .or_else(|| phrase.strip_prefix("an "))
        .or_else(|| phrase.strip_prefix("the "))
        .unwrap_or(phrase)
}

fn capitalize(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Composes a draft for the edge `(origin, key)` at `sequence`.
#[must_use]
pub fn compose(origin: &Scene, key: ChoiceKey, sequence: u64) -> SceneDraft {
    let mut rng = SeededRng::from_seed(seed_for(origin.id.as_str(), key, sequence));
    compose_with(origin, key, &mut rng)
}

/// Composes a draft for the edge `(origin, key)` drawing table entries from
/// `rng`.
pub fn compose_with(origin: &Scene, key: ChoiceKey, rng: &mut dyn DeterministicRng) -> SceneDraft {
    let &(place, place_phrase) = pick(rng, LOCATIONS);
    let adjective = *pick(rng, ADJECTIVES);
    let creature = *pick(rng, CREATURES);
    let object = *pick(rng, OBJECTS);
    let approach = *pick(rng, APPROACHES);
    let color = *pick(rng, COLORS);

    let chosen = origin.choice(key).text.trim_end_matches('.');

    SceneDraft {
        title: format!("The {adjective} {place}"),
        description: format!(
            "{} opens before you.\n{} waits beside {}.",
            capitalize(place_phrase),
            capitalize(creature),
            object
        ),
        summary: format!("You chose to {}.", lowercase_first(chosen)),
        background_color: color.to_owned(),
        choice_a: ChoiceDraft {
            text: format!("{approach} {creature}"),
            stat_delta: delta(rng, object),
        },
        choice_b: ChoiceDraft {
            text: format!("Take {} and move on", strip_article(object)),
            stat_delta: delta(rng, object),
        },
    }
}

fn lowercase_first(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
