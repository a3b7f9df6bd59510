//! Default hunt content inserted into an empty store.

use super::{HuntStore, StoreResult};
use crate::types::NewLocation;

const DEFAULT_HUNT: &[(&str, [&str; 3])] = &[
    (
        "Prime Pizza",
        [
            "It is a restaurant where they sell food that everyone likes.",
            "It is a place where they sell a type of Italian food.",
            "They create this food in a New York way.",
        ],
    ),
    (
        "Prince Street Pizza",
        [
            "It's a place famous for its Sicilian-style pizza.",
            "Its name includes a well-known New York street.",
            "It started in NYC and is known for its thick, square slices.",
        ],
    ),
    (
        "Hamilton Park",
        [
            "A place that receives the name of a Founding Father of the US",
            "Is a place where you can go with family and friends to have a good time",
            "It's a big green space with lots of grass and trees.",
        ],
    ),
    (
        "McDonald Park",
        [
            "This place is called like a big chain of fast food restaurants",
            "It has a soccer field",
            "It's a place to play and enjoy outdoor activities",
        ],
    ),
    (
        "Rose Bowl",
        [
            "It is the place where different athletic events take place",
            "It has the name of a flower",
            "It is the home of the LAFC, UCLA and other teams",
        ],
    ),
    (
        "Huntington Museum",
        [
            "It's a museum named after an important family.",
            "It's a place where you can see art, gardens, and a library.",
            "It has a large collection of rare books, European art, and exotic plants.",
        ],
    ),
    (
        "Bloomfield Creamery",
        [
            "It's a place where you can get something cold and sweet.",
            "Its name includes a flower showing all of its petals and a field.",
            "They serve ice cream in many different flavors.",
        ],
    ),
    (
        "Starbucks",
        [
            "It's a place where many people go for coffee or tea.",
            "Its logo is a green mermaid.",
            "You can order drinks, snacks, and even work or study there.",
        ],
    ),
];

/// The built-in hunt, in play order. Each location's answer is its name.
pub fn default_locations() -> Vec<NewLocation> {
    DEFAULT_HUNT
        .iter()
        .map(|(name, clues)| NewLocation {
            name: name.to_string(),
            clues: clues.iter().map(|c| c.to_string()).collect(),
            answer: name.to_string(),
        })
        .collect()
}

/// Insert the default hunt when the store has no locations yet.
/// Returns how many locations were added.
pub async fn seed_locations(store: &dyn HuntStore) -> StoreResult<usize> {
    if !store.list_locations().await?.is_empty() {
        return Ok(0);
    }
    let locations = default_locations();
    let count = locations.len();
    for location in locations {
        store.add_location(location).await?;
    }
    Ok(count)
}
