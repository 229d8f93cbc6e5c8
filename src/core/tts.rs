use crate::domain::model::{CardObject, CustomDeck};
use serde_json::Value;
use std::collections::HashMap;

const CARD_OBJECT_NAMES: [&str; 2] = ["Card", "CardCustom"];

/// Walk a Saved Object tree and collect every card reference, in document
/// order. Cards nested in decks, bags and other containers are included.
pub fn find_cards(save: &Value) -> Vec<CardObject> {
    let mut cards = Vec::new();
    collect_cards(save, &mut cards);
    cards
}

fn collect_cards(value: &Value, out: &mut Vec<CardObject>) {
    match value {
        Value::Object(map) => {
            let is_card = map
                .get("Name")
                .and_then(Value::as_str)
                .is_some_and(|name| CARD_OBJECT_NAMES.contains(&name));
            if is_card {
                out.push(CardObject {
                    nickname: map
                        .get("Nickname")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    card_id: map.get("CardID").and_then(Value::as_i64).unwrap_or(0),
                });
            }
            for child in map.values() {
                collect_cards(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_cards(item, out);
            }
        }
        _ => {}
    }
}

/// Merge every `CustomDeck` table in the Saved Object into one deck-id map.
/// Malformed entries are skipped with a warning rather than failing the run.
pub fn find_custom_decks(save: &Value) -> HashMap<String, CustomDeck> {
    let mut decks = HashMap::new();
    collect_decks(save, &mut decks);
    decks
}

fn collect_decks(value: &Value, out: &mut HashMap<String, CustomDeck>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(table)) = map.get("CustomDeck") {
                for (deck_id, entry) in table {
                    match serde_json::from_value::<CustomDeck>(entry.clone()) {
                        Ok(deck) => {
                            out.insert(deck_id.clone(), deck);
                        }
                        Err(e) => {
                            tracing::warn!("Skipping malformed CustomDeck entry {}: {}", deck_id, e);
                        }
                    }
                }
            }
            for child in map.values() {
                collect_decks(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_decks(item, out);
            }
        }
        _ => {}
    }
}
