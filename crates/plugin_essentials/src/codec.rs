//! # Data file codec
//!
//! Pure encode/decode functions for the three data files. No I/O happens
//! here; [`crate::storage`] reads and writes the bytes and the stores decide
//! what to log.
//!
//! | File        | Shape                                              |
//! |-------------|----------------------------------------------------|
//! | `warp.json` | array of location records                          |
//! | `home.json` | object: player UUID string -> array of records     |
//! | `hub.json`  | one location record, or `null`                     |
//!
//! Decoding is best effort below the top level: an entry that does not
//! parse is reported in [`Decoded::skipped`] and the rest of the file is
//! still returned. A top level of the wrong shape is an error.

use crate::location::LocationRecord;
use crate::types::PlayerId;
use serde::de::Error as _;
use serde_json::Value;
use std::collections::BTreeMap;

/// Decoded file contents plus a description of every entry that was dropped.
#[derive(Debug, Default)]
pub struct Decoded<T> {
    pub value: T,
    pub skipped: Vec<String>,
}

pub fn encode_warps(records: &[LocationRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

pub fn decode_warps(text: &str) -> Result<Decoded<Vec<LocationRecord>>, serde_json::Error> {
    let mut decoded = Decoded::default();
    if text.trim().is_empty() {
        return Ok(decoded);
    }

    match serde_json::from_str::<Value>(text)? {
        Value::Null => {}
        Value::Array(items) => {
            decoded.value = decode_records(items, "warp", &mut decoded.skipped);
        }
        other => {
            return Err(serde_json::Error::custom(format!(
                "expected an array of warps, found {}",
                kind(&other)
            )))
        }
    }
    Ok(decoded)
}

/// Encodes homes grouped by player. Keys are written in UUID order.
pub fn encode_homes(
    homes: &BTreeMap<PlayerId, Vec<LocationRecord>>,
) -> Result<String, serde_json::Error> {
    let keyed: BTreeMap<String, &Vec<LocationRecord>> = homes
        .iter()
        .map(|(player, records)| (player.to_string(), records))
        .collect();
    serde_json::to_string_pretty(&keyed)
}

pub fn decode_homes(
    text: &str,
) -> Result<Decoded<Vec<(PlayerId, Vec<LocationRecord>)>>, serde_json::Error> {
    let mut decoded = Decoded::default();
    if text.trim().is_empty() {
        return Ok(decoded);
    }

    let players = match serde_json::from_str::<Value>(text)? {
        Value::Null => return Ok(decoded),
        Value::Object(players) => players,
        other => {
            return Err(serde_json::Error::custom(format!(
                "expected an object of player homes, found {}",
                kind(&other)
            )))
        }
    };

    for (key, entry) in players {
        let player = match key.parse::<PlayerId>() {
            Ok(player) => player,
            Err(e) => {
                decoded.skipped.push(format!("player key '{key}': {e}"));
                continue;
            }
        };

        let records = match entry {
            Value::Null => Vec::new(),
            Value::Array(items) => decode_records(items, &key, &mut decoded.skipped),
            other => {
                decoded
                    .skipped
                    .push(format!("homes of {key}: expected an array, found {}", kind(&other)));
                continue;
            }
        };
        decoded.value.push((player, records));
    }
    Ok(decoded)
}

pub fn encode_hub(hub: Option<&LocationRecord>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&hub)
}

pub fn decode_hub(text: &str) -> Result<Option<LocationRecord>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
}

fn decode_records(items: Vec<Value>, owner: &str, skipped: &mut Vec<String>) -> Vec<LocationRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<LocationRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped.push(format!("{owner} entry #{index}: {e}"));
                None
            }
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
