use serde_yaml::{Mapping, Value};

use crate::error::{ReleaseError, Result};

/// Sets a scalar at a dotted path like `ref.tag`, creating intermediate
/// mappings as needed.
pub fn set_scalar(doc: &mut Value, path: &str, value: &str) -> Result<()> {
    let mut node = doc;
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| ReleaseError::config("empty yaml path"))?;

    for segment in parents {
        let map = as_mapping(node, path)?;
        let key = Value::String(segment.to_string());
        node = map
            .entry(key)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    let map = as_mapping(node, path)?;
    map.insert(
        Value::String(last.to_string()),
        Value::String(value.to_string()),
    );
    Ok(())
}

/// Removes the key at a dotted path. Missing keys are not an error.
pub fn delete_key(doc: &mut Value, path: &str) -> Result<()> {
    let mut node = doc;
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| ReleaseError::config("empty yaml path"))?;

    for segment in parents {
        let map = as_mapping(node, path)?;
        let key = Value::String(segment.to_string());
        match map.get_mut(&key) {
            Some(next) => node = next,
            None => return Ok(()),
        }
    }

    let map = as_mapping(node, path)?;
    map.remove(Value::String(last.to_string()));
    Ok(())
}

fn as_mapping<'a>(node: &'a mut Value, path: &str) -> Result<&'a mut Mapping> {
    node.as_mapping_mut().ok_or_else(|| {
        ReleaseError::config(format!("yaml node at {} is not a mapping", path))
    })
}
