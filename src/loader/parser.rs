use serde::de::DeserializeOwned;
use std::fs;

use crate::api::node_dto::NodesDto;
use crate::domain::node::resource_node::ResourceNode;
use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// This function reads a file from `file_path`, attempts to parse it
/// as JSON, and returns an instance of `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path).map_err(Error::IoError)?;

    let parsed_data: T = serde_json::from_str(&data).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

/// Loads a node seed file and converts every entry into its domain form.
/// A single invalid entry fails the whole load; a partially seeded registry
/// is worse than a clean error at startup.
pub fn load_nodes(file_path: &str) -> Result<Vec<ResourceNode>> {
    let dto: NodesDto = parse_json_file(file_path)?;

    let mut nodes = Vec::with_capacity(dto.nodes.len());
    for node_dto in dto.nodes {
        nodes.push(node_dto.into_domain()?);
    }

    log::info!("Loaded {} node(s) from '{}'.", nodes.len(), file_path);
    Ok(nodes)
}
