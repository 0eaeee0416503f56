use crate::error::Result;
use crate::loader::parser::load_nodes;
use crate::service::MedGridService;

pub mod api;
pub mod domain;
pub mod error;
pub mod geocoder;
pub mod loader;
pub mod logger;
pub mod service;

/// Builds a ready-to-use service from a node seed file.
pub fn bootstrap_from_file(file_path: &str) -> Result<MedGridService> {
    logger::init();
    log::info!("Logger initialized. Seeding the service from '{}'.", file_path);

    let service = MedGridService::new();

    for node in load_nodes(file_path)? {
        service.register_node(node)?;
    }

    log::info!("Service seeded with {} node(s).", service.node_count());

    Ok(service)
}
