pub mod node_registry;
pub mod resource_node;
