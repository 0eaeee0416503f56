pub mod node_dto;
pub mod response_dto;
