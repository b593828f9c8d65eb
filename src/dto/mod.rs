//! DTOs
//!
//! Este módulo contiene los requests, responses y filtros de la API.

pub mod carga_dto;
pub mod cierre_dto;
pub mod common;
pub mod route_dto;
pub mod stop_dto;

pub use common::ApiResponse;
