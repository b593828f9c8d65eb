//! Repositorios
//!
//! Este módulo contiene el acceso a datos de los agregados del
//! subsistema de rutas.

pub mod carga_repository;
pub mod cierre_repository;
pub mod pedido_repository;
pub mod route_repository;
pub mod stop_repository;
