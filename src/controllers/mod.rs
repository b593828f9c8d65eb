//! Controllers
//!
//! Este módulo contiene la lógica de negocio entre los handlers HTTP y
//! los repositorios.

pub mod carga_controller;
pub mod cierre_controller;
pub mod pedido_controller;
pub mod route_controller;
pub mod stop_controller;
