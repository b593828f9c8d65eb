//! Modelos
//!
//! Este módulo contiene los structs que mapean a las tablas del subsistema
//! de rutas y su lógica pura (máquinas de estado, aritmética de ledger).

pub mod carga;
pub mod cierre;
pub mod pedido;
pub mod route;
pub mod stop;
