//! Utilidades
//!
//! Este módulo contiene utilidades compartidas del sistema.

pub mod errors;
pub mod validation;
