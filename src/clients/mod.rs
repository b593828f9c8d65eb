//! Clientes de colaboradores externos
//!
//! Interfaces estrechas de solo lectura hacia los datos que este
//! subsistema consume pero no posee: catálogo de productos, directorio
//! de clientes, servicio de pedidos y ledger de cobranza.

pub mod cash_ledger;
pub mod client_directory;
pub mod order_client;
pub mod product_catalog;
