//! tests/mod.rs
//! Pruebas del servicio. Los colaboradores externos (proveedor de correo,
//! store del log) se sustituyen por fakes en memoria.

mod email_tests;
mod support;
