// Aplicação drive-upload
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod utils;
