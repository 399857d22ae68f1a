pub mod postgrest_backend;

pub use postgrest_backend::PostgrestBackend;
