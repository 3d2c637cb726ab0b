pub mod ai;
pub mod database;

pub use ai::AiService;
pub use database::Database;
