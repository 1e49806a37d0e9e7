pub mod db;
pub mod pipeline;
pub mod prompts;
pub mod reports;
pub mod settings;
