pub mod cleaning;
pub mod erase;
pub mod export;
pub mod groups;
pub mod import;
pub mod prompts;
