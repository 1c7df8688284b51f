mod config;
mod demo;
mod embed;
mod index;
mod load;
mod search;
mod status;

pub use config::ConfigCommand;
pub use demo::DemoArgs;
pub use embed::EmbedArgs;
pub use index::IndexCommand;
pub use load::LoadArgs;
pub use search::SearchArgs;

pub use config::handle_config;
pub use demo::handle_demo;
pub use embed::handle_embed;
pub use index::handle_index;
pub use load::handle_load;
pub use search::handle_search;
pub use status::handle_status;
