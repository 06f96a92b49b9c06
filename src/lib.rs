pub mod server;
pub mod settings;

pub use server::router;
pub use settings::Settings;
