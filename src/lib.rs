pub mod app;
pub mod asset;
pub mod error;
pub mod gpu;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod time;
pub mod viewer;

pub use error::{Error, Result};
pub use settings::ViewerSettings;
pub use viewer::Viewer;
