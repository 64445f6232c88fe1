pub mod logging;
pub mod mask;
pub mod settings;

pub use settings::PainterSettings;
