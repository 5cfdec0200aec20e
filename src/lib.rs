pub mod error;
pub mod history;
pub mod render;
pub mod swatch;
pub mod theme;

pub use error::{HistoryError, Result};
pub use history::{HistoryConfig, HistoryService, SaveOutcome};
pub use swatch::{Color, EMPTY_COLOR, Swatches};
pub use theme::{StoredTheme, ThemeRecord};
