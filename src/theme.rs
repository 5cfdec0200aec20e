use crate::swatch::{Color, Swatches};

/// One saved colour theme.
///
/// Deserializes from the mappings produced by the search parser; any extra
/// fields (such as pre-rendered image handles) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThemeRecord {
    pub title: String,
    pub author: String,
    /// Localized date string, stored verbatim.
    pub edited_at: String,
    pub rating: String,
    /// Between zero and five colours.
    #[serde(default)]
    pub swatches: Vec<Color>,
}

/// A theme read back from storage together with its decoded slot layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTheme {
    /// `record.swatches` holds exactly the used colours.
    pub record: ThemeRecord,
    pub swatches: Swatches,
}

impl StoredTheme {
    pub(crate) fn new(mut record: ThemeRecord, swatches: Swatches) -> Self {
        record.swatches = swatches.colors();
        Self { record, swatches }
    }
}
