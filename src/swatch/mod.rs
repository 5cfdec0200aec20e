//! Fixed-width storage layout for a theme's colour swatches.
//!
//! A theme carries between zero and [`MAX_SWATCHES`] colours. Storage always
//! has exactly five nullable slots; no count column is persisted, so the
//! number of used colours is recovered on decode from the first empty slot.

use crate::error::{HistoryError, Result};

/// Number of swatch slots in the persisted layout.
pub const MAX_SWATCHES: usize = 5;

/// Marks an unused swatch position in a decoded [`Swatches`].
///
/// Valid colour codes are `0..=u32::MAX`, so a negative value never
/// collides with a real colour.
pub const EMPTY_COLOR: i64 = -1;

/// A 32-bit ARGB colour code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Color(u32);

impl Color {
    pub const fn new(argb: u32) -> Self {
        Self(argb)
    }

    pub const fn argb(self) -> u32 {
        self.0
    }

    /// Widened code used in decoded slot arrays, where [`EMPTY_COLOR`] also lives.
    pub fn code(self) -> i64 {
        i64::from(self.0)
    }
}

impl From<u32> for Color {
    fn from(argb: u32) -> Self {
        Self(argb)
    }
}

/// Raw slot contents as stored in the `color0..color4` columns.
pub type Slots = [Option<String>; MAX_SWATCHES];

/// Decoded swatches: five colour codes plus the number that carry real data.
///
/// Positions at or beyond `used_count` always hold [`EMPTY_COLOR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatches {
    codes: [i64; MAX_SWATCHES],
    used_count: usize,
}

impl Swatches {
    /// Five empty slots, `used_count == 0`.
    pub const fn empty() -> Self {
        Self {
            codes: [EMPTY_COLOR; MAX_SWATCHES],
            used_count: 0,
        }
    }

    /// All five codes, including trailing [`EMPTY_COLOR`] sentinels.
    pub const fn codes(&self) -> &[i64; MAX_SWATCHES] {
        &self.codes
    }

    pub const fn used_count(&self) -> usize {
        self.used_count
    }

    /// The used colours only, in order.
    pub fn colors(&self) -> Vec<Color> {
        self.codes[..self.used_count]
            .iter()
            .filter_map(|&code| u32::try_from(code).ok().map(Color::new))
            .collect()
    }
}

impl Default for Swatches {
    fn default() -> Self {
        Self::empty()
    }
}

/// Encode up to five colours into the fixed slot layout.
///
/// Slot `i` holds the decimal code of `swatches[i]`; the rest are `None`.
///
/// # Errors
/// Returns [`HistoryError::TooManySwatches`] if more than five colours are given.
pub fn encode(swatches: &[Color]) -> Result<Slots> {
    if swatches.len() > MAX_SWATCHES {
        return Err(HistoryError::TooManySwatches(swatches.len()));
    }
    Ok(std::array::from_fn(|i| {
        swatches.get(i).map(|c| c.argb().to_string())
    }))
}

/// Decode the fixed slot layout back into [`Swatches`].
///
/// Scanning stops at the first `None`: it marks the end of the used colours
/// and every later slot is treated as unused, whatever it contains.
///
/// # Errors
/// Returns [`HistoryError::CorruptSwatch`] if a used slot is not a colour code.
pub fn decode(slots: &Slots) -> Result<Swatches> {
    let mut out = Swatches::empty();
    for (slot, value) in slots.iter().enumerate() {
        let Some(value) = value else {
            break;
        };
        let argb: u32 = value
            .trim()
            .parse()
            .map_err(|_| HistoryError::CorruptSwatch {
                slot,
                value: value.clone(),
            })?;
        out.codes[slot] = Color::new(argb).code();
        out.used_count = slot + 1;
    }
    Ok(out)
}
