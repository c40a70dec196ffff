//! # Shelf Location Formatting
//!
//! Converts the structured shelf-location fields returned by the price
//! integrity system into the string shown on a product card, and extracts
//! aisle / bay / side back out of such a string.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Raw fields                          Display                            │
//! │  ─────────────────────────────       ─────────────────────────────────  │
//! │  aisle "10", bay "L3", shelf "2" ──► "Aisle 10, Left bay 3, shelf 2"    │
//! │  aisle "4",  bay "17", shelf ""  ──► "Aisle 4, Bay 17"                  │
//! │  aisle "",   bay "R12", shelf "1"──► "Right bay 12, shelf 1"            │
//! │                                                                         │
//! │  Bay tokens matching ^[LR]\d+$ carry the side in their first letter.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`parse`] is deliberately forgiving and is NOT a guaranteed inverse of
//! [`format`]: it needs aisle, bay and side to all be present, so a location
//! without a side-encoded bay formats fine but does not parse back.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::wire::lenient;

static SIDE_BAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([LR])(\d+)$").expect("Invalid regex"));
static AISLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Aisle\s*(\d+)").expect("Invalid regex"));
static BAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bay\s*(\d+)").expect("Invalid regex"));
static SIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Left|Right)").expect("Invalid regex"));

// =============================================================================
// Types
// =============================================================================

/// Which side of the aisle a bay is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BaySide {
    Left,
    Right,
}

impl BaySide {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "L" | "Left" => Some(BaySide::Left),
            "R" | "Right" => Some(BaySide::Right),
            _ => None,
        }
    }

    /// Single-letter token used in raw bay numbers.
    pub fn token(&self) -> &'static str {
        match self {
            BaySide::Left => "L",
            BaySide::Right => "R",
        }
    }
}

impl fmt::Display for BaySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaySide::Left => write!(f, "Left"),
            BaySide::Right => write!(f, "Right"),
        }
    }
}

/// Structured location as delivered by the price integrity space block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    #[serde(default, deserialize_with = "lenient::string")]
    pub aisle: Option<String>,

    /// Either a plain bay number (`"17"`) or a side-encoded one (`"L3"`).
    #[serde(default, deserialize_with = "lenient::string")]
    pub bay_number: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub shelf_number: Option<String>,
}

impl RawLocation {
    pub fn new(
        aisle: impl Into<String>,
        bay_number: impl Into<String>,
        shelf_number: Option<String>,
    ) -> Self {
        RawLocation {
            aisle: Some(aisle.into()),
            bay_number: Some(bay_number.into()),
            shelf_number,
        }
    }
}

impl From<&ParsedLocation> for RawLocation {
    fn from(parsed: &ParsedLocation) -> Self {
        RawLocation {
            aisle: Some(parsed.aisle.clone()),
            bay_number: Some(format!("{}{}", parsed.side.token(), parsed.bay)),
            shelf_number: None,
        }
    }
}

/// Location fields recovered from a display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParsedLocation {
    pub aisle: String,
    pub bay: String,
    pub side: BaySide,
}

// =============================================================================
// Format / Parse
// =============================================================================

/// Formats a raw location for display.
///
/// Missing or blank fields are left out; an entirely empty location formats
/// to an empty string.
///
/// ## Example
/// ```rust
/// use stockscan_core::location::{format, RawLocation};
///
/// let raw = RawLocation::new("10", "L3", Some("2".to_string()));
/// assert_eq!(format(&raw), "Aisle 10, Left bay 3, shelf 2");
/// ```
pub fn format(raw: &RawLocation) -> String {
    let mut parts = Vec::with_capacity(3);

    if let Some(aisle) = non_blank(&raw.aisle) {
        parts.push(format!("Aisle {aisle}"));
    }

    if let Some(bay) = non_blank(&raw.bay_number) {
        match split_side_bay(bay) {
            Some((side, number)) => parts.push(format!("{side} bay {number}")),
            None => parts.push(format!("Bay {bay}")),
        }
    }

    if let Some(shelf) = non_blank(&raw.shelf_number) {
        parts.push(format!("shelf {shelf}"));
    }

    parts.join(", ")
}

/// Extracts aisle, bay and side from a display string.
///
/// Returns `None` unless all three are present.
///
/// ## Example
/// ```rust
/// use stockscan_core::location::parse;
///
/// assert!(parse("Aisle 12, Left bay 3").is_some());
/// assert!(parse("Aisle 12").is_none());
/// ```
pub fn parse(display: &str) -> Option<ParsedLocation> {
    let aisle = AISLE_RE.captures(display)?.get(1)?.as_str();
    let bay = BAY_RE.captures(display)?.get(1)?.as_str();
    let side = SIDE_RE.captures(display)?.get(1)?.as_str();

    Some(ParsedLocation {
        aisle: aisle.to_string(),
        bay: bay.to_string(),
        side: BaySide::from_token(side)?,
    })
}

fn split_side_bay(bay: &str) -> Option<(BaySide, &str)> {
    let caps = SIDE_BAY_RE.captures(bay)?;
    let side = BaySide::from_token(caps.get(1)?.as_str())?;
    Some((side, caps.get(2)?.as_str()))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
