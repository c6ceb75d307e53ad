// 🧺 Equipment Labels - parse and categorize machine labels
//
// Portal labels follow a fixed convention: "【12上】洗衣機 大容量"
//   12      → machine number
//   上 / 下 → upper or lower unit of a stacked pair (optional)
//   rest    → free-text machine type
//
// Neither function fails: unexpected labels degrade to a fallback value.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// LABEL CONVENTION
// ============================================================================

pub const UPPER_GLYPH: &str = "上";
pub const LOWER_GLYPH: &str = "下";

/// Category markers, checked in this order
pub const WASH_MARKER: &str = "洗";
pub const MEDIUM_MARKER: &str = "中";
pub const LARGE_MARKER: &str = "大";
pub const DRYER_MARKER: &str = "烘衣";
pub const MONEY_CHANGER_MARKER: &str = "儲值 / 兌幣機";
pub const VENDING_MACHINE_MARKER: &str = "販賣機";

lazy_static! {
    static ref LABEL_RE: Regex = Regex::new(&format!(
        r"^【(\d+)({}|{})?】(.+)",
        regex::escape(UPPER_GLYPH),
        regex::escape(LOWER_GLYPH)
    ))
    .unwrap();
}

// ============================================================================
// SIDE INDICATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideIndicator {
    Up,
    Down,
    Unset,
}

impl SideIndicator {
    fn from_glyph(glyph: Option<&str>) -> Self {
        match glyph {
            Some(UPPER_GLYPH) => SideIndicator::Up,
            Some(LOWER_GLYPH) => SideIndicator::Down,
            _ => SideIndicator::Unset,
        }
    }

    /// Column value for `Equipment_Location`; `None` when unset
    pub fn as_column(&self) -> Option<&'static str> {
        match self {
            SideIndicator::Up => Some("Up"),
            SideIndicator::Down => Some("Down"),
            SideIndicator::Unset => None,
        }
    }

    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some("Up") => SideIndicator::Up,
            Some("Down") => SideIndicator::Down,
            _ => SideIndicator::Unset,
        }
    }
}

// ============================================================================
// LABEL PARSER
// ============================================================================

/// Outcome of parsing a label: either the convention matched or the whole
/// label is kept as free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedLabel {
    Matched {
        id: String,
        side: SideIndicator,
        type_text: String,
    },
    Fallback {
        type_text: String,
    },
}

impl ParsedLabel {
    pub fn id(&self) -> Option<&str> {
        match self {
            ParsedLabel::Matched { id, .. } => Some(id),
            ParsedLabel::Fallback { .. } => None,
        }
    }

    pub fn side(&self) -> SideIndicator {
        match self {
            ParsedLabel::Matched { side, .. } => *side,
            ParsedLabel::Fallback { .. } => SideIndicator::Unset,
        }
    }

    pub fn type_text(&self) -> &str {
        match self {
            ParsedLabel::Matched { type_text, .. } | ParsedLabel::Fallback { type_text } => {
                type_text
            }
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, ParsedLabel::Matched { .. })
    }
}

/// Split a raw label into machine number, side and type text
pub fn parse_equipment_label(raw: &str) -> ParsedLabel {
    match LABEL_RE.captures(raw) {
        Some(caps) => ParsedLabel::Matched {
            id: caps[1].to_string(),
            side: SideIndicator::from_glyph(caps.get(2).map(|m| m.as_str())),
            type_text: caps[3].to_string(),
        },
        None => ParsedLabel::Fallback {
            type_text: raw.to_string(),
        },
    }
}

// ============================================================================
// CATEGORIZER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentCategory {
    Wash,
    Dry,
    MoneyChanger,
    VendingMachine,
    Other,
}

impl EquipmentCategory {
    /// Column value for `Equipment_Category`
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCategory::Wash => "wash",
            EquipmentCategory::Dry => "dry",
            EquipmentCategory::MoneyChanger => "money changer",
            EquipmentCategory::VendingMachine => "vending machine",
            EquipmentCategory::Other => "others",
        }
    }

    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "wash" => EquipmentCategory::Wash,
            "dry" => EquipmentCategory::Dry,
            "money changer" => EquipmentCategory::MoneyChanger,
            "vending machine" => EquipmentCategory::VendingMachine,
            _ => EquipmentCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    Medium,
    Large,
    Unset,
}

impl Scale {
    /// Column value for `Wash_Scale`; `None` when unset
    pub fn as_column(&self) -> Option<&'static str> {
        match self {
            Scale::Medium => Some("medium"),
            Scale::Large => Some("large"),
            Scale::Unset => None,
        }
    }

    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some("medium") => Scale::Medium,
            Some("large") => Scale::Large,
            _ => Scale::Unset,
        }
    }
}

/// Map a type text to a coarse category and, for washers, a size
///
/// First matching marker wins. Dryers on site are all large units.
pub fn categorize_equipment(type_text: &str) -> (EquipmentCategory, Scale) {
    if type_text.contains(WASH_MARKER) {
        let scale = if type_text.contains(MEDIUM_MARKER) {
            Scale::Medium
        } else if type_text.contains(LARGE_MARKER) {
            Scale::Large
        } else {
            Scale::Unset
        };
        (EquipmentCategory::Wash, scale)
    } else if type_text.contains(DRYER_MARKER) {
        (EquipmentCategory::Dry, Scale::Large)
    } else if type_text.contains(MONEY_CHANGER_MARKER) {
        (EquipmentCategory::MoneyChanger, Scale::Unset)
    } else if type_text.contains(VENDING_MACHINE_MARKER) {
        (EquipmentCategory::VendingMachine, Scale::Unset)
    } else {
        (EquipmentCategory::Other, Scale::Unset)
    }
}

// ============================================================================
// TESTS
// ============================================================================
