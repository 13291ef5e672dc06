// Document domain models.
//
// Two halves live here:
// - the mutation requests we send (insert text, style a range, bullets, ...)
// - the structural tree we read back from the documents API
//
// Both mirror the remote JSON schema closely, since serde does the mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// HANDLES & OFFSETS
// ============================================================================

/// Opaque document identifier assigned by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Link to open the document in a browser.
    pub fn edit_url(&self) -> String {
        format!("https://docs.google.com/document/d/{}/edit", self.0)
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based offset into a document's content stream. `Cursor::START` sits
/// before the first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(u32);

impl Cursor {
    pub const START: Cursor = Cursor(1);

    pub fn at(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn advanced_by(self, units: u32) -> Self {
        Self(self.0 + units)
    }
}

/// Length of `text` in the remote service's offset units (UTF-16 code units).
pub fn doc_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: u32,
}

impl From<Cursor> for Location {
    fn from(cursor: Cursor) -> Self {
        Self {
            index: cursor.index(),
        }
    }
}

/// Insertion point at the end of a segment. An empty id means the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfSegmentLocation {
    pub segment_id: String,
}

/// Half-open range `[start_index, end_index)`. Never validated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: u32,
    pub end_index: u32,
}

impl Range {
    pub fn new(start: Cursor, end: Cursor) -> Self {
        Self {
            start_index: start.index(),
            end_index: end.index(),
        }
    }
}

// ============================================================================
// TEXT STYLE
// ============================================================================

/// The style keys we know how to send. Each maps to exactly one entry of the
/// `fields` mask on an `updateTextStyle` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleKey {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    SmallCaps,
    FontSize,
    ForegroundColor,
    BackgroundColor,
    FontFamily,
    Link,
}

impl StyleKey {
    /// Name of the key in the remote schema.
    pub fn field_name(self) -> &'static str {
        match self {
            StyleKey::Bold => "bold",
            StyleKey::Italic => "italic",
            StyleKey::Underline => "underline",
            StyleKey::Strikethrough => "strikethrough",
            StyleKey::SmallCaps => "smallCaps",
            StyleKey::FontSize => "fontSize",
            StyleKey::ForegroundColor => "foregroundColor",
            StyleKey::BackgroundColor => "backgroundColor",
            StyleKey::FontFamily => "weightedFontFamily",
            StyleKey::Link => "link",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RgbColor {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

impl RgbColor {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_color: Option<RgbColor>,
}

/// A color that may be explicitly "transparent" (no inner color).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalColor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl From<RgbColor> for OptionalColor {
    fn from(rgb: RgbColor) -> Self {
        Self {
            color: Some(Color {
                rgb_color: Some(rgb),
            }),
        }
    }
}

/// A magnitude with its unit. The documents API only uses points (`PT`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    #[serde(default)]
    pub magnitude: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedFontFamily {
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Character-level formatting. Only the keys that are set get sent, and the
/// same set becomes the request's field mask (see [`TextStyle::keys`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_caps: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<OptionalColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<OptionalColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_font_family: Option<WeightedFontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, on: bool) -> Self {
        self.bold = Some(on);
        self
    }

    pub fn foreground(mut self, rgb: RgbColor) -> Self {
        self.foreground_color = Some(rgb.into());
        self
    }

    /// Keys that carry a value, in declaration order.
    pub fn keys(&self) -> Vec<StyleKey> {
        let present = [
            (StyleKey::Bold, self.bold.is_some()),
            (StyleKey::Italic, self.italic.is_some()),
            (StyleKey::Underline, self.underline.is_some()),
            (StyleKey::Strikethrough, self.strikethrough.is_some()),
            (StyleKey::SmallCaps, self.small_caps.is_some()),
            (StyleKey::FontSize, self.font_size.is_some()),
            (StyleKey::ForegroundColor, self.foreground_color.is_some()),
            (StyleKey::BackgroundColor, self.background_color.is_some()),
            (StyleKey::FontFamily, self.weighted_font_family.is_some()),
            (StyleKey::Link, self.link.is_some()),
        ];

        present
            .into_iter()
            .filter_map(|(key, set)| set.then_some(key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Comma-separated field mask for exactly the keys that are set.
    pub fn field_mask(&self) -> String {
        self.keys()
            .iter()
            .map(|k| k.field_name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// PARAGRAPH STYLE
// ============================================================================

/// Heading level 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    pub fn named_style(self) -> String {
        format!("HEADING_{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_style_type: Option<String>,
}

/// Glyph presets for `createParagraphBullets`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulletPreset {
    #[default]
    BulletDiscCircleSquare,
    BulletDiamondxArrow3dSquare,
    BulletCheckbox,
    NumberedDecimalAlphaRoman,
}

impl std::str::FromStr for BulletPreset {
    type Err = String;

    /// Accepts the wire names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BULLET_DISC_CIRCLE_SQUARE" => Ok(Self::BulletDiscCircleSquare),
            "BULLET_DIAMONDX_ARROW3D_SQUARE" => Ok(Self::BulletDiamondxArrow3dSquare),
            "BULLET_CHECKBOX" => Ok(Self::BulletCheckbox),
            "NUMBERED_DECIMAL_ALPHA_ROMAN" => Ok(Self::NumberedDecimalAlphaRoman),
            other => Err(format!("unknown bullet preset '{}'", other)),
        }
    }
}

// ============================================================================
// MUTATION REQUESTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_of_segment_location: Option<EndOfSegmentLocation>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyleRequest {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParagraphStyleRequest {
    pub range: Range,
    pub paragraph_style: ParagraphStyle,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTableRequest {
    pub location: Location,
    pub rows: u32,
    pub columns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParagraphBulletsRequest {
    pub range: Range,
    pub bullet_preset: BulletPreset,
}

/// One low-level operation inside a batch. Serializes as
/// `{"insertText": {...}}`, `{"updateTextStyle": {...}}`, and so on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocRequest {
    InsertText(InsertTextRequest),
    UpdateTextStyle(UpdateTextStyleRequest),
    UpdateParagraphStyle(UpdateParagraphStyleRequest),
    InsertTable(InsertTableRequest),
    CreateParagraphBullets(CreateParagraphBulletsRequest),
}

/// Reply to a successful `batchUpdate`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

// ============================================================================
// DOCUMENT TREE (read side)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: DocumentHandle,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<Body>,
}

impl Document {
    /// End offset of the last structural element, if the body has any.
    pub fn end_index(&self) -> Option<u32> {
        self.body
            .as_ref()
            .and_then(|body| body.content.last())
            .and_then(|element| element.end_index)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    pub start_index: Option<u32>,
    pub end_index: Option<u32>,
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: Option<ParagraphStyle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub content: Option<String>,
    pub text_style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}
