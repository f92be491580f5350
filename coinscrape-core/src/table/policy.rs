//! Cell-resolution policy for [`extract_table`](super::extract_table).
//!
//! The listing and history tables differ only in how headers are named, which
//! attributes carry numbers, and whether cells wrap their value in a link. A
//! policy captures exactly those differences as plain data.

/// How column names are derived from header cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderNaming {
    /// Read an attribute of the header cell and drop its first `strip_chars`
    /// characters. Cells without the attribute use `fallback` (before
    /// stripping).
    Attribute {
        name: String,
        strip_chars: usize,
        fallback: String,
    },
    /// Rendered header text, lower-cased, with all whitespace removed.
    NormalizedText,
}

/// Where each body row keeps its stable entity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey {
    pub attribute: String,
    /// Literal prefix removed from the attribute value when present.
    pub strip_prefix: String,
}

/// Extraction policy: a tagged configuration, one value per table shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractPolicy {
    /// CSS selector locating the table. The first match is used.
    pub table: String,
    pub headers: HeaderNaming,
    /// When set, every body row must carry this attribute.
    pub row_key: Option<RowKey>,
    /// Attributes checked in order; the first present, non-empty one is
    /// parsed as a number and overrides the rendered text.
    pub numeric_attributes: Vec<String>,
    /// Resolve against the first `<a>` inside the cell when there is one.
    pub unwrap_link: bool,
    /// First-cell text marking a table that deliberately has no data.
    pub empty_marker: Option<String>,
}

impl ExtractPolicy {
    /// Policy for the table matched by `selector`, headers from rendered text,
    /// no numeric overrides.
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            table: selector.into(),
            headers: HeaderNaming::NormalizedText,
            row_key: None,
            numeric_attributes: Vec::new(),
            unwrap_link: false,
            empty_marker: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderNaming) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_row_key(mut self, attribute: &str, strip_prefix: &str) -> Self {
        self.row_key = Some(RowKey {
            attribute: attribute.to_string(),
            strip_prefix: strip_prefix.to_string(),
        });
        self
    }

    pub fn with_numeric_attributes(mut self, attrs: &[&str]) -> Self {
        self.numeric_attributes = attrs.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_link_unwrap(mut self, unwrap: bool) -> Self {
        self.unwrap_link = unwrap;
        self
    }

    pub fn with_empty_marker(mut self, marker: &str) -> Self {
        self.empty_marker = Some(marker.to_string());
        self
    }
}

impl HeaderNaming {
    pub(crate) fn column_name(&self, attr_value: Option<&str>, rendered: &str) -> String {
        match self {
            HeaderNaming::Attribute {
                strip_chars,
                fallback,
                ..
            } => attr_value
                .unwrap_or(fallback)
                .chars()
                .skip(*strip_chars)
                .collect(),
            HeaderNaming::NormalizedText => rendered
                .chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect(),
        }
    }
}
