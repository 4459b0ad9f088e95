use crate::diagram::{AttributeRow, DiagramNode, kind_caption};
use crate::graph::ObjectKind;
use unicode_width::UnicodeWidthStr;

pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 4.0,
            min_node_width: 120.0,
            min_node_height: 60.0,
        }
    }
}

/// Text of one table row: `name: type  [markers]`.
pub fn row_text(row: &AttributeRow) -> String {
    if row.markers.is_empty() {
        format!("{}: {}", row.name, row.data_type)
    } else {
        format!("{}: {}  [{}]", row.name, row.data_type, row.markers.join(", "))
    }
}

/// Body lines drawn under a node's header.
pub fn body_lines(node: &DiagramNode) -> Vec<String> {
    match node.category {
        ObjectKind::Table => node.attributes.iter().map(row_text).collect(),
        kind => vec![kind_caption(kind).to_string()],
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn header_height(&self) -> f64 {
        self.line_height + self.header_padding * 2.0
    }

    pub fn node_size(&self, label: &str, lines: &[String]) -> (f64, f64) {
        let header_width = self.text_width(label);

        let max_line_width = lines
            .iter()
            .map(|line| self.text_width(line))
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_line_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_node_width);

        let body_height = if lines.is_empty() {
            0.0
        } else {
            lines.len() as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (self.header_height() + body_height).max(self.min_node_height);

        (width, height)
    }
}
