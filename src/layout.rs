use serde::{Deserialize, Serialize};

/// Axis-aligned box in page coordinates; y grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
}

impl BBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(default)]
    pub bbox: BBox,
    #[serde(default)]
    pub spans: Vec<TextSpan>,
}

impl Line {
    #[cfg(test)]
    pub fn new(bbox: BBox, text: &str) -> Self {
        Self {
            bbox,
            spans: vec![TextSpan {
                text: text.to_string(),
            }],
        }
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text {
        #[serde(default)]
        lines: Vec<Line>,
    },
    Image {
        #[serde(default)]
        bbox: BBox,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: usize,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl PageLayout {
    pub fn empty(page_number: usize) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }

    pub fn text_block_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, Block::Text { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub pages: Vec<PageLayout>,
}
