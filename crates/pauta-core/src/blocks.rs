use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// `12. Text`: a number with a dot, then the item text.
static NUMBERED_WITH_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\s*(.*)").expect("hardcoded numbered-line regex is valid")
});

/// `12` or `12.` alone on its line.
static NUMBER_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.?$").expect("hardcoded bare-number regex is valid")
});

/// A numbered agenda entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub id: u64,
    pub text: String,
}

impl Block {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Block {
            id,
            text: text.into(),
        }
    }
}

/// What a single trimmed line means to the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    NumberedWithText { id: u64, text: &'a str },
    NumberOnly { id: u64 },
    Continuation(&'a str),
    Blank,
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }

    if let Some(caps) = NUMBER_ONLY.captures(line) {
        if let Ok(id) = caps[1].parse::<u64>() {
            return LineKind::NumberOnly { id };
        }
    } else if let Some(caps) = NUMBERED_WITH_TEXT.captures(line) {
        if let (Ok(id), Some(text)) = (caps[1].parse::<u64>(), caps.get(2)) {
            return LineKind::NumberedWithText {
                id,
                text: text.as_str().trim(),
            };
        }
    }

    LineKind::Continuation(line)
}

#[derive(Debug)]
enum State {
    NoActiveBlock,
    InBlock { id: u64, buffer: Vec<String> },
}

/// Line-by-line state machine that cuts text into numbered blocks.
#[derive(Debug)]
pub struct Segmenter {
    state: State,
    blocks: Vec<Block>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    pub fn new() -> Self {
        Segmenter {
            state: State::NoActiveBlock,
            blocks: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        match classify_line(line) {
            LineKind::NumberedWithText { id, text } => self.start(id, Some(text)),
            LineKind::NumberOnly { id } => self.start(id, None),
            LineKind::Continuation(text) => {
                // Text before the first number has no block to join.
                if let State::InBlock { buffer, .. } = &mut self.state {
                    buffer.push(text.to_string());
                }
            }
            LineKind::Blank => {}
        }
    }

    fn start(&mut self, id: u64, text: Option<&str>) {
        self.finalize();
        let buffer = text.map(|t| vec![t.to_string()]).unwrap_or_default();
        self.state = State::InBlock { id, buffer };
    }

    fn finalize(&mut self) {
        if let State::InBlock { id, buffer } =
            std::mem::replace(&mut self.state, State::NoActiveBlock)
        {
            let text = buffer.join(" ").trim().to_string();
            if text.is_empty() {
                tracing::debug!(id, "dropping block without text");
            } else {
                self.blocks.push(Block { id, text });
            }
        }
    }

    pub fn finish(mut self) -> Vec<Block> {
        self.finalize();
        self.blocks
    }
}

/// Segment already-concatenated text into blocks.
pub fn segment_text(text: &str) -> Vec<Block> {
    let mut segmenter = Segmenter::new();
    for line in text.lines() {
        segmenter.push_line(line);
    }
    segmenter.finish()
}

/// Join page texts in order, newline-separated.
///
/// Pages without text are skipped. The first page containing `stop_marker`
/// ends the scan and contributes nothing itself.
pub fn collect_pages(pages: &[Option<String>], stop_marker: Option<&str>) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        let Some(text) = page.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        if let Some(marker) = stop_marker.filter(|m| !m.is_empty()) {
            if text.contains(marker) {
                tracing::debug!(
                    page = i + 1,
                    marker,
                    "stop marker found, ignoring remaining pages"
                );
                break;
            }
        }
        out.push('\n');
        out.push_str(text);
    }
    out
}

/// Segment per-page text into numbered blocks.
pub fn segment_pages(pages: &[Option<String>], stop_marker: Option<&str>) -> Vec<Block> {
    let blocks = segment_text(&collect_pages(pages, stop_marker));
    tracing::info!(pages = pages.len(), blocks = blocks.len(), "text segmented");
    blocks
}
