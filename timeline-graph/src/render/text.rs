use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::core::NodePayload;
use crate::layout::TimelineGraph;

/// Display width of a string in terminal cells
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Truncate to fit `max_width` cells without splitting graphemes, marking the
/// cut with an ellipsis
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut result = String::new();
    let mut width = 0;

    for grapheme in text.graphemes(true) {
        let grapheme_width = UnicodeWidthStr::width(grapheme);
        if width + grapheme_width > budget {
            break;
        }
        result.push_str(grapheme);
        width += grapheme_width;
    }

    result.push('…');
    result
}

/// Plain-text rendering of a laid out timeline, one section per column
pub struct TextRenderer {
    width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { width: 80 }
    }
}

impl TextRenderer {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn render(&self, graph: &TimelineGraph) -> String {
        let mut output = String::new();

        for node in &graph.nodes {
            match &node.payload {
                NodePayload::DateLabel { label, commit_count, .. } => {
                    if !output.is_empty() {
                        output.push('\n');
                    }
                    let noun = if *commit_count == 1 { "commit" } else { "commits" };
                    output.push_str(&format!("{} · {} {}\n", label, commit_count, noun));
                }
                NodePayload::Commit { commit, .. } => {
                    let marker = if commit.is_head { '*' } else { 'o' };
                    let mut decorations = String::new();
                    if let Some(branch) = commit.primary_branch() {
                        decorations.push_str(&format!(" ({})", branch));
                    }
                    if commit.has_stash {
                        decorations.push_str(" [stash]");
                    }
                    if commit.has_notes {
                        decorations.push_str(" [notes]");
                    }

                    let prefix = format!("  {} {} ", marker, commit.short_sha);
                    let room = self
                        .width
                        .saturating_sub(display_width(&prefix) + display_width(&decorations));
                    let summary = truncate_to_width(commit.summary(), room);

                    output.push_str(&prefix);
                    output.push_str(&summary);
                    output.push_str(&decorations);
                    output.push('\n');
                }
            }
        }

        if output.is_empty() {
            output.push_str("No commits\n");
        }

        output
    }
}
