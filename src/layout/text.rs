use crate::config::LayoutConfig;
use crate::text_metrics;

use super::TextBlock;

const ELLIPSIS: &str = "...";

/// Measures a node's text: the bold state id followed by its label lines.
/// `lines` only holds the label lines; the id is implied.
pub(super) fn measure_node_text(
    title: &str,
    label: Option<&str>,
    config: &LayoutConfig,
    font_family: &str,
) -> TextBlock {
    let lines: Vec<String> = label
        .map(split_lines)
        .unwrap_or_default()
        .into_iter()
        .filter(|line| !line.is_empty())
        .map(|line| truncate_line(&line, config.max_label_width_chars))
        .collect();

    let fast = config.fast_text_metrics;
    let mut width = text_width(title, config.font_size, font_family, fast, true);
    for line in &lines {
        width = width.max(text_width(line, config.font_size, font_family, fast, false));
    }
    let width = width.max(config.min_text_width);
    let height = (1 + lines.len()) as f32 * config.line_height;

    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    text.replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

pub(super) fn truncate_line(line: &str, max_chars: usize) -> String {
    let count = line.chars().count();
    if count <= max_chars || max_chars <= ELLIPSIS.len() {
        return line.to_string();
    }
    let keep: String = line.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{keep}{ELLIPSIS}")
}

/// Joins grouped symbols for an edge label, collapsing long lists.
pub(super) fn symbols_label(symbols: &[String], max_symbols: usize) -> String {
    if symbols.len() <= max_symbols || max_symbols == 0 {
        return symbols.join(",");
    }
    let shown = max_symbols.saturating_sub(1).max(1);
    format!(
        "{} +{} more",
        symbols[..shown].join(","),
        symbols.len() - shown
    )
}

pub(super) fn text_width(
    text: &str,
    font_size: f32,
    font_family: &str,
    fast_metrics: bool,
    bold: bool,
) -> f32 {
    if fast_metrics && text.is_ascii() {
        return fallback_text_width(text, font_size, bold);
    }
    text_metrics::measure_text_width(text, font_size, font_family, bold)
        .unwrap_or_else(|| fallback_text_width(text, font_size, bold))
}

fn fallback_text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let width = text.chars().map(char_width_factor).sum::<f32>() * font_size;
    if bold { width * 1.06 } else { width }
}

/// Advance widths in ems for a typical sans-serif face.
pub(super) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        '\'' | '`' => 0.2,
        '+' | '=' | '<' | '>' | '~' => 0.6,
        '-' | '_' => 0.45,
        'A' | 'X' | 'V' | 'K' | 'B' => 0.65,
        'C' | 'D' | 'U' | 'N' => 0.74,
        'E' | 'P' | 'R' | 'S' | 'T' | 'Y' | 'Z' => 0.61,
        'F' | 'L' => 0.57,
        'G' | 'H' | 'O' | 'Q' => 0.75,
        'I' => 0.272,
        'J' => 0.557,
        'M' => 0.903,
        'W' => 0.958,
        'a' | 'c' | 'e' | 'z' | 'x' | 'v' => 0.55,
        'b' | 'd' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' | 'y' => 0.59,
        'f' | 't' => 0.32,
        'i' | 'j' | 'l' => 0.235,
        'k' | 's' => 0.52,
        'm' => 0.867,
        'r' => 0.364,
        'w' => 0.811,
        '1' => 0.396,
        '0'..='9' => 0.6,
        '@' | '#' | '%' | '&' => 0.946,
        'ε' | 'λ' | 'δ' => 0.55,
        '·' => 0.3,
        '…' | '→' => 1.0,
        _ => 0.568,
    }
}
