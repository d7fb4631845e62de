use crate::config::LayoutConfig;
use crate::text_metrics;

const ELLIPSIS: char = '…';

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Calibrated per-character widths for a Verdana-like sans face.
    match ch {
        ' ' => 0.352,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 0.364,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.454,
        '<' | '>' | '=' | '+' | '~' => 0.818,
        '_' => 0.636,
        '*' => 0.636,
        '&' => 0.705,
        '@' | '#' | '%' => 0.818,
        'I' => 0.421,
        'J' => 0.454,
        'M' => 0.843,
        'W' => 0.989,
        'A'..='Z' => 0.684,
        'f' | 't' => 0.352,
        'i' | 'j' | 'l' => 0.274,
        'm' => 0.973,
        'r' => 0.427,
        'w' => 0.818,
        'a'..='z' => 0.601,
        '0'..='9' => 0.636,
        _ => 0.636,
    }
}

pub(super) fn text_width(text: &str, config: &LayoutConfig) -> f32 {
    if config.fast_text_metrics && text.is_ascii() {
        return fallback_text_width(text, config.font_size);
    }
    text_metrics::measure_text_width(text, config.font_size, &config.font_family)
        .unwrap_or_else(|| fallback_text_width(text, config.font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
/// Returns the text and its measured width.
pub(super) fn fit_text(text: &str, max_width: f32, config: &LayoutConfig) -> (String, f32) {
    let width = text_width(text, config);
    if width <= max_width {
        return (text.to_string(), width);
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let mut candidate: String = chars.iter().collect();
        candidate.push(ELLIPSIS);
        let width = text_width(&candidate, config);
        if width <= max_width {
            return (candidate, width);
        }
    }
    let lone = ELLIPSIS.to_string();
    let width = text_width(&lone, config);
    (lone, width.min(max_width))
}
