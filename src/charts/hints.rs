use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::interface::TextGenerator;

/// Chart fields as submitted by the form; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartParameters {
    pub chart_type: Option<String>,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
}

impl ChartParameters {
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.chart_type.is_none() {
            missing.push("chart_type");
        }
        if self.x_column.is_none() {
            missing.push("x_column");
        }
        if self.y_column.is_none() {
            missing.push("y_column");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Take values from `hints` only where this side has none.
    pub fn fill_from(&mut self, hints: ChartParameters) {
        self.chart_type = self.chart_type.take().or(hints.chart_type);
        self.x_column = self.x_column.take().or(hints.x_column);
        self.y_column = self.y_column.take().or(hints.y_column);
    }
}

static HINT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(chart_type|x_column|y_column)\s*[:=]").expect("hint key pattern"));

/// Pull `chart_type: ...`, `x_column: ...` and `y_column: ...` pairs out of
/// generated text. A value runs until the next key or a `,`, `;` or line
/// break. The first occurrence of each key wins.
pub fn parse_hints(text: &str) -> ChartParameters {
    let keys: Vec<(String, usize, usize)> = HINT_KEY
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps[1].to_lowercase(), whole.start(), whole.end()))
        })
        .collect();

    let mut hints = ChartParameters::default();
    for (i, (key, _, value_start)) in keys.iter().enumerate() {
        let value_end = keys.get(i + 1).map(|(_, start, _)| *start).unwrap_or(text.len());
        let value = match hint_value(&text[*value_start..value_end]) {
            Some(value) => value,
            None => continue,
        };
        let slot = match key.as_str() {
            "chart_type" => &mut hints.chart_type,
            "x_column" => &mut hints.x_column,
            _ => &mut hints.y_column,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    hints
}

fn hint_value(raw: &str) -> Option<String> {
    let value = raw
        .trim_start()
        .split(|c: char| matches!(c, ',' | ';' | '\r' | '\n'))
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// The answer format is described in words so an echoed prompt carries no
/// `key: value` pairs of its own.
pub fn hint_prompt(description: &str, columns: &[String]) -> String {
    format!(
        "Pick a chart for this request. Available columns: {}. \
         Chart types: bar, line, scatter, pie, histogram. \
         Reply with the words chart_type, x_column and y_column, each followed by a colon and its value.\n\
         Request: {}\n",
        columns.join(", "),
        description.trim()
    )
}

/// Fill the absent fields of `params` from a free-text description.
///
/// The generator is only asked when a description is given and something is
/// missing. A failed generation leaves `params` untouched.
pub async fn infer_missing(
    mut params: ChartParameters,
    description: Option<&str>,
    columns: &[String],
    generator: &dyn TextGenerator,
) -> ChartParameters {
    let description = match description.map(str::trim) {
        Some(d) if !d.is_empty() => d,
        _ => return params,
    };
    if params.is_complete() {
        return params;
    }

    let prompt = hint_prompt(description, columns);
    match generator.generate(&prompt).await {
        Ok(generated) => {
            // text-generation models return the prompt ahead of their answer
            let answer = generated.strip_prefix(prompt.as_str()).unwrap_or(&generated);
            let hints = parse_hints(answer);
            debug!("Description hints: {:?}", hints);
            params.fill_from(hints);
        }
        Err(e) => warn!("Could not infer chart parameters from description: {:#}", e),
    }
    params
}
