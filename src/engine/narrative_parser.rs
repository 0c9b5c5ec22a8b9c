use log::warn;
use thiserror::Error;

use crate::model::story_node::StoryNode;

/// Most choices a single beat can offer.
pub const MAX_CHOICES: usize = 3;

const CHOICES_HEADER: &str = "Choices:";
const PLOT_LABEL: &str = "Plot";
const IMAGE_LABEL: &str = "Image";
const CHOICE_MARKERS: [&str; 3] = ["1.", "2.", "3."];
const CHOICE_TOKEN: &str = "Choice ";
const CHOICE_TOKEN_MIN_LEN: usize = 10;
// Longest first so "[Conclusion]" wins over "Conclusion".
const ENDING_LABELS: [&str; 4] = ["[Conclusion]", "Conclusion", "Ending", "End"];

/// The reply did not follow the plot/choices labelling convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("the model returned an empty reply")]
    Empty,
    #[error("no line labelled \"Plot\" in the reply")]
    MissingPlot,
    #[error("the reply has a plot but no choices")]
    MissingChoices,
}

/// Turn one assistant reply into a story beat.
///
/// `expect_ending` is set when the last user message asked for a
/// conclusion; the result is then always an ending node.
pub fn parse_story_node(raw: &str, expect_ending: bool) -> Result<StoryNode, ParseError> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && unbold(line).trim_end_matches('*') != CHOICES_HEADER)
        .collect();

    if lines.is_empty() {
        return Err(ParseError::Empty);
    }

    let plot_idx = lines.iter().position(|l| has_label(l, PLOT_LABEL));
    let plot = plot_idx.and_then(|i| plot_text(&lines, i));
    // "Plot:" alone on its line means the story sits on the next one.
    let plot_next = plot_idx
        .filter(|&i| plot.is_some() && after_label(lines[i], PLOT_LABEL.len()).is_empty())
        .map(|i| i + 1);

    let image_idx = lines
        .iter()
        .position(|l| has_label(l, IMAGE_LABEL) && is_url(after_label(l, IMAGE_LABEL.len())));
    let image_url = image_idx.map(|i| after_label(lines[i], IMAGE_LABEL.len()).to_string());

    let ending = find_ending(&lines);

    if expect_ending {
        let text = ending
            .map(|(i, first)| conclusion_from(&lines, i, first))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| whole_reply(&lines, &[plot_idx, plot_next, image_idx]));
        let text = if text.is_empty() {
            plot.clone().unwrap_or_default()
        } else {
            text
        };
        return Ok(StoryNode::ending(plot.unwrap_or_default(), text, image_url));
    }

    let choices: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != plot_idx && Some(*i) != image_idx)
        .filter(|(_, l)| is_choice_line(l))
        .map(|(_, l)| l.to_string())
        .collect();

    if choices.len() > MAX_CHOICES {
        warn!(
            "reply offered {} choices, keeping the first {MAX_CHOICES}",
            choices.len()
        );
    }
    let choices: Vec<String> = choices.into_iter().take(MAX_CHOICES).collect();

    if !choices.is_empty() {
        let plot = plot.ok_or(ParseError::MissingPlot)?;
        return Ok(StoryNode::beat(plot, choices, image_url));
    }

    // The model wrapped the story up on its own.
    if let Some((i, first)) = ending {
        let text = conclusion_from(&lines, i, first);
        if !text.is_empty() {
            return Ok(StoryNode::ending(plot.unwrap_or_default(), text, image_url));
        }
    }

    match plot {
        None => Err(ParseError::MissingPlot),
        Some(_) => Err(ParseError::MissingChoices),
    }
}

fn is_choice_line(line: &str) -> bool {
    CHOICE_MARKERS.iter().any(|m| line.contains(m))
        || (line.contains(CHOICE_TOKEN) && line.chars().count() > CHOICE_TOKEN_MIN_LEN)
}

/// `**Plot:**` and `Plot:` read the same.
fn unbold(line: &str) -> &str {
    line.trim_start_matches('*')
}

fn has_label(line: &str, label: &str) -> bool {
    unbold(line)
        .get(..label.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(label))
}

/// Text after a label and its separator, e.g. `Plot: x` -> `x`.
fn after_label(line: &str, label_len: usize) -> &str {
    unbold(line)[label_len..]
        .trim_start_matches(|c: char| matches!(c, ':' | '-' | '*' | ']') || c.is_whitespace())
        .trim()
}

fn plot_text(lines: &[&str], idx: usize) -> Option<String> {
    let text = after_label(lines[idx], PLOT_LABEL.len());
    if !text.is_empty() {
        return Some(text.to_string());
    }

    // "Plot:" on its own line, story on the next one.
    lines
        .get(idx + 1)
        .filter(|next| !is_choice_line(next) && find_ending(&[**next]).is_none())
        .map(|next| next.to_string())
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Index of the first ending-labelled line and the text after its label.
fn find_ending<'a>(lines: &[&'a str]) -> Option<(usize, &'a str)> {
    lines.iter().enumerate().find_map(|(i, &line)| {
        ENDING_LABELS.iter().find_map(|label| {
            if !has_label(line, label) {
                return None;
            }
            let rest = &unbold(line)[label.len()..];
            let separated = label.ends_with(']')
                || rest.is_empty()
                || rest.starts_with(|c: char| matches!(c, ':' | '-' | ']' | '*') || c.is_whitespace());
            separated.then(|| (i, after_label(line, label.len())))
        })
    })
}

fn conclusion_from(lines: &[&str], idx: usize, first: &str) -> String {
    std::iter::once(first)
        .chain(lines[idx + 1..].iter().copied())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The reply minus the lines in `skip` and any choice lines.
fn whole_reply(lines: &[&str], skip: &[Option<usize>]) -> String {
    lines
        .iter()
        .enumerate()
        .filter(|(i, l)| !skip.contains(&Some(*i)) && !is_choice_line(l))
        .map(|(_, l)| *l)
        .collect::<Vec<_>>()
        .join("\n")
}
