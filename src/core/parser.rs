//! Compact text form of a timeline, used in shareable links.
//!
//! ```text
//! shot:ferro,3xheal:bandage,(shot:kettle|2xshield:arc_powercell),nothing
//! ```
//!
//! Events are comma separated, `{N}x` repeats an event, a parenthesised
//! group is a split with `|` between branches. Steps inside one branch are
//! separated by `;`, so single-step branches read exactly like plain events.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::model::{branch_label, Action, Branch, EventId, Split, Step, TimelineEvent, MAX_REPEAT};

const RESERVED: &[char] = &['(', ')', ',', '|', ';'];

lazy_static! {
    static ref REPEAT_PREFIX: Regex = Regex::new(r"^(\d+)x(.+)$").expect("Invalid repeat regex");
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("empty event at position {0}")]
    EmptySegment(usize),
    #[error("invalid repeat count `{0}`")]
    InvalidRepeat(String),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("invalid item id in `{0}`")]
    InvalidId(String),
    #[error("splits cannot be nested")]
    NestedSplit,
    #[error("a split cannot be repeated")]
    RepeatedSplit,
    #[error("a split needs at least two branches, got {0}")]
    TooFewBranches(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTimeline {
    pub events: Vec<TimelineEvent>,
    /// First id not used by `events`.
    pub next_id: EventId,
}

pub fn encode_timeline(events: &[TimelineEvent]) -> String {
    events
        .iter()
        .map(|event| match event {
            TimelineEvent::Step(step) => encode_step(step),
            TimelineEvent::Split(split) => {
                let branches: Vec<String> = split.branches.iter().map(encode_branch).collect();
                format!("({})", branches.join("|"))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_branch(branch: &Branch) -> String {
    if branch.steps.is_empty() {
        return "nothing".to_string();
    }
    branch
        .steps
        .iter()
        .map(encode_step)
        .collect::<Vec<_>>()
        .join(";")
}

fn encode_step(step: &Step) -> String {
    let body = match &step.action {
        Action::Shot { weapon_id } => format!("shot:{}", weapon_id),
        Action::Heal { item_id } => format!("heal:{}", item_id),
        Action::ShieldRecharge { item_id } => format!("shield:{}", item_id),
        Action::Nothing => "nothing".to_string(),
    };
    if step.repeat > 1 {
        format!("{}x{}", step.repeat, body)
    } else {
        body
    }
}

pub fn decode_timeline(input: &str) -> Result<DecodedTimeline, DecodeError> {
    let mut decoder = Decoder { next_id: 1 };
    let mut events = Vec::new();

    if !input.is_empty() {
        for (position, segment) in split_top_level(input)?.into_iter().enumerate() {
            if segment.is_empty() {
                return Err(DecodeError::EmptySegment(position));
            }
            events.push(decoder.event(segment)?);
        }
    }

    Ok(DecodedTimeline {
        events,
        next_id: decoder.next_id,
    })
}

/// Split on commas that are not inside a split group.
fn split_top_level(input: &str) -> Result<Vec<&str>, DecodeError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in input.char_indices() {
        match ch {
            '(' => {
                depth += 1;
                if depth > 1 {
                    return Err(DecodeError::NestedSplit);
                }
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or(DecodeError::UnbalancedParens)?;
            }
            ',' if depth == 0 => {
                parts.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(DecodeError::UnbalancedParens);
    }
    parts.push(&input[start..]);
    Ok(parts)
}

/// Returns the repeat count, the remaining body, and whether a prefix was present.
fn split_repeat(text: &str) -> Result<(u32, &str, bool), DecodeError> {
    let Some(caps) = REPEAT_PREFIX.captures(text) else {
        return Ok((1, text, false));
    };
    let digits = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());
    match digits.parse::<u32>() {
        Ok(count) if (1..=MAX_REPEAT).contains(&count) => Ok((count, body, true)),
        _ => Err(DecodeError::InvalidRepeat(digits.to_string())),
    }
}

fn parse_action(body: &str) -> Result<Action, DecodeError> {
    let with_id = |id: &str| {
        if id.is_empty() || id.contains(RESERVED) {
            Err(DecodeError::InvalidId(body.to_string()))
        } else {
            Ok(id.to_string())
        }
    };

    if let Some(id) = body.strip_prefix("shot:") {
        Ok(Action::Shot { weapon_id: with_id(id)? })
    } else if let Some(id) = body.strip_prefix("heal:") {
        Ok(Action::Heal { item_id: with_id(id)? })
    } else if let Some(id) = body.strip_prefix("shield:") {
        Ok(Action::ShieldRecharge { item_id: with_id(id)? })
    } else if body == "nothing" {
        Ok(Action::Nothing)
    } else {
        Err(DecodeError::UnknownEvent(body.to_string()))
    }
}

struct Decoder {
    next_id: EventId,
}

impl Decoder {
    fn allocate(&mut self) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn event(&mut self, segment: &str) -> Result<TimelineEvent, DecodeError> {
        let (repeat, body, prefixed) = split_repeat(segment)?;

        if let Some(inner) = body.strip_prefix('(') {
            if prefixed {
                return Err(DecodeError::RepeatedSplit);
            }
            let inner = inner.strip_suffix(')').ok_or(DecodeError::UnbalancedParens)?;
            return self.split(inner).map(TimelineEvent::Split);
        }

        self.step(body, repeat).map(TimelineEvent::Step)
    }

    fn step(&mut self, body: &str, repeat: u32) -> Result<Step, DecodeError> {
        let action = parse_action(body)?;
        Ok(Step::new(self.allocate(), action).repeated(repeat))
    }

    fn split(&mut self, inner: &str) -> Result<Split, DecodeError> {
        let parts: Vec<&str> = inner.split('|').collect();
        if parts.len() < 2 {
            return Err(DecodeError::TooFewBranches(parts.len()));
        }

        let id = self.allocate();
        let mut branches = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            let branch_id = self.allocate();
            let mut steps = Vec::new();
            for (position, text) in part.split(';').enumerate() {
                if text.is_empty() {
                    return Err(DecodeError::EmptySegment(position));
                }
                if text.contains(['(', ')']) {
                    return Err(DecodeError::NestedSplit);
                }
                let (repeat, body, _) = split_repeat(text)?;
                steps.push(self.step(body, repeat)?);
            }
            branches.push(Branch {
                id: branch_id,
                label: branch_label(index),
                steps,
            });
        }

        Ok(Split {
            id,
            label: "Split".to_string(),
            branches,
        })
    }
}
