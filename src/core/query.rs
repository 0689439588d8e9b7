//! Shareable-link state: `AppState` to and from a URL query string.
//!
//! Parameter names and the defaults-elision rules match links the web
//! calculator has already handed out, so old links keep loading.

use super::catalog::Catalog;
use super::config::Settings;
use super::parser::{decode_timeline, encode_timeline};
use super::state::{AppState, MAX_HEALTH};

const HEALTH: &str = "health";
const SHIELD: &str = "shield";
const SHIELD_TYPE: &str = "shieldType";
const SEPARATE: &str = "separate";
const EVENTS: &str = "events";

impl<'a> AppState<'a> {
    /// Query string for this state, empty when everything is at its default.
    pub fn to_query(&self) -> String {
        let defaults = AppState::new(self.catalog(), self.settings().clone());
        let events = encode_timeline(self.timeline());

        let changed = self.health() != MAX_HEALTH
            || self.shield() != defaults.shield()
            || self.shield_type_id() != defaults.shield_type_id()
            || self.separate()
            || events != encode_timeline(defaults.timeline());
        if !changed {
            return String::new();
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        if self.health() != MAX_HEALTH {
            query.append_pair(HEALTH, &self.health().to_string());
        }
        if self.shield() != self.max_shield() {
            query.append_pair(SHIELD, &self.shield().to_string());
        }
        query.append_pair(SHIELD_TYPE, self.shield_type_id().unwrap_or(""));
        if self.separate() {
            query.append_pair(SEPARATE, "true");
        }
        if !events.is_empty() {
            query.append_pair(EVENTS, &events);
        }
        query.finish()
    }

    /// Rebuild state from a query string. Bad values fall back to defaults
    /// instead of failing.
    pub fn from_query(query: &str, catalog: &'a Catalog, settings: Settings) -> Self {
        let mut state = AppState::new(catalog, settings);
        let query = query.strip_prefix('?').unwrap_or(query);
        if query.is_empty() {
            return state;
        }

        let params: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let param = |name: &str| first_value(&params, name);

        let health = param(HEALTH)
            .and_then(leading_int)
            .filter(|&h| h != 0)
            .unwrap_or(i64::from(MAX_HEALTH));
        let shield = param(SHIELD).and_then(leading_int).unwrap_or(0);

        // Any parameter at all but no shieldType means the link was made without a shield.
        let shield_type = param(SHIELD_TYPE).filter(|id| !id.is_empty());
        if !state.set_shield_type(shield_type) {
            log::warn!("Unknown shield type {:?} in link, using no shield", shield_type);
            state.set_shield_type(None);
        }
        if param(SHIELD).is_some() || shield_type.is_none() {
            state.set_shield(clamp_to_u32(shield));
        }
        state.set_health(clamp_to_u32(health));
        state.set_separate(param(SEPARATE) == Some("true"));

        if let Some(text) = param(EVENTS) {
            match decode_timeline(text) {
                Ok(decoded) if !decoded.events.is_empty() => {
                    state.replace_timeline(decoded.events, decoded.next_id);
                }
                Ok(_) => {}
                Err(e) => log::warn!("Failed to parse events from link: {}", e),
            }
        }

        state
    }
}

/// First value for `name`, like `URLSearchParams.get`.
fn first_value<'p>(params: &'p [(String, String)], name: &str) -> Option<&'p str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Integer prefix of `text` after leading whitespace, `None` if there is none.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
