//! Round-scoped data shared across player states
//!
//! States never read each other's fields. Anything that has to survive a
//! state swap (who won, who fired the last hit, how long the round ran)
//! goes through a [`Context`], which is moved into every `enter`, `update`
//! and `exit` call and moved back out again.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::PlayerId;

/// Well-known context keys
pub mod keys {
    /// Round number, starting at 1
    pub const ROUND: &str = "round";
    /// Seconds of simulated time since the round started
    pub const ELAPSED: &str = "elapsed";
    /// Player who landed the most recent damaging hit
    pub const LAST_HIT_ATTACKER: &str = "last_hit_attacker";
    /// Player who received the most recent damaging hit
    pub const LAST_HIT_VICTIM: &str = "last_hit_victim";
    /// First player destroyed this round
    pub const DESTROYED: &str = "destroyed";
    /// Set when both ships are destroyed in the same round
    pub const DRAW: &str = "draw";
    /// Surviving player once the round is over
    pub const WINNER: &str = "winner";
    /// Set by the first state to enter RoundOver
    pub const ROUND_OVER: &str = "round_over";
    /// Charge left when a shield was last lowered; consumed by the next state
    pub const SHIELD_LEFT: &str = "shield_left";
    /// Most recent player to run a shield dry
    pub const SHIELD_SPENT: &str = "shield_spent";
}

/// A value stored in the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Number(f64),
    Player(PlayerId),
    Text(String),
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for ContextValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for ContextValue {
    fn from(v: u32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<PlayerId> for ContextValue {
    fn from(v: PlayerId) -> Self {
        Self::Player(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// String-keyed bag of cross-state facts, last writer wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    data: BTreeMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.data.insert(key.into(), value.into());
    }

    /// Builder-style `set`, handy when threading a context by value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.data.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.data.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.data.get(key) {
            Some(ContextValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.data.get(key) {
            Some(ContextValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_player(&self, key: &str) -> Option<PlayerId> {
        match self.data.get(key) {
            Some(ContextValue::Player(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(ContextValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// True once any state has entered RoundOver
    pub fn round_over(&self) -> bool {
        self.get_bool(keys::ROUND_OVER).unwrap_or(false)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.get_player(keys::WINNER)
    }

    pub fn is_draw(&self) -> bool {
        self.get_bool(keys::DRAW).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.data) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_writer_wins() {
        let mut ctx = Context::new();
        ctx.set(keys::LAST_HIT_ATTACKER, PlayerId::One);
        ctx.set(keys::LAST_HIT_ATTACKER, PlayerId::Two);
        assert_eq!(ctx.get_player(keys::LAST_HIT_ATTACKER), Some(PlayerId::Two));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_typed_getters_reject_wrong_type() {
        let ctx = Context::new().with("elapsed", 1.5_f32).with("note", "hello");
        assert_eq!(ctx.get_number("elapsed"), Some(1.5));
        assert_eq!(ctx.get_bool("elapsed"), None);
        assert_eq!(ctx.get_text("note"), Some("hello"));
        assert_eq!(ctx.get_player("note"), None);
    }

    #[test]
    fn test_round_over_flags() {
        let mut ctx = Context::new();
        assert!(!ctx.round_over());
        assert!(!ctx.is_draw());
        ctx.set(keys::ROUND_OVER, true);
        ctx.set(keys::WINNER, PlayerId::One);
        assert!(ctx.round_over());
        assert_eq!(ctx.winner(), Some(PlayerId::One));
    }

    #[test]
    fn test_display_is_json() {
        let ctx = Context::new().with(keys::WINNER, PlayerId::Two);
        assert_eq!(ctx.to_string(), r#"{"winner":"player2"}"#);
    }
}
