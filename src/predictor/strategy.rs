//! Strategy Table - static mapping from signal to prediction rule

use serde::Serialize;

use super::signal::Signal;

/// Rule identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleId {
    #[serde(rename = "Q_IMMEDIATE")]
    QImmediate,
    #[serde(rename = "Q_IMMEDIATE_JJ")]
    QImmediateJj,
    #[serde(rename = "Q_NEXT_DRAW")]
    QNextDraw,
    #[serde(rename = "Q_WAIT_1")]
    QWait1,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleId::QImmediate => write!(f, "Q_IMMEDIATE"),
            RuleId::QImmediateJj => write!(f, "Q_IMMEDIATE_JJ"),
            RuleId::QNextDraw => write!(f, "Q_NEXT_DRAW"),
            RuleId::QWait1 => write!(f, "Q_WAIT_1"),
        }
    }
}

/// Where to expect the Queen, relative to the triggering draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: RuleId,
    pub target_offset: u64,
    pub label: &'static str,
}

const JACK_ALONE: Rule = Rule { id: RuleId::QImmediate, target_offset: 2, label: "Messenger" };
const KING_JACK: Rule = Rule { id: RuleId::QImmediate, target_offset: 2, label: "Strong correlation" };
const DOUBLE_JACK: Rule = Rule { id: RuleId::QImmediateJj, target_offset: 2, label: "Direct strong signal" };
const KING_ALONE: Rule = Rule { id: RuleId::QNextDraw, target_offset: 3, label: "Temporary dominance" };
const ACE_KING: Rule = Rule { id: RuleId::QWait1, target_offset: 3, label: "Block then flip" };

/// Look up the rule for a signal; NONE yields no rule
pub fn resolve(signal: Option<Signal>) -> Option<&'static Rule> {
    let rule = match signal? {
        Signal::JackAlone => &JACK_ALONE,
        Signal::KingJack => &KING_JACK,
        Signal::DoubleJack => &DOUBLE_JACK,
        Signal::KingAlone => &KING_ALONE,
        Signal::AceKing => &ACE_KING,
    };
    Some(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        let expect = [
            (Signal::JackAlone, RuleId::QImmediate, 2, "Messenger"),
            (Signal::KingJack, RuleId::QImmediate, 2, "Strong correlation"),
            (Signal::DoubleJack, RuleId::QImmediateJj, 2, "Direct strong signal"),
            (Signal::KingAlone, RuleId::QNextDraw, 3, "Temporary dominance"),
            (Signal::AceKing, RuleId::QWait1, 3, "Block then flip"),
        ];
        for (signal, id, offset, label) in expect {
            let rule = resolve(Some(signal)).unwrap();
            assert_eq!(rule.id, id);
            assert_eq!(rule.target_offset, offset);
            assert_eq!(rule.label, label);
        }
    }

    #[test]
    fn test_none_has_no_rule() {
        assert!(resolve(None).is_none());
    }

    #[test]
    fn test_rule_id_display() {
        assert_eq!(RuleId::QImmediateJj.to_string(), "Q_IMMEDIATE_JJ");
        assert_eq!(RuleId::QWait1.to_string(), "Q_WAIT_1");
    }
}
