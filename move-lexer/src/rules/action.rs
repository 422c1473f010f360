//! Compiled actions
//!
//!     Actions are what a rule does once its pattern matched. They come in three flavours:
//!
//!         Class     emit one class for the whole match (optionally tagged as a bracket)
//!         Brackets  look the matched text up in the bracket pairs of the table
//!         Cases     try guards in order and run the action of the first one that holds
//!         Groups    one action per capture group, tiling the match
//!
//!     Every action also carries a `Transition` that is applied to the state stack after the
//!     tokens have been emitted. Parameters of pushed frames come from templates such as `$0`
//!     (whole match), `$1`..`$9` (capture groups) and `$P` (parameter of the current frame).

use super::table::{RuleTable, SetId};
use crate::token::BracketRole;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Index of a state in a [`RuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    pub const ROOT: StateId = StateId(0);

    pub fn from_raw(raw: u32) -> Self {
        StateId(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Group(usize),
    Param,
}

/// A parameter template such as `$1`, `$P` or `x$0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '$' {
                literal.push(ch);
                continue;
            }
            let part = match chars.peek().copied() {
                Some(digit @ '0'..='9') => TemplatePart::Group(digit as usize - '0' as usize),
                Some('P') => TemplatePart::Param,
                Some('$') => {
                    chars.next();
                    literal.push('$');
                    continue;
                }
                _ => {
                    literal.push('$');
                    continue;
                }
            };
            chars.next();
            if !literal.is_empty() {
                parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(part);
        }
        if !literal.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }
        Self { parts }
    }

    /// Expands the template against a match. Missing groups and parameters expand to "".
    pub(crate) fn render(&self, scope: &Scope<'_>) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Group(0) => out.push_str(scope.subject),
                TemplatePart::Group(n) => {
                    if let Some(Some(text)) = scope.groups.get(*n) {
                        out.push_str(text);
                    }
                }
                TemplatePart::Param => out.push_str(scope.param.unwrap_or("")),
            }
        }
        out
    }

    fn is_subject(&self) -> bool {
        self.parts == [TemplatePart::Group(0)]
    }
}

/// What an action sees of the match it runs for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    /// Text under inspection: the whole match, or one capture group inside `Groups`.
    pub subject: &'a str,
    /// Capture groups of the whole match; index 0 is the match itself.
    pub groups: &'a [Option<&'a str>],
    /// Parameter of the frame on top of the stack when the rule matched.
    pub param: Option<&'a str>,
}

/// Predicate selecting one entry of a `Cases` action.
#[derive(Debug, Clone)]
pub enum Guard {
    /// `@set` or `$n@set`: the expanded subject is a member of the class set.
    InSet { subject: Template, set: SetId },
    /// `~regex`: the subject matches the regex entirely.
    Matches(Regex),
    /// `$P==text`, `$1==$P`: both sides expand to the same string.
    Equals { lhs: Template, rhs: Template },
    /// Any other key: the subject equals it literally.
    Literal(String),
    /// `@default`
    Default,
}

impl Guard {
    pub(crate) fn holds(&self, scope: &Scope<'_>, table: &RuleTable) -> bool {
        match self {
            Guard::InSet { subject, set } => {
                let members = table.class_set(*set);
                if subject.is_subject() {
                    members.contains(scope.subject)
                } else {
                    members.contains(subject.render(scope).as_str())
                }
            }
            Guard::Matches(regex) => regex.is_match(scope.subject),
            Guard::Equals { lhs, rhs } => lhs.render(scope) == rhs.render(scope),
            Guard::Literal(text) => scope.subject == text,
            Guard::Default => true,
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::InSet { set, .. } => write!(f, "in-set({})", set.index()),
            Guard::Matches(regex) => write!(f, "~{}", regex.as_str()),
            Guard::Equals { .. } => write!(f, "equals"),
            Guard::Literal(text) => write!(f, "{text:?}"),
            Guard::Default => write!(f, "@default"),
        }
    }
}

/// Effect of an action on the state stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    None,
    Push {
        state: StateId,
        param: Option<Template>,
    },
    /// `@push`: pushes a copy of the current frame.
    PushCurrent,
    Pop,
    PopAll,
    /// `=name`: replaces the top frame.
    Replace {
        state: StateId,
        param: Option<Template>,
    },
}

impl Transition {
    pub fn is_none(&self) -> bool {
        matches!(self, Transition::None)
    }
}

#[derive(Debug, Clone)]
pub enum ActionKind {
    Class {
        class: Arc<str>,
        bracket: Option<BracketRole>,
    },
    Brackets,
    Cases(Vec<(Guard, Action)>),
    Groups(Vec<Action>),
}

#[derive(Debug, Clone)]
pub struct Action {
    pub kind: ActionKind,
    pub transition: Transition,
}

/// Outcome of a non-group action for one span.
#[derive(Debug, Clone)]
pub(crate) struct Resolved<'t> {
    pub class: Arc<str>,
    pub bracket: Option<BracketRole>,
    pub transitions: Vec<&'t Transition>,
}

impl Action {
    /// Picks the class for `scope.subject`, following cases down to a leaf.
    ///
    /// Transitions are collected outermost last, so a case that sets its own transition runs
    /// before the one declared on the enclosing action.
    pub(crate) fn resolve<'t>(&'t self, scope: &Scope<'_>, table: &'t RuleTable) -> Resolved<'t> {
        let mut resolved = match &self.kind {
            ActionKind::Class { class, bracket } => Resolved {
                class: class.clone(),
                bracket: *bracket,
                transitions: Vec::new(),
            },
            ActionKind::Brackets => match table.bracket_for(scope.subject) {
                Some((class, role)) => Resolved {
                    class: class.clone(),
                    bracket: Some(role),
                    transitions: Vec::new(),
                },
                None => table.default_resolution(),
            },
            ActionKind::Cases(cases) => cases
                .iter()
                .find(|(guard, _)| guard.holds(scope, table))
                .map(|(_, action)| action.resolve(scope, table))
                .unwrap_or_else(|| table.default_resolution()),
            // Rejected at compile time outside the top level of a rule.
            ActionKind::Groups(_) => table.default_resolution(),
        };
        if !self.transition.is_none() {
            resolved.transitions.push(&self.transition);
        }
        resolved
    }
}
