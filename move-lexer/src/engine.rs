//! Line tokenizer
//!
//!     `Tokenizer::tokenize_line` runs the rule table over one line, starting from the state
//!     the previous line ended in, and returns the tokens together with the state the line ends
//!     in. It is a pure function of its inputs: the same stack and line always produce the same
//!     tokens and the same end state.
//!
//!     At each position the rules of the top state are tried in order and the first match wins.
//!     A zero-length match cannot advance the cursor; it pops the current state instead (or is
//!     skipped when only `root` is left). When nothing matches, one character is emitted with
//!     the table's default class. The tokens of a line therefore always tile it exactly.
//!
//!     Pushes past `max_stack_depth` frames are dropped so that pathological input cannot grow
//!     the stack without bound.

use crate::rules::{Action, ActionKind, Rule, RuleTable, Transition};
use crate::rules::action::Scope;
use crate::state::{Frame, StateStack};
use crate::token::Token;
use regex::Captures;
use std::sync::Arc;

pub const DEFAULT_MAX_STACK_DEPTH: usize = 100;

/// Tokens of one line and the state the line ends in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub end_state: StateStack,
}

/// Stack edit computed from a match, applied once all tokens of the match are emitted.
enum Pending {
    Push(Frame),
    PushCurrent,
    Pop,
    PopAll,
    Replace(Frame),
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    table: Arc<RuleTable>,
    max_stack_depth: usize,
}

impl Tokenizer {
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self {
            table,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
        }
    }

    /// Caps the number of frames on the stack; `root` counts as one.
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth.max(1);
        self
    }

    pub fn table(&self) -> &Arc<RuleTable> {
        &self.table
    }

    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    pub fn initial_state(&self) -> StateStack {
        StateStack::root()
    }

    pub fn tokenize_line(&self, stack: &StateStack, line: &str) -> LineTokens {
        let mut stack = stack.clone();
        let mut tokens = Vec::new();
        let mut cursor = 0;

        while cursor < line.len() {
            let rest = &line[cursor..];
            let Some((rule, captures)) = self.next_match(&mut stack, rest) else {
                let width = rest.chars().next().map_or(1, char::len_utf8);
                tokens.push(Token::new(cursor, width, self.table.default_class().clone()));
                cursor += width;
                continue;
            };

            let groups: Vec<Option<&str>> = captures
                .iter()
                .map(|group| group.map(|m| m.as_str()))
                .collect();
            let matched = groups.first().copied().flatten().unwrap_or("");
            let mut pending = Vec::new();
            {
                let scope = Scope {
                    subject: matched,
                    groups: &groups,
                    param: stack.top().param(),
                };
                self.emit(rule.action(), &scope, &captures, cursor, &mut tokens, &mut pending);
            }
            for edit in pending {
                self.apply(&mut stack, edit);
            }
            cursor += matched.len();
        }

        LineTokens {
            tokens,
            end_state: stack,
        }
    }

    /// Finds the first rule of the top state with a non-empty match, popping on empty ones.
    fn next_match<'h>(&self, stack: &mut StateStack, rest: &'h str) -> Option<(&Rule, Captures<'h>)> {
        loop {
            let state = self.table.state(stack.top().state());
            let mut popped = false;
            for rule in state.rules() {
                let Some(captures) = rule.regex().captures(rest) else {
                    continue;
                };
                if captures.get(0).is_some_and(|m| !m.is_empty()) {
                    return Some((rule, captures));
                }
                if stack.depth() > 1 {
                    tracing::trace!(state = state.name(), "empty match, popping state");
                    stack.pop();
                    popped = true;
                    break;
                }
            }
            if !popped {
                return None;
            }
        }
    }

    fn emit(
        &self,
        action: &Action,
        scope: &Scope<'_>,
        captures: &Captures<'_>,
        base: usize,
        tokens: &mut Vec<Token>,
        pending: &mut Vec<Pending>,
    ) {
        let ActionKind::Groups(groups) = &action.kind else {
            let resolved = action.resolve(scope, &self.table);
            tokens.push(
                Token::new(base, scope.subject.len(), resolved.class).with_bracket(resolved.bracket),
            );
            for transition in resolved.transitions {
                pending.extend(self.prepare(transition, scope));
            }
            return;
        };

        let mut covered = 0;
        for (index, group_action) in groups.iter().enumerate() {
            let Some(group) = captures.get(index + 1) else {
                continue;
            };
            // Empty and nested groups produce no token.
            if group.is_empty() || group.start() < covered {
                continue;
            }
            if group.start() > covered {
                tokens.push(self.gap(base + covered, group.start() - covered));
            }
            let group_scope = Scope {
                subject: group.as_str(),
                ..*scope
            };
            let resolved = group_action.resolve(&group_scope, &self.table);
            tokens.push(
                Token::new(base + group.start(), group.len(), resolved.class)
                    .with_bracket(resolved.bracket),
            );
            for transition in resolved.transitions {
                pending.extend(self.prepare(transition, &group_scope));
            }
            covered = group.end();
        }
        if covered < scope.subject.len() {
            tokens.push(self.gap(base + covered, scope.subject.len() - covered));
        }
        pending.extend(self.prepare(&action.transition, scope));
    }

    fn gap(&self, start: usize, length: usize) -> Token {
        Token::new(start, length, self.table.default_class().clone())
    }

    fn prepare(&self, transition: &Transition, scope: &Scope<'_>) -> Option<Pending> {
        let frame = |state, param: &Option<crate::rules::Template>| {
            Frame::new(
                state,
                param.as_ref().map(|template| Arc::from(template.render(scope))),
            )
        };
        match transition {
            Transition::None => None,
            Transition::Push { state, param } => Some(Pending::Push(frame(*state, param))),
            Transition::PushCurrent => Some(Pending::PushCurrent),
            Transition::Pop => Some(Pending::Pop),
            Transition::PopAll => Some(Pending::PopAll),
            Transition::Replace { state, param } => Some(Pending::Replace(frame(*state, param))),
        }
    }

    fn apply(&self, stack: &mut StateStack, edit: Pending) {
        let pushed = match edit {
            Pending::Push(frame) => stack.push(frame, self.max_stack_depth),
            Pending::PushCurrent => {
                let frame = stack.top().clone();
                stack.push(frame, self.max_stack_depth)
            }
            Pending::Replace(frame) => stack.replace_top(frame, self.max_stack_depth),
            Pending::Pop => {
                stack.pop();
                true
            }
            Pending::PopAll => {
                stack.pop_all();
                true
            }
        };
        if !pushed {
            tracing::debug!(
                depth = stack.depth(),
                limit = self.max_stack_depth,
                "state stack limit reached, push dropped"
            );
        }
    }
}
