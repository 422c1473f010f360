//! Rule table compilation
//!
//!     `RuleTable::compile` turns a `GrammarDefinition` into the immutable table the tokenizer
//!     runs on. Compilation does all the work that would otherwise happen per line:
//!
//!         1. States get ids, `root` first and the rest in definition order.
//!         2. Includes are spliced in place, recursively, rejecting cycles.
//!         3. `@name` macro references in patterns are expanded, recursively, rejecting cycles.
//!         4. Every pattern is anchored as `^(?:...)` and compiled once. Identical patterns
//!            share one compiled regex.
//!         5. Actions are resolved: transition targets become state ids, case keys become
//!            guards, and class sets become ids.
//!
//!     The resulting table is read-only and can be shared between any number of tokenizers.

use super::action::{Action, ActionKind, Guard, Resolved, StateId, Template, Transition};
use super::definition::{ActionDefinition, GrammarDefinition, RuleDefinition};
use super::error::{GrammarError, Result};
use crate::token::BracketRole;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Index of a class set in a [`RuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetId(u32);

impl SetId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Rule {
    pattern: String,
    regex: Regex,
    action: Action,
}

impl Rule {
    /// The pattern after macro expansion, without the anchor.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

#[derive(Debug)]
pub struct State {
    name: String,
    rules: Vec<Rule>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[derive(Debug)]
struct BracketPair {
    open: String,
    close: String,
    class: Arc<str>,
}

/// Compiled, immutable grammar.
#[derive(Debug)]
pub struct RuleTable {
    name: String,
    default_class: Arc<str>,
    states: Vec<State>,
    state_ids: HashMap<String, StateId>,
    sets: Vec<HashSet<String>>,
    brackets: Vec<BracketPair>,
}

impl RuleTable {
    pub fn compile(definition: &GrammarDefinition) -> Result<Self> {
        Compiler::new(definition)?.compile()
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Self::compile(&GrammarDefinition::from_json(source)?)
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        Self::compile(&GrammarDefinition::from_yaml(source)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class given to characters no rule matches.
    pub fn default_class(&self) -> &Arc<str> {
        &self.default_class
    }

    pub fn state(&self, id: StateId) -> &State {
        // Ids from another table fall back to root.
        self.states.get(id.index()).unwrap_or(&self.states[0])
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.state_ids.get(name).copied()
    }

    pub fn state_name(&self, id: StateId) -> &str {
        self.states.get(id.index()).map_or("?", |state| state.name.as_str())
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn class_set(&self, id: SetId) -> &HashSet<String> {
        &self.sets[id.index()]
    }

    pub(crate) fn bracket_for(&self, text: &str) -> Option<(&Arc<str>, BracketRole)> {
        self.brackets.iter().find_map(|pair| {
            if pair.open == text {
                Some((&pair.class, BracketRole::Open))
            } else if pair.close == text {
                Some((&pair.class, BracketRole::Close))
            } else {
                None
            }
        })
    }

    pub(crate) fn default_resolution<'t>(&self) -> Resolved<'t> {
        Resolved {
            class: self.default_class.clone(),
            bracket: None,
            transitions: Vec::new(),
        }
    }
}

/// Location used in error messages.
struct Site<'a> {
    state: &'a str,
    index: usize,
}

struct Compiler<'d> {
    definition: &'d GrammarDefinition,
    order: Vec<&'d str>,
    state_ids: HashMap<String, StateId>,
    set_ids: HashMap<&'d str, SetId>,
    expanded_macros: HashMap<&'d str, String>,
    regexes: HashMap<String, Regex>,
    classes: HashMap<String, Arc<str>>,
}

impl<'d> Compiler<'d> {
    fn new(definition: &'d GrammarDefinition) -> Result<Self> {
        let mut seen = HashSet::new();
        for (name, _) in &definition.states {
            if !seen.insert(name.as_str()) {
                return Err(GrammarError::DuplicateState {
                    state: name.clone(),
                });
            }
        }
        if !seen.contains("root") {
            return Err(GrammarError::MissingRoot {
                grammar: definition.name.clone(),
            });
        }

        let order: Vec<&str> = std::iter::once("root")
            .chain(
                definition
                    .states
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .filter(|name| *name != "root"),
            )
            .collect();
        let state_ids = order
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_string(), StateId::from_raw(index as u32)))
            .collect();
        let set_ids = definition
            .class_sets
            .iter()
            .enumerate()
            .map(|(index, (name, _))| (name.as_str(), SetId(index as u32)))
            .collect();

        Ok(Self {
            definition,
            order,
            state_ids,
            set_ids,
            expanded_macros: HashMap::new(),
            regexes: HashMap::new(),
            classes: HashMap::new(),
        })
    }

    fn compile(mut self) -> Result<RuleTable> {
        let mut states = Vec::with_capacity(self.order.len());
        let mut rule_count = 0;
        for name in self.order.clone() {
            let mut flattened = Vec::new();
            self.flatten(name, &mut Vec::new(), &mut flattened)?;
            let mut rules = Vec::with_capacity(flattened.len());
            for (index, definition) in flattened.into_iter().enumerate() {
                let site = Site { state: name, index };
                rules.push(self.rule(definition, &site)?);
            }
            rule_count += rules.len();
            states.push(State {
                name: name.to_string(),
                rules,
            });
        }

        let definition = self.definition;
        let default_class = self.class(&definition.default_token);
        let brackets = definition
            .brackets
            .iter()
            .map(|pair| BracketPair {
                open: pair.open.clone(),
                close: pair.close.clone(),
                class: self.class(&pair.token),
            })
            .collect();
        let sets = definition
            .class_sets
            .iter()
            .map(|(_, members)| members.iter().cloned().collect())
            .collect();

        tracing::debug!(
            grammar = %definition.name,
            states = states.len(),
            rules = rule_count,
            patterns = self.regexes.len(),
            "compiled rule table"
        );

        Ok(RuleTable {
            name: definition.name.clone(),
            default_class,
            states,
            state_ids: self.state_ids,
            sets,
            brackets,
        })
    }

    fn rules_of(&self, name: &str) -> Option<&'d [RuleDefinition]> {
        let definition = self.definition;
        definition
            .states
            .iter()
            .find(|(state, _)| state == name)
            .map(|(_, rules)| rules.as_slice())
    }

    fn flatten(
        &self,
        name: &'d str,
        active: &mut Vec<&'d str>,
        out: &mut Vec<RuleDefinition>,
    ) -> Result<()> {
        if active.contains(&name) {
            return Err(GrammarError::IncludeCycle {
                state: name.to_string(),
            });
        }
        let rules = self.rules_of(name).ok_or_else(|| GrammarError::UnknownInclude {
            state: active.last().copied().unwrap_or(name).to_string(),
            target: name.to_string(),
        })?;
        active.push(name);
        for rule in rules {
            match rule {
                RuleDefinition::Include { include } => {
                    let target = include.strip_prefix('@').unwrap_or(include);
                    self.flatten(target, active, out)?;
                }
                other => out.push(other.clone().into_canonical()),
            }
        }
        active.pop();
        Ok(())
    }

    fn rule(&mut self, definition: RuleDefinition, site: &Site<'_>) -> Result<Rule> {
        let RuleDefinition::Match { regex, action } = definition else {
            return Err(GrammarError::InvalidAction {
                state: site.state.to_string(),
                index: site.index,
                reason: "unexpected include after flattening".to_string(),
            });
        };

        let pattern = self.expand(&regex, &mut Vec::new())?;
        let compiled = self.regex(&pattern, site)?;
        let action = self.action(&action, site, false)?;
        if let ActionKind::Groups(groups) = &action.kind {
            let captures = compiled.captures_len() - 1;
            if groups.len() > captures {
                return Err(GrammarError::InvalidAction {
                    state: site.state.to_string(),
                    index: site.index,
                    reason: format!(
                        "{} group actions but the pattern has {captures} capture groups",
                        groups.len()
                    ),
                });
            }
        }
        Ok(Rule {
            pattern,
            regex: compiled,
            action,
        })
    }

    fn regex(&mut self, pattern: &str, site: &Site<'_>) -> Result<Regex> {
        if let Some(regex) = self.regexes.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
            GrammarError::InvalidPattern {
                state: site.state.to_string(),
                index: site.index,
                pattern: pattern.to_string(),
                source,
            }
        })?;
        self.regexes.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// Replaces `@name` with `(?:body)`. `\@` stands for a literal `@`.
    fn expand(&mut self, pattern: &str, active: &mut Vec<&'d str>) -> Result<String> {
        let mut out = String::with_capacity(pattern.len());
        let mut rest = pattern;
        while let Some(ch) = rest.chars().next() {
            rest = &rest[ch.len_utf8()..];
            match ch {
                '\\' => match rest.chars().next() {
                    Some('@') => {
                        out.push('@');
                        rest = &rest[1..];
                    }
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                        rest = &rest[next.len_utf8()..];
                    }
                    None => out.push('\\'),
                },
                '@' if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') => {
                    let len = rest
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(rest.len());
                    let (name, tail) = rest.split_at(len);
                    rest = tail;
                    let body = self.macro_body(name, pattern, active)?;
                    out.push_str("(?:");
                    out.push_str(&body);
                    out.push(')');
                }
                _ => out.push(ch),
            }
        }
        Ok(out)
    }

    fn macro_body(
        &mut self,
        name: &str,
        pattern: &str,
        active: &mut Vec<&'d str>,
    ) -> Result<String> {
        let definition = self.definition;
        let Some((key, body)) = definition
            .macros
            .iter()
            .find(|(key, _)| key == name)
            .map(|(key, body)| (key.as_str(), body.as_str()))
        else {
            return Err(GrammarError::UnknownMacro {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        };
        if let Some(expanded) = self.expanded_macros.get(key) {
            return Ok(expanded.clone());
        }
        if active.contains(&key) {
            return Err(GrammarError::MacroCycle {
                name: key.to_string(),
            });
        }
        active.push(key);
        let expanded = self.expand(body, active)?;
        active.pop();
        self.expanded_macros.insert(key, expanded.clone());
        Ok(expanded)
    }

    fn action(
        &mut self,
        definition: &ActionDefinition,
        site: &Site<'_>,
        nested: bool,
    ) -> Result<Action> {
        let action = match definition {
            ActionDefinition::Class(class) => Action {
                kind: self.class_kind(class, None),
                transition: Transition::None,
            },
            ActionDefinition::Token {
                token,
                next,
                param,
                bracket,
            } => Action {
                kind: self.class_kind(token, *bracket),
                transition: self.transition(next.as_deref(), param.as_deref(), site)?,
            },
            ActionDefinition::Cases { cases, next, param } => {
                let mut compiled = Vec::with_capacity(cases.len());
                for (key, action) in cases {
                    let guard = self.guard(key, site)?;
                    compiled.push((guard, self.action(action, site, true)?));
                }
                Action {
                    kind: ActionKind::Cases(compiled),
                    transition: self.transition(next.as_deref(), param.as_deref(), site)?,
                }
            }
            ActionDefinition::Groups { groups, next, param } => {
                if nested {
                    return Err(GrammarError::InvalidAction {
                        state: site.state.to_string(),
                        index: site.index,
                        reason: "groups must be the outermost action of a rule".to_string(),
                    });
                }
                if groups.is_empty() {
                    return Err(GrammarError::InvalidAction {
                        state: site.state.to_string(),
                        index: site.index,
                        reason: "groups action without any group".to_string(),
                    });
                }
                let compiled = groups
                    .iter()
                    .map(|group| self.action(group, site, true))
                    .collect::<Result<Vec<_>>>()?;
                Action {
                    kind: ActionKind::Groups(compiled),
                    transition: self.transition(next.as_deref(), param.as_deref(), site)?,
                }
            }
        };
        Ok(action)
    }

    fn class_kind(&mut self, class: &str, bracket: Option<BracketRole>) -> ActionKind {
        if class == "@brackets" {
            return ActionKind::Brackets;
        }
        ActionKind::Class {
            class: self.class(class),
            bracket,
        }
    }

    fn class(&mut self, class: &str) -> Arc<str> {
        self.classes
            .entry(class.to_string())
            .or_insert_with(|| Arc::from(class))
            .clone()
    }

    fn transition(
        &self,
        next: Option<&str>,
        param: Option<&str>,
        site: &Site<'_>,
    ) -> Result<Transition> {
        let Some(next) = next else {
            return Ok(Transition::None);
        };
        let param = param.map(Template::parse);
        let transition = match next {
            "" => Transition::None,
            "@pop" => Transition::Pop,
            "@popall" => Transition::PopAll,
            "@push" => Transition::PushCurrent,
            _ => {
                if let Some(target) = next.strip_prefix('@') {
                    Transition::Push {
                        state: self.target(target, next, site)?,
                        param,
                    }
                } else if let Some(target) = next.strip_prefix('=') {
                    Transition::Replace {
                        state: self.target(target, next, site)?,
                        param,
                    }
                } else {
                    return Err(GrammarError::InvalidTransition {
                        state: site.state.to_string(),
                        index: site.index,
                        next: next.to_string(),
                    });
                }
            }
        };
        Ok(transition)
    }

    fn target(&self, target: &str, next: &str, site: &Site<'_>) -> Result<StateId> {
        self.state_ids
            .get(target)
            .copied()
            .ok_or_else(|| GrammarError::UnknownState {
                state: site.state.to_string(),
                index: site.index,
                next: next.to_string(),
                target: target.to_string(),
            })
    }

    fn guard(&self, key: &str, site: &Site<'_>) -> Result<Guard> {
        if key == "@default" {
            return Ok(Guard::Default);
        }
        if let Some(pattern) = key.strip_prefix('~') {
            return Regex::new(&format!("^(?:{pattern})$"))
                .map(Guard::Matches)
                .map_err(|err| GrammarError::InvalidGuard {
                    state: site.state.to_string(),
                    index: site.index,
                    guard: key.to_string(),
                    reason: err.to_string(),
                });
        }
        if key.starts_with('$') {
            if let Some((lhs, rhs)) = key.split_once("==") {
                return Ok(Guard::Equals {
                    lhs: Template::parse(lhs),
                    rhs: Template::parse(rhs),
                });
            }
            if let Some((subject, set)) = key.split_once('@') {
                return Ok(Guard::InSet {
                    subject: Template::parse(subject),
                    set: self.set(set, site)?,
                });
            }
        }
        if let Some(set) = key.strip_prefix('@') {
            return Ok(Guard::InSet {
                subject: Template::parse("$0"),
                set: self.set(set, site)?,
            });
        }
        Ok(Guard::Literal(key.to_string()))
    }

    fn set(&self, name: &str, site: &Site<'_>) -> Result<SetId> {
        self.set_ids
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UnknownClassSet {
                state: site.state.to_string(),
                index: site.index,
                set: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::definition::{ActionDefinition as A, RuleDefinition as R};

    fn grammar() -> GrammarDefinition {
        GrammarDefinition::new("test")
            .macro_pattern("ident", "[a-z_]+")
            .macro_pattern("path", "@ident::")
            .class_set("keywords", ["let"])
            .state("root", vec![R::include("@common"), R::new("@ident", "identifier")])
            .state("common", vec![R::new(r"\s+", "white")])
    }

    #[test]
    fn root_gets_id_zero() {
        let definition = GrammarDefinition::new("test")
            .state("other", vec![R::new("x", "x")])
            .state("root", vec![R::new("y", "y")]);
        let table = RuleTable::compile(&definition).unwrap();
        assert_eq!(table.state_id("root"), Some(StateId::ROOT));
        assert_eq!(table.state_name(StateId::from_raw(1)), "other");
    }

    #[test]
    fn includes_are_spliced_in_order() {
        let table = RuleTable::compile(&grammar()).unwrap();
        let root = table.state(StateId::ROOT);
        let patterns: Vec<_> = root.rules().iter().map(Rule::pattern).collect();
        assert_eq!(patterns, vec![r"\s+", "(?:[a-z_]+)"]);
    }

    #[test]
    fn macros_expand_recursively() {
        let definition = grammar().state("paths", vec![R::new("@path", "namespace")]);
        let table = RuleTable::compile(&definition).unwrap();
        let id = table.state_id("paths").unwrap();
        assert_eq!(table.state(id).rules()[0].pattern(), "(?:(?:[a-z_]+)::)");
    }

    #[test]
    fn escaped_at_is_literal() {
        let definition = grammar().state("at", vec![R::new(r"\@ident", "literal")]);
        let table = RuleTable::compile(&definition).unwrap();
        let id = table.state_id("at").unwrap();
        assert_eq!(table.state(id).rules()[0].pattern(), "@ident");
    }

    #[test]
    fn missing_root_is_rejected() {
        let definition = GrammarDefinition::new("test").state("main", vec![]);
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::MissingRoot { .. })
        ));
    }

    #[test]
    fn unknown_transition_target_is_rejected() {
        let definition = GrammarDefinition::new("test")
            .state("root", vec![R::new("x", A::token("x").next("@nowhere"))]);
        let err = RuleTable::compile(&definition).unwrap_err();
        assert_eq!(
            err.to_string(),
            "state `root` rule 0: transition `@nowhere` targets unknown state `nowhere`"
        );
    }

    #[test]
    fn include_cycles_are_rejected() {
        let definition = GrammarDefinition::new("test")
            .state("root", vec![R::include("a")])
            .state("a", vec![R::include("b")])
            .state("b", vec![R::include("a")]);
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::IncludeCycle { state }) if state == "a"
        ));
    }

    #[test]
    fn macro_cycles_are_rejected() {
        let definition = GrammarDefinition::new("test")
            .macro_pattern("a", "x@b")
            .macro_pattern("b", "y@a")
            .state("root", vec![R::new("@a", "x")]);
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::MacroCycle { .. })
        ));
    }

    #[test]
    fn unknown_macro_is_rejected() {
        let definition = GrammarDefinition::new("test").state("root", vec![R::new("@nope", "x")]);
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::UnknownMacro { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn unknown_class_set_is_rejected() {
        let definition = GrammarDefinition::new("test").state(
            "root",
            vec![R::new("[a-z]+", A::cases([("@missing", "keyword")]))],
        );
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::UnknownClassSet { set, .. }) if set == "missing"
        ));
    }

    #[test]
    fn invalid_pattern_reports_source() {
        let definition = GrammarDefinition::new("test").state("root", vec![R::new("(", "x")]);
        let err = RuleTable::compile(&definition).unwrap_err();
        assert!(matches!(err, GrammarError::InvalidPattern { ref pattern, .. } if pattern == "("));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn too_many_group_actions_are_rejected() {
        let definition = GrammarDefinition::new("test")
            .state("root", vec![R::new("(a)b", A::groups(["x", "y"]))]);
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::InvalidAction { .. })
        ));
    }

    #[test]
    fn nested_groups_are_rejected() {
        let definition = GrammarDefinition::new("test").state(
            "root",
            vec![R::new(
                "(a)",
                A::cases([("@default", A::groups(["x"]))]),
            )],
        );
        assert!(matches!(
            RuleTable::compile(&definition),
            Err(GrammarError::InvalidAction { .. })
        ));
    }

    #[test]
    fn bracket_lookup() {
        let definition = grammar().bracket("{", "}", "delimiter.curly");
        let table = RuleTable::compile(&definition).unwrap();
        let (class, role) = table.bracket_for("}").unwrap();
        assert_eq!(&**class, "delimiter.curly");
        assert_eq!(role, BracketRole::Close);
        assert!(table.bracket_for("(").is_none());
    }

    #[test]
    fn compiles_from_json() {
        let table = RuleTable::from_json(
            r#"{ "name": "mini", "states": { "root": [["[0-9]+", "number"]] } }"#,
        )
        .unwrap();
        assert_eq!(table.name(), "mini");
        assert_eq!(&**table.default_class(), "invalid");
    }
}
