//! Grammar definitions
//!
//!     A `GrammarDefinition` is the declarative, serializable form of a rule table. It can be
//!     written in Rust with the builder methods below, or loaded from JSON or YAML:
//!
//!         {
//!           "name": "demo",
//!           "defaultToken": "invalid",
//!           "macros":    { "ident": "[a-z_][a-z0-9_]*" },
//!           "classSets": { "keywords": ["let", "fun"] },
//!           "brackets":  [{ "open": "{", "close": "}", "token": "delimiter.curly" }],
//!           "states": {
//!             "root": [
//!               { "include": "whitespace" },
//!               ["@ident", { "cases": { "@keywords": "keyword", "@default": "identifier" } }],
//!               ["/\\*", "comment", "@comment"]
//!             ]
//!           }
//!         }
//!
//!     Maps keep document order: state order decides state ids, macro order is irrelevant, and
//!     the order of `cases` entries is the order guards are tried in.
//!
//!     Rules come in three shapes. `{ "include": name }` splices the rules of another state at
//!     that position. `{ "regex": .., "action": .. }` declares a matching rule; it may also be
//!     written as the array `[regex, action]`, or as `[regex, class, next]`.

use crate::token::BracketRole;
use serde::{Deserialize, Serialize};

/// Serializable grammar, compiled into a [`RuleTable`](super::RuleTable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarDefinition {
    pub name: String,
    #[serde(default = "default_token")]
    pub default_token: String,
    #[serde(default, with = "ordered_map")]
    pub macros: Vec<(String, String)>,
    #[serde(default, with = "ordered_map")]
    pub class_sets: Vec<(String, Vec<String>)>,
    #[serde(default)]
    pub brackets: Vec<BracketDefinition>,
    #[serde(with = "ordered_map")]
    pub states: Vec<(String, Vec<RuleDefinition>)>,
}

fn default_token() -> String {
    "invalid".to_string()
}

/// An opening/closing delimiter pair used by `@brackets` actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketDefinition {
    pub open: String,
    pub close: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDefinition {
    Include {
        include: String,
    },
    Match {
        regex: String,
        action: ActionDefinition,
    },
    WithNext(String, String, String),
}

impl RuleDefinition {
    pub fn new(regex: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        RuleDefinition::Match {
            regex: regex.into(),
            action: action.into(),
        }
    }

    pub fn include(state: impl Into<String>) -> Self {
        RuleDefinition::Include {
            include: state.into(),
        }
    }

    /// A rule that matches nothing and pops the current state.
    pub fn epsilon_pop() -> Self {
        RuleDefinition::new("", ActionDefinition::token("").next("@pop"))
    }

    /// Normalizes the `[regex, class, next]` shorthand into `Match`.
    pub fn into_canonical(self) -> Self {
        match self {
            RuleDefinition::WithNext(regex, class, next) => RuleDefinition::Match {
                regex,
                action: ActionDefinition::token(class).next(next),
            },
            other => other,
        }
    }
}

/// What a matching rule does: emit a class, dispatch on guards, or classify capture groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionDefinition {
    Class(String),
    Cases {
        #[serde(with = "ordered_map")]
        cases: Vec<(String, ActionDefinition)>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<String>,
    },
    Groups {
        groups: Vec<ActionDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<String>,
    },
    Token {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bracket: Option<BracketRole>,
    },
}

impl From<&str> for ActionDefinition {
    fn from(class: &str) -> Self {
        ActionDefinition::Class(class.to_string())
    }
}

impl From<String> for ActionDefinition {
    fn from(class: String) -> Self {
        ActionDefinition::Class(class)
    }
}

impl ActionDefinition {
    pub fn token(class: impl Into<String>) -> Self {
        ActionDefinition::Token {
            token: class.into(),
            next: None,
            param: None,
            bracket: None,
        }
    }

    pub fn cases<K, A>(cases: impl IntoIterator<Item = (K, A)>) -> Self
    where
        K: Into<String>,
        A: Into<ActionDefinition>,
    {
        ActionDefinition::Cases {
            cases: cases
                .into_iter()
                .map(|(guard, action)| (guard.into(), action.into()))
                .collect(),
            next: None,
            param: None,
        }
    }

    pub fn groups<A: Into<ActionDefinition>>(groups: impl IntoIterator<Item = A>) -> Self {
        ActionDefinition::Groups {
            groups: groups.into_iter().map(Into::into).collect(),
            next: None,
            param: None,
        }
    }

    /// Sets the transition (`@push`, `@pop`, `@popall`, `@name`, `=name`).
    pub fn next(self, target: impl Into<String>) -> Self {
        let target = Some(target.into());
        match self {
            ActionDefinition::Class(token) => ActionDefinition::Token {
                token,
                next: target,
                param: None,
                bracket: None,
            },
            ActionDefinition::Cases { cases, param, .. } => ActionDefinition::Cases {
                cases,
                next: target,
                param,
            },
            ActionDefinition::Groups { groups, param, .. } => ActionDefinition::Groups {
                groups,
                next: target,
                param,
            },
            ActionDefinition::Token {
                token,
                param,
                bracket,
                ..
            } => ActionDefinition::Token {
                token,
                next: target,
                param,
                bracket,
            },
        }
    }

    /// Sets the parameter template stored on the pushed frame.
    pub fn param(self, template: impl Into<String>) -> Self {
        let template = Some(template.into());
        match self {
            ActionDefinition::Class(token) => ActionDefinition::Token {
                token,
                next: None,
                param: template,
                bracket: None,
            },
            ActionDefinition::Cases { cases, next, .. } => ActionDefinition::Cases {
                cases,
                next,
                param: template,
            },
            ActionDefinition::Groups { groups, next, .. } => ActionDefinition::Groups {
                groups,
                next,
                param: template,
            },
            ActionDefinition::Token {
                token,
                next,
                bracket,
                ..
            } => ActionDefinition::Token {
                token,
                next,
                param: template,
                bracket,
            },
        }
    }

    pub fn open(self) -> Self {
        self.with_bracket(BracketRole::Open)
    }

    pub fn close(self) -> Self {
        self.with_bracket(BracketRole::Close)
    }

    fn with_bracket(self, role: BracketRole) -> Self {
        match self {
            ActionDefinition::Class(token) => ActionDefinition::Token {
                token,
                next: None,
                param: None,
                bracket: Some(role),
            },
            ActionDefinition::Token {
                token, next, param, ..
            } => ActionDefinition::Token {
                token,
                next,
                param,
                bracket: Some(role),
            },
            other => other,
        }
    }
}

impl GrammarDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_token: default_token(),
            macros: Vec::new(),
            class_sets: Vec::new(),
            brackets: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn default_token(mut self, class: impl Into<String>) -> Self {
        self.default_token = class.into();
        self
    }

    pub fn macro_pattern(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.macros.push((name.into(), pattern.into()));
        self
    }

    pub fn class_set<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = S>,
    ) -> Self {
        self.class_sets
            .push((name.into(), members.into_iter().map(Into::into).collect()));
        self
    }

    pub fn bracket(
        mut self,
        open: impl Into<String>,
        close: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.brackets.push(BracketDefinition {
            open: open.into(),
            close: close.into(),
            token: token.into(),
        });
        self
    }

    pub fn state(mut self, name: impl Into<String>, rules: Vec<RuleDefinition>) -> Self {
        self.states.push((name.into(), rules));
        self
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// (De)serializes a `Vec<(String, V)>` as a map, keeping entry order.
mod ordered_map {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_rule_shapes_from_json() {
        let grammar = GrammarDefinition::from_json(
            r#"{
                "name": "demo",
                "states": {
                    "root": [
                        { "include": "whitespace" },
                        { "regex": "let", "action": "keyword" },
                        ["[0-9]+", "number"],
                        ["/\\*", "comment", "@comment"]
                    ],
                    "whitespace": [["\\s+", "white"]]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(grammar.default_token, "invalid");
        assert_eq!(grammar.states[0].0, "root");
        assert_eq!(grammar.states[1].0, "whitespace");
        let rules: Vec<_> = grammar.states[0]
            .1
            .iter()
            .cloned()
            .map(RuleDefinition::into_canonical)
            .collect();
        assert_eq!(rules[0], RuleDefinition::include("whitespace"));
        assert_eq!(rules[1], RuleDefinition::new("let", "keyword"));
        assert_eq!(rules[2], RuleDefinition::new("[0-9]+", "number"));
        assert_eq!(
            rules[3],
            RuleDefinition::new("/\\*", ActionDefinition::token("comment").next("@comment"))
        );
    }

    #[test]
    fn cases_keep_document_order() {
        let action: ActionDefinition = serde_json::from_str(
            r#"{ "cases": { "@keywords": "keyword", "~[A-Z].*": "type", "@default": "identifier" } }"#,
        )
        .unwrap();
        let ActionDefinition::Cases { cases, .. } = action else {
            panic!("expected cases, got {action:?}");
        };
        let guards: Vec<_> = cases.iter().map(|(guard, _)| guard.as_str()).collect();
        assert_eq!(guards, vec!["@keywords", "~[A-Z].*", "@default"]);
    }

    #[test]
    fn token_action_with_bracket_and_param() {
        let action: ActionDefinition = serde_json::from_str(
            r#"{ "token": "delimiter.curly", "bracket": "@open", "next": "@block", "param": "$0" }"#,
        )
        .unwrap();
        assert_eq!(
            action,
            ActionDefinition::token("delimiter.curly")
                .open()
                .next("@block")
                .param("$0")
        );
    }

    #[test]
    fn parses_yaml() {
        let grammar = GrammarDefinition::from_yaml(
            r#"
name: demo
defaultToken: source
classSets:
  keywords: [fun, let]
states:
  root:
    - regex: "[a-z]+"
      action:
        cases:
          "@keywords": keyword
          "@default": identifier
"#,
        )
        .unwrap();
        assert_eq!(grammar.default_token, "source");
        assert_eq!(grammar.class_sets[0].1, vec!["fun", "let"]);
    }

    #[test]
    fn builder_and_json_agree() {
        let built = GrammarDefinition::new("demo")
            .macro_pattern("ident", "[a-z]+")
            .state("root", vec![RuleDefinition::new("@ident", "identifier")]);
        let json = built.to_json_pretty().unwrap();
        assert_eq!(GrammarDefinition::from_json(&json).unwrap(), built);
    }
}
