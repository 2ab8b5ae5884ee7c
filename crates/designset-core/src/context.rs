//! Page context assembled for one render.
//!
//! The context is a JSON object with the sections `page`, `shop`, `url`,
//! `member`, `cart`, `makeshop`, `config`, any top-level keys from
//! `data.json`, and finally `module`. `module` never lives inside a
//! [`PageContext`]; it is attached by [`PageContext::finish`] once every
//! other section is final, so module templates cannot see each other.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::value::{MergeError, deep_merge_value};

/// Key under which pre-rendered modules are exposed to the main template.
pub const MODULE_KEY: &str = "module";

/// Key under which `config.json` is exposed.
pub const CONFIG_KEY: &str = "config";

/// Mutable context for a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    root: Map<String, Value>,
}

impl PageContext {
    /// Create a context seeded with the static storefront defaults.
    ///
    /// Only asset URLs depend on the design-set name.
    #[must_use]
    pub fn with_defaults(design_set: &str) -> Self {
        let defaults = json!({
            "page": {
                "title": "デザインテンプレート開発環境",
                "description": "MakeShop デザインテンプレート開発環境",
                "css": format!("/designsets/{design_set}/standard/css/common.css"),
                "javascript": format!("/designsets/{design_set}/standard/js/common.js"),
                "canonical_url": "http://localhost:8080"
            },
            "shop": {
                "name": "サンプルショップ",
                "copyright": "© 2024 Sample Shop",
                "address": "東京都渋谷区",
                "tel": "03-1234-5678",
                "favicon_url": "/favicon.ico",
                "logo_url": "",
                "is_point_enabled": true,
                "is_member_entry_enabled": true
            },
            "url": {
                "top": "/",
                "cart": "/cart",
                "login": "/login",
                "logout": "/logout",
                "member_entry": "/member_entry",
                "mypage": "/mypage",
                "favorite": "/favorite",
                "company": "/company",
                "contract": "/contract",
                "policy": "/policy",
                "guide": "/guide",
                "support": "/support",
                "news": "/news",
                "mail_magazine": "/mail_magazine"
            },
            "member": {
                "is_logged_in": false
            },
            "cart": {
                "has_item": false,
                "total_quantity": 0
            },
            "makeshop": {
                "head": "",
                "body_top": "",
                "body_bottom": ""
            }
        });

        match defaults {
            Value::Object(root) => Self { root },
            _ => unreachable!("defaults literal is an object"),
        }
    }

    /// Shallow-merge top-level keys of `data.json` into the context.
    pub fn merge_data(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            self.root.insert(key, value);
        }
    }

    /// Expose `config.json` under the `config` key.
    ///
    /// An empty settings object leaves the context unchanged.
    pub fn set_config(&mut self, config: Map<String, Value>) {
        if !config.is_empty() {
            self.root.insert(CONFIG_KEY.to_string(), Value::Object(config));
        }
    }

    /// Deep-merge caller supplied overrides; they win over everything loaded so far.
    pub fn apply_overrides(&mut self, overrides: Value) -> Result<(), MergeError> {
        deep_merge_value(&mut self.root, overrides)
    }

    /// Append markup to the `makeshop.head` injection slot.
    pub fn append_head(&mut self, markup: &str) {
        let makeshop = self
            .root
            .entry("makeshop")
            .or_insert_with(|| Value::Object(Map::new()));
        if !makeshop.is_object() {
            *makeshop = Value::Object(Map::new());
        }
        let Value::Object(slots) = makeshop else {
            return;
        };

        match slots.get_mut("head") {
            Some(Value::String(head)) => head.push_str(markup),
            _ => {
                slots.insert("head".to_string(), Value::String(markup.to_string()));
            }
        }
    }

    /// Look up a top-level section.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Look up a value by dotted path, e.g. `shop.name`.
    #[must_use]
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Snapshot used to render modules: everything except `module`.
    #[must_use]
    pub fn module_scope(&self) -> Value {
        let mut root = self.root.clone();
        root.remove(MODULE_KEY);
        Value::Object(root)
    }

    /// Attach the rendered modules and produce the final template namespace.
    #[must_use]
    pub fn finish(self, modules: BTreeMap<String, String>) -> Value {
        let mut root = self.root;
        let modules: Map<String, Value> = modules
            .into_iter()
            .map(|(name, html)| (name, Value::String(html)))
            .collect();
        root.insert(MODULE_KEY.to_string(), Value::Object(modules));
        Value::Object(root)
    }
}
