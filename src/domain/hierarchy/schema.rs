//! Normalisation of classification sources into a [`HierarchyNode`] tree.
//!
//! Four source shapes are supported. Rather than one transformer per shape, a
//! single transformer walks the source guided by a field-mapping table describing where
//! each shape keeps its groups, systems and subsystems and what their fields are
//! called.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HierarchyNode, Level};

/// The shape of a classification source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceSchema {
    /// A flat list of systems, each carrying `system_id` and an optional
    /// `group` title.
    ///
    /// ```json
    /// [{ "system_id": "21", "title": "Air conditioning", "group": "Airframe",
    ///    "subsystems": [{ "subsystem_id": "10", "title": "Compression" }] }]
    /// ```
    Flat,

    /// An object keyed by group title; systems and subsystems are either lists
    /// of records with a `code` or objects keyed by code.
    ///
    /// ```json
    /// { "Airframe": { "21": { "title": "Air conditioning",
    ///                         "subsystems": { "10": { "title": "Compression" } } } } }
    /// ```
    Legacy,

    /// General support vehicle groups, identified by letter.
    ///
    /// ```json
    /// { "gsv": [{ "letter": "A", "title": "Chassis",
    ///             "systems": [{ "sns": "10", "title": "Frame", "subsystems": [] }] }] }
    /// ```
    Gsv,

    /// Support categories, each holding its own systems.
    ///
    /// ```json
    /// { "categories": [{ "code": "GSE", "category": "Ground support equipment",
    ///                    "systems": [{ "code": "01", "name": "Tow bar" }] }] }
    /// ```
    SupportCategory,
}

impl SourceSchema {
    /// All supported schemas.
    pub const ALL: [Self; 4] = [Self::Flat, Self::Legacy, Self::Gsv, Self::SupportCategory];

    /// Picks the schema for a source from its file name, falling back to the
    /// shape of the parsed data.
    ///
    /// This is a sniff, not a validation: entries that do not fit the chosen
    /// schema are reported by [`build`].
    #[must_use]
    pub fn sniff(file_name: &str, data: &Value) -> Self {
        let name = file_name.to_lowercase();
        if name.contains("gsv") {
            return Self::Gsv;
        }
        if name.contains("support") {
            return Self::SupportCategory;
        }
        if name.contains("legacy") {
            return Self::Legacy;
        }

        match data {
            Value::Array(_) => Self::Flat,
            Value::Object(map) if map.contains_key("gsv") => Self::Gsv,
            Value::Object(map) if map.contains_key("categories") => Self::SupportCategory,
            _ => Self::Legacy,
        }
    }

    const fn mapping(self) -> &'static Mapping {
        match self {
            Self::Flat => &FLAT,
            Self::Legacy => &LEGACY,
            Self::Gsv => &GSV,
            Self::SupportCategory => &SUPPORT_CATEGORY,
        }
    }
}

impl fmt::Display for SourceSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flat => "flat",
            Self::Legacy => "legacy",
            Self::Gsv => "gsv",
            Self::SupportCategory => "support-category",
        })
    }
}

impl FromStr for SourceSchema {
    type Err = UnknownSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|schema| schema.to_string() == wanted)
            .ok_or_else(|| UnknownSchemaError(s.to_string()))
    }
}

/// Error returned when a schema name is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown source schema '{0}': expected one of flat, legacy, gsv, support-category")]
pub struct UnknownSchemaError(String);

/// Field names of one level's records.
#[derive(Debug)]
struct Fields {
    /// The key field; records without it are skipped.
    code: &'static str,
    title: &'static str,
    definition: &'static str,
}

/// Where a schema keeps its groups.
#[derive(Debug)]
enum Groups {
    /// The root is the system list; groups are collected from a title field on
    /// each system, in order of first appearance.
    FromSystemField {
        field: &'static str,
        fallback: &'static str,
    },
    /// The root object is keyed by group title.
    KeyedByTitle,
    /// The root object holds a list of group records.
    Listed {
        list: &'static str,
        /// The key field; groups without it are skipped.
        required: &'static str,
        code: Option<&'static str>,
        title: &'static str,
        definition: &'static str,
        systems: &'static str,
    },
}

/// The field-mapping descriptor for one schema.
#[derive(Debug)]
struct Mapping {
    groups: Groups,
    system: Fields,
    subsystems: &'static str,
    subsystem: Fields,
}

const FLAT: Mapping = Mapping {
    groups: Groups::FromSystemField {
        field: "group",
        fallback: "Ungrouped",
    },
    system: Fields {
        code: "system_id",
        title: "title",
        definition: "definition",
    },
    subsystems: "subsystems",
    subsystem: Fields {
        code: "subsystem_id",
        title: "title",
        definition: "definition",
    },
};

const LEGACY: Mapping = Mapping {
    groups: Groups::KeyedByTitle,
    system: Fields {
        code: "code",
        title: "title",
        definition: "definition",
    },
    subsystems: "subsystems",
    subsystem: Fields {
        code: "code",
        title: "title",
        definition: "definition",
    },
};

const GSV: Mapping = Mapping {
    groups: Groups::Listed {
        list: "gsv",
        required: "letter",
        code: Some("letter"),
        title: "title",
        definition: "definition",
        systems: "systems",
    },
    system: Fields {
        code: "sns",
        title: "title",
        definition: "definition",
    },
    subsystems: "subsystems",
    subsystem: Fields {
        code: "sns",
        title: "title",
        definition: "definition",
    },
};

const SUPPORT_CATEGORY: Mapping = Mapping {
    groups: Groups::Listed {
        list: "categories",
        required: "category",
        code: Some("code"),
        title: "category",
        definition: "description",
        systems: "systems",
    },
    system: Fields {
        code: "code",
        title: "name",
        definition: "description",
    },
    subsystems: "subsystems",
    subsystem: Fields {
        code: "code",
        title: "name",
        definition: "description",
    },
};

/// Why a source entry was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SkipReason {
    /// The entry lacks the schema's key field.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// The entry is not an object.
    #[error("expected an object, found {found}")]
    NotAnObject {
        /// JSON type found instead.
        found: String,
    },

    /// A collection of entries is neither a list nor an object.
    #[error("expected a list or an object, found {found}")]
    NotACollection {
        /// JSON type found instead.
        found: String,
    },
}

/// A source entry that was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// The level the entry would have become.
    pub level: Level,
    /// Location of the entry in the source, e.g. `gsv[1].systems[0]`.
    pub path: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// The outcome of building a tree: the nodes, plus every entry that was
/// skipped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// The top-level group nodes.
    pub nodes: Vec<HierarchyNode>,
    /// Entries left out because they did not fit the schema.
    pub skipped: Vec<Skipped>,
}

/// Builds a hierarchy tree from a parsed classification source.
///
/// Entries missing their key field are skipped and listed in the report rather
/// than failing the build; each skip is also logged as a warning.
#[must_use]
pub fn build(schema: SourceSchema, data: &Value) -> BuildReport {
    let mut builder = Builder {
        mapping: schema.mapping(),
        skipped: Vec::new(),
    };
    let nodes = builder.groups(data);

    for skipped in &builder.skipped {
        tracing::warn!(
            %schema,
            path = %skipped.path,
            level = ?skipped.level,
            "skipped entry: {}",
            skipped.reason
        );
    }

    BuildReport {
        nodes,
        skipped: builder.skipped,
    }
}

/// One entry of a collection: a list item, or an object member with its key.
struct Entry<'a> {
    key: Option<&'a str>,
    path: String,
    value: &'a Value,
}

struct Builder {
    mapping: &'static Mapping,
    skipped: Vec<Skipped>,
}

impl Builder {
    fn skip(&mut self, level: Level, path: String, reason: SkipReason) {
        self.skipped.push(Skipped {
            level,
            path,
            reason,
        });
    }

    /// Lists the entries of a collection, which may be a list or an object
    /// keyed by code.
    fn entries<'a>(&mut self, level: Level, path: &str, value: &'a Value) -> Vec<Entry<'a>> {
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, value)| Entry {
                    key: None,
                    path: index_path(path, index),
                    value,
                })
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| Entry {
                    key: Some(key.as_str()),
                    path: join_path(path, key),
                    value,
                })
                .collect(),
            Value::Null => Vec::new(),
            other => {
                self.skip(
                    level,
                    path.to_string(),
                    SkipReason::NotACollection {
                        found: type_name(other).to_string(),
                    },
                );
                Vec::new()
            }
        }
    }

    fn groups(&mut self, data: &Value) -> Vec<HierarchyNode> {
        let mapping = self.mapping;
        match &mapping.groups {
            Groups::FromSystemField { field, fallback } => {
                self.groups_from_system_field(data, field, fallback)
            }
            Groups::KeyedByTitle => self.groups_keyed_by_title(data),
            Groups::Listed {
                list,
                required,
                code,
                title,
                definition,
                systems,
            } => {
                let Some(groups) = data.get(list) else {
                    self.skip(
                        Level::Group,
                        "$".to_string(),
                        SkipReason::MissingField {
                            field: (*list).to_string(),
                        },
                    );
                    return Vec::new();
                };
                let mut nodes = Vec::new();
                for entry in self.entries(Level::Group, list, groups) {
                    let Some(record) = self.record(Level::Group, &entry) else {
                        continue;
                    };
                    let Some(key) = text(record.get(*required)) else {
                        self.skip(
                            Level::Group,
                            entry.path,
                            SkipReason::MissingField {
                                field: (*required).to_string(),
                            },
                        );
                        continue;
                    };
                    let group_code = code.and_then(|field| text(record.get(field)));
                    let group_title = text(record.get(*title)).unwrap_or_else(|| key.clone());
                    let systems_path = join_path(&entry.path, systems);
                    let children = record
                        .get(*systems)
                        .map(|value| self.systems(&systems_path, value))
                        .unwrap_or_default();
                    nodes.push(HierarchyNode::group(
                        group_code.unwrap_or_default(),
                        group_title,
                        text(record.get(*definition)).unwrap_or_default(),
                        children,
                    ));
                }
                nodes
            }
        }
    }

    fn groups_from_system_field(
        &mut self,
        data: &Value,
        field: &str,
        fallback: &str,
    ) -> Vec<HierarchyNode> {
        let mut groups: Vec<(String, Vec<HierarchyNode>)> = Vec::new();

        for entry in self.entries(Level::System, "$", data) {
            let Some(record) = self.record(Level::System, &entry) else {
                continue;
            };
            let group_title = text(record.get(field)).unwrap_or_else(|| fallback.to_string());
            let Some(system) = self.system(&entry) else {
                continue;
            };
            match groups.iter_mut().find(|(title, _)| *title == group_title) {
                Some((_, systems)) => systems.push(system),
                None => groups.push((group_title, vec![system])),
            }
        }

        groups
            .into_iter()
            .map(|(title, systems)| HierarchyNode::group("", title, "", systems))
            .collect()
    }

    fn groups_keyed_by_title(&mut self, data: &Value) -> Vec<HierarchyNode> {
        let Value::Object(map) = data else {
            self.skip(
                Level::Group,
                "$".to_string(),
                SkipReason::NotAnObject {
                    found: type_name(data).to_string(),
                },
            );
            return Vec::new();
        };

        map.iter()
            .map(|(title, systems)| {
                let children = self.systems(title, systems);
                HierarchyNode::group("", title.clone(), "", children)
            })
            .collect()
    }

    fn systems(&mut self, path: &str, value: &Value) -> Vec<HierarchyNode> {
        self.entries(Level::System, path, value)
            .iter()
            .filter_map(|entry| self.system(entry))
            .collect()
    }

    fn system(&mut self, entry: &Entry<'_>) -> Option<HierarchyNode> {
        let mapping = self.mapping;
        let fields = &mapping.system;
        let record = self.record(Level::System, entry)?;
        let code = self.code(Level::System, entry, record, fields.code)?;

        let subsystems_path = join_path(&entry.path, mapping.subsystems);
        let subsystems = record
            .get(mapping.subsystems)
            .map(|value| self.subsystems(&code, &subsystems_path, value))
            .unwrap_or_default();

        Some(HierarchyNode::system(
            code,
            text(record.get(fields.title)).unwrap_or_default(),
            text(record.get(fields.definition)).unwrap_or_default(),
            subsystems,
        ))
    }

    fn subsystems(&mut self, system_code: &str, path: &str, value: &Value) -> Vec<HierarchyNode> {
        let mapping = self.mapping;
        let fields = &mapping.subsystem;
        let mut nodes = Vec::new();
        for entry in self.entries(Level::Subsystem, path, value) {
            let Some(record) = self.record(Level::Subsystem, &entry) else {
                continue;
            };
            let Some(code) = self.code(Level::Subsystem, &entry, record, fields.code) else {
                continue;
            };
            nodes.push(HierarchyNode::subsystem(
                system_code,
                code,
                text(record.get(fields.title)).unwrap_or_default(),
                text(record.get(fields.definition)).unwrap_or_default(),
            ));
        }
        nodes
    }

    fn record<'a>(
        &mut self,
        level: Level,
        entry: &Entry<'a>,
    ) -> Option<&'a serde_json::Map<String, Value>> {
        if let Value::Object(record) = entry.value {
            Some(record)
        } else {
            self.skip(
                level,
                entry.path.clone(),
                SkipReason::NotAnObject {
                    found: type_name(entry.value).to_string(),
                },
            );
            None
        }
    }

    /// The record's key field, falling back to the object key it was stored
    /// under.
    fn code(
        &mut self,
        level: Level,
        entry: &Entry<'_>,
        record: &serde_json::Map<String, Value>,
        field: &str,
    ) -> Option<String> {
        let code = text(record.get(field)).or_else(|| entry.key.map(str::to_string));
        if code.is_none() {
            self.skip(
                level,
                entry.path.clone(),
                SkipReason::MissingField {
                    field: field.to_string(),
                },
            );
        }
        code
    }
}

/// A non-empty string or number field, as text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn index_path(path: &str, index: usize) -> String {
    if path == "$" {
        format!("[{index}]")
    } else {
        format!("{path}[{index}]")
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path == "$" {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
