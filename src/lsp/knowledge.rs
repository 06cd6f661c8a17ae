//! Knowledge base: the static SDK dictionary behind the fallback tier.
//!
//! Maps a dotted namespace (`kfp.dsl`) to its known members and one-line
//! docs. The table is data, not code: the default ships as
//! `data/knowledge.yaml` and a deployment can point the config at another
//! file with the same schema. Loaded once, never mutated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{Symbol, SymbolKind};

const DEFAULT_TABLE: &str = include_str!("../../data/knowledge.yaml");

/// Highest table version this build understands.
pub const TABLE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid knowledge table: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported table version {0} (max {TABLE_VERSION})")]
    Version(u32),

    #[error("invalid namespace path '{0}'")]
    InvalidNamespace(String),

    #[error("namespace '{namespace}' is not rooted in sdk '{sdk}'")]
    ForeignNamespace { namespace: String, sdk: String },

    #[error("duplicate namespace '{0}'")]
    DuplicateNamespace(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

#[derive(Debug, Deserialize)]
struct Table {
    version: u32,
    #[serde(default)]
    sdks: Vec<SdkSpec>,
}

#[derive(Debug, Deserialize)]
struct SdkSpec {
    name: String,
    markers: Vec<String>,
    #[serde(default)]
    roots: Vec<String>,
    #[serde(default)]
    namespaces: Vec<NamespaceSpec>,
}

#[derive(Debug, Deserialize)]
struct NamespaceSpec {
    path: String,
    #[serde(default)]
    members: Vec<Member>,
}

/// One known member of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub doc: String,
}

/// A recognized SDK and the import markers that activate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdk {
    pub name: String,
    pub markers: Vec<String>,
}

impl Sdk {
    /// Whether `source` contains one of this SDK's import markers.
    pub fn is_imported_by(&self, source: &str) -> bool {
        self.markers.iter().any(|m| source.contains(m.as_str()))
    }
}

#[derive(Debug)]
struct Namespace {
    sdk: usize,
    members: Vec<Member>,
}

/// Process-wide, immutable SDK dictionary.
#[derive(Debug)]
pub struct KnowledgeBase {
    version: u32,
    sdks: Vec<Sdk>,
    namespaces: HashMap<String, Namespace>,
}

impl KnowledgeBase {
    /// The table compiled into the binary.
    pub fn builtin() -> KnowledgeResult<Self> {
        Self::from_yaml(DEFAULT_TABLE)
    }

    /// Load a table from disk.
    pub fn load(path: &Path) -> KnowledgeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> KnowledgeResult<Self> {
        let table: Table = serde_yaml::from_str(content)?;
        if table.version > TABLE_VERSION {
            return Err(KnowledgeError::Version(table.version));
        }

        let mut sdks = Vec::with_capacity(table.sdks.len());
        let mut namespaces = HashMap::new();

        for (idx, spec) in table.sdks.into_iter().enumerate() {
            let roots = if spec.roots.is_empty() {
                vec![spec.name.clone()]
            } else {
                spec.roots
            };

            for ns in spec.namespaces {
                if !is_dotted_path(&ns.path) {
                    return Err(KnowledgeError::InvalidNamespace(ns.path));
                }
                let root = ns.path.split('.').next().unwrap_or_default();
                if !roots.iter().any(|r| r == root) {
                    return Err(KnowledgeError::ForeignNamespace {
                        namespace: ns.path,
                        sdk: spec.name,
                    });
                }
                if namespaces.contains_key(&ns.path) {
                    return Err(KnowledgeError::DuplicateNamespace(ns.path));
                }
                namespaces.insert(
                    ns.path,
                    Namespace {
                        sdk: idx,
                        members: ns.members,
                    },
                );
            }

            sdks.push(Sdk {
                name: spec.name,
                markers: spec.markers,
            });
        }

        Ok(Self {
            version: table.version,
            sdks,
            namespaces,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn sdks(&self) -> &[Sdk] {
        &self.sdks
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// Every import marker of every SDK.
    pub fn import_markers(&self) -> Vec<String> {
        self.sdks
            .iter()
            .flat_map(|s| s.markers.iter().cloned())
            .collect()
    }

    /// Whether `source` imports any known SDK.
    pub fn has_import_marker(&self, source: &str) -> bool {
        self.sdks.iter().any(|s| s.is_imported_by(source))
    }

    /// SDKs whose import markers appear in `source`.
    pub fn active_sdks<'a>(&'a self, source: &str) -> Vec<&'a Sdk> {
        self.sdks.iter().filter(|s| s.is_imported_by(source)).collect()
    }

    /// The SDK a namespace belongs to.
    pub fn sdk_of(&self, namespace: &str) -> Option<&Sdk> {
        let ns = self.namespaces.get(namespace)?;
        self.sdks.get(ns.sdk)
    }

    pub fn member(&self, namespace: &str, name: &str) -> Option<&Member> {
        self.namespaces
            .get(namespace)?
            .members
            .iter()
            .find(|m| m.name == name)
    }

    /// Members of `namespace` starting with `prefix`, in table order.
    /// Unknown namespaces yield nothing.
    pub fn lookup(&self, namespace: &str, prefix: &str) -> Vec<Symbol> {
        let Some(ns) = self.namespaces.get(namespace) else {
            return Vec::new();
        };
        let detail = self
            .sdks
            .get(ns.sdk)
            .map(|s| s.name.clone())
            .unwrap_or_default();

        ns.members
            .iter()
            .filter(|m| prefix.is_empty() || m.name.starts_with(prefix))
            .map(|m| Symbol {
                name: m.name.clone(),
                kind: kind_for_member(&m.name),
                detail: detail.clone(),
                documentation: if m.doc.is_empty() {
                    format!("{namespace}.{}", m.name)
                } else {
                    m.doc.clone()
                },
                insert_text: m.name.clone(),
            })
            .collect()
    }
}

/// Uppercase first letter reads as a class, anything else as a function.
pub fn kind_for_member(name: &str) -> SymbolKind {
    if name.chars().next().is_some_and(char::is_uppercase) {
        SymbolKind::Class
    } else {
        SymbolKind::Function
    }
}

fn is_dotted_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|seg| {
            let mut chars = seg.chars();
            chars
                .next()
                .is_some_and(|c| c == '_' || c.is_alphabetic())
                && chars.all(|c| c == '_' || c.is_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin().unwrap()
    }

    // ── Loading ──

    #[test]
    fn builtin_table_loads() {
        let kb = kb();
        assert_eq!(kb.version(), 1);
        assert!(kb.sdks().iter().any(|s| s.name == "kfp"));
        assert!(kb.namespace_count() >= 9);
    }

    #[test]
    fn aliases_share_members() {
        let kb = kb();
        assert_eq!(kb.lookup("np", ""), kb.lookup("numpy", ""));
        assert_eq!(kb.sdk_of("pd").map(|s| s.name.as_str()), Some("pandas"));
    }

    #[test]
    fn rejects_foreign_namespace() {
        let yaml = r#"
version: 1
sdks:
  - name: kfp
    markers: ["import kfp"]
    namespaces:
      - path: numpy
        members: []
"#;
        assert!(matches!(
            KnowledgeBase::from_yaml(yaml),
            Err(KnowledgeError::ForeignNamespace { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_namespace() {
        let yaml = r#"
version: 1
sdks:
  - name: kfp
    markers: ["import kfp"]
    namespaces:
      - path: kfp
      - path: kfp
"#;
        assert!(matches!(
            KnowledgeBase::from_yaml(yaml),
            Err(KnowledgeError::DuplicateNamespace(_))
        ));
    }

    #[test]
    fn rejects_bad_path_and_future_version() {
        let bad_path = "version: 1\nsdks:\n  - name: x\n    markers: []\n    namespaces:\n      - path: \"x..y\"\n";
        assert!(matches!(
            KnowledgeBase::from_yaml(bad_path),
            Err(KnowledgeError::InvalidNamespace(_))
        ));
        assert!(matches!(
            KnowledgeBase::from_yaml("version: 2\nsdks: []\n"),
            Err(KnowledgeError::Version(2))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.yaml");
        std::fs::write(
            &path,
            "version: 1\nsdks:\n  - name: acme\n    markers: [\"import acme\"]\n    namespaces:\n      - path: acme\n        members:\n          - { name: Rocket }\n",
        )
        .unwrap();
        let kb = KnowledgeBase::load(&path).unwrap();
        let syms = kb.lookup("acme", "");
        assert_eq!(syms.len(), 1);
        assert_eq!(syms[0].kind, SymbolKind::Class);
        assert_eq!(syms[0].documentation, "acme.Rocket");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = KnowledgeBase::load(Path::new("/nonexistent/kb.yaml")).unwrap_err();
        assert!(matches!(err, KnowledgeError::Io { .. }));
    }

    // ── Lookup ──

    #[test]
    fn lookup_empty_prefix_matches_all() {
        let names: Vec<String> = kb().lookup("kfp", "").into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["dsl", "components", "client", "compiler", "v2"]);
    }

    #[test]
    fn lookup_filters_by_prefix() {
        let syms = kb().lookup("kfp.dsl", "Pi");
        let names: Vec<&str> = syms.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Pipeline", "PipelineParam"]);
        assert!(syms.iter().all(|s| s.kind == SymbolKind::Class));
        assert!(syms.iter().all(|s| s.detail == "kfp"));
    }

    #[test]
    fn lookup_unknown_namespace_is_empty() {
        assert!(kb().lookup("kfp.nope", "").is_empty());
        assert!(kb().lookup("", "").is_empty());
    }

    #[test]
    fn member_kind_convention() {
        assert_eq!(kind_for_member("Client"), SymbolKind::Class);
        assert_eq!(kind_for_member("client"), SymbolKind::Function);
        assert_eq!(kind_for_member("_private"), SymbolKind::Function);
    }

    #[test]
    fn markers_activate_sdks() {
        let kb = kb();
        assert!(kb.has_import_marker("import kfp\n"));
        assert!(kb.has_import_marker("from kfp import dsl\n"));
        assert!(!kb.has_import_marker("x = 1\n"));
        let active: Vec<&str> = kb
            .active_sdks("import numpy as np\nimport os\n")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(active, ["numpy", "os"]);
    }

    #[test]
    fn member_lookup() {
        let kb = kb();
        let m = kb.member("kfp.dsl", "pipeline").unwrap();
        assert!(m.doc.contains("pipeline"));
        assert!(kb.member("kfp.dsl", "nothing").is_none());
    }
}
