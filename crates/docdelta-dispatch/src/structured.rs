//! Schema-aware comparison of structured XML documents.
//!
//! A comparator reduces each document to named entities grouped by
//! category, then diffs every category with the shared keyed-map diff.

use std::collections::BTreeMap;

use docdelta_diff::{diff_maps, MapDiff};
use roxmltree::{Document, Node};
use serde::Serialize;

use crate::classify::{is_ipxact_namespace, Schema};

/// The fields of one named entity (e.g. a register's offset and size).
pub type Entity = BTreeMap<String, String>;

/// Changes within one entity category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryDiff {
    pub category: String,
    pub changes: MapDiff<String, Entity>,
}

/// Result of a structured comparison. Only categories with changes appear.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructuredDiff {
    pub schema: Schema,
    pub categories: Vec<CategoryDiff>,
}

impl StructuredDiff {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            categories: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.changes.is_empty())
    }

    /// Total number of entity changes across all categories.
    pub fn change_count(&self) -> usize {
        self.categories.iter().map(|c| c.changes.len()).sum()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryDiff> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// A schema-specific document comparator.
pub trait StructuredComparator: Send + Sync {
    /// The schema this comparator understands.
    fn schema(&self) -> Schema;

    /// Compare two parsed documents of this schema.
    fn compare(&self, old: &Document<'_>, new: &Document<'_>) -> Result<StructuredDiff, String>;
}

/// Where an entity field's value comes from, relative to the entity element.
#[derive(Clone, Copy, Debug)]
enum Field {
    /// Text of the element reached by following this child path.
    Text(&'static str, &'static [&'static str]),
    /// `vendor:library:name:version` from the attributes of this child.
    VlnvRef(&'static str, &'static str),
    /// Local name of the first child element present from this list.
    OneOf(&'static str, &'static [&'static str]),
}

/// One entity category: the element that defines an entity and the
/// fields compared for it.
struct Category {
    name: &'static str,
    element: &'static str,
    fields: &'static [Field],
}

const CATEGORIES: &[Category] = &[
    Category {
        name: "parameter",
        element: "parameter",
        fields: &[Field::Text("value", &["value"])],
    },
    Category {
        name: "port",
        element: "port",
        fields: &[
            Field::Text("direction", &["wire", "direction"]),
            Field::Text("left", &["wire", "vector", "left"]),
            Field::Text("right", &["wire", "vector", "right"]),
        ],
    },
    Category {
        name: "bus_interface",
        element: "busInterface",
        fields: &[
            Field::VlnvRef("bus_type", "busType"),
            Field::VlnvRef("abstraction_type", "abstractionType"),
            Field::OneOf(
                "mode",
                &[
                    "master",
                    "slave",
                    "system",
                    "mirroredMaster",
                    "mirroredSlave",
                    "mirroredSystem",
                    "monitor",
                    "initiator",
                    "target",
                    "mirroredInitiator",
                    "mirroredTarget",
                ],
            ),
        ],
    },
    Category {
        name: "address_space",
        element: "addressSpace",
        fields: &[
            Field::Text("range", &["range"]),
            Field::Text("width", &["width"]),
        ],
    },
    Category {
        name: "address_block",
        element: "addressBlock",
        fields: &[
            Field::Text("base_address", &["baseAddress"]),
            Field::Text("range", &["range"]),
            Field::Text("width", &["width"]),
            Field::Text("usage", &["usage"]),
        ],
    },
    Category {
        name: "register",
        element: "register",
        fields: &[
            Field::Text("address_offset", &["addressOffset"]),
            Field::Text("size", &["size"]),
            Field::Text("access", &["access"]),
            Field::Text("reset", &["reset", "value"]),
        ],
    },
    Category {
        name: "field",
        element: "field",
        fields: &[
            Field::Text("bit_offset", &["bitOffset"]),
            Field::Text("bit_width", &["bitWidth"]),
            Field::Text("access", &["access"]),
        ],
    },
    Category {
        name: "component_instance",
        element: "componentInstance",
        fields: &[
            Field::VlnvRef("component_ref", "componentRef"),
            Field::Text("instance_name", &["instanceName"]),
        ],
    },
];

/// Structured comparator for IP-XACT (IEEE 1685) documents.
///
/// Categories: the root document's VLNV identity, parameters, ports, bus
/// interfaces, address spaces, address blocks, registers, register fields,
/// and component instances. Entities are keyed by the chain of `name`s of
/// their enclosing named elements, so two registers called `CTRL` in
/// different address blocks stay distinct.
#[derive(Clone, Copy, Debug, Default)]
pub struct IpXactComparator;

impl IpXactComparator {
    pub fn new() -> Self {
        Self
    }

    fn extract(&self, doc: &Document<'_>) -> BTreeMap<&'static str, BTreeMap<String, Entity>> {
        let mut out = BTreeMap::new();
        let root = doc.root_element();

        let mut identity = Entity::new();
        for part in ["vendor", "library", "name", "version"] {
            if let Some(text) = child_text(root, &[part]) {
                identity.insert(part.to_string(), text);
            }
        }
        let mut doc_entities = BTreeMap::new();
        doc_entities.insert(root.tag_name().name().to_string(), identity);
        out.insert("document", doc_entities);

        for category in CATEGORIES {
            let mut entities = BTreeMap::new();
            for node in root
                .descendants()
                .filter(|n| is_ipxact_element(*n, category.element))
            {
                let base = entity_key(node);
                let mut key = base.clone();
                let mut n = 2;
                while entities.contains_key(&key) {
                    key = format!("{base}#{n}");
                    n += 1;
                }
                entities.insert(key, entity_fields(node, category.fields));
            }
            out.insert(category.name, entities);
        }
        out
    }
}

impl StructuredComparator for IpXactComparator {
    fn schema(&self) -> Schema {
        Schema::IpXact
    }

    fn compare(&self, old: &Document<'_>, new: &Document<'_>) -> Result<StructuredDiff, String> {
        for (side, doc) in [("old", old), ("new", new)] {
            let root = doc.root_element();
            if !root.tag_name().namespace().is_some_and(is_ipxact_namespace) {
                return Err(format!("{side} document is not IP-XACT"));
            }
        }

        let mut old_cats = self.extract(old);
        let mut new_cats = self.extract(new);
        let names: Vec<&'static str> = std::iter::once("document")
            .chain(CATEGORIES.iter().map(|c| c.name))
            .collect();

        let mut diff = StructuredDiff::new(Schema::IpXact);
        for name in names {
            let a = old_cats.remove(name).unwrap_or_default();
            let b = new_cats.remove(name).unwrap_or_default();
            let changes = diff_maps(&a, &b);
            if !changes.is_empty() {
                diff.categories.push(CategoryDiff {
                    category: name.to_string(),
                    changes,
                });
            }
        }
        Ok(diff)
    }
}

fn is_ipxact_element(node: Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace().is_some_and(is_ipxact_namespace)
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_ipxact_element(*c, local))
}

fn child_text(node: Node<'_, '_>, path: &[&str]) -> Option<String> {
    let mut current = node;
    for step in path {
        current = child_element(current, step)?;
    }
    current.text().map(|t| t.trim().to_string())
}

fn vlnv_attributes(node: Node<'_, '_>) -> String {
    ["vendor", "library", "name", "version"]
        .iter()
        .map(|attr| {
            node.attributes()
                .find(|a| a.name() == *attr)
                .map(|a| a.value())
                .unwrap_or("")
        })
        .collect::<Vec<_>>()
        .join(":")
}

fn entity_fields(node: Node<'_, '_>, fields: &[Field]) -> Entity {
    let mut entity = Entity::new();
    for field in fields {
        let (name, value) = match *field {
            Field::Text(name, path) => (name, child_text(node, path)),
            Field::VlnvRef(name, child) => (name, child_element(node, child).map(vlnv_attributes)),
            Field::OneOf(name, options) => (
                name,
                options
                    .iter()
                    .find(|o| child_element(node, o).is_some())
                    .map(|o| o.to_string()),
            ),
        };
        if let Some(value) = value {
            entity.insert(name.to_string(), value);
        }
    }
    entity
}

/// `/`-joined names of the node and its named ancestors below the root.
fn entity_key(node: Node<'_, '_>) -> String {
    let mut parts: Vec<String> = node
        .ancestors()
        .filter(|n| n.is_element() && n.parent_element().is_some())
        .filter_map(|n| child_text(n, &["name"]).or_else(|| child_text(n, &["instanceName"])))
        .collect();
    if parts.is_empty() {
        parts.push(format!("@{}", node.range().start));
    }
    parts.reverse();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdelta_diff::MapChange;

    fn component(registers: &str, params: &str) -> String {
        format!(
            r#"<spirit:component xmlns:spirit="http://www.spiritconsortium.org/XMLSchema/SPIRIT/1685-2014">
  <spirit:vendor>acme</spirit:vendor>
  <spirit:library>ip</spirit:library>
  <spirit:name>uart</spirit:name>
  <spirit:version>1.0</spirit:version>
  <spirit:busInterfaces>
    <spirit:busInterface>
      <spirit:name>apb</spirit:name>
      <spirit:busType spirit:vendor="amba.com" spirit:library="AMBA3" spirit:name="APB" spirit:version="r1p0"/>
      <spirit:slave/>
    </spirit:busInterface>
  </spirit:busInterfaces>
  <spirit:memoryMaps>
    <spirit:memoryMap>
      <spirit:name>regs</spirit:name>
      <spirit:addressBlock>
        <spirit:name>main</spirit:name>
        <spirit:baseAddress>0x0</spirit:baseAddress>
        <spirit:range>4096</spirit:range>
        <spirit:width>32</spirit:width>
        {registers}
      </spirit:addressBlock>
    </spirit:memoryMap>
  </spirit:memoryMaps>
  <spirit:parameters>{params}</spirit:parameters>
</spirit:component>"#
        )
    }

    fn register(name: &str, offset: &str) -> String {
        format!(
            "<spirit:register><spirit:name>{name}</spirit:name>\
             <spirit:addressOffset>{offset}</spirit:addressOffset>\
             <spirit:size>32</spirit:size></spirit:register>"
        )
    }

    fn param(name: &str, value: &str) -> String {
        format!("<spirit:parameter><spirit:name>{name}</spirit:name><spirit:value>{value}</spirit:value></spirit:parameter>")
    }

    fn compare(old: &str, new: &str) -> StructuredDiff {
        let a = Document::parse(old).unwrap();
        let b = Document::parse(new).unwrap();
        IpXactComparator::new().compare(&a, &b).unwrap()
    }

    #[test]
    fn identical_documents_have_no_changes() {
        let xml = component(&register("CTRL", "0x0"), &param("DEPTH", "16"));
        let diff = compare(&xml, &xml);
        assert!(diff.is_empty());
        assert_eq!(diff.change_count(), 0);
    }

    #[test]
    fn register_added_removed_and_modified() {
        let old = component(
            &(register("CTRL", "0x0") + &register("STATUS", "0x4")),
            &param("DEPTH", "16"),
        );
        let new = component(
            &(register("CTRL", "0x8") + &register("IRQ", "0xC")),
            &param("DEPTH", "16"),
        );

        let diff = compare(&old, &new);
        let regs = diff.category("register").unwrap();
        assert_eq!(regs.changes.additions(), 1);
        assert_eq!(regs.changes.removals(), 1);
        assert_eq!(regs.changes.modifications(), 1);

        let modified = regs
            .changes
            .changes
            .iter()
            .find(|c| matches!(c, MapChange::Modified { .. }))
            .unwrap();
        assert_eq!(modified.key(), "regs/main/CTRL");
        if let MapChange::Modified { old, new, .. } = modified {
            assert_eq!(old["address_offset"], "0x0");
            assert_eq!(new["address_offset"], "0x8");
        }
        assert!(diff.category("parameter").is_none());
    }

    #[test]
    fn parameter_value_change() {
        let old = component("", &param("DEPTH", "16"));
        let new = component("", &param("DEPTH", "32"));
        let diff = compare(&old, &new);
        assert_eq!(diff.change_count(), 1);
        assert_eq!(diff.category("parameter").unwrap().changes.modifications(), 1);
    }

    #[test]
    fn bus_interface_fields() {
        let xml = component("", "");
        let doc = Document::parse(&xml).unwrap();
        let cats = IpXactComparator::new().extract(&doc);
        let apb = &cats["bus_interface"]["apb"];
        assert_eq!(apb["bus_type"], "amba.com:AMBA3:APB:r1p0");
        assert_eq!(apb["mode"], "slave");
        assert_eq!(cats["document"]["component"]["version"], "1.0");
    }

    #[test]
    fn version_bump_is_a_document_modification() {
        let old = component("", "");
        let new = old.replace("<spirit:version>1.0</spirit:version>", "<spirit:version>1.1</spirit:version>");
        let diff = compare(&old, &new);
        assert_eq!(diff.category("document").unwrap().changes.modifications(), 1);
    }

    #[test]
    fn non_ipxact_document_is_rejected() {
        let a = Document::parse("<component/>").unwrap();
        let err = IpXactComparator::new().compare(&a, &a).unwrap_err();
        assert!(err.contains("not IP-XACT"));
    }
}
