use indexmap::IndexMap;
use roxmltree::{Document, ParsingOptions};

use crate::error::{PathwayError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    Gene,
    Enzyme,
    Compound,
    Other,
}

impl EntryType {
    fn from_kgml(value: &str) -> Self {
        match value {
            "gene" => EntryType::Gene,
            "enzyme" => EntryType::Enzyme,
            "compound" => EntryType::Compound,
            _ => EntryType::Other,
        }
    }

    /// Only these entry types become graph nodes.
    pub fn is_retained(self) -> bool {
        !matches!(self, EntryType::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Gene => "gene",
            EntryType::Enzyme => "enzyme",
            EntryType::Compound => "compound",
            EntryType::Other => "other",
        }
    }
}

/// Geometry of an entry on the reference KEGG map. `x`/`y` is the centre.
#[derive(Clone, Debug, PartialEq)]
pub struct Graphics {
    pub name: Option<String>,
    pub shape: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub fgcolor: Option<String>,
    pub bgcolor: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathwayEntry {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub entry_type: EntryType,
    pub link: Option<String>,
    pub graphics: Option<Graphics>,
}

impl PathwayEntry {
    /// Display name: the graphics-level name when it is present and not blank,
    /// otherwise the raw entry name.
    pub fn label(&self) -> &str {
        self.graphics
            .as_ref()
            .and_then(|g| g.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationSubtype {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathwayRelation {
    pub entry1: String,
    pub entry2: String,
    pub relation_type: String,
    pub subtypes: Vec<RelationSubtype>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pathway {
    pub name: String,
    pub org: String,
    pub number: String,
    pub title: String,
    pub entries: IndexMap<String, PathwayEntry>,
    pub relations: Vec<PathwayRelation>,
}

impl Pathway {
    pub fn entry(&self, id: &str) -> Option<&PathwayEntry> {
        self.entries.get(id)
    }
}

/// Parse a KGML document. Relations whose endpoints do not name an entry in
/// the document are dropped.
pub fn parse_kgml(xml: &str) -> Result<Pathway> {
    // KGML files carry a DOCTYPE pointing at the KEGG DTD.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|err| PathwayError::Parse(err.to_string()))?;
    let root = doc.root_element();
    if !root.has_tag_name("pathway") {
        return Err(PathwayError::Parse(format!(
            "expected <pathway> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut pathway = Pathway {
        name: root.attribute("name").unwrap_or_default().to_string(),
        org: root.attribute("org").unwrap_or_default().to_string(),
        number: root.attribute("number").unwrap_or_default().to_string(),
        title: root.attribute("title").unwrap_or_default().to_string(),
        ..Pathway::default()
    };

    for node in root.children().filter(|node| node.has_tag_name("entry")) {
        let entry = parse_entry(&node)?;
        pathway.entries.insert(entry.id.clone(), entry);
    }

    for node in root.children().filter(|node| node.has_tag_name("relation")) {
        let (Some(entry1), Some(entry2)) = (node.attribute("entry1"), node.attribute("entry2"))
        else {
            continue;
        };
        if !pathway.entries.contains_key(entry1) || !pathway.entries.contains_key(entry2) {
            continue;
        }
        let subtypes = node
            .children()
            .filter(|child| child.has_tag_name("subtype"))
            .map(|child| RelationSubtype {
                name: child.attribute("name").unwrap_or_default().to_string(),
                value: child.attribute("value").unwrap_or_default().to_string(),
            })
            .collect();
        pathway.relations.push(PathwayRelation {
            entry1: entry1.to_string(),
            entry2: entry2.to_string(),
            relation_type: node.attribute("type").unwrap_or_default().to_string(),
            subtypes,
        });
    }

    Ok(pathway)
}

fn parse_entry(node: &roxmltree::Node) -> Result<PathwayEntry> {
    let id = node
        .attribute("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PathwayError::Parse("entry missing id".to_string()))?
        .to_string();
    let kind = node.attribute("type").unwrap_or_default().to_string();
    let graphics = node
        .children()
        .find(|child| child.has_tag_name("graphics"))
        .map(|child| parse_graphics(&child));

    Ok(PathwayEntry {
        name: node.attribute("name").unwrap_or_default().to_string(),
        entry_type: EntryType::from_kgml(&kind),
        kind,
        link: node.attribute("link").map(|link| link.to_string()),
        graphics,
        id,
    })
}

fn parse_graphics(node: &roxmltree::Node) -> Graphics {
    Graphics {
        name: node.attribute("name").map(|name| name.to_string()),
        shape: node.attribute("type").unwrap_or("rectangle").to_string(),
        x: parse_f64(node.attribute("x")),
        y: parse_f64(node.attribute("y")),
        width: parse_f64(node.attribute("width")),
        height: parse_f64(node.attribute("height")),
        fgcolor: node.attribute("fgcolor").map(|c| c.to_string()),
        bgcolor: node.attribute("bgcolor").map(|c| c.to_string()),
    }
}

fn parse_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse::<f64>().ok())
}
