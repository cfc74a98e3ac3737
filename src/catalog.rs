use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Static descriptor of one showcased item.
///
/// Descriptors are immutable once loaded; the order they appear in the
/// document is the slide order, and slide `i` is laid out at the i-th
/// spatial offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseItem {
    pub name: String,
    /// Relative path of the OBJ model displayed for this item, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Accent color in linear 0-1 components.
    #[serde(default = "default_accent")]
    pub accent: Vec3,
    #[serde(default)]
    pub description: String,
}

fn default_accent() -> Vec3 {
    Vec3::ONE
}

/// Ordered, read-only list of showcased items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalog {
    items: Vec<ShowcaseItem>,
}

impl Catalog {
    /// Parses the `showcase.xml` document produced by the authoring side.
    ///
    /// A showcase with no items is rejected: there would be nothing to lay
    /// out and no valid slide index.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid showcase XML")?;
        let mut items = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("item")) {
            let name = required_text(&node, "name")?;
            let model = optional_text(&node, "model");
            let accent = parse_accent(optional_text(&node, "color"))?;
            let description = optional_text(&node, "description").unwrap_or_default();
            items.push(ShowcaseItem {
                name,
                model,
                accent,
                description,
            });
        }

        if items.is_empty() {
            return Err(anyhow!("showcase does not contain any <item> entries"));
        }

        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ShowcaseItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ShowcaseItem> {
        self.items.get(index)
    }
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

/// Accent colors are authored as `r g b` in 0-255 and stored linear 0-1.
fn parse_accent(value: Option<String>) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default_accent());
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let mut next = || {
        numbers
            .next()
            .ok_or_else(|| anyhow!("accent color is missing components"))
    };
    let r = next()?;
    let g = next()?;
    let b = next()?;
    Ok(Vec3::new(r, g, b) / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <showcase>
        <item>
            <name>Lightning</name>
            <model>models/lightning.obj</model>
            <color>255 174 158</color>
            <description>Focus. Speed.</description>
        </item>
        <item>
            <name>Storm</name>
            <color>155 199 246</color>
        </item>
    </showcase>
    "#;

    #[test]
    fn parse_showcase_preserves_document_order() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().name, "Lightning");
        assert_eq!(catalog.get(1).unwrap().name, "Storm");
    }

    #[test]
    fn accent_colors_are_normalized() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        let accent = catalog.get(0).unwrap().accent;
        assert!((accent.x - 1.0).abs() < 1e-6);
        assert!((accent.y - 174.0 / 255.0).abs() < 1e-6);
        assert!((accent.z - 158.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn missing_fields_fall_back() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        let storm = catalog.get(1).unwrap();
        assert!(storm.model.is_none());
        assert!(storm.description.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<showcase><item><color>1 2 3</color></item></showcase>";
        assert!(Catalog::from_xml(bad).is_err());
    }

    #[test]
    fn empty_showcase_is_an_error() {
        assert!(Catalog::from_xml("<showcase></showcase>").is_err());
    }
}
