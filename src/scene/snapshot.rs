use crate::{
    foundation::core::{Point, Size},
    foundation::error::{TrialkitError, TrialkitResult},
    layout::constraint::Constraint,
    node::{id::NodeId, store::NodeTree},
};

/// Serializable copy of a subtree's observable state, for automation and test assertions.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub kind: String,
    pub position: Point,
    pub size: Size,
    pub scale: f64,
    pub rotation: f64,
    pub alpha: f64,
    pub z_position: f64,
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Capture `id` and its subtree. Children appear in attach order.
    pub fn capture(tree: &NodeTree, id: NodeId) -> TrialkitResult<Self> {
        let node = tree.node(id)?;
        let children = node
            .children()
            .iter()
            .map(|&c| Self::capture(tree, c))
            .collect::<TrialkitResult<Vec<_>>>()?;
        Ok(Self {
            name: node.name().to_owned(),
            kind: node.kind().type_name().to_owned(),
            position: node.position(),
            size: node.size(),
            scale: node.scale(),
            rotation: node.rotation(),
            alpha: node.alpha(),
            z_position: node.z_position(),
            hidden: node.is_hidden(),
            text: node.text().map(str::to_owned),
            constraints: node.constraints().to_vec(),
            children,
        })
    }

    pub fn to_json(&self) -> TrialkitResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TrialkitError::serde(format!("serialize snapshot: {e}")))
    }

    pub fn from_json(s: &str) -> TrialkitResult<Self> {
        serde_json::from_str(s).map_err(|e| TrialkitError::serde(format!("parse snapshot: {e}")))
    }

    /// First node named `name` in this snapshot, depth-first, including `self`.
    pub fn find(&self, name: &str) -> Option<&NodeSnapshot> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}
