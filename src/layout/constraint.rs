use crate::{
    foundation::error::{TrialkitError, TrialkitResult},
    node::{id::NodeId, store::NodeTree},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    /// Left edge (layout is left-to-right).
    Start,
    /// Right edge.
    End,
}

impl Edge {
    pub fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Vertical,
            Self::Start | Self::End => Axis::Horizontal,
        }
    }
}

/// Which edge of the node is pinned to which edge of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    TopToTopOf,
    TopToBottomOf,
    BottomToTopOf,
    BottomToBottomOf,
    StartToStartOf,
    StartToEndOf,
    EndToEndOf,
    EndToStartOf,
}

impl ConstraintKind {
    pub const ALL: [Self; 8] = [
        Self::TopToTopOf,
        Self::TopToBottomOf,
        Self::BottomToTopOf,
        Self::BottomToBottomOf,
        Self::StartToStartOf,
        Self::StartToEndOf,
        Self::EndToEndOf,
        Self::EndToStartOf,
    ];

    /// Edge of the constrained node.
    pub fn source_edge(self) -> Edge {
        match self {
            Self::TopToTopOf | Self::TopToBottomOf => Edge::Top,
            Self::BottomToTopOf | Self::BottomToBottomOf => Edge::Bottom,
            Self::StartToStartOf | Self::StartToEndOf => Edge::Start,
            Self::EndToEndOf | Self::EndToStartOf => Edge::End,
        }
    }

    /// Edge of the target node.
    pub fn target_edge(self) -> Edge {
        match self {
            Self::TopToTopOf | Self::BottomToTopOf => Edge::Top,
            Self::TopToBottomOf | Self::BottomToBottomOf => Edge::Bottom,
            Self::StartToStartOf | Self::EndToStartOf => Edge::Start,
            Self::StartToEndOf | Self::EndToEndOf => Edge::End,
        }
    }

    pub fn axis(self) -> Axis {
        self.source_edge().axis()
    }
}

/// Node a constraint is anchored to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintTarget {
    /// The constrained node's parent (its bounds in its own space).
    Parent,
    /// A sibling, or failing that an ancestor, with this name.
    Node(String),
}

impl From<&str> for ConstraintTarget {
    fn from(name: &str) -> Self {
        Self::Node(name.to_string())
    }
}

impl From<String> for ConstraintTarget {
    fn from(name: String) -> Self {
        Self::Node(name)
    }
}

/// One declared edge anchoring. Stored on the dependent node.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub target: ConstraintTarget,
    /// Gap between the two edges, measured away from the target edge toward the node.
    #[serde(default)]
    pub margin: f64,
}

macro_rules! constraint_ctor {
    ($($fn_name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $fn_name(target: impl Into<ConstraintTarget>, margin: f64) -> Self {
                Self::new(ConstraintKind::$kind, target, margin)
            }
        )*
    };
}

impl Constraint {
    pub fn new(kind: ConstraintKind, target: impl Into<ConstraintTarget>, margin: f64) -> Self {
        Self {
            kind,
            target: target.into(),
            margin,
        }
    }

    constraint_ctor! {
        top_to_top_of => TopToTopOf,
        top_to_bottom_of => TopToBottomOf,
        bottom_to_top_of => BottomToTopOf,
        bottom_to_bottom_of => BottomToBottomOf,
        start_to_start_of => StartToStartOf,
        start_to_end_of => StartToEndOf,
        end_to_end_of => EndToEndOf,
        end_to_start_of => EndToStartOf,
    }

    pub fn validate(&self) -> TrialkitResult<()> {
        if !self.margin.is_finite() {
            return Err(TrialkitError::configuration(format!(
                "{:?} margin must be finite",
                self.kind
            )));
        }
        if let ConstraintTarget::Node(name) = &self.target
            && name.is_empty()
        {
            return Err(TrialkitError::configuration(format!(
                "{:?} target name must be non-empty",
                self.kind
            )));
        }
        Ok(())
    }
}

impl NodeTree {
    /// Declare an additional constraint on `id`.
    ///
    /// Conflicts between constraints on the same axis are reported by the next layout pass.
    pub fn add_constraint(&mut self, id: NodeId, constraint: Constraint) -> TrialkitResult<()> {
        constraint.validate()?;
        self.node_mut(id)?.constraints.push(constraint);
        Ok(())
    }

    /// Replace every constraint declared on `id`.
    pub fn set_constraints(
        &mut self,
        id: NodeId,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> TrialkitResult<()> {
        let constraints: smallvec::SmallVec<[Constraint; 2]> = constraints.into_iter().collect();
        for c in &constraints {
            c.validate()?;
        }
        self.node_mut(id)?.constraints = constraints;
        Ok(())
    }

    pub fn clear_constraints(&mut self, id: NodeId) -> TrialkitResult<()> {
        self.node_mut(id)?.constraints.clear();
        Ok(())
    }
}
