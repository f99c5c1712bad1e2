use crate::error::{OlapError, OlapResult};
use crate::member::MemberReader;
use crate::schema::Member;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Execution context consumed by compiled nodes.
///
/// The context holds one current member per hierarchy plus named scalar bindings. Nodes only read
/// it, except for context switches they undo before returning and for explicit assignments.
pub trait Evaluator {
    fn member_reader(&self, hierarchy: &str) -> OlapResult<Arc<dyn MemberReader>>;

    fn current_member(&self, hierarchy: &str) -> OlapResult<Arc<Member>>;

    /// Makes `member` current for its hierarchy and returns the member it replaced.
    fn set_context(&mut self, member: Arc<Member>) -> OlapResult<Arc<Member>>;

    /// Value of the cell at the current coordinates; `None` for an empty cell.
    fn cell_value(&mut self) -> OlapResult<Option<f64>>;

    fn variable(&self, name: &str) -> Option<Value>;

    fn set_variable(&mut self, name: &str, value: Value);
}

/// Storage of fact cells addressed by one member per hierarchy.
pub trait CellReader: Send + Sync {
    fn cell_value(&self, coordinates: &[Arc<Member>]) -> OlapResult<Option<f64>>;
}

/// [`Evaluator`] over a fixed set of hierarchies and a [`CellReader`].
///
/// Coordinates passed to the cell reader follow the order in which hierarchies were added.
pub struct RolapEvaluator {
    hierarchies: Vec<Arc<dyn MemberReader>>,
    positions: HashMap<String, usize>,
    context: Vec<Arc<Member>>,
    cells: Arc<dyn CellReader>,
    variables: HashMap<String, Value>,
}

impl fmt::Debug for RolapEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RolapEvaluator")
            .field("context", &self.context)
            .field("variables", &self.variables)
            .finish()
    }
}

impl RolapEvaluator {
    pub fn new(cells: Arc<dyn CellReader>) -> Self {
        Self {
            hierarchies: Vec::new(),
            positions: HashMap::new(),
            context: Vec::new(),
            cells,
            variables: HashMap::new(),
        }
    }

    /// Registers a hierarchy; its default member becomes current.
    pub fn add_hierarchy(&mut self, reader: Arc<dyn MemberReader>) -> OlapResult<()> {
        let name = reader.hierarchy().name().to_string();
        if self.positions.contains_key(&name) {
            return Err(OlapError::Config(format!(
                "hierarchy {name} is already part of the evaluation context"
            )));
        }
        let default = reader.get_default_member()?;
        self.positions.insert(name, self.hierarchies.len());
        self.hierarchies.push(reader);
        self.context.push(default);
        Ok(())
    }

    /// Current members in hierarchy order.
    pub fn coordinates(&self) -> &[Arc<Member>] {
        &self.context
    }

    fn position(&self, hierarchy: &str) -> OlapResult<usize> {
        self.positions
            .get(hierarchy)
            .copied()
            .ok_or_else(|| OlapError::MissingContext(hierarchy.to_string()))
    }
}

impl Evaluator for RolapEvaluator {
    fn member_reader(&self, hierarchy: &str) -> OlapResult<Arc<dyn MemberReader>> {
        let pos = self.position(hierarchy)?;
        Ok(self.hierarchies[pos].clone())
    }

    fn current_member(&self, hierarchy: &str) -> OlapResult<Arc<Member>> {
        let pos = self.position(hierarchy)?;
        Ok(self.context[pos].clone())
    }

    fn set_context(&mut self, member: Arc<Member>) -> OlapResult<Arc<Member>> {
        let pos = self.position(member.hierarchy())?;
        Ok(std::mem::replace(&mut self.context[pos], member))
    }

    fn cell_value(&mut self) -> OlapResult<Option<f64>> {
        if self.context.iter().any(|m| m.is_null()) {
            return Ok(None);
        }
        self.cells.cell_value(&self.context)
    }

    fn variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }
}
