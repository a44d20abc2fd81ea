//! Structured variable keys, schemas and schema-shaped containers
//!
//! Model variables are addressed by a key made of a semantic root (`q`, `dq`,
//! `r`, `e`, `coeff`, ...) and an optional `{node}{parent}` suffix. Keys are
//! parsed once into [`VarKey`]; the root is classified into a [`RootKind`] so
//! builders never slice strings to decide how to treat a state.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConstraintError;
use crate::symbolic::{Expr, Space, Symbol};

/// Variable category of the dynamics model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarCategory {
    /// Differential states `x`
    States,
    /// Controls `u`
    Controls,
    /// Free design parameters `xi`
    DesignParameters,
    /// Problem parameters `phi`
    Parameters,
}

impl VarCategory {
    pub fn label(&self) -> &'static str {
        match self {
            VarCategory::States => "x",
            VarCategory::Controls => "u",
            VarCategory::DesignParameters => "xi",
            VarCategory::Parameters => "phi",
        }
    }
}

impl fmt::Display for VarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Node identifier suffix of a variable key, e.g. `21` for node 2 under parent 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePair {
    pub node: u32,
    pub parent: u32,
}

impl NodePair {
    pub fn new(node: u32, parent: u32) -> Self {
        Self { node, parent }
    }
}

impl fmt::Display for NodePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.node, self.parent)
    }
}

/// Semantic family of a variable root
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RootKind {
    /// `q`: node position
    Position,
    /// `dq`: node velocity
    Velocity,
    /// `r`: rotation matrix entries
    Rotation,
    /// roots starting with `e` (accumulated energy)
    Energy,
    /// roots starting with `w` or `dw` (wake / induction states)
    Wake,
    /// `coeff`: aerodynamic coefficients
    AeroCoefficient,
    Other,
}

impl RootKind {
    pub fn classify(root: &str) -> Self {
        match root {
            "q" => RootKind::Position,
            "dq" => RootKind::Velocity,
            "r" => RootKind::Rotation,
            "coeff" => RootKind::AeroCoefficient,
            r if r.starts_with('e') => RootKind::Energy,
            r if r.starts_with('w') || r.starts_with("dw") => RootKind::Wake,
            _ => RootKind::Other,
        }
    }
}

/// Variable name split into its root and optional node suffix, e.g. `coeff21`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VarKey {
    root: String,
    nodes: Option<NodePair>,
    kind: RootKind,
}

impl VarKey {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let kind = RootKind::classify(&root);
        Self {
            root,
            nodes: None,
            kind,
        }
    }

    pub fn with_nodes(root: impl Into<String>, node: u32, parent: u32) -> Self {
        let mut key = Self::new(root);
        key.nodes = Some(NodePair::new(node, parent));
        key
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn nodes(&self) -> Option<NodePair> {
        self.nodes
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes {
            Some(nodes) => write!(f, "{}{}", self.root, nodes),
            None => write!(f, "{}", self.root),
        }
    }
}

impl FromStr for VarKey {
    type Err = ConstraintError;

    /// Parse a flat variable name such as `q10`, `coeff21` or `l_t`.
    ///
    /// A trailing run of at least two digits directly after a letter is read
    /// as a node suffix: the node takes the first half of the digits (rounded
    /// up), the parent the rest. Anything else is kept as a bare root.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConstraintError::InvalidVariableName(name.to_string()));
        }

        let root_len = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (root, digits) = name.split_at(root_len);

        let ends_in_letter = root.chars().last().is_some_and(|c| c.is_ascii_alphabetic());
        if digits.len() < 2 || !ends_in_letter {
            if root.is_empty() {
                return Err(ConstraintError::InvalidVariableName(name.to_string()));
            }
            return Ok(VarKey::new(name));
        }

        let split = digits.len().div_ceil(2);
        let (node, parent) = digits.split_at(split);
        let parse = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| ConstraintError::InvalidVariableName(name.to_string()))
        };
        Ok(VarKey::with_nodes(root, parse(node)?, parse(parent)?))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    pub key: VarKey,
    pub size: usize,
    offset: usize,
}

impl SchemaEntry {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Ordered key → block size mapping of one variable category
///
/// The declared order is the order every flattened vector uses. It is fixed by
/// the dynamics model and shared by all structures built on the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    category: VarCategory,
    entries: Vec<SchemaEntry>,
    total_size: usize,
}

impl Schema {
    pub fn new(
        category: VarCategory,
        entries: impl IntoIterator<Item = (VarKey, usize)>,
    ) -> Result<Self, ConstraintError> {
        let mut out: Vec<SchemaEntry> = Vec::new();
        let mut offset = 0;
        for (key, size) in entries {
            if out.iter().any(|e| e.key == key) {
                return Err(ConstraintError::DuplicateVariable(format!(
                    "{}.{}",
                    category, key
                )));
            }
            out.push(SchemaEntry { key, size, offset });
            offset += size;
        }
        Ok(Self {
            category,
            entries: out,
            total_size: offset,
        })
    }

    /// Build a schema from flat names, e.g. `[("q10", 3), ("e", 1)]`
    pub fn from_names(
        category: VarCategory,
        entries: &[(&str, usize)],
    ) -> Result<Self, ConstraintError> {
        let parsed = entries
            .iter()
            .map(|(name, size)| Ok((name.parse::<VarKey>()?, *size)))
            .collect::<Result<Vec<_>, ConstraintError>>()?;
        Self::new(category, parsed)
    }

    pub fn category(&self) -> VarCategory {
        self.category
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &VarKey> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn entry(&self, key: &VarKey) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.entry(key).is_some()
    }

    pub fn size_of(&self, key: &VarKey) -> Option<usize> {
        self.entry(key).map(|e| e.size)
    }

    /// Map a flat index to its `(key, dimension)` pair
    pub fn canonical_index(&self, index: usize) -> Option<(&VarKey, usize)> {
        self.entries
            .iter()
            .find(|e| index >= e.offset && index < e.offset + e.size)
            .map(|e| (&e.key, index - e.offset))
    }

    fn missing(&self, key: &VarKey) -> ConstraintError {
        ConstraintError::MissingVariable {
            category: self.category,
            key: key.to_string(),
        }
    }
}

/// Values laid out according to a [`Schema`]
#[derive(Clone, Debug, PartialEq)]
pub struct VarStruct<T> {
    schema: Arc<Schema>,
    data: Vec<T>,
}

impl<T: Clone> VarStruct<T> {
    pub fn from_flat(schema: Arc<Schema>, data: Vec<T>) -> Result<Self, ConstraintError> {
        if data.len() != schema.total_size() {
            return Err(ConstraintError::SizeMismatch {
                name: schema.category().to_string(),
                expected: schema.total_size(),
                actual: data.len(),
            });
        }
        Ok(Self { schema, data })
    }

    pub fn filled(schema: Arc<Schema>, value: T) -> Self {
        let data = vec![value; schema.total_size()];
        Self { schema, data }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Flat concatenation in schema order
    pub fn cat(&self) -> &[T] {
        &self.data
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.schema.contains(key)
    }

    pub fn get(&self, key: &VarKey) -> Result<&[T], ConstraintError> {
        let entry = self.schema.entry(key).ok_or_else(|| self.schema.missing(key))?;
        Ok(&self.data[entry.offset..entry.offset + entry.size])
    }

    pub fn component(&self, key: &VarKey, index: usize) -> Result<&T, ConstraintError> {
        let block = self.get(key)?;
        block.get(index).ok_or_else(|| ConstraintError::ComponentOutOfRange {
            key: key.to_string(),
            index,
            size: block.len(),
        })
    }

    /// Blocks in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, &[T])> {
        self.schema
            .entries()
            .iter()
            .map(|e| (&e.key, &self.data[e.offset..e.offset + e.size]))
    }
}

/// Allocates consecutive symbols in one decision vector
#[derive(Debug)]
pub struct SymbolAllocator {
    space: Space,
    next: usize,
}

impl SymbolAllocator {
    pub fn new(space: Space) -> Self {
        Self { space, next: 0 }
    }

    /// Number of symbols handed out so far
    pub fn len(&self) -> usize {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    pub fn symbol(&mut self, name: impl Into<Arc<str>>) -> Symbol {
        let symbol = Symbol::new(self.space, self.next, name);
        self.next += 1;
        symbol
    }

    /// Fresh symbolic structure over `schema`, symbols named `{prefix}{category}.{key}[{dim}]`
    pub fn symbolic(&mut self, schema: &Arc<Schema>, prefix: &str) -> VarStruct<Expr> {
        let mut data = Vec::with_capacity(schema.total_size());
        for entry in schema.entries() {
            for dim in 0..entry.size {
                let name = format!("{prefix}{}.{}[{dim}]", schema.category(), entry.key);
                data.push(Expr::symbol(self.symbol(name)));
            }
        }
        VarStruct {
            schema: Arc::clone(schema),
            data,
        }
    }
}

/// Symbolic optimization variables at one time point
#[derive(Clone, Debug, PartialEq)]
pub struct Variables {
    pub x: VarStruct<Expr>,
    pub u: VarStruct<Expr>,
    pub xi: VarStruct<Expr>,
}

/// Symbolic problem parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    pub phi: VarStruct<Expr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_suffixes() {
        let q: VarKey = "q10".parse().unwrap();
        assert_eq!(q.root(), "q");
        assert_eq!(q.nodes(), Some(NodePair::new(1, 0)));
        assert_eq!(q.kind(), RootKind::Position);

        let coeff: VarKey = "coeff21".parse().unwrap();
        assert_eq!(coeff.root(), "coeff");
        assert_eq!(coeff.nodes(), Some(NodePair::new(2, 1)));

        let deep: VarKey = "dq101".parse().unwrap();
        assert_eq!(deep.nodes(), Some(NodePair::new(10, 1)));
        assert_eq!(deep.to_string(), "dq101");
    }

    #[test]
    fn names_without_pair_suffix_are_bare_roots() {
        for name in ["e", "l_t", "xi_0", "dl_t", "wx_int_0"] {
            let key: VarKey = name.parse().unwrap();
            assert_eq!(key.root(), name);
            assert_eq!(key.nodes(), None);
        }
        assert!("".parse::<VarKey>().is_err());
        assert!("12".parse::<VarKey>().is_err());
        assert!("q-1".parse::<VarKey>().is_err());
    }

    #[test]
    fn classifies_roots() {
        assert_eq!(RootKind::classify("e"), RootKind::Energy);
        assert_eq!(RootKind::classify("wx_int"), RootKind::Wake);
        assert_eq!(RootKind::classify("dwx_int"), RootKind::Wake);
        assert_eq!(RootKind::classify("dq"), RootKind::Velocity);
        assert_eq!(RootKind::classify("l_t"), RootKind::Other);
    }

    #[test]
    fn schema_offsets_and_canonical_index() {
        let schema =
            Schema::from_names(VarCategory::States, &[("q10", 3), ("e", 1), ("r10", 9)]).unwrap();
        assert_eq!(schema.total_size(), 13);
        let (key, dim) = schema.canonical_index(3).unwrap();
        assert_eq!((key.to_string(), dim), ("e".to_string(), 0));
        let (key, dim) = schema.canonical_index(12).unwrap();
        assert_eq!((key.to_string(), dim), ("r10".to_string(), 8));
        assert!(schema.canonical_index(13).is_none());
    }

    #[test]
    fn schema_rejects_duplicates() {
        let err = Schema::from_names(VarCategory::States, &[("q10", 3), ("q10", 3)]);
        assert!(matches!(err, Err(ConstraintError::DuplicateVariable(_))));
    }

    #[test]
    fn missing_key_is_reported_with_category() {
        let schema = Arc::new(Schema::from_names(VarCategory::States, &[("q10", 3)]).unwrap());
        let values = VarStruct::filled(schema, 0.0);
        let err = values.get(&VarKey::new("e")).unwrap_err();
        assert_eq!(err.to_string(), "variable 'x.e' is not part of the model schema");
    }
}
