//! Deterministic alias generation for one compilation.

/// Hands out subquery and table aliases in construction order.
///
/// Owned by a single compilation, so aliases depend only on the order in
/// which nodes are built.
#[derive(Debug, Default)]
pub struct AliasGenerator {
    next_subquery: usize,
    next_table: usize,
}

impl AliasGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next node alias: `subq_<n>`.
    pub fn subquery(&mut self) -> String {
        let alias = format!("subq_{}", self.next_subquery);
        self.next_subquery += 1;
        alias
    }

    /// Next physical table alias: `<model>_src_<n>`.
    pub fn table(&mut self, model: &str) -> String {
        let alias = format!("{}_src_{}", model, self.next_table);
        self.next_table += 1;
        alias
    }
}
