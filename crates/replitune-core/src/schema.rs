//! Tables and columns as the index vocabulary.
//!
//! A [`Column`] always carries the name of its owning table: the metric and
//! the advisor compare columns across replicas, and a table-less column has
//! no meaningful identity. Construction goes through [`Table::add_column`]
//! (or [`Column::new`] with an explicit table name), so that state is
//! unrepresentable. Equality, ordering, and hashing are all defined over
//! the `(table, name)` pair.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Column {
    table: String,
    name: String,
}

impl Column {
    /// Names are lowercased; SQL identifiers are matched case-insensitively.
    pub fn new(table: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            table: table.as_ref().to_lowercase(),
            name: name.as_ref().to_lowercase(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Adds a column owned by this table.
    pub fn add_column(&mut self, name: impl AsRef<str>) {
        self.columns.push(Column::new(&self.name, name));
    }

    pub fn add_columns<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add_column(name);
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        let lowered = name.to_lowercase();
        self.columns.iter().find(|c| c.name() == lowered)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_compare_over_table_and_name() {
        let a = Column::new("Lineitem", "L_ShipDate");
        let b = Column::new("lineitem", "l_shipdate");
        let c = Column::new("orders", "l_shipdate");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn table_stamps_ownership_into_columns() {
        let mut t = Table::new("Orders");
        t.add_columns(["O_OrderDate", "o_custkey"]);
        assert_eq!(t.columns().len(), 2);
        assert!(t.columns().iter().all(|c| c.table() == "orders"));
        assert!(t.column("O_CUSTKEY").is_some());
        assert!(t.column("missing").is_none());
    }
}
