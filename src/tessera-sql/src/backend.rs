use std::collections::HashMap;

use common_config::SqlConfig;
use common_error::{TesseraError, TesseraResult};
use tessera_ir::Node;
use tessera_translate::Backend;

/// How a table's columns are reached from the current `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Through a `FROM` item alias. `renames` maps a column to the name it
    /// carries in that item's output when the two differ. `direct` is false
    /// when the table sits inside a subquery aliased `alias`.
    Table {
        alias: String,
        direct: bool,
        renames: HashMap<String, String>,
    },
    /// Visible through more than one subquery of the same `FROM` clause.
    Ambiguous,
}

impl Binding {
    fn table(alias: &str, direct: bool, renames: HashMap<String, String>) -> Self {
        Self::Table {
            alias: alias.to_string(),
            direct,
            renames,
        }
    }

    fn is_direct(&self) -> bool {
        matches!(self, Self::Table { direct: true, .. })
    }
}

type Scope = HashMap<Node, Binding>;

/// Per-statement state of the SQL target.
///
/// Each `SELECT` being rendered owns one scope of table bindings. Alias
/// numbers are unique across the whole statement.
#[derive(Debug)]
pub struct Sql {
    config: SqlConfig,
    scopes: Vec<Scope>,
    next_alias: usize,
}

impl Backend for Sql {
    const NAME: &'static str = "sql";
    type Output = String;
}

impl Sql {
    pub fn new(config: SqlConfig) -> Self {
        Self {
            config,
            scopes: vec![Scope::new()],
            next_alias: 0,
        }
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote(&self, ident: &str) -> String {
        let q = self.config.identifier_quote;
        let escaped = ident.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    fn scope(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    fn scope_mut(&mut self) -> TesseraResult<&mut Scope> {
        self.scopes
            .last_mut()
            .ok_or_else(|| TesseraError::internal("no open SQL scope"))
    }

    /// Open the scope of a nested `SELECT`.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Close the innermost scope, returning the bindings it held.
    pub fn pop_scope(&mut self) -> TesseraResult<Vec<(Node, Binding)>> {
        if self.scopes.len() < 2 {
            return Err(TesseraError::internal("cannot close the statement scope"));
        }
        Ok(self.scopes.pop().unwrap_or_default().into_iter().collect())
    }

    /// Bind `table` as a `FROM` item of the current scope under a fresh alias.
    ///
    /// Structurally equal tables cannot be told apart by column references,
    /// so binding the same table twice in one scope is an error.
    pub fn bind(&mut self, table: &Node) -> TesseraResult<String> {
        if self.scope().and_then(|s| s.get(table)).is_some_and(Binding::is_direct) {
            return Err(TesseraError::translation(format!(
                "{} appears twice in one FROM clause; column references to it are ambiguous",
                table.kind()
            )));
        }
        let alias = format!("t{}", self.next_alias);
        self.next_alias += 1;
        self.scope_mut()?
            .insert(table.clone(), Binding::table(&alias, true, HashMap::new()));
        Ok(alias)
    }

    /// Make tables bound inside a subquery reachable through its alias.
    ///
    /// A direct binding of the current scope wins over an exported one; two
    /// subqueries exporting the same table make it ambiguous.
    pub fn export(&mut self, bindings: Vec<(Node, Binding)>, alias: &str) -> TesseraResult<()> {
        let scope = self.scope_mut()?;
        for (table, binding) in bindings {
            let exported = match binding {
                Binding::Table { renames, .. } => Binding::table(alias, false, renames),
                Binding::Ambiguous => Binding::Ambiguous,
            };
            match scope.get(&table).map(Binding::is_direct) {
                None => {
                    scope.insert(table, exported);
                }
                Some(true) => {}
                Some(false) => {
                    scope.insert(table, Binding::Ambiguous);
                }
            }
        }
        Ok(())
    }

    /// Record that the `SELECT` being closed outputs the columns of `FROM`
    /// item `item` under new names (`from -> to`, keyed by the item's own
    /// output names). Applied to every table reachable through `item`.
    pub fn rename(&mut self, item: &str, changes: &HashMap<String, String>) -> TesseraResult<()> {
        for binding in self.scope_mut()?.values_mut() {
            let Binding::Table { alias, renames, .. } = binding else {
                continue;
            };
            if alias.as_str() != item {
                continue;
            }
            for output in renames.values_mut() {
                if let Some(to) = changes.get(output.as_str()) {
                    *output = to.clone();
                }
            }
            for (from, to) in changes {
                renames.entry(from.clone()).or_insert_with(|| to.clone());
            }
        }
        Ok(())
    }

    /// Forget every rename: the `SELECT` being closed names its columns itself.
    pub fn clear_renames(&mut self) -> TesseraResult<()> {
        for binding in self.scope_mut()?.values_mut() {
            if let Binding::Table { renames, .. } = binding {
                renames.clear();
            }
        }
        Ok(())
    }

    /// The binding of `table` in the current scope.
    pub fn binding(&self, table: &Node) -> Option<&Binding> {
        self.scope().and_then(|scope| scope.get(table))
    }

    /// Alias under which `table` is reachable, if it is in scope.
    pub fn alias_of(&self, table: &Node) -> TesseraResult<Option<&str>> {
        match self.binding(table) {
            None => Ok(None),
            Some(Binding::Table { alias, .. }) => Ok(Some(alias.as_str())),
            Some(Binding::Ambiguous) => Err(TesseraError::translation(format!(
                "{} is reachable through more than one subquery",
                table.kind()
            ))),
        }
    }

    /// Name `column` of `table` carries in the current scope.
    pub fn output_name<'a>(&'a self, table: &Node, column: &'a str) -> &'a str {
        match self.binding(table) {
            Some(Binding::Table { renames, .. }) => {
                renames.get(column).map(String::as_str).unwrap_or(column)
            }
            _ => column,
        }
    }

    /// A reference to `column` of `table`, qualified when the table is in scope.
    pub fn column(&self, table: &Node, column: &str) -> TesseraResult<String> {
        let name = self.quote(self.output_name(table, column));
        Ok(match self.alias_of(table)? {
            Some(alias) => format!("{alias}.{name}"),
            None => name,
        })
    }

    /// Amount added to IR offsets before emission.
    pub fn index_offset(&self) -> i64 {
        self.config.index_origin.offset()
    }
}
