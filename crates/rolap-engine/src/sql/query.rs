use crate::sql::dialect::Dialect;
use crate::sql::query_spec::max_alias_length;
use std::collections::HashSet;
use std::fmt;

/// Declared type of one result column, handed to the statement executor alongside the SQL text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SqlType {
    Int,
    Long,
    Double,
    String,
    /// No declared type; the executor reads whatever the driver returns.
    Object,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SqlType::Int => "INT",
            SqlType::Long => "LONG",
            SqlType::Double => "DOUBLE",
            SqlType::String => "STRING",
            SqlType::Object => "OBJECT",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
struct SelectItem {
    expression: String,
    alias: String,
}

/// Accumulates the clauses of one `select` statement and renders it for a [`Dialect`].
///
/// Expressions are taken verbatim; aliases and table names are quoted by the dialect.
pub struct SqlQuery<'d> {
    dialect: &'d dyn Dialect,
    select: Vec<SelectItem>,
    types: Vec<SqlType>,
    from: Vec<String>,
    from_aliases: HashSet<String>,
    where_clauses: Vec<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
}

impl<'d> SqlQuery<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            select: Vec::new(),
            types: Vec::new(),
            from: Vec::new(),
            from_aliases: HashSet::new(),
            where_clauses: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Effective identifier limit; a dialect limit of 0 means unlimited.
    pub fn max_column_name_length(&self) -> usize {
        max_alias_length(self.dialect)
    }

    pub fn add_select(&mut self, expression: impl Into<String>, sql_type: SqlType, alias: &str) {
        self.select.push(SelectItem {
            expression: expression.into(),
            alias: alias.to_string(),
        });
        self.types.push(sql_type);
    }

    pub fn select_count(&self) -> usize {
        self.select.len()
    }

    /// Registers `table` under `alias`. Returns `false` if the alias is already in the FROM
    /// clause, in which case nothing changes.
    pub fn add_from_table(
        &mut self,
        table: &str,
        alias: &str,
        join_condition: Option<&str>,
    ) -> bool {
        if !self.from_aliases.insert(alias.to_string()) {
            return false;
        }
        let table = self.dialect.quote_identifier(table);
        let alias_sql = self.dialect.quote_identifier(alias);
        let item = if self.dialect.allows_as_in_table_alias() {
            format!("{table} as {alias_sql}")
        } else {
            format!("{table} {alias_sql}")
        };
        self.from.push(item);
        if let Some(condition) = join_condition {
            self.add_where(condition);
        }
        true
    }

    pub fn has_from(&self, alias: &str) -> bool {
        self.from_aliases.contains(alias)
    }

    pub fn add_where(&mut self, condition: impl Into<String>) {
        let condition = condition.into();
        if !self.where_clauses.contains(&condition) {
            self.where_clauses.push(condition);
        }
    }

    pub fn add_group_by(&mut self, expression: impl Into<String>) {
        self.group_by.push(expression.into());
    }

    pub fn add_order_by(&mut self, expression: impl Into<String>, ascending: bool) {
        let expression = expression.into();
        if ascending {
            self.order_by.push(format!("{expression} asc"));
        } else {
            self.order_by.push(format!("{expression} desc"));
        }
    }

    /// Renders the statement and the declared type of every selected column, in select order.
    pub fn to_sql_and_types(&self) -> (String, Vec<SqlType>) {
        let mut sql = String::from("select ");
        let items: Vec<String> = self
            .select
            .iter()
            .map(|item| {
                format!(
                    "{} as {}",
                    item.expression,
                    self.dialect.quote_identifier(&item.alias)
                )
            })
            .collect();
        sql.push_str(&items.join(", "));
        if !self.from.is_empty() {
            sql.push_str(" from ");
            sql.push_str(&self.from.join(", "));
        }
        if !self.where_clauses.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.where_clauses.join(" and "));
        }
        if !self.group_by.is_empty() {
            sql.push_str(" group by ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.order_by.join(", "));
        }
        (sql, self.types.clone())
    }
}

impl fmt::Debug for SqlQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlQuery")
            .field("dialect", &self.dialect.name())
            .field("select", &self.select)
            .field("from", &self.from)
            .field("where", &self.where_clauses)
            .finish()
    }
}
