//! Star-schema metadata: the fact table, the dimension tables joined to it and the columns and
//! measures a query spec can reference.
use crate::error::{OlapError, OlapResult};
use crate::sql::dialect::Dialect;
use crate::sql::query::{SqlQuery, SqlType};

/// `parent_alias.foreign_key = alias.primary_key`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarJoin {
    pub parent_alias: String,
    pub foreign_key: String,
    pub primary_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarTable {
    name: String,
    alias: String,
    join: Option<StarJoin>,
}

impl StarTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// `None` for the fact table.
    pub fn join(&self) -> Option<&StarJoin> {
        self.join.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Star {
    tables: Vec<StarTable>,
    implicit_measure: Option<StarMeasure>,
}

impl Star {
    /// A star with just its fact table, registered under the table's own name.
    pub fn new(fact_table: impl Into<String>) -> Self {
        let name = fact_table.into();
        Self {
            tables: vec![StarTable {
                alias: name.clone(),
                name,
                join: None,
            }],
            implicit_measure: None,
        }
    }

    pub fn with_implicit_measure(mut self, measure: StarMeasure) -> Self {
        self.implicit_measure = Some(measure);
        self
    }

    /// Joins `name` (as `alias`) to the already registered table `parent_alias`.
    pub fn add_dimension_table(
        &mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
        parent_alias: &str,
        foreign_key: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> OlapResult<()> {
        let alias = alias.into();
        if self.table(&alias).is_some() {
            return Err(OlapError::Config(format!(
                "table alias {alias} is already used in star {}",
                self.fact().name()
            )));
        }
        if self.table(parent_alias).is_none() {
            return Err(OlapError::Config(format!(
                "table {alias} joins to unknown table alias {parent_alias}"
            )));
        }
        self.tables.push(StarTable {
            name: name.into(),
            alias,
            join: Some(StarJoin {
                parent_alias: parent_alias.to_string(),
                foreign_key: foreign_key.into(),
                primary_key: primary_key.into(),
            }),
        });
        Ok(())
    }

    pub fn fact(&self) -> &StarTable {
        &self.tables[0]
    }

    pub fn tables(&self) -> &[StarTable] {
        &self.tables
    }

    pub fn table(&self, alias: &str) -> Option<&StarTable> {
        self.tables.iter().find(|t| t.alias == alias)
    }

    /// Measure used by drill-through requests that name none.
    pub fn implicit_measure(&self) -> Option<&StarMeasure> {
        self.implicit_measure.as_ref()
    }

    /// Adds `table_alias` and every table on its join path to the fact table to the FROM
    /// clause of `query`, together with the join conditions.
    pub fn add_to_from(&self, query: &mut SqlQuery<'_>, table_alias: &str) -> OlapResult<()> {
        let mut path = Vec::new();
        let mut alias = table_alias;
        loop {
            let table = self.table(alias).ok_or_else(|| {
                OlapError::Config(format!(
                    "unknown table alias {alias} in star {}",
                    self.fact().name()
                ))
            })?;
            if path.iter().any(|t: &&StarTable| t.alias == table.alias) {
                return Err(OlapError::Config(format!(
                    "join cycle through table alias {alias}"
                )));
            }
            path.push(table);
            match &table.join {
                Some(join) => alias = join.parent_alias.as_str(),
                None => break,
            }
        }

        let dialect = query.dialect();
        for table in path.into_iter().rev() {
            if query.has_from(&table.alias) {
                continue;
            }
            let condition = table.join.as_ref().map(|join| {
                format!(
                    "{} = {}",
                    dialect.quote_qualified(&join.parent_alias, &join.foreign_key),
                    dialect.quote_qualified(&table.alias, &join.primary_key)
                )
            });
            query.add_from_table(&table.name, &table.alias, condition.as_deref());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnExpr {
    /// `table.name`
    Column { table: String, name: String },
    /// Raw SQL evaluated against `table`.
    Sql { table: String, sql: String },
}

impl ColumnExpr {
    pub fn table(&self) -> &str {
        match self {
            ColumnExpr::Column { table, .. } | ColumnExpr::Sql { table, .. } => table,
        }
    }

    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        match self {
            ColumnExpr::Column { table, name } => dialect.quote_qualified(table, name),
            ColumnExpr::Sql { sql, .. } => sql.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarColumn {
    name: Option<String>,
    expr: ColumnExpr,
    sql_type: SqlType,
}

impl StarColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: None,
            expr: ColumnExpr::Column {
                table: table.into(),
                name: column.into(),
            },
            sql_type,
        }
    }

    pub fn expression(table: impl Into<String>, sql: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: None,
            expr: ColumnExpr::Sql {
                table: table.into(),
                sql: sql.into(),
            },
            sql_type,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declared name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Column name when the expression is a plain `table.column` reference.
    pub fn direct_column_name(&self) -> Option<&str> {
        match &self.expr {
            ColumnExpr::Column { name, .. } => Some(name),
            ColumnExpr::Sql { .. } => None,
        }
    }

    pub fn expr(&self) -> &ColumnExpr {
        &self.expr
    }

    pub fn table(&self) -> &str {
        self.expr.table()
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        self.expr.to_sql(dialect)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aggregator {
    Sum,
    Count,
    Min,
    Max,
    Avg,
    DistinctCount,
}

impl Aggregator {
    pub fn expression(self, operand: &str) -> String {
        match self {
            Aggregator::Sum => format!("sum({operand})"),
            Aggregator::Count => format!("count({operand})"),
            Aggregator::Min => format!("min({operand})"),
            Aggregator::Max => format!("max({operand})"),
            Aggregator::Avg => format!("avg({operand})"),
            Aggregator::DistinctCount => format!("count(distinct {operand})"),
        }
    }

    pub fn result_type(self, operand: SqlType) -> SqlType {
        match self {
            Aggregator::Count | Aggregator::DistinctCount => SqlType::Long,
            Aggregator::Avg => SqlType::Double,
            Aggregator::Sum | Aggregator::Min | Aggregator::Max => operand,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarMeasure {
    name: String,
    column: StarColumn,
    aggregator: Aggregator,
}

impl StarMeasure {
    pub fn new(name: impl Into<String>, column: StarColumn, aggregator: Aggregator) -> Self {
        Self {
            name: name.into(),
            column,
            aggregator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &StarColumn {
        &self.column
    }

    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    pub fn aggregate_sql(&self, dialect: &dyn Dialect) -> String {
        self.aggregator.expression(&self.column.to_sql(dialect))
    }

    pub fn aggregate_type(&self) -> SqlType {
        self.aggregator.result_type(self.column.sql_type())
    }
}
