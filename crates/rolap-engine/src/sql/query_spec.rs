//! Per-request SQL construction against a [`Star`].
//!
//! A query spec fixes the column list, the output aliases and the predicates of one statement.
//! Alias assignment is deterministic: the same request against the same dialect always yields the
//! same aliases, so generated SQL can be cached and compared by text.
//!
//! Aliases are assigned in select order (constrained columns, then measures, then non-applicable
//! fields). Each candidate is cut to the dialect's identifier limit; on collision `_0`, `_1`, ...
//! is appended, shortening the base so the whole alias still fits.
use crate::error::{OlapError, OlapResult};
use crate::sql::dialect::Dialect;
use crate::sql::predicate::{CompoundPredicate, StarPredicate};
use crate::sql::query::{SqlQuery, SqlType};
use crate::sql::star::{Star, StarColumn, StarMeasure};
use std::collections::HashSet;

/// A star column together with its constraint for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstrainedColumn {
    pub column: StarColumn,
    pub predicate: StarPredicate,
    /// Whether the column appears in the select list, or only constrains the rows.
    pub in_select: bool,
}

impl ConstrainedColumn {
    pub fn new(column: StarColumn, predicate: StarPredicate) -> Self {
        Self {
            column,
            predicate,
            in_select: true,
        }
    }

    pub fn unconstrained(column: StarColumn) -> Self {
        Self::new(column, StarPredicate::True)
    }

    pub fn where_only(mut self) -> Self {
        self.in_select = false;
        self
    }
}

/// Shared contract of the statement builders; `generate_sql` assembles the statement from the
/// accessors.
pub trait QuerySpec {
    fn star(&self) -> &Star;

    fn dialect(&self) -> &dyn Dialect;

    fn column_count(&self) -> usize;

    fn column(&self, i: usize) -> &ConstrainedColumn;

    fn column_alias(&self, i: usize) -> &str;

    fn is_part_of_select(&self, i: usize) -> bool {
        self.column(i).in_select
    }

    fn measure_count(&self) -> usize;

    /// Fails with [`OlapError::UnknownMeasureIndex`] for `i >= measure_count()`.
    fn measure(&self, i: usize) -> OlapResult<&StarMeasure>;

    fn measure_alias(&self, i: usize) -> OlapResult<&str>;

    /// Aggregating specs wrap measures in their aggregator and group by the selected columns.
    fn is_aggregate(&self) -> bool;

    /// Replaces columns and measures with a single `count(*)`.
    fn is_count_only(&self) -> bool {
        false
    }

    fn slicer(&self) -> Option<&CompoundPredicate> {
        None
    }

    /// Alias of the `count(*)` column of a count-only statement, fitted to the dialect limit.
    fn count_alias(&self) -> OlapResult<String> {
        make_alias(COUNT_ALIAS, &HashSet::new(), max_alias_length(self.dialect()))
    }

    fn measure_expression(&self, i: usize) -> OlapResult<(String, SqlType)> {
        let measure = self.measure(i)?;
        if self.is_aggregate() {
            Ok((measure.aggregate_sql(self.dialect()), measure.aggregate_type()))
        } else {
            Ok((
                measure.column().to_sql(self.dialect()),
                measure.column().sql_type(),
            ))
        }
    }

    /// Hook for selects that follow the measures.
    fn extra_select(&self, _query: &mut SqlQuery<'_>) -> OlapResult<()> {
        Ok(())
    }

    fn build_query(&self, query: &mut SqlQuery<'_>) -> OlapResult<()> {
        let star = self.star();
        let dialect = self.dialect();
        let count_only = self.is_count_only();
        star.add_to_from(query, star.fact().alias())?;

        for i in 0..self.column_count() {
            let constrained = self.column(i);
            star.add_to_from(query, constrained.column.table())?;
            let expr = constrained.column.to_sql(dialect);
            if !constrained.predicate.is_true() {
                query.add_where(constrained.predicate.to_sql(&expr, dialect));
            }
            if self.is_part_of_select(i) && !count_only {
                query.add_select(expr.clone(), constrained.column.sql_type(), self.column_alias(i));
                if self.is_aggregate() {
                    query.add_group_by(expr);
                }
            }
        }

        if count_only {
            let alias = self.count_alias()?;
            query.add_select("count(*)", SqlType::Long, &alias);
        } else {
            for i in 0..self.measure_count() {
                star.add_to_from(query, self.measure(i)?.column().table())?;
                let (expr, sql_type) = self.measure_expression(i)?;
                query.add_select(expr, sql_type, self.measure_alias(i)?);
            }
        }

        if let Some(slicer) = self.slicer() {
            let mut tables = Vec::new();
            slicer.for_each_column(&mut |column| tables.push(column.table()));
            for table in tables {
                star.add_to_from(query, table)?;
            }
            query.add_where(slicer.to_sql(dialect));
        }

        if !count_only {
            self.extra_select(query)?;
        }
        Ok(())
    }

    /// Renders the statement and the declared type of each result column.
    fn generate_sql(&self) -> OlapResult<(String, Vec<SqlType>)> {
        let mut query = SqlQuery::new(self.dialect());
        self.build_query(&mut query)?;
        let (sql, types) = query.to_sql_and_types();
        log::debug!(
            "generated {} columns for star {}: {sql}",
            types.len(),
            self.star().fact().name()
        );
        Ok((sql, types))
    }
}

const COUNT_ALIAS: &str = "count";

/// Effective alias limit for `dialect`; 0 means unlimited.
pub(crate) fn max_alias_length(dialect: &dyn Dialect) -> usize {
    match dialect.max_column_name_length() {
        0 => usize::MAX,
        n => n,
    }
}

/// Assigns output aliases in select order.
#[derive(Debug)]
struct AliasAllocator {
    max_length: usize,
    taken: HashSet<String>,
    assigned: usize,
}

impl AliasAllocator {
    fn new(max_length: usize) -> Self {
        Self {
            max_length,
            taken: HashSet::new(),
            assigned: 0,
        }
    }

    /// `c<N>` with N the number of aliases assigned so far.
    fn synthetic(&self) -> String {
        format!("c{}", self.assigned)
    }

    fn allocate(&mut self, candidate: &str) -> OlapResult<String> {
        let alias = make_alias(candidate, &self.taken, self.max_length)?;
        self.taken.insert(alias.clone());
        self.assigned += 1;
        Ok(alias)
    }

    fn allocate_column(&mut self, column: &StarColumn) -> OlapResult<String> {
        let candidate = match column.name().or_else(|| column.direct_column_name()) {
            Some(name) => name.to_string(),
            None => self.synthetic(),
        };
        self.allocate(&candidate)
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Fits `candidate` into `max_length` characters without colliding with `taken`.
pub(crate) fn make_alias(
    candidate: &str,
    taken: &HashSet<String>,
    max_length: usize,
) -> OlapResult<String> {
    let invalid = || OlapError::InvalidAlias {
        candidate: candidate.to_string(),
        max_length,
    };
    let base = truncate_chars(candidate, max_length);
    if base.is_empty() {
        return Err(invalid());
    }
    if !taken.contains(base) {
        return Ok(base.to_string());
    }

    for k in 0usize.. {
        let suffix = format!("_{k}");
        let suffix_len = suffix.chars().count();
        if suffix_len >= max_length {
            return Err(invalid());
        }
        let base = truncate_chars(candidate, max_length - suffix_len);
        let alias = format!("{base}{suffix}");
        if !taken.contains(&alias) {
            log::trace!("alias {candidate:?} collides, using {alias:?}");
            return Ok(alias);
        }
    }
    Err(invalid())
}

/// Drill-through request: the rows behind one cell.
#[derive(Clone, Debug, Default)]
pub struct DrillThroughRequest {
    columns: Vec<ConstrainedColumn>,
    measures: Vec<StarMeasure>,
    slicer: Option<CompoundPredicate>,
    non_applicable_fields: Vec<String>,
    count_only: bool,
    max_rows: Option<usize>,
}

impl DrillThroughRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: ConstrainedColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_measure(mut self, measure: StarMeasure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn with_slicer(mut self, slicer: CompoundPredicate) -> Self {
        self.slicer = Some(slicer);
        self
    }

    /// A field of a virtual-cube request that this fact table cannot supply; selected as SQL
    /// `null`.
    pub fn with_non_applicable_field(mut self, field: impl Into<String>) -> Self {
        self.non_applicable_fields.push(field.into());
        self
    }

    pub fn count_only(mut self) -> Self {
        self.count_only = true;
        self
    }

    /// Row limit for the statement executor; not rendered into the SQL.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn columns(&self) -> &[ConstrainedColumn] {
        &self.columns
    }

    pub fn non_applicable_fields(&self) -> &[String] {
        &self.non_applicable_fields
    }

    pub fn is_count_only(&self) -> bool {
        self.count_only
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }
}

#[derive(Debug)]
pub struct DrillThroughQuerySpec<'a> {
    star: &'a Star,
    dialect: &'a dyn Dialect,
    request: DrillThroughRequest,
    measures: Vec<StarMeasure>,
    column_aliases: Vec<String>,
    measure_aliases: Vec<String>,
    field_aliases: Vec<String>,
    count_alias: Option<String>,
}

impl<'a> DrillThroughQuerySpec<'a> {
    /// Resolves the measures and assigns every alias up front. Without requested measures the
    /// star's implicit measure is used.
    pub fn new(
        star: &'a Star,
        dialect: &'a dyn Dialect,
        request: DrillThroughRequest,
    ) -> OlapResult<Self> {
        let measures = if request.measures.is_empty() {
            let implicit = star.implicit_measure().ok_or_else(|| {
                OlapError::Config(format!(
                    "drill-through on star {} names no measure and the star has no implicit measure",
                    star.fact().name()
                ))
            })?;
            vec![implicit.clone()]
        } else {
            request.measures.clone()
        };

        let mut aliases = AliasAllocator::new(max_alias_length(dialect));
        let column_aliases = request
            .columns
            .iter()
            .map(|c| aliases.allocate_column(&c.column))
            .collect::<OlapResult<Vec<_>>>()?;
        let measure_aliases = measures
            .iter()
            .map(|m| aliases.allocate(m.name()))
            .collect::<OlapResult<Vec<_>>>()?;
        let field_aliases = request
            .non_applicable_fields
            .iter()
            .map(|f| aliases.allocate(f))
            .collect::<OlapResult<Vec<_>>>()?;
        let count_alias = if request.count_only {
            Some(make_alias(COUNT_ALIAS, &HashSet::new(), max_alias_length(dialect))?)
        } else {
            None
        };

        Ok(Self {
            star,
            dialect,
            request,
            measures,
            column_aliases,
            measure_aliases,
            field_aliases,
            count_alias,
        })
    }

    pub fn request(&self) -> &DrillThroughRequest {
        &self.request
    }

    pub fn column_aliases(&self) -> &[String] {
        &self.column_aliases
    }

    pub fn measure_aliases(&self) -> &[String] {
        &self.measure_aliases
    }

    pub fn field_aliases(&self) -> &[String] {
        &self.field_aliases
    }

    /// All aliases in select order. A count-only statement selects just its count column.
    pub fn select_aliases(&self) -> Vec<&str> {
        if let Some(alias) = &self.count_alias {
            return vec![alias.as_str()];
        }
        let columns = self
            .column_aliases
            .iter()
            .enumerate()
            .filter(|(i, _)| self.request.columns[*i].in_select)
            .map(|(_, a)| a.as_str());
        columns
            .chain(self.measure_aliases.iter().map(String::as_str))
            .chain(self.field_aliases.iter().map(String::as_str))
            .collect()
    }
}

impl QuerySpec for DrillThroughQuerySpec<'_> {
    fn star(&self) -> &Star {
        self.star
    }

    fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    fn column_count(&self) -> usize {
        self.request.columns.len()
    }

    fn column(&self, i: usize) -> &ConstrainedColumn {
        &self.request.columns[i]
    }

    fn column_alias(&self, i: usize) -> &str {
        &self.column_aliases[i]
    }

    fn measure_count(&self) -> usize {
        self.measures.len()
    }

    fn measure(&self, i: usize) -> OlapResult<&StarMeasure> {
        self.measures.get(i).ok_or(OlapError::UnknownMeasureIndex {
            index: i,
            count: self.measures.len(),
        })
    }

    fn measure_alias(&self, i: usize) -> OlapResult<&str> {
        self.measure_aliases
            .get(i)
            .map(String::as_str)
            .ok_or(OlapError::UnknownMeasureIndex {
                index: i,
                count: self.measure_aliases.len(),
            })
    }

    fn is_aggregate(&self) -> bool {
        false
    }

    fn is_count_only(&self) -> bool {
        self.request.count_only
    }

    fn slicer(&self) -> Option<&CompoundPredicate> {
        self.request.slicer.as_ref()
    }

    fn count_alias(&self) -> OlapResult<String> {
        match &self.count_alias {
            Some(alias) => Ok(alias.clone()),
            None => make_alias(COUNT_ALIAS, &HashSet::new(), max_alias_length(self.dialect)),
        }
    }

    fn extra_select(&self, query: &mut SqlQuery<'_>) -> OlapResult<()> {
        for alias in &self.field_aliases {
            query.add_select("null", SqlType::Object, alias);
        }
        Ok(())
    }
}

/// Cell-loading request: aggregated measures grouped by the constrained columns.
#[derive(Clone, Debug, Default)]
pub struct SegmentRequest {
    columns: Vec<ConstrainedColumn>,
    measures: Vec<StarMeasure>,
    slicer: Option<CompoundPredicate>,
}

impl SegmentRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: ConstrainedColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_measure(mut self, measure: StarMeasure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn with_slicer(mut self, slicer: CompoundPredicate) -> Self {
        self.slicer = Some(slicer);
        self
    }
}

/// Aliases are positional (`c0`, `c1`, ... for columns, `m0`, `m1`, ... for measures).
#[derive(Debug)]
pub struct SegmentQuerySpec<'a> {
    star: &'a Star,
    dialect: &'a dyn Dialect,
    request: SegmentRequest,
    column_aliases: Vec<String>,
    measure_aliases: Vec<String>,
}

impl<'a> SegmentQuerySpec<'a> {
    pub fn new(
        star: &'a Star,
        dialect: &'a dyn Dialect,
        request: SegmentRequest,
    ) -> OlapResult<Self> {
        if request.measures.is_empty() {
            return Err(OlapError::Config(format!(
                "segment request on star {} has no measures",
                star.fact().name()
            )));
        }
        let mut aliases = AliasAllocator::new(max_alias_length(dialect));
        let column_aliases = (0..request.columns.len())
            .map(|i| aliases.allocate(&format!("c{i}")))
            .collect::<OlapResult<Vec<_>>>()?;
        let measure_aliases = (0..request.measures.len())
            .map(|i| aliases.allocate(&format!("m{i}")))
            .collect::<OlapResult<Vec<_>>>()?;
        Ok(Self {
            star,
            dialect,
            request,
            column_aliases,
            measure_aliases,
        })
    }

    pub fn column_aliases(&self) -> &[String] {
        &self.column_aliases
    }

    pub fn measure_aliases(&self) -> &[String] {
        &self.measure_aliases
    }
}

impl QuerySpec for SegmentQuerySpec<'_> {
    fn star(&self) -> &Star {
        self.star
    }

    fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    fn column_count(&self) -> usize {
        self.request.columns.len()
    }

    fn column(&self, i: usize) -> &ConstrainedColumn {
        &self.request.columns[i]
    }

    fn column_alias(&self, i: usize) -> &str {
        &self.column_aliases[i]
    }

    fn measure_count(&self) -> usize {
        self.request.measures.len()
    }

    fn measure(&self, i: usize) -> OlapResult<&StarMeasure> {
        self.request
            .measures
            .get(i)
            .ok_or(OlapError::UnknownMeasureIndex {
                index: i,
                count: self.request.measures.len(),
            })
    }

    fn measure_alias(&self, i: usize) -> OlapResult<&str> {
        self.measure_aliases
            .get(i)
            .map(String::as_str)
            .ok_or(OlapError::UnknownMeasureIndex {
                index: i,
                count: self.measure_aliases.len(),
            })
    }

    fn is_aggregate(&self) -> bool {
        true
    }

    fn slicer(&self) -> Option<&CompoundPredicate> {
        self.request.slicer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn truncates_to_limit() {
        assert_eq!(make_alias("region_name", &taken(&[]), 10).unwrap(), "region_nam");
        assert_eq!(make_alias("store_id", &taken(&[]), 10).unwrap(), "store_id");
        assert_eq!(
            make_alias("store_id", &taken(&[]), usize::MAX).unwrap(),
            "store_id"
        );
    }

    #[test]
    fn suffixes_shorten_the_base() {
        let t = taken(&["region_nam"]);
        assert_eq!(make_alias("region_name", &t, 10).unwrap(), "region_n_0");

        let t = taken(&["region_nam", "region_n_0", "region_n_1"]);
        assert_eq!(make_alias("region_name", &t, 10).unwrap(), "region_n_2");

        let t = taken(&["amount"]);
        assert_eq!(make_alias("amount", &t, 30).unwrap(), "amount_0");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(make_alias("größe_gesamt", &taken(&[]), 5).unwrap(), "größe");
    }

    #[test]
    fn unusable_limits_are_configuration_errors() {
        let err = make_alias("", &taken(&[]), 10).unwrap_err();
        assert!(err.is_configuration());

        let err = make_alias("x", &taken(&[]), 0).unwrap_err();
        assert!(matches!(err, OlapError::InvalidAlias { .. }));

        // "_0" alone already fills a two-character limit
        let err = make_alias("ab", &taken(&["ab"]), 2).unwrap_err();
        assert!(matches!(err, OlapError::InvalidAlias { max_length: 2, .. }));
    }
}
