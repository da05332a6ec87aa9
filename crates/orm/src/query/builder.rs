//! Fluent query builder bound to one entity.

use serde_json::Value;
use tracing::debug;

use crate::backends::DatabaseHandle;
use crate::error::OrmResult;
use crate::hydration::hydrate_all;
use crate::instance::Instance;
use crate::metadata::EntityDescriptor;

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Accumulates predicate, join, ordering, and pagination fragments and
/// renders them into one parameterized statement.
///
/// `where_clause` and `and_where` are interchangeable: both append to an
/// AND-joined predicate list and push their parameters in call order.
/// There is no OR combinator. `order_by` keeps a single key; a later call
/// overwrites an earlier one. Join fragments are raw strings and
/// contribute no parameters, so the rendered parameter list is exactly
/// the `where` parameters in call order.
pub struct QueryBuilder {
    descriptor: EntityDescriptor,
    db: DatabaseHandle,
    select_fields: Vec<String>,
    joins: Vec<String>,
    predicates: Vec<String>,
    params: Vec<Value>,
    order: Option<(String, OrderDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    pub(crate) fn new(descriptor: EntityDescriptor, db: DatabaseHandle) -> Self {
        Self {
            descriptor,
            db,
            select_fields: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
            params: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    /// Replace the default `*` projection.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append a predicate with its positional parameters.
    pub fn where_clause(mut self, condition: &str, params: Vec<Value>) -> Self {
        self.predicates.push(condition.to_string());
        self.params.extend(params);
        self
    }

    /// Identical to [`where_clause`](Self::where_clause).
    pub fn and_where(self, condition: &str, params: Vec<Value>) -> Self {
        self.where_clause(condition, params)
    }

    /// Set the single order key; overwrites any earlier one.
    pub fn order_by(mut self, field: &str, direction: OrderDirection) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Offset is rendered only together with a limit.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Append an inner join; the condition is a raw string and carries no
    /// parameters.
    pub fn join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(format!("INNER JOIN {} ON {}", table, on));
        self
    }

    /// Append a left join; same contract as [`join`](Self::join).
    pub fn left_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(format!("LEFT JOIN {} ON {}", table, on));
        self
    }

    /// Render the statement and its positional parameters.
    ///
    /// Clause order is fixed: SELECT, FROM, joins, WHERE, ORDER BY,
    /// LIMIT/OFFSET.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.descriptor.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }

        if let Some((field, direction)) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(field);
            sql.push(' ');
            sql.push_str(direction.as_sql());
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        (sql, self.params.clone())
    }

    /// Execute and map every row to an instance of the bound entity.
    pub async fn get_many(self) -> OrmResult<Vec<Instance>> {
        let (sql, params) = self.to_sql();
        debug!(%sql, "running query builder statement");
        let rows = self.db.fetch_all(&sql, &params).await?;
        Ok(hydrate_all(&self.descriptor, &rows))
    }

    /// Execute and return the first mapped instance, if any.
    pub async fn get_one(self) -> OrmResult<Option<Instance>> {
        Ok(self.get_many().await?.into_iter().next())
    }
}
