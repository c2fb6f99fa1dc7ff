use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, SqlParam};

/// Runs a [`Filter`]'s select and count statements, decoding rows as `T`
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    /// Page rows plus the unpaginated total
    pub async fn select_page(&self, pool: &PgPool) -> Result<(Vec<T>, u64), DatabaseError> {
        let rows = self.select_all(pool).await?;
        let total = self.count(pool).await?;
        Ok((rows, total.max(0) as u64))
    }
}

pub(crate) fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Uuid(u) => q.bind(*u),
    }
}

pub(crate) fn bind_param_query_as<'q, T>(
    q: sqlx::query::QueryAs<'q, Postgres, T, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, Postgres, T, PgArguments> {
    match v {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Uuid(u) => q.bind(*u),
    }
}
