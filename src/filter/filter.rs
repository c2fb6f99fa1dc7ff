use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{validate_column, FilterWhere};
use super::types::{FilterOrderInfo, SortDirection, SqlParam, SqlResult};

/// Builds paginated `SELECT` and matching `COUNT(*)` statements for one table
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: FilterWhere,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<u32>,
    offset: Option<u64>,
    max_limit: u32,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: FilterWhere::new(),
            order_data: vec![],
            limit: None,
            offset: None,
            max_limit: 100,
        })
    }

    pub fn max_limit(&mut self, max_limit: u32) -> &mut Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn select(&mut self, columns: &[&str]) -> Result<&mut Self, FilterError> {
        for column in columns {
            if *column != "*" {
                validate_column(column)?;
            }
        }
        self.select_columns = columns.iter().map(|c| c.to_string()).collect();
        Ok(self)
    }

    pub fn where_eq(&mut self, column: &str, value: SqlParam) -> Result<&mut Self, FilterError> {
        self.where_data.eq(column, value)?;
        Ok(self)
    }

    pub fn where_null(&mut self, column: &str) -> Result<&mut Self, FilterError> {
        self.where_data.is_null(column)?;
        Ok(self)
    }

    pub fn search(&mut self, columns: &[&str], term: &str) -> Result<&mut Self, FilterError> {
        let term = term.trim();
        if !term.is_empty() {
            self.where_data.contains_any(columns, term)?;
        }
        Ok(self)
    }

    pub fn order(&mut self, column: &str, sort: SortDirection) -> &mut Self {
        self.order_data.push(FilterOrderInfo {
            column: column.to_string(),
            sort,
            ranking: None,
        });
        self
    }

    /// Order by an explicit value ranking (highest-ranked first when descending)
    pub fn order_ranked(&mut self, column: &str, ranking: &'static [&'static str], sort: SortDirection) -> &mut Self {
        self.order_data.push(FilterOrderInfo {
            column: column.to_string(),
            sort,
            ranking: Some(ranking),
        });
        self
    }

    pub fn limit(&mut self, limit: u32, offset: Option<u64>) -> Result<&mut Self, FilterError> {
        if limit == 0 {
            return Err(FilterError::InvalidLimit("Limit must be positive".to_string()));
        }
        let applied_limit = if limit > self.max_limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", limit, self.max_limit);
            self.max_limit
        } else {
            limit
        };
        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_clause = self.where_data.to_sql();
        let order_clause = FilterOrder::generate(&self.order_data)?;

        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult {
            query,
            params: self.where_data.params().to_vec(),
        })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let query = if self.where_data.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!(
                "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
                self.table_name,
                self.where_data.to_sql()
            )
        };
        Ok(SqlResult {
            query,
            params: self.where_data.params().to_vec(),
        })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        validate_column(name).map_err(|_| FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}
