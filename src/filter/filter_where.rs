use super::error::FilterError;
use super::types::SqlParam;

/// Accumulates AND-joined predicates with positional `$n` placeholders
#[derive(Debug, Default, Clone)]
pub struct FilterWhere {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_placeholder(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    pub fn eq(&mut self, column: &str, value: SqlParam) -> Result<(), FilterError> {
        validate_column(column)?;
        let placeholder = self.next_placeholder(value);
        self.conditions.push(format!("\"{}\" = {}", column, placeholder));
        Ok(())
    }

    pub fn is_null(&mut self, column: &str) -> Result<(), FilterError> {
        validate_column(column)?;
        self.conditions.push(format!("\"{}\" IS NULL", column));
        Ok(())
    }

    /// Case-insensitive substring match against any of `columns`
    pub fn contains_any(&mut self, columns: &[&str], term: &str) -> Result<(), FilterError> {
        if columns.is_empty() {
            return Ok(());
        }
        for column in columns {
            validate_column(column)?;
        }
        let placeholder = self.next_placeholder(SqlParam::Text(like_pattern(term)));
        let parts: Vec<String> = columns
            .iter()
            .map(|c| format!("\"{}\" ILIKE {} ESCAPE '\\'", c, placeholder))
            .collect();
        self.conditions.push(format!("({})", parts.join(" OR ")));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn to_sql(&self) -> String {
        self.conditions.join(" AND ")
    }
}

/// `%term%` with LIKE metacharacters escaped
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
    let mut chars = column.chars();
    let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
    if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_in_order() {
        let mut w = FilterWhere::new();
        w.eq("status", SqlParam::Text("NEW".into())).unwrap();
        w.contains_any(&["title", "description"], "reactor").unwrap();
        assert_eq!(
            w.to_sql(),
            "\"status\" = $1 AND (\"title\" ILIKE $2 ESCAPE '\\' OR \"description\" ILIKE $2 ESCAPE '\\')"
        );
        assert_eq!(w.params().len(), 2);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[test]
    fn rejects_injection_in_column_names() {
        let mut w = FilterWhere::new();
        assert!(w.eq("status; DROP TABLE tickets", SqlParam::Int(1)).is_err());
        assert!(w.is_null("1abc").is_err());
    }
}
