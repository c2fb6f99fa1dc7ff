use super::error::FilterError;
use super::filter_where::validate_column;
use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            validate_column(&info.column)?;
            parts.push(match info.ranking {
                Some(ranking) => format!("{} {}", Self::rank_expression(&info.column, ranking), info.sort.to_sql()),
                None => format!("\"{}\" {}", info.column, info.sort.to_sql()),
            });
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }

    /// `CASE` expression mapping the first ranked value to the highest number
    fn rank_expression(column: &str, ranking: &[&str]) -> String {
        let whens: Vec<String> = ranking
            .iter()
            .enumerate()
            .map(|(i, value)| format!("WHEN '{}' THEN {}", value.replace('\'', "''"), ranking.len() - i))
            .collect();
        format!("CASE \"{}\" {} ELSE 0 END", column, whens.join(" "))
    }
}
