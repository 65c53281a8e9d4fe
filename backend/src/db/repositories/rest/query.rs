//! PostgREST query parameter builder.
//!
//! Filters are rendered as `column=operator.value` pairs; the HTTP client
//! takes care of percent-encoding.

/// Sort direction for `order=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl std::fmt::Display) -> Self {
        self.filters
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "lte", value)
    }

    pub fn lt(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "lt", value)
    }

    /// Case-insensitive substring match.
    pub fn ilike(self, column: &str, needle: &str) -> Self {
        self.filter(column, "ilike", format!("*{}*", needle))
    }

    pub fn in_list<T: std::fmt::Display>(self, column: &str, values: &[T]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({})", joined))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    pub fn order(mut self, column: &str, direction: Order) -> Self {
        self.order
            .push(format!("{}.{}", column, direction.as_str()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Query pairs in request order: select, filters, order, limit, offset.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 4);
        pairs.push((
            "select".to_string(),
            self.select.clone().unwrap_or_else(|| "*".to_string()),
        ));
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }

    /// Unencoded rendering, for logs.
    pub fn render(&self) -> String {
        self.pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selects_everything() {
        assert_eq!(QueryBuilder::new().render(), "select=*");
    }

    #[test]
    fn test_filters_keep_insertion_order() {
        let query = QueryBuilder::new()
            .eq("client_id", "abc")
            .gte("transaction_date", "2025-01-01")
            .lte("transaction_date", "2025-01-31")
            .order("transaction_date", Order::Desc)
            .order("created_at", Order::Desc)
            .limit(50)
            .offset(100);
        assert_eq!(
            query.render(),
            "select=*&client_id=eq.abc&transaction_date=gte.2025-01-01\
             &transaction_date=lte.2025-01-31&order=transaction_date.desc,created_at.desc\
             &limit=50&offset=100"
        );
    }

    #[test]
    fn test_ilike_in_and_null() {
        let query = QueryBuilder::new()
            .select("id,name")
            .ilike("name", "silva")
            .in_list("status", &["Ativa", "Renovada"])
            .is_null("deleted_at");
        assert_eq!(
            query.pairs(),
            vec![
                ("select".to_string(), "id,name".to_string()),
                ("name".to_string(), "ilike.*silva*".to_string()),
                ("status".to_string(), "in.(Ativa,Renovada)".to_string()),
                ("deleted_at".to_string(), "is.null".to_string()),
            ]
        );
    }
}
