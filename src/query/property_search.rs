//! Dynamic SQL for the property search page.
//!
//! Every populated filter becomes one clause with one bound parameter. Clauses
//! and parameters are collected side by side and only turned into SQL text in
//! [`PropertySearchBuilder::build`], which numbers placeholders as it emits them.

use tracing::debug;

/// Number of properties returned when the caller gives no limit
pub const DEFAULT_LIMIT: i64 = 10;

/// Whole currency units to cents, the unit `cost_per_night` is stored in
const CENTS_PER_UNIT: i64 = 100;

// `WHERE 1 = 1` lets every filter be appended as `AND ...`.
const BASE_QUERY: &str = "SELECT properties.*, avg(property_reviews.rating)::float8 AS average_rating
FROM properties
LEFT JOIN property_reviews ON properties.id = property_reviews.property_id
WHERE 1 = 1
";

/// Optional search criteria; an absent field applies no constraint.
///
/// A numeric field set to zero is treated as absent by
/// [`build_property_search_query`], the way the search form's "any" value is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    /// Case-insensitive substring of the city name
    pub city: Option<String>,
    /// Whole currency units
    pub minimum_price_per_night: Option<i64>,
    /// Whole currency units
    pub maximum_price_per_night: Option<i64>,
    pub owner_id: Option<i32>,
    pub minimum_rating: Option<f64>,
}

impl PropertyFilter {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.minimum_price_per_night.is_none()
            && self.maximum_price_per_night.is_none()
            && self.owner_id.is_none()
            && self.minimum_rating.is_none()
    }
}

/// A positional query parameter, typed so it binds with the matching Postgres type
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
    Float(f64),
}

/// SQL text plus the parameters for `$1..$n`, in order
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Where,
    Having,
}

#[derive(Debug, Clone)]
struct Clause {
    section: Section,
    /// Left-hand side and operator, e.g. `cost_per_night >`
    predicate: &'static str,
}

#[derive(Debug, Clone)]
pub struct PropertySearchBuilder {
    clauses: Vec<Clause>,
    params: Vec<QueryParam>,
    limit: i64,
}

impl Default for PropertySearchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertySearchBuilder {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn city(self, city: &str) -> Self {
        self.push(
            Section::Where,
            "properties.city ILIKE",
            QueryParam::Text(format!("%{}%", city)),
        )
    }

    /// `price` is in whole currency units
    pub fn minimum_price(self, price: i64) -> Self {
        self.push(
            Section::Where,
            "cost_per_night >",
            QueryParam::Int(price.saturating_mul(CENTS_PER_UNIT)),
        )
    }

    /// `price` is in whole currency units
    pub fn maximum_price(self, price: i64) -> Self {
        self.push(
            Section::Where,
            "cost_per_night <",
            QueryParam::Int(price.saturating_mul(CENTS_PER_UNIT)),
        )
    }

    pub fn owner(self, owner_id: i32) -> Self {
        self.push(
            Section::Where,
            "properties.owner_id =",
            QueryParam::Int(i64::from(owner_id)),
        )
    }

    /// Filters on the aggregate, so it lands in `HAVING`
    pub fn minimum_rating(self, rating: f64) -> Self {
        self.push(
            Section::Having,
            "avg(property_reviews.rating) >",
            QueryParam::Float(rating),
        )
    }

    fn push(mut self, section: Section, predicate: &'static str, param: QueryParam) -> Self {
        self.clauses.push(Clause { section, predicate });
        self.params.push(param);
        self
    }

    /// Emit the final SQL in one pass
    pub fn build(self) -> BuiltQuery {
        let mut filters: Vec<(Clause, QueryParam)> = Vec::with_capacity(self.clauses.len());
        let mut aggregates: Vec<(Clause, QueryParam)> = Vec::new();
        for (clause, param) in self.clauses.into_iter().zip(self.params) {
            match clause.section {
                Section::Where => filters.push((clause, param)),
                Section::Having => aggregates.push((clause, param)),
            }
        }

        let mut sql = String::from(BASE_QUERY);
        let mut params = Vec::with_capacity(filters.len() + aggregates.len() + 1);

        for (clause, param) in filters {
            params.push(param);
            sql.push_str(&format!("AND {} ${}\n", clause.predicate, params.len()));
        }

        sql.push_str("GROUP BY properties.id\n");

        for (i, (clause, param)) in aggregates.into_iter().enumerate() {
            params.push(param);
            let keyword = if i == 0 { "HAVING" } else { "AND" };
            sql.push_str(&format!("{} {} ${}\n", keyword, clause.predicate, params.len()));
        }

        params.push(QueryParam::Int(self.limit));
        sql.push_str(&format!("ORDER BY cost_per_night\nLIMIT ${};", params.len()));

        BuiltQuery { sql, params }
    }
}

/// Build the property search query for `criteria`.
///
/// Filters are applied in a fixed order: city, minimum price, maximum price,
/// owner, then minimum rating. `limit` falls back to [`DEFAULT_LIMIT`].
pub fn build_property_search_query(criteria: &PropertyFilter, limit: Option<i64>) -> BuiltQuery {
    let mut builder = PropertySearchBuilder::new().limit(limit.unwrap_or(DEFAULT_LIMIT));

    if let Some(city) = &criteria.city {
        builder = builder.city(city);
    }
    if let Some(price) = criteria.minimum_price_per_night.filter(|p| *p != 0) {
        builder = builder.minimum_price(price);
    }
    if let Some(price) = criteria.maximum_price_per_night.filter(|p| *p != 0) {
        builder = builder.maximum_price(price);
    }
    if let Some(owner_id) = criteria.owner_id.filter(|id| *id != 0) {
        builder = builder.owner(owner_id);
    }
    if let Some(rating) = criteria.minimum_rating.filter(|r| *r != 0.0) {
        builder = builder.minimum_rating(rating);
    }

    let query = builder.build();
    debug!(sql = %query.sql, params = ?query.params, "Built property search query");
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Placeholder numbers in order of appearance
    fn placeholders(sql: &str) -> Vec<usize> {
        let mut found = Vec::new();
        let bytes = sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    found.push(sql[start..end].parse().unwrap());
                }
                i = end;
            } else {
                i += 1;
            }
        }
        found
    }

    fn full_filter() -> PropertyFilter {
        PropertyFilter {
            city: Some("Vancouver".to_string()),
            minimum_price_per_night: Some(50),
            maximum_price_per_night: Some(150),
            owner_id: Some(4),
            minimum_rating: Some(3.5),
        }
    }

    #[test]
    fn test_no_criteria_binds_only_limit() {
        let query = build_property_search_query(&PropertyFilter::default(), Some(10));

        assert_eq!(query.params, vec![QueryParam::Int(10)]);
        assert_eq!(placeholders(&query.sql), vec![1]);
        assert!(query.sql.contains("WHERE 1 = 1\nGROUP BY properties.id"));
        assert!(query.sql.ends_with("ORDER BY cost_per_night\nLIMIT $1;"));
        assert!(!query.sql.contains("HAVING"));
    }

    #[test]
    fn test_default_limit() {
        let query = build_property_search_query(&PropertyFilter::default(), None);
        assert_eq!(query.params, vec![QueryParam::Int(DEFAULT_LIMIT)]);
        assert_eq!(DEFAULT_LIMIT, 10);
    }

    #[test]
    fn test_limit_is_last_parameter_and_single() {
        for limit in [1, 10, 25, 500] {
            let query = build_property_search_query(&full_filter(), Some(limit));

            assert_eq!(query.sql.matches("LIMIT").count(), 1);
            assert_eq!(query.params.last(), Some(&QueryParam::Int(limit)));
            assert!(query
                .sql
                .ends_with(&format!("LIMIT ${};", query.params.len())));
        }
    }

    #[test]
    fn test_city_is_wildcarded_and_case_insensitive() {
        let filter = PropertyFilter {
            city: Some("boston".to_string()),
            ..Default::default()
        };
        let query = build_property_search_query(&filter, None);

        assert_eq!(query.params[0], QueryParam::Text("%boston%".to_string()));
        assert!(query.sql.contains("AND properties.city ILIKE $1"));
    }

    #[test]
    fn test_price_bounds_converted_to_cents() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some(50),
            maximum_price_per_night: Some(150),
            ..Default::default()
        };
        let query = build_property_search_query(&filter, None);

        assert_eq!(
            query.params,
            vec![
                QueryParam::Int(5000),
                QueryParam::Int(15000),
                QueryParam::Int(10)
            ]
        );
        assert!(query.sql.contains("AND cost_per_night > $1"));
        assert!(query.sql.contains("AND cost_per_night < $2"));
    }

    #[test]
    fn test_hundred_units_binds_ten_thousand_cents() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some(100),
            ..Default::default()
        };
        let query = build_property_search_query(&filter, None);
        assert_eq!(query.params[0], QueryParam::Int(10000));
    }

    #[test]
    fn test_inverted_price_bounds_are_not_rejected() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some(300),
            maximum_price_per_night: Some(100),
            ..Default::default()
        };
        let query = build_property_search_query(&filter, None);
        assert_eq!(query.params.len(), 3);
    }

    #[test]
    fn test_owner_is_exact_match() {
        let filter = PropertyFilter {
            owner_id: Some(42),
            ..Default::default()
        };
        let query = build_property_search_query(&filter, None);

        assert_eq!(query.params[0], QueryParam::Int(42));
        assert!(query.sql.contains("AND properties.owner_id = $1"));
    }

    #[test]
    fn test_minimum_rating_uses_having_after_group_by() {
        let filter = PropertyFilter {
            city: Some("Toronto".to_string()),
            minimum_rating: Some(4.0),
            ..Default::default()
        };
        let query = build_property_search_query(&filter, None);

        let group_by = query.sql.find("GROUP BY properties.id").unwrap();
        let having = query
            .sql
            .find("HAVING avg(property_reviews.rating) > $2")
            .unwrap();
        assert!(having > group_by);
        assert!(!query.sql.contains("AND property_reviews.rating"));
        assert_eq!(query.params[1], QueryParam::Float(4.0));
    }

    #[test]
    fn test_filters_appended_in_fixed_order() {
        let query = build_property_search_query(&full_filter(), Some(5));

        let positions: Vec<usize> = [
            "properties.city ILIKE $1",
            "cost_per_night > $2",
            "cost_per_night < $3",
            "properties.owner_id = $4",
            "GROUP BY",
            "HAVING avg(property_reviews.rating) > $5",
            "ORDER BY cost_per_night",
            "LIMIT $6",
        ]
        .iter()
        .map(|fragment| query.sql.find(fragment).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            query.params,
            vec![
                QueryParam::Text("%Vancouver%".to_string()),
                QueryParam::Int(5000),
                QueryParam::Int(15000),
                QueryParam::Int(4),
                QueryParam::Float(3.5),
                QueryParam::Int(5),
            ]
        );
    }

    #[test]
    fn test_placeholders_contiguous_for_every_combination() {
        for mask in 0u8..32 {
            let filter = PropertyFilter {
                city: (mask & 1 != 0).then(|| "Calgary".to_string()),
                minimum_price_per_night: (mask & 2 != 0).then_some(80),
                maximum_price_per_night: (mask & 4 != 0).then_some(200),
                owner_id: (mask & 8 != 0).then_some(9),
                minimum_rating: (mask & 16 != 0).then_some(2.5),
            };
            let query = build_property_search_query(&filter, Some(20));

            let expected: Vec<usize> = (1..=query.params.len()).collect();
            assert_eq!(placeholders(&query.sql), expected, "mask {:05b}", mask);
            assert_eq!(query.params.len(), mask.count_ones() as usize + 1);
            assert_eq!(query.params.last(), Some(&QueryParam::Int(20)));
        }
    }

    #[test]
    fn test_builder_numbers_by_emission_order() {
        // Rating pushed first still gets the placeholder after the WHERE filters.
        let query = PropertySearchBuilder::new()
            .minimum_rating(4.5)
            .city("Montreal")
            .build();

        assert!(query.sql.contains("AND properties.city ILIKE $1"));
        assert!(query.sql.contains("HAVING avg(property_reviews.rating) > $2"));
        assert_eq!(
            query.params,
            vec![
                QueryParam::Text("%Montreal%".to_string()),
                QueryParam::Float(4.5),
                QueryParam::Int(DEFAULT_LIMIT),
            ]
        );
    }

    #[test]
    fn test_zero_values_apply_no_constraint() {
        let criteria = PropertyFilter {
            minimum_price_per_night: Some(0),
            maximum_price_per_night: Some(0),
            owner_id: Some(0),
            minimum_rating: Some(0.0),
            ..Default::default()
        };
        let query = build_property_search_query(&criteria, None);

        assert_eq!(query.params, vec![QueryParam::Int(DEFAULT_LIMIT)]);
        assert!(!query.sql.contains("cost_per_night >"));
        assert!(!query.sql.contains("owner_id ="));
        assert!(!query.sql.contains("HAVING"));
        assert!(query.sql.ends_with("LIMIT $1;"));
    }

    #[test]
    fn test_zero_minimum_with_real_maximum() {
        let criteria = PropertyFilter {
            minimum_price_per_night: Some(0),
            maximum_price_per_night: Some(150),
            ..Default::default()
        };
        let query = build_property_search_query(&criteria, Some(5));

        assert_eq!(
            query.params,
            vec![QueryParam::Int(15_000), QueryParam::Int(5)]
        );
        assert!(query.sql.contains("cost_per_night < $1"));
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(PropertyFilter::default().is_empty());
        assert!(!full_filter().is_empty());
    }
}
