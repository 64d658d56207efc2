pub mod property_search;

pub use property_search::{
    build_property_search_query, BuiltQuery, PropertyFilter, PropertySearchBuilder, QueryParam,
    DEFAULT_LIMIT,
};
