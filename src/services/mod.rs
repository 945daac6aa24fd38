mod aggregation_service_impl;

pub use aggregation_service_impl::{
    AggregationServiceBuilder, AggregationServiceImpl, COMBINED_CONTENT_TYPE,
};
