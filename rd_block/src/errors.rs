use rd_types::MetricId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error(
        "No abundance column is selected. Pick an abundance column before the \
         distances can be computed."
    )]
    MissingAbundanceRef,

    #[error("There is no metric with id '{id}' in the metric list.")]
    UnknownMetric { id: MetricId },
}
