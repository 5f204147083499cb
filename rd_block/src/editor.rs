//! Add, remove and edit entries of the UI metric list.

use crate::errors::BlockError;
use crate::ids::{next_unique, IdSource};
use log::debug;
use rd_types::{
    DistanceType, Downsampling, IntersectionType, Metric, MetricId, MetricUi,
};

/// Edits one metric list in place. No validation happens here: any
/// combination of distance, intersection and downsampling is accepted and
/// left for the compute engine to judge.
pub struct MetricListEditor<'a> {
    metrics: &'a mut Vec<MetricUi>,
    ids: &'a dyn IdSource,
}

impl<'a> MetricListEditor<'a> {
    pub fn new(metrics: &'a mut Vec<MetricUi>, ids: &'a dyn IdSource) -> Self {
        MetricListEditor { metrics, ids }
    }

    pub fn metrics(&self) -> &[MetricUi] {
        self.metrics.as_slice()
    }

    /// Append an empty, expanded metric and return its id.
    pub fn add_metric(&mut self) -> MetricId {
        let id = next_unique(self.ids, self.metrics.as_slice());
        debug!("adding metric {id}");
        self.metrics.push(MetricUi::new(
            id.clone(),
            Metric::new(None, None, Downsampling::none_auto()),
            true,
        ));
        id
    }

    pub fn remove_metric(&mut self, id: &MetricId) -> Result<MetricUi, BlockError> {
        let index = self.position(id)?;
        debug!("removing metric {id}");
        Ok(self.metrics.remove(index))
    }

    pub fn metric_mut(&mut self, id: &MetricId) -> Result<&mut MetricUi, BlockError> {
        let index = self.position(id)?;
        Ok(&mut self.metrics[index])
    }

    pub fn set_type(
        &mut self,
        id: &MetricId,
        kind: Option<DistanceType>,
    ) -> Result<(), BlockError> {
        self.metric_mut(id)?.metric.kind = kind;
        Ok(())
    }

    pub fn set_intersection(
        &mut self,
        id: &MetricId,
        intersection: Option<IntersectionType>,
    ) -> Result<(), BlockError> {
        self.metric_mut(id)?.metric.intersection = intersection;
        Ok(())
    }

    pub fn set_downsampling(
        &mut self,
        id: &MetricId,
        downsampling: Downsampling,
    ) -> Result<(), BlockError> {
        self.metric_mut(id)?.metric.downsampling = downsampling;
        Ok(())
    }

    pub fn set_expanded(&mut self, id: &MetricId, is_expanded: bool) -> Result<(), BlockError> {
        self.metric_mut(id)?.is_expanded = is_expanded;
        Ok(())
    }

    fn position(&self, id: &MetricId) -> Result<usize, BlockError> {
        self.metrics
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| BlockError::UnknownMetric { id: id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DefaultsProvider;
    use crate::ids::{MetricIdGenerator, SequentialIds};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rd_types::{DownsamplingType, ValueChooser};
    use std::collections::HashSet;

    #[test]
    fn test_add_metric_defaults() {
        let ids = SequentialIds::new("seed");
        let mut metrics = DefaultsProvider::default().metrics(&ids);
        let before = metrics.clone();

        let id = MetricListEditor::new(&mut metrics, &ids).add_metric();

        assert_eq!(metrics.len(), before.len() + 1);
        assert_eq!(&metrics[..before.len()], &before[..]);
        let added = metrics.last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.metric.kind, None);
        assert_eq!(added.metric.intersection, None);
        assert_eq!(
            added.metric.downsampling,
            Downsampling::new(DownsamplingType::None, ValueChooser::Auto)
        );
        assert!(added.is_expanded);
    }

    #[test]
    fn test_repeated_adds_unique() {
        let ids = MetricIdGenerator::default();
        let mut metrics = DefaultsProvider::default().metrics(&ids);
        let mut editor = MetricListEditor::new(&mut metrics, &ids);
        for _ in 0..100 {
            editor.add_metric();
        }
        let unique: HashSet<_> = metrics.iter().map(|m| &m.id).collect();
        assert_eq!(unique.len(), 106);
    }

    #[test]
    fn test_add_skips_ids_in_use() {
        // An id source restarting from scratch must not reuse ids of the list.
        let mut metrics = DefaultsProvider::default().metrics(&SequentialIds::default());
        let id = MetricListEditor::new(&mut metrics, &SequentialIds::default()).add_metric();
        assert_eq!(id.as_str(), "metric-7");
    }

    #[test]
    fn test_edit_and_remove() {
        let ids = SequentialIds::default();
        let mut metrics = DefaultsProvider::default().metrics(&ids);
        let mut editor = MetricListEditor::new(&mut metrics, &ids);
        let id = editor.add_metric();
        editor.set_type(&id, Some(DistanceType::Jaccard)).unwrap();
        editor
            .set_intersection(&id, Some(IntersectionType::CDR3aa))
            .unwrap();
        editor
            .set_downsampling(
                &id,
                Downsampling {
                    kind: DownsamplingType::Top,
                    value_chooser: ValueChooser::Fixed,
                    n: Some(1000),
                },
            )
            .unwrap();
        editor.set_expanded(&id, false).unwrap();
        assert_eq!(
            editor.metrics().last().unwrap().metric.column_name().as_deref(),
            Some("jaccard_CDR3aa")
        );

        let f2 = editor.metrics()[1].id.clone();
        let removed = editor.remove_metric(&f2).unwrap();
        assert_eq!(removed.metric.kind, Some(DistanceType::F2));
        let kinds: Vec<_> = editor.metrics().iter().map(|m| m.metric.kind).collect();
        assert_eq!(
            kinds,
            [
                Some(DistanceType::F1),
                Some(DistanceType::D),
                Some(DistanceType::SharedClonotypes),
                Some(DistanceType::Correlation),
                Some(DistanceType::Jaccard),
                Some(DistanceType::Jaccard),
            ]
        );
    }

    #[test]
    fn test_unknown_metric() {
        let ids = SequentialIds::default();
        let mut metrics = Vec::new();
        let mut editor = MetricListEditor::new(&mut metrics, &ids);
        let err = editor.remove_metric(&MetricId::from("metric-42")).unwrap_err();
        assert_snapshot!(err, @"There is no metric with id 'metric-42' in the metric list.");
    }
}
