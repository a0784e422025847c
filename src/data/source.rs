use std::collections::HashMap;

use crate::data::sample::{Sample, SensorDescriptor};
use crate::error::RetrievalError;
use crate::state::window::TimeWindow;

/// Sample series keyed by sensor id.
pub type SeriesMap = HashMap<String, Vec<Sample>>;

/// Where comparisons get their data from.
///
/// Mirrors the two backend endpoints: the sensor descriptor listing and the
/// multi-sensor sample query. A comparison calls them in that order, one
/// after the other.
pub trait SampleSource {
    fn sensors(&self) -> Result<Vec<SensorDescriptor>, RetrievalError>;

    /// Samples for each of `ids` within `window`. Unknown ids may be missing
    /// from the map; callers treat that as an empty series.
    fn samples(&self, ids: &[&str], window: TimeWindow) -> Result<SeriesMap, RetrievalError>;
}

impl<S: SampleSource + ?Sized> SampleSource for &S {
    fn sensors(&self) -> Result<Vec<SensorDescriptor>, RetrievalError> {
        (**self).sensors()
    }

    fn samples(&self, ids: &[&str], window: TimeWindow) -> Result<SeriesMap, RetrievalError> {
        (**self).samples(ids, window)
    }
}
