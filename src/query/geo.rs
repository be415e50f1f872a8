//! Distance-annotated results of a near search.

use super::{Distance, Metric};

/// A single result of a near search.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResult<T> {
    content: T,
    distance: Distance,
}

impl<T> GeoResult<T> {
    pub fn new(content: T, distance: Distance) -> Self {
        Self { content, distance }
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn into_content(self) -> T {
        self.content
    }
}

/// All results of a near search plus their average distance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResults<T> {
    results: Vec<GeoResult<T>>,
    average_distance: Distance,
}

impl<T> GeoResults<T> {
    /// Collect `results`, averaging their distances in `metric`.
    pub fn new(results: Vec<GeoResult<T>>, metric: Metric) -> Self {
        let average = if results.is_empty() {
            0.0
        } else {
            let total: f64 = results
                .iter()
                .map(|r| r.distance.in_metric(metric).value())
                .sum();
            total / results.len() as f64
        };

        Self {
            results,
            average_distance: Distance::new(average, metric),
        }
    }

    pub fn average_distance(&self) -> Distance {
        self.average_distance
    }

    pub fn results(&self) -> &[GeoResult<T>] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drop the distances and keep the mapped content.
    pub fn into_contents(self) -> Vec<T> {
        self.results.into_iter().map(GeoResult::into_content).collect()
    }
}

impl<T> IntoIterator for GeoResults<T> {
    type Item = GeoResult<T>;
    type IntoIter = std::vec::IntoIter<GeoResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_distance() {
        let results = GeoResults::new(
            vec![
                GeoResult::new("a", Distance::kilometers(1.0)),
                GeoResult::new("b", Distance::kilometers(3.0)),
            ],
            Metric::Kilometers,
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results.average_distance(), Distance::kilometers(2.0));
        assert_eq!(results.into_contents(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_results() {
        let results: GeoResults<String> = GeoResults::new(vec![], Metric::Miles);

        assert!(results.is_empty());
        assert_eq!(results.average_distance(), Distance::miles(0.0));
    }
}
