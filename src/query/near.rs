//! `$geoNear` proximity queries.

use mongodb::bson::{doc, Document};

use super::Query;

/// Field the server writes the calculated distance into.
/// Stripped from every result before mapping, so it must not clash with a
/// field of the mapped type.
pub const DISTANCE_FIELD: &str = "__distance__";

/// Unit a [`Distance`] is measured in.
///
/// The multiplier converts radians into the unit on a spherical model of
/// the earth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Metric {
    /// Plain coordinate units, no conversion.
    #[default]
    Neutral,
    Kilometers,
    Miles,
}

impl Metric {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Neutral => 1.0,
            Self::Kilometers => 6378.137,
            Self::Miles => 3963.191,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Neutral => "",
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }
}

/// A distance value paired with its metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Distance {
    value: f64,
    metric: Metric,
}

impl Distance {
    pub fn new(value: f64, metric: Metric) -> Self {
        Self { value, metric }
    }

    pub fn kilometers(value: f64) -> Self {
        Self::new(value, Metric::Kilometers)
    }

    pub fn miles(value: f64) -> Self {
        Self::new(value, Metric::Miles)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Value in radians (or plain units for [`Metric::Neutral`]).
    pub fn normalized_value(&self) -> f64 {
        self.value / self.metric.multiplier()
    }

    /// The same distance expressed in another metric.
    #[must_use]
    pub fn in_metric(&self, metric: Metric) -> Self {
        if self.metric == metric {
            return *self;
        }
        Self::new(self.normalized_value() * metric.multiplier(), metric)
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.metric {
            Metric::Neutral => write!(f, "{}", self.value),
            metric => write!(f, "{} {}", self.value, metric.abbreviation()),
        }
    }
}

/// A proximity search around a point, rendered as a `$geoNear` stage.
///
/// # Example
///
/// ```rust
/// use mongo_fluent::query::{Distance, NearQuery};
///
/// let near = NearQuery::near(-73.99171, 40.738868)
///     .max_distance(Distance::kilometers(10.0))
///     .limit(20);
/// assert!(near.is_spherical());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NearQuery {
    point: [f64; 2],
    metric: Metric,
    max_distance: Option<Distance>,
    min_distance: Option<Distance>,
    spherical: bool,
    filter: Option<Document>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl NearQuery {
    /// Search near the legacy coordinate pair `(x, y)`.
    pub fn near(x: f64, y: f64) -> Self {
        Self {
            point: [x, y],
            metric: Metric::Neutral,
            max_distance: None,
            min_distance: None,
            spherical: false,
            filter: None,
            skip: None,
            limit: None,
        }
    }

    /// Search near `(x, y)` reporting distances in `metric`.
    pub fn near_in(x: f64, y: f64, metric: Metric) -> Self {
        Self::near(x, y).in_metric(metric)
    }

    /// Report distances in `metric`. Non-neutral metrics imply a spherical
    /// search; already configured distances are converted.
    #[must_use]
    pub fn in_metric(mut self, metric: Metric) -> Self {
        if metric != Metric::Neutral {
            self.spherical = true;
        }
        self.metric = metric;
        self.max_distance = self.max_distance.map(|d| d.in_metric(metric));
        self.min_distance = self.min_distance.map(|d| d.in_metric(metric));
        self
    }

    #[must_use]
    pub fn in_kilometers(self) -> Self {
        self.in_metric(Metric::Kilometers)
    }

    #[must_use]
    pub fn in_miles(self) -> Self {
        self.in_metric(Metric::Miles)
    }

    /// Only return documents within `distance` of the point.
    #[must_use]
    pub fn max_distance(mut self, distance: Distance) -> Self {
        self = self.adopt_metric(distance.metric);
        self.max_distance = Some(distance.in_metric(self.metric));
        self
    }

    /// Only return documents at least `distance` away from the point.
    #[must_use]
    pub fn min_distance(mut self, distance: Distance) -> Self {
        self = self.adopt_metric(distance.metric);
        self.min_distance = Some(distance.in_metric(self.metric));
        self
    }

    #[must_use]
    pub fn spherical(mut self, spherical: bool) -> Self {
        self.spherical = spherical;
        self
    }

    /// Restrict candidates with the filter of `query`, taking over its
    /// skip and limit when set.
    #[must_use]
    pub fn query(mut self, query: &Query) -> Self {
        if !query.filter_document().is_empty() {
            self.filter = Some(query.filter_document().clone());
        }
        if let Some(skip) = query.get_skip() {
            self.skip = Some(skip);
        }
        if let Some(limit) = query.get_limit() {
            self.limit = Some(limit);
        }
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn point(&self) -> [f64; 2] {
        self.point
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn get_max_distance(&self) -> Option<Distance> {
        self.max_distance
    }

    pub fn get_min_distance(&self) -> Option<Distance> {
        self.min_distance
    }

    pub fn is_spherical(&self) -> bool {
        self.spherical
    }

    /// Aggregation stages performing this search.
    pub fn to_pipeline(&self) -> Vec<Document> {
        let mut geo_near = doc! {
            "near": [self.point[0], self.point[1]],
            "distanceField": DISTANCE_FIELD,
            "spherical": self.spherical,
        };

        if let Some(max) = &self.max_distance {
            geo_near.insert("maxDistance", max.normalized_value());
        }
        if let Some(min) = &self.min_distance {
            geo_near.insert("minDistance", min.normalized_value());
        }
        if self.metric != Metric::Neutral {
            geo_near.insert("distanceMultiplier", self.metric.multiplier());
        }
        if let Some(filter) = &self.filter {
            geo_near.insert("query", filter.clone());
        }

        let mut pipeline = vec![doc! { "$geoNear": geo_near }];
        if let Some(skip) = self.skip {
            pipeline.push(doc! { "$skip": i64::try_from(skip).unwrap_or(i64::MAX) });
        }
        if let Some(limit) = self.limit {
            pipeline.push(doc! { "$limit": limit });
        }
        pipeline
    }

    fn adopt_metric(self, metric: Metric) -> Self {
        if self.metric == Metric::Neutral && metric != Metric::Neutral {
            self.in_metric(metric)
        } else {
            self
        }
    }
}
