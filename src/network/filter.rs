//! Row exclusion predicates for the aggregated edge table.

use std::fmt;
use std::sync::Arc;

use super::edge::NetworkEdge;

type Predicate = dyn Fn(&NetworkEdge) -> bool + Send + Sync;

/// A named predicate; an edge is excluded when the predicate returns true.
///
/// Filters combine with logical OR: a row is dropped when any filter of
/// the list matches.
///
/// # Example
/// ```
/// use transitgraph::EdgeFilter;
///
/// let unnamed_zone = EdgeFilter::new("no source zone", |edge| edge.src_zone.is_none());
/// assert_eq!(unnamed_zone.name(), "no source zone");
/// ```
#[derive(Clone)]
pub struct EdgeFilter {
    name: String,
    predicate: Arc<Predicate>,
}

impl EdgeFilter {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&NetworkEdge) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the edge should be excluded.
    pub fn matches(&self, edge: &NetworkEdge) -> bool {
        (self.predicate)(edge)
    }

    /// Exclude edges whose maximum velocity exceeds `limit` knots.
    ///
    /// Compares the 2-decimal value the table shows, so a row reading
    /// `50.00` passes a limit of 50. Edges without a velocity
    /// (single-position runs) pass.
    pub fn max_velocity_knots(limit: f64) -> Self {
        Self::new(format!("velocity_knots_max > {}", limit), move |edge| {
            edge.velocity_knots_max.is_some_and(|v| displayed_knots(v) > limit)
        })
    }

    /// Exclude vessels that never leave zone `zone` (data ends inside it).
    ///
    /// Exits from the zone into open water are kept.
    pub fn non_transit_from(zone: u64) -> Self {
        Self::new(format!("non-transit from zone {}", zone), move |edge| {
            edge.src_zone == Some(zone) && edge.open_destination
        })
    }
}

impl fmt::Debug for EdgeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeFilter").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A velocity as rendered in the edge table.
fn displayed_knots(knots: f64) -> f64 {
    format!("{:.2}", knots).parse().unwrap_or(knots)
}

/// True when any filter excludes the edge.
pub fn excluded(filters: &[EdgeFilter], edge: &NetworkEdge) -> bool {
    filters.iter().any(|f| f.matches(edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::LabeledTrack;
    use crate::network::edge::network_edges;
    use crate::Track;

    fn edge_with_max_velocity(knots: f64) -> NetworkEdge {
        let track = Track::new(1, vec![0, 60], vec![0.0, 0.001], vec![0.0, 0.0]);
        let in_zone = vec![Some("Z1".to_string()); 2];
        let mut edge = network_edges(&LabeledTrack::new(track, in_zone).unwrap())
            .unwrap()
            .remove(0);
        edge.velocity_knots_max = Some(knots);
        edge
    }

    #[test]
    fn test_max_velocity_uses_displayed_value() {
        let filter = EdgeFilter::max_velocity_knots(50.0);

        let shown_at_limit = edge_with_max_velocity(50.004);
        assert!(shown_at_limit.to_row().contains(",50.00,"));
        assert!(!filter.matches(&shown_at_limit));

        assert!(filter.matches(&edge_with_max_velocity(50.006)));
        assert!(!filter.matches(&edge_with_max_velocity(12.5)));
    }

    #[test]
    fn test_single_position_run_passes_velocity_filter() {
        let mut edge = edge_with_max_velocity(0.0);
        edge.velocity_knots_max = None;
        assert!(!EdgeFilter::max_velocity_knots(50.0).matches(&edge));
    }
}
