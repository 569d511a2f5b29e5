//! Nearest-point lookup over irregular point sets.
//!
//! Distances are Euclidean in (lon, lat) degrees with no geodesic
//! correction. Over the regional grids LIS runs on, cells are close enough
//! to uniform that this picks the same point a great-circle search would in
//! practice, but results can differ near the poles or across wide extents.

use lis_common::{GeoPoint, LisError, Result};
use rayon::prelude::*;

/// Linear-scan nearest-point resolver.
///
/// Candidate sets are gage lists (tens to a few thousand points), so a
/// spatial index is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestPointResolver;

impl NearestPointResolver {
    pub fn new() -> Self {
        Self
    }

    /// Index of the candidate closest to `point`.
    ///
    /// Candidates with non-finite coordinates are skipped. Ties go to the
    /// lowest index.
    pub fn nearest(&self, point: &GeoPoint, candidates: &[GeoPoint]) -> Result<usize> {
        if !point.is_valid() {
            return Err(LisError::InvalidPoint(point.to_string()));
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            if !candidate.is_valid() {
                continue;
            }
            let d = point.distance_sq(candidate);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }

        best.map(|(i, _)| i).ok_or(LisError::NoValidCandidates)
    }

    /// Resolve many query points against the same candidates in parallel.
    ///
    /// Output order matches `points`; each entry fails independently.
    pub fn nearest_many(&self, points: &[GeoPoint], candidates: &[GeoPoint]) -> Vec<Result<usize>> {
        points
            .par_iter()
            .map(|p| self.nearest(p, candidates))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_basic() {
        let resolver = NearestPointResolver::new();
        let candidates = vec![
            GeoPoint::new(-99.0, 30.0),
            GeoPoint::new(-99.8, 30.2),
            GeoPoint::new(-100.5, 31.0),
        ];
        let idx = resolver
            .nearest(&GeoPoint::new(-99.8, 30.3), &candidates)
            .unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_ties_go_to_first() {
        let resolver = NearestPointResolver::new();
        let candidates = vec![
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(-1.0, 0.0),
            GeoPoint::new(0.0, 1.0),
        ];
        assert_eq!(resolver.nearest(&GeoPoint::new(0.0, 0.0), &candidates).unwrap(), 0);
    }

    #[test]
    fn test_invalid_candidates_skipped() {
        let resolver = NearestPointResolver::new();
        let candidates = vec![
            GeoPoint::new(f64::NAN, 30.0),
            GeoPoint::new(-99.0, f64::INFINITY),
            GeoPoint::new(-90.0, 40.0),
        ];
        assert_eq!(
            resolver.nearest(&GeoPoint::new(-99.0, 30.0), &candidates).unwrap(),
            2
        );
    }

    #[test]
    fn test_no_valid_candidates() {
        let resolver = NearestPointResolver::new();
        assert!(matches!(
            resolver.nearest(&GeoPoint::new(0.0, 0.0), &[]),
            Err(LisError::NoValidCandidates)
        ));
        assert!(matches!(
            resolver.nearest(&GeoPoint::new(0.0, 0.0), &[GeoPoint::new(f64::NAN, f64::NAN)]),
            Err(LisError::NoValidCandidates)
        ));
    }

    #[test]
    fn test_invalid_query() {
        let resolver = NearestPointResolver::new();
        assert!(matches!(
            resolver.nearest(&GeoPoint::new(f64::NAN, 0.0), &[GeoPoint::new(0.0, 0.0)]),
            Err(LisError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_nearest_many_preserves_order() {
        let resolver = NearestPointResolver::new();
        let candidates = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 10.0)];
        let points = vec![
            GeoPoint::new(9.0, 9.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(f64::NAN, 1.0),
        ];

        let results = resolver.nearest_many(&points, &candidates);
        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert_eq!(*results[1].as_ref().unwrap(), 0);
        assert!(results[2].is_err());
    }
}
