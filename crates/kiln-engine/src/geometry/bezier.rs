//! Composite Bezier curves.
//!
//! A [`CurveBuilder`] owns a fixed sequence of points. Some of them are anchors
//! (the curve passes through them); the rest are control points. Each pair of
//! consecutive anchors bounds one segment whose degree is one more than the
//! number of control points between them. A fresh builder has a single segment
//! from the first to the last point.
//!
//! Segments are evaluated with De Casteljau's recurrence and flattened into a
//! [`LineStrip`].

use glam::Vec3;
use thiserror::Error;

use super::{AnchorIndex, LineStrip};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CurveError {
    #[error("a curve needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("{len} floats do not form xyz triples")]
    RaggedPoints { len: usize },

    #[error("point {index} is out of range (curve has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("point {0} is already an anchor")]
    AlreadyAnchor(usize),

    #[error("segment {index} is out of range (curve has {len} segments)")]
    SegmentOutOfRange { index: usize, len: usize },

    #[error("curve parameter {0} is outside [0, 1]")]
    ParameterOutOfRange(f32),

    #[error("building a line strip needs at least one subdivision")]
    ZeroSubdivisions,

    #[error("{segments} segments x {subdivisions} subdivisions overflow the point count")]
    TooManyPoints { subdivisions: usize, segments: usize },

    #[error("cannot allocate {points} line strip points")]
    OutOfMemory { points: usize },

    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// One anchor-to-anchor span of the curve.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment<'a> {
    /// Point index of the starting anchor.
    pub start: usize,
    /// Point index of the ending anchor.
    pub end: usize,
    /// Both anchors and every control point between them, in order.
    pub points: &'a [Vec3],
}

impl Segment<'_> {
    #[inline]
    pub fn num_control_points(&self) -> usize {
        self.end - self.start - 1
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.end - self.start
    }

    /// Point on the segment at `t` in `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let mut scratch = Vec::new();
        evaluate(self.points, t, &mut scratch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveBuilder {
    points: Vec<Vec3>,
    anchors: AnchorIndex,
}

impl CurveBuilder {
    /// Creates a single-segment curve anchored at the first and last point.
    pub fn new(points: Vec<Vec3>) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints(points.len()));
        }

        let anchors = AnchorIndex::endpoints(0, points.len() - 1);
        log::debug!(
            "CurveBuilder: {} points, anchor capacity {}",
            points.len(),
            anchors.capacity()
        );

        Ok(Self { points, anchors })
    }

    /// Creates a curve from packed `x, y, z` floats.
    pub fn from_flat(coords: &[f32]) -> Result<Self, CurveError> {
        if coords.len() % 3 != 0 {
            return Err(CurveError::RaggedPoints { len: coords.len() });
        }
        Self::new(coords.chunks_exact(3).map(Vec3::from_slice).collect())
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Anchor point indices, ascending.
    #[inline]
    pub fn anchors(&self) -> &[usize] {
        self.anchors.as_slice()
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn num_anchors(&self) -> usize {
        self.anchors.len()
    }

    #[inline]
    pub fn num_segments(&self) -> usize {
        self.anchors.len() - 1
    }

    #[inline]
    pub fn num_control_points(&self) -> usize {
        self.points.len() - self.anchors.len()
    }

    pub fn is_anchor(&self, index: usize) -> bool {
        self.anchors.contains(index)
    }

    pub fn is_control(&self, index: usize) -> bool {
        !self.is_anchor(index)
    }

    pub fn segment(&self, index: usize) -> Option<Segment<'_>> {
        let anchors = self.anchors.as_slice();
        let (&start, &end) = (anchors.get(index)?, anchors.get(index + 1)?);
        Some(Segment {
            start,
            end,
            points: &self.points[start..=end],
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> + '_ {
        self.anchors.pairs().map(|(start, end)| Segment {
            start,
            end,
            points: &self.points[start..=end],
        })
    }

    // ── anchors ───────────────────────────────────────────────────────────

    /// Promotes a control point to an anchor, splitting the segment that
    /// contains it.
    ///
    /// Returns the position of `index` within [`anchors`](Self::anchors).
    pub fn make_anchor(&mut self, index: usize) -> Result<usize, CurveError> {
        if index >= self.points.len() {
            log::warn!("CurveBuilder: point {index} is out of bounds");
            return Err(CurveError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }

        let Some(slot) = self.anchors.insert(index) else {
            log::warn!("CurveBuilder: point {index} is already an anchor");
            return Err(CurveError::AlreadyAnchor(index));
        };

        log::trace!("CurveBuilder: anchors {:?}", self.anchors.as_slice());
        Ok(slot)
    }

    /// Merging segments back into one curve is not supported.
    pub fn amalgamate(&mut self) -> Result<(), CurveError> {
        Err(CurveError::Unsupported("amalgamating curve segments"))
    }

    /// Splitting segments down to a maximum order is not supported.
    pub fn separate(&mut self, _min_order: usize) -> Result<usize, CurveError> {
        Err(CurveError::Unsupported("separating curve segments by order"))
    }

    // ── evaluation ────────────────────────────────────────────────────────

    /// Point on segment `segment` at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, segment: usize, t: f32) -> Result<Vec3, CurveError> {
        if !(0.0..=1.0).contains(&t) {
            return Err(CurveError::ParameterOutOfRange(t));
        }
        let seg = self.segment(segment).ok_or(CurveError::SegmentOutOfRange {
            index: segment,
            len: self.num_segments(),
        })?;
        Ok(seg.point_at(t))
    }

    /// Flattens the curve into a line strip.
    ///
    /// Every segment contributes its starting anchor followed by
    /// `subdivisions` evenly spaced interior samples; the final anchor closes
    /// the strip. Anchors are copied, not evaluated, so segment boundaries are
    /// exact. The result has `num_segments * (subdivisions + 1) + 1` points.
    pub fn build(&self, subdivisions: usize) -> Result<LineStrip, CurveError> {
        if subdivisions < 1 {
            log::warn!("CurveBuilder: building a line strip requires > 0 subdivisions");
            return Err(CurveError::ZeroSubdivisions);
        }

        let segments = self.num_segments();
        let Some((span, total)) = subdivisions
            .checked_add(1)
            .and_then(|span| Some((span, segments.checked_mul(span)?.checked_add(1)?)))
        else {
            log::warn!("CurveBuilder: {segments} segments x {subdivisions} subdivisions overflow");
            return Err(CurveError::TooManyPoints {
                subdivisions,
                segments,
            });
        };
        let advance = 1.0 / span as f32;

        log::debug!(
            "CurveBuilder: building {} segments x {} subdivisions -> {} points",
            segments,
            subdivisions,
            total
        );

        let mut out = Vec::new();
        out.try_reserve_exact(total)
            .map_err(|_| CurveError::OutOfMemory { points: total })?;
        let mut scratch = Vec::new();

        for seg in self.segments() {
            out.push(seg.points[0]);
            for k in 1..=subdivisions {
                let t = advance * k as f32;
                let p = evaluate(seg.points, t, &mut scratch);
                log::trace!("CurveBuilder: P({t:.2}) = {p}");
                out.push(p);
            }
        }
        out.push(self.points[self.points.len() - 1]);

        debug_assert_eq!(out.len(), total);
        Ok(LineStrip::new(out))
    }

    /// Strip through every point in order (anchors and control points alike).
    pub fn control_polygon(&self) -> LineStrip {
        LineStrip::new(self.points.clone())
    }
}

/// Evaluates the Bezier curve with control polygon `points` at `t`.
///
/// Two points take the straight-line path. Longer polygons run De Casteljau's
/// recurrence in `scratch`, which is reused across calls.
fn evaluate(points: &[Vec3], t: f32, scratch: &mut Vec<Vec3>) -> Vec3 {
    if points.len() <= 2 {
        let p0 = points[0];
        let p1 = points[points.len() - 1];
        return p0 + (p1 - p0) * t;
    }

    scratch.clear();
    scratch.extend_from_slice(points);

    let mut shifts = points.len() - 1;
    while shifts > 0 {
        for i in 0..shifts {
            scratch[i] = scratch[i].lerp(scratch[i + 1], t);
        }
        shifts -= 1;
    }

    scratch[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(n: usize) -> CurveBuilder {
        CurveBuilder::new((0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_anchors_endpoints() {
        let c = line(5);
        assert_eq!(c.anchors(), &[0, 4]);
        assert_eq!(c.num_segments(), 1);
        assert_eq!(c.num_control_points(), 3);
        assert_eq!(c.segment(0).unwrap().degree(), 4);
    }

    #[test]
    fn new_rejects_single_point() {
        assert_eq!(CurveBuilder::new(vec![Vec3::ZERO]), Err(CurveError::TooFewPoints(1)));
        assert_eq!(CurveBuilder::new(vec![]), Err(CurveError::TooFewPoints(0)));
    }

    #[test]
    fn from_flat_reads_triples() {
        let c = CurveBuilder::from_flat(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 0.0, 0.0]).unwrap();
        assert_eq!(c.points()[1], Vec3::ONE);
        assert!(matches!(
            CurveBuilder::from_flat(&[0.0; 5]),
            Err(CurveError::RaggedPoints { len: 5 })
        ));
    }

    // ── classification ────────────────────────────────────────────────────

    #[test]
    fn control_is_negation_of_anchor() {
        let mut c = line(6);
        c.make_anchor(3).unwrap();
        for i in 0..6 {
            assert_eq!(c.is_control(i), !c.is_anchor(i));
        }
        assert!(c.is_anchor(3));
        assert!(c.is_control(2));
    }

    #[test]
    fn make_anchor_splits_segment() {
        let mut c = line(7);
        assert_eq!(c.make_anchor(4), Ok(1));
        assert_eq!(c.make_anchor(2), Ok(1));
        assert_eq!(c.anchors(), &[0, 2, 4, 6]);
        assert_eq!(c.num_segments(), 3);
        assert_eq!(c.num_control_points(), 3);

        let spans: Vec<_> = c.segments().map(|s| (s.start, s.end, s.num_control_points())).collect();
        assert_eq!(spans, vec![(0, 2, 1), (2, 4, 1), (4, 6, 1)]);
    }

    #[test]
    fn make_anchor_on_endpoint_changes_nothing() {
        let mut c = line(4);
        let before = c.clone();
        assert_eq!(c.make_anchor(0), Err(CurveError::AlreadyAnchor(0)));
        assert_eq!(c.make_anchor(3), Err(CurveError::AlreadyAnchor(3)));
        assert_eq!(c, before);
    }

    #[test]
    fn make_anchor_twice_fails_second_time() {
        let mut c = line(5);
        c.make_anchor(2).unwrap();
        let after_first = c.clone();
        assert_eq!(c.make_anchor(2), Err(CurveError::AlreadyAnchor(2)));
        assert_eq!(c, after_first);
        assert_eq!(c.num_segments(), 2);
        assert_eq!(c.num_control_points(), 2);
    }

    #[test]
    fn make_anchor_out_of_range_fails() {
        let mut c = line(3);
        assert_eq!(c.make_anchor(3), Err(CurveError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(c.anchors(), &[0, 2]);
    }

    #[test]
    fn many_anchors_grow_index() {
        let n = AnchorIndex::INITIAL_CAPACITY * 2 + 10;
        let mut c = line(n);
        for i in (1..n - 1).step_by(2) {
            c.make_anchor(i).unwrap();
        }
        assert!(c.anchors().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(c.num_segments(), c.num_anchors() - 1);
    }

    #[test]
    fn unsupported_operations_fail() {
        let mut c = line(4);
        assert!(matches!(c.amalgamate(), Err(CurveError::Unsupported(_))));
        assert!(matches!(c.separate(2), Err(CurveError::Unsupported(_))));
    }

    // ── evaluation ────────────────────────────────────────────────────────

    #[test]
    fn quadratic_build_with_one_subdivision() {
        let c = CurveBuilder::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(c.anchors(), &[0, 2]);
        assert_eq!(c.num_control_points(), 1);

        let strip = c.build(1).unwrap();
        assert_eq!(
            strip.points(),
            &[Vec3::ZERO, Vec3::new(1.0, 0.5, 0.5), Vec3::new(2.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn straight_segment_midpoint_is_exact() {
        let c = CurveBuilder::new(vec![Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0)]).unwrap();
        assert_eq!(c.point_at(0, 0.5), Ok(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(c.build(1).unwrap().point_at(1), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn build_length_and_exact_anchors() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.3, 2.0, 0.1),
            Vec3::new(1.7, -1.0, 0.2),
            Vec3::new(2.1, 0.4, 0.0),
            Vec3::new(3.3, 3.3, -0.7),
            Vec3::new(4.9, 0.1, 0.0),
            Vec3::new(6.0, 0.0, 1.0),
        ];
        let mut c = CurveBuilder::new(pts.clone()).unwrap();
        c.make_anchor(3).unwrap();
        c.make_anchor(4).unwrap();

        for n in [1, 2, 7] {
            let strip = c.build(n).unwrap();
            assert_eq!(strip.len(), c.num_segments() * (n + 1) + 1);
            for (i, &a) in c.anchors().iter().enumerate() {
                assert_eq!(strip.point_at(i * (n + 1)), Some(pts[a]));
            }
        }
    }

    #[test]
    fn build_zero_subdivisions_fails() {
        assert_eq!(line(3).build(0), Err(CurveError::ZeroSubdivisions));
    }

    #[test]
    fn build_rejects_point_count_overflow() {
        assert_eq!(
            line(3).build(usize::MAX),
            Err(CurveError::TooManyPoints { subdivisions: usize::MAX, segments: 1 })
        );

        let mut c = line(5);
        c.make_anchor(2).unwrap();
        assert_eq!(
            c.build(usize::MAX / 2),
            Err(CurveError::TooManyPoints { subdivisions: usize::MAX / 2, segments: 2 })
        );
    }

    #[test]
    fn build_reports_unallocatable_output() {
        // Point count fits in usize, its byte size does not.
        let n = usize::MAX / 4;
        assert_eq!(line(2).build(n), Err(CurveError::OutOfMemory { points: n + 2 }));
    }

    #[test]
    fn cubic_matches_bernstein_form() {
        let p = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 3.0, 0.0),
            Vec3::new(3.0, 3.0, 1.0),
            Vec3::new(4.0, 0.0, 0.0),
        ];
        let c = CurveBuilder::new(p.to_vec()).unwrap();
        for t in [0.0f32, 0.25, 0.4, 0.75, 1.0] {
            let u = 1.0 - t;
            let expected = p[0] * u * u * u
                + p[1] * 3.0 * u * u * t
                + p[2] * 3.0 * u * t * t
                + p[3] * t * t * t;
            assert!(c.point_at(0, t).unwrap().abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn point_at_validates_arguments() {
        let c = line(3);
        assert_eq!(c.point_at(0, 1.5), Err(CurveError::ParameterOutOfRange(1.5)));
        assert_eq!(c.point_at(1, 0.5), Err(CurveError::SegmentOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn build_does_not_mutate() {
        let mut c = line(5);
        c.make_anchor(2).unwrap();
        let before = c.clone();
        c.build(4).unwrap();
        assert_eq!(c, before);
    }

    #[test]
    fn control_polygon_visits_every_point() {
        let c = line(4);
        assert_eq!(c.control_polygon().points(), c.points());
    }

    // ── properties ────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn anchors_stay_sorted_and_unique(n in 2usize..200, picks in prop::collection::vec(0usize..400, 0..120)) {
            let mut c = line(n);
            for p in picks {
                let before = c.clone();
                match c.make_anchor(p) {
                    Ok(_) => prop_assert!(c.is_anchor(p)),
                    Err(_) => prop_assert_eq!(&c, &before),
                }
                prop_assert!(c.anchors().windows(2).all(|w| w[0] < w[1]));
                prop_assert_eq!(c.num_segments(), c.anchors().len() - 1);
                prop_assert_eq!(c.num_control_points(), n - c.anchors().len());
            }
        }
    }
}
