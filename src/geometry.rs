use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};


/// A longitude/latitude pair.  Doubles as the identity of a graph node: two points are the same
/// node iff their coordinates are bit-for-bit equal (with -0.0 folded into 0.0).
#[derive(Debug, Clone, Copy)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> GeoPoint {
        GeoPoint{longitude, latitude}
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn dot(&self, other: &GeoPoint) -> f64 {
        self.longitude * other.longitude + self.latitude * other.latitude
    }

    pub fn plus(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint::new(self.longitude + other.longitude, self.latitude + other.latitude)
    }

    pub fn minus(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint::new(self.longitude - other.longitude, self.latitude - other.latitude)
    }

    pub fn times(&self, factor: f64) -> GeoPoint {
        GeoPoint::new(self.longitude * factor, self.latitude * factor)
    }

    /// Planar distance in the units of the coordinates.  On raw degrees this is only an
    /// approximation of ground distance, which is good enough for ranking paths.
    pub fn euclidean_distance(&self, other: &GeoPoint) -> f64 {
        let diff = self.minus(other);
        (diff.longitude.powi(2) + diff.latitude.powi(2)).sqrt()
    }

    pub fn nearest_point_on_segment(&self, segment: &LineSegment) -> GeoPoint {
        // v = J - I
        let vv = segment.end_j.minus(&segment.end_i);
        // u = I - P (P being the point represented by self)
        let uu = segment.end_i.minus(self);
        let denom = vv.dot(&vv);
        if denom == 0. {
            // degenerate segment
            return segment.end_i;
        }
        // tt is the fractional distance from I to J where the nearest point to P lies.
        let tt = - vv.dot(&uu) / denom;
        if tt <= 0.0 {
            return segment.end_i;
        } else if tt >= 1.0 {
            return segment.end_j;
        } else {
            let i_part = segment.end_i.times(1.0 - tt);
            let j_part = segment.end_j.times(tt);
            return i_part.plus(&j_part);
        }
    }

    pub fn distance_to_segment(&self, segment: &LineSegment) -> f64 {
        self.euclidean_distance(&self.nearest_point_on_segment(segment))
    }

    fn key_bits(&self) -> (u64, u64) {
        (canonical_bits(self.longitude), canonical_bits(self.latitude))
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0. {
        0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.key_bits() == other.key_bits()
    }
}

impl Eq for GeoPoint {}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

impl Ord for GeoPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = (self.longitude + 0., self.latitude + 0.);
        let rhs = (other.longitude + 0., other.latitude + 0.);
        lhs.0.total_cmp(&rhs.0).then_with(|| lhs.1.total_cmp(&rhs.1))
    }
}

impl PartialOrd for GeoPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub end_i: GeoPoint,
    pub end_j: GeoPoint,
}

impl LineSegment {
    pub fn new(end_i: GeoPoint, end_j: GeoPoint) -> LineSegment {
        LineSegment {end_i, end_j}
    }

    pub fn length(&self) -> f64 {
        self.end_i.euclidean_distance(&self.end_j)
    }
}
