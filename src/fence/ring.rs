use super::Coord;

type Edge = [Coord; 2];

/// Returns whether a point lies inside the polygon described by `ring`.
///
/// The ring is an ordered sequence of vertices, anticlockwise, closed
/// implicitly: the last vertex connects back to the first. Clockwise or
/// self-intersecting rings are consumed as-is and the result is unspecified.
/// Rings with fewer than 2 vertices have no usable edges and every point is
/// reported outside.
///
/// The test casts a ray from the point along the lat axis and counts edge
/// crossings. Contributions are accumulated as floats and the total is
/// truncated, not rounded, before the parity check.
pub fn in_poly(point: Coord, ring: &[Coord]) -> bool {
    count_crossings(point, ring) as i64 % 2 != 0
}

fn count_crossings(point: Coord, ring: &[Coord]) -> f64 {
    let mut total = 0.0;
    for (index, vertex) in ring.iter().enumerate() {
        let edge = [*vertex, ring[(index + 1) % ring.len()]];
        total += crossing(point, edge);
    }
    total
}

fn gradient(edge: Edge) -> f64 {
    (edge[1].lon - edge[0].lon) / (edge[1].lat - edge[0].lat)
}

/// Crossing contribution of a single edge for the ray cast from `point`.
/// Vertical edges produce an infinite gradient, which flows through the
/// comparisons below unchanged.
fn crossing(point: Coord, edge: Edge) -> f64 {
    let gradient = gradient(edge);

    // Endpoint with the larger lon
    let lon_high = if edge[1].lon > edge[0].lon { 1 } else { 0 };

    let lat_high = if gradient > 0.0 {
        lon_high
    } else if gradient < 0.0 {
        1 - lon_high
    } else {
        // Horizontal edges never count, even when the ray runs along them
        return 0.0;
    };

    if point.lon > edge[lon_high].lon || point.lon < edge[1 - lon_high].lon {
        return 0.0;
    }

    // BUG: this also hands out a crossing for some points level with, and to
    // the left of, the lower vertex
    if point.lon == edge[0].lon || point.lon == edge[1].lon {
        return vertex_crossing(point, edge, lon_high);
    }

    if point.lat <= edge[lat_high].lat && point.lat <= edge[1 - lat_high].lat {
        return 1.0;
    }

    let delta_lat = point.lat - edge[1 - lat_high].lat;
    let lon_on_edge = edge[1 - lat_high].lon + gradient * delta_lat;
    crossing_to_right(lon_on_edge, point.lon, gradient)
}

/// Crossing contribution when the ray passes exactly through an endpoint's
/// lon level. Only a ray touching the upper endpoint of an edge to its right
/// is meant to count.
fn vertex_crossing(point: Coord, edge: Edge, lon_high: usize) -> f64 {
    if point.lon == edge[lon_high].lon {
        if point.lat > edge[lon_high].lat {
            0.0
        } else {
            1.0
        }
    } else {
        0.0
    }
}

/// Decides a crossing for an edge that is not entirely to the right of the
/// point. `lon_on_edge` is the lon of the edge at the point's lat.
fn crossing_to_right(lon_on_edge: f64, point_lon: f64, gradient: f64) -> f64 {
    if lon_on_edge == point_lon {
        1.0
    } else if lon_on_edge < point_lon {
        if gradient > 0.0 {
            1.0
        } else {
            0.0
        }
    } else if gradient > 0.0 {
        0.0
    } else {
        1.0
    }
}
