//! Area partitioning: split a bounding box into a balanced sector grid.

use crate::models::{BoundingBox, CoreError, Sector, SECTOR_PALETTE};

/// Split `bbox` into `n` equal sectors arranged in the most balanced
/// `cols x rows` grid, in flat degree space.
///
/// Ids are assigned row-major starting at 0. A zero-width or zero-height
/// box is accepted and yields zero-extent sectors.
pub fn partition(bbox: &BoundingBox, n: usize) -> Result<Vec<Sector>, CoreError> {
    if n == 0 {
        return Err(CoreError::InvalidSectorCount);
    }

    let lat_range = bbox.lat_range();
    let lng_range = bbox.lng_range();
    let (cols, rows) = best_grid(n, lng_range, lat_range);

    let sector_lat = lat_range / rows as f64;
    let sector_lng = lng_range / cols as f64;

    let mut sectors = Vec::with_capacity(n);
    for r in 0..rows {
        for c in 0..cols {
            let id = (r * cols + c) as u32;
            sectors.push(Sector {
                min_lat: bbox.min_lat + r as f64 * sector_lat,
                max_lat: bbox.min_lat + (r + 1) as f64 * sector_lat,
                min_lng: bbox.min_lng + c as f64 * sector_lng,
                max_lng: bbox.min_lng + (c + 1) as f64 * sector_lng,
                id,
                color: SECTOR_PALETTE[id as usize % SECTOR_PALETTE.len()].to_string(),
            });
        }
    }

    Ok(sectors)
}

/// Pick the divisor pair `(cols, rows)` of `n` whose cells are closest to
/// square, scoring each pair by `|1 - (lng_range/cols)/(lat_range/rows)|`.
///
/// Scanning cols from 1 upward with a strict comparison keeps the first
/// pair reaching the best score; ties resolve to the earliest-found
/// divisor. This is a fixed convention, not a quality judgement.
pub fn best_grid(n: usize, lng_range: f64, lat_range: f64) -> (usize, usize) {
    let mut cols = 1;
    let mut rows = n;
    let mut best_score = f64::MAX;

    for c in 1..=n {
        if n % c != 0 {
            continue;
        }
        let r = n / c;

        // Degenerate ranges push the aspect to inf/NaN; those scores never
        // beat a finite best, so the 1 x n default survives.
        let cell_aspect = (lng_range / c as f64) / (lat_range / r as f64);
        let score = (1.0 - cell_aspect).abs();

        if score < best_score {
            best_score = score;
            cols = c;
            rows = r;
        }
    }

    (cols, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_box() -> BoundingBox {
        BoundingBox::new(33.0, 33.1, -117.1, -117.0)
    }

    #[test]
    fn rejects_zero_sectors() {
        assert!(partition(&square_box(), 0).is_err());
    }

    #[test]
    fn four_sectors_of_square_box_form_two_by_two_grid() {
        let sectors = partition(&square_box(), 4).unwrap();
        assert_eq!(sectors.len(), 4);

        // 2x2: two distinct column starts, two distinct row starts.
        assert_eq!(best_grid(4, 0.1, 0.1), (2, 2));
        assert!((sectors[0].width() - 0.05).abs() < 1e-12);
        assert!((sectors[0].height() - 0.05).abs() < 1e-12);

        // Perfectly square cells score ~0.
        let aspect: f64 = (0.1 / 2.0) / (0.1 / 2.0);
        assert!((1.0 - aspect).abs() < 1e-12);
    }

    #[test]
    fn sectors_tile_the_bounding_box_exactly() {
        let bbox = BoundingBox::new(10.0, 10.6, 20.0, 20.4);
        for n in 1..=12 {
            let sectors = partition(&bbox, n).unwrap();
            assert_eq!(sectors.len(), n);

            let area: f64 = sectors.iter().map(|s| s.width() * s.height()).sum();
            let expected = bbox.lng_range() * bbox.lat_range();
            assert!(
                (area - expected).abs() < 1e-9,
                "n={n}: union area {area} != {expected}"
            );

            // Pairwise disjoint interiors: centers of distinct sectors are
            // never inside another sector's open rectangle.
            for a in &sectors {
                for b in &sectors {
                    if a.id == b.id {
                        continue;
                    }
                    let (clng, clat) = a.center();
                    assert!(
                        !(clng > b.min_lng
                            && clng < b.max_lng
                            && clat > b.min_lat
                            && clat < b.max_lat),
                        "sector {} center lies inside sector {}",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }

    #[test]
    fn ids_are_row_major_and_sequential() {
        let sectors = partition(&square_box(), 6).unwrap();
        for (i, s) in sectors.iter().enumerate() {
            assert_eq!(s.id, i as u32);
        }
        // Consecutive ids within a row share the same latitude band.
        let (cols, _) = best_grid(6, 0.1, 0.1);
        for pair in sectors.chunks(cols) {
            for s in pair {
                assert_eq!(s.min_lat, pair[0].min_lat);
            }
        }
    }

    #[test]
    fn first_divisor_wins_ties() {
        // Equal ranges, n=6: 2x3 scores |1-1.5|=0.5, 3x2 scores
        // |1-0.667|=0.333, so 3x2 wins outright.
        assert_eq!(best_grid(6, 1.0, 1.0), (3, 2));
        // A true tie: zero lng range makes every pair score infinite, so the
        // initial 1 x n assignment stands.
        assert_eq!(best_grid(6, 0.0, 0.0), (1, 6));
    }

    #[test]
    fn degenerate_box_yields_zero_extent_sectors() {
        let flat = BoundingBox::new(33.0, 33.0, -117.1, -117.0);
        let sectors = partition(&flat, 3).unwrap();
        assert_eq!(sectors.len(), 3);
        for s in &sectors {
            assert_eq!(s.height(), 0.0);
            assert!(s.width() >= 0.0);
            assert!(s.width().is_finite());
        }
    }
}
