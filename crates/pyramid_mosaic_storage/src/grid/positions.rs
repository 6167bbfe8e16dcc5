use crate::{PyramidError, Result, SmallKeyHashSet};

use pyramid_mosaic_core::prelude::*;

/// Row-major positions for `n` cells in a near-square grid with `ceil(sqrt(n))` columns.
///
/// ```
/// use pyramid_mosaic_core::PointN;
/// use pyramid_mosaic_storage::auto_positions;
///
/// assert_eq!(
///     auto_positions(5),
///     vec![PointN([0, 0]), PointN([1, 0]), PointN([2, 0]), PointN([0, 1]), PointN([1, 1])]
/// );
/// ```
pub fn auto_positions(n: usize) -> Vec<Point2i> {
    let num_x = num_columns(n);

    (0..n)
        .map(|i| PointN([(i % num_x) as i32, (i / num_x) as i32]))
        .collect()
}

fn num_columns(n: usize) -> usize {
    let mut num_x = (n as f64).sqrt().ceil() as usize;
    // Guard against the float square root landing one off for large `n`.
    while num_x * num_x < n {
        num_x += 1;
    }
    while num_x > 1 && (num_x - 1) * (num_x - 1) >= n {
        num_x -= 1;
    }

    num_x.max(1)
}

/// Checks that there is one position per source, and that positions are non-negative and unique.
pub fn validate_positions(positions: &[Point2i], num_sources: usize) -> Result<()> {
    if positions.len() != num_sources {
        return Err(PyramidError::geometry(format!(
            "{} grid positions for {} sources",
            positions.len(),
            num_sources
        )));
    }

    let mut seen = SmallKeyHashSet::with_capacity(positions.len());
    for p in positions.iter() {
        if p.x() < 0 || p.y() < 0 {
            return Err(PyramidError::geometry(format!(
                "grid position {:?} is negative",
                p
            )));
        }
        if !seen.insert(*p) {
            return Err(PyramidError::geometry(format!(
                "grid position {:?} is used more than once",
                p
            )));
        }
    }

    Ok(())
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn near_square_layouts() {
        assert!(auto_positions(0).is_empty());
        assert_eq!(auto_positions(1), vec![PointN([0, 0])]);
        assert_eq!(
            auto_positions(4),
            vec![PointN([0, 0]), PointN([1, 0]), PointN([0, 1]), PointN([1, 1])]
        );
        assert_eq!(auto_positions(10).last(), Some(&PointN([1, 2])));
        assert_eq!(num_columns(1_000_000), 1000);
        assert_eq!(num_columns(1_000_001), 1001);
    }

    #[test]
    fn invalid_positions() {
        let ok = [PointN([0, 0]), PointN([3, 1])];
        assert!(validate_positions(&ok, 2).is_ok());

        assert!(validate_positions(&ok, 3).is_err());
        assert!(validate_positions(&[PointN([0, -1])], 1).is_err());
        assert!(validate_positions(&[PointN([2, 2]), PointN([2, 2])], 2).is_err());
    }
}
