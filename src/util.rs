// util.rs

/// Whether every element is strictly greater than its predecessor.
///
/// Empty and single-element slices are vacuously monotonic.
pub fn is_strictly_increasing<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

/// Whether every element is greater than or equal to its predecessor.
pub fn is_increasing<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing_integers() {
        assert!(is_strictly_increasing(&[1u64, 2, 3]));
        assert!(is_strictly_increasing(&[3u64]));
        assert!(is_strictly_increasing::<u64>(&[]));

        assert!(!is_strictly_increasing(&[1u64, 1]));
        assert!(!is_strictly_increasing(&[0u64, 2, 1]));
    }

    #[test]
    fn strictly_increasing_floats() {
        assert!(is_strictly_increasing(&[1.0, 2.0, 3.0]));
        assert!(is_strictly_increasing(&[4.56]));

        assert!(!is_strictly_increasing(&[3.0, 2.0, 1.0]));
        assert!(!is_strictly_increasing(&[1.0, 2.0, 2.0]));
    }

    #[test]
    fn increasing_allows_ties() {
        assert!(is_increasing(&[1u64, 2, 3]));
        assert!(is_increasing(&[1u64, 1]));
        assert!(is_increasing(&[1.0, 2.0, 2.0]));

        assert!(!is_increasing(&[0u64, 2, 1]));
        assert!(!is_increasing(&[3.0, 2.0, 1.0]));
    }
}
