use std::fmt;

use indexmap::IndexMap;

use super::quantize::Bucket;

/// Dominant shades of one image, ordered by descending proportion.
///
/// A non-empty histogram always sums to 1.0. An empty one means no blue was
/// found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorHistogram {
    shades: IndexMap<Bucket, f64>,
}

impl ColorHistogram {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rescales the retained proportions so they sum to 1.0 and orders them.
    /// Ties are broken by bucket so the order does not depend on hashing.
    pub fn renormalized(retained: impl IntoIterator<Item = (Bucket, f64)>) -> Self {
        let mut shades: Vec<(Bucket, f64)> = retained.into_iter().collect();
        let total: f64 = shades.iter().map(|(_, proportion)| proportion).sum();
        if shades.is_empty() || total <= 0.0 {
            return Self::empty();
        }

        for (_, proportion) in shades.iter_mut() {
            *proportion /= total;
        }
        shades.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Self {
            shades: shades.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shades.len()
    }

    pub fn get(&self, bucket: &Bucket) -> Option<f64> {
        self.shades.get(bucket).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bucket, f64)> {
        self.shades.iter().map(|(bucket, proportion)| (bucket, *proportion))
    }

    pub fn total(&self) -> f64 {
        self.shades.values().sum()
    }

    /// `rgb(R, G, B): P.PP` entries joined by `; `, empty for an empty
    /// histogram.
    pub fn to_summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColorHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (bucket, proportion)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{bucket}: {proportion:.2}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(r: u8, g: u8, b: u8) -> Bucket {
        Bucket { r, g, b }
    }

    #[test]
    fn renormalizes_and_sorts_descending() {
        let histogram = ColorHistogram::renormalized([
            (bucket(0, 0, 224), 0.1),
            (bucket(32, 64, 192), 0.3),
        ]);

        assert_eq!(histogram.len(), 2);
        assert!((histogram.total() - 1.0).abs() < 1e-9);
        let order: Vec<Bucket> = histogram.iter().map(|(bucket, _)| *bucket).collect();
        assert_eq!(order, vec![bucket(32, 64, 192), bucket(0, 0, 224)]);
        assert!((histogram.get(&bucket(32, 64, 192)).unwrap() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn ties_are_ordered_by_bucket() {
        let histogram = ColorHistogram::renormalized([
            (bucket(64, 0, 255), 0.2),
            (bucket(0, 0, 255), 0.2),
        ]);
        assert_eq!(
            histogram.to_summary(),
            "rgb(0, 0, 255): 0.50; rgb(64, 0, 255): 0.50"
        );
    }

    #[test]
    fn formats_two_decimals() {
        let histogram = ColorHistogram::renormalized([
            (bucket(38, 90, 176), 0.8),
            (bucket(38, 90, 196), 0.2),
        ]);
        assert_eq!(
            histogram.to_summary(),
            "rgb(38, 90, 176): 0.80; rgb(38, 90, 196): 0.20"
        );
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let histogram = ColorHistogram::renormalized(Vec::new());
        assert!(histogram.is_empty());
        assert_eq!(histogram.to_summary(), "");
        assert_eq!(histogram.total(), 0.0);
    }
}
