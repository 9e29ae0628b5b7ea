//! Min–max normalization over a batch of metric records.
//!
//! Bounds are computed over the complete batch before any value is
//! normalized. Missing values (an unreachable delay, for instance) are
//! excluded from the bounds and normalize to the worst end, `1.0`.

/// Normalize `x` against `[min, max]`. A degenerate range yields `1.0`.
pub fn min_max_norm(x: f64, min: f64, max: f64) -> f64 {
    if min == max {
        return 1.0;
    }
    (x - min) / (max - min)
}

/// Minimum and maximum of one numeric field across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Bounds of the given values, `None` if there are none.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(b) => Some(Self {
                min: b.min.min(v),
                max: b.max.max(v),
            }),
        })
    }

    pub fn normalize(&self, x: f64) -> f64 {
        min_max_norm(x, self.min, self.max)
    }
}

/// A record whose numeric fields take part in batch normalization.
pub trait MetricFields {
    type Field: Copy + PartialEq + std::fmt::Debug + 'static;

    /// Fields normalized for this record type.
    const FIELDS: &'static [Self::Field];

    /// Raw value of a field, `None` when it has no finite value.
    fn field(&self, field: Self::Field) -> Option<f64>;
}

/// Per-field bounds for one batch.
#[derive(Debug, Clone)]
pub struct BatchBounds<F> {
    bounds: Vec<(F, Option<Bounds>)>,
}

impl<F: Copy + PartialEq + std::fmt::Debug + 'static> BatchBounds<F> {
    /// Compute bounds for every declared field over the whole batch.
    pub fn compute<T>(batch: &[T]) -> Self
    where
        T: MetricFields<Field = F>,
    {
        let bounds = T::FIELDS
            .iter()
            .map(|&field| (field, Bounds::of(batch.iter().filter_map(|r| r.field(field)))))
            .collect();
        Self { bounds }
    }

    pub fn get(&self, field: F) -> Option<Bounds> {
        self.bounds
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, b)| *b)
    }

    /// Normalized value of `field` for one record of the batch.
    pub fn normalize<T>(&self, record: &T, field: F) -> f64
    where
        T: MetricFields<Field = F>,
    {
        match (record.field(field), self.get(field)) {
            (Some(x), Some(bounds)) => bounds.normalize(x),
            _ => 1.0,
        }
    }

    /// Sum of the normalized values of `fields`.
    pub fn normalized_sum<T>(&self, record: &T, fields: &[F]) -> f64
    where
        T: MetricFields<Field = F>,
    {
        fields.iter().map(|&f| self.normalize(record, f)).sum()
    }
}
