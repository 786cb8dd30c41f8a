// ---------------------------------------------------------------------------
// Extent
// ---------------------------------------------------------------------------

/// Minimum and maximum of `values`, skipping NaN.
/// Returns `None` when nothing comparable is left.
pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ---------------------------------------------------------------------------
// LinearScale
// ---------------------------------------------------------------------------

/// Continuous linear mapping from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    /// Project a domain value onto the range. A zero-width domain maps
    /// everything to the start of the range.
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    /// Tick spacing giving roughly `count` ticks: 1, 2 or 5 times a power
    /// of ten. `None` for a zero-width or non-finite domain.
    pub fn tick_step(&self, count: usize) -> Option<f64> {
        let (lo, hi) = self.sorted_domain();
        let span = hi - lo;
        if !(span > 0.0) || !span.is_finite() || count == 0 {
            return None;
        }
        let m = count as f64;
        let mut step = 10f64.powf((span / m).log10().floor());
        let err = m / span * step;
        if err <= 0.15 {
            step *= 10.0;
        } else if err <= 0.35 {
            step *= 5.0;
        } else if err <= 0.75 {
            step *= 2.0;
        }
        Some(step)
    }

    /// Nicely rounded tick values inside the domain, ascending.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = self.sorted_domain();
        let Some(step) = self.tick_step(count) else {
            return if lo.is_finite() { vec![lo] } else { Vec::new() };
        };

        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        // Dividing by the inverse keeps values like 0.3 exact.
        let inverse = if step < 1.0 { Some((1.0 / step).round()) } else { None };
        (first..=last)
            .map(|i| match inverse {
                Some(inv) => i as f64 / inv,
                None => i as f64 * step,
            })
            .collect()
    }

    /// Number of decimals needed to tell ticks `count` apart.
    pub fn tick_precision(&self, count: usize) -> usize {
        match self.tick_step(count) {
            Some(step) => (-(step.log10() + 0.01).floor()).max(0.0) as usize,
            None => 0,
        }
    }

    fn sorted_domain(&self) -> (f64, f64) {
        let (d0, d1) = self.domain;
        if d0 <= d1 {
            (d0, d1)
        } else {
            (d1, d0)
        }
    }
}

/// Fixed-point label with thousands separators, e.g. `-1,250.5`.
pub fn format_tick(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = grouped.chars().all(|c| matches!(c, '0' | '.' | ','));
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_skips_nan() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent([f64::NAN]), None);
        assert_eq!(extent(Vec::<f64>::new()), None);
    }

    #[test]
    fn apply_maps_domain_onto_range() {
        let y = LinearScale::new((0.0, 10.0), (450.0, 0.0));
        assert_eq!(y.apply(0.0), 450.0);
        assert_eq!(y.apply(10.0), 0.0);
        assert_eq!(y.apply(5.0), 225.0);
        assert_eq!(y.apply(20.0), -450.0);
    }

    #[test]
    fn zero_width_domain_maps_to_range_start() {
        let s = LinearScale::new((4.0, 4.0), (450.0, 0.0));
        assert_eq!(s.apply(4.0), 450.0);
        assert_eq!(s.ticks(10), vec![4.0]);
        assert_eq!(s.tick_precision(10), 0);
    }

    #[test]
    fn ticks_unit_interval() {
        let s = LinearScale::new((0.0, 1.0), (0.0, 890.0));
        let ticks = s.ticks(10);
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[3], 0.3);
        assert_eq!(ticks[10], 1.0);
        assert_eq!(s.tick_precision(10), 1);
    }

    #[test]
    fn ticks_pick_nice_steps() {
        let s = LinearScale::new((0.0, 4.5), (0.0, 1.0));
        assert_eq!(s.tick_step(10), Some(0.5));
        assert_eq!(s.ticks(10).len(), 10);

        let s = LinearScale::new((1.0, 49.0), (0.0, 1.0));
        assert_eq!(s.tick_step(10), Some(5.0));
        assert_eq!(s.ticks(10), vec![5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0]);

        let s = LinearScale::new((-3.2, 7.9), (0.0, 1.0));
        assert_eq!(s.tick_step(10), Some(1.0));
        assert_eq!(s.ticks(10).first(), Some(&-3.0));
        assert_eq!(s.ticks(10).last(), Some(&7.0));
    }

    #[test]
    fn ticks_ignore_domain_direction() {
        let s = LinearScale::new((100.0, 0.0), (0.0, 1.0));
        assert_eq!(s.ticks(10).len(), 11);
    }

    #[test]
    fn format_tick_groups_thousands() {
        assert_eq!(format_tick(0.0, 0), "0");
        assert_eq!(format_tick(1250.5, 1), "1,250.5");
        assert_eq!(format_tick(-1_000_000.0, 0), "-1,000,000");
        assert_eq!(format_tick(0.30000000000000004, 1), "0.3");
        assert_eq!(format_tick(-0.0, 1), "0.0");
        assert_eq!(format_tick(999.0, 0), "999");
    }
}
