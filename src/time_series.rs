//! Snapshots and the time series defined over them.
//!
//! A model covers a sequence of regularly spaced [`Snapshots`]. Each snapshot carries a weight in
//! hours which is used to turn power into energy (and emissions) totals. Demand and
//! capacity-factor profiles must line up exactly with the snapshots they are used with.
use crate::error::PipelineError;
use crate::units::{Dimensionless, Hours};
use chrono::{NaiveDateTime, TimeDelta};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use log::warn;
use serde_string_enum::DeserializeLabeledStringEnum;

/// The number of seconds in an hour
const SECONDS_PER_HOUR: f64 = 3600.0;

/// The model's declared time index
#[derive(PartialEq, Debug, Clone)]
pub struct Snapshots {
    start: NaiveDateTime,
    resolution: TimeDelta,
    count: usize,
    weight: Hours,
}

impl Snapshots {
    /// Create a new set of snapshots.
    ///
    /// A warning is logged if `weight` differs from the resolution in hours, as energy and
    /// emissions totals will then be scaled by a constant factor.
    ///
    /// # Arguments
    ///
    /// * `start` - Time stamp of the first snapshot
    /// * `resolution` - Spacing between snapshots
    /// * `count` - Number of snapshots
    /// * `weight` - Hours represented by each snapshot
    pub fn new(
        start: NaiveDateTime,
        resolution: TimeDelta,
        count: usize,
        weight: Hours,
    ) -> Result<Self, PipelineError> {
        if resolution <= TimeDelta::zero() {
            return Err(PipelineError::InvalidParameter(
                "Snapshot resolution must be positive".into(),
            ));
        }
        if count == 0 {
            return Err(PipelineError::InvalidParameter(
                "There must be at least one snapshot".into(),
            ));
        }
        if !(weight.is_finite() && weight > Hours(0.0)) {
            return Err(PipelineError::InvalidParameter(
                "Snapshot weight must be a positive number".into(),
            ));
        }

        // The last time stamp must be representable
        let last = i32::try_from(count - 1)
            .ok()
            .and_then(|i| resolution.checked_mul(i))
            .and_then(|span| start.checked_add_signed(span));
        if last.is_none() {
            return Err(PipelineError::InvalidParameter(format!(
                "Too many snapshots ({count}) for the given start and resolution"
            )));
        }

        let snapshots = Self {
            start,
            resolution,
            count,
            weight,
        };

        let resolution_hours = snapshots.resolution_hours();
        if !approx_eq!(Hours, weight, resolution_hours) {
            warn!(
                "Snapshot weight ({weight} h) differs from snapshot resolution ({resolution_hours} \
                h); energy and emissions totals will be scaled accordingly"
            );
        }

        Ok(snapshots)
    }

    /// Create hourly snapshots, each with a weight of one hour
    pub fn hourly(start: NaiveDateTime, count: usize) -> Result<Self, PipelineError> {
        Self::new(start, TimeDelta::hours(1), count, Hours(1.0))
    }

    /// Time stamp of the first snapshot
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Spacing between snapshots
    pub fn resolution(&self) -> TimeDelta {
        self.resolution
    }

    /// Spacing between snapshots in hours
    pub fn resolution_hours(&self) -> Hours {
        Hours(self.resolution.num_seconds() as f64 / SECONDS_PER_HOUR)
    }

    /// Hours represented by each snapshot
    pub fn weight(&self) -> Hours {
        self.weight
    }

    /// The number of snapshots
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false, as there is at least one snapshot
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterate over the time stamps of the snapshots
    pub fn iter(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        let resolution = self.resolution;
        std::iter::successors(Some(self.start), move |time| {
            time.checked_add_signed(resolution)
        })
        .take(self.count)
    }

    /// Keep every `n`th snapshot, scaling the resolution and weight by `n`.
    ///
    /// Profiles used with the result must be resampled with [`TimeSeriesProfile::resample`] using
    /// the same `n`.
    pub fn resample(&self, n: usize) -> Result<Self, PipelineError> {
        let factor = resample_factor(n)?;
        let resolution = self.resolution.checked_mul(factor).ok_or_else(|| {
            PipelineError::InvalidParameter(format!("Resampling step {n} is too large"))
        })?;
        Self::new(
            self.start,
            resolution,
            self.count.div_ceil(n),
            self.weight * Dimensionless(n as f64),
        )
    }
}

fn resample_factor(n: usize) -> Result<i32, PipelineError> {
    i32::try_from(n)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| PipelineError::InvalidParameter(format!("Invalid resampling step: {n}")))
}

/// What a profile's values represent
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, DeserializeLabeledStringEnum)]
pub enum ProfileKind {
    /// Electricity demand in MW
    #[string = "demand"]
    Demand,
    /// Available fraction of nominal capacity, in `[0, 1]`
    #[string = "capacity_factor"]
    CapacityFactor,
}

/// A named, regularly spaced time series
#[derive(PartialEq, Debug, Clone)]
pub struct TimeSeriesProfile {
    name: String,
    kind: ProfileKind,
    index: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeriesProfile {
    /// Create a new profile, checking its invariants.
    ///
    /// The index must be strictly increasing and regularly spaced. Demand values must be
    /// non-negative and capacity factors must lie in `[0, 1]`.
    pub fn new(
        name: &str,
        kind: ProfileKind,
        index: Vec<NaiveDateTime>,
        values: Vec<f64>,
    ) -> Result<Self, PipelineError> {
        let invalid = |msg: String| PipelineError::InvalidParameter(format!("{name}: {msg}"));

        if index.is_empty() {
            return Err(invalid("Time series cannot be empty".into()));
        }
        if index.len() != values.len() {
            return Err(invalid(format!(
                "Index has {} entries but there are {} values",
                index.len(),
                values.len()
            )));
        }

        if let [first, second, ..] = index[..] {
            let step = second - first;
            if step <= TimeDelta::zero() {
                return Err(invalid("Index must be strictly increasing".into()));
            }
            if let Some(pair) = index.windows(2).find(|w| w[1] - w[0] != step) {
                return Err(invalid(format!(
                    "Index is not regularly spaced (gap between {} and {})",
                    pair[0], pair[1]
                )));
            }
        }

        for value in &values {
            let ok = match kind {
                ProfileKind::Demand => value.is_finite() && *value >= 0.0,
                ProfileKind::CapacityFactor => (0.0..=1.0).contains(value),
            };
            if !ok {
                return Err(invalid(format!("Value {value} is out of range for {kind:?}")));
            }
        }

        Ok(Self {
            name: name.into(),
            kind,
            index,
            values,
        })
    }

    /// Create a profile over the given snapshots
    pub fn over_snapshots(
        name: &str,
        kind: ProfileKind,
        snapshots: &Snapshots,
        values: Vec<f64>,
    ) -> Result<Self, PipelineError> {
        Self::new(name, kind, snapshots.iter().collect(), values)
    }

    /// The profile's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the values represent
    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// The time stamps
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// The values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The number of points
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, as profiles cannot be empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Spacing between points, if there is more than one
    pub fn resolution(&self) -> Option<TimeDelta> {
        match self.index[..] {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }

    /// Keep every `n`th point, starting with the first
    pub fn resample(&self, n: usize) -> Result<Self, PipelineError> {
        resample_factor(n)?;
        Ok(Self {
            name: self.name.clone(),
            kind: self.kind,
            index: self.index.iter().step_by(n).copied().collect(),
            values: self.values.iter().step_by(n).copied().collect(),
        })
    }

    /// Check that this profile has exactly the same time index as `snapshots`.
    ///
    /// The number of points, the start and the spacing must all match.
    pub fn check_aligned(&self, snapshots: &Snapshots) -> Result<(), PipelineError> {
        let mismatch = |message: String| PipelineError::ProfileLengthMismatch {
            profile: self.name.clone(),
            message,
        };

        if self.len() != snapshots.len() {
            return Err(mismatch(format!(
                "profile has {} points but there are {} snapshots",
                self.len(),
                snapshots.len()
            )));
        }
        if self.index[0] != snapshots.start() {
            return Err(mismatch(format!(
                "profile starts at {} but snapshots start at {}",
                self.index[0],
                snapshots.start()
            )));
        }
        if let Some(resolution) = self.resolution()
            && resolution != snapshots.resolution()
        {
            return Err(mismatch(format!(
                "profile resolution is {resolution} but snapshot resolution is {}",
                snapshots.resolution()
            )));
        }

        Ok(())
    }
}

/// A collection of profiles, keyed by name
#[derive(PartialEq, Debug, Clone, Default)]
pub struct TimeSeriesSet(IndexMap<String, TimeSeriesProfile>);

impl TimeSeriesSet {
    /// Create a set from profiles, failing if any names are repeated
    pub fn from_profiles<I>(profiles: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = TimeSeriesProfile>,
    {
        let mut set = Self::default();
        for profile in profiles {
            set.insert(profile)?;
        }

        Ok(set)
    }

    /// Add a profile, failing if one with the same name is already present
    pub fn insert(&mut self, profile: TimeSeriesProfile) -> Result<(), PipelineError> {
        if self.0.contains_key(profile.name()) {
            return Err(PipelineError::InvalidParameter(format!(
                "Duplicate time series: {}",
                profile.name()
            )));
        }
        self.0.insert(profile.name().to_string(), profile);

        Ok(())
    }

    /// Look up a profile by name, checking it has the expected kind
    pub fn get(&self, name: &str, kind: ProfileKind) -> Result<&TimeSeriesProfile, PipelineError> {
        let profile = self
            .0
            .get(name)
            .ok_or_else(|| PipelineError::missing("time series", name))?;
        if profile.kind() != kind {
            return Err(PipelineError::InvalidParameter(format!(
                "Time series {name} is a {:?} profile, not {kind:?}",
                profile.kind()
            )));
        }

        Ok(profile)
    }

    /// Resample every profile in the set
    pub fn resample(&self, n: usize) -> Result<Self, PipelineError> {
        self.0
            .values()
            .map(|profile| Ok((profile.name().to_string(), profile.resample(n)?)))
            .collect::<Result<_, _>>()
            .map(Self)
    }

    /// Iterate over the profiles
    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesProfile> {
        self.0.values()
    }

    /// The number of profiles
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_pipeline_error, start_time};
    use rstest::rstest;

    #[rstest]
    fn test_snapshots_iter(start_time: NaiveDateTime) {
        let snapshots = Snapshots::new(start_time, TimeDelta::hours(3), 3, Hours(3.0)).unwrap();
        let stamps: Vec<_> = snapshots.iter().collect();
        assert_eq!(
            stamps,
            [
                start_time,
                start_time + TimeDelta::hours(3),
                start_time + TimeDelta::hours(6)
            ]
        );
        assert_eq!(snapshots.resolution_hours(), Hours(3.0));
    }

    #[rstest]
    #[case(TimeDelta::zero(), 3, Hours(1.0))]
    #[case(TimeDelta::hours(1), 0, Hours(1.0))]
    #[case(TimeDelta::hours(1), 3, Hours(0.0))]
    #[case(TimeDelta::hours(1), 3, Hours(f64::INFINITY))]
    #[case(TimeDelta::hours(1), usize::MAX, Hours(1.0))] // Too many to index
    #[case(TimeDelta::days(73_000_000), 3, Hours(1.0))] // Past the last representable date
    fn test_snapshots_new_invalid(
        start_time: NaiveDateTime,
        #[case] resolution: TimeDelta,
        #[case] count: usize,
        #[case] weight: Hours,
    ) {
        assert!(matches!(
            Snapshots::new(start_time, resolution, count, weight),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[rstest]
    fn test_snapshots_resample(start_time: NaiveDateTime) {
        let snapshots = Snapshots::hourly(start_time, 24).unwrap();
        let resampled = snapshots.resample(3).unwrap();
        assert_eq!(resampled.len(), 8);
        assert_eq!(resampled.resolution(), TimeDelta::hours(3));
        assert_eq!(resampled.weight(), Hours(3.0));

        let resampled = snapshots.resample(5).unwrap();
        assert_eq!(resampled.len(), 5);
        assert!(snapshots.resample(0).is_err());
    }

    #[rstest]
    fn test_profile_new(start_time: NaiveDateTime) {
        let snapshots = Snapshots::hourly(start_time, 3).unwrap();
        let profile = TimeSeriesProfile::over_snapshots(
            "solar",
            ProfileKind::CapacityFactor,
            &snapshots,
            vec![0.1, 0.5, 0.9],
        )
        .unwrap();
        assert_eq!(profile.resolution(), Some(TimeDelta::hours(1)));
        assert!(profile.check_aligned(&snapshots).is_ok());
    }

    #[rstest]
    #[case(ProfileKind::CapacityFactor, vec![0.1, 1.1])]
    #[case(ProfileKind::CapacityFactor, vec![-0.1, 0.5])]
    #[case(ProfileKind::Demand, vec![-1.0, 5.0])]
    #[case(ProfileKind::Demand, vec![f64::NAN, 5.0])]
    #[case(ProfileKind::Demand, vec![1.0])] // Wrong length
    fn test_profile_new_bad_values(
        start_time: NaiveDateTime,
        #[case] kind: ProfileKind,
        #[case] values: Vec<f64>,
    ) {
        let index = vec![start_time, start_time + TimeDelta::hours(1)];
        assert!(matches!(
            TimeSeriesProfile::new("p", kind, index, values),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[rstest]
    fn test_profile_new_bad_index(start_time: NaiveDateTime) {
        let hour = TimeDelta::hours(1);

        // Not increasing
        let index = vec![start_time + hour, start_time];
        assert!(TimeSeriesProfile::new("p", ProfileKind::Demand, index, vec![1.0, 1.0]).is_err());

        // Irregular
        let index = vec![start_time, start_time + hour, start_time + hour * 3];
        assert!(
            TimeSeriesProfile::new("p", ProfileKind::Demand, index, vec![1.0, 1.0, 1.0]).is_err()
        );
    }

    #[rstest]
    fn test_profile_check_aligned_length(start_time: NaiveDateTime) {
        let hourly = Snapshots::hourly(start_time, 24).unwrap();
        let profile = TimeSeriesProfile::over_snapshots(
            "load",
            ProfileKind::Demand,
            &hourly,
            vec![1.0; 24],
        )
        .unwrap();
        let snapshots = Snapshots::hourly(start_time, 8).unwrap();
        assert_pipeline_error!(
            profile.check_aligned(&snapshots),
            PipelineError::ProfileLengthMismatch { .. }
        );
    }

    #[rstest]
    fn test_profile_check_aligned_start_and_spacing(start_time: NaiveDateTime) {
        let snapshots = Snapshots::hourly(start_time, 2).unwrap();

        let late = vec![start_time + TimeDelta::hours(1), start_time + TimeDelta::hours(2)];
        let profile = TimeSeriesProfile::new("p", ProfileKind::Demand, late, vec![1.0; 2]).unwrap();
        assert_pipeline_error!(
            profile.check_aligned(&snapshots),
            PipelineError::ProfileLengthMismatch { .. }
        );

        let coarse = vec![start_time, start_time + TimeDelta::hours(2)];
        let profile =
            TimeSeriesProfile::new("p", ProfileKind::Demand, coarse, vec![1.0; 2]).unwrap();
        assert_pipeline_error!(
            profile.check_aligned(&snapshots),
            PipelineError::ProfileLengthMismatch { .. }
        );
    }

    #[rstest]
    fn test_resample_profile_and_snapshots_together(start_time: NaiveDateTime) {
        let snapshots = Snapshots::hourly(start_time, 6).unwrap();
        let values = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
        let profile = TimeSeriesProfile::over_snapshots(
            "wind",
            ProfileKind::CapacityFactor,
            &snapshots,
            values,
        )
        .unwrap();

        let resampled = profile.resample(2).unwrap();
        assert_eq!(resampled.values(), [0.0, 0.2, 0.4]);
        assert!(resampled.check_aligned(&snapshots.resample(2).unwrap()).is_ok());
        assert!(resampled.check_aligned(&snapshots).is_err());
    }

    #[rstest]
    fn test_time_series_set(start_time: NaiveDateTime) {
        let snapshots = Snapshots::hourly(start_time, 2).unwrap();
        let profile = |name: &str, kind| {
            TimeSeriesProfile::over_snapshots(name, kind, &snapshots, vec![0.5, 0.5]).unwrap()
        };

        let set = TimeSeriesSet::from_profiles([
            profile("load", ProfileKind::Demand),
            profile("solar", ProfileKind::CapacityFactor),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("load", ProfileKind::Demand).is_ok());
        assert!(set.get("load", ProfileKind::CapacityFactor).is_err());
        assert_eq!(
            set.get("wind", ProfileKind::CapacityFactor).unwrap_err(),
            PipelineError::missing("time series", "wind")
        );

        let duplicate = TimeSeriesSet::from_profiles([
            profile("load", ProfileKind::Demand),
            profile("load", ProfileKind::Demand),
        ]);
        assert!(duplicate.is_err());
    }
}
