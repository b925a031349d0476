/// Data-integrity violations found while pivoting an ensemble.
///
/// These describe a broken ensemble rather than a broken file, so the
/// whole batch stops instead of dropping runs.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Two runs share the same duration and temporal pattern for one event.
    #[error(
        "duplicate run for {event} at {location}: {duration} {temporal_pattern} \
         appears in both {first_run} and {second_run}"
    )]
    DuplicateRun {
        event: String,
        location: String,
        duration: String,
        temporal_pattern: String,
        first_run: String,
        second_run: String,
    },

    /// Two distinct duration labels reduce to the same number of minutes.
    #[error(
        "durations \"{first}\" and \"{second}\" both read as {minutes} minutes \
         for {event} at {location}"
    )]
    DurationCollision {
        event: String,
        location: String,
        first: String,
        second: String,
        minutes: u32,
    },

    /// A duration label has no digits to read minutes from.
    #[error("duration \"{label}\" for {event} at {location} has no minutes value")]
    InvalidDuration {
        event: String,
        location: String,
        label: String,
    },

    /// The requested location is not a column of the ensemble.
    #[error("location \"{location}\" is not in the ensemble")]
    UnknownLocation { location: String },
}
