use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset};

/// The only deadline representation that is ever persisted: a wall-clock
/// instant with no timezone, `YYYY-MM-DDTHH:mm`.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Zoneless shapes the frontend has historically produced. The displayed
/// digits are taken as-is; no offset is applied.
const WALL_CLOCK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineError {
    InvalidDeadline(String),
}

impl std::fmt::Display for DeadlineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DeadlineError::InvalidDeadline(input) => {
                write!(f, "Invalid deadline, expected YYYY-MM-DDTHH:mm: {:?}", input)
            }
        }
    }
}

impl std::error::Error for DeadlineError {}

/// A validated canonical deadline. Construction goes through
/// [`DeadlineCodec::canonicalize`] or [`CanonicalDeadline::parse`], so holding
/// one means the string form and the wall-clock fields agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDeadline {
    text: String,
    wall_clock: NaiveDateTime,
}

impl CanonicalDeadline {
    /// Parse a string that must already be in canonical form. The input is
    /// re-rendered and compared so that under-padded or over-long variants
    /// (`2025-1-2T3:04`, trailing seconds) are rejected rather than corrected.
    pub fn parse(input: &str) -> Result<Self, DeadlineError> {
        let wall_clock = NaiveDateTime::parse_from_str(input, CANONICAL_FORMAT)
            .map_err(|_| DeadlineError::InvalidDeadline(input.to_string()))?;
        let rendered = wall_clock.format(CANONICAL_FORMAT).to_string();
        if rendered != input {
            return Err(DeadlineError::InvalidDeadline(input.to_string()));
        }
        Ok(Self {
            text: rendered,
            wall_clock,
        })
    }

    /// Render wall-clock fields as a canonical deadline. Reads the fields
    /// directly; never converts through an absolute instant.
    pub fn from_wall_clock(wall_clock: NaiveDateTime) -> Self {
        Self {
            text: wall_clock.format(CANONICAL_FORMAT).to_string(),
            wall_clock,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn wall_clock(&self) -> NaiveDateTime {
        self.wall_clock
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for CanonicalDeadline {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Forces every deadline input shape into the canonical wall-clock string.
///
/// The codec is pure: the only ambient state is the process-local UTC offset,
/// fixed at construction, used solely for inputs that carry an explicit zone.
/// Everything else is read by its displayed digits, which is what keeps a
/// deadline from drifting by the server's UTC offset when it passes through
/// persistence more than once.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineCodec {
    offset: FixedOffset,
}

impl DeadlineCodec {
    /// Codec pinned to the offset the scheduler process runs under.
    pub fn local() -> Self {
        Self {
            offset: Local::now().offset().fix(),
        }
    }

    /// Codec with an explicit offset. Used by tests and anywhere the local
    /// offset must not leak in.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Canonicalize any supported deadline input. Fails closed: anything not
    /// recognizably a date is an error, never a best-guess write.
    pub fn canonicalize(&self, input: &str) -> Result<CanonicalDeadline, DeadlineError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DeadlineError::InvalidDeadline(input.to_string()));
        }

        // Identity case: already canonical, returned unchanged.
        if let Ok(deadline) = CanonicalDeadline::parse(input) {
            return Ok(deadline);
        }

        // Explicitly zoned instants are the one case where conversion is
        // correct: resolve the absolute instant, then render its wall clock
        // under this process's offset.
        if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
            return Ok(self.canonicalize_instant(instant));
        }
        if let Ok(instant) = DateTime::parse_from_rfc2822(input) {
            return Ok(self.canonicalize_instant(instant));
        }

        // Zoneless strings already express a wall-clock intent; take the
        // displayed digits without any offset math.
        for format in WALL_CLOCK_FORMATS {
            if let Ok(wall_clock) = NaiveDateTime::parse_from_str(input, format) {
                return Ok(CanonicalDeadline::from_wall_clock(wall_clock));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(CanonicalDeadline::from_wall_clock(midnight));
            }
        }

        Err(DeadlineError::InvalidDeadline(input.to_string()))
    }

    /// Canonicalize a native date value by its local wall-clock fields.
    /// Deliberately NOT routed through `canonicalize_instant`: a value that
    /// already went through one offset conversion upstream would get shifted
    /// a second time, which is exactly the drift this codec exists to stop.
    pub fn canonicalize_local(&self, value: DateTime<Local>) -> CanonicalDeadline {
        CanonicalDeadline::from_wall_clock(value.naive_local())
    }

    fn canonicalize_instant(&self, instant: DateTime<FixedOffset>) -> CanonicalDeadline {
        CanonicalDeadline::from_wall_clock(instant.with_timezone(&self.offset).naive_local())
    }

    /// Re-parse a stored canonical string into its wall-clock fields.
    pub fn parse_wall_clock(stored: &str) -> Result<NaiveDateTime, DeadlineError> {
        CanonicalDeadline::parse(stored).map(|d| d.wall_clock())
    }

    /// Whether a stored value already satisfies the canonical pattern.
    pub fn is_canonical(stored: &str) -> bool {
        CanonicalDeadline::parse(stored).is_ok()
    }
}
