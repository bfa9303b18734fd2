//! Android release catalog and API level formatting.
//!
//! Levels are plain ordinals; the catalog only adds display names. A level the
//! catalog does not know is still a valid value and formats as `unknown (N)`.

use std::fmt;

/// A catalogued platform release.
#[derive(Debug, PartialEq, Eq)]
pub struct Release {
    pub level: i32,
    pub version_name: &'static str,
    pub code_name: &'static str,
}

const fn release(level: i32, version_name: &'static str, code_name: &'static str) -> Release {
    Release {
        level,
        version_name,
        code_name,
    }
}

/// Known releases, consecutive from level 1.
static RELEASES: &[Release] = &[
    release(1, "1.0", "(initial)"),
    release(2, "1.1", "(initial)"),
    release(3, "1.5", "Cupcake"),
    release(4, "1.6", "Donut"),
    release(5, "2.0", "Eclair"),
    release(6, "2.0.1", "Eclair"),
    release(7, "2.1", "Eclair"),
    release(8, "2.2", "Froyo"),
    release(9, "2.3", "Gingerbread"),
    release(10, "2.3.3", "Gingerbread"),
    release(11, "3.0", "Honeycomb"),
    release(12, "3.1", "Honeycomb"),
    release(13, "3.2", "Honeycomb"),
    release(14, "4.0", "Ice Cream Sandwich"),
    release(15, "4.0.3", "Ice Cream Sandwich"),
    release(16, "4.1", "Jelly Bean"),
    release(17, "4.2", "Jelly Bean"),
    release(18, "4.3", "Jelly Bean"),
    release(19, "4.4", "Kitkat"),
    release(20, "4.4W", "Kitkat"),
    release(21, "5.0", "Lollipop"),
    release(22, "5.1", "Lollipop"),
    release(23, "6.0", "Marshmallow"),
    release(24, "7.0", "Nougat"),
    release(25, "7.1", "Nougat"),
    release(26, "8.0", "Oreo"),
    release(27, "8.1", "Oreo"),
    release(28, "9.0", "Pie"),
    release(29, "10", "Android Q"),
    release(30, "11", "Android R"),
    release(31, "12", "Android S"),
    release(32, "12", "Android S_V2"),
    release(33, "13", "Tiramisu"),
    release(34, "14", "Upside Down Cake"),
];

/// An API level ordinal. Ordering and equality are by ordinal only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiLevel(i32);

impl ApiLevel {
    pub const fn new(level: i32) -> Self {
        Self(level)
    }

    /// The newest release in the catalog.
    pub fn latest() -> Self {
        Self(RELEASES[RELEASES.len() - 1].level)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn release(self) -> Option<&'static Release> {
        // Catalog starts at 1, so level N lives at index N - 1.
        let index = usize::try_from(self.0.checked_sub(1)?).ok()?;
        RELEASES.get(index)
    }

    pub fn is_unknown(self) -> bool {
        self.release().is_none()
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.release() {
            // e.g. `5.1 Lollipop (22)`
            Some(r) => write!(f, "{} {} ({})", r.version_name, r.code_name, r.level),
            None => write!(f, "unknown ({})", self.0),
        }
    }
}
