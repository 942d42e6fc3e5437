//! Core view-state newtypes

use crate::model::ConfigurationError;

/// Height of a row in terminal lines. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowHeight(u16);

impl RowHeight {
    /// Minimum row height.
    pub const ONE: Self = Self(1);

    /// Smart constructor that validates the height is >= 1.
    pub fn new(height: u16) -> Result<Self, ConfigurationError> {
        if height == 0 {
            Err(ConfigurationError::ZeroRowHeight)
        } else {
            Ok(Self(height))
        }
    }

    /// Get the raw u16 value.
    pub fn get(self) -> u16 {
        self.0
    }

    /// Height as usize, for offset arithmetic.
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for RowHeight {
    fn default() -> Self {
        Self::ONE
    }
}

/// Number of extra rows rendered above and below the visible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Overscan(usize);

impl Overscan {
    /// Overscan used when none is configured.
    pub const DEFAULT: Self = Self(5);

    /// Wrap a row count. Zero disables overscan.
    pub const fn new(rows: usize) -> Self {
        Self(rows)
    }

    /// Raw row count.
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for Overscan {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Terminal viewport dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportDimensions {
    /// Width in columns.
    pub width: u16,
    /// Height in lines.
    pub height: u16,
}

impl ViewportDimensions {
    /// Create viewport dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod row_height {
        use super::*;

        #[test]
        fn new_accepts_one() {
            assert_eq!(RowHeight::new(1), Ok(RowHeight::ONE));
        }

        #[test]
        fn new_rejects_zero() {
            assert_eq!(RowHeight::new(0), Err(ConfigurationError::ZeroRowHeight));
        }

        #[test]
        fn default_is_one() {
            assert_eq!(RowHeight::default().get(), 1);
        }

        #[test]
        fn as_usize_matches_get() {
            let h = RowHeight::new(7).expect("nonzero");
            assert_eq!(h.as_usize(), 7);
        }
    }

    mod overscan {
        use super::*;

        #[test]
        fn default_is_five_rows() {
            assert_eq!(Overscan::default().get(), 5);
        }

        #[test]
        fn zero_is_allowed() {
            assert_eq!(Overscan::new(0).get(), 0);
        }
    }
}
