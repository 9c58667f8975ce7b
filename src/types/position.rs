//! Symbolic-or-absolute positions and percentage-or-absolute sizes shared by
//! watermarks and template image elements.

use std::fmt;

use crate::error::{PicGeniusError, Result};

/// Placement of content along one axis relative to the containing extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `left` / `top`
    Start,
    Center,
    /// `right` / `bottom`
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn keywords(self) -> [&'static str; 3] {
        match self {
            Axis::Horizontal => ["left", "center", "right"],
            Axis::Vertical => ["top", "center", "bottom"],
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "x"),
            Axis::Vertical => write!(f, "y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPosition {
    Anchor(Anchor),
    /// Exact pixel coordinate; margin does not apply.
    Pixels(i64),
}

impl AxisPosition {
    /// Parse a symbolic keyword valid for `axis`.
    pub fn from_keyword(axis: Axis, keyword: &str) -> Result<Self> {
        let [start, center, end] = axis.keywords();
        let anchor = match keyword.trim().to_ascii_lowercase().as_str() {
            k if k == start => Anchor::Start,
            k if k == center => Anchor::Center,
            k if k == end => Anchor::End,
            _ => {
                return Err(PicGeniusError::configuration(format!(
                    "invalid {} position \"{}\": expected one of {}, {}, {} or a pixel value",
                    axis, keyword, start, center, end
                )))
            }
        };
        Ok(AxisPosition::Anchor(anchor))
    }
}

/// A 2D position, each axis resolved independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position2D {
    pub x: AxisPosition,
    pub y: AxisPosition,
}

impl Position2D {
    pub const CENTER: Position2D = Position2D {
        x: AxisPosition::Anchor(Anchor::Center),
        y: AxisPosition::Anchor(Anchor::Center),
    };

    pub fn resolve(&self, extent: (u32, u32), content: (u32, u32), margin: i64) -> (i64, i64) {
        (
            resolve_axis(self.x, extent.0, content.0, margin),
            resolve_axis(self.y, extent.1, content.1, margin),
        )
    }
}

/// Pixel offset of content of size `content_extent` inside `extent`.
///
/// Centered content ignores the margin; start/end anchors keep `margin`
/// pixels from their edge.
pub fn resolve_axis(value: AxisPosition, extent: u32, content_extent: u32, margin: i64) -> i64 {
    let free = extent as i64 - content_extent as i64;
    match value {
        AxisPosition::Pixels(px) => px,
        AxisPosition::Anchor(Anchor::Start) => margin,
        AxisPosition::Anchor(Anchor::Center) => free.div_euclid(2),
        AxisPosition::Anchor(Anchor::End) => free - margin,
    }
}

/// A length given either as a percentage of a reference or in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Percent(f64),
    Pixels(u32),
}

impl Dimension {
    /// Parse `"70%"` or `"640"`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some(percent) = value.strip_suffix('%') {
            let percent: f64 = percent.trim().parse().map_err(|_| {
                PicGeniusError::configuration(format!("invalid percentage \"{}\"", value))
            })?;
            if !percent.is_finite() || percent < 0.0 {
                return Err(PicGeniusError::configuration(format!(
                    "percentage must be positive, got \"{}\"",
                    value
                )));
            }
            return Ok(Dimension::Percent(percent));
        }
        value.parse::<u32>().map(Dimension::Pixels).map_err(|_| {
            PicGeniusError::configuration(format!(
                "invalid size \"{}\": expected pixels or a percentage like \"70%\"",
                value
            ))
        })
    }

    pub fn resolve(&self, reference: u32) -> u32 {
        match *self {
            // Truncates toward zero, so 33.3% of 100 is 33.
            Dimension::Percent(percent) => (reference as f64 * percent / 100.0) as u32,
            Dimension::Pixels(px) => px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_per_axis() {
        assert_eq!(
            AxisPosition::from_keyword(Axis::Horizontal, "Right").unwrap(),
            AxisPosition::Anchor(Anchor::End)
        );
        assert_eq!(
            AxisPosition::from_keyword(Axis::Vertical, "top").unwrap(),
            AxisPosition::Anchor(Anchor::Start)
        );
        assert!(AxisPosition::from_keyword(Axis::Vertical, "left").is_err());
        assert!(AxisPosition::from_keyword(Axis::Horizontal, "middle").is_err());
    }

    #[test]
    fn resolve_axis_handles_every_anchor() {
        assert_eq!(resolve_axis(AxisPosition::Anchor(Anchor::Start), 1000, 200, 30), 30);
        assert_eq!(resolve_axis(AxisPosition::Anchor(Anchor::Center), 1000, 200, 30), 400);
        assert_eq!(resolve_axis(AxisPosition::Anchor(Anchor::End), 1000, 200, 30), 770);
        assert_eq!(resolve_axis(AxisPosition::Pixels(-12), 1000, 200, 30), -12);
    }

    #[test]
    fn centered_oversized_content_floors_toward_negative() {
        assert_eq!(resolve_axis(AxisPosition::Anchor(Anchor::Center), 100, 201, 0), -51);
    }

    #[test]
    fn dimensions_parse_and_resolve() {
        assert_eq!(Dimension::parse("70%").unwrap(), Dimension::Percent(70.0));
        assert_eq!(Dimension::parse("640").unwrap(), Dimension::Pixels(640));
        assert!(Dimension::parse("wide").is_err());
        assert!(Dimension::parse("-5%").is_err());

        assert_eq!(Dimension::Percent(70.0).resolve(1000), 700);
        assert_eq!(Dimension::Percent(33.3).resolve(100), 33);
        assert_eq!(Dimension::Pixels(42).resolve(1000), 42);
    }
}
