//! Stroke and fill style enums shared between path builders and tessellators

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
    /// Flat cap at the endpoint
    #[default]
    Butt,
    /// Rounded cap extending past the endpoint
    Round,
    /// Square cap extending past the endpoint
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineJoin {
    /// Miter join (sharp corner), degrades to bevel past the miter limit
    #[default]
    Miter,
    /// Round join
    Round,
    /// Bevel join (flat corner)
    Bevel,
}

/// Sub-path winding direction
///
/// Counter-clockwise paths are solid, clockwise paths punch holes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Winding {
    /// Counter-clockwise (solid shapes)
    #[default]
    Ccw = 1,
    /// Clockwise (holes)
    Cw = 2,
}

impl Winding {
    pub const SOLID: Winding = Winding::Ccw;
    pub const HOLE: Winding = Winding::Cw;

    /// Decodes a serialized winding tag; unknown values fall back to solid
    pub fn from_tag(tag: f32) -> Self {
        if tag as i32 == Winding::Cw as i32 {
            Winding::Cw
        } else {
            Winding::Ccw
        }
    }

    pub fn tag(self) -> f32 {
        self as u8 as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(LineCap::default(), LineCap::Butt);
        assert_eq!(LineJoin::default(), LineJoin::Miter);
        assert_eq!(Winding::default(), Winding::SOLID);
    }

    #[test]
    fn test_winding_tag() {
        assert_eq!(Winding::from_tag(Winding::Cw.tag()), Winding::Cw);
        assert_eq!(Winding::from_tag(Winding::Ccw.tag()), Winding::Ccw);
        assert_eq!(Winding::from_tag(7.0), Winding::Ccw);
    }
}
