//! Timber beams: a rectangular profile swept along an axis, plus fabrication state.

use petgraph::stable_graph::EdgeIndex;

use crate::errors::{BeamDimensionError, CutError, TrussEditError};
use crate::geometry::{horizontal_perpendicular, vertical, Line, Plane, Point};
use crate::kernel::Polyline;

/// A straight beam of rectangular cross-section.
///
/// The beam keeps two profiles in the horizontal plane: the full rectangle
/// around its axis (`uncut`) and the trimmed outline produced by joint
/// cutting (`cut`). Once a beam is fabricated its cut profile never changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    /// Centreline, directed from the start node to the end node.
    axis: Line,
    /// Cross-section height.
    height: f64,
    /// Cross-section width.
    width: f64,
    /// Width when the beam was last fabricated.
    reference_width: f64,
    /// Full rectangular profile.
    uncut: Polyline,
    /// Current trimmed profile.
    cut: Polyline,
    /// Whether the beam has been physically cut.
    fabricated: bool,
    /// Whether the beam was introduced or moved since the last fabrication round.
    is_new: bool,
}

impl Beam {
    /// Create an uncut, unfabricated beam.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::InvalidBeamDimensions`] for non-positive
    /// dimensions and [`TrussEditError::ZeroLengthAxis`] when the axis has no
    /// horizontal extent.
    ///
    /// # Examples
    /// ```
    /// use trusscut::{point, Beam, Line};
    ///
    /// let axis = Line::new(point(0.0, 0.0, 0.0), point(4.0, 0.0, 0.0));
    /// let beam = Beam::new(axis, 0.2, 0.1).expect("valid beam");
    /// assert_eq!(beam.uncut_polyline().corners().len(), 4);
    /// assert_eq!(beam.cut_polyline(), beam.uncut_polyline());
    /// ```
    pub fn new(axis: Line, height: f64, width: f64) -> Result<Self, TrussEditError> {
        BeamDimensionError::check(height, width)?;
        let uncut = uncut_profile(&axis, width)?;
        Ok(Self {
            axis,
            height,
            width,
            reference_width: width,
            cut: uncut.clone(),
            uncut,
            fabricated: false,
            is_new: false,
        })
    }

    /// Rebuild a beam from stored state.
    ///
    /// A missing cut profile falls back to the uncut profile.
    pub(crate) fn restore(
        axis: Line,
        height: f64,
        width: f64,
        reference_width: f64,
        fabricated: bool,
        is_new: bool,
        cut: Option<Polyline>,
    ) -> Result<Self, TrussEditError> {
        BeamDimensionError::check(height, reference_width)?;
        let mut beam = Self::new(axis, height, width)?;
        beam.reference_width = reference_width;
        beam.fabricated = fabricated;
        beam.is_new = is_new;
        if let Some(cut) = cut {
            beam.cut = cut;
        }
        Ok(beam)
    }

    /// Beam centreline.
    #[must_use]
    pub fn axis(&self) -> &Line {
        &self.axis
    }

    /// Cross-section height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Cross-section width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Width recorded when the beam was last fabricated.
    #[must_use]
    pub fn reference_width(&self) -> f64 {
        self.reference_width
    }

    /// Full rectangular profile around the axis.
    #[must_use]
    pub fn uncut_polyline(&self) -> &Polyline {
        &self.uncut
    }

    /// Current trimmed profile.
    #[must_use]
    pub fn cut_polyline(&self) -> &Polyline {
        &self.cut
    }

    /// Whether the beam is already physically cut.
    #[must_use]
    pub fn is_fabricated(&self) -> bool {
        self.fabricated
    }

    /// Whether the beam appeared or moved since the last fabrication round.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Axis midpoint.
    #[must_use]
    pub fn centroid(&self) -> Point {
        self.axis.midpoint()
    }

    /// Axis length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.axis.length()
    }

    /// Local frame at the centroid: x along the axis, y to the left of it, normal up.
    #[must_use]
    pub fn frame(&self) -> Plane {
        let xaxis = self.axis.direction().normalize();
        let yaxis = vertical().cross(&xaxis).normalize();
        Plane::new(self.centroid(), xaxis, yaxis)
    }

    /// Replace the trimmed profile.
    ///
    /// This is the only path that writes a cut profile, so a fabricated beam
    /// can never be altered.
    pub(crate) fn replace_cut(&mut self, id: EdgeIndex, cut: Polyline) -> Result<(), CutError> {
        if self.fabricated {
            return Err(CutError::FabricatedBeam(id));
        }
        self.cut = cut;
        Ok(())
    }

    /// Restore the full profile on an unfabricated beam.
    pub(crate) fn reset_cut(&mut self) {
        if !self.fabricated {
            self.cut = self.uncut.clone();
        }
    }

    /// Move the axis and rebuild the uncut profile.
    pub(crate) fn set_axis(&mut self, axis: Line) -> Result<(), TrussEditError> {
        self.uncut = uncut_profile(&axis, self.width)?;
        self.axis = axis;
        self.reset_cut();
        Ok(())
    }

    /// Change the cross-section width of an unfabricated beam.
    pub(crate) fn set_width(&mut self, id: EdgeIndex, width: f64) -> Result<(), TrussEditError> {
        if self.fabricated {
            return Err(TrussEditError::FabricatedBeam(id));
        }
        BeamDimensionError::check(self.height, width)?;
        self.uncut = uncut_profile(&self.axis, width)?;
        self.width = width;
        self.reset_cut();
        Ok(())
    }

    /// Freeze the current cut and remember the width it was made for.
    pub(crate) fn mark_fabricated(&mut self) {
        self.fabricated = true;
        self.reference_width = self.width;
        self.is_new = false;
    }

    /// Flag the beam as introduced since the last fabrication round.
    pub(crate) fn set_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }
}

/// Closed rectangle of `width` around `axis`: `from+perp, from-perp, to-perp, to+perp`.
fn uncut_profile(axis: &Line, width: f64) -> Result<Polyline, TrussEditError> {
    let zero_length = || TrussEditError::ZeroLengthAxis {
        from: axis.from,
        to: axis.to,
    };
    let direction = axis.unit_direction(f64::EPSILON).ok_or_else(zero_length)?;
    let perp = horizontal_perpendicular(&direction).ok_or_else(zero_length)? * (width / 2.0);
    Ok(Polyline::closed(vec![
        axis.from + perp,
        axis.from - perp,
        axis.to - perp,
        axis.to + perp,
    ]))
}
