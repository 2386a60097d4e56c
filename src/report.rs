use std::fmt::{self, Write};

use trusscut::{CutReport, Truss};

/// Render a plain-text summary of a cut pass.
///
/// Lists every beam with the corner count of its profile, then the pairs that
/// were left untrimmed and the errors collected along the way.
pub fn render_report(truss: &Truss, report: &CutReport) -> Result<String, fmt::Error> {
    let mut output = String::new();

    writeln!(
        &mut output,
        "Cut {} nodes: {} pairs trimmed, {} reflex corrections",
        report.nodes_processed, report.pairs_trimmed, report.reflex_fixes
    )?;

    for (id, (_, beam)) in truss.beams().enumerate() {
        let state = if beam.is_fabricated() {
            "fabricated"
        } else if beam.is_new() {
            "new"
        } else {
            "open"
        };
        writeln!(
            &mut output,
            "  beam {id:>3}: {:>2} corners, width {:.3} ({state})",
            beam.cut_polyline().corners().len(),
            beam.width()
        )?;
    }

    if !report.skipped.is_empty() {
        writeln!(&mut output, "Untrimmed pairs:")?;
        for skip in &report.skipped {
            writeln!(
                &mut output,
                "  node {}: beams {} and {} ({} intersections)",
                skip.node.index(),
                skip.first.index(),
                skip.second.index(),
                skip.intersections
            )?;
        }
    }

    if !report.extended.is_empty() {
        writeln!(&mut output, "Reflex corrections past the beam end:")?;
        for beam in &report.extended {
            writeln!(&mut output, "  beam {}", beam.index())?;
        }
    }

    if report.errors.is_empty() {
        output.push_str("All joints cut.\n");
    } else {
        writeln!(&mut output, "Errors:")?;
        for error in &report.errors {
            writeln!(&mut output, "  {error}")?;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trusscut::point;

    #[test]
    fn formats_human_readable_report() {
        let mut truss = Truss::new();
        let joint = truss.add_node(point(0.0, 0.0, 0.0));
        let east = truss.add_node(point(10.0, 0.0, 0.0));
        let north = truss.add_node(point(0.0, 10.0, 0.0));
        truss.add_beam(joint, east, 1.0, 1.0).expect("valid beam");
        truss.add_beam(joint, north, 1.0, 1.0).expect("valid beam");
        let cut = truss.cut_all_beams();

        let text = render_report(&truss, &cut).expect("writing to a string");
        assert!(text.starts_with("Cut 1 nodes"));
        assert!(text.contains("beam   0"));
        assert!(text.contains("All joints cut."));
    }

    #[test]
    fn lists_overshooting_reflex_corrections() {
        let mut truss = Truss::new();
        let joint = truss.add_node(point(0.0, 0.0, 0.0));
        let east = truss.add_node(point(10.0, 0.0, 0.0));
        let angle = 5.0_f64.to_radians();
        let close = truss.add_node(point(10.0 * angle.cos(), 10.0 * angle.sin(), 0.0));
        truss.add_beam(joint, east, 1.0, 1.0).expect("valid beam");
        truss.add_beam(joint, close, 1.0, 1.0).expect("valid beam");
        let cut = truss.cut_all_beams();
        assert_eq!(cut.extended.len(), 2);

        let text = render_report(&truss, &cut).expect("writing to a string");
        assert!(text.contains("Reflex corrections past the beam end:"));
        assert!(text.contains("All joints cut."));
    }
}
