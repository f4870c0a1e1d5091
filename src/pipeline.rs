//! Layer pipeline
//!
//! Runs every line of every layer through the tokenizer, the motion tracker
//! and the active strategy in a single forward pass, then wraps the result
//! in the configured header and footer.

use std::borrow::Cow;
use std::fmt;

use crate::error::{LineError, TransformError};
use crate::motion::{MotionEvent, MotionState};
use crate::parser::{remove_axis, ParsedLine};
use crate::settings::Configuration;
use crate::strategy::{self, AnnotationStrategy};

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub layers: usize,
    pub lines: usize,
    /// Lines that received injected instructions or were rewritten
    pub annotated: usize,
    pub toggles: usize,
    pub dwells: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} layers, {} lines, {} annotated, {} pin toggles, {} dwells",
            self.layers, self.lines, self.annotated, self.toggles, self.dwells
        )
    }
}

/// Owns all state of one annotation run
pub struct Annotator {
    config: Configuration,
    motion: MotionState,
    strategy: Box<dyn AnnotationStrategy>,
    stats: RunStats,
}

impl Annotator {
    pub fn new(config: Configuration) -> Self {
        let strategy = strategy::from_config(&config);
        Self::with_strategy(config, strategy)
    }

    /// Use a custom strategy instead of the configured one
    pub fn with_strategy(config: Configuration, strategy: Box<dyn AnnotationStrategy>) -> Self {
        Self {
            config,
            motion: MotionState::new(),
            strategy,
            stats: RunStats::default(),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Annotate one raw line, terminator included
    pub fn annotate_line(&mut self, raw: &str) -> Result<String, LineError> {
        self.stats.lines += 1;

        let line = ParsedLine::parse(raw);
        let motion = match self.motion.advance(&line, &self.config.command_codes)? {
            MotionEvent::Move(motion) => motion,
            _ => return Ok(raw.to_string()),
        };

        let annotation = self.strategy.annotate(&line, &motion)?;
        let body = if self.config.remove_extrusion_axis {
            remove_axis(line.body, 'E')
        } else {
            Cow::Borrowed(line.body)
        };

        if annotation.is_empty() && body == line.body {
            return Ok(raw.to_string());
        }

        self.stats.annotated += 1;
        self.stats.toggles += annotation.toggles;
        self.stats.dwells += annotation.dwells;
        Ok(line.rebuild(&body, &annotation.before, &annotation.after))
    }

    /// Annotate all layers and add header, footer and summary
    ///
    /// The first failing line aborts the run.
    pub fn process<S: AsRef<str>>(&mut self, layers: &[S]) -> Result<Vec<String>, TransformError> {
        if layers.is_empty() {
            log::warn!("no layers to annotate");
            return Ok(Vec::new());
        }

        let mut output = Vec::with_capacity(layers.len());
        let mut line_number = 0;

        for (layer, text) in layers.iter().enumerate() {
            let text = text.as_ref();
            let mut annotated = String::with_capacity(text.len());

            for raw in text.split_inclusive('\n') {
                line_number += 1;
                let line = self.annotate_line(raw).map_err(|source| TransformError {
                    layer,
                    line: line_number,
                    text: raw.to_string(),
                    source,
                })?;
                annotated.push_str(&line);
            }

            self.stats.layers += 1;
            output.push(annotated);
        }

        self.wrap(&mut output);
        log::debug!("{} run finished: {}", self.strategy.name(), self.stats);
        Ok(output)
    }

    fn wrap(&self, output: &mut [String]) {
        if let Some(first) = output.first_mut() {
            let mut prefix = String::new();
            if self.config.summary {
                prefix.push_str(&self.config.summary_block());
            }
            if !self.config.header.is_empty() {
                prefix.push_str(&self.config.header);
                prefix.push('\n');
            }
            first.insert_str(0, &prefix);
        }

        if let Some(last) = output.last_mut() {
            if !self.config.footer.is_empty() {
                if !last.is_empty() && !last.ends_with('\n') {
                    last.push('\n');
                }
                last.push_str(&self.config.footer);
                last.push('\n');
            }
        }
    }
}

/// Annotate `layers` with a fresh [`Annotator`]
pub fn transform<S: AsRef<str>>(
    config: Configuration,
    layers: &[S],
) -> Result<Vec<String>, TransformError> {
    Annotator::new(config).process(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Settings, StateChangeSettings, StrategySettings, WordList};

    fn settings() -> Settings {
        Settings {
            header: String::new(),
            footer: String::new(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_untouched_lines_are_identical() {
        let mut annotator = Annotator::new(settings().compile().unwrap());
        for raw in ["M104 S200 ;heat\n", ";LAYER:0\r\n", "G1 X5 ;travel\n", "G28"] {
            assert_eq!(annotator.annotate_line(raw).unwrap(), raw);
        }
        assert_eq!(annotator.stats().annotated, 0);
        assert_eq!(annotator.stats().lines, 4);
    }

    #[test]
    fn test_retraction_layout() {
        let mut annotator = Annotator::new(settings().compile().unwrap());
        let out = annotator.annotate_line("G1 E-2 ;retract\n").unwrap();
        assert_eq!(
            out,
            "M62 P0 M62 P1 M62 P2 M62 P3 ;0b1111 = 0.0000mm/s out of max 75mm/s\n\
             G1 E-2 \n\
             G4 P0.0267 ;Robot Dwell - extrude -2mm at 75mm/s\n\
             ;retract\n"
        );
        assert_eq!(annotator.stats().toggles, 4);
        assert_eq!(annotator.stats().dwells, 1);
    }

    #[test]
    fn test_remove_extrusion_axis() {
        let settings = Settings {
            remove_extrusion_axis: true,
            diagnostics: false,
            ..settings()
        };
        let mut annotator = Annotator::new(settings.compile().unwrap());
        assert_eq!(
            annotator.annotate_line("G1 X1 E0 F60\n").unwrap(),
            "G1 X1 F60\n"
        );
    }

    #[test]
    fn test_header_footer_and_summary() {
        let settings = Settings {
            header: "M63 P0".to_string(),
            footer: "M63 P1".to_string(),
            summary: true,
            ..settings()
        };
        let out = transform(settings.compile().unwrap(), &["M104 S200\n", "M105"]).unwrap();

        assert!(out[0].starts_with(";GCode edited with gcode-extrude"));
        assert!(out[0].ends_with("M63 P0\nM104 S200\n"));
        assert_eq!(out[1], "M105\nM63 P1\n");
    }

    #[test]
    fn test_no_layers() {
        let layers: [&str; 0] = [];
        assert!(transform(settings().compile().unwrap(), &layers).unwrap().is_empty());
    }

    #[test]
    fn test_error_reports_layer_and_line() {
        let settings = Settings {
            command_codes: WordList::from("G1"),
            ..settings()
        };
        let err = transform(
            settings.compile().unwrap(),
            &["G1 X1 F60\n", "M82\nG1 X1Y2\n"],
        )
        .unwrap_err();

        assert_eq!(err.layer, 1);
        assert_eq!(err.line, 3);
        assert_eq!(err.text, "G1 X1Y2\n");
    }

    #[test]
    fn test_state_change_pipeline() {
        let settings = Settings {
            strategy: StrategySettings::StateChange(StateChangeSettings::default()),
            ..settings()
        };
        let out = transform(settings.compile().unwrap(), &["G1 X1 E1 F60\nG1 E-1\n"]).unwrap();
        assert_eq!(
            out[0],
            "M62 P2; Gantry Moving\n\
             M62 P1 M62 P0; Start Extruder\n\
             G1 X1 E1 F60\n\
             M63 P2; Gantry Stopped\n\
             M63 P1 M62 P0; Start Retracting\n\
             G4 P0.0667 ;Robot Dwell\n\
             G1 E-1\n"
        );
    }
}
