//! End-to-end annotation behaviour over whole layers
use external_extruder::error::{EvalError, LineError};
use external_extruder::settings::{BitExpressionSettings, StrategySettings, WordList};
use external_extruder::{transform, Annotator, Settings};

fn quiet_settings() -> Settings {
    Settings {
        header: String::new(),
        footer: String::new(),
        ..Settings::default()
    }
}

fn with_pins(pins: [&str; 4], dwell: bool) -> Settings {
    Settings {
        dwell,
        command_codes: WordList::from("G1"),
        strategy: StrategySettings::BitExpression(BitExpressionSettings {
            maximum_extrusion_rate: 75.0,
            pins: pins.map(str::to_string),
        }),
        ..quiet_settings()
    }
}

#[test]
fn test_rate_below_threshold_only_gets_diagnostic() {
    let settings = with_pins(
        ["extrusion_rate / maximum_extrusion_rate >= 8/14", "0", "0", "0"],
        false,
    );
    let out = transform(settings.compile().unwrap(), &["G1 X10 Y0 F600 E5\n"]).unwrap();

    assert_eq!(
        out,
        vec![";0b0000 = 5.0000mm/s out of max 75mm/s\nG1 X10 Y0 F600 E5\n"]
    );
}

#[test]
fn test_retraction_from_idle() {
    let out = transform(quiet_settings().compile().unwrap(), &["G1 E-2\n"]).unwrap();

    let lines: Vec<&str> = out[0].lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("M62 P0 M62 P1 M62 P2 M62 P3"));
    assert_eq!(lines[1], "G1 E-2");
    assert!(lines[2].starts_with("G4 P0.0267 "));
}

#[test]
fn test_untouched_lines_round_trip() {
    let layer = ";LAYER:0\r\nM104 S200 ; set temp\nG28 ;home\nT0\n\n;TYPE:WALL-OUTER";
    let settings = Settings {
        command_codes: WordList::from("G1"),
        ..quiet_settings()
    };
    let out = transform(settings.compile().unwrap(), &[layer]).unwrap();
    assert_eq!(out, vec![layer]);
}

#[test]
fn test_comment_follows_injected_instructions() {
    let out = transform(
        quiet_settings().compile().unwrap(),
        &["G1 E-1 ;retract now\n"],
    )
    .unwrap();

    let lines: Vec<&str> = out[0].lines().collect();
    assert_eq!(lines.last(), Some(&";retract now"));
    assert!(lines[..lines.len() - 1].iter().all(|line| !line.contains("retract now")));
}

#[test]
fn test_constant_rate_toggles_only_once() {
    let settings = Settings {
        diagnostics: false,
        ..quiet_settings()
    };
    // 1 mm over 1 s at F600 (10 mm/s over 10 mm)
    let layer = "G1 F600\nG1 X10 E1\nG1 X20 E1\nG1 X30 E1\n";
    let mut annotator = Annotator::new(settings.compile().unwrap());
    let out = annotator.process(&[layer]).unwrap();

    // 1 / 75 * 14 rounds to 0, so nothing toggles at all
    assert_eq!(out[0], layer);

    let faster = "G1 F600\nG1 X10 E40\nG1 X20 E40\nG1 X30 E40\n";
    let mut annotator = Annotator::new(settings.compile().unwrap());
    let out = annotator.process(&[faster]).unwrap();
    // 40 / 75 * 14 = 7.47 -> 7 (0b0111)
    assert_eq!(
        out[0],
        "G1 F600\nM62 P0 M62 P1 M62 P2\nG1 X10 E40\nG1 X20 E40\nG1 X30 E40\n"
    );
    assert_eq!(annotator.stats().toggles, 3);
    assert_eq!(annotator.stats().annotated, 1);
}

#[test]
fn test_absolute_extrusion_across_layers() {
    let settings = Settings {
        diagnostics: false,
        dwell: false,
        ..quiet_settings()
    };
    let layers = [
        "M82\nG1 F600\nG1 X10 E40\n",
        "G1 X20 E40\nG92 E0\nG1 X30 E-1\n",
    ];
    let out = transform(settings.compile().unwrap(), &layers).unwrap();

    assert_eq!(out[0], "M82\nG1 F600\nM62 P0 M62 P1 M62 P2\nG1 X10 E40\n");
    // E40 again in absolute mode is no extrusion; after G92 the retraction is -1
    assert_eq!(
        out[1],
        "M63 P0 M63 P1 M63 P2\nG1 X20 E40\nG92 E0\nM62 P0 M62 P1 M62 P2 M62 P3\nG1 X30 E-1\n"
    );
}

#[test]
fn test_header_and_footer_placement() {
    let settings = Settings {
        header: "M63 P0 ;header".to_string(),
        footer: "M63 P0 ;footer".to_string(),
        ..Settings::default()
    };
    let out = transform(
        settings.compile().unwrap(),
        &["M104 S200\n", "M105\n", "M106\n"],
    )
    .unwrap();

    assert_eq!(out[0], "M63 P0 ;header\nM104 S200\n");
    assert_eq!(out[1], "M105\n");
    assert_eq!(out[2], "M106\nM63 P0 ;footer\n");
}

#[test]
fn test_zero_feed_rate_aborts_with_location() {
    let err = transform(
        quiet_settings().compile().unwrap(),
        &[";LAYER:0\n", "G1 X0\nG1 X10 E1\n"],
    )
    .unwrap_err();

    assert_eq!(err.layer, 1);
    assert_eq!(err.line, 3);
    assert_eq!(err.text, "G1 X10 E1\n");
    assert!(err.to_string().contains("zero feed rate"));
}

#[test]
fn test_expression_failure_mid_run_aborts_with_location() {
    let settings = with_pins(["1 / (extrusion_rate - 10) > 0", "0", "0", "0"], false);
    let layers = [";LAYER:0\nG1 F600\nG1 X10 E5\n", ";LAYER:1\nG1 X20 E10\n"];

    let err = transform(settings.compile().unwrap(), &layers).unwrap_err();

    // 10 mm over 10 mm at 10 mm/s hits the pole of the first pin
    assert_eq!(err.layer, 1);
    assert_eq!(err.line, 5);
    assert_eq!(err.text, "G1 X20 E10\n");
    assert!(matches!(
        err.source,
        LineError::Evaluation {
            source: EvalError::DivisionByZero,
            ..
        }
    ));
}

#[test]
fn test_g92_zeroes_absolute_extruder_position() {
    let settings = Settings {
        dwell: false,
        diagnostics: false,
        ..quiet_settings()
    };
    let layer = "M82\nG1 F600\nG92 E5\nG1 X10 E5\n";
    let out = transform(settings.compile().unwrap(), &[layer]).unwrap();

    // E counts from 0 after the reset: 5 mm at 5 mm/s, 5 / 75 * 14 rounds to 1
    assert_eq!(out, vec!["M82\nG1 F600\nG92 E5\nM62 P0\nG1 X10 E5\n"]);
}

#[test]
fn test_eligibility_uses_the_command_token() {
    let settings = Settings {
        command_codes: WordList::from("G2"),
        ..quiet_settings()
    };
    // G28 must not be treated as G2
    let out = transform(settings.compile().unwrap(), &["G28 E-1\n"]).unwrap();
    assert_eq!(out, vec!["G28 E-1\n"]);
}
