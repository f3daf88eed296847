//! End-to-end render pipeline tests: full-frame replay, differential
//! rendering, and output minimality.

use sumi_core::Engine;

fn utf8(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("render output is UTF-8")
}

#[test]
fn test_render_replay_is_identical() {
    let mut engine = Engine::new(24, 5);
    engine.write(b"plain \x1b[1;31mbold red\x1b[0m\n");
    engine.write("wide: \u{4e16}\u{754c}\n".as_bytes());
    engine.write(b"\x1b[48;5;22mgreen bg\x1b[0m tail");

    let first = engine.render();
    let mut replay = Engine::new(24, 5);
    replay.write(&first);
    let second = replay.render();

    assert_eq!(first, second);
}

#[test]
fn test_render_replay_after_heavy_editing() {
    let mut engine = Engine::new(16, 4);
    engine.write(b"one\ntwo\nthree\nfour\nfive");
    engine.write(b"\x1b[2;1H\x1b[L\x1b[38;2;9;8;7medit\x1b[0m");
    engine.write(b"\x1b[1;16H!\x1b[2K");

    let first = engine.render();
    let mut replay = Engine::new(16, 4);
    replay.write(&first);

    assert_eq!(first, replay.render());
}

#[test]
fn test_render_since_current_seq_is_empty() {
    let mut engine = Engine::new(20, 4);
    engine.write(b"a\nb\nc");
    let seq = engine.current_seq();
    assert!(engine.render_since(seq).is_empty());
}

#[test]
fn test_render_since_after_render_is_empty() {
    let mut engine = Engine::new(20, 4);
    engine.write(b"content");
    engine.render();
    assert!(engine.render_since(engine.last_rendered_seq()).is_empty());
}

#[test]
fn test_differential_update_scenario() {
    let mut engine = Engine::new(20, 5);
    engine.write(b"line1\nline2\nline3");
    engine.render();
    let checkpoint = engine.last_rendered_seq();

    engine.write(b"\x1b[2;1Hline2b");
    let out = utf8(engine.render_since(checkpoint));

    assert!(out.contains("\x1b[2;1H"));
    assert!(out.contains("line2b"));
    assert!(out.contains("\x1b[K"));
    assert!(!out.contains("line1"));
    assert!(!out.contains("line3"));
}

#[test]
fn test_style_not_reemitted_within_run() {
    let mut engine = Engine::new(10, 1);
    engine.write(b"\x1b[31mA\x1b[31mB");
    let out = utf8(engine.render());
    assert_eq!(out.matches("31").count(), 1);
    assert!(out.contains("AB"));
}

#[test]
fn test_full_frame_has_no_absolute_addressing() {
    let mut engine = Engine::new(8, 3);
    engine.write(b"x\ny\nz");
    let out = utf8(engine.render());
    assert!(out.starts_with("\x1b7"));
    assert!(!out.contains('\r'));
    assert!(!out.contains('\n'));
    assert!(!out.contains(";1H"));
    assert_eq!(out.matches("\x1b8").count(), 3);
}

#[test]
fn test_diff_render_then_swap_reaches_steady_state() {
    let mut engine = Engine::new(12, 3);
    engine.write(b"frame one");

    let mut buf = engine.snapshot();
    assert!(!buf.diff_render(0, 0).is_empty());
    buf.swap_buffers();
    buf.capture(&engine);
    assert!(buf.diff_render(0, 0).is_empty());

    engine.write(b"\x1b[1;7Htwo");
    buf.swap_buffers();
    buf.capture(&engine);
    let out = utf8(buf.diff_render(0, 0));
    assert!(out.contains("two"));
    assert!(!out.contains("frame"));
}

#[test]
fn test_diff_render_offsets_compose() {
    let mut engine = Engine::new(6, 2);
    engine.write(b"panel");
    let buf = engine.snapshot();

    let out = utf8(buf.diff_render(3, 4));
    // Row 0 of the panel lands on terminal row 4, column 5.
    assert!(out.starts_with("\x1b[4;5H"));
    assert!(out.contains("panel"));
}

#[test]
fn test_render_since_composes_with_writes_between() {
    let mut engine = Engine::new(10, 3);
    engine.write(b"a\nb\nc");
    engine.render();
    let first_checkpoint = engine.last_rendered_seq();

    engine.write(b"\x1b[1;1HA");
    engine.render_since(first_checkpoint);
    let second_checkpoint = engine.last_rendered_seq();

    engine.write(b"\x1b[3;1HC");
    let out = utf8(engine.render_since(second_checkpoint));
    assert!(out.contains('C'));
    assert!(!out.contains('A'));
}
