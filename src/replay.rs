// ============================================================================
// REPLAY - line-oriented input scripts driving a PaintApp headlessly
// ============================================================================
//
//   tool brush            size 8           opacity 0.5
//   color 255,0,0         background 0,0,0,0
//   font DejaVu Sans      bold on          italic off
//   cap square            glyph ★
//   down 10 10            move 40 40       up 40 40
//   down 5 5 secondary
//   type hi\nbye          key commit       key undo
//   clear                 # comment

use crate::app::{InputEvent, KeyAction, PaintApp};
use crate::canvas::Color;
use crate::components::tools::{PointerButton, Tool, parse_color};
use crate::error::{PaintError, PaintResult};
use crate::log_info;
use crate::ops::shapes::CapStyle;

/// One parsed script line.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptCommand {
    Tool(Tool),
    Size(u32),
    Opacity(f32),
    Foreground(Color),
    Background(Color),
    Font(String),
    Bold(bool),
    Italic(bool),
    Cap(CapStyle),
    Glyph(char),
    Input(InputEvent),
    /// Typed into the open text overlay, one key per character.
    Type(String),
    Clear,
}

/// Parse a whole script.  Errors name the 1-based line.
pub fn parse_script(source: &str) -> PaintResult<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        commands.push(parse_line(line).map_err(|msg| PaintError::script(line_no, msg))?);
    }
    Ok(commands)
}

fn parse_line(line: &str) -> Result<ScriptCommand, String> {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let cmd = match word.to_ascii_lowercase().as_str() {
        "tool" => ScriptCommand::Tool(Tool::from_name(rest).ok_or_else(|| format!("unknown tool '{}'", rest))?),
        "size" => ScriptCommand::Size(parse_num(rest, "size")?),
        "opacity" => ScriptCommand::Opacity(parse_num(rest, "opacity")?),
        "color" | "colour" | "foreground" => ScriptCommand::Foreground(color_arg(rest)?),
        "background" => ScriptCommand::Background(color_arg(rest)?),
        "font" => {
            if rest.is_empty() {
                return Err("font needs a family name".to_string());
            }
            ScriptCommand::Font(rest.to_string())
        }
        "bold" => ScriptCommand::Bold(switch_arg(rest)?),
        "italic" => ScriptCommand::Italic(switch_arg(rest)?),
        "cap" => ScriptCommand::Cap(CapStyle::from_name(rest).ok_or_else(|| format!("unknown cap style '{}'", rest))?),
        "glyph" => ScriptCommand::Glyph(rest.chars().next().ok_or("glyph needs a character")?),
        "down" => {
            let (x, y) = point_args(&args)?;
            let button = match args.get(2).copied() {
                None | Some("primary") => PointerButton::Primary,
                Some("secondary") => PointerButton::Secondary,
                Some(other) => return Err(format!("unknown button '{}'", other)),
            };
            ScriptCommand::Input(InputEvent::PointerDown { x, y, button })
        }
        "move" => {
            let (x, y) = point_args(&args)?;
            ScriptCommand::Input(InputEvent::PointerMove { x, y })
        }
        "up" => {
            let (x, y) = point_args(&args)?;
            ScriptCommand::Input(InputEvent::PointerUp { x, y })
        }
        "type" => ScriptCommand::Type(unescape(rest)),
        "key" => {
            let action = match rest.to_ascii_lowercase().as_str() {
                "undo" => KeyAction::Undo,
                "commit" => KeyAction::CommitText,
                "newline" | "enter" => KeyAction::Newline,
                "backspace" => KeyAction::Backspace,
                "cancel" | "escape" => KeyAction::Cancel,
                other => return Err(format!("unknown key '{}'", other)),
            };
            ScriptCommand::Input(InputEvent::Key(action))
        }
        "clear" => ScriptCommand::Clear,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(cmd)
}

fn parse_num<T: std::str::FromStr>(s: &str, what: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("invalid {} '{}'", what, s))
}

fn color_arg(s: &str) -> Result<Color, String> {
    parse_color(s).ok_or_else(|| format!("invalid colour '{}' (expected r,g,b[,a])", s))
}

fn switch_arg(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(format!("expected on/off, got '{}'", s)),
    }
}

fn point_args(args: &[&str]) -> Result<(i32, i32), String> {
    match args {
        [x, y, ..] => Ok((parse_num(x, "x")?, parse_num(y, "y")?)),
        _ => Err("expected x and y".to_string()),
    }
}

/// `\n` → newline, `\\` → backslash; any other escape is kept verbatim.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Feed one command to `app`.
pub fn apply_command(app: &mut PaintApp, command: &ScriptCommand) {
    match command {
        ScriptCommand::Tool(tool) => app.set_tool(*tool),
        ScriptCommand::Size(size) => app.set_brush_size(*size),
        ScriptCommand::Opacity(opacity) => app.set_opacity(*opacity),
        ScriptCommand::Foreground(c) => app.set_foreground(*c),
        ScriptCommand::Background(c) => app.set_background(*c),
        ScriptCommand::Font(family) => app.set_font_family(family),
        ScriptCommand::Bold(on) => app.set_bold(*on),
        ScriptCommand::Italic(on) => app.set_italic(*on),
        ScriptCommand::Cap(cap) => app.set_line_cap(*cap),
        ScriptCommand::Glyph(ch) => app.set_stamp_glyph(*ch),
        ScriptCommand::Input(event) => app.handle(*event),
        ScriptCommand::Type(text) => {
            for ch in text.chars() {
                let action = if ch == '\n' {
                    KeyAction::Newline
                } else {
                    KeyAction::Char(ch)
                };
                app.handle(InputEvent::Key(action));
            }
        }
        ScriptCommand::Clear => app.clear(),
    }
}

/// Parse and run `source` against `app`, then finalize any open gesture.
/// Returns the number of commands applied.
pub fn run_script(app: &mut PaintApp, source: &str) -> PaintResult<usize> {
    let commands = parse_script(source)?;
    for command in &commands {
        apply_command(app, command);
    }
    app.finalize_pending();
    log_info!("Replayed {} command(s)", commands.len());
    Ok(commands.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn parses_every_command_form() {
        let cmds = parse_script(
            "# header\n\
             tool pencil\n\
             size 4\n\
             opacity 0.5\n\
             color 1,2,3\n\
             background 4,5,6,7\n\
             font DejaVu Sans Mono\n\
             bold on\n\
             italic off\n\
             cap flat\n\
             glyph *\n\
             down 1 2 secondary\n\
             move 3 4\n\
             up 5 6\n\
             type a b\\nc\n\
             key undo\n\
             \n\
             clear\n",
        )
        .unwrap();
        assert_eq!(
            cmds,
            vec![
                ScriptCommand::Tool(Tool::Pencil),
                ScriptCommand::Size(4),
                ScriptCommand::Opacity(0.5),
                ScriptCommand::Foreground(Rgba([1, 2, 3, 255])),
                ScriptCommand::Background(Rgba([4, 5, 6, 7])),
                ScriptCommand::Font("DejaVu Sans Mono".to_string()),
                ScriptCommand::Bold(true),
                ScriptCommand::Italic(false),
                ScriptCommand::Cap(CapStyle::Flat),
                ScriptCommand::Glyph('*'),
                ScriptCommand::Input(InputEvent::PointerDown {
                    x: 1,
                    y: 2,
                    button: PointerButton::Secondary
                }),
                ScriptCommand::Input(InputEvent::PointerMove { x: 3, y: 4 }),
                ScriptCommand::Input(InputEvent::PointerUp { x: 5, y: 6 }),
                ScriptCommand::Type("a b\nc".to_string()),
                ScriptCommand::Input(InputEvent::Key(KeyAction::Undo)),
                ScriptCommand::Clear,
            ]
        );
    }

    #[test]
    fn errors_carry_the_line_number() {
        let err = parse_script("size 3\n\ntool lasso\n").unwrap_err();
        assert_eq!(err.to_string(), "script line 3: unknown tool 'lasso'");

        let err = parse_script("down 4\n").unwrap_err();
        assert!(matches!(err, PaintError::Script { line: 1, .. }));
    }

    #[test]
    fn unescape_handles_backslashes() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r"a\\n"), "a\\n");
        assert_eq!(unescape(r"tab\t"), "tab\\t");
        assert_eq!(unescape("end\\"), "end\\");
    }
}
