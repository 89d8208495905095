//! Configuration file — palette, transparency, and key rebindings.
//!
//! A small line-oriented format, parsed once before the session starts
//! (there is no live reload):
//!
//! ```text
//! # comment
//! palette.3      = #cdcd00
//! transparency   = #000000
//! bind.fill      = F
//! bind.quit      = Q
//! ```
//!
//! Errors carry the line number and abort startup — a half-applied config
//! would be worse than none, and the user can't see a warning once the
//! drawing session owns the screen.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;

use crate::color::Color;
use crate::command::{Action, Keymap};
use crate::state::EditorState;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Why the config could not be used.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(io::Error),
    /// A line could not be understood.
    Parse { line: usize, msg: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse { line, msg } => write!(f, "config line {line}: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse { .. } => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Parsed configuration, ready to apply to a fresh session.
#[derive(Debug, Default)]
pub struct Config {
    /// Palette slot overrides.
    pub palette: Vec<(u8, Color)>,
    /// Transparency color override.
    pub transparency: Option<Color>,
    /// Key rebindings.
    pub binds: Vec<(Action, u8)>,
}

impl Config {
    /// Apply palette and transparency overrides to the state and
    /// rebindings to the keymap.
    pub fn apply(&self, state: &mut EditorState, keymap: &mut Keymap) {
        for &(slot, color) in &self.palette {
            state.palette.set(slot, color);
        }
        if let Some(t) = self.transparency {
            state.transparency = t;
        }
        for &(action, key) in &self.binds {
            keymap.rebind(action, key);
        }
    }
}

/// Read and parse the config file at `path`.
///
/// # Errors
///
/// [`ConfigError::Io`] if the file can't be read, [`ConfigError::Parse`]
/// for the first malformed line.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    parse(&fs::read_to_string(path)?)
}

/// Parse config text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] with the 1-indexed line number of the
/// first directive that is malformed or unknown.
pub fn parse(text: &str) -> Result<Config, ConfigError> {
    // Startup-only: compiling these here keeps the module free of globals.
    let palette_re = Regex::new(r"^palette\.([0-9])\s*=\s*(\S+)$").expect("static regex");
    let transparency_re = Regex::new(r"^transparency\s*=\s*(\S+)$").expect("static regex");
    let bind_re = Regex::new(r"^bind\.([a-z0-9-]+)\s*=\s*(\S+)$").expect("static regex");

    let mut config = Config::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = idx + 1;

        if let Some(caps) = palette_re.captures(line) {
            let slot: u8 = caps[1].parse().expect("single digit");
            let color = parse_color(&caps[2], lineno)?;
            config.palette.push((slot, color));
        } else if let Some(caps) = transparency_re.captures(line) {
            config.transparency = Some(parse_color(&caps[1], lineno)?);
        } else if let Some(caps) = bind_re.captures(line) {
            let action = Action::from_name(&caps[1]).ok_or_else(|| ConfigError::Parse {
                line: lineno,
                msg: format!("unknown action `{}`", &caps[1]),
            })?;
            let key = &caps[2];
            if key.len() != 1 || !key.is_ascii() {
                return Err(ConfigError::Parse {
                    line: lineno,
                    msg: format!("binding for `{}` must be one ASCII character", &caps[1]),
                });
            }
            config.binds.push((action, key.as_bytes()[0]));
        } else {
            return Err(ConfigError::Parse {
                line: lineno,
                msg: format!("unrecognized directive `{line}`"),
            });
        }
    }

    Ok(config)
}

fn parse_color(s: &str, line: usize) -> Result<Color, ConfigError> {
    Color::from_hex(s).ok_or_else(|| ConfigError::Parse {
        line,
        msg: format!("`{s}` is not a #RRGGBB color"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PixelGrid;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_full_config() {
        let cfg = parse(
            "# px config\n\
             \n\
             palette.1 = #112233\n\
             transparency = #0a0b0c\n\
             bind.fill = F\n\
             bind.select-color-2 = @\n",
        )
        .unwrap();

        assert_eq!(cfg.palette, vec![(1, Color::new(0x11, 0x22, 0x33))]);
        assert_eq!(cfg.transparency, Some(Color::new(0x0a, 0x0b, 0x0c)));
        assert_eq!(
            cfg.binds,
            vec![(Action::Fill, b'F'), (Action::SelectColor(2), b'@')]
        );
    }

    #[test]
    fn empty_and_comment_lines_are_skipped() {
        let cfg = parse("\n\n# nothing here\n   \n").unwrap();
        assert!(cfg.palette.is_empty());
        assert!(cfg.binds.is_empty());
        assert_eq!(cfg.transparency, None);
    }

    #[test]
    fn bad_color_reports_its_line() {
        let err = parse("palette.1 = #112233\npalette.2 = red\n").unwrap_err();
        match err {
            ConfigError::Parse { line, .. } => assert_eq!(line, 2),
            ConfigError::Io(e) => panic!("unexpected io error: {e}"),
        }
    }

    #[test]
    fn unknown_action_is_an_error() {
        assert!(parse("bind.teleport = t\n").is_err());
    }

    #[test]
    fn multibyte_binding_is_an_error() {
        assert!(parse("bind.fill = é\n").is_err());
        assert!(parse("bind.fill = xy\n").is_err());
    }

    #[test]
    fn unrecognized_directive_is_an_error() {
        assert!(parse("palette.x = #112233\n").is_err());
        assert!(parse("colour = #112233\n").is_err());
    }

    #[test]
    fn apply_updates_state_and_keymap() {
        let cfg = parse(
            "palette.9 = #010203\n\
             transparency = #040506\n\
             bind.quit = Z\n",
        )
        .unwrap();

        let mut state = EditorState::new(PixelGrid::new(2, 2, Color::BLACK), Color::BLACK);
        let mut keymap = Keymap::default();
        cfg.apply(&mut state, &mut keymap);

        assert_eq!(state.palette.get(9), Some(Color::new(1, 2, 3)));
        assert_eq!(state.transparency, Color::new(4, 5, 6));
        assert_eq!(keymap.decode(b'Z'), Some(Action::Quit));
        assert_eq!(keymap.decode(b'q'), None);
    }
}
