/*!
Static US-layout keycode table.

Maps characters to ANSI virtual keycodes plus the shift flag needed to
produce them. Characters outside the table fall back to Unicode-payload
keyboard events.
*/

/// One key press: virtual keycode plus whether shift must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
  pub keycode: u16,
  pub shift: bool,
}

const fn plain(keycode: u16) -> Option<KeyStroke> {
  Some(KeyStroke {
    keycode,
    shift: false,
  })
}

const fn shifted(keycode: u16) -> Option<KeyStroke> {
  Some(KeyStroke {
    keycode,
    shift: true,
  })
}

/// Look up the keystroke producing `c` on a US layout.
///
/// Covers letters, digits, ASCII punctuation, and the common shifted
/// symbols. Returns `None` for everything else.
pub fn keystroke_for_char(c: char) -> Option<KeyStroke> {
  match c {
    // Letters (ANSI keycodes are not alphabetical).
    'a' => plain(0),
    'b' => plain(11),
    'c' => plain(8),
    'd' => plain(2),
    'e' => plain(14),
    'f' => plain(3),
    'g' => plain(5),
    'h' => plain(4),
    'i' => plain(34),
    'j' => plain(38),
    'k' => plain(40),
    'l' => plain(37),
    'm' => plain(46),
    'n' => plain(45),
    'o' => plain(31),
    'p' => plain(35),
    'q' => plain(12),
    'r' => plain(15),
    's' => plain(1),
    't' => plain(17),
    'u' => plain(32),
    'v' => plain(9),
    'w' => plain(13),
    'x' => plain(7),
    'y' => plain(16),
    'z' => plain(6),

    'A'..='Z' => {
      let lower = c.to_ascii_lowercase();
      keystroke_for_char(lower).map(|k| KeyStroke {
        keycode: k.keycode,
        shift: true,
      })
    }

    // Digits.
    '1' => plain(18),
    '2' => plain(19),
    '3' => plain(20),
    '4' => plain(21),
    '5' => plain(23),
    '6' => plain(22),
    '7' => plain(26),
    '8' => plain(28),
    '9' => plain(25),
    '0' => plain(29),

    // Unshifted punctuation.
    '-' => plain(27),
    '=' => plain(24),
    '[' => plain(33),
    ']' => plain(30),
    '\\' => plain(42),
    ';' => plain(41),
    '\'' => plain(39),
    ',' => plain(43),
    '.' => plain(47),
    '/' => plain(44),
    '`' => plain(50),
    ' ' => plain(49),
    '\n' => plain(36), // return
    '\t' => plain(48), // tab

    // Shifted symbols.
    '!' => shifted(18),
    '@' => shifted(19),
    '#' => shifted(20),
    '$' => shifted(21),
    '%' => shifted(23),
    '^' => shifted(22),
    '&' => shifted(26),
    '*' => shifted(28),
    '(' => shifted(25),
    ')' => shifted(29),
    '_' => shifted(27),
    '+' => shifted(24),
    '{' => shifted(33),
    '}' => shifted(30),
    '|' => shifted(42),
    ':' => shifted(41),
    '"' => shifted(39),
    '<' => shifted(43),
    '>' => shifted(47),
    '?' => shifted(44),
    '~' => shifted(50),

    _ => None,
  }
}
