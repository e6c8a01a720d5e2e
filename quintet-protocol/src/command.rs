//! Command lexer
//!
//! A line is matched against [`RULES`] in order and the first rule whose
//! verb prefix matches wins. Rules sharing a leading byte are listed
//! longest prefix first, so `FS1` is never read as `F` with a bad operand.
//!
//! Operands follow C `%d` conversion: leading whitespace is skipped, an
//! optional sign is accepted, at least one digit is required and anything
//! after the digits is ignored. Range checks are left to the caller.

/// A parsed command with raw operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `Tn` - switch to slot n
    Select(i32),
    /// `Ln` - select slot n and prime its filament
    Load(i32),
    /// `Mm` - driver mode (0 normal, 1 stealth)
    SetMode(i32),
    /// `Un` - unload the engaged filament (operand ignored)
    Unload(i32),
    /// `Xn` - reset the unit
    Reset(i32),
    /// `Pn` - read the filament sensor
    Probe(i32),
    /// `Sn` - liveness, version or build number
    Status(i32),
    /// `Fn m` - record the filament type of slot n
    SetFilamentType { index: i32, kind: i32 },
    /// `Cn` - continue loading (0) or cut the tip and retry (1)
    Continue(i32),
    /// `En` - eject the filament of slot n
    Eject(i32),
    /// `Rn` - recover after an eject
    Recover(i32),
    /// `FSn` - filament sensor event from the printer
    FsensorEvent(i32),
}

/// Number of operands a rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    /// Second operand reads as 0 when absent
    Two,
}

/// One entry of the ordered verb table
#[derive(Clone, Copy)]
pub struct Rule {
    /// Verb bytes the line must start with
    pub prefix: &'static [u8],
    /// Operands following the verb
    pub arity: Arity,
    build: fn(i32, i32) -> Command,
}

impl Rule {
    const fn new(prefix: &'static [u8], arity: Arity, build: fn(i32, i32) -> Command) -> Self {
        Self {
            prefix,
            arity,
            build,
        }
    }

    /// Try this rule against a line
    pub fn apply(&self, line: &[u8]) -> Option<Command> {
        let rest = line.strip_prefix(self.prefix)?;
        let (first, used) = parse_int(rest)?;
        let second = match self.arity {
            Arity::One => 0,
            Arity::Two => parse_int(&rest[used..]).map_or(0, |(value, _)| value),
        };
        Some((self.build)(first, second))
    }
}

/// Verb table, evaluated top to bottom
pub const RULES: [Rule; 12] = [
    Rule::new(b"FS", Arity::One, |n, _| Command::FsensorEvent(n)),
    Rule::new(b"T", Arity::One, |n, _| Command::Select(n)),
    Rule::new(b"L", Arity::One, |n, _| Command::Load(n)),
    Rule::new(b"M", Arity::One, |n, _| Command::SetMode(n)),
    Rule::new(b"U", Arity::One, |n, _| Command::Unload(n)),
    Rule::new(b"X", Arity::One, |n, _| Command::Reset(n)),
    Rule::new(b"P", Arity::One, |n, _| Command::Probe(n)),
    Rule::new(b"S", Arity::One, |n, _| Command::Status(n)),
    Rule::new(b"F", Arity::Two, |index, kind| Command::SetFilamentType { index, kind }),
    Rule::new(b"C", Arity::One, |n, _| Command::Continue(n)),
    Rule::new(b"E", Arity::One, |n, _| Command::Eject(n)),
    Rule::new(b"R", Arity::One, |n, _| Command::Recover(n)),
];

/// Parse a line into a command
///
/// Returns `None` when no rule matches.
pub fn parse(line: &[u8]) -> Option<Command> {
    RULES.iter().find_map(|rule| rule.apply(line))
}

/// Parse a decimal integer the way `%d` does
///
/// Returns the value and the number of bytes consumed.
fn parse_int(bytes: &[u8]) -> Option<(i32, usize)> {
    let mut pos = bytes
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C))
        .unwrap_or(bytes.len());

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits_start = pos;
    let mut value: i32 = 0;
    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        let digit = i32::from(b - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
        pos += 1;
    }

    if pos == digits_start {
        return None;
    }
    Some((value, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_operand_verbs() {
        assert_eq!(parse(b"T2"), Some(Command::Select(2)));
        assert_eq!(parse(b"L0"), Some(Command::Load(0)));
        assert_eq!(parse(b"M1"), Some(Command::SetMode(1)));
        assert_eq!(parse(b"U0"), Some(Command::Unload(0)));
        assert_eq!(parse(b"X0"), Some(Command::Reset(0)));
        assert_eq!(parse(b"P0"), Some(Command::Probe(0)));
        assert_eq!(parse(b"S1"), Some(Command::Status(1)));
        assert_eq!(parse(b"C1"), Some(Command::Continue(1)));
        assert_eq!(parse(b"E4"), Some(Command::Eject(4)));
        assert_eq!(parse(b"R0"), Some(Command::Recover(0)));
    }

    #[test]
    fn test_fsensor_wins_over_filament_type() {
        assert_eq!(parse(b"FS1"), Some(Command::FsensorEvent(1)));
        assert_eq!(parse(b"FS0"), Some(Command::FsensorEvent(0)));
        assert_eq!(
            parse(b"F2 1"),
            Some(Command::SetFilamentType { index: 2, kind: 1 })
        );
    }

    #[test]
    fn test_longer_prefixes_come_first() {
        for (i, earlier) in RULES.iter().enumerate() {
            for later in &RULES[i + 1..] {
                assert!(
                    !later.prefix.starts_with(earlier.prefix),
                    "a shorter verb shadows a longer one"
                );
            }
        }
    }

    #[test]
    fn test_missing_second_operand_reads_zero() {
        assert_eq!(
            parse(b"F3"),
            Some(Command::SetFilamentType { index: 3, kind: 0 })
        );
        assert_eq!(
            parse(b"F3 x"),
            Some(Command::SetFilamentType { index: 3, kind: 0 })
        );
    }

    #[test]
    fn test_operand_syntax() {
        assert_eq!(parse(b"T 3"), Some(Command::Select(3)));
        assert_eq!(parse(b"T-1"), Some(Command::Select(-1)));
        assert_eq!(parse(b"T+4"), Some(Command::Select(4)));
        assert_eq!(parse(b"T12abc"), Some(Command::Select(12)));
    }

    #[test]
    fn test_unparseable_lines() {
        assert_eq!(parse(b"T"), None);
        assert_eq!(parse(b"Tx"), None);
        assert_eq!(parse(b"T-"), None);
        assert_eq!(parse(b"t2"), None);
        assert_eq!(parse(b"Q0"), None);
        assert_eq!(parse(b" T2"), None);
        assert_eq!(parse(b"FSx"), None);
        assert_eq!(parse(b"T99999999999"), None);
    }

    proptest! {
        #[test]
        fn prop_select_operand_roundtrips(n in any::<i32>()) {
            let mut text: heapless::String<16> = heapless::String::new();
            core::fmt::Write::write_fmt(&mut text, format_args!("T{}", n)).unwrap();
            prop_assert_eq!(parse(text.as_bytes()), Some(Command::Select(n)));
        }

        #[test]
        fn prop_parse_never_panics(line in proptest::collection::vec(any::<u8>(), 0..31)) {
            let _ = parse(&line);
        }
    }
}
