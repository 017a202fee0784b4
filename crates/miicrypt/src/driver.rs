//! Interactive control loop mapping console buttons to file pipelines.
//!
//! One pipeline per control, over a fixed set of filenames in the data
//! directory:
//!
//! | Control | Pipeline                                            |
//! |---------|-----------------------------------------------------|
//! | A       | unwrap `input.bin`  → `output.mii`                  |
//! | B       | wrap   `input.mii`  → `output.bin`                  |
//! | X       | unwrap `output.bin` → `check.mii`                   |
//! | Y       | wrap   `output.mii` → `check.bin`                   |
//! | L       | unwrap `input.bin` to a temp file, compare `check.mii` |
//! | R       | wrap   `input.mii` to a temp file, compare `check.bin` |
//! | Start   | terminate                                           |
//!
//! A failed pipeline prints one line and never stops the loop. Controls
//! pressed together run in the order above; Start is checked before any of
//! them.

use std::io::{self, Write as _};
use std::path::Path;

use common::profile::{PACKED_MII_LEN, UNPACKED_MII_LEN};
use common::MiiError;
use console::{Key, Term};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::compare::{compare_equal, Comparison};
use crate::gateway::WrapService;
use crate::transfer::{read_packed, read_unpacked, write_exact_file};

const INPUT_PACKED: &str = "input.bin";
const INPUT_UNPACKED: &str = "input.mii";
const OUTPUT_UNPACKED: &str = "output.mii";
const OUTPUT_PACKED: &str = "output.bin";
const CHECK_UNPACKED: &str = "check.mii";
const CHECK_PACKED: &str = "check.bin";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Set of controls newly pressed during one poll.
///
/// Bit positions follow the platform HID layout, so a set reads like the
/// controller's down-mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons(u16);

impl Buttons {
    /// No control pressed.
    pub const NONE: Buttons = Buttons(0);
    pub const A: Buttons = Buttons(1 << 0);
    pub const B: Buttons = Buttons(1 << 1);
    pub const START: Buttons = Buttons(1 << 3);
    pub const R: Buttons = Buttons(1 << 8);
    pub const L: Buttons = Buttons(1 << 9);
    pub const X: Buttons = Buttons(1 << 10);
    pub const Y: Buttons = Buttons(1 << 11);

    /// Whether every control in `other` is in this set.
    pub fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

/// Source of control edges for the driver loop.
///
/// A poll blocks until the next input edge; every control it reports counts
/// as newly pressed. Production input comes from [`TermInput`]; tests script
/// their own source.
pub trait InputSource {
    /// Block until something is pressed and return the set of controls.
    fn poll_pressed(&mut self) -> io::Result<Buttons>;
}

/// Terminal keys standing in for the console controls: `a`/`b`/`x`/`y`/
/// `l`/`r` for the face and shoulder buttons, Esc for Start.
pub struct TermInput {
    term: Term,
}

impl TermInput {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for TermInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for TermInput {
    fn poll_pressed(&mut self) -> io::Result<Buttons> {
        // One key event per poll; unmapped keys report an empty set and the
        // loop simply waits for the next edge.
        let key = self.term.read_key()?;
        Ok(match key {
            Key::Char('a') | Key::Char('A') => Buttons::A,
            Key::Char('b') | Key::Char('B') => Buttons::B,
            Key::Char('x') | Key::Char('X') => Buttons::X,
            Key::Char('y') | Key::Char('Y') => Buttons::Y,
            Key::Char('l') | Key::Char('L') => Buttons::L,
            Key::Char('r') | Key::Char('R') => Buttons::R,
            Key::Escape => Buttons::START,
            _ => Buttons::NONE,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// Decrypt one wrapped profile file into its unwrapped form.
pub fn decrypt_mii(
    svc: &mut dyn WrapService,
    input: &Path,
    output: &Path,
) -> Result<(), MiiError> {
    let packed = read_packed(input)?;
    let unpacked = svc.unwrap_mii(&packed)?;
    write_exact_file(output, unpacked.as_bytes())
}

/// Encrypt one unwrapped profile file into its wrapped form.
pub fn encrypt_mii(
    svc: &mut dyn WrapService,
    input: &Path,
    output: &Path,
) -> Result<(), MiiError> {
    let unpacked = read_unpacked(input)?;
    let packed = svc.wrap_mii(&unpacked)?;
    write_exact_file(output, packed.as_bytes())
}

/// Decrypt `input` to a temporary file and compare it against `reference`.
///
/// The temporary file lives in `dir` and is removed on every exit path,
/// error paths included.
pub fn verify_decrypt(
    svc: &mut dyn WrapService,
    dir: &Path,
    input: &Path,
    reference: &Path,
) -> Result<Comparison, MiiError> {
    let packed = read_packed(input)?;
    let unpacked = svc.unwrap_mii(&packed)?;

    let temp = NamedTempFile::new_in(dir).map_err(|source| MiiError::Io {
        path: dir.to_owned(),
        source,
    })?;
    write_exact_file(temp.path(), unpacked.as_bytes())?;
    compare_equal(temp.path(), reference, UNPACKED_MII_LEN)
}

/// Encrypt `input` to a temporary file and compare it against `reference`.
pub fn verify_encrypt(
    svc: &mut dyn WrapService,
    dir: &Path,
    input: &Path,
    reference: &Path,
) -> Result<Comparison, MiiError> {
    let unpacked = read_unpacked(input)?;
    let packed = svc.wrap_mii(&unpacked)?;

    let temp = NamedTempFile::new_in(dir).map_err(|source| MiiError::Io {
        path: dir.to_owned(),
        source,
    })?;
    write_exact_file(temp.path(), packed.as_bytes())?;
    compare_equal(temp.path(), reference, PACKED_MII_LEN)
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Run the interactive loop until Start is pressed.
///
/// Operator-facing lines (the menu and one result line per pipeline) go to
/// `out`; production passes locked stdout. Pipeline failures are printed and
/// swallowed — only an input or output failure ends the loop early.
pub fn run(
    svc: &mut dyn WrapService,
    input: &mut dyn InputSource,
    dir: &Path,
    out: &mut dyn io::Write,
) -> anyhow::Result<()> {
    print_menu(out)?;

    loop {
        let pressed = input.poll_pressed()?;
        if pressed.contains(Buttons::START) {
            debug!("start pressed, terminating");
            break;
        }

        if pressed.contains(Buttons::A) {
            let res = decrypt_mii(svc, &dir.join(INPUT_PACKED), &dir.join(OUTPUT_UNPACKED));
            writeln!(
                out,
                "{}",
                transform_line(res, INPUT_PACKED, "decrypted", OUTPUT_UNPACKED)
            )?;
        }
        if pressed.contains(Buttons::B) {
            let res = encrypt_mii(svc, &dir.join(INPUT_UNPACKED), &dir.join(OUTPUT_PACKED));
            writeln!(
                out,
                "{}",
                transform_line(res, INPUT_UNPACKED, "encrypted", OUTPUT_PACKED)
            )?;
        }
        if pressed.contains(Buttons::X) {
            let res = decrypt_mii(svc, &dir.join(OUTPUT_PACKED), &dir.join(CHECK_UNPACKED));
            writeln!(
                out,
                "{}",
                transform_line(res, OUTPUT_PACKED, "decrypted", CHECK_UNPACKED)
            )?;
        }
        if pressed.contains(Buttons::Y) {
            let res = encrypt_mii(svc, &dir.join(OUTPUT_UNPACKED), &dir.join(CHECK_PACKED));
            writeln!(
                out,
                "{}",
                transform_line(res, OUTPUT_UNPACKED, "encrypted", CHECK_PACKED)
            )?;
        }
        if pressed.contains(Buttons::L) {
            let res = verify_decrypt(svc, dir, &dir.join(INPUT_PACKED), &dir.join(CHECK_UNPACKED));
            writeln!(out, "{}", compare_line(res, INPUT_PACKED, CHECK_UNPACKED))?;
        }
        if pressed.contains(Buttons::R) {
            let res = verify_encrypt(svc, dir, &dir.join(INPUT_UNPACKED), &dir.join(CHECK_PACKED));
            writeln!(out, "{}", compare_line(res, INPUT_UNPACKED, CHECK_PACKED))?;
        }
    }
    Ok(())
}

fn print_menu(out: &mut dyn io::Write) -> io::Result<()> {
    writeln!(out, "          === miicrypt ===")?;
    writeln!(out, "A : input.bin  -> output.mii")?;
    writeln!(out, "B : input.mii  -> output.bin")?;
    writeln!(out, "X : output.bin -> check.mii")?;
    writeln!(out, "Y : output.mii -> check.bin")?;
    writeln!(out, "L : compare input.bin -> check.mii")?;
    writeln!(out, "R : compare input.mii -> check.bin")?;
    writeln!(out, "Press Start (Esc) to exit")
}

fn transform_line(res: Result<(), MiiError>, input: &str, verb: &str, output: &str) -> String {
    match res {
        Ok(()) => format!("SUCCESS: {input} {verb} to {output}."),
        Err(e) => error_line(&e),
    }
}

fn compare_line(res: Result<Comparison, MiiError>, input: &str, reference: &str) -> String {
    match res {
        Ok(Comparison::Equal) => format!("MATCH: {input} round-trips to {reference}."),
        Ok(Comparison::Different) => {
            format!("MISMATCH: {input} does not round-trip to {reference}.")
        }
        Err(e) => error_line(&e),
    }
}

fn error_line(e: &MiiError) -> String {
    debug!(code = e.exit_code(), "pipeline failed");
    format!("ERROR: {e}.")
}
