//! Escape sequence dispatch
//!
//! Applies the actions `vte` recognizes to the screen state.

use log::{debug, trace};
use vte::{Params, Perform};

use crate::cell::Attr;
use crate::color::Color;
use crate::mode::TermMode;
use crate::term::Screen;

/// First value of each parameter, with 0 standing in for missing ones
fn flat_params(params: &Params) -> Vec<u16> {
    params
        .iter()
        .map(|sub| sub.first().copied().unwrap_or(0))
        .collect()
}

/// Parameter `i`, or `default` when absent or zero
fn arg(args: &[u16], i: usize, default: usize) -> usize {
    match args.get(i) {
        Some(&v) if v != 0 => v as usize,
        _ => default,
    }
}

impl Perform for Screen {
    fn print(&mut self, c: char) {
        self.put_char(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x07 => trace!("BEL"),
            0x08 => self.move_relative(-1, 0),
            0x09 => self.tab(true, 1),
            0x0a..=0x0c => {
                let crlf = self.mode.contains(TermMode::CRLF);
                self.newline(crlf);
            }
            0x0d => {
                let row = self.cursor.row;
                self.move_to(0, row);
            }
            _ => trace!("Unhandled C0 control: {:#04x}", byte),
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        if ignore {
            debug!("CSI with too many parameters ignored");
            return;
        }
        let args = flat_params(params);
        let private = intermediates.first() == Some(&b'?');

        match (action, private) {
            ('@', false) => self.insert_blanks(arg(&args, 0, 1)),
            ('A', false) => self.move_relative(0, -(arg(&args, 0, 1) as isize)),
            ('B', false) | ('e', false) => self.move_relative(0, arg(&args, 0, 1) as isize),
            ('C', false) | ('a', false) => self.move_relative(arg(&args, 0, 1) as isize, 0),
            ('D', false) => self.move_relative(-(arg(&args, 0, 1) as isize), 0),
            ('E', false) => {
                let row = self.cursor.row + arg(&args, 0, 1);
                self.move_to(0, row);
            }
            ('F', false) => {
                let row = self.cursor.row.saturating_sub(arg(&args, 0, 1));
                self.move_to(0, row);
            }
            ('G', false) | ('`', false) => {
                let row = self.cursor.row;
                self.move_to(arg(&args, 0, 1) - 1, row);
            }
            ('H', false) | ('f', false) => {
                self.move_to_abs(arg(&args, 1, 1) - 1, arg(&args, 0, 1) - 1);
            }
            ('I', false) => self.tab(true, arg(&args, 0, 1)),
            ('Z', false) => self.tab(false, arg(&args, 0, 1)),
            ('J', _) => self.erase_display(args.first().copied().unwrap_or(0)),
            ('K', _) => self.erase_line(args.first().copied().unwrap_or(0)),
            ('L', false) => self.insert_lines(arg(&args, 0, 1)),
            ('M', false) => self.delete_lines(arg(&args, 0, 1)),
            ('P', false) => self.delete_chars(arg(&args, 0, 1)),
            ('X', false) => self.erase_chars(arg(&args, 0, 1)),
            ('S', false) => self.scroll_region_up(arg(&args, 0, 1)),
            ('T', false) => self.scroll_region_down(arg(&args, 0, 1)),
            ('d', false) => {
                let col = self.cursor.col;
                self.move_to_abs(col, arg(&args, 0, 1) - 1);
            }
            ('g', false) => match args.first().copied().unwrap_or(0) {
                0 => self.set_tab(false),
                3 => self.clear_all_tabs(),
                other => debug!("Unknown TBC mode: {}", other),
            },
            ('h', _) => self.set_modes(&args, private, true),
            ('l', _) => self.set_modes(&args, private, false),
            ('m', false) => self.sgr(params),
            ('n', false) => match args.first().copied().unwrap_or(0) {
                5 => self.respond(b"\x1b[0n"),
                6 => {
                    let reply = format!("\x1b[{};{}R", self.cursor.row + 1, self.cursor.col + 1);
                    self.respond(reply.as_bytes());
                }
                other => debug!("Unknown DSR: {}", other),
            },
            ('c', false) if args.first().copied().unwrap_or(0) == 0 => {
                self.respond(b"\x1b[?6c");
            }
            ('r', false) => {
                let top = arg(&args, 0, 1) - 1;
                let bot = arg(&args, 1, self.rows()) - 1;
                self.set_scroll_region(top, bot);
            }
            ('s', false) => self.save_cursor(),
            ('u', false) => self.restore_cursor(),
            _ => debug!(
                "Unhandled CSI: {:?} {:?} {}",
                args,
                String::from_utf8_lossy(intermediates),
                action
            ),
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if !intermediates.is_empty() {
            trace!("Ignoring charset designation {:?}", intermediates);
            return;
        }
        match byte {
            b'7' => self.save_cursor(),
            b'8' => self.restore_cursor(),
            b'D' => self.newline(false),
            b'E' => self.newline(true),
            b'H' => self.set_tab(true),
            b'M' => self.reverse_index(),
            b'c' => self.reset(),
            b'=' => self.mode.insert(TermMode::APPKEYPAD),
            b'>' => self.mode.remove(TermMode::APPKEYPAD),
            _ => debug!("Unhandled ESC {}", byte as char),
        }
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        match params {
            [b"0", title, ..] | [b"2", title, ..] => {
                self.title = Some(String::from_utf8_lossy(title).into_owned());
            }
            _ => trace!("Unhandled OSC with {} params", params.len()),
        }
    }
}

impl Screen {
    fn set_modes(&mut self, args: &[u16], private: bool, on: bool) {
        for &mode in args {
            if !private {
                match mode {
                    2 => self.mode.set(TermMode::KBDLOCK, on),
                    4 => self.mode.set(TermMode::INSERT, on),
                    20 => self.mode.set(TermMode::CRLF, on),
                    _ => debug!("Unknown ANSI mode: {}", mode),
                }
                continue;
            }
            match mode {
                1 => self.mode.set(TermMode::APPCURSOR, on),
                5 => self.set_reverse(on),
                6 => {
                    self.mode.set(TermMode::ORIGIN, on);
                    self.move_to_abs(0, 0);
                }
                7 => self.mode.set(TermMode::WRAP, on),
                25 => self.mode.set(TermMode::HIDE, !on),
                9 => self.set_mouse(TermMode::MOUSEX10, on),
                1000 => self.set_mouse(TermMode::MOUSEBTN, on),
                1002 => self.set_mouse(TermMode::MOUSEMOTION, on),
                1003 => self.set_mouse(TermMode::MOUSEMANY, on),
                1004 => self.mode.set(TermMode::FOCUS, on),
                1005 => self.mode.set(TermMode::MOUSEUTF8, on),
                1006 => self.mode.set(TermMode::MOUSESGR, on),
                1034 => self.mode.set(TermMode::EIGHT_BIT, on),
                2004 => self.mode.set(TermMode::BRCKTPASTE, on),
                47 | 1047 => self.set_alt_screen(on, false, mode == 1047),
                1048 => {
                    if on {
                        self.save_cursor();
                    } else {
                        self.restore_cursor();
                    }
                }
                1049 => self.set_alt_screen(on, true, true),
                12 => trace!("Ignoring cursor blink mode"),
                _ => debug!("Unknown DEC private mode: {}", mode),
            }
        }
    }

    /// Mouse tracking modes are mutually exclusive
    fn set_mouse(&mut self, which: TermMode, on: bool) {
        self.mode.remove(TermMode::MOUSE);
        self.mode.set(which, on);
    }

    fn sgr(&mut self, params: &Params) {
        let groups: Vec<&[u16]> = params.iter().collect();
        if groups.is_empty() {
            self.reset_sgr();
            return;
        }

        let mut i = 0;
        while i < groups.len() {
            let group = groups[i];
            let param = group.first().copied().unwrap_or(0);
            let template = &mut self.cursor.template;

            match param {
                0 => self.reset_sgr(),
                1 => template.attr.insert(Attr::BOLD),
                2 => template.attr.insert(Attr::FAINT),
                3 => template.attr.insert(Attr::ITALIC),
                4 => {
                    // 4:0 turns underline off
                    if group.get(1) == Some(&0) {
                        template.attr.remove(Attr::UNDERLINE);
                    } else {
                        template.attr.insert(Attr::UNDERLINE);
                    }
                }
                5 | 6 => template.attr.insert(Attr::BLINK),
                7 => template.attr.insert(Attr::REVERSE),
                8 => template.attr.insert(Attr::INVISIBLE),
                9 => template.attr.insert(Attr::STRUCK),
                22 => template.attr.remove(Attr::BOLD_FAINT),
                23 => template.attr.remove(Attr::ITALIC),
                24 => template.attr.remove(Attr::UNDERLINE),
                25 => template.attr.remove(Attr::BLINK),
                27 => template.attr.remove(Attr::REVERSE),
                28 => template.attr.remove(Attr::INVISIBLE),
                29 => template.attr.remove(Attr::STRUCK),
                30..=37 => template.fg = Color::Indexed((param - 30) as u8),
                39 => template.fg = Color::Default,
                40..=47 => template.bg = Color::Indexed((param - 40) as u8),
                49 => template.bg = Color::Default,
                90..=97 => template.fg = Color::Indexed((param - 90 + 8) as u8),
                100..=107 => template.bg = Color::Indexed((param - 100 + 8) as u8),
                38 | 48 => {
                    let color = if group.len() > 1 {
                        extended_color(&group[1..])
                    } else {
                        let rest: Vec<u16> = groups[i + 1..]
                            .iter()
                            .map(|g| g.first().copied().unwrap_or(0))
                            .collect();
                        let used = match rest.first() {
                            Some(5) => 2,
                            Some(2) => 4,
                            _ => 0,
                        };
                        let used = used.min(rest.len());
                        i += used;
                        extended_color(&rest[..used])
                    };
                    if let Some(color) = color {
                        if param == 38 {
                            self.cursor.template.fg = color;
                        } else {
                            self.cursor.template.bg = color;
                        }
                    }
                }
                _ => trace!("Unknown SGR parameter: {}", param),
            }
            i += 1;
        }
    }

    fn reset_sgr(&mut self) {
        let template = &mut self.cursor.template;
        template.attr = Attr::empty();
        template.fg = Color::Default;
        template.bg = Color::Default;
    }
}

/// Parse `5;n` or `2;r;g;b` (colon forms may carry an empty color space id)
fn extended_color(args: &[u16]) -> Option<Color> {
    match args {
        [5, index, ..] => Some(Color::Indexed((*index).min(255) as u8)),
        [2, r, g, b, ..] if args.len() == 4 => {
            Some(Color::Rgb(*r as u8, *g as u8, *b as u8))
        }
        [2, _, r, g, b, ..] => Some(Color::Rgb(*r as u8, *g as u8, *b as u8)),
        _ => {
            debug!("Malformed extended color: {:?}", args);
            None
        }
    }
}
