//! Terminal mode flags
//!
//! Modes toggled by SM/RM and DECSET/DECRST that the front end consults
//! for rendering, key mapping, mouse reporting and paste.

use bitflags::bitflags;

bitflags! {
    /// Terminal mode flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TermMode: u32 {
        /// DECAWM auto-wrap
        const WRAP         = 1 << 0;
        /// IRM insert mode
        const INSERT       = 1 << 1;
        /// DECKPAM application keypad
        const APPKEYPAD    = 1 << 2;
        const ALTSCREEN    = 1 << 3;
        /// LNM: line feed also returns the carriage
        const CRLF         = 1 << 4;
        /// 1000: report button press and release
        const MOUSEBTN     = 1 << 5;
        /// 1002: report motion while a button is held
        const MOUSEMOTION  = 1 << 6;
        /// DECSCNM reverse video
        const REVERSE      = 1 << 7;
        /// KAM keyboard lock
        const KBDLOCK      = 1 << 8;
        /// DECTCEM reset: cursor hidden
        const HIDE         = 1 << 9;
        /// DECCKM application cursor keys
        const APPCURSOR    = 1 << 10;
        /// 1006: SGR mouse encoding
        const MOUSESGR     = 1 << 11;
        /// 1034: meta sets the eighth bit
        const EIGHT_BIT    = 1 << 12;
        /// 1004: focus in/out reports
        const FOCUS        = 1 << 13;
        /// 9: X10 compatibility, press only
        const MOUSEX10     = 1 << 14;
        /// 1003: report all motion
        const MOUSEMANY    = 1 << 15;
        /// 2004: bracketed paste
        const BRCKTPASTE   = 1 << 16;
        /// 1005: UTF-8 extended coordinates
        const MOUSEUTF8    = 1 << 17;
        /// DECOM origin mode
        const ORIGIN       = 1 << 18;

        const MOUSE = Self::MOUSEBTN.bits()
            | Self::MOUSEMOTION.bits()
            | Self::MOUSEX10.bits()
            | Self::MOUSEMANY.bits();
    }
}

impl TermMode {
    /// Modes in effect after power-on or RIS
    pub fn initial() -> Self {
        TermMode::WRAP
    }
}
