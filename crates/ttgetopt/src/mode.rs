//! Parsing mode flags.

use bitflags::bitflags;

bitflags! {
    /// Behaviour switches for one parse call. Bit values match the
    /// historical `TTC_OPT_*` constants so masks stored elsewhere keep working.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mode: u32 {
        /// Options may be abbreviated to the point of uniqueness
        /// (`-num` matches `number=i` unless another option starts with `num`).
        const ABBREV = 1;
        /// Multi-character names are compared case-sensitively.
        /// Single-character names always are.
        const CASE_SENSITIVE = 2;
        /// Unknown options are skipped without an error.
        const IGNORE_UNKNOWNS = 4;
        /// `<HELP>` and `<VERSION>` print but do not exit the process.
        const NO_EXIT = 8;
        /// Every diagnostic is also echoed to stderr as it is produced.
        const PRINT_ERRS = 16;
        /// A registered `<DSN>`/`<CONNSTR>` may stay unresolved.
        const NO_CONNSTR_OK = 32;
        /// Array options may be given with no elements.
        const EMPTY_LIST_OK = 64;
        /// Do not fall back to `TT_CONNSTR` for an unresolved `<CONNSTR>`.
        const IGNORE_CONNSTR_ENV = 128;
    }
}
