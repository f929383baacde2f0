//! Special options (`<HELP>`, `<DSN>`, `<INTEGER>`, ...) and the small
//! helpers that go with them: command name, version name, help output.

use std::io::{self, Write};

use crate::extract::{self, parse_double, parse_int, Ctx, Extracted, Number};
use crate::mode::Mode;
use crate::spec::{ArgType, MetaKind, Target};
use crate::table::OptionSpec;

const PRODUCT_NAME: &str = "TimesTen";
const RELEASE: [u32; 5] = [18, 1, 1, 1, 0];

/// Placeholder replaced by the command name in help text.
pub const HELP_CMD: &str = "<CMD>";

/// Product version string, e.g. `TimesTen Release 18.1.1.1.0`.
pub fn version_name() -> String {
    let [a, b, c, d, e] = RELEASE;
    format!("{} Release {}.{}.{}.{}.{}", PRODUCT_NAME, a, b, c, d, e)
}

/// Command name from `argv[0]`: the basename, without a leading `_` and
/// without a trailing `Cmd` (`.exe` on Windows), compared ignoring case.
pub fn command_name(argv0: &str) -> String {
    let base = if cfg!(windows) {
        argv0.rsplit(|c| c == '\\' || c == '/').next()
    } else {
        argv0.rsplit('/').next()
    }
    .unwrap_or(argv0);
    let base = base.strip_prefix('_').unwrap_or(base);

    let trailer = if cfg!(windows) { ".exe" } else { "Cmd" };
    let len = base.len();
    if len > trailer.len() && base.is_char_boundary(len - trailer.len()) {
        let (stem, tail) = base.split_at(len - trailer.len());
        if tail.eq_ignore_ascii_case(trailer) {
            return stem.to_string();
        }
    }
    base.to_string()
}

/// Write `msg` with every `<CMD>` replaced by `cmd`. No newline is added.
pub fn dump_help<W: Write>(out: &mut W, cmd: &str, msg: &str) -> io::Result<()> {
    let mut rest = msg;
    while let Some(pos) = rest.find(HELP_CMD) {
        out.write_all(rest[..pos].as_bytes())?;
        out.write_all(cmd.as_bytes())?;
        rest = &rest[pos + HELP_CMD.len()..];
    }
    out.write_all(rest.as_bytes())
}

/// Try the special option `spec` against the typed name `opt`.
///
/// `None` means it does not apply. `token` is the whole argument, used in
/// messages for `-dsn` / `-connstr`.
pub(crate) fn check_special(
    spec: &mut OptionSpec,
    opt: &str,
    token: &str,
    args: &[&str],
    idx: &mut usize,
    ctx: &mut Ctx,
) -> Option<Extracted> {
    let ArgType::Meta(kind) = spec.kind else {
        return None;
    };
    let is_help = opt == "?" || ctx.names_equal(opt, "h") || ctx.names_equal(opt, "help");
    let is_version = opt == "V" || ctx.names_equal(opt, "version");

    match kind {
        MetaKind::Integer => {
            let n = parse_int(opt).ok()?;
            Number::Int(n).store(&mut spec.target);
            Some(Ok(()))
        }
        MetaKind::Real => {
            let n = parse_double(opt).ok()?;
            Number::Double(n).store(&mut spec.target);
            Some(Ok(()))
        }
        MetaKind::Help if is_help => {
            let text = match spec.target {
                Target::Text(text) => text,
                _ => "",
            };
            let mut out = io::stdout().lock();
            let written = dump_help(&mut out, ctx.cmd, text).and_then(|()| out.flush());
            Some(finish_info(written, ctx))
        }
        MetaKind::Version if is_version => {
            let line = match spec.target {
                Target::Text(text) => text.to_string(),
                _ => version_name(),
            };
            let mut out = io::stdout().lock();
            let written = writeln!(out, "{}", line).and_then(|()| out.flush());
            Some(finish_info(written, ctx))
        }
        MetaKind::HelpFunc | MetaKind::VersFunc
            if (kind == MetaKind::HelpFunc && is_help)
                || (kind == MetaKind::VersFunc && is_version) =>
        {
            if let Target::Action(f) = &mut spec.target {
                (**f)();
            }
            Some(Ok(()))
        }
        MetaKind::Dsn if ctx.names_equal(opt, "dsn") => {
            Some(connection(spec, token, args, idx, ctx, MetaKind::Dsn))
        }
        MetaKind::Connstr
            if ctx.names_equal(opt, "connstr") || opt == "connstr" || opt == "connStr" =>
        {
            Some(connection(spec, token, args, idx, ctx, MetaKind::Connstr))
        }
        _ => None,
    }
}

/// After help or version output: exit the process unless `NO_EXIT`.
fn finish_info(written: io::Result<()>, ctx: &mut Ctx) -> Extracted {
    if let Err(e) = written {
        return Err(ctx.fail(format_args!("cannot write to stdout: {}", e)));
    }
    if !ctx.mode.contains(Mode::NO_EXIT) {
        tracing::debug!("informational option given, exiting");
        let _ = io::stderr().flush();
        std::process::exit(0);
    }
    Ok(())
}

fn connection(
    spec: &mut OptionSpec,
    token: &str,
    args: &[&str],
    idx: &mut usize,
    ctx: &mut Ctx,
    kind: MetaKind,
) -> Extracted {
    if ctx.got_dsn || ctx.got_connstr {
        return Err(ctx.fail(format_args!(
            "option {}: a DSN or connection string was already given",
            token
        )));
    }
    extract::copy_string(spec, token, args, idx, None, ctx)?;
    match kind {
        MetaKind::Dsn => ctx.got_dsn = true,
        _ => ctx.got_connstr = true,
    }
    Ok(())
}
