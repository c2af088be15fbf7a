/*!
 * Signal Names
 * Case-insensitive symbolic-name resolution with platform-conditional synonyms
 */

use crate::types::{SignalError, SignalResult};
use nix::sys::signal::{SaFlags, Signal};
use std::sync::OnceLock;

/// Name table, sorted once at first use; binary-searched afterwards.
/// Synonyms map to the same kind; entries absent on the host platform are
/// compiled out rather than rejected at runtime.
fn signal_table() -> &'static [(&'static str, Signal)] {
    static TABLE: OnceLock<Vec<(&'static str, Signal)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = vec![
            ("abort", Signal::SIGABRT),
            ("abrt", Signal::SIGABRT),
            ("alarm", Signal::SIGALRM),
            ("alrm", Signal::SIGALRM),
            ("breakpoint", Signal::SIGTRAP),
            ("bus", Signal::SIGBUS),
            ("child", Signal::SIGCHLD),
            ("chld", Signal::SIGCHLD),
            ("cont", Signal::SIGCONT),
            ("continue", Signal::SIGCONT),
            ("cputime", Signal::SIGXCPU),
            ("filesize", Signal::SIGXFSZ),
            ("fpe", Signal::SIGFPE),
            ("hangup", Signal::SIGHUP),
            ("hup", Signal::SIGHUP),
            ("ill", Signal::SIGILL),
            ("illegal", Signal::SIGILL),
            ("int", Signal::SIGINT),
            ("interrupt", Signal::SIGINT),
            ("io", Signal::SIGIO),
            ("kill", Signal::SIGKILL),
            ("pipe", Signal::SIGPIPE),
            ("poll", Signal::SIGIO),
            ("prof", Signal::SIGPROF),
            ("profile", Signal::SIGPROF),
            ("quit", Signal::SIGQUIT),
            ("segv", Signal::SIGSEGV),
            ("stop", Signal::SIGSTOP),
            ("sys", Signal::SIGSYS),
            ("term", Signal::SIGTERM),
            ("terminate", Signal::SIGTERM),
            ("trap", Signal::SIGTRAP),
            ("tstp", Signal::SIGTSTP),
            ("ttin", Signal::SIGTTIN),
            ("ttou", Signal::SIGTTOU),
            ("ttout", Signal::SIGTTOU),
            ("ttyin", Signal::SIGTTIN),
            ("ttyout", Signal::SIGTTOU),
            ("ttystop", Signal::SIGTSTP),
            ("urg", Signal::SIGURG),
            ("urgent", Signal::SIGURG),
            ("user1", Signal::SIGUSR1),
            ("user2", Signal::SIGUSR2),
            ("usr1", Signal::SIGUSR1),
            ("usr2", Signal::SIGUSR2),
            ("vtalarm", Signal::SIGVTALRM),
            ("vtalrm", Signal::SIGVTALRM),
            ("winch", Signal::SIGWINCH),
            ("windowchange", Signal::SIGWINCH),
            ("xcpu", Signal::SIGXCPU),
            ("xfsz", Signal::SIGXFSZ),
        ];

        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            table.push(("power", Signal::SIGPWR));
            table.push(("pwr", Signal::SIGPWR));
        }

        #[cfg(all(
            any(target_os = "linux", target_os = "android"),
            not(any(
                target_arch = "mips",
                target_arch = "mips32r6",
                target_arch = "mips64",
                target_arch = "mips64r6",
                target_arch = "sparc64"
            ))
        ))]
        {
            table.push(("copstackfault", Signal::SIGSTKFLT));
            table.push(("stkflt", Signal::SIGSTKFLT));
        }

        table.sort_unstable_by_key(|entry| entry.0);
        table
    })
}

/// Sorted action-flag table. `nomask` and `oneshot` are the historical
/// synonyms of `nodefer` and `resethandler`.
static FLAG_TABLE: &[(&str, SaFlags)] = &[
    ("nochildstop", SaFlags::SA_NOCLDSTOP),
    ("nodefer", SaFlags::SA_NODEFER),
    ("nomask", SaFlags::SA_NODEFER),
    ("oneshot", SaFlags::SA_RESETHAND),
    ("resethandler", SaFlags::SA_RESETHAND),
    ("restart", SaFlags::SA_RESTART),
];

pub(crate) fn lookup_signal(name: &str) -> SignalResult<Signal> {
    let needle = name.to_ascii_lowercase();
    let table = signal_table();
    table
        .binary_search_by(|entry| entry.0.cmp(needle.as_str()))
        .map(|i| table[i].1)
        .map_err(|_| SignalError::InvalidSignal(name.to_string()))
}

pub(crate) fn lookup_flags<'a, I>(names: I) -> SignalResult<SaFlags>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut flags = SaFlags::empty();
    for name in names {
        let needle = name.to_ascii_lowercase();
        let flag = FLAG_TABLE
            .binary_search_by(|entry| entry.0.cmp(needle.as_str()))
            .map(|i| FLAG_TABLE[i].1)
            .map_err(|_| SignalError::InvalidFlag(name.to_string()))?;
        flags |= flag;
    }
    Ok(flags)
}

/// Map a kind back to its canonical short name. A match rather than a table
/// because numeric order differs among platforms.
pub(crate) fn canonical_name(signal: Signal) -> &'static str {
    match signal {
        Signal::SIGABRT => "abrt",
        Signal::SIGALRM => "alrm",
        Signal::SIGBUS => "bus",
        Signal::SIGCHLD => "chld",
        Signal::SIGCONT => "cont",
        Signal::SIGFPE => "fpe",
        Signal::SIGHUP => "hup",
        Signal::SIGILL => "ill",
        Signal::SIGINT => "int",
        Signal::SIGIO => "io",
        Signal::SIGKILL => "kill",
        Signal::SIGPIPE => "pipe",
        Signal::SIGPROF => "prof",
        #[cfg(any(target_os = "linux", target_os = "android"))]
        Signal::SIGPWR => "pwr",
        Signal::SIGQUIT => "quit",
        Signal::SIGSEGV => "segv",
        #[cfg(all(
            any(target_os = "linux", target_os = "android"),
            not(any(
                target_arch = "mips",
                target_arch = "mips32r6",
                target_arch = "mips64",
                target_arch = "mips64r6",
                target_arch = "sparc64"
            ))
        ))]
        Signal::SIGSTKFLT => "stkflt",
        Signal::SIGSTOP => "stop",
        Signal::SIGSYS => "sys",
        Signal::SIGTERM => "term",
        Signal::SIGTRAP => "trap",
        Signal::SIGTSTP => "tstp",
        Signal::SIGTTIN => "ttin",
        Signal::SIGTTOU => "ttou",
        Signal::SIGURG => "urg",
        Signal::SIGUSR1 => "usr1",
        Signal::SIGUSR2 => "usr2",
        Signal::SIGVTALRM => "vtalrm",
        Signal::SIGWINCH => "winch",
        Signal::SIGXCPU => "xcpu",
        Signal::SIGXFSZ => "xfsz",
        #[allow(unreachable_patterns)]
        _ => "(unknown)",
    }
}
