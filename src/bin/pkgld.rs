// Container inspection utility
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of TAME.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! This is the TAME package linker inspection utility.
//!
//! `pkgld` opens a container through the filesystem store,
//!   prints its summary,
//!   and optionally its symbols,
//!     exports,
//!     and imports.
//! With `--verify`,
//!   every import is resolved against the other containers in the same
//!   directory and those that cannot be resolved are listed.
//!
//! For more information about the linker,
//!   see the [`tamepkg::ld`] module.

extern crate tamepkg;

use getopts::{Fail, Options};
use std::{
    env,
    error::Error,
    fmt::{self, Display},
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tamepkg::{
    error::LinkError,
    ld::{Linker, Registry},
    store::FsContainerStore,
};

/// Exit code when one or more imports could not be resolved.
const EXIT_UNRESOLVED: i32 = 1;

/// What to print for a container.
#[derive(Debug, PartialEq, Eq)]
struct Inspect {
    container: String,
    dir: PathBuf,
    names: bool,
    exports: bool,
    imports: bool,
    verify: bool,
}

/// Types of commands
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Inspect(Inspect),
    Usage,
}

/// Print the requested sections of a container to `out`,
///   producing the number of unresolved imports.
fn inspect<W: Write>(cmd: &Inspect, out: &mut W) -> Result<usize, PkgldError> {
    let store: FsContainerStore = FsContainerStore::new(&cmd.dir);
    let mut registry = Registry::new(store);

    let id = registry.open_for_load(&cmd.container)?;
    let linker = registry.linker(id)?;

    write_summary(linker, out)?;

    if cmd.names {
        write_names(linker, out)?;
    }

    if cmd.exports {
        write_exports(linker, out)?;
    }

    if cmd.imports {
        write_imports(linker, out)?;
    }

    if !cmd.verify {
        return Ok(0);
    }

    let unresolved = registry.verify_imports(id)?;

    for import in &unresolved {
        writeln!(out, "unresolved: {import}")?;
    }

    if unresolved.is_empty() {
        let count = registry.linker(id)?.tables().import_count();
        writeln!(out, "all {count} import(s) resolved")?;
    }

    Ok(unresolved.len())
}

fn write_summary<W: Write>(linker: &Linker, out: &mut W) -> io::Result<()> {
    let summary = linker.summary();

    writeln!(out, "container: {}", linker.name())?;
    writeln!(
        out,
        "version: {} (licensee {})",
        summary.file_version, summary.licensee_version
    )?;
    writeln!(out, "flags: {:#010x}", summary.flags.bits())?;
    writeln!(out, "guid: {}", linker.guid())?;
    writeln!(out, "symbols: {}", linker.symbols().len())?;
    writeln!(out, "exports: {}", linker.tables().export_count())?;
    writeln!(out, "imports: {}", linker.tables().import_count())?;
    writeln!(out, "generations: {}", linker.generations().len())?;

    for generation in linker.generations() {
        writeln!(
            out,
            "  {} export(s), {} name(s)",
            generation.export_count, generation.name_count
        )?;
    }

    Ok(())
}

fn write_names<W: Write>(linker: &Linker, out: &mut W) -> io::Result<()> {
    writeln!(out, "names:")?;

    for (index, text) in linker.symbols().iter() {
        writeln!(out, "  [{}] {text}", index.as_usize())?;
    }

    Ok(())
}

fn write_exports<W: Write>(
    linker: &Linker,
    out: &mut W,
) -> Result<(), PkgldError> {
    writeln!(out, "exports:")?;

    for (index, export) in linker.tables().exports() {
        writeln!(
            out,
            "  {index} {} ({} byte(s), flags {:#010x})",
            linker.export_full_name(index)?,
            export.serial_size,
            export.flags.bits(),
        )?;
    }

    Ok(())
}

fn write_imports<W: Write>(
    linker: &Linker,
    out: &mut W,
) -> Result<(), PkgldError> {
    writeln!(out, "imports:")?;

    for (index, import) in linker.tables().imports() {
        writeln!(
            out,
            "  {index} {} (class container `{}`)",
            linker.import_full_name(index)?,
            linker.symbols().resolve(import.class_container)?,
        )?;
    }

    Ok(())
}

/// Run an inspection,
///   producing the process exit code.
fn run(cmd: &Inspect) -> i32 {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let result = inspect(cmd, &mut out).and_then(|unresolved| {
        out.flush()?;
        Ok(unresolved)
    });

    match result {
        Ok(0) => exitcode::OK,
        Ok(_) => EXIT_UNRESOLVED,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

/// Entrypoint for the inspector
pub fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pkgld");
    let opts = get_opts();
    let usage = opts.usage(&format!("Usage: {program} [OPTIONS] CONTAINER"));

    let code = match parse_options(opts, args.clone()) {
        Ok(Command::Inspect(cmd)) => run(&cmd),
        Ok(Command::Usage) => {
            println!("{usage}");
            exitcode::OK
        }
        Err(e) => {
            eprintln!("{e}");
            println!("{usage}");
            exitcode::USAGE
        }
    };

    std::process::exit(code);
}

/// Get 'Options'
fn get_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt("d", "dir", "directory containing containers", "DIR");
    opts.optflag("", "names", "print the symbol table");
    opts.optflag("", "exports", "print the export table");
    opts.optflag("", "imports", "print the import table");
    opts.optflag("", "verify", "resolve every import");
    opts.optflag("h", "help", "print this help menu");

    opts
}

/// Option parser
fn parse_options(opts: Options, args: Vec<String>) -> Result<Command, Fail> {
    let matches = opts.parse(args.get(1..).unwrap_or_default())?;

    if matches.opt_present("h") {
        return Ok(Command::Usage);
    }

    let container = match matches.free.len() {
        0 => return Err(Fail::OptionMissing(String::from("CONTAINER"))),
        1 => matches.free[0].clone(),
        _ => return Err(Fail::UnrecognizedOption(matches.free[1].clone())),
    };

    let dir = matches.opt_str("d").unwrap_or_else(|| String::from("."));

    Ok(Command::Inspect(Inspect {
        container,
        dir: dir.into(),
        names: matches.opt_present("names"),
        exports: matches.opt_present("exports"),
        imports: matches.opt_present("imports"),
        verify: matches.opt_present("verify"),
    }))
}

/// Inspector (`pkgld`) error.
///
/// This represents the aggregation of all possible errors that can occur
///   while inspecting a container.
#[derive(Debug)]
pub enum PkgldError {
    Io(io::Error),
    Link(LinkError),
}

impl PkgldError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => exitcode::IOERR,
            Self::Link(LinkError::NotFound(_)) => exitcode::NOINPUT,
            Self::Link(LinkError::Io(_)) => exitcode::IOERR,
            Self::Link(e) if e.is_fatal() => exitcode::DATAERR,
            Self::Link(_) => exitcode::SOFTWARE,
        }
    }
}

impl From<io::Error> for PkgldError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<LinkError> for PkgldError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl Display for PkgldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => Display::fmt(e, f),
            Self::Link(e) => Display::fmt(e, f),
        }
    }
}

impl Error for PkgldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Link(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, Fail> {
        let args = std::iter::once("program")
            .chain(args.iter().copied())
            .map(String::from)
            .collect();

        parse_options(get_opts(), args)
    }

    #[test]
    fn parse_options_help() {
        assert_eq!(Ok(Command::Usage), parse(&["-h"]));
    }

    #[test]
    fn parse_options_help_long() {
        assert_eq!(Ok(Command::Usage), parse(&["--help"]));
    }

    #[test]
    fn parse_options_invalid() {
        match parse(&["-q"]) {
            Err(Fail::UnrecognizedOption(_)) => {}
            other => panic!("Invalid option not caught: {other:?}"),
        }
    }

    #[test]
    fn parse_options_missing_container() {
        match parse(&[]) {
            Err(Fail::OptionMissing(message)) => {
                assert_eq!("CONTAINER", message);
            }
            other => panic!("Missing container not caught: {other:?}"),
        }
    }

    #[test]
    fn parse_options_too_many_containers() {
        match parse(&["Foo", "Bar"]) {
            Err(Fail::UnrecognizedOption(opt)) => assert_eq!("Bar", opt),
            other => panic!("Extra container not caught: {other:?}"),
        }
    }

    #[test]
    fn parse_options_defaults() {
        assert_eq!(
            Ok(Command::Inspect(Inspect {
                container: "Game".into(),
                dir: ".".into(),
                names: false,
                exports: false,
                imports: false,
                verify: false,
            })),
            parse(&["Game"])
        );
    }

    #[test]
    fn parse_options_all_sections() {
        assert_eq!(
            Ok(Command::Inspect(Inspect {
                container: "Game".into(),
                dir: "pkgs".into(),
                names: true,
                exports: true,
                imports: true,
                verify: true,
            })),
            parse(&[
                "--dir",
                "pkgs",
                "--names",
                "--exports",
                "--imports",
                "--verify",
                "Game",
            ])
        );
    }

    #[test]
    fn missing_container_exits_noinput() {
        let err = PkgldError::from(LinkError::NotFound("Foo".into()));
        assert_eq!(exitcode::NOINPUT, err.exit_code());
    }

    #[test]
    fn corrupt_container_exits_dataerr() {
        let err = PkgldError::from(LinkError::VersionUnsupported(1));
        assert_eq!(exitcode::DATAERR, err.exit_code());
    }
}
